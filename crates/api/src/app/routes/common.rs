use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{DateTime, Utc};
use tracing::debug;

use sitecart_auth::Permission;
use sitecart_core::{AggregateId, TenantId};
use sitecart_fulfillment::{EmployeeRef, FulfillmentOrderId};
use sitecart_infra::{CommandOutcome, FulfillmentError};

use crate::app::{dto, errors};
use crate::context::{PrincipalContext, TenantContext};

/// Everything a stage handler needs once the caller is cleared to act.
pub struct StageContext {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub by: EmployeeRef,
    pub now: DateTime<Utc>,
}

impl StageContext {
    /// Authorize `permission`, parse the order id and resolve the acting employee.
    pub fn begin(
        tenant: &TenantContext,
        principal: &PrincipalContext,
        permission: Permission,
        order_id: &str,
        actor: &dto::Actor,
    ) -> Result<Self, Response> {
        authorized(tenant, principal, permission)?;
        let order_id = parse_order_id(order_id)?;

        let by = crate::authz::resolve_actor(
            principal,
            actor.employee_id.as_deref(),
            actor.employee_name.as_deref(),
        )
        .map_err(errors::authz_error_to_response)?
        .ok_or_else(|| {
            errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "employeeId is required")
        })?;

        Ok(Self {
            tenant_id: tenant.tenant_id(),
            order_id,
            by,
            now: Utc::now(),
        })
    }
}

pub fn authorized(
    tenant: &TenantContext,
    principal: &PrincipalContext,
    permission: Permission,
) -> Result<(), Response> {
    crate::authz::require(tenant, principal, permission).map_err(|e| {
        debug!(principal = %principal.principal_id(), error = %e, "request forbidden");
        errors::authz_error_to_response(e)
    })
}

pub fn parse_order_id(raw: &str) -> Result<FulfillmentOrderId, Response> {
    raw.parse::<AggregateId>()
        .map(FulfillmentOrderId::new)
        .map_err(|_| errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id"))
}

/// Render a stage outcome as `{success, message, newStatus?, ...}`.
pub fn stage_reply(message: &str, result: Result<CommandOutcome, FulfillmentError>) -> Response {
    match result {
        Ok(outcome) => (
            StatusCode::OK,
            Json(dto::StageResponse::from_outcome(message, &outcome)),
        )
            .into_response(),
        Err(e) => errors::fulfillment_error_to_response(e),
    }
}
