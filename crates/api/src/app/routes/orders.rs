use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::Utc;

use sitecart_auth::permissions;
use sitecart_fulfillment::{ComplaintScope, DeactivateOrder, FulfillmentCommand, ResolveComplaint};

use crate::app::routes::common::{self, StageContext};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/orders", post(place_order))
        .route("/orders/:id", get(get_order))
        .route("/orders/:id/history", get(order_history))
        .route("/orders/:id/tracking", get(order_tracking))
        .route("/orders/:id/deactivate", post(deactivate_order))
        .route(
            "/orders/:id/complaints/:complaint_id/resolve",
            post(resolve_complaint),
        )
}

/// Checkout boundary: a confirmed order arrives from the storefront.
pub async fn place_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::PlaceOrderRequest>,
) -> Response {
    if let Err(r) = common::authorized(&tenant, &principal, permissions::ORDERS_PLACE) {
        return r;
    }

    let (customer, items, schedule, total) = body.into_parts();
    match services.fulfillment().place_order(
        tenant.tenant_id(),
        customer,
        items,
        schedule,
        total,
        Utc::now(),
    ) {
        Ok(outcome) => (
            StatusCode::CREATED,
            Json(dto::StageResponse::from_outcome("order placed", &outcome)),
        )
            .into_response(),
        Err(e) => errors::fulfillment_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(r) = common::authorized(&tenant, &principal, permissions::ORDERS_READ) {
        return r;
    }
    let order_id = match common::parse_order_id(&id) {
        Ok(v) => v,
        Err(r) => return r,
    };

    match services.fulfillment().order(tenant.tenant_id(), order_id) {
        Ok(order) => Json(dto::OrderView::from(&order)).into_response(),
        Err(e) => errors::fulfillment_error_to_response(e),
    }
}

pub async fn order_history(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(r) = common::authorized(&tenant, &principal, permissions::ORDERS_READ) {
        return r;
    }
    let order_id = match common::parse_order_id(&id) {
        Ok(v) => v,
        Err(r) => return r,
    };

    match services.fulfillment().history(tenant.tenant_id(), order_id) {
        Ok(events) => Json(events).into_response(),
        Err(e) => errors::fulfillment_error_to_response(e),
    }
}

pub async fn order_tracking(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> Response {
    if let Err(r) = common::authorized(&tenant, &principal, permissions::ORDERS_READ) {
        return r;
    }
    let order_id = match common::parse_order_id(&id) {
        Ok(v) => v,
        Err(r) => return r,
    };

    match services.fulfillment().tracking(tenant.tenant_id(), order_id) {
        Ok(tracking) => Json(tracking).into_response(),
        Err(e) => errors::fulfillment_error_to_response(e),
    }
}

pub async fn deactivate_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::DeactivateRequest>,
) -> Response {
    let ctx = match StageContext::begin(&tenant, &principal, permissions::ORDERS_CANCEL, &id, &body.actor) {
        Ok(c) => c,
        Err(r) => return r,
    };

    let cmd = FulfillmentCommand::DeactivateOrder(DeactivateOrder {
        tenant_id: ctx.tenant_id,
        order_id: ctx.order_id,
        reason: body.reason,
        by: ctx.by,
        occurred_at: ctx.now,
    });
    common::stage_reply(
        "order deactivated",
        services.fulfillment().execute(cmd, body.actor.expected()),
    )
}

/// Resolution is a note on the complaint; item state is left as reported.
pub async fn resolve_complaint(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path((id, complaint_id)): Path<(String, String)>,
    Json(body): Json<dto::ResolveComplaintRequest>,
) -> Response {
    let permission = match body.scope {
        ComplaintScope::Packing => permissions::PACKING_WRITE,
        ComplaintScope::Storage => permissions::STORAGE_WRITE,
    };
    let ctx = match StageContext::begin(&tenant, &principal, permission, &id, &body.actor) {
        Ok(c) => c,
        Err(r) => return r,
    };

    let cmd = FulfillmentCommand::ResolveComplaint(ResolveComplaint {
        tenant_id: ctx.tenant_id,
        order_id: ctx.order_id,
        item_index: body.item_index,
        scope: body.scope,
        complaint_id,
        resolution: body.resolution,
        by: ctx.by,
        occurred_at: ctx.now,
    });
    common::stage_reply(
        "complaint resolved",
        services.fulfillment().execute(cmd, body.actor.expected()),
    )
}
