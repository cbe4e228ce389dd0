use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    response::{IntoResponse, Response},
    routing::{get, post},
};

use sitecart_auth::permissions;

use crate::app::routes::common::{self, StageContext};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/orders/:id/vehicle-suggestion", get(vehicle_suggestion))
        .route("/orders/:id/assign", post(assign_vehicle))
}

/// Load requirement and the smallest active vehicle that carries it.
pub async fn vehicle_suggestion(
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

    match services.fulfillment().suggest_vehicle(tenant.tenant_id(), order_id) {
        Ok(suggestion) => Json(suggestion).into_response(),
        Err(e) => errors::fulfillment_error_to_response(e),
    }
}

pub async fn assign_vehicle(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::AssignVehicleRequest>,
) -> Response {
    let ctx = match StageContext::begin(&tenant, &principal, permissions::DISPATCH_WRITE, &id, &body.actor) {
        Ok(c) => c,
        Err(r) => return r,
    };

    let result = services.fulfillment().assign_vehicle(
        ctx.tenant_id,
        ctx.order_id,
        body.vehicle_id,
        &body.driver_id,
        ctx.by,
        body.notes,
        ctx.now,
        body.actor.expected(),
    );
    common::stage_reply("vehicle assigned", result)
}
