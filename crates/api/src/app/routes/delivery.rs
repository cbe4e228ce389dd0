//! Driver-side operations: loading check, route start, arrival and proof of delivery.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::post,
};
use chrono::Utc;
use serde_json::json;

use sitecart_auth::permissions;
use sitecart_fleet::VehicleId;
use sitecart_fulfillment::{
    CompleteDelivery, FulfillmentCommand, MarkArrived, UploadDeliveryPhoto, VerifyByDriver,
};

use crate::app::routes::common::{self, StageContext};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/orders/:id/driver/verify", post(driver_verify))
        .route("/vehicles/:vehicle_id/start-route", post(start_route))
        .route("/orders/:id/delivery/arrive", post(mark_arrived))
        .route("/orders/:id/delivery/photos", post(upload_photo))
        .route("/orders/:id/delivery/complete", post(complete_delivery))
}

pub async fn driver_verify(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::DriverVerifyRequest>,
) -> Response {
    let ctx = match StageContext::begin(&tenant, &principal, permissions::DRIVER_WRITE, &id, &body.actor) {
        Ok(c) => c,
        Err(r) => return r,
    };

    let cmd = FulfillmentCommand::VerifyByDriver(VerifyByDriver {
        tenant_id: ctx.tenant_id,
        order_id: ctx.order_id,
        verified: body.verified,
        by: ctx.by,
        notes: body.notes,
        occurred_at: ctx.now,
    });
    common::stage_reply("driver verification recorded", services.fulfillment().execute(cmd, body.actor.expected()))
}

/// Start the route for every verified order loaded on the vehicle.
pub async fn start_route(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(vehicle_id): Path<String>,
    Json(body): Json<dto::ActorOnly>,
) -> Response {
    if let Err(r) = common::authorized(&tenant, &principal, permissions::DRIVER_WRITE) {
        return r;
    }
    let by = match crate::authz::resolve_actor(
        &principal,
        body.actor.employee_id.as_deref(),
        body.actor.employee_name.as_deref(),
    ) {
        Ok(Some(by)) => by,
        Ok(None) => {
            return errors::json_error(StatusCode::BAD_REQUEST, "validation_error", "employeeId is required");
        }
        Err(e) => return errors::authz_error_to_response(e),
    };

    match services.fulfillment().start_route_for_vehicle(
        tenant.tenant_id(),
        &VehicleId::new(vehicle_id),
        by,
        Utc::now(),
    ) {
        Ok(report) => {
            let message = format!(
                "route started for {} of {} orders",
                report.updated_orders.len(),
                report.updated_orders.len() + report.errors.len()
            );
            (
                StatusCode::OK,
                Json(json!({
                    "success": true,
                    "message": message,
                    "vehicleId": report.vehicle_id,
                    "updatedOrders": report.updated_orders,
                    "errors": report.errors,
                })),
            )
                .into_response()
        }
        Err(e) => errors::fulfillment_error_to_response(e),
    }
}

pub async fn mark_arrived(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ArriveRequest>,
) -> Response {
    let ctx = match StageContext::begin(&tenant, &principal, permissions::DRIVER_WRITE, &id, &body.actor) {
        Ok(c) => c,
        Err(r) => return r,
    };

    let cmd = FulfillmentCommand::MarkArrived(MarkArrived {
        tenant_id: ctx.tenant_id,
        order_id: ctx.order_id,
        location: body.location,
        by: ctx.by,
        occurred_at: ctx.now,
    });
    common::stage_reply("arrival recorded", services.fulfillment().execute(cmd, body.actor.expected()))
}

pub async fn upload_photo(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::PhotoRequest>,
) -> Response {
    let ctx = match StageContext::begin(&tenant, &principal, permissions::DRIVER_WRITE, &id, &body.actor) {
        Ok(c) => c,
        Err(r) => return r,
    };

    let cmd = FulfillmentCommand::UploadDeliveryPhoto(UploadDeliveryPhoto {
        tenant_id: ctx.tenant_id,
        order_id: ctx.order_id,
        url: body.url,
        caption: body.caption,
        by: ctx.by,
        occurred_at: ctx.now,
    });
    common::stage_reply("photo uploaded", services.fulfillment().execute(cmd, body.actor.expected()))
}

pub async fn complete_delivery(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::CompleteDeliveryRequest>,
) -> Response {
    let ctx = match StageContext::begin(&tenant, &principal, permissions::DRIVER_WRITE, &id, &body.actor) {
        Ok(c) => c,
        Err(r) => return r,
    };

    let cmd = FulfillmentCommand::CompleteDelivery(CompleteDelivery {
        tenant_id: ctx.tenant_id,
        order_id: ctx.order_id,
        customer_confirmed: body.customer_confirmed,
        recipient_name: body.recipient_name,
        by: ctx.by,
        notes: body.notes,
        occurred_at: ctx.now,
    });
    common::stage_reply("order delivered", services.fulfillment().execute(cmd, body.actor.expected()))
}
