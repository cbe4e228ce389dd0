use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    response::Response,
    routing::post,
};

use sitecart_auth::permissions;
use sitecart_fulfillment::{
    CompleteStorage, FulfillmentCommand, ReportStorageComplaint, VerifyStorageItem,
};

use crate::app::dto;
use crate::app::routes::common::{self, StageContext};
use crate::app::services::AppServices;
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/orders/:id/storage/items/:idx/verify", post(verify_item))
        .route("/orders/:id/storage/items/:idx/complaints", post(report_complaint))
        .route("/orders/:id/storage/complete", post(complete_storage))
}

pub async fn verify_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path((id, idx)): Path<(String, usize)>,
    Json(body): Json<dto::VerifyStorageItemRequest>,
) -> Response {
    let ctx = match StageContext::begin(&tenant, &principal, permissions::STORAGE_WRITE, &id, &body.actor) {
        Ok(c) => c,
        Err(r) => return r,
    };

    let cmd = FulfillmentCommand::VerifyStorageItem(VerifyStorageItem {
        tenant_id: ctx.tenant_id,
        order_id: ctx.order_id,
        item_index: idx,
        condition: body.condition,
        by: ctx.by,
        occurred_at: ctx.now,
    });
    common::stage_reply("item verified", services.fulfillment().execute(cmd, body.actor.expected()))
}

/// A storage complaint leaves the item unverified.
pub async fn report_complaint(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path((id, idx)): Path<(String, usize)>,
    Json(body): Json<dto::StorageComplaintRequest>,
) -> Response {
    let ctx = match StageContext::begin(&tenant, &principal, permissions::STORAGE_WRITE, &id, &body.actor) {
        Ok(c) => c,
        Err(r) => return r,
    };

    let cmd = FulfillmentCommand::ReportStorageComplaint(ReportStorageComplaint {
        tenant_id: ctx.tenant_id,
        order_id: ctx.order_id,
        item_index: idx,
        complaint_type: body.complaint_type,
        description: body.description,
        by: ctx.by,
        occurred_at: ctx.now,
    });
    common::stage_reply("complaint recorded", services.fulfillment().execute(cmd, body.actor.expected()))
}

pub async fn complete_storage(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::CompleteStorageRequest>,
) -> Response {
    let ctx = match StageContext::begin(&tenant, &principal, permissions::STORAGE_WRITE, &id, &body.actor) {
        Ok(c) => c,
        Err(r) => return r,
    };

    let cmd = FulfillmentCommand::CompleteStorage(CompleteStorage {
        tenant_id: ctx.tenant_id,
        order_id: ctx.order_id,
        storage_location: body.storage_location,
        by: ctx.by,
        notes: body.notes,
        occurred_at: ctx.now,
    });
    common::stage_reply(
        "storage verification completed",
        services.fulfillment().execute(cmd, body.actor.expected()),
    )
}
