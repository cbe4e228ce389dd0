use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    response::Response,
    routing::post,
};

use sitecart_auth::permissions;
use sitecart_fulfillment::{
    CompletePacking, FulfillmentCommand, PackItem, ReportPackingComplaint, StartPacking,
};

use crate::app::dto;
use crate::app::routes::common::{self, StageContext};
use crate::app::services::AppServices;
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/orders/:id/packing/start", post(start_packing))
        .route("/orders/:id/packing/items/:idx", post(pack_item))
        .route("/orders/:id/packing/items/:idx/complaints", post(report_complaint))
        .route("/orders/:id/packing/complete", post(complete_packing))
}

pub async fn start_packing(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ActorOnly>,
) -> Response {
    let ctx = match StageContext::begin(&tenant, &principal, permissions::PACKING_WRITE, &id, &body.actor) {
        Ok(c) => c,
        Err(r) => return r,
    };

    let cmd = FulfillmentCommand::StartPacking(StartPacking {
        tenant_id: ctx.tenant_id,
        order_id: ctx.order_id,
        by: ctx.by,
        occurred_at: ctx.now,
    });
    common::stage_reply("packing started", services.fulfillment().execute(cmd, body.actor.expected()))
}

pub async fn pack_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path((id, idx)): Path<(String, usize)>,
    Json(body): Json<dto::PackItemRequest>,
) -> Response {
    let ctx = match StageContext::begin(&tenant, &principal, permissions::PACKING_WRITE, &id, &body.actor) {
        Ok(c) => c,
        Err(r) => return r,
    };

    let cmd = FulfillmentCommand::PackItem(PackItem {
        tenant_id: ctx.tenant_id,
        order_id: ctx.order_id,
        item_index: idx,
        packing_status: body.packing_status,
        by: ctx.by,
        occurred_at: ctx.now,
    });
    common::stage_reply("item updated", services.fulfillment().execute(cmd, body.actor.expected()))
}

pub async fn report_complaint(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path((id, idx)): Path<(String, usize)>,
    Json(body): Json<dto::PackingComplaintRequest>,
) -> Response {
    let ctx = match StageContext::begin(&tenant, &principal, permissions::PACKING_WRITE, &id, &body.actor) {
        Ok(c) => c,
        Err(r) => return r,
    };

    let cmd = FulfillmentCommand::ReportPackingComplaint(ReportPackingComplaint {
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

pub async fn complete_packing(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::NotesRequest>,
) -> Response {
    let ctx = match StageContext::begin(&tenant, &principal, permissions::PACKING_WRITE, &id, &body.actor) {
        Ok(c) => c,
        Err(r) => return r,
    };

    let cmd = FulfillmentCommand::CompletePacking(CompletePacking {
        tenant_id: ctx.tenant_id,
        order_id: ctx.order_id,
        by: ctx.by,
        notes: body.notes,
        occurred_at: ctx.now,
    });
    common::stage_reply("packing completed", services.fulfillment().execute(cmd, body.actor.expected()))
}
