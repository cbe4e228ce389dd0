use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
};
use chrono::Utc;
use serde_json::json;

use sitecart_auth::permissions;
use sitecart_fulfillment::Queue;
use sitecart_infra::QueueFilter;

use crate::app::routes::common;
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{PrincipalContext, TenantContext};

pub fn router() -> Router {
    Router::new()
        .route("/dashboard/queues/:queue", get(queue))
        .route("/dashboard/summary", get(summary))
}

/// Role queue: `packing`, `storage`, `dispatch` or `driver`.
pub async fn queue(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(name): Path<String>,
    Query(query): Query<dto::QueueQuery>,
) -> Response {
    if let Err(r) = common::authorized(&tenant, &principal, permissions::ORDERS_READ) {
        return r;
    }
    let queue: Queue = match name.parse() {
        Ok(q) => q,
        Err(e) => return errors::json_error(StatusCode::NOT_FOUND, "not_found", e.to_string()),
    };

    let filter = QueueFilter {
        vehicle_id: query.vehicle_id,
        driver_id: query.driver_id,
    };
    match services
        .fulfillment()
        .queue(tenant.tenant_id(), queue, &filter, Utc::now())
    {
        Ok(cards) => Json(json!({
            "queue": name,
            "count": cards.len(),
            "orders": cards,
        }))
        .into_response(),
        Err(e) => errors::fulfillment_error_to_response(e),
    }
}

pub async fn summary(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(r) = common::authorized(&tenant, &principal, permissions::ORDERS_READ) {
        return r;
    }
    Json(services.fulfillment().summary(tenant.tenant_id(), Utc::now())).into_response()
}
