use std::sync::Arc;

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::{IntoResponse, Response, sse::Event as SseEvent},
};
use serde_json::json;

use sitecart_auth::permissions;

use crate::app::routes::common;
use crate::app::services::{self, AppServices};
use crate::context::{PrincipalContext, TenantContext};

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> impl IntoResponse {
    Json(json!({
        "tenantId": tenant.tenant_id().to_string(),
        "principalId": principal.principal_id().to_string(),
        "roles": principal.roles().iter().map(|r| r.as_str()).collect::<Vec<_>>(),
        "employee": principal.employee(),
    }))
}

/// Active fleet, catalog order.
pub async fn vehicles(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Response {
    if let Err(r) = common::authorized(&tenant, &principal, permissions::ORDERS_READ) {
        return r;
    }
    Json(services.fulfillment().catalog().list_active()).into_response()
}

pub async fn notifications(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(tenant): Extension<TenantContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> Result<
    axum::response::Sse<impl tokio_stream::Stream<Item = Result<SseEvent, std::convert::Infallible>>>,
    Response,
> {
    common::authorized(&tenant, &principal, permissions::ORDERS_READ)?;
    Ok(services::tenant_status_stream(&services, tenant.tenant_id()))
}
