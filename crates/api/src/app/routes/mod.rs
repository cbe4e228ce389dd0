use axum::{Router, routing::get};

pub mod common;
pub mod dashboard;
pub mod delivery;
pub mod dispatch;
pub mod orders;
pub mod packing;
pub mod storage;
pub mod system;

/// Router for all authenticated (tenant-scoped) endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/vehicles", get(system::vehicles))
        .route("/notifications/stream", get(system::notifications))
        .merge(orders::router())
        .merge(packing::router())
        .merge(storage::router())
        .merge(dispatch::router())
        .merge(delivery::router())
        .merge(dashboard::router())
}
