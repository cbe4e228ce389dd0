//! HTTP API for the fulfillment workflow: stage operations, dashboards, auth.

pub mod app;
pub mod authz;
pub mod context;
pub mod middleware;
