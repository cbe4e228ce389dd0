//! Infrastructure for the fulfillment engine: event stores, the command
//! pipeline, read models, the application service, dashboards and config.

pub mod command_dispatcher;
pub mod config;
pub mod dashboard;
pub mod event_store;
pub mod notifications;
pub mod projections;
pub mod read_model;
pub mod service;


pub use command_dispatcher::{CommandDispatcher, DispatchError, Dispatched};
pub use config::{AppConfig, ConfigError};
pub use dashboard::{DashboardSummary, OrderCard, PriorityCounts, QueueFilter};
pub use notifications::{StatusNotification, StatusNotifier};
pub use service::{
    CommandOutcome, FulfillmentError, FulfillmentService, RouteStartFailure, RouteStartReport,
};
