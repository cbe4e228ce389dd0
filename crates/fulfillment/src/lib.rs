//! `sitecart-fulfillment`: the order fulfillment workflow engine.
//!
//! [`FulfillmentOrder`] is a single event-sourced state machine covering
//! packing, storage verification, dispatch, driver loading, transit and
//! delivery. [`WorkflowTracking`] is the per-stage view derived from it, and
//! [`board`] holds the pure dashboard rules.

pub mod board;
pub mod commands;
pub mod events;
pub mod model;
pub mod order;
pub mod status;
pub mod tracking;

pub use board::{Priority, Queue, QueueKey, is_overdue};
pub use commands::*;
pub use events::*;
pub use model::*;
pub use order::{FulfillmentOrder, FulfillmentOrderId};
pub use status::{OrderStatus, Stage};
pub use tracking::{StageFlags, StageProgress, TimingMetrics, WorkflowStatus, WorkflowTracking};
