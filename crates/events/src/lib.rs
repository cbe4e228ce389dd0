//! Event mechanics shared by the fulfillment domain and infrastructure.
//!
//! Domain crates define typed events; infra persists them as JSON envelopes
//! and feeds them to the read-model projections.

pub mod envelope;
pub mod event;
pub mod handler;

pub use envelope::EventEnvelope;
pub use event::Event;
pub use handler::execute;
