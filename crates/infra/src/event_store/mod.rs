//! Append-only event store boundary.
//!
//! One stream per fulfillment order; the stream doubles as the order's
//! stage history and audit log.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryEventStore;
pub use postgres::PostgresEventStore;
pub use r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};
