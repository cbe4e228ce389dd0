//! `sitecart-core`: domain building blocks shared by every fulfillment crate.
//!
//! Pure domain primitives only: no IO, no storage, no HTTP.

pub mod aggregate;
pub mod entity;
pub mod error;
pub mod id;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot, ExpectedVersion};
pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{AggregateId, TenantId};
pub use value_object::ValueObject;
