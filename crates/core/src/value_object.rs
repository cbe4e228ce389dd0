//! Value object marker: equality by value, not identity.

/// Immutable, compared by attribute values (capacities, requirements, actor refs).
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
