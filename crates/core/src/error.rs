//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Deterministic, caller-correctable domain failures.
///
/// None of these imply a partial mutation: a command that fails produces no events.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// Malformed input (empty names, zero quantities, ...).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A stage guard or lifecycle rule refused the transition.
    #[error("guard not satisfied: {0}")]
    GuardViolation(String),

    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// Order, item, vehicle or employee absent.
    #[error("{0} not found")]
    NotFound(String),

    /// Stale version or duplicate creation.
    #[error("conflict: {0}")]
    Conflict(String),

    #[error("unauthorized")]
    Unauthorized,
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn guard(msg: impl Into<String>) -> Self {
        Self::GuardViolation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }
}
