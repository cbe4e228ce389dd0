//! Read models built from fulfillment order events.
//!
//! Both projections are rebuildable from the event store, partitioned by
//! tenant, and idempotent: an envelope at or below the recorded version is
//! skipped, so at-least-once delivery is safe.

pub mod order_board;
pub mod workflow_tracking;

use serde_json::Value as JsonValue;
use thiserror::Error;

use sitecart_core::DomainError;
use sitecart_events::EventEnvelope;
use sitecart_fulfillment::{FulfillmentEvent, FulfillmentOrder, FulfillmentOrderId};

pub use order_board::OrderBoardProjection;
pub use workflow_tracking::WorkflowTrackingProjection;

#[derive(Debug, Error)]
pub enum ProjectionError {
    #[error("failed to deserialize fulfillment event: {0}")]
    Deserialize(String),

    #[error("tenant isolation violation: {0}")]
    TenantIsolation(String),

    /// A gap in the stream: an earlier envelope was lost, rebuild required.
    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },

    #[error(transparent)]
    Domain(#[from] DomainError),
}

/// Shared cursor rule: `Ok(false)` means "already applied, skip".
pub(crate) fn check_sequence(last: u64, found: u64) -> Result<bool, ProjectionError> {
    if found == 0 || found > last + 1 {
        return Err(ProjectionError::NonMonotonicSequence { last, found });
    }
    Ok(found == last + 1)
}

/// Decode an order envelope; `None` for other aggregate types.
pub(crate) fn decode(
    envelope: &EventEnvelope<JsonValue>,
) -> Result<Option<(FulfillmentOrderId, FulfillmentEvent)>, ProjectionError> {
    if envelope.aggregate_type() != FulfillmentOrder::AGGREGATE_TYPE {
        return Ok(None);
    }

    let event: FulfillmentEvent = serde_json::from_value(envelope.payload().clone())
        .map_err(|e| ProjectionError::Deserialize(format!("{}: {e}", envelope.event_type())))?;

    let order_id = FulfillmentOrderId::new(envelope.aggregate_id());
    if event.order_id() != order_id {
        return Err(ProjectionError::TenantIsolation(
            "event order_id does not match envelope aggregate_id".to_string(),
        ));
    }
    if let FulfillmentEvent::OrderPlaced(placed) = &event {
        if placed.tenant_id != envelope.tenant_id() {
            return Err(ProjectionError::TenantIsolation(
                "event tenant_id does not match envelope tenant_id".to_string(),
            ));
        }
    }
    Ok(Some((order_id, event)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicates_are_skipped_and_gaps_rejected() {
        assert!(check_sequence(0, 1).unwrap());
        assert!(!check_sequence(3, 2).unwrap());
        assert!(!check_sequence(3, 3).unwrap());
        assert!(matches!(
            check_sequence(3, 5),
            Err(ProjectionError::NonMonotonicSequence { last: 3, found: 5 })
        ));
        assert!(check_sequence(0, 0).is_err());
    }
}
