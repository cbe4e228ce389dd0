use std::sync::Mutex;

use serde_json::Value as JsonValue;
use tracing::{debug, info};

use sitecart_core::{AggregateRoot, TenantId};
use sitecart_events::EventEnvelope;
use sitecart_fulfillment::{FulfillmentOrder, FulfillmentOrderId, OrderStatus, WorkflowTracking};

use super::{ProjectionError, check_sequence, decode};
use crate::read_model::TenantStore;

/// Per-order stage tracking records.
///
/// Records are folded from the order's own events, so `currentStatus` always
/// equals the order status. [`ensure`](Self::ensure) fills in a record the
/// projection has not seen yet from the order's stage log.
#[derive(Debug)]
pub struct WorkflowTrackingProjection<S>
where
    S: TenantStore<FulfillmentOrderId, WorkflowTracking>,
{
    store: S,
    apply_lock: Mutex<()>,
}

impl<S> WorkflowTrackingProjection<S>
where
    S: TenantStore<FulfillmentOrderId, WorkflowTracking>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            apply_lock: Mutex::new(()),
        }
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, ()>, ProjectionError> {
        self.apply_lock.lock().map_err(|_| {
            ProjectionError::TenantIsolation("tracking apply lock poisoned".to_string())
        })
    }

    pub fn get(&self, tenant_id: TenantId, order_id: &FulfillmentOrderId) -> Option<WorkflowTracking> {
        self.store.get(tenant_id, order_id)
    }

    pub fn list(&self, tenant_id: TenantId) -> Vec<WorkflowTracking> {
        self.store.list(tenant_id)
    }

    /// Get-or-create the record for `order`.
    ///
    /// Repeated calls yield the same single record. A record that lags the
    /// order is replaced by one synthesized from the order's stage log, so it
    /// never reports less progress than the order has made.
    pub fn ensure(&self, tenant_id: TenantId, order: &FulfillmentOrder) -> Result<WorkflowTracking, ProjectionError> {
        let order_id = order.id_typed();
        let _guard = self.lock()?;

        let existing = self.store.get(tenant_id, &order_id);
        if let Some(tracking) = existing.as_ref().filter(|t| t.version >= order.version()) {
            return Ok(tracking.clone());
        }

        let tracking = WorkflowTracking::from_order(order)?;
        match existing {
            None => info!(%order_id, order_number = %tracking.order_number, "tracking record created"),
            Some(stale) => debug!(%order_id, from = stale.version, to = tracking.version, "tracking record refreshed"),
        }
        self.store.upsert(tenant_id, order_id, tracking.clone());
        Ok(tracking)
    }

    pub fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        let Some((order_id, event)) = decode(envelope)? else {
            return Ok(());
        };
        let tenant_id = envelope.tenant_id();
        let _guard = self.lock()?;

        let mut tracking = self
            .store
            .get(tenant_id, &order_id)
            .unwrap_or_else(|| WorkflowTracking::synthesize(order_id, "", OrderStatus::OrderConfirmed));

        if !check_sequence(tracking.version, envelope.sequence_number())? {
            return Ok(());
        }

        tracking.apply_event(&event)?;
        self.store.upsert(tenant_id, order_id, tracking);
        Ok(())
    }

    pub fn rebuild_from_scratch(
        &self,
        envelopes: impl IntoIterator<Item = EventEnvelope<JsonValue>>,
    ) -> Result<(), ProjectionError> {
        let mut envs: Vec<_> = envelopes.into_iter().collect();

        let mut tenants: Vec<TenantId> = envs.iter().map(|e| e.tenant_id()).collect();
        tenants.sort_by_key(|t| *t.as_uuid().as_bytes());
        tenants.dedup();
        for t in tenants {
            self.store.clear_tenant(t);
        }

        envs.sort_by_key(|e| {
            (
                *e.tenant_id().as_uuid().as_bytes(),
                *e.aggregate_id().as_uuid().as_bytes(),
                e.sequence_number(),
            )
        });
        envs.iter().try_for_each(|env| self.apply_envelope(env))
    }
}
