use std::sync::Mutex;

use serde_json::Value as JsonValue;
use tracing::debug;

use sitecart_core::{Aggregate, AggregateRoot, TenantId};
use sitecart_events::EventEnvelope;
use sitecart_fulfillment::{FulfillmentOrder, FulfillmentOrderId};

use super::{ProjectionError, check_sequence, decode};
use crate::read_model::TenantStore;

/// Folded order state per tenant, feeding the dashboards.
///
/// The stored value is the order aggregate itself, replayed event by event;
/// its version is the projection cursor.
#[derive(Debug)]
pub struct OrderBoardProjection<S>
where
    S: TenantStore<FulfillmentOrderId, FulfillmentOrder>,
{
    store: S,
    apply_lock: Mutex<()>,
}

impl<S> OrderBoardProjection<S>
where
    S: TenantStore<FulfillmentOrderId, FulfillmentOrder>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            apply_lock: Mutex::new(()),
        }
    }

    pub fn get(&self, tenant_id: TenantId, order_id: &FulfillmentOrderId) -> Option<FulfillmentOrder> {
        self.store.get(tenant_id, order_id)
    }

    /// Every placed order of a tenant, active or not.
    pub fn list(&self, tenant_id: TenantId) -> Vec<FulfillmentOrder> {
        self.store
            .list(tenant_id)
            .into_iter()
            .filter(FulfillmentOrder::is_created)
            .collect()
    }

    pub fn apply_envelope(&self, envelope: &EventEnvelope<JsonValue>) -> Result<(), ProjectionError> {
        let Some((order_id, event)) = decode(envelope)? else {
            return Ok(());
        };
        let tenant_id = envelope.tenant_id();

        // Cursor read and write must not interleave with a concurrent apply.
        let _guard = self.apply_lock.lock().map_err(|_| {
            ProjectionError::TenantIsolation("order board apply lock poisoned".to_string())
        })?;

        let mut order = self
            .store
            .get(tenant_id, &order_id)
            .unwrap_or_else(|| FulfillmentOrder::empty(order_id));

        if !check_sequence(order.version(), envelope.sequence_number())? {
            debug!(%order_id, seq = envelope.sequence_number(), "order board skipped duplicate");
            return Ok(());
        }

        order.apply(&event);
        self.store.upsert(tenant_id, order_id, order);
        Ok(())
    }

    /// Overwrite the record with an order folded straight from its stream.
    ///
    /// Used to repair a record whose incremental apply failed. A record that
    /// is already at or past `order` is left alone.
    pub fn replace(&self, tenant_id: TenantId, order: FulfillmentOrder) -> Result<bool, ProjectionError> {
        let order_id = order.id_typed();
        let _guard = self.apply_lock.lock().map_err(|_| {
            ProjectionError::TenantIsolation("order board apply lock poisoned".to_string())
        })?;

        if self
            .store
            .get(tenant_id, &order_id)
            .is_some_and(|current| current.version() >= order.version())
        {
            return Ok(false);
        }
        debug!(%order_id, version = order.version(), "order board record replaced");
        self.store.upsert(tenant_id, order_id, order);
        Ok(true)
    }

    /// Clear the touched tenants and replay everything in stream order.
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

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use chrono::{NaiveDate, Utc};
    use uuid::Uuid;

    use sitecart_core::AggregateId;
    use sitecart_fulfillment::{
        CustomerRef, DeliverySchedule, FulfillmentEvent, NewOrderItem, OrderPlaced, OrderStatus,
    };

    use crate::read_model::InMemoryTenantStore;

    type Board = OrderBoardProjection<Arc<InMemoryTenantStore<FulfillmentOrderId, FulfillmentOrder>>>;

    fn placed_envelope(tenant_id: TenantId, order_id: FulfillmentOrderId, seq: u64) -> EventEnvelope<JsonValue> {
        let event = FulfillmentEvent::OrderPlaced(OrderPlaced {
            tenant_id,
            order_id,
            order_number: "ORD-261019-00AB12".into(),
            customer: CustomerRef {
                customer_id: "254700000001".into(),
                name: Some("Site Office".into()),
            },
            items: vec![NewOrderItem {
                product_id: "CEM-50".into(),
                name: "Cement 50kg".into(),
                quantity: 4,
                unit_price: 7_500,
                weight_label: Some("50kg".into()),
            }],
            schedule: DeliverySchedule {
                delivery_date: NaiveDate::from_ymd_opt(2026, 10, 21).unwrap(),
                time_slot: "08:00-10:00".into(),
                delivery_address: "Plot 7, Ruiru".into(),
            },
            total_amount: 30_000,
            occurred_at: Utc::now(),
        });
        EventEnvelope::new(
            Uuid::now_v7(),
            tenant_id,
            order_id.0,
            FulfillmentOrder::AGGREGATE_TYPE,
            "fulfillment.order.placed",
            seq,
            serde_json::to_value(event).unwrap(),
        )
    }

    #[test]
    fn redelivery_is_ignored() {
        let board: Board = OrderBoardProjection::new(Arc::new(InMemoryTenantStore::new()));
        let tenant_id = TenantId::new();
        let order_id = FulfillmentOrderId::new(AggregateId::new());
        let env = placed_envelope(tenant_id, order_id, 1);

        board.apply_envelope(&env).unwrap();
        board.apply_envelope(&env).unwrap();

        let order = board.get(tenant_id, &order_id).unwrap();
        assert_eq!(order.version(), 1);
        assert_eq!(order.status(), OrderStatus::OrderConfirmed);
        assert_eq!(board.list(tenant_id).len(), 1);
        assert!(board.list(TenantId::new()).is_empty());
    }

    #[test]
    fn gaps_are_reported() {
        let board: Board = OrderBoardProjection::new(Arc::new(InMemoryTenantStore::new()));
        let tenant_id = TenantId::new();
        let order_id = FulfillmentOrderId::new(AggregateId::new());

        let err = board.apply_envelope(&placed_envelope(tenant_id, order_id, 2)).unwrap_err();
        assert!(matches!(err, ProjectionError::NonMonotonicSequence { last: 0, found: 2 }));
    }

    #[test]
    fn replaced_record_resumes_incremental_apply() {
        let board: Board = OrderBoardProjection::new(Arc::new(InMemoryTenantStore::new()));
        let tenant_id = TenantId::new();
        let order_id = FulfillmentOrderId::new(AggregateId::new());

        // A record stuck behind its stream rejects the next event as a gap.
        let env = placed_envelope(tenant_id, order_id, 2);
        assert!(board.apply_envelope(&env).is_err());

        let mut folded = FulfillmentOrder::empty(order_id);
        let placed = placed_envelope(tenant_id, order_id, 1);
        let (_, event) = decode(&placed).unwrap().unwrap();
        folded.apply(&event);

        assert!(board.replace(tenant_id, folded.clone()).unwrap());
        assert_eq!(board.get(tenant_id, &order_id).unwrap().version(), 1);
        // Never rolls a record back.
        let empty = FulfillmentOrder::empty(order_id);
        assert!(!board.replace(tenant_id, empty).unwrap());
        assert!(!board.replace(tenant_id, folded).unwrap());
        assert_eq!(board.list(tenant_id).len(), 1);

        board.apply_envelope(&env).unwrap();
        assert_eq!(board.get(tenant_id, &order_id).unwrap().version(), 2);
    }

    #[test]
    fn envelope_tenant_must_match_the_event() {
        let board: Board = OrderBoardProjection::new(Arc::new(InMemoryTenantStore::new()));
        let order_id = FulfillmentOrderId::new(AggregateId::new());
        let env = placed_envelope(TenantId::new(), order_id, 1);
        let forged = EventEnvelope::new(
            env.event_id(),
            TenantId::new(),
            env.aggregate_id(),
            env.aggregate_type(),
            env.event_type(),
            1,
            env.payload().clone(),
        );

        assert!(matches!(
            board.apply_envelope(&forged),
            Err(ProjectionError::TenantIsolation(_))
        ));
    }
}
