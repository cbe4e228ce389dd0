//! Outbound status-change notifications.
//!
//! Each committed status change is broadcast as `{orderId, orderNumber, status}`.
//! Message wording and delivery (WhatsApp, SSE, ...) belong to subscribers.
//! The channel is lossy: a lagging subscriber misses messages instead of
//! slowing down command handling.

use serde::Serialize;
use tokio::sync::broadcast;
use tracing::debug;

use sitecart_core::TenantId;
use sitecart_fulfillment::{FulfillmentEvent, FulfillmentOrder, FulfillmentOrderId, OrderStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusNotification {
    #[serde(skip)]
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub order_number: String,
    pub status: OrderStatus,
}

#[derive(Debug, Clone)]
pub struct StatusNotifier {
    tx: broadcast::Sender<StatusNotification>,
}

impl StatusNotifier {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<StatusNotification> {
        self.tx.subscribe()
    }

    /// Announce every status change among `events`, using the post-command order.
    pub fn announce(&self, tenant_id: TenantId, order: &FulfillmentOrder, events: &[FulfillmentEvent]) {
        for status in events.iter().filter_map(FulfillmentEvent::resulting_status) {
            let note = StatusNotification {
                tenant_id,
                order_id: order.id_typed(),
                order_number: order.order_number().to_string(),
                status,
            };
            // No subscribers is fine.
            if self.tx.send(note).is_err() {
                debug!(order_id = %order.id_typed(), %status, "no status subscribers");
            }
        }
    }
}
