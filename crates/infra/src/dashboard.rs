//! Role dashboards: read-only queue views over the order board.
//!
//! Queue membership, priority, overdue and ordering come from
//! `sitecart_fulfillment::board`; this module only joins them with the stored
//! orders and their tracking records.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use sitecart_core::{AggregateRoot, TenantId};
use sitecart_fleet::VehicleId;
use sitecart_fulfillment::{
    FulfillmentOrder, FulfillmentOrderId, OrderStatus, Priority, Queue, QueueKey, StageFlags,
    is_overdue,
};

use crate::event_store::EventStore;
use crate::service::{FulfillmentError, FulfillmentService};

/// Optional narrowing of a queue (driver dashboards filter by vehicle or driver).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueFilter {
    pub vehicle_id: Option<VehicleId>,
    pub driver_id: Option<String>,
}

impl QueueFilter {
    fn matches(&self, order: &FulfillmentOrder) -> bool {
        let assignment = order.assignment();
        let vehicle_ok = self
            .vehicle_id
            .as_ref()
            .is_none_or(|v| assignment.is_some_and(|a| &a.vehicle_id == v));
        let driver_ok = self
            .driver_id
            .as_ref()
            .is_none_or(|d| assignment.is_some_and(|a| &a.driver.employee_id == d));
        vehicle_ok && driver_ok
    }
}

/// One row on a dashboard.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderCard {
    pub order_id: FulfillmentOrderId,
    pub order_number: String,
    pub customer_name: Option<String>,
    pub status: OrderStatus,
    pub driver_status: &'static str,
    pub priority: Priority,
    pub is_overdue: bool,
    pub total_amount: u64,
    pub item_count: usize,
    pub delivery_date: Option<NaiveDate>,
    pub time_slot: Option<String>,
    pub delivery_address: Option<String>,
    pub placed_at: Option<DateTime<Utc>>,
    pub packing_progress: u8,
    pub storage_progress: u8,
    pub vehicle_id: Option<VehicleId>,
    pub driver_id: Option<String>,
    pub driver_verified: bool,
    pub photo_count: usize,
    pub tracking: StageFlags,
    pub version: u64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriorityCounts {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    /// Active orders only.
    pub total_orders: usize,
    pub inactive_orders: usize,
    pub by_status: BTreeMap<OrderStatus, usize>,
    pub by_queue: BTreeMap<&'static str, usize>,
    pub overdue: usize,
    pub priority: PriorityCounts,
}

fn queue_name(queue: Queue) -> &'static str {
    match queue {
        Queue::Packing => "packing",
        Queue::Storage => "storage",
        Queue::Dispatch => "dispatch",
        Queue::Driver => "driver",
    }
}

fn queue_key(order: &FulfillmentOrder) -> QueueKey {
    let schedule = order.schedule();
    QueueKey {
        priority: Priority::for_total(order.total_amount()),
        delivery_date: schedule.map(|s| s.delivery_date).unwrap_or(NaiveDate::MAX),
        time_slot: schedule.map(|s| s.time_slot.clone()).unwrap_or_default(),
        placed_at: order.placed_at().unwrap_or(DateTime::<Utc>::MAX_UTC),
    }
}

fn overdue(order: &FulfillmentOrder, now: DateTime<Utc>) -> bool {
    order
        .schedule()
        .is_some_and(|s| is_overdue(now, s.delivery_date, order.status()))
}

impl<S: EventStore> FulfillmentService<S> {
    /// Active orders in `queue`, highest priority first, then earliest slot.
    ///
    /// Every listed order gets a tracking record if it has none yet.
    pub fn queue(
        &self,
        tenant_id: TenantId,
        queue: Queue,
        filter: &QueueFilter,
        now: DateTime<Utc>,
    ) -> Result<Vec<OrderCard>, FulfillmentError> {
        let mut orders: Vec<FulfillmentOrder> = self
            .board()
            .list(tenant_id)
            .into_iter()
            .filter(|o| o.is_active() && queue.includes(o.status()) && filter.matches(o))
            .collect();
        orders.sort_by_cached_key(queue_key);

        orders
            .iter()
            .map(|order| -> Result<OrderCard, FulfillmentError> {
                let tracking = self.tracking_board().ensure(tenant_id, order)?;
                Ok(self.card(order, tracking.progress(), now))
            })
            .collect()
    }

    pub fn card(&self, order: &FulfillmentOrder, tracking: StageFlags, now: DateTime<Utc>) -> OrderCard {
        let schedule = order.schedule();
        let assignment = order.assignment();
        OrderCard {
            order_id: order.id_typed(),
            order_number: order.order_number().to_string(),
            customer_name: order.customer().and_then(|c| c.name.clone()),
            status: order.status(),
            driver_status: order.status().driver_label(),
            priority: Priority::for_total(order.total_amount()),
            is_overdue: overdue(order, now),
            total_amount: order.total_amount(),
            item_count: order.items().len(),
            delivery_date: schedule.map(|s| s.delivery_date),
            time_slot: schedule.map(|s| s.time_slot.clone()),
            delivery_address: schedule.map(|s| s.delivery_address.clone()),
            placed_at: order.placed_at(),
            packing_progress: order.packing().packing_progress,
            storage_progress: order.storage().storage_progress,
            vehicle_id: assignment.map(|a| a.vehicle_id.clone()),
            driver_id: assignment.map(|a| a.driver.employee_id.clone()),
            driver_verified: order.is_driver_verified(),
            photo_count: order.delivery().delivery_photos.len(),
            tracking,
            version: order.version(),
        }
    }

    /// Counts across the whole tenant.
    pub fn summary(&self, tenant_id: TenantId, now: DateTime<Utc>) -> DashboardSummary {
        let orders = self.board().list(tenant_id);

        let mut summary = DashboardSummary {
            total_orders: 0,
            inactive_orders: 0,
            by_status: OrderStatus::ALL.iter().map(|s| (*s, 0)).collect(),
            by_queue: Queue::ALL.iter().map(|q| (queue_name(*q), 0)).collect(),
            overdue: 0,
            priority: PriorityCounts::default(),
        };

        for order in &orders {
            if !order.is_active() {
                summary.inactive_orders += 1;
                continue;
            }
            summary.total_orders += 1;
            *summary.by_status.entry(order.status()).or_default() += 1;
            for queue in Queue::ALL.iter().filter(|q| q.includes(order.status())) {
                *summary.by_queue.entry(queue_name(*queue)).or_default() += 1;
            }
            if overdue(order, now) {
                summary.overdue += 1;
            }
            match Priority::for_total(order.total_amount()) {
                Priority::High => summary.priority.high += 1,
                Priority::Medium => summary.priority.medium += 1,
                Priority::Low => summary.priority.low += 1,
            }
        }
        summary
    }
}
