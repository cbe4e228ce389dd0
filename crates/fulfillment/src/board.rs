//! Pure parts of the dashboard projection: queue membership, priority,
//! overdue and ordering. Deterministic given the same inputs.

use core::cmp::Ordering;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use crate::status::OrderStatus;

/// Totals at or above this are `HIGH`. Compared against the order total as
/// the checkout supplied it, whatever its currency unit.
pub const HIGH_PRIORITY_MIN: u64 = 200;
/// Totals at or above this are `MEDIUM`.
pub const MEDIUM_PRIORITY_MIN: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    pub fn for_total(total_amount: u64) -> Self {
        if total_amount >= HIGH_PRIORITY_MIN {
            Priority::High
        } else if total_amount >= MEDIUM_PRIORITY_MIN {
            Priority::Medium
        } else {
            Priority::Low
        }
    }
}

/// Past its delivery day and not yet delivered.
pub fn is_overdue(now: DateTime<Utc>, delivery_date: NaiveDate, status: OrderStatus) -> bool {
    !status.is_terminal() && now.date_naive() > delivery_date
}

/// Role-specific work queues.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Queue {
    Packing,
    Storage,
    Dispatch,
    Driver,
}

impl Queue {
    pub const ALL: [Queue; 4] = [Queue::Packing, Queue::Storage, Queue::Dispatch, Queue::Driver];

    pub fn statuses(self) -> &'static [OrderStatus] {
        match self {
            Queue::Packing => &[OrderStatus::OrderConfirmed, OrderStatus::PickingOrder],
            Queue::Storage => &[OrderStatus::AllocatedDriver],
            Queue::Dispatch => &[OrderStatus::ReadyToPickup],
            Queue::Driver => &[OrderStatus::AllocatedDispatchOfficer2, OrderStatus::OnRoute],
        }
    }

    pub fn includes(self, status: OrderStatus) -> bool {
        self.statuses().contains(&status)
    }
}

impl core::str::FromStr for Queue {
    type Err = sitecart_core::DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "packing" => Ok(Queue::Packing),
            "storage" => Ok(Queue::Storage),
            "dispatch" => Ok(Queue::Dispatch),
            "driver" => Ok(Queue::Driver),
            other => Err(sitecart_core::DomainError::validation(format!(
                "unknown queue '{other}'"
            ))),
        }
    }
}

/// Sort key for queue entries: priority descending, then schedule ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueKey {
    pub priority: Priority,
    pub delivery_date: NaiveDate,
    pub time_slot: String,
    pub placed_at: DateTime<Utc>,
}

impl Ord for QueueKey {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .priority
            .cmp(&self.priority)
            .then_with(|| self.delivery_date.cmp(&other.delivery_date))
            .then_with(|| self.time_slot.cmp(&other.time_slot))
            .then_with(|| self.placed_at.cmp(&other.placed_at))
    }
}

impl PartialOrd for QueueKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
