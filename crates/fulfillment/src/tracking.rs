//! Workflow tracking: a per-order, stage-indexed view of the stage log.
//!
//! Never written directly by staff operations. It is either computed from a
//! rehydrated order ([`WorkflowTracking::from_order`]) or folded from the
//! order's events ([`WorkflowTracking::apply_event`]); both paths consume the
//! same [`StageRecord`]s, so `current_status` cannot drift from the order.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use sitecart_core::{AggregateRoot, DomainError, DomainResult};

use crate::events::{FulfillmentEvent, StageRecord};
use crate::model::EmployeeRef;
use crate::order::{FulfillmentOrder, FulfillmentOrderId};
use crate::status::{OrderStatus, Stage};

/// `{completed, completedAt, completedBy, ...stage-specific fields}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageProgress {
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub completed_by: Option<EmployeeRef>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

/// The seven stages. Records written by older versions may lack some; they
/// deserialize as not completed.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowStatus {
    #[serde(default)]
    pub pending: StageProgress,
    #[serde(default)]
    pub packed: StageProgress,
    #[serde(default)]
    pub storage: StageProgress,
    #[serde(default)]
    pub assigned: StageProgress,
    #[serde(default)]
    pub loaded: StageProgress,
    #[serde(default)]
    pub in_transit: StageProgress,
    #[serde(default)]
    pub delivered: StageProgress,
}

impl WorkflowStatus {
    pub fn get(&self, stage: Stage) -> &StageProgress {
        match stage {
            Stage::Pending => &self.pending,
            Stage::Packed => &self.packed,
            Stage::Storage => &self.storage,
            Stage::Assigned => &self.assigned,
            Stage::Loaded => &self.loaded,
            Stage::InTransit => &self.in_transit,
            Stage::Delivered => &self.delivered,
        }
    }

    fn get_mut(&mut self, stage: Stage) -> &mut StageProgress {
        match stage {
            Stage::Pending => &mut self.pending,
            Stage::Packed => &mut self.packed,
            Stage::Storage => &mut self.storage,
            Stage::Assigned => &mut self.assigned,
            Stage::Loaded => &mut self.loaded,
            Stage::InTransit => &mut self.in_transit,
            Stage::Delivered => &mut self.delivered,
        }
    }
}

/// Boolean summary returned by [`WorkflowTracking::progress`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageFlags {
    pub pending: bool,
    pub packed: bool,
    pub storage: bool,
    pub assigned: bool,
    pub loaded: bool,
    pub in_transit: bool,
    pub delivered: bool,
}

impl StageFlags {
    pub fn completed_count(&self) -> usize {
        [
            self.pending,
            self.packed,
            self.storage,
            self.assigned,
            self.loaded,
            self.in_transit,
            self.delivered,
        ]
        .into_iter()
        .filter(|done| *done)
        .count()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimingMetrics {
    #[serde(default)]
    pub order_placed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub expected_delivery_date: Option<NaiveDate>,
    #[serde(default)]
    pub dispatch_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub arrival_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub actual_delivery_time: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowTracking {
    pub order_id: FulfillmentOrderId,
    pub order_number: String,
    pub current_status: OrderStatus,
    #[serde(default)]
    pub workflow_status: WorkflowStatus,
    #[serde(default)]
    pub timing_metrics: TimingMetrics,
    pub is_active: bool,
    /// Order stream revision this view reflects.
    #[serde(default)]
    pub version: u64,
}

impl WorkflowTracking {
    /// Fresh record with every stage incomplete.
    pub fn synthesize(
        order_id: FulfillmentOrderId,
        order_number: impl Into<String>,
        current_status: OrderStatus,
    ) -> Self {
        Self {
            order_id,
            order_number: order_number.into(),
            current_status,
            workflow_status: WorkflowStatus::default(),
            timing_metrics: TimingMetrics::default(),
            is_active: true,
            version: 0,
        }
    }

    /// Build the full view from a rehydrated order, including every stage the
    /// order has already passed.
    pub fn from_order(order: &FulfillmentOrder) -> DomainResult<Self> {
        if !order.is_created() {
            return Err(DomainError::not_found("order"));
        }

        let mut tracking = Self::synthesize(
            order.id_typed(),
            order.order_number(),
            OrderStatus::OrderConfirmed,
        );
        for record in order.stage_log() {
            tracking.record_stage(record)?;
        }

        tracking.current_status = order.status();
        tracking.is_active = order.is_active();
        tracking.version = order.version();
        tracking.timing_metrics = TimingMetrics {
            order_placed_at: order.placed_at(),
            expected_delivery_date: order.schedule().map(|s| s.delivery_date),
            dispatch_time: order.delivery().route_started_at,
            arrival_time: order.delivery().arrived_at,
            actual_delivery_time: order.delivery().delivered_at,
        };
        Ok(tracking)
    }

    /// Mark a stage complete (or assert it is still open).
    ///
    /// Completion is monotonic: asking to reopen a completed stage is a guard
    /// violation, and re-completing keeps the first stamp. `current_status`
    /// follows the stage's conventional status but never moves backwards.
    pub fn update_stage(
        &mut self,
        stage: Stage,
        completed: bool,
        at: DateTime<Utc>,
        by: EmployeeRef,
        details: Map<String, Value>,
    ) -> DomainResult<()> {
        let slot = self.workflow_status.get_mut(stage);

        if !completed {
            if slot.completed {
                return Err(DomainError::guard(format!(
                    "stage {stage} is already complete and cannot be reopened"
                )));
            }
            return Ok(());
        }
        if slot.completed {
            return Ok(());
        }

        slot.completed = true;
        slot.completed_at = Some(at);
        slot.completed_by = Some(by);
        slot.details.extend(details);

        if let Some(status) = stage.status_on_completion() {
            if status > self.current_status {
                self.current_status = status;
            }
        }
        Ok(())
    }

    fn record_stage(&mut self, record: &StageRecord) -> DomainResult<()> {
        self.update_stage(
            record.stage,
            true,
            record.completed_at,
            record.completed_by.clone(),
            record.details.clone(),
        )
    }

    /// Fold one order event into the view.
    pub fn apply_event(&mut self, event: &FulfillmentEvent) -> DomainResult<()> {
        match event {
            FulfillmentEvent::OrderPlaced(e) => {
                self.order_number = e.order_number.clone();
                self.timing_metrics.order_placed_at = Some(e.occurred_at);
                self.timing_metrics.expected_delivery_date = Some(e.schedule.delivery_date);
                self.is_active = true;
            }
            FulfillmentEvent::RouteStarted(e) => {
                self.timing_metrics.dispatch_time = Some(e.occurred_at);
            }
            FulfillmentEvent::ArrivalRecorded(e) => {
                self.timing_metrics.arrival_time = Some(e.occurred_at);
            }
            FulfillmentEvent::DeliveryCompleted(e) => {
                self.timing_metrics.actual_delivery_time = Some(e.occurred_at);
            }
            FulfillmentEvent::OrderDeactivated(_) => {
                self.is_active = false;
            }
            _ => {}
        }

        if let Some(record) = event.stage_record() {
            self.record_stage(&record)?;
        }
        if let Some(status) = event.resulting_status() {
            self.current_status = status;
        }
        self.version += 1;
        Ok(())
    }

    pub fn is_complete(&self, stage: Stage) -> bool {
        self.workflow_status.get(stage).completed
    }

    pub fn progress(&self) -> StageFlags {
        let ws = &self.workflow_status;
        StageFlags {
            pending: ws.pending.completed,
            packed: ws.packed.completed,
            storage: ws.storage.completed,
            assigned: ws.assigned.completed,
            loaded: ws.loaded.completed,
            in_transit: ws.in_transit.completed,
            delivered: ws.delivered.completed,
        }
    }

    /// Label for the driver dashboard.
    pub fn driver_status(&self) -> &'static str {
        self.current_status.driver_label()
    }
}
