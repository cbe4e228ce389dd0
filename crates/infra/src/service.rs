//! Application service in front of the fulfillment aggregate.
//!
//! Resolves reference data (vehicles, drivers) into command snapshots, runs
//! commands through the [`CommandDispatcher`], keeps the read models current
//! and announces status changes.

use std::sync::{Arc, Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use sitecart_core::{AggregateId, ExpectedVersion, TenantId};
use sitecart_fleet::{StaffDirectory, VehicleCatalog, VehicleId, VehicleSuggestion, suggest_vehicle};
use sitecart_fulfillment::{
    AssignVehicle, CustomerRef, DeliverySchedule, EmployeeRef, FulfillmentCommand, FulfillmentEvent,
    FulfillmentOrder, FulfillmentOrderId, NewOrderItem, OrderStatus, PlaceOrder, StartRoute,
    WorkflowTracking,
};

use crate::command_dispatcher::{CommandDispatcher, DispatchError};
use crate::event_store::{EventStore, StoredEvent};
use crate::notifications::StatusNotifier;
use crate::projections::{OrderBoardProjection, ProjectionError, WorkflowTrackingProjection};
use crate::read_model::InMemoryTenantStore;

pub type OrderBoard = OrderBoardProjection<Arc<InMemoryTenantStore<FulfillmentOrderId, FulfillmentOrder>>>;
pub type TrackingBoard =
    WorkflowTrackingProjection<Arc<InMemoryTenantStore<FulfillmentOrderId, WorkflowTracking>>>;

#[derive(Debug, Error)]
pub enum FulfillmentError {
    #[error(transparent)]
    Dispatch(#[from] DispatchError),

    #[error(transparent)]
    Projection(#[from] ProjectionError),

    #[error("vehicle {0} not found")]
    VehicleNotFound(VehicleId),

    #[error("employee {0} not found")]
    EmployeeNotFound(String),

    #[error("no active vehicle can carry this load")]
    NoSuitableVehicle,

    #[error("no orders on vehicle {0} are ready to start their route")]
    NothingToStart(VehicleId),

    #[error("route could not be started for any order on the vehicle")]
    RouteStartFailed(Vec<RouteStartFailure>),
}

/// What a stage operation changed.
#[derive(Debug, Clone)]
pub struct CommandOutcome {
    pub order: FulfillmentOrder,
    /// Set when this command moved the order to a new status.
    pub new_status: Option<OrderStatus>,
    /// Zero when the command was an accepted no-op (idempotent retry).
    pub events_committed: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStartFailure {
    pub order_id: FulfillmentOrderId,
    pub order_number: String,
    pub error: String,
}

/// Partial-success report of a bulk route start.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStartReport {
    pub vehicle_id: VehicleId,
    pub updated_orders: Vec<FulfillmentOrderId>,
    pub errors: Vec<RouteStartFailure>,
}

pub struct FulfillmentService<S> {
    dispatcher: CommandDispatcher<S>,
    catalog: Arc<dyn VehicleCatalog>,
    staff: Arc<dyn StaffDirectory>,
    board: OrderBoard,
    tracking: TrackingBoard,
    notifier: StatusNotifier,
    /// Held from dispatch until both read models have the committed events,
    /// so projections see each stream in commit order.
    write_lock: Mutex<()>,
}

impl<S: EventStore> FulfillmentService<S> {
    pub fn new(
        dispatcher: CommandDispatcher<S>,
        catalog: Arc<dyn VehicleCatalog>,
        staff: Arc<dyn StaffDirectory>,
        notifier: StatusNotifier,
    ) -> Self {
        Self {
            dispatcher,
            catalog,
            staff,
            board: OrderBoardProjection::new(Arc::new(InMemoryTenantStore::new())),
            tracking: WorkflowTrackingProjection::new(Arc::new(InMemoryTenantStore::new())),
            notifier,
            write_lock: Mutex::new(()),
        }
    }

    pub fn board(&self) -> &OrderBoard {
        &self.board
    }

    pub fn tracking_board(&self) -> &TrackingBoard {
        &self.tracking
    }

    pub fn catalog(&self) -> &dyn VehicleCatalog {
        self.catalog.as_ref()
    }

    pub fn staff(&self) -> &dyn StaffDirectory {
        self.staff.as_ref()
    }

    pub fn notifier(&self) -> &StatusNotifier {
        &self.notifier
    }

    /// Replay the whole store into both read models. Returns the event count.
    pub fn rebuild_read_models(&self) -> Result<usize, FulfillmentError> {
        let _write = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let events = self
            .dispatcher
            .store()
            .load_all()
            .map_err(DispatchError::from)?;
        let envelopes: Vec<_> = events.iter().map(StoredEvent::to_envelope).collect();

        self.board.rebuild_from_scratch(envelopes.clone())?;
        self.tracking.rebuild_from_scratch(envelopes)?;
        info!(events = events.len(), "read models rebuilt");
        Ok(events.len())
    }

    /// Run one stage operation against the live order.
    pub fn execute(
        &self,
        command: FulfillmentCommand,
        expected: ExpectedVersion,
    ) -> Result<CommandOutcome, FulfillmentError> {
        let tenant_id = command.tenant_id();
        let order_id = command.order_id();
        let name = command.name();

        // The lock orders writes and guards no data, so poison is ignored.
        let write_guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);

        let dispatched = self.dispatcher.dispatch(
            tenant_id,
            order_id.0,
            FulfillmentOrder::AGGREGATE_TYPE,
            command,
            expected,
            |_, id| FulfillmentOrder::empty(FulfillmentOrderId::new(id)),
        )?;

        let (mut board_stale, mut tracking_stale) = (false, false);
        for stored in &dispatched.committed {
            let env = stored.to_envelope();
            if let Err(err) = self.board.apply_envelope(&env) {
                warn!(%order_id, error = %err, "order board apply failed");
                board_stale = true;
            }
            if let Err(err) = self.tracking.apply_envelope(&env) {
                warn!(%order_id, error = %err, "tracking apply failed");
                tracking_stale = true;
            }
        }
        // The dispatched aggregate is folded from the full stream; it
        // replaces whatever the failed apply left behind.
        if board_stale {
            if let Err(err) = self.board.replace(tenant_id, dispatched.aggregate.clone()) {
                warn!(%order_id, error = %err, "order board repair failed");
            }
        }
        if tracking_stale {
            if let Err(err) = self.tracking.ensure(tenant_id, &dispatched.aggregate) {
                warn!(%order_id, error = %err, "tracking repair failed");
            }
        }
        drop(write_guard);
        self.notifier.announce(tenant_id, &dispatched.aggregate, &dispatched.events);

        let new_status = dispatched
            .events
            .iter()
            .filter_map(FulfillmentEvent::resulting_status)
            .last();
        if let Some(status) = new_status {
            info!(%order_id, command = name, %status, "order status changed");
        }

        Ok(CommandOutcome {
            events_committed: dispatched.committed.len(),
            order: dispatched.aggregate,
            new_status,
        })
    }

    /// Checkout boundary: create an order in `order-confirmed`.
    pub fn place_order(
        &self,
        tenant_id: TenantId,
        customer: CustomerRef,
        items: Vec<NewOrderItem>,
        schedule: DeliverySchedule,
        total_amount: u64,
        occurred_at: DateTime<Utc>,
    ) -> Result<CommandOutcome, FulfillmentError> {
        let order_id = FulfillmentOrderId::new(AggregateId::new());
        let command = FulfillmentCommand::PlaceOrder(PlaceOrder {
            tenant_id,
            order_id,
            order_number: order_id.order_number(occurred_at),
            customer,
            items,
            schedule,
            total_amount,
            occurred_at,
        });
        self.execute(command, ExpectedVersion::Exact(0))
    }

    /// Current order state, rehydrated from its stream.
    pub fn order(&self, tenant_id: TenantId, order_id: FulfillmentOrderId) -> Result<FulfillmentOrder, FulfillmentError> {
        let order = self
            .dispatcher
            .load(tenant_id, order_id.0, |_, id| FulfillmentOrder::empty(FulfillmentOrderId::new(id)))?;
        if !order.is_created() {
            return Err(DispatchError::NotFound("order".to_string()).into());
        }
        Ok(order)
    }

    /// The order's stored event log, oldest first.
    pub fn history(&self, tenant_id: TenantId, order_id: FulfillmentOrderId) -> Result<Vec<StoredEvent>, FulfillmentError> {
        let history = self.dispatcher.history(tenant_id, order_id.0)?;
        if history.is_empty() {
            return Err(DispatchError::NotFound("order".to_string()).into());
        }
        Ok(history)
    }

    /// Tracking record for an order, created on first read.
    pub fn tracking(&self, tenant_id: TenantId, order_id: FulfillmentOrderId) -> Result<WorkflowTracking, FulfillmentError> {
        let order = self.order(tenant_id, order_id)?;
        Ok(self.tracking.ensure(tenant_id, &order)?)
    }

    /// Requirement of the order and the smallest active vehicle able to carry it.
    pub fn suggest_vehicle(&self, tenant_id: TenantId, order_id: FulfillmentOrderId) -> Result<VehicleSuggestion, FulfillmentError> {
        let order = self.order(tenant_id, order_id)?;
        Ok(suggest_vehicle(self.catalog.as_ref(), order.requirement()))
    }

    /// Assign a vehicle and driver. Without `vehicle_id` the suggested vehicle is used.
    #[allow(clippy::too_many_arguments)]
    pub fn assign_vehicle(
        &self,
        tenant_id: TenantId,
        order_id: FulfillmentOrderId,
        vehicle_id: Option<VehicleId>,
        driver_id: &str,
        by: EmployeeRef,
        notes: Option<String>,
        occurred_at: DateTime<Utc>,
        expected: ExpectedVersion,
    ) -> Result<CommandOutcome, FulfillmentError> {
        let vehicle = match vehicle_id {
            Some(id) => self
                .catalog
                .get(&id)
                .ok_or(FulfillmentError::VehicleNotFound(id))?,
            None => self
                .suggest_vehicle(tenant_id, order_id)?
                .vehicle
                .ok_or(FulfillmentError::NoSuitableVehicle)?,
        };
        let driver = self
            .staff
            .get(driver_id)
            .ok_or_else(|| FulfillmentError::EmployeeNotFound(driver_id.to_string()))?;

        self.execute(
            FulfillmentCommand::AssignVehicle(AssignVehicle {
                tenant_id,
                order_id,
                vehicle,
                driver,
                by,
                notes,
                occurred_at,
            }),
            expected,
        )
    }

    /// Start the route for every ready order loaded on `vehicle_id`.
    ///
    /// Each order is decided on its own; one order's guard failure does not
    /// stop the others. Fails only when nothing qualifies or nothing succeeds.
    pub fn start_route_for_vehicle(
        &self,
        tenant_id: TenantId,
        vehicle_id: &VehicleId,
        by: EmployeeRef,
        occurred_at: DateTime<Utc>,
    ) -> Result<RouteStartReport, FulfillmentError> {
        if self.catalog.get(vehicle_id).is_none() {
            return Err(FulfillmentError::VehicleNotFound(vehicle_id.clone()));
        }

        let mut candidates: Vec<FulfillmentOrder> = self
            .board
            .list(tenant_id)
            .into_iter()
            .filter(|o| {
                o.is_active()
                    && o.status() == OrderStatus::AllocatedDispatchOfficer2
                    && o.assignment().is_some_and(|a| &a.vehicle_id == vehicle_id)
            })
            .collect();
        if candidates.is_empty() {
            return Err(FulfillmentError::NothingToStart(vehicle_id.clone()));
        }
        candidates.sort_by(|a, b| a.order_number().cmp(b.order_number()));

        let mut report = RouteStartReport {
            vehicle_id: vehicle_id.clone(),
            updated_orders: Vec::new(),
            errors: Vec::new(),
        };
        for order in candidates {
            let order_id = order.id_typed();
            let command = FulfillmentCommand::StartRoute(StartRoute {
                tenant_id,
                order_id,
                by: by.clone(),
                occurred_at,
            });
            match self.execute(command, ExpectedVersion::Any) {
                Ok(_) => report.updated_orders.push(order_id),
                Err(err) => report.errors.push(RouteStartFailure {
                    order_id,
                    order_number: order.order_number().to_string(),
                    error: err.to_string(),
                }),
            }
        }

        info!(
            %vehicle_id,
            started = report.updated_orders.len(),
            failed = report.errors.len(),
            "route start processed"
        );
        if report.updated_orders.is_empty() {
            return Err(FulfillmentError::RouteStartFailed(report.errors));
        }
        Ok(report)
    }
}
