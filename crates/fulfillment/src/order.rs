use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sitecart_core::{Aggregate, AggregateId, AggregateRoot, DomainError, TenantId};
use sitecart_fleet::{CargoLine, LoadRequirement, requirement_for};

use crate::commands::*;
use crate::events::*;
use crate::model::{
    AssignmentDetails, Complaint, ComplaintScope, CustomerRef, DeliveryDetails, DeliveryPhoto,
    DeliverySchedule, DriverRef, DriverVerification, EmployeeRef, OrderItem, PackingDetails,
    PackingStatus, StorageDetails,
};
use crate::status::OrderStatus;

/// Hex digits of the UUIDv7 random tail kept in an order number.
const ORDER_NUMBER_SUFFIX_LEN: usize = 12;

/// Order identifier (tenant-scoped via `tenant_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FulfillmentOrderId(pub AggregateId);

impl FulfillmentOrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }

    /// Human-readable order number: `ORD-YYMMDD-XXXXXXXXXXXX`, the suffix
    /// being the last 48 random bits of the UUIDv7.
    pub fn order_number(&self, placed_at: DateTime<Utc>) -> String {
        let hex = self.0.as_uuid().simple().to_string();
        let suffix = &hex[hex.len() - ORDER_NUMBER_SUFFIX_LEN..];
        format!(
            "ORD-{}-{}",
            placed_at.format("%y%m%d"),
            suffix.to_ascii_uppercase()
        )
    }
}

impl core::fmt::Display for FulfillmentOrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Aggregate root: one customer order moving through the fulfillment pipeline.
///
/// This is the only writable representation of an order. Its `stage_log` is
/// rebuilt from the event stream and is append-only.
#[derive(Debug, Clone, PartialEq)]
pub struct FulfillmentOrder {
    id: FulfillmentOrderId,
    tenant_id: Option<TenantId>,
    order_number: String,
    customer: Option<CustomerRef>,
    schedule: Option<DeliverySchedule>,
    total_amount: u64,
    placed_at: Option<DateTime<Utc>>,
    status: OrderStatus,
    is_active: bool,
    items: Vec<OrderItem>,
    packing: PackingDetails,
    storage: StorageDetails,
    assignment: Option<AssignmentDetails>,
    driver_verification: Option<DriverVerification>,
    delivery: DeliveryDetails,
    stage_log: Vec<StageRecord>,
    version: u64,
    created: bool,
}

impl FulfillmentOrder {
    /// Stream type recorded with every stored order event.
    pub const AGGREGATE_TYPE: &'static str = "fulfillment.order";

    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: FulfillmentOrderId) -> Self {
        Self {
            id,
            tenant_id: None,
            order_number: String::new(),
            customer: None,
            schedule: None,
            total_amount: 0,
            placed_at: None,
            status: OrderStatus::OrderConfirmed,
            is_active: false,
            items: Vec::new(),
            packing: PackingDetails::default(),
            storage: StorageDetails::default(),
            assignment: None,
            driver_verification: None,
            delivery: DeliveryDetails::default(),
            stage_log: Vec::new(),
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> FulfillmentOrderId {
        self.id
    }

    pub fn tenant_id(&self) -> Option<TenantId> {
        self.tenant_id
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn order_number(&self) -> &str {
        &self.order_number
    }

    pub fn customer(&self) -> Option<&CustomerRef> {
        self.customer.as_ref()
    }

    pub fn schedule(&self) -> Option<&DeliverySchedule> {
        self.schedule.as_ref()
    }

    pub fn total_amount(&self) -> u64 {
        self.total_amount
    }

    pub fn placed_at(&self) -> Option<DateTime<Utc>> {
        self.placed_at
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn packing(&self) -> &PackingDetails {
        &self.packing
    }

    pub fn storage(&self) -> &StorageDetails {
        &self.storage
    }

    pub fn assignment(&self) -> Option<&AssignmentDetails> {
        self.assignment.as_ref()
    }

    pub fn driver_verification(&self) -> Option<&DriverVerification> {
        self.driver_verification.as_ref()
    }

    pub fn is_driver_verified(&self) -> bool {
        self.driver_verification.as_ref().is_some_and(|v| v.verified)
    }

    pub fn delivery(&self) -> &DeliveryDetails {
        &self.delivery
    }

    pub fn stage_log(&self) -> &[StageRecord] {
        &self.stage_log
    }

    /// Footprint of everything that will actually be loaded.
    pub fn requirement(&self) -> LoadRequirement {
        requirement_for(
            self.items
                .iter()
                .filter(|i| i.packing_status != PackingStatus::Unavailable)
                .map(|i| CargoLine {
                    weight_label: i.weight_label.as_deref(),
                    quantity: i.quantity,
                }),
        )
    }
}

impl AggregateRoot for FulfillmentOrder {
    type Id = FulfillmentOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

impl Aggregate for FulfillmentOrder {
    type Command = FulfillmentCommand;
    type Event = FulfillmentEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            FulfillmentEvent::OrderPlaced(e) => {
                self.id = e.order_id;
                self.tenant_id = Some(e.tenant_id);
                self.order_number = e.order_number.clone();
                self.customer = Some(e.customer.clone());
                self.schedule = Some(e.schedule.clone());
                self.total_amount = e.total_amount;
                self.placed_at = Some(e.occurred_at);
                self.items = e.items.iter().map(OrderItem::from_new).collect();
                self.is_active = true;
                self.created = true;
                self.packing = PackingDetails::default();
                self.storage = StorageDetails::default();
                self.packing.recompute(&self.items);
                self.storage.recompute(&self.items);
            }
            FulfillmentEvent::PackingStarted(e) => {
                self.packing.started_at = Some(e.occurred_at);
                self.packing.started_by = Some(e.started_by.clone());
            }
            FulfillmentEvent::ItemPacked(e) => {
                if let Some(item) = self.items.get_mut(e.item_index) {
                    item.packing_status = e.packing_status;
                    item.packed_at = Some(e.occurred_at);
                    item.packed_by = Some(e.packed_by.clone());
                }
                self.packing.recompute(&self.items);
            }
            FulfillmentEvent::PackingComplaintReported(e) => {
                if let Some(item) = self.items.get_mut(e.item_index) {
                    item.item_complaints.push(e.complaint.clone());
                    if e.marks_unavailable {
                        item.packing_status = PackingStatus::Unavailable;
                        item.packed_at = Some(e.occurred_at);
                        item.packed_by = Some(e.complaint.reported_by.clone());
                    }
                }
                self.packing.recompute(&self.items);
            }
            FulfillmentEvent::PackingCompleted(e) => {
                self.packing.completed_at = Some(e.occurred_at);
                self.packing.completed_by = Some(e.completed_by.clone());
                self.packing.notes = e.notes.clone();
            }
            FulfillmentEvent::StorageItemVerified(e) => {
                if let Some(item) = self.items.get_mut(e.item_index) {
                    item.storage_verified = true;
                    item.storage_condition = Some(e.condition);
                    item.verified_at = Some(e.occurred_at);
                    item.verified_by = Some(e.verified_by.clone());
                }
                self.storage.recompute(&self.items);
            }
            FulfillmentEvent::StorageComplaintReported(e) => {
                if let Some(item) = self.items.get_mut(e.item_index) {
                    item.storage_complaints.push(e.complaint.clone());
                    item.storage_verified = false;
                    item.verified_at = None;
                    item.verified_by = None;
                }
                self.storage.recompute(&self.items);
            }
            FulfillmentEvent::ComplaintResolved(e) => {
                if let Some(item) = self.items.get_mut(e.item_index) {
                    let at = e.occurred_at;
                    let by = e.resolved_by.clone();
                    let resolution = e.resolution.clone();
                    match e.scope {
                        ComplaintScope::Packing => {
                            if let Some(c) = item
                                .item_complaints
                                .iter_mut()
                                .find(|c| c.complaint_id == e.complaint_id)
                            {
                                c.resolve(resolution, by, at);
                            }
                        }
                        ComplaintScope::Storage => {
                            if let Some(c) = item
                                .storage_complaints
                                .iter_mut()
                                .find(|c| c.complaint_id == e.complaint_id)
                            {
                                c.resolve(resolution, by, at);
                            }
                        }
                    }
                }
            }
            FulfillmentEvent::StorageCompleted(e) => {
                self.storage.completed_at = Some(e.occurred_at);
                self.storage.completed_by = Some(e.completed_by.clone());
                self.storage.storage_location = Some(e.storage_location.clone());
                self.storage.notes = e.notes.clone();
            }
            FulfillmentEvent::VehicleAssigned(e) => {
                self.assignment = Some(e.assignment.clone());
            }
            FulfillmentEvent::DriverVerificationRecorded(e) => {
                self.driver_verification = Some(e.verification.clone());
            }
            FulfillmentEvent::RouteStarted(e) => {
                self.delivery.route_started_at = Some(e.occurred_at);
            }
            FulfillmentEvent::ArrivalRecorded(e) => {
                self.delivery.arrived_at = Some(e.occurred_at);
                self.delivery.arrival_location = e.location.clone();
            }
            FulfillmentEvent::DeliveryPhotoUploaded(e) => {
                self.delivery.delivery_photos.push(e.photo.clone());
            }
            FulfillmentEvent::DeliveryCompleted(e) => {
                self.delivery.delivered_at = Some(e.occurred_at);
                self.delivery.delivered_by = Some(e.delivered_by.clone());
                self.delivery.customer_confirmed = e.customer_confirmed;
                self.delivery.recipient_name = e.recipient_name.clone();
                self.delivery.notes = e.notes.clone();
            }
            FulfillmentEvent::OrderDeactivated(_) => {
                self.is_active = false;
            }
        }

        if let Some(status) = event.resulting_status() {
            self.status = status;
        }
        if let Some(record) = event.stage_record() {
            self.stage_log.push(record);
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        let events = match command {
            FulfillmentCommand::PlaceOrder(cmd) => self.handle_place(cmd),
            FulfillmentCommand::StartPacking(cmd) => self.handle_start_packing(cmd),
            FulfillmentCommand::PackItem(cmd) => self.handle_pack_item(cmd),
            FulfillmentCommand::ReportPackingComplaint(cmd) => self.handle_packing_complaint(cmd),
            FulfillmentCommand::CompletePacking(cmd) => self.handle_complete_packing(cmd),
            FulfillmentCommand::VerifyStorageItem(cmd) => self.handle_verify_storage_item(cmd),
            FulfillmentCommand::ReportStorageComplaint(cmd) => self.handle_storage_complaint(cmd),
            FulfillmentCommand::ResolveComplaint(cmd) => self.handle_resolve_complaint(cmd),
            FulfillmentCommand::CompleteStorage(cmd) => self.handle_complete_storage(cmd),
            FulfillmentCommand::AssignVehicle(cmd) => self.handle_assign_vehicle(cmd),
            FulfillmentCommand::VerifyByDriver(cmd) => self.handle_driver_verify(cmd),
            FulfillmentCommand::StartRoute(cmd) => self.handle_start_route(cmd),
            FulfillmentCommand::MarkArrived(cmd) => self.handle_mark_arrived(cmd),
            FulfillmentCommand::UploadDeliveryPhoto(cmd) => self.handle_upload_photo(cmd),
            FulfillmentCommand::CompleteDelivery(cmd) => self.handle_complete_delivery(cmd),
            FulfillmentCommand::DeactivateOrder(cmd) => self.handle_deactivate(cmd),
        }?;
        self.ensure_transitions(&events)?;
        Ok(events)
    }
}

impl FulfillmentOrder {
    fn ensure_exists(&self, tenant_id: TenantId, order_id: FulfillmentOrderId) -> Result<(), DomainError> {
        if !self.created || self.tenant_id != Some(tenant_id) {
            return Err(DomainError::not_found("order"));
        }
        if self.id != order_id {
            return Err(DomainError::guard("order_id mismatch"));
        }
        Ok(())
    }

    /// Exists, belongs to the tenant, and has not been deactivated.
    fn ensure_live(&self, tenant_id: TenantId, order_id: FulfillmentOrderId) -> Result<(), DomainError> {
        self.ensure_exists(tenant_id, order_id)?;
        if !self.is_active {
            return Err(DomainError::guard("order is inactive"));
        }
        Ok(())
    }

    fn ensure_status(&self, expected: OrderStatus, action: &str) -> Result<(), DomainError> {
        if self.status != expected {
            return Err(DomainError::guard(format!(
                "cannot {action} while order is {} (requires {expected})",
                self.status
            )));
        }
        Ok(())
    }

    /// Status changes carried by `events` must walk the status table one
    /// step at a time, starting from the current status.
    fn ensure_transitions(&self, events: &[FulfillmentEvent]) -> Result<(), DomainError> {
        let mut current = self.created.then_some(self.status);
        for to in events.iter().filter_map(FulfillmentEvent::resulting_status) {
            if let Some(from) = current {
                if !from.can_transition_to(to) {
                    return Err(DomainError::guard(format!(
                        "illegal status transition {from} -> {to}"
                    )));
                }
            }
            current = Some(to);
        }
        Ok(())
    }

    fn item(&self, index: usize) -> Result<&OrderItem, DomainError> {
        self.items
            .get(index)
            .ok_or_else(|| DomainError::not_found(format!("item {index}")))
    }

    /// Packing item operations on a freshly confirmed order start packing first.
    fn packing_preamble(
        &self,
        tenant_id: TenantId,
        by: &EmployeeRef,
        occurred_at: DateTime<Utc>,
        action: &str,
    ) -> Result<Vec<FulfillmentEvent>, DomainError> {
        if self.status == OrderStatus::OrderConfirmed {
            return Ok(vec![FulfillmentEvent::PackingStarted(PackingStarted {
                tenant_id,
                order_id: self.id,
                started_by: by.clone(),
                occurred_at,
            })]);
        }
        self.ensure_status(OrderStatus::PickingOrder, action)?;
        Ok(Vec::new())
    }

    fn handle_place(&self, cmd: &PlaceOrder) -> Result<Vec<FulfillmentEvent>, DomainError> {
        if self.created {
            return Err(DomainError::conflict("order already exists"));
        }
        if cmd.order_number.trim().is_empty() {
            return Err(DomainError::validation("order_number must not be empty"));
        }
        if cmd.items.is_empty() {
            return Err(DomainError::validation("order must contain at least one item"));
        }
        if let Some(bad) = cmd.items.iter().find(|i| i.quantity == 0) {
            return Err(DomainError::validation(format!(
                "quantity must be positive for {}",
                bad.product_id
            )));
        }
        if cmd.items.iter().any(|i| i.name.trim().is_empty()) {
            return Err(DomainError::validation("item name must not be empty"));
        }
        if cmd.schedule.delivery_address.trim().is_empty() {
            return Err(DomainError::validation("delivery address must not be empty"));
        }

        Ok(vec![FulfillmentEvent::OrderPlaced(OrderPlaced {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            order_number: cmd.order_number.clone(),
            customer: cmd.customer.clone(),
            items: cmd.items.clone(),
            schedule: cmd.schedule.clone(),
            total_amount: cmd.total_amount,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_start_packing(&self, cmd: &StartPacking) -> Result<Vec<FulfillmentEvent>, DomainError> {
        self.ensure_live(cmd.tenant_id, cmd.order_id)?;
        if self.status == OrderStatus::PickingOrder {
            return Ok(Vec::new());
        }
        self.ensure_status(OrderStatus::OrderConfirmed, "start packing")?;

        Ok(vec![FulfillmentEvent::PackingStarted(PackingStarted {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            started_by: cmd.by.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_pack_item(&self, cmd: &PackItem) -> Result<Vec<FulfillmentEvent>, DomainError> {
        self.ensure_live(cmd.tenant_id, cmd.order_id)?;
        if !cmd.packing_status.is_resolved() {
            return Err(DomainError::validation(
                "packing_status must be packed or unavailable",
            ));
        }
        let item = self.item(cmd.item_index)?;
        let mut events = self.packing_preamble(cmd.tenant_id, &cmd.by, cmd.occurred_at, "pack items")?;
        if item.packing_status == cmd.packing_status {
            return Ok(events);
        }

        events.push(FulfillmentEvent::ItemPacked(ItemPacked {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            item_index: cmd.item_index,
            packing_status: cmd.packing_status,
            packed_by: cmd.by.clone(),
            occurred_at: cmd.occurred_at,
        }));
        Ok(events)
    }

    fn handle_packing_complaint(
        &self,
        cmd: &ReportPackingComplaint,
    ) -> Result<Vec<FulfillmentEvent>, DomainError> {
        self.ensure_live(cmd.tenant_id, cmd.order_id)?;
        let item = self.item(cmd.item_index)?;
        let mut events =
            self.packing_preamble(cmd.tenant_id, &cmd.by, cmd.occurred_at, "report packing complaints")?;

        let complaint_id = format!(
            "{}-P{}-{}",
            self.order_number,
            cmd.item_index + 1,
            item.item_complaints.len() + 1
        );
        events.push(FulfillmentEvent::PackingComplaintReported(PackingComplaintReported {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            item_index: cmd.item_index,
            complaint: Complaint {
                complaint_id,
                complaint_type: cmd.complaint_type,
                description: cmd.description.trim().to_owned(),
                reported_by: cmd.by.clone(),
                reported_at: cmd.occurred_at,
                resolved: false,
                resolution: None,
                resolved_by: None,
                resolved_at: None,
            },
            marks_unavailable: cmd.complaint_type.forces_unavailable(),
            occurred_at: cmd.occurred_at,
        }));
        Ok(events)
    }

    fn handle_complete_packing(
        &self,
        cmd: &CompletePacking,
    ) -> Result<Vec<FulfillmentEvent>, DomainError> {
        self.ensure_live(cmd.tenant_id, cmd.order_id)?;
        self.ensure_status(OrderStatus::PickingOrder, "complete packing")?;

        let pending = self.packing.pending_items();
        if pending > 0 {
            return Err(DomainError::guard(format!(
                "{pending} items still pending packing"
            )));
        }

        Ok(vec![FulfillmentEvent::PackingCompleted(PackingCompleted {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            completed_by: cmd.by.clone(),
            items_packed: self.packing.total_items_packed,
            items_unavailable: self.packing.total_items_unavailable,
            notes: cmd.notes.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_verify_storage_item(
        &self,
        cmd: &VerifyStorageItem,
    ) -> Result<Vec<FulfillmentEvent>, DomainError> {
        self.ensure_live(cmd.tenant_id, cmd.order_id)?;
        self.ensure_status(OrderStatus::AllocatedDriver, "verify storage")?;
        let item = self.item(cmd.item_index)?;
        if item.storage_verified && item.storage_condition == Some(cmd.condition) {
            return Ok(Vec::new());
        }

        Ok(vec![FulfillmentEvent::StorageItemVerified(StorageItemVerified {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            item_index: cmd.item_index,
            condition: cmd.condition,
            verified_by: cmd.by.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_storage_complaint(
        &self,
        cmd: &ReportStorageComplaint,
    ) -> Result<Vec<FulfillmentEvent>, DomainError> {
        self.ensure_live(cmd.tenant_id, cmd.order_id)?;
        self.ensure_status(OrderStatus::AllocatedDriver, "report storage complaints")?;
        let item = self.item(cmd.item_index)?;

        let complaint_id = format!(
            "{}-S{}-{}",
            self.order_number,
            cmd.item_index + 1,
            item.storage_complaints.len() + 1
        );
        Ok(vec![FulfillmentEvent::StorageComplaintReported(StorageComplaintReported {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            item_index: cmd.item_index,
            complaint: Complaint {
                complaint_id,
                complaint_type: cmd.complaint_type,
                description: cmd.description.trim().to_owned(),
                reported_by: cmd.by.clone(),
                reported_at: cmd.occurred_at,
                resolved: false,
                resolution: None,
                resolved_by: None,
                resolved_at: None,
            },
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_resolve_complaint(
        &self,
        cmd: &ResolveComplaint,
    ) -> Result<Vec<FulfillmentEvent>, DomainError> {
        self.ensure_live(cmd.tenant_id, cmd.order_id)?;
        if self.status.is_terminal() {
            return Err(DomainError::guard("order is already complete"));
        }
        if cmd.resolution.trim().is_empty() {
            return Err(DomainError::validation("resolution must not be empty"));
        }
        let item = self.item(cmd.item_index)?;
        let already_resolved = match cmd.scope {
            ComplaintScope::Packing => item
                .item_complaints
                .iter()
                .find(|c| c.complaint_id == cmd.complaint_id)
                .map(|c| c.resolved),
            ComplaintScope::Storage => item
                .storage_complaints
                .iter()
                .find(|c| c.complaint_id == cmd.complaint_id)
                .map(|c| c.resolved),
        }
        .ok_or_else(|| DomainError::not_found(format!("complaint {}", cmd.complaint_id)))?;

        if already_resolved {
            return Ok(Vec::new());
        }

        Ok(vec![FulfillmentEvent::ComplaintResolved(ComplaintResolved {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            item_index: cmd.item_index,
            scope: cmd.scope,
            complaint_id: cmd.complaint_id.clone(),
            resolution: cmd.resolution.trim().to_owned(),
            resolved_by: cmd.by.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_complete_storage(
        &self,
        cmd: &CompleteStorage,
    ) -> Result<Vec<FulfillmentEvent>, DomainError> {
        self.ensure_live(cmd.tenant_id, cmd.order_id)?;
        self.ensure_status(OrderStatus::AllocatedDriver, "complete storage verification")?;
        if cmd.storage_location.trim().is_empty() {
            return Err(DomainError::validation("storage_location must not be empty"));
        }

        let unresolved = self.items.iter().filter(|i| !i.storage_resolved()).count();
        if unresolved > 0 {
            return Err(DomainError::guard(format!(
                "{unresolved} items still awaiting storage verification"
            )));
        }

        Ok(vec![FulfillmentEvent::StorageCompleted(StorageCompleted {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            completed_by: cmd.by.clone(),
            storage_location: cmd.storage_location.trim().to_owned(),
            items_verified: self.storage.items_verified,
            items_with_complaints: self.storage.items_with_complaints,
            notes: cmd.notes.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_assign_vehicle(
        &self,
        cmd: &AssignVehicle,
    ) -> Result<Vec<FulfillmentEvent>, DomainError> {
        self.ensure_live(cmd.tenant_id, cmd.order_id)?;
        self.ensure_status(OrderStatus::ReadyToPickup, "assign a vehicle")?;

        if !cmd.vehicle.active {
            return Err(DomainError::guard(format!(
                "vehicle {} is not active",
                cmd.vehicle.vehicle_id
            )));
        }
        if !cmd.driver.can_drive() {
            return Err(DomainError::guard(format!(
                "employee {} is not an available driver",
                cmd.driver.employee_id
            )));
        }

        let requirement = self.requirement();
        cmd.vehicle
            .capacity
            .accommodates(&requirement)
            .map_err(|shortfall| DomainError::guard(shortfall.to_string()))?;

        Ok(vec![FulfillmentEvent::VehicleAssigned(VehicleAssigned {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            assignment: AssignmentDetails {
                vehicle_id: cmd.vehicle.vehicle_id.clone(),
                registration_number: cmd.vehicle.registration_number.clone(),
                category: cmd.vehicle.category,
                capacity: cmd.vehicle.capacity,
                driver: DriverRef {
                    employee_id: cmd.driver.employee_id.clone(),
                    name: cmd.driver.name.clone(),
                    phone: cmd.driver.phone.clone(),
                },
                requirement,
                assigned_by: cmd.by.clone(),
                assigned_at: cmd.occurred_at,
                notes: cmd.notes.clone(),
            },
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_driver_verify(&self, cmd: &VerifyByDriver) -> Result<Vec<FulfillmentEvent>, DomainError> {
        self.ensure_live(cmd.tenant_id, cmd.order_id)?;
        self.ensure_status(OrderStatus::AllocatedDispatchOfficer2, "verify the load")?;

        let assigned_driver = self
            .assignment
            .as_ref()
            .map(|a| a.driver.employee_id.as_str())
            .ok_or_else(|| DomainError::guard("order has no assigned driver"))?;
        if assigned_driver != cmd.by.employee_id {
            return Err(DomainError::guard(
                "only the assigned driver can verify this order",
            ));
        }

        if self.is_driver_verified() {
            if cmd.verified {
                return Ok(Vec::new());
            }
            return Err(DomainError::guard(
                "driver verification cannot be withdrawn once given",
            ));
        }

        Ok(vec![FulfillmentEvent::DriverVerificationRecorded(
            DriverVerificationRecorded {
                tenant_id: cmd.tenant_id,
                order_id: cmd.order_id,
                verification: DriverVerification {
                    verified: cmd.verified,
                    verified_by: cmd.by.clone(),
                    verified_at: cmd.occurred_at,
                    notes: cmd.notes.clone(),
                },
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_start_route(&self, cmd: &StartRoute) -> Result<Vec<FulfillmentEvent>, DomainError> {
        self.ensure_live(cmd.tenant_id, cmd.order_id)?;
        if self.status == OrderStatus::OnRoute {
            return Ok(Vec::new());
        }
        self.ensure_status(OrderStatus::AllocatedDispatchOfficer2, "start the route")?;
        if !self.is_driver_verified() {
            return Err(DomainError::guard("driver has not verified this order"));
        }
        let vehicle_id = self
            .assignment
            .as_ref()
            .map(|a| a.vehicle_id.clone())
            .ok_or_else(|| DomainError::guard("order has no assigned vehicle"))?;

        Ok(vec![FulfillmentEvent::RouteStarted(RouteStarted {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            vehicle_id,
            started_by: cmd.by.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_mark_arrived(&self, cmd: &MarkArrived) -> Result<Vec<FulfillmentEvent>, DomainError> {
        self.ensure_live(cmd.tenant_id, cmd.order_id)?;
        self.ensure_status(OrderStatus::OnRoute, "mark arrival")?;
        if self.delivery.arrived_at.is_some() {
            return Ok(Vec::new());
        }

        Ok(vec![FulfillmentEvent::ArrivalRecorded(ArrivalRecorded {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            location: cmd.location.clone(),
            recorded_by: cmd.by.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_upload_photo(
        &self,
        cmd: &UploadDeliveryPhoto,
    ) -> Result<Vec<FulfillmentEvent>, DomainError> {
        self.ensure_live(cmd.tenant_id, cmd.order_id)?;
        self.ensure_status(OrderStatus::OnRoute, "upload delivery photos")?;
        if cmd.url.trim().is_empty() {
            return Err(DomainError::validation("photo url must not be empty"));
        }

        let photo_id = format!(
            "{}-PH{}",
            self.order_number,
            self.delivery.delivery_photos.len() + 1
        );
        Ok(vec![FulfillmentEvent::DeliveryPhotoUploaded(DeliveryPhotoUploaded {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            photo: DeliveryPhoto {
                photo_id,
                url: cmd.url.trim().to_owned(),
                caption: cmd.caption.clone(),
                uploaded_by: cmd.by.clone(),
                uploaded_at: cmd.occurred_at,
            },
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_complete_delivery(
        &self,
        cmd: &CompleteDelivery,
    ) -> Result<Vec<FulfillmentEvent>, DomainError> {
        self.ensure_live(cmd.tenant_id, cmd.order_id)?;
        self.ensure_status(OrderStatus::OnRoute, "complete delivery")?;
        if self.delivery.delivery_photos.is_empty() {
            return Err(DomainError::guard("at least one delivery photo is required"));
        }
        if !cmd.customer_confirmed {
            return Err(DomainError::guard("customer confirmation is required"));
        }

        Ok(vec![FulfillmentEvent::DeliveryCompleted(DeliveryCompleted {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            delivered_by: cmd.by.clone(),
            customer_confirmed: cmd.customer_confirmed,
            recipient_name: cmd.recipient_name.clone(),
            photo_count: self.delivery.delivery_photos.len(),
            notes: cmd.notes.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_deactivate(&self, cmd: &DeactivateOrder) -> Result<Vec<FulfillmentEvent>, DomainError> {
        self.ensure_exists(cmd.tenant_id, cmd.order_id)?;
        if !self.is_active {
            return Ok(Vec::new());
        }
        if !self.status.allows_deactivation() {
            return Err(DomainError::guard(format!(
                "order can no longer be cancelled once {}",
                self.status
            )));
        }

        Ok(vec![FulfillmentEvent::OrderDeactivated(OrderDeactivated {
            tenant_id: cmd.tenant_id,
            order_id: cmd.order_id,
            reason: cmd.reason.clone(),
            deactivated_by: cmd.by.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::model::{
        NewOrderItem, PackingComplaintType, StorageComplaintType, StorageCondition,
    };
    use crate::status::Stage;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use sitecart_events::execute;
    use sitecart_fleet::{Capacity, Employee, StaffRole, Vehicle, VehicleCategory, VehicleId};

    pub(crate) struct Fixture {
        pub tenant_id: TenantId,
        pub order_id: FulfillmentOrderId,
        pub order: FulfillmentOrder,
        pub history: Vec<FulfillmentEvent>,
    }

    pub(crate) fn staff(id: &str) -> EmployeeRef {
        EmployeeRef::new(id, format!("Staff {id}"))
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    pub(crate) fn item(name: &str, quantity: u32, weight_label: Option<&str>) -> NewOrderItem {
        NewOrderItem {
            product_id: name.to_lowercase(),
            name: name.to_owned(),
            quantity,
            unit_price: 1_000,
            weight_label: weight_label.map(str::to_owned),
        }
    }

    pub(crate) fn vehicle(id: &str, volume: f64, weight: f64, packages: u32) -> Vehicle {
        Vehicle {
            vehicle_id: VehicleId::new(id),
            registration_number: format!("KAA {id}"),
            category: VehicleCategory::Van,
            capacity: Capacity::new(volume, weight, packages),
            active: true,
        }
    }

    pub(crate) fn driver(id: &str) -> Employee {
        Employee {
            employee_id: id.to_owned(),
            name: format!("Driver {id}"),
            role: StaffRole::Driver,
            phone: Some("+254700000000".into()),
            active: true,
            available: true,
        }
    }

    impl Fixture {
        pub(crate) fn placed(items: Vec<NewOrderItem>) -> Self {
            let tenant_id = TenantId::new();
            let order_id = FulfillmentOrderId::new(AggregateId::new());
            let mut order = FulfillmentOrder::empty(order_id);
            let at = now();
            let history = execute(
                &mut order,
                &FulfillmentCommand::PlaceOrder(PlaceOrder {
                    tenant_id,
                    order_id,
                    order_number: order_id.order_number(at),
                    customer: CustomerRef {
                        customer_id: "+254711111111".into(),
                        name: Some("Wanjiru".into()),
                    },
                    items,
                    schedule: DeliverySchedule {
                        delivery_date: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
                        time_slot: "08:00-12:00".into(),
                        delivery_address: "Plot 14, Ruiru".into(),
                    },
                    total_amount: 25_000,
                    occurred_at: at,
                }),
            )
            .unwrap();
            Self {
                tenant_id,
                order_id,
                order,
                history,
            }
        }

        pub(crate) fn run(&mut self, cmd: FulfillmentCommand) -> Result<Vec<FulfillmentEvent>, DomainError> {
            let events = execute(&mut self.order, &cmd)?;
            self.history.extend(events.iter().cloned());
            Ok(events)
        }

        pub(crate) fn pack(&mut self, index: usize, status: PackingStatus) -> Result<Vec<FulfillmentEvent>, DomainError> {
            self.run(FulfillmentCommand::PackItem(PackItem {
                tenant_id: self.tenant_id,
                order_id: self.order_id,
                item_index: index,
                packing_status: status,
                by: staff("EMP-P01"),
                occurred_at: now(),
            }))
        }

        pub(crate) fn complain(
            &mut self,
            index: usize,
            complaint_type: PackingComplaintType,
        ) -> Result<Vec<FulfillmentEvent>, DomainError> {
            self.run(FulfillmentCommand::ReportPackingComplaint(ReportPackingComplaint {
                tenant_id: self.tenant_id,
                order_id: self.order_id,
                item_index: index,
                complaint_type,
                description: "shelf empty".into(),
                by: staff("EMP-P01"),
                occurred_at: now(),
            }))
        }

        pub(crate) fn complete_packing(&mut self) -> Result<Vec<FulfillmentEvent>, DomainError> {
            self.run(FulfillmentCommand::CompletePacking(CompletePacking {
                tenant_id: self.tenant_id,
                order_id: self.order_id,
                by: staff("EMP-P01"),
                notes: None,
                occurred_at: now(),
            }))
        }

        pub(crate) fn verify(&mut self, index: usize) -> Result<Vec<FulfillmentEvent>, DomainError> {
            self.run(FulfillmentCommand::VerifyStorageItem(VerifyStorageItem {
                tenant_id: self.tenant_id,
                order_id: self.order_id,
                item_index: index,
                condition: StorageCondition::Good,
                by: staff("EMP-S01"),
                occurred_at: now(),
            }))
        }

        pub(crate) fn complete_storage(&mut self) -> Result<Vec<FulfillmentEvent>, DomainError> {
            self.run(FulfillmentCommand::CompleteStorage(CompleteStorage {
                tenant_id: self.tenant_id,
                order_id: self.order_id,
                storage_location: "Bay 3".into(),
                by: staff("EMP-S01"),
                notes: None,
                occurred_at: now(),
            }))
        }

        pub(crate) fn assign(&mut self, vehicle: Vehicle, driver_id: &str) -> Result<Vec<FulfillmentEvent>, DomainError> {
            self.run(FulfillmentCommand::AssignVehicle(AssignVehicle {
                tenant_id: self.tenant_id,
                order_id: self.order_id,
                vehicle,
                driver: driver(driver_id),
                by: staff("EMP-D01"),
                notes: None,
                occurred_at: now(),
            }))
        }

        pub(crate) fn driver_verify(&mut self, driver_id: &str, verified: bool) -> Result<Vec<FulfillmentEvent>, DomainError> {
            self.run(FulfillmentCommand::VerifyByDriver(VerifyByDriver {
                tenant_id: self.tenant_id,
                order_id: self.order_id,
                verified,
                by: staff(driver_id),
                notes: None,
                occurred_at: now(),
            }))
        }

        pub(crate) fn start_route(&mut self) -> Result<Vec<FulfillmentEvent>, DomainError> {
            self.run(FulfillmentCommand::StartRoute(StartRoute {
                tenant_id: self.tenant_id,
                order_id: self.order_id,
                by: staff("DRV-001"),
                occurred_at: now(),
            }))
        }

        pub(crate) fn upload_photo(&mut self) -> Result<Vec<FulfillmentEvent>, DomainError> {
            self.run(FulfillmentCommand::UploadDeliveryPhoto(UploadDeliveryPhoto {
                tenant_id: self.tenant_id,
                order_id: self.order_id,
                url: "https://cdn.example.test/pod/1.jpg".into(),
                caption: None,
                by: staff("DRV-001"),
                occurred_at: now(),
            }))
        }

        pub(crate) fn complete_delivery(&mut self, confirmed: bool) -> Result<Vec<FulfillmentEvent>, DomainError> {
            self.run(FulfillmentCommand::CompleteDelivery(CompleteDelivery {
                tenant_id: self.tenant_id,
                order_id: self.order_id,
                customer_confirmed: confirmed,
                recipient_name: Some("Site foreman".into()),
                by: staff("DRV-001"),
                notes: None,
                occurred_at: now(),
            }))
        }

        /// Drive a two-item order to `allocated-dispatch-officer-2` with DRV-001 assigned.
        pub(crate) fn assigned() -> Self {
            let mut f = Self::placed(vec![item("Cement", 10, Some("50kg")), item("Sand", 2, None)]);
            f.pack(0, PackingStatus::Packed).unwrap();
            f.pack(1, PackingStatus::Packed).unwrap();
            f.complete_packing().unwrap();
            f.verify(0).unwrap();
            f.verify(1).unwrap();
            f.complete_storage().unwrap();
            f.assign(vehicle("VH-004", 20.0, 5_000.0, 100), "DRV-001").unwrap();
            f
        }

        pub(crate) fn on_route() -> Self {
            let mut f = Self::assigned();
            f.driver_verify("DRV-001", true).unwrap();
            f.start_route().unwrap();
            f
        }
    }

    fn stages(order: &FulfillmentOrder) -> Vec<Stage> {
        order.stage_log().iter().map(|r| r.stage).collect()
    }

    fn expect_guard(result: Result<Vec<FulfillmentEvent>, DomainError>, needle: &str) {
        match result {
            Err(DomainError::GuardViolation(msg)) if msg.contains(needle) => {}
            other => panic!("Expected GuardViolation containing '{needle}', got {other:?}"),
        }
    }

    #[test]
    fn place_order_confirms_and_stamps_pending_by_system() {
        let f = Fixture::placed(vec![item("Cement", 1, Some("50kg"))]);
        assert_eq!(f.order.status(), OrderStatus::OrderConfirmed);
        assert!(f.order.is_active());
        assert_eq!(f.order.version(), 1);
        assert!(f.order.order_number().starts_with("ORD-"));
        assert_eq!(f.order.order_number().len(), "ORD-YYMMDD-XXXXXXXXXXXX".len());
        assert_eq!(stages(&f.order), vec![Stage::Pending]);
        assert_eq!(f.order.stage_log()[0].completed_by, EmployeeRef::system());
    }

    #[test]
    fn emitted_status_changes_follow_the_table() {
        let f = Fixture::placed(vec![item("Cement", 1, None)]);
        let started = FulfillmentEvent::PackingStarted(PackingStarted {
            tenant_id: f.tenant_id,
            order_id: f.order_id,
            started_by: staff("EMP-P01"),
            occurred_at: now(),
        });
        let route = FulfillmentEvent::RouteStarted(RouteStarted {
            tenant_id: f.tenant_id,
            order_id: f.order_id,
            vehicle_id: VehicleId::new("VH-004"),
            started_by: staff("DRV-001"),
            occurred_at: now(),
        });

        f.order.ensure_transitions(std::slice::from_ref(&started)).unwrap();
        let err = f.order.ensure_transitions(&[route.clone()]).unwrap_err();
        assert!(matches!(err, DomainError::GuardViolation(ref m) if m.contains("order-confirmed -> on-route")));
        // A later event is checked against the status the earlier one produced.
        assert!(f.order.ensure_transitions(&[started.clone(), started]).is_err());
        assert!(FulfillmentOrder::empty(f.order_id).ensure_transitions(&[route]).is_ok());
    }

    #[test]
    fn same_day_order_numbers_do_not_collide() {
        let at = now();
        let numbers: std::collections::HashSet<String> = (0..20_000)
            .map(|_| FulfillmentOrderId::new(AggregateId::new()).order_number(at))
            .collect();
        assert_eq!(numbers.len(), 20_000);

        let id = FulfillmentOrderId::new(AggregateId::new());
        let hex = id.0.as_uuid().simple().to_string().to_ascii_uppercase();
        let number = id.order_number(at);
        assert!(number.ends_with(&hex[hex.len() - 12..]));
        assert_eq!(&number[4..10], at.format("%y%m%d").to_string());
    }

    #[test]
    fn complaint_ids_differ_between_orders_placed_together() {
        let mut a = Fixture::placed(vec![item("Cement", 1, None)]);
        let mut b = Fixture::placed(vec![item("Cement", 1, None)]);
        a.complain(0, PackingComplaintType::Damaged).unwrap();
        b.complain(0, PackingComplaintType::Damaged).unwrap();

        let id_a = &a.order.items()[0].item_complaints[0].complaint_id;
        let id_b = &b.order.items()[0].item_complaints[0].complaint_id;
        assert!(id_a.starts_with(a.order.order_number()));
        assert_ne!(id_a, id_b);
    }

    #[test]
    fn place_order_rejects_empty_items_and_duplicates() {
        let tenant_id = TenantId::new();
        let order_id = FulfillmentOrderId::new(AggregateId::new());
        let order = FulfillmentOrder::empty(order_id);
        let cmd = PlaceOrder {
            tenant_id,
            order_id,
            order_number: "ORD-261019-ABCDEF".into(),
            customer: CustomerRef {
                customer_id: "c".into(),
                name: None,
            },
            items: vec![],
            schedule: DeliverySchedule {
                delivery_date: NaiveDate::from_ymd_opt(2026, 10, 20).unwrap(),
                time_slot: "AM".into(),
                delivery_address: "Site".into(),
            },
            total_amount: 0,
            occurred_at: now(),
        };
        let err = order
            .handle(&FulfillmentCommand::PlaceOrder(cmd.clone()))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let f = Fixture::placed(vec![item("Cement", 1, None)]);
        let err = f
            .order
            .handle(&FulfillmentCommand::PlaceOrder(PlaceOrder {
                tenant_id: f.tenant_id,
                order_id: f.order_id,
                items: vec![item("Sand", 1, None)],
                ..cmd
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Conflict(_)));
    }

    #[test]
    fn packing_guard_scenario_with_unavailable_item() {
        let mut f = Fixture::placed(vec![
            item("Cement", 4, Some("50kg")),
            item("Rebar", 10, Some("12kg")),
            item("Tiles", 20, None),
        ]);

        f.pack(0, PackingStatus::Packed).unwrap();
        assert_eq!(f.order.status(), OrderStatus::PickingOrder);
        f.pack(1, PackingStatus::Packed).unwrap();
        assert_eq!(f.order.packing().packing_progress, 67);

        expect_guard(f.complete_packing(), "items still pending");
        assert_eq!(f.order.status(), OrderStatus::PickingOrder);

        f.complain(2, PackingComplaintType::NotAvailable).unwrap();
        assert_eq!(f.order.items()[2].packing_status, PackingStatus::Unavailable);
        assert_eq!(f.order.packing().packing_progress, 100);

        f.complete_packing().unwrap();
        assert_eq!(f.order.status(), OrderStatus::AllocatedDriver);
        assert_eq!(stages(&f.order), vec![Stage::Pending, Stage::Packed]);
    }

    #[test]
    fn first_packed_item_starts_packing_in_the_same_decision() {
        let mut f = Fixture::placed(vec![item("Cement", 1, None), item("Sand", 1, None)]);
        let events = f.pack(0, PackingStatus::Packed).unwrap();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], FulfillmentEvent::PackingStarted(_)));
        assert!(matches!(events[1], FulfillmentEvent::ItemPacked(_)));

        let again = f.pack(0, PackingStatus::Packed).unwrap();
        assert!(again.is_empty());
    }

    #[test]
    fn pack_item_out_of_range_is_not_found() {
        let mut f = Fixture::placed(vec![item("Cement", 1, None)]);
        let err = f.pack(5, PackingStatus::Packed).unwrap_err();
        assert_eq!(err, DomainError::not_found("item 5"));
        assert_eq!(f.order.version(), 1);
    }

    #[test]
    fn soft_complaints_do_not_change_packing_status_and_resolution_keeps_unavailable() {
        let mut f = Fixture::placed(vec![item("Cement", 1, None), item("Sand", 1, None)]);
        f.complain(0, PackingComplaintType::WrongItem).unwrap();
        assert_eq!(f.order.items()[0].packing_status, PackingStatus::Pending);

        f.complain(1, PackingComplaintType::Expired).unwrap();
        let complaint_id = f.order.items()[1].item_complaints[0].complaint_id.clone();
        f.run(FulfillmentCommand::ResolveComplaint(ResolveComplaint {
            tenant_id: f.tenant_id,
            order_id: f.order_id,
            item_index: 1,
            scope: ComplaintScope::Packing,
            complaint_id: complaint_id.clone(),
            resolution: "supplier will replace".into(),
            by: staff("EMP-P01"),
            occurred_at: now(),
        }))
        .unwrap();

        let item = &f.order.items()[1];
        assert!(item.item_complaints[0].resolved);
        assert_eq!(item.packing_status, PackingStatus::Unavailable);
        assert!(complaint_id.ends_with("-P2-1"));
    }

    #[test]
    fn storage_guard_accepts_verified_or_flagged_items() {
        let mut f = Fixture::placed(vec![item("Cement", 1, None), item("Sand", 1, None)]);
        f.pack(0, PackingStatus::Packed).unwrap();
        f.pack(1, PackingStatus::Packed).unwrap();
        f.complete_packing().unwrap();

        f.verify(0).unwrap();
        expect_guard(f.complete_storage(), "awaiting storage verification");

        f.verify(1).unwrap();
        f.run(FulfillmentCommand::ReportStorageComplaint(ReportStorageComplaint {
            tenant_id: f.tenant_id,
            order_id: f.order_id,
            item_index: 1,
            complaint_type: StorageComplaintType::Damaged,
            description: "bag split".into(),
            by: staff("EMP-S01"),
            occurred_at: now(),
        }))
        .unwrap();
        assert!(!f.order.items()[1].storage_verified);
        assert_eq!(f.order.storage().items_with_complaints, 1);

        f.complete_storage().unwrap();
        assert_eq!(f.order.status(), OrderStatus::ReadyToPickup);
        assert_eq!(f.order.storage().storage_location.as_deref(), Some("Bay 3"));
        let record = f.order.stage_log().last().unwrap();
        assert_eq!(record.stage, Stage::Storage);
        assert_eq!(record.details["storageLocation"], "Bay 3");
    }

    #[test]
    fn capacity_guard_rejects_undersized_vehicle_then_accepts_larger() {
        // 120 units * 0.05 m3 = 6 m3; 120 * 0.5 kg = 60 kg; one package.
        let mut f = Fixture::placed(vec![item("Nails", 120, Some("0.5kg box"))]);
        f.pack(0, PackingStatus::Packed).unwrap();
        f.complete_packing().unwrap();
        f.verify(0).unwrap();
        f.complete_storage().unwrap();

        let req = f.order.requirement();
        assert!(req.volume > 5.0);
        assert_eq!(req.packages, 1);

        expect_guard(f.assign(vehicle("VH-SMALL", 5.0, 100.0, 10), "DRV-001"), "capacity");
        assert_eq!(f.order.status(), OrderStatus::ReadyToPickup);

        f.assign(vehicle("VH-003", 8.0, 1_500.0, 40), "DRV-001").unwrap();
        assert_eq!(f.order.status(), OrderStatus::AllocatedDispatchOfficer2);
        let assignment = f.order.assignment().unwrap();
        assert_eq!(assignment.vehicle_id.as_str(), "VH-003");
        assert_eq!(assignment.driver.employee_id, "DRV-001");
    }

    #[test]
    fn assignment_rejects_inactive_vehicle_and_unavailable_driver() {
        let mut f = Fixture::placed(vec![item("Cement", 1, None)]);
        f.pack(0, PackingStatus::Packed).unwrap();
        f.complete_packing().unwrap();
        f.verify(0).unwrap();
        f.complete_storage().unwrap();

        let mut parked = vehicle("VH-009", 20.0, 5_000.0, 100);
        parked.active = false;
        expect_guard(f.assign(parked, "DRV-001"), "not active");

        let mut busy = driver("DRV-002");
        busy.available = false;
        let err = f
            .run(FulfillmentCommand::AssignVehicle(AssignVehicle {
                tenant_id: f.tenant_id,
                order_id: f.order_id,
                vehicle: vehicle("VH-004", 20.0, 5_000.0, 100),
                driver: busy,
                by: staff("EMP-D01"),
                notes: None,
                occurred_at: now(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::GuardViolation(_)));
    }

    #[test]
    fn route_start_requires_assigned_driver_verification() {
        let mut f = Fixture::assigned();
        expect_guard(f.start_route(), "has not verified");

        expect_guard(f.driver_verify("DRV-002", true), "only the assigned driver");

        f.driver_verify("DRV-001", false).unwrap();
        expect_guard(f.start_route(), "has not verified");

        f.driver_verify("DRV-001", true).unwrap();
        assert_eq!(f.order.status(), OrderStatus::AllocatedDispatchOfficer2);
        assert_eq!(stages(&f.order).last(), Some(&Stage::Loaded));

        expect_guard(f.driver_verify("DRV-001", false), "cannot be withdrawn");

        f.start_route().unwrap();
        assert_eq!(f.order.status(), OrderStatus::OnRoute);
        assert!(f.order.delivery().route_started_at.is_some());
    }

    #[test]
    fn mark_arrived_records_location_without_status_change() {
        let mut f = Fixture::on_route();
        f.run(FulfillmentCommand::MarkArrived(MarkArrived {
            tenant_id: f.tenant_id,
            order_id: f.order_id,
            location: Some("-1.1456,36.9631".into()),
            by: staff("DRV-001"),
            occurred_at: now(),
        }))
        .unwrap();
        assert_eq!(f.order.status(), OrderStatus::OnRoute);
        assert_eq!(
            f.order.delivery().arrival_location.as_deref(),
            Some("-1.1456,36.9631")
        );
    }

    #[test]
    fn delivery_requires_photo_and_customer_confirmation() {
        let mut f = Fixture::on_route();
        expect_guard(f.complete_delivery(true), "photo");

        f.upload_photo().unwrap();
        expect_guard(f.complete_delivery(false), "customer confirmation");
        assert_eq!(f.order.status(), OrderStatus::OnRoute);

        f.complete_delivery(true).unwrap();
        assert_eq!(f.order.status(), OrderStatus::OrderComplete);
        assert!(f.order.delivery().customer_confirmed);
        assert_eq!(stages(&f.order), Stage::ALL.to_vec());

        expect_guard(f.upload_photo(), "order-complete");
    }

    #[test]
    fn photo_upload_is_an_append_not_idempotent() {
        let mut f = Fixture::on_route();
        f.upload_photo().unwrap();
        f.upload_photo().unwrap();
        let photos = &f.order.delivery().delivery_photos;
        assert_eq!(photos.len(), 2);
        assert_ne!(photos[0].photo_id, photos[1].photo_id);
    }

    #[test]
    fn inactive_orders_reject_stage_operations() {
        let mut f = Fixture::placed(vec![item("Cement", 1, None)]);
        f.run(FulfillmentCommand::DeactivateOrder(DeactivateOrder {
            tenant_id: f.tenant_id,
            order_id: f.order_id,
            reason: Some("customer cancelled".into()),
            by: staff("EMP-D01"),
            occurred_at: now(),
        }))
        .unwrap();
        assert!(!f.order.is_active());
        expect_guard(f.pack(0, PackingStatus::Packed), "inactive");
    }

    #[test]
    fn orders_on_route_cannot_be_deactivated() {
        let mut f = Fixture::on_route();
        let err = f
            .run(FulfillmentCommand::DeactivateOrder(DeactivateOrder {
                tenant_id: f.tenant_id,
                order_id: f.order_id,
                reason: None,
                by: staff("EMP-D01"),
                occurred_at: now(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::GuardViolation(_)));
        assert!(f.order.is_active());
    }

    #[test]
    fn other_tenants_cannot_see_the_order() {
        let f = Fixture::placed(vec![item("Cement", 1, None)]);
        let err = f
            .order
            .handle(&FulfillmentCommand::StartPacking(StartPacking {
                tenant_id: TenantId::new(),
                order_id: f.order_id,
                by: staff("EMP-P01"),
                occurred_at: now(),
            }))
            .unwrap_err();
        assert_eq!(err, DomainError::not_found("order"));
    }

    #[test]
    fn handle_does_not_mutate_state() {
        let f = Fixture::placed(vec![item("Cement", 1, None)]);
        let before = f.order.clone();
        let cmd = FulfillmentCommand::PackItem(PackItem {
            tenant_id: f.tenant_id,
            order_id: f.order_id,
            item_index: 0,
            packing_status: PackingStatus::Packed,
            by: staff("EMP-P01"),
            occurred_at: now(),
        });
        let first = f.order.handle(&cmd).unwrap();
        let second = f.order.handle(&cmd).unwrap();
        assert_eq!(first, second);
        assert_eq!(f.order, before);
    }

    #[test]
    fn rehydration_from_events_is_deterministic() {
        let mut f = Fixture::placed(vec![item("Cement", 3, Some("25kg"))]);
        f.pack(0, PackingStatus::Packed).unwrap();
        f.complete_packing().unwrap();

        let mut replayed = FulfillmentOrder::empty(f.order_id);
        for ev in &f.history {
            replayed.apply(ev);
        }

        assert_eq!(replayed, f.order);
        assert_eq!(replayed.version(), f.history.len() as u64);
    }

    #[derive(Debug, Clone)]
    enum Op {
        Pack(usize),
        Unavailable(usize),
        CompletePacking,
        Verify(usize),
        StorageComplaint(usize),
        CompleteStorage,
        Assign,
        DriverVerify(bool),
        StartRoute,
        Photo,
        Deliver(bool),
        Deactivate,
    }

    fn op() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..4).prop_map(Op::Pack),
            (0usize..4).prop_map(Op::Unavailable),
            Just(Op::CompletePacking),
            (0usize..4).prop_map(Op::Verify),
            (0usize..4).prop_map(Op::StorageComplaint),
            Just(Op::CompleteStorage),
            Just(Op::Assign),
            any::<bool>().prop_map(Op::DriverVerify),
            Just(Op::StartRoute),
            Just(Op::Photo),
            any::<bool>().prop_map(Op::Deliver),
            Just(Op::Deactivate),
        ]
    }

    proptest! {
        #[test]
        fn stage_log_only_moves_forward(ops in prop::collection::vec(op(), 0..60)) {
            let mut f = Fixture::placed(vec![
                item("Cement", 2, Some("50kg")),
                item("Sand", 1, None),
                item("Tiles", 3, Some("2kg")),
            ]);
            let mut last_status = f.order.status();

            for op in ops {
                let before = f.order.clone();
                let result = match op {
                    Op::Pack(i) => f.pack(i, PackingStatus::Packed),
                    Op::Unavailable(i) => f.complain(i, PackingComplaintType::NotAvailable),
                    Op::CompletePacking => f.complete_packing(),
                    Op::Verify(i) => f.verify(i),
                    Op::StorageComplaint(i) => f.run(FulfillmentCommand::ReportStorageComplaint(ReportStorageComplaint {
                        tenant_id: f.tenant_id,
                        order_id: f.order_id,
                        item_index: i,
                        complaint_type: StorageComplaintType::Missing,
                        description: String::new(),
                        by: staff("EMP-S01"),
                        occurred_at: now(),
                    })),
                    Op::CompleteStorage => f.complete_storage(),
                    Op::Assign => f.assign(vehicle("VH-005", 30.0, 10_000.0, 150), "DRV-001"),
                    Op::DriverVerify(v) => f.driver_verify("DRV-001", v),
                    Op::StartRoute => f.start_route(),
                    Op::Photo => f.upload_photo(),
                    Op::Deliver(c) => f.complete_delivery(c),
                    Op::Deactivate => f.run(FulfillmentCommand::DeactivateOrder(DeactivateOrder {
                        tenant_id: f.tenant_id,
                        order_id: f.order_id,
                        reason: None,
                        by: staff("EMP-D01"),
                        occurred_at: now(),
                    })),
                };

                if result.is_err() {
                    prop_assert_eq!(&f.order, &before);
                }
                prop_assert!(f.order.status() >= last_status);
                last_status = f.order.status();

                let logged = stages(&f.order);
                prop_assert!(logged.windows(2).all(|w| w[0] < w[1]));
                prop_assert!(before.stage_log().iter().zip(f.order.stage_log()).all(|(a, b)| a == b));
            }
        }
    }
}
