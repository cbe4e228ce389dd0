//! Commands accepted by [`crate::FulfillmentOrder`].
//!
//! Reference data (vehicle, driver) is resolved by the caller and carried as a
//! snapshot, so deciding a command never performs IO.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use sitecart_core::TenantId;
use sitecart_fleet::{Employee, Vehicle};

use crate::model::{
    ComplaintScope, CustomerRef, DeliverySchedule, EmployeeRef, NewOrderItem,
    PackingComplaintType, PackingStatus, StorageComplaintType, StorageCondition,
};
use crate::order::FulfillmentOrderId;

/// Command: PlaceOrder (chat checkout).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlaceOrder {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub order_number: String,
    pub customer: CustomerRef,
    pub items: Vec<NewOrderItem>,
    pub schedule: DeliverySchedule,
    pub total_amount: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: StartPacking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartPacking {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub by: EmployeeRef,
    pub occurred_at: DateTime<Utc>,
}

/// Command: PackItem. `packing_status` must be `packed` or `unavailable`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackItem {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub item_index: usize,
    pub packing_status: PackingStatus,
    pub by: EmployeeRef,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReportPackingComplaint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportPackingComplaint {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub item_index: usize,
    pub complaint_type: PackingComplaintType,
    pub description: String,
    pub by: EmployeeRef,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CompletePacking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletePacking {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub by: EmployeeRef,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: VerifyStorageItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyStorageItem {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub item_index: usize,
    pub condition: StorageCondition,
    pub by: EmployeeRef,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ReportStorageComplaint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportStorageComplaint {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub item_index: usize,
    pub complaint_type: StorageComplaintType,
    pub description: String,
    pub by: EmployeeRef,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ResolveComplaint (either scope).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveComplaint {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub item_index: usize,
    pub scope: ComplaintScope,
    pub complaint_id: String,
    pub resolution: String,
    pub by: EmployeeRef,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CompleteStorage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteStorage {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub storage_location: String,
    pub by: EmployeeRef,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AssignVehicle. Vehicle and driver are lookup snapshots.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssignVehicle {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub vehicle: Vehicle,
    pub driver: Employee,
    pub by: EmployeeRef,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: VerifyByDriver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifyByDriver {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub verified: bool,
    pub by: EmployeeRef,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: StartRoute (one order; the per-vehicle batch lives in infra).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StartRoute {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub by: EmployeeRef,
    pub occurred_at: DateTime<Utc>,
}

/// Command: MarkArrived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkArrived {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub location: Option<String>,
    pub by: EmployeeRef,
    pub occurred_at: DateTime<Utc>,
}

/// Command: UploadDeliveryPhoto. The URL points at storage owned elsewhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadDeliveryPhoto {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub url: String,
    pub caption: Option<String>,
    pub by: EmployeeRef,
    pub occurred_at: DateTime<Utc>,
}

/// Command: CompleteDelivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompleteDelivery {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub customer_confirmed: bool,
    pub recipient_name: Option<String>,
    pub by: EmployeeRef,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: DeactivateOrder (soft cancel).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeactivateOrder {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub reason: Option<String>,
    pub by: EmployeeRef,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FulfillmentCommand {
    PlaceOrder(PlaceOrder),
    StartPacking(StartPacking),
    PackItem(PackItem),
    ReportPackingComplaint(ReportPackingComplaint),
    CompletePacking(CompletePacking),
    VerifyStorageItem(VerifyStorageItem),
    ReportStorageComplaint(ReportStorageComplaint),
    ResolveComplaint(ResolveComplaint),
    CompleteStorage(CompleteStorage),
    AssignVehicle(AssignVehicle),
    VerifyByDriver(VerifyByDriver),
    StartRoute(StartRoute),
    MarkArrived(MarkArrived),
    UploadDeliveryPhoto(UploadDeliveryPhoto),
    CompleteDelivery(CompleteDelivery),
    DeactivateOrder(DeactivateOrder),
}

impl FulfillmentCommand {
    pub fn tenant_id(&self) -> TenantId {
        match self {
            FulfillmentCommand::PlaceOrder(c) => c.tenant_id,
            FulfillmentCommand::StartPacking(c) => c.tenant_id,
            FulfillmentCommand::PackItem(c) => c.tenant_id,
            FulfillmentCommand::ReportPackingComplaint(c) => c.tenant_id,
            FulfillmentCommand::CompletePacking(c) => c.tenant_id,
            FulfillmentCommand::VerifyStorageItem(c) => c.tenant_id,
            FulfillmentCommand::ReportStorageComplaint(c) => c.tenant_id,
            FulfillmentCommand::ResolveComplaint(c) => c.tenant_id,
            FulfillmentCommand::CompleteStorage(c) => c.tenant_id,
            FulfillmentCommand::AssignVehicle(c) => c.tenant_id,
            FulfillmentCommand::VerifyByDriver(c) => c.tenant_id,
            FulfillmentCommand::StartRoute(c) => c.tenant_id,
            FulfillmentCommand::MarkArrived(c) => c.tenant_id,
            FulfillmentCommand::UploadDeliveryPhoto(c) => c.tenant_id,
            FulfillmentCommand::CompleteDelivery(c) => c.tenant_id,
            FulfillmentCommand::DeactivateOrder(c) => c.tenant_id,
        }
    }

    pub fn order_id(&self) -> FulfillmentOrderId {
        match self {
            FulfillmentCommand::PlaceOrder(c) => c.order_id,
            FulfillmentCommand::StartPacking(c) => c.order_id,
            FulfillmentCommand::PackItem(c) => c.order_id,
            FulfillmentCommand::ReportPackingComplaint(c) => c.order_id,
            FulfillmentCommand::CompletePacking(c) => c.order_id,
            FulfillmentCommand::VerifyStorageItem(c) => c.order_id,
            FulfillmentCommand::ReportStorageComplaint(c) => c.order_id,
            FulfillmentCommand::ResolveComplaint(c) => c.order_id,
            FulfillmentCommand::CompleteStorage(c) => c.order_id,
            FulfillmentCommand::AssignVehicle(c) => c.order_id,
            FulfillmentCommand::VerifyByDriver(c) => c.order_id,
            FulfillmentCommand::StartRoute(c) => c.order_id,
            FulfillmentCommand::MarkArrived(c) => c.order_id,
            FulfillmentCommand::UploadDeliveryPhoto(c) => c.order_id,
            FulfillmentCommand::CompleteDelivery(c) => c.order_id,
            FulfillmentCommand::DeactivateOrder(c) => c.order_id,
        }
    }

    /// Short name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            FulfillmentCommand::PlaceOrder(_) => "place_order",
            FulfillmentCommand::StartPacking(_) => "start_packing",
            FulfillmentCommand::PackItem(_) => "pack_item",
            FulfillmentCommand::ReportPackingComplaint(_) => "report_packing_complaint",
            FulfillmentCommand::CompletePacking(_) => "complete_packing",
            FulfillmentCommand::VerifyStorageItem(_) => "verify_storage_item",
            FulfillmentCommand::ReportStorageComplaint(_) => "report_storage_complaint",
            FulfillmentCommand::ResolveComplaint(_) => "resolve_complaint",
            FulfillmentCommand::CompleteStorage(_) => "complete_storage",
            FulfillmentCommand::AssignVehicle(_) => "assign_vehicle",
            FulfillmentCommand::VerifyByDriver(_) => "verify_by_driver",
            FulfillmentCommand::StartRoute(_) => "start_route",
            FulfillmentCommand::MarkArrived(_) => "mark_arrived",
            FulfillmentCommand::UploadDeliveryPhoto(_) => "upload_delivery_photo",
            FulfillmentCommand::CompleteDelivery(_) => "complete_delivery",
            FulfillmentCommand::DeactivateOrder(_) => "deactivate_order",
        }
    }
}
