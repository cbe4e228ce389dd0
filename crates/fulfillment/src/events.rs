//! Events emitted by [`crate::FulfillmentOrder`].
//!
//! The event stream of an order *is* its stage history: [`FulfillmentEvent::stage_record`]
//! and [`FulfillmentEvent::resulting_status`] are the only places that decide
//! which facts complete a stage or move the status, and both the aggregate and
//! the tracking view consume them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use sitecart_core::TenantId;
use sitecart_events::Event;
use sitecart_fleet::VehicleId;

use crate::model::{
    AssignmentDetails, ComplaintScope, CustomerRef, DeliveryPhoto, DeliverySchedule,
    DriverVerification, EmployeeRef, NewOrderItem, PackingComplaint, PackingStatus,
    StorageComplaint, StorageCondition,
};
use crate::order::FulfillmentOrderId;
use crate::status::{OrderStatus, Stage};

/// Event: OrderPlaced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPlaced {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub order_number: String,
    pub customer: CustomerRef,
    pub items: Vec<NewOrderItem>,
    pub schedule: DeliverySchedule,
    pub total_amount: u64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PackingStarted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackingStarted {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub started_by: EmployeeRef,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemPacked (packed or unavailable).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemPacked {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub item_index: usize,
    pub packing_status: PackingStatus,
    pub packed_by: EmployeeRef,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PackingComplaintReported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackingComplaintReported {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub item_index: usize,
    pub complaint: PackingComplaint,
    pub marks_unavailable: bool,
    pub occurred_at: DateTime<Utc>,
}

/// Event: PackingCompleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackingCompleted {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub completed_by: EmployeeRef,
    pub items_packed: usize,
    pub items_unavailable: usize,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StorageItemVerified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageItemVerified {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub item_index: usize,
    pub condition: StorageCondition,
    pub verified_by: EmployeeRef,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StorageComplaintReported.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageComplaintReported {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub item_index: usize,
    pub complaint: StorageComplaint,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ComplaintResolved.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComplaintResolved {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub item_index: usize,
    pub scope: ComplaintScope,
    pub complaint_id: String,
    pub resolution: String,
    pub resolved_by: EmployeeRef,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StorageCompleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageCompleted {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub completed_by: EmployeeRef,
    pub storage_location: String,
    pub items_verified: usize,
    pub items_with_complaints: usize,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: VehicleAssigned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleAssigned {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub assignment: AssignmentDetails,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DriverVerificationRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriverVerificationRecorded {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub verification: DriverVerification,
    pub occurred_at: DateTime<Utc>,
}

/// Event: RouteStarted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteStarted {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub vehicle_id: VehicleId,
    pub started_by: EmployeeRef,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ArrivalRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArrivalRecorded {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub location: Option<String>,
    pub recorded_by: EmployeeRef,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DeliveryPhotoUploaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryPhotoUploaded {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub photo: DeliveryPhoto,
    pub occurred_at: DateTime<Utc>,
}

/// Event: DeliveryCompleted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryCompleted {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub delivered_by: EmployeeRef,
    pub customer_confirmed: bool,
    pub recipient_name: Option<String>,
    pub photo_count: usize,
    pub notes: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderDeactivated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDeactivated {
    pub tenant_id: TenantId,
    pub order_id: FulfillmentOrderId,
    pub reason: Option<String>,
    pub deactivated_by: EmployeeRef,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum FulfillmentEvent {
    OrderPlaced(OrderPlaced),
    PackingStarted(PackingStarted),
    ItemPacked(ItemPacked),
    PackingComplaintReported(PackingComplaintReported),
    PackingCompleted(PackingCompleted),
    StorageItemVerified(StorageItemVerified),
    StorageComplaintReported(StorageComplaintReported),
    ComplaintResolved(ComplaintResolved),
    StorageCompleted(StorageCompleted),
    VehicleAssigned(VehicleAssigned),
    DriverVerificationRecorded(DriverVerificationRecorded),
    RouteStarted(RouteStarted),
    ArrivalRecorded(ArrivalRecorded),
    DeliveryPhotoUploaded(DeliveryPhotoUploaded),
    DeliveryCompleted(DeliveryCompleted),
    OrderDeactivated(OrderDeactivated),
}

impl Event for FulfillmentEvent {
    fn event_type(&self) -> &'static str {
        match self {
            FulfillmentEvent::OrderPlaced(_) => "fulfillment.order.placed",
            FulfillmentEvent::PackingStarted(_) => "fulfillment.order.packing_started",
            FulfillmentEvent::ItemPacked(_) => "fulfillment.order.item_packed",
            FulfillmentEvent::PackingComplaintReported(_) => {
                "fulfillment.order.packing_complaint_reported"
            }
            FulfillmentEvent::PackingCompleted(_) => "fulfillment.order.packing_completed",
            FulfillmentEvent::StorageItemVerified(_) => "fulfillment.order.storage_item_verified",
            FulfillmentEvent::StorageComplaintReported(_) => {
                "fulfillment.order.storage_complaint_reported"
            }
            FulfillmentEvent::ComplaintResolved(_) => "fulfillment.order.complaint_resolved",
            FulfillmentEvent::StorageCompleted(_) => "fulfillment.order.storage_completed",
            FulfillmentEvent::VehicleAssigned(_) => "fulfillment.order.vehicle_assigned",
            FulfillmentEvent::DriverVerificationRecorded(_) => {
                "fulfillment.order.driver_verification_recorded"
            }
            FulfillmentEvent::RouteStarted(_) => "fulfillment.order.route_started",
            FulfillmentEvent::ArrivalRecorded(_) => "fulfillment.order.arrival_recorded",
            FulfillmentEvent::DeliveryPhotoUploaded(_) => "fulfillment.order.delivery_photo_uploaded",
            FulfillmentEvent::DeliveryCompleted(_) => "fulfillment.order.delivery_completed",
            FulfillmentEvent::OrderDeactivated(_) => "fulfillment.order.deactivated",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            FulfillmentEvent::OrderPlaced(e) => e.occurred_at,
            FulfillmentEvent::PackingStarted(e) => e.occurred_at,
            FulfillmentEvent::ItemPacked(e) => e.occurred_at,
            FulfillmentEvent::PackingComplaintReported(e) => e.occurred_at,
            FulfillmentEvent::PackingCompleted(e) => e.occurred_at,
            FulfillmentEvent::StorageItemVerified(e) => e.occurred_at,
            FulfillmentEvent::StorageComplaintReported(e) => e.occurred_at,
            FulfillmentEvent::ComplaintResolved(e) => e.occurred_at,
            FulfillmentEvent::StorageCompleted(e) => e.occurred_at,
            FulfillmentEvent::VehicleAssigned(e) => e.occurred_at,
            FulfillmentEvent::DriverVerificationRecorded(e) => e.occurred_at,
            FulfillmentEvent::RouteStarted(e) => e.occurred_at,
            FulfillmentEvent::ArrivalRecorded(e) => e.occurred_at,
            FulfillmentEvent::DeliveryPhotoUploaded(e) => e.occurred_at,
            FulfillmentEvent::DeliveryCompleted(e) => e.occurred_at,
            FulfillmentEvent::OrderDeactivated(e) => e.occurred_at,
        }
    }
}

/// One completed stage: when, by whom, and stage-specific fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StageRecord {
    pub stage: Stage,
    pub completed_at: DateTime<Utc>,
    pub completed_by: EmployeeRef,
    pub details: Map<String, Value>,
}

fn details<const N: usize>(fields: [(&str, Value); N]) -> Map<String, Value> {
    fields
        .into_iter()
        .filter(|(_, v)| !v.is_null())
        .map(|(k, v)| (k.to_owned(), v))
        .collect()
}

impl FulfillmentEvent {
    pub fn order_id(&self) -> FulfillmentOrderId {
        match self {
            FulfillmentEvent::OrderPlaced(e) => e.order_id,
            FulfillmentEvent::PackingStarted(e) => e.order_id,
            FulfillmentEvent::ItemPacked(e) => e.order_id,
            FulfillmentEvent::PackingComplaintReported(e) => e.order_id,
            FulfillmentEvent::PackingCompleted(e) => e.order_id,
            FulfillmentEvent::StorageItemVerified(e) => e.order_id,
            FulfillmentEvent::StorageComplaintReported(e) => e.order_id,
            FulfillmentEvent::ComplaintResolved(e) => e.order_id,
            FulfillmentEvent::StorageCompleted(e) => e.order_id,
            FulfillmentEvent::VehicleAssigned(e) => e.order_id,
            FulfillmentEvent::DriverVerificationRecorded(e) => e.order_id,
            FulfillmentEvent::RouteStarted(e) => e.order_id,
            FulfillmentEvent::ArrivalRecorded(e) => e.order_id,
            FulfillmentEvent::DeliveryPhotoUploaded(e) => e.order_id,
            FulfillmentEvent::DeliveryCompleted(e) => e.order_id,
            FulfillmentEvent::OrderDeactivated(e) => e.order_id,
        }
    }

    /// New top-level status, for the events that move it.
    pub fn resulting_status(&self) -> Option<OrderStatus> {
        match self {
            FulfillmentEvent::OrderPlaced(_) => Some(OrderStatus::OrderConfirmed),
            FulfillmentEvent::PackingStarted(_) => Some(OrderStatus::PickingOrder),
            FulfillmentEvent::PackingCompleted(_) => Some(OrderStatus::AllocatedDriver),
            FulfillmentEvent::StorageCompleted(_) => Some(OrderStatus::ReadyToPickup),
            FulfillmentEvent::VehicleAssigned(_) => Some(OrderStatus::AllocatedDispatchOfficer2),
            FulfillmentEvent::RouteStarted(_) => Some(OrderStatus::OnRoute),
            FulfillmentEvent::DeliveryCompleted(_) => Some(OrderStatus::OrderComplete),
            _ => None,
        }
    }

    /// The stage this event completes, if any.
    pub fn stage_record(&self) -> Option<StageRecord> {
        let (stage, completed_at, completed_by, details) = match self {
            FulfillmentEvent::OrderPlaced(e) => (
                Stage::Pending,
                e.occurred_at,
                EmployeeRef::system(),
                details([
                    ("orderNumber", Value::from(e.order_number.clone())),
                    ("totalAmount", Value::from(e.total_amount)),
                    ("itemCount", Value::from(e.items.len())),
                ]),
            ),
            FulfillmentEvent::PackingCompleted(e) => (
                Stage::Packed,
                e.occurred_at,
                e.completed_by.clone(),
                details([
                    ("itemsPacked", Value::from(e.items_packed)),
                    ("itemsUnavailable", Value::from(e.items_unavailable)),
                    ("notes", Value::from(e.notes.clone())),
                ]),
            ),
            FulfillmentEvent::StorageCompleted(e) => (
                Stage::Storage,
                e.occurred_at,
                e.completed_by.clone(),
                details([
                    ("storageLocation", Value::from(e.storage_location.clone())),
                    ("itemsVerified", Value::from(e.items_verified)),
                    ("itemsWithComplaints", Value::from(e.items_with_complaints)),
                    ("notes", Value::from(e.notes.clone())),
                ]),
            ),
            FulfillmentEvent::VehicleAssigned(e) => {
                let a = &e.assignment;
                (
                    Stage::Assigned,
                    e.occurred_at,
                    a.assigned_by.clone(),
                    details([
                        ("vehicleId", Value::from(a.vehicle_id.as_str())),
                        ("registrationNumber", Value::from(a.registration_number.clone())),
                        ("driverId", Value::from(a.driver.employee_id.clone())),
                        ("driverName", Value::from(a.driver.name.clone())),
                    ]),
                )
            }
            FulfillmentEvent::DriverVerificationRecorded(e) if e.verification.verified => (
                Stage::Loaded,
                e.occurred_at,
                e.verification.verified_by.clone(),
                details([("notes", Value::from(e.verification.notes.clone()))]),
            ),
            FulfillmentEvent::RouteStarted(e) => (
                Stage::InTransit,
                e.occurred_at,
                e.started_by.clone(),
                details([("vehicleId", Value::from(e.vehicle_id.as_str()))]),
            ),
            FulfillmentEvent::DeliveryCompleted(e) => (
                Stage::Delivered,
                e.occurred_at,
                e.delivered_by.clone(),
                details([
                    ("customerConfirmed", Value::from(e.customer_confirmed)),
                    ("photoCount", Value::from(e.photo_count)),
                    ("recipientName", Value::from(e.recipient_name.clone())),
                ]),
            ),
            _ => return None,
        };

        Some(StageRecord {
            stage,
            completed_at,
            completed_by,
            details,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sitecart_core::AggregateId;

    fn route_started() -> FulfillmentEvent {
        FulfillmentEvent::RouteStarted(RouteStarted {
            tenant_id: TenantId::new(),
            order_id: FulfillmentOrderId::new(AggregateId::new()),
            vehicle_id: VehicleId::new("VH-003"),
            started_by: EmployeeRef::new("DRV-001", "Dan"),
            occurred_at: Utc::now(),
        })
    }

    #[test]
    fn stage_events_carry_matching_status() {
        let ev = route_started();
        let record = ev.stage_record().unwrap();
        assert_eq!(record.stage, Stage::InTransit);
        assert_eq!(record.stage.status_on_completion(), ev.resulting_status());
        assert_eq!(record.details.get("vehicleId"), Some(&Value::from("VH-003")));
    }

    #[test]
    fn unverified_driver_check_is_not_a_stage() {
        let ev = FulfillmentEvent::DriverVerificationRecorded(DriverVerificationRecorded {
            tenant_id: TenantId::new(),
            order_id: FulfillmentOrderId::new(AggregateId::new()),
            verification: DriverVerification {
                verified: false,
                verified_by: EmployeeRef::new("DRV-001", "Dan"),
                verified_at: Utc::now(),
                notes: Some("two bags short".into()),
            },
            occurred_at: Utc::now(),
        });
        assert!(ev.stage_record().is_none());
        assert!(ev.resulting_status().is_none());
    }

    #[test]
    fn null_details_are_omitted() {
        let map = details([("a", Value::from(1)), ("b", Value::Null)]);
        assert_eq!(map.len(), 1);
        assert!(map.contains_key("a"));
    }

    #[test]
    fn event_type_names_are_namespaced() {
        assert_eq!(route_started().event_type(), "fulfillment.order.route_started");
    }
}
