use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use sitecart_core::{AggregateRoot, ExpectedVersion};
use sitecart_fleet::{LoadRequirement, VehicleId};
use sitecart_fulfillment::{
    AssignmentDetails, ComplaintScope, CustomerRef, DeliveryDetails, DeliverySchedule,
    DriverVerification, FulfillmentOrder, FulfillmentOrderId, NewOrderItem, OrderItem, OrderStatus,
    PackingComplaintType, PackingDetails, PackingStatus, Priority, StageRecord,
    StorageComplaintType, StorageCondition, StorageDetails,
};
use sitecart_infra::CommandOutcome;

// -------------------------
// Request DTOs
// -------------------------

/// Who is acting and which order revision they were looking at.
///
/// Flattened into every stage-operation body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Actor {
    pub employee_id: Option<String>,
    pub employee_name: Option<String>,
    /// Last order version the caller saw; stale values are rejected with 409.
    pub expected_version: Option<u64>,
}

impl Actor {
    pub fn expected(&self) -> ExpectedVersion {
        ExpectedVersion::from(self.expected_version)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderRequest {
    pub customer_id: String,
    pub customer_name: Option<String>,
    pub items: Vec<PlaceOrderItem>,
    pub delivery_address: String,
    pub delivery_date: NaiveDate,
    pub time_slot: String,
    /// Taken as given; priority is ranked on this value.
    pub total_amount: u64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlaceOrderItem {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: u64,
    pub weight: Option<String>,
}

impl PlaceOrderRequest {
    pub fn into_parts(self) -> (CustomerRef, Vec<NewOrderItem>, DeliverySchedule, u64) {
        let customer = CustomerRef {
            customer_id: self.customer_id,
            name: self.customer_name,
        };
        let items = self
            .items
            .into_iter()
            .map(|i| NewOrderItem {
                product_id: i.product_id,
                name: i.name,
                quantity: i.quantity,
                unit_price: i.unit_price,
                weight_label: i.weight,
            })
            .collect();
        let schedule = DeliverySchedule {
            delivery_date: self.delivery_date,
            time_slot: self.time_slot,
            delivery_address: self.delivery_address,
        };
        (customer, items, schedule, self.total_amount)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActorOnly {
    #[serde(flatten)]
    pub actor: Actor,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotesRequest {
    #[serde(flatten)]
    pub actor: Actor,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeactivateRequest {
    #[serde(flatten)]
    pub actor: Actor,
    pub reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackItemRequest {
    #[serde(flatten)]
    pub actor: Actor,
    #[serde(default = "packed")]
    pub packing_status: PackingStatus,
}

fn packed() -> PackingStatus {
    PackingStatus::Packed
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackingComplaintRequest {
    #[serde(flatten)]
    pub actor: Actor,
    pub complaint_type: PackingComplaintType,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyStorageItemRequest {
    #[serde(flatten)]
    pub actor: Actor,
    pub condition: StorageCondition,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageComplaintRequest {
    #[serde(flatten)]
    pub actor: Actor,
    pub complaint_type: StorageComplaintType,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolveComplaintRequest {
    #[serde(flatten)]
    pub actor: Actor,
    pub scope: ComplaintScope,
    pub item_index: usize,
    pub resolution: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteStorageRequest {
    #[serde(flatten)]
    pub actor: Actor,
    pub storage_location: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignVehicleRequest {
    #[serde(flatten)]
    pub actor: Actor,
    /// Omit to take the suggested vehicle.
    pub vehicle_id: Option<VehicleId>,
    pub driver_id: String,
    pub notes: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverVerifyRequest {
    #[serde(flatten)]
    pub actor: Actor,
    pub verified: bool,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ArriveRequest {
    #[serde(flatten)]
    pub actor: Actor,
    pub location: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PhotoRequest {
    #[serde(flatten)]
    pub actor: Actor,
    pub url: String,
    pub caption: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteDeliveryRequest {
    #[serde(flatten)]
    pub actor: Actor,
    pub customer_confirmed: bool,
    pub recipient_name: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueQuery {
    pub vehicle_id: Option<VehicleId>,
    pub driver_id: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

/// Reply to every stage operation: enough to re-render without a second fetch.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StageResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub new_status: Option<OrderStatus>,
    pub order_id: FulfillmentOrderId,
    pub order_number: String,
    pub status: OrderStatus,
    pub version: u64,
    pub events_committed: usize,
    pub packing_progress: u8,
    pub storage_progress: u8,
}

impl StageResponse {
    pub fn from_outcome(message: impl Into<String>, outcome: &CommandOutcome) -> Self {
        let order = &outcome.order;
        let message = if outcome.events_committed == 0 {
            "no change".to_string()
        } else {
            message.into()
        };
        Self {
            success: true,
            message,
            new_status: outcome.new_status,
            order_id: order.id_typed(),
            order_number: order.order_number().to_string(),
            status: order.status(),
            version: order.version(),
            events_committed: outcome.events_committed,
            packing_progress: order.packing().packing_progress,
            storage_progress: order.storage().storage_progress,
        }
    }
}

/// Full order as returned by `GET /orders/:id`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub order_id: FulfillmentOrderId,
    pub order_number: String,
    pub status: OrderStatus,
    pub driver_status: &'static str,
    pub is_active: bool,
    pub priority: Priority,
    pub customer: Option<CustomerRef>,
    pub schedule: Option<DeliverySchedule>,
    pub total_amount: u64,
    pub placed_at: Option<DateTime<Utc>>,
    pub items: Vec<OrderItem>,
    pub packing_details: PackingDetails,
    pub storage_details: StorageDetails,
    pub assignment_details: Option<AssignmentDetails>,
    pub driver_verification: Option<DriverVerification>,
    pub delivery: DeliveryDetails,
    pub requirement: LoadRequirement,
    pub stage_log: Vec<StageRecord>,
    pub version: u64,
}

impl From<&FulfillmentOrder> for OrderView {
    fn from(order: &FulfillmentOrder) -> Self {
        Self {
            order_id: order.id_typed(),
            order_number: order.order_number().to_string(),
            status: order.status(),
            driver_status: order.status().driver_label(),
            is_active: order.is_active(),
            priority: Priority::for_total(order.total_amount()),
            customer: order.customer().cloned(),
            schedule: order.schedule().cloned(),
            total_amount: order.total_amount(),
            placed_at: order.placed_at(),
            items: order.items().to_vec(),
            packing_details: order.packing().clone(),
            storage_details: order.storage().clone(),
            assignment_details: order.assignment().cloned(),
            driver_verification: order.driver_verification().cloned(),
            delivery: order.delivery().clone(),
            requirement: order.requirement(),
            stage_log: order.stage_log().to_vec(),
            version: order.version(),
        }
    }
}
