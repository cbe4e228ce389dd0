//! Value types carried by the order aggregate and its events.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use sitecart_core::ValueObject;
use sitecart_fleet::{Capacity, LoadRequirement, VehicleCategory, VehicleId};

/// Who performed an action: `{employeeId, employeeName}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeRef {
    pub employee_id: String,
    pub employee_name: String,
}

impl EmployeeRef {
    pub fn new(employee_id: impl Into<String>, employee_name: impl Into<String>) -> Self {
        Self {
            employee_id: employee_id.into(),
            employee_name: employee_name.into(),
        }
    }

    /// Actor for transitions nobody on staff performed (order placement).
    pub fn system() -> Self {
        Self::new("system", "System")
    }
}

impl ValueObject for EmployeeRef {}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRef {
    /// Chat handle the order came in on (phone number for WhatsApp).
    pub customer_id: String,
    pub name: Option<String>,
}

impl ValueObject for CustomerRef {}

/// Set at checkout; read-only to the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliverySchedule {
    pub delivery_date: NaiveDate,
    pub time_slot: String,
    pub delivery_address: String,
}

impl ValueObject for DeliverySchedule {}

/// A line as submitted at checkout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrderItem {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    /// Minor currency units.
    pub unit_price: u64,
    /// Free text such as "50kg bag"; feeds the load requirement.
    #[serde(default)]
    pub weight_label: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackingStatus {
    #[default]
    Pending,
    Packed,
    Unavailable,
}

impl PackingStatus {
    pub fn is_resolved(self) -> bool {
        !matches!(self, PackingStatus::Pending)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PackingComplaintType {
    NotAvailable,
    Damaged,
    Expired,
    InsufficientStock,
    WrongItem,
    Other,
}

impl PackingComplaintType {
    /// Complaint types that leave nothing to pack.
    pub fn forces_unavailable(self) -> bool {
        matches!(
            self,
            PackingComplaintType::NotAvailable
                | PackingComplaintType::Damaged
                | PackingComplaintType::Expired
                | PackingComplaintType::InsufficientStock
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageComplaintType {
    Damaged,
    Missing,
    WrongQuantity,
    WrongItem,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageCondition {
    Good,
    Acceptable,
    Damaged,
}

/// Which complaint list a complaint id lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintScope {
    Packing,
    Storage,
}

/// A complaint raised against one item. Append-only; resolution is recorded
/// in place but never removes the entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Complaint<K> {
    pub complaint_id: String,
    pub complaint_type: K,
    pub description: String,
    pub reported_by: EmployeeRef,
    pub reported_at: DateTime<Utc>,
    pub resolved: bool,
    pub resolution: Option<String>,
    pub resolved_by: Option<EmployeeRef>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl<K> Complaint<K> {
    pub fn resolve(&mut self, resolution: String, by: EmployeeRef, at: DateTime<Utc>) {
        self.resolved = true;
        self.resolution = Some(resolution);
        self.resolved_by = Some(by);
        self.resolved_at = Some(at);
    }
}

pub type PackingComplaint = Complaint<PackingComplaintType>;
pub type StorageComplaint = Complaint<StorageComplaintType>;

/// A line item with its packing and storage sub-state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: String,
    pub name: String,
    pub quantity: u32,
    pub unit_price: u64,
    pub weight_label: Option<String>,

    pub packing_status: PackingStatus,
    pub packed_at: Option<DateTime<Utc>>,
    pub packed_by: Option<EmployeeRef>,
    pub item_complaints: Vec<PackingComplaint>,

    pub storage_verified: bool,
    pub storage_condition: Option<StorageCondition>,
    pub verified_at: Option<DateTime<Utc>>,
    pub verified_by: Option<EmployeeRef>,
    pub storage_complaints: Vec<StorageComplaint>,
}

impl OrderItem {
    pub fn from_new(item: &NewOrderItem) -> Self {
        Self {
            product_id: item.product_id.clone(),
            name: item.name.clone(),
            quantity: item.quantity,
            unit_price: item.unit_price,
            weight_label: item.weight_label.clone(),
            packing_status: PackingStatus::Pending,
            packed_at: None,
            packed_by: None,
            item_complaints: Vec::new(),
            storage_verified: false,
            storage_condition: None,
            verified_at: None,
            verified_by: None,
            storage_complaints: Vec::new(),
        }
    }

    /// Storage counterpart of `PackingStatus::is_resolved`.
    pub fn storage_resolved(&self) -> bool {
        self.storage_verified || !self.storage_complaints.is_empty()
    }

    pub fn line_total(&self) -> u64 {
        self.unit_price.saturating_mul(u64::from(self.quantity))
    }
}

/// `resolved * 100 / total`, rounded half up; an empty order counts as done.
pub fn percent(resolved: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    let pct = (resolved * 100 + total / 2) / total;
    pct.min(100) as u8
}

/// Packing roll-up, recomputed from the items after every item change.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PackingDetails {
    pub started_at: Option<DateTime<Utc>>,
    pub started_by: Option<EmployeeRef>,
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<EmployeeRef>,
    pub total_items: usize,
    pub total_items_packed: usize,
    pub total_items_unavailable: usize,
    pub packing_progress: u8,
    pub notes: Option<String>,
}

impl PackingDetails {
    pub fn recompute(&mut self, items: &[OrderItem]) {
        self.total_items = items.len();
        self.total_items_packed = items
            .iter()
            .filter(|i| i.packing_status == PackingStatus::Packed)
            .count();
        self.total_items_unavailable = items
            .iter()
            .filter(|i| i.packing_status == PackingStatus::Unavailable)
            .count();
        self.packing_progress = percent(
            self.total_items_packed + self.total_items_unavailable,
            self.total_items,
        );
    }

    pub fn pending_items(&self) -> usize {
        self.total_items - self.total_items_packed - self.total_items_unavailable
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageDetails {
    pub completed_at: Option<DateTime<Utc>>,
    pub completed_by: Option<EmployeeRef>,
    pub storage_location: Option<String>,
    pub total_items: usize,
    pub items_verified: usize,
    pub items_with_complaints: usize,
    pub storage_progress: u8,
    pub notes: Option<String>,
}

impl StorageDetails {
    pub fn recompute(&mut self, items: &[OrderItem]) {
        self.total_items = items.len();
        self.items_verified = items.iter().filter(|i| i.storage_verified).count();
        self.items_with_complaints = items
            .iter()
            .filter(|i| !i.storage_complaints.is_empty())
            .count();
        let resolved = items.iter().filter(|i| i.storage_resolved()).count();
        self.storage_progress = percent(resolved, self.total_items);
    }
}

/// Driver snapshot taken at assignment time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverRef {
    pub employee_id: String,
    pub name: String,
    pub phone: Option<String>,
}

/// Written once by dispatch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDetails {
    pub vehicle_id: VehicleId,
    pub registration_number: String,
    pub category: VehicleCategory,
    pub capacity: Capacity,
    pub driver: DriverRef,
    pub requirement: LoadRequirement,
    pub assigned_by: EmployeeRef,
    pub assigned_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DriverVerification {
    pub verified: bool,
    pub verified_by: EmployeeRef,
    pub verified_at: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryPhoto {
    pub photo_id: String,
    pub url: String,
    pub caption: Option<String>,
    pub uploaded_by: EmployeeRef,
    pub uploaded_at: DateTime<Utc>,
}

/// Route and delivery evidence.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryDetails {
    pub route_started_at: Option<DateTime<Utc>>,
    pub arrived_at: Option<DateTime<Utc>>,
    pub arrival_location: Option<String>,
    pub delivery_photos: Vec<DeliveryPhoto>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub delivered_by: Option<EmployeeRef>,
    pub customer_confirmed: bool,
    pub recipient_name: Option<String>,
    pub notes: Option<String>,
}
