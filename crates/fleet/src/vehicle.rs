use serde::{Deserialize, Serialize};

use sitecart_core::{DomainError, Entity};

use crate::capacity::Capacity;

/// Fleet identifier as issued by the dispatch office (e.g. "VH-003").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VehicleId(pub String);

impl VehicleId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for VehicleId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleCategory {
    Motorbike,
    Pickup,
    Van,
    Lorry,
    Flatbed,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Vehicle {
    pub vehicle_id: VehicleId,
    pub registration_number: String,
    pub category: VehicleCategory,
    #[serde(flatten)]
    pub capacity: Capacity,
    pub active: bool,
}

impl Entity for Vehicle {
    type Id = VehicleId;

    fn id(&self) -> &Self::Id {
        &self.vehicle_id
    }
}

/// Read-only vehicle lookups.
pub trait VehicleCatalog: Send + Sync {
    fn get(&self, vehicle_id: &VehicleId) -> Option<Vehicle>;

    /// Active vehicles in catalog order (suggestion ties break on this order).
    fn list_active(&self) -> Vec<Vehicle>;
}

impl<C> VehicleCatalog for std::sync::Arc<C>
where
    C: VehicleCatalog + ?Sized,
{
    fn get(&self, vehicle_id: &VehicleId) -> Option<Vehicle> {
        (**self).get(vehicle_id)
    }

    fn list_active(&self) -> Vec<Vehicle> {
        (**self).list_active()
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryVehicleCatalog {
    vehicles: Vec<Vehicle>,
}

impl InMemoryVehicleCatalog {
    pub fn new(vehicles: Vec<Vehicle>) -> Self {
        Self { vehicles }
    }

    /// Standard yard fleet, smallest first.
    pub fn with_defaults() -> Self {
        let v = |id: &str, reg: &str, category, cap: Capacity| Vehicle {
            vehicle_id: VehicleId::new(id),
            registration_number: reg.to_string(),
            category,
            capacity: cap,
            active: true,
        };

        Self::new(vec![
            v("VH-001", "KBA-101M", VehicleCategory::Motorbike, Capacity::new(0.5, 50.0, 5)),
            v("VH-002", "KBB-202P", VehicleCategory::Pickup, Capacity::new(3.0, 1_000.0, 20)),
            v("VH-003", "KBC-303V", VehicleCategory::Van, Capacity::new(8.0, 1_500.0, 40)),
            v("VH-004", "KBD-404L", VehicleCategory::Lorry, Capacity::new(20.0, 5_000.0, 100)),
            v("VH-005", "KBE-505F", VehicleCategory::Flatbed, Capacity::new(30.0, 10_000.0, 150)),
        ])
    }

    /// Load a catalog from a JSON array of vehicles.
    pub fn from_json(raw: &str) -> Result<Self, DomainError> {
        let vehicles: Vec<Vehicle> = serde_json::from_str(raw)
            .map_err(|e| DomainError::validation(format!("vehicle catalog: {e}")))?;
        Ok(Self::new(vehicles))
    }
}

impl VehicleCatalog for InMemoryVehicleCatalog {
    fn get(&self, vehicle_id: &VehicleId) -> Option<Vehicle> {
        self.vehicles.iter().find(|v| &v.vehicle_id == vehicle_id).cloned()
    }

    fn list_active(&self) -> Vec<Vehicle> {
        self.vehicles.iter().filter(|v| v.active).cloned().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inactive_vehicles_are_listed_only_by_id() {
        let mut catalog = InMemoryVehicleCatalog::with_defaults();
        catalog.vehicles[1].active = false;

        assert!(catalog.get(&VehicleId::new("VH-002")).is_some());
        assert_eq!(catalog.list_active().len(), 4);
        assert!(catalog.get(&VehicleId::new("VH-999")).is_none());
    }

    #[test]
    fn catalog_loads_from_json() {
        let raw = r#"[{"vehicleId":"T1","registrationNumber":"X","category":"van",
            "maxVolume":5.0,"maxWeight":100.0,"maxPackages":10,"active":true}]"#;
        let catalog = InMemoryVehicleCatalog::from_json(raw).unwrap();
        let v = catalog.get(&VehicleId::new("T1")).unwrap();
        assert_eq!(v.capacity, Capacity::new(5.0, 100.0, 10));

        assert!(InMemoryVehicleCatalog::from_json("{").is_err());
    }
}
