use serde::Serialize;

use crate::capacity::LoadRequirement;
use crate::vehicle::{Vehicle, VehicleCatalog};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VehicleSuggestion {
    pub requirement: LoadRequirement,
    pub vehicle: Option<Vehicle>,
    /// Every active vehicle able to carry the load, catalog order.
    pub candidates: Vec<Vehicle>,
}

/// Smallest sufficient active vehicle.
///
/// Greedy: among active vehicles meeting all three thresholds, pick the one
/// with the smallest capacity sum. Ties keep catalog order.
pub fn suggest_vehicle(catalog: &dyn VehicleCatalog, requirement: LoadRequirement) -> VehicleSuggestion {
    let candidates: Vec<Vehicle> = catalog
        .list_active()
        .into_iter()
        .filter(|v| v.capacity.accommodates(&requirement).is_ok())
        .collect();

    // `min_by` returns the first of equal minima, which keeps ties stable.
    let vehicle = candidates
        .iter()
        .min_by(|a, b| a.capacity.size_score().total_cmp(&b.capacity.size_score()))
        .cloned();

    VehicleSuggestion {
        requirement,
        vehicle,
        candidates,
    }
}
