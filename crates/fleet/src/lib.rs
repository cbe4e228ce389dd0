//! Vehicle and staff reference data consumed (never created) by the
//! fulfillment engine, plus the load requirement resolver.
//!
//! The engine depends on capabilities ("get vehicle by id", "list active
//! vehicles", "get employee by id") through the [`VehicleCatalog`] and
//! [`StaffDirectory`] traits; in-memory providers are supplied for dev/tests.

pub mod capacity;
pub mod requirement;
pub mod staff;
pub mod suggest;
pub mod vehicle;

pub use capacity::{Capacity, CapacityShortfall, LoadRequirement};
pub use requirement::{
    CargoLine, DEFAULT_UNIT_WEIGHT_KG, UNIT_VOLUME_M3, parse_unit_weight, requirement_for,
};
pub use staff::{Employee, InMemoryStaffDirectory, StaffDirectory, StaffRole};
pub use suggest::{VehicleSuggestion, suggest_vehicle};
pub use vehicle::{InMemoryVehicleCatalog, Vehicle, VehicleCatalog, VehicleCategory, VehicleId};
