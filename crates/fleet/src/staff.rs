use serde::{Deserialize, Serialize};

use sitecart_core::Entity;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StaffRole {
    Packer,
    StorageVerifier,
    Dispatcher,
    Driver,
    Admin,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub employee_id: String,
    pub name: String,
    pub role: StaffRole,
    pub phone: Option<String>,
    pub active: bool,
    /// Drivers only: not currently out on another manifest.
    pub available: bool,
}

impl Employee {
    pub fn can_drive(&self) -> bool {
        self.active && self.available && self.role == StaffRole::Driver
    }
}

impl Entity for Employee {
    type Id = String;

    fn id(&self) -> &Self::Id {
        &self.employee_id
    }
}

pub trait StaffDirectory: Send + Sync {
    fn get(&self, employee_id: &str) -> Option<Employee>;

    fn list_available_drivers(&self) -> Vec<Employee>;
}

impl<D> StaffDirectory for std::sync::Arc<D>
where
    D: StaffDirectory + ?Sized,
{
    fn get(&self, employee_id: &str) -> Option<Employee> {
        (**self).get(employee_id)
    }

    fn list_available_drivers(&self) -> Vec<Employee> {
        (**self).list_available_drivers()
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryStaffDirectory {
    employees: Vec<Employee>,
}

impl InMemoryStaffDirectory {
    pub fn new(employees: Vec<Employee>) -> Self {
        Self { employees }
    }

    pub fn with_defaults() -> Self {
        let e = |id: &str, name: &str, role| Employee {
            employee_id: id.to_string(),
            name: name.to_string(),
            role,
            phone: None,
            active: true,
            available: true,
        };

        Self::new(vec![
            e("EMP-P01", "Packing Desk", StaffRole::Packer),
            e("EMP-S01", "Storage Desk", StaffRole::StorageVerifier),
            e("EMP-D01", "Dispatch Desk", StaffRole::Dispatcher),
            e("DRV-001", "Driver One", StaffRole::Driver),
            e("DRV-002", "Driver Two", StaffRole::Driver),
        ])
    }
}

impl StaffDirectory for InMemoryStaffDirectory {
    fn get(&self, employee_id: &str) -> Option<Employee> {
        self.employees
            .iter()
            .find(|e| e.employee_id == employee_id)
            .cloned()
    }

    fn list_available_drivers(&self) -> Vec<Employee> {
        self.employees.iter().filter(|e| e.can_drive()).cloned().collect()
    }
}
