use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier.
///
/// Permissions are opaque strings (e.g. "packing.write"). The wildcard `"*"`
/// is granted to administrators.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

pub const WILDCARD: Permission = Permission::from_static("*");
pub const ORDERS_READ: Permission = Permission::from_static("orders.read");
pub const ORDERS_PLACE: Permission = Permission::from_static("orders.place");
pub const ORDERS_CANCEL: Permission = Permission::from_static("orders.cancel");
pub const PACKING_WRITE: Permission = Permission::from_static("packing.write");
pub const STORAGE_WRITE: Permission = Permission::from_static("storage.write");
pub const DISPATCH_WRITE: Permission = Permission::from_static("dispatch.write");
pub const DRIVER_WRITE: Permission = Permission::from_static("driver.write");
