use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::permissions::{
    DISPATCH_WRITE, DRIVER_WRITE, ORDERS_CANCEL, ORDERS_PLACE, ORDERS_READ, PACKING_WRITE,
    Permission, STORAGE_WRITE, WILDCARD,
};

/// Role identifier carried in the token.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Role(Cow<'static, str>);

impl Role {
    pub const ADMIN: Role = Role(Cow::Borrowed("admin"));
    pub const PACKER: Role = Role(Cow::Borrowed("packer"));
    pub const STORAGE_VERIFIER: Role = Role(Cow::Borrowed("storage_verifier"));
    pub const DISPATCHER: Role = Role(Cow::Borrowed("dispatcher"));
    pub const DRIVER: Role = Role(Cow::Borrowed("driver"));
    /// The chat front-end placing orders at checkout.
    pub const STOREFRONT: Role = Role(Cow::Borrowed("storefront"));

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Fixed policy: what each fulfillment role may do.
    pub fn permissions(&self) -> Vec<Permission> {
        match self.as_str() {
            "admin" => vec![WILDCARD],
            "packer" => vec![ORDERS_READ, PACKING_WRITE],
            "storage_verifier" => vec![ORDERS_READ, STORAGE_WRITE],
            "dispatcher" => vec![ORDERS_READ, DISPATCH_WRITE, ORDERS_CANCEL],
            "driver" => vec![ORDERS_READ, DRIVER_WRITE],
            "storefront" => vec![ORDERS_PLACE, ORDERS_READ],
            _ => Vec::new(),
        }
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Union of the permissions granted by `roles`, without duplicates.
pub fn permissions_for_roles(roles: &[Role]) -> Vec<Permission> {
    let mut out: Vec<Permission> = Vec::new();
    for perm in roles.iter().flat_map(Role::permissions) {
        if !out.contains(&perm) {
            out.push(perm);
        }
    }
    out
}
