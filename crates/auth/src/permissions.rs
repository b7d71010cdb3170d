use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// Permission identifier, `"<area>.<action>"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    pub const CATALOG_READ: Permission = Permission::from_static("catalog.read");
    pub const CATALOG_WRITE: Permission = Permission::from_static("catalog.write");
    pub const ORDERS_CREATE: Permission = Permission::from_static("orders.create");
    /// Orders whose creator is the caller.
    pub const ORDERS_READ_OWN: Permission = Permission::from_static("orders.read_own");
    pub const ORDERS_READ_ALL: Permission = Permission::from_static("orders.read_all");
    pub const ORDERS_UPDATE_STATUS: Permission = Permission::from_static("orders.update_status");
    pub const ORDERS_DELETE: Permission = Permission::from_static("orders.delete");

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}
