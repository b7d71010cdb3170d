use serde::{Deserialize, Serialize};

use comanda_core::DomainError;

use crate::permissions::Permission;

/// The two roles of the kitchen workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Composes orders and sees the ones they created.
    Cook,
    /// Manages the catalog and every order.
    PurchasingLead,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Cook => "cook",
            Role::PurchasingLead => "purchasing_lead",
        }
    }

    /// Static role → permission map.
    pub fn permissions(&self) -> &'static [Permission] {
        const COOK: &[Permission] = &[
            Permission::CATALOG_READ,
            Permission::ORDERS_CREATE,
            Permission::ORDERS_READ_OWN,
        ];
        const LEAD: &[Permission] = &[
            Permission::CATALOG_READ,
            Permission::CATALOG_WRITE,
            Permission::ORDERS_CREATE,
            Permission::ORDERS_READ_OWN,
            Permission::ORDERS_READ_ALL,
            Permission::ORDERS_UPDATE_STATUS,
            Permission::ORDERS_DELETE,
        ];
        match self {
            Role::Cook => COOK,
            Role::PurchasingLead => LEAD,
        }
    }

    pub fn grants(&self, permission: &Permission) -> bool {
        self.permissions().contains(permission)
    }
}

impl core::fmt::Display for Role {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for Role {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cook" => Ok(Role::Cook),
            "purchasing_lead" => Ok(Role::PurchasingLead),
            other => Err(DomainError::validation(format!("unknown role: {other}"))),
        }
    }
}
