use thiserror::Error;

use crate::views::View;
use crate::{Permission, Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: missing permission '{0}'")]
    Forbidden(String),

    #[error("forbidden: view '{view}' is not available to role '{role}'")]
    ViewForbidden { view: View, role: Role },

    #[error("forbidden: order belongs to another user")]
    NotOwner,
}

/// Pure policy check against the static role map.
pub fn authorize(principal: &Principal, required: &Permission) -> Result<(), AuthzError> {
    if principal.role.grants(required) {
        Ok(())
    } else {
        Err(AuthzError::Forbidden(required.as_str().to_string()))
    }
}

/// Order visibility: readers of all orders see everything, everyone else
/// only what they created.
pub fn authorize_order_read(principal: &Principal, created_by: &str) -> Result<(), AuthzError> {
    if principal.role.grants(&Permission::ORDERS_READ_ALL) {
        return Ok(());
    }
    authorize(principal, &Permission::ORDERS_READ_OWN)?;
    if principal.name == created_by {
        Ok(())
    } else {
        Err(AuthzError::NotOwner)
    }
}
