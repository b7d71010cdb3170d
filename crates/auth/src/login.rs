//! Shared-secret login. Not a security boundary: the secret only picks a role.

use thiserror::Error;

use crate::{Principal, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LoginError {
    #[error("secret must not be empty")]
    EmptySecret,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoginPolicy {
    lead_secret: String,
}

impl LoginPolicy {
    pub fn new(lead_secret: impl Into<String>) -> Self {
        Self {
            lead_secret: lead_secret.into(),
        }
    }

    /// The lead secret yields `PurchasingLead`; any other non-empty secret
    /// yields `Cook`. Without a name the principal is named after the role.
    pub fn login(&self, secret: &str, name: Option<&str>) -> Result<Principal, LoginError> {
        if secret.trim().is_empty() {
            tracing::warn!("login rejected: empty secret");
            return Err(LoginError::EmptySecret);
        }

        // Exact match; surrounding whitespace does not count.
        let role = if secret == self.lead_secret {
            Role::PurchasingLead
        } else {
            Role::Cook
        };
        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .unwrap_or(role.as_str());

        tracing::info!(%role, name, "login");
        Ok(Principal::new(name, role))
    }
}
