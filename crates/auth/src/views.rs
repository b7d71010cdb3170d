//! Role-gated navigation.

use serde::{Deserialize, Serialize};

use comanda_core::DomainError;

use crate::{AuthzError, Role};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum View {
    Orders,
    Articles,
    Families,
    Suppliers,
    Units,
}

impl View {
    pub const ALL: [View; 5] = [
        View::Orders,
        View::Articles,
        View::Families,
        View::Suppliers,
        View::Units,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            View::Orders => "orders",
            View::Articles => "articles",
            View::Families => "families",
            View::Suppliers => "suppliers",
            View::Units => "units",
        }
    }

    pub fn route(&self) -> &'static str {
        match self {
            View::Orders => "/orders",
            View::Articles => "/articles",
            View::Families => "/families",
            View::Suppliers => "/suppliers",
            View::Units => "/units",
        }
    }
}

impl core::fmt::Display for View {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl core::str::FromStr for View {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        View::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| DomainError::validation(format!("unknown view: {s}")))
    }
}

/// Views the role may navigate to, in menu order.
pub fn allowed_views(role: Role) -> &'static [View] {
    match role {
        Role::Cook => &[View::Orders],
        Role::PurchasingLead => &View::ALL,
    }
}

/// Gate a navigation request. A forbidden view is never rendered.
pub fn resolve_view(role: Role, view: View) -> Result<View, AuthzError> {
    if allowed_views(role).contains(&view) {
        Ok(view)
    } else {
        tracing::warn!(%role, %view, "navigation to forbidden view");
        Err(AuthzError::ViewForbidden { view, role })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cook_sees_orders_only() {
        assert_eq!(allowed_views(Role::Cook), &[View::Orders]);
        for view in [View::Articles, View::Families, View::Suppliers, View::Units] {
            assert_eq!(
                resolve_view(Role::Cook, view),
                Err(AuthzError::ViewForbidden { view, role: Role::Cook })
            );
        }
    }

    #[test]
    fn lead_sees_all_views() {
        for view in View::ALL {
            assert_eq!(resolve_view(Role::PurchasingLead, view), Ok(view));
        }
    }

    #[test]
    fn routes_match_names() {
        for view in View::ALL {
            assert_eq!(view.route(), format!("/{}", view.as_str()));
            assert_eq!(view.as_str().parse::<View>().unwrap(), view);
        }
    }
}
