//! Bearer-token sessions created by login.

use std::collections::HashMap;
use std::sync::RwLock;

use comanda_auth::{LoginError, LoginPolicy, Principal, SessionToken};

/// Token → principal map for logged-in users.
#[derive(Debug)]
pub struct SessionRegistry {
    policy: LoginPolicy,
    sessions: RwLock<HashMap<SessionToken, Principal>>,
}

impl SessionRegistry {
    pub fn new(policy: LoginPolicy) -> Self {
        Self {
            policy,
            sessions: RwLock::new(HashMap::new()),
        }
    }

    pub fn login(&self, secret: &str, name: Option<&str>) -> Result<(SessionToken, Principal), LoginError> {
        let principal = self.policy.login(secret, name)?;
        let token = SessionToken::new();
        self.sessions
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .insert(token, principal.clone());
        Ok((token, principal))
    }

    /// Returns whether the token was live.
    pub fn logout(&self, token: &SessionToken) -> bool {
        let removed = self
            .sessions
            .write()
            .unwrap_or_else(|p| p.into_inner())
            .remove(token);
        if let Some(principal) = &removed {
            tracing::info!(name = %principal.name, role = %principal.role, "logout");
        }
        removed.is_some()
    }

    pub fn principal(&self, token: &SessionToken) -> Option<Principal> {
        self.sessions
            .read()
            .unwrap_or_else(|p| p.into_inner())
            .get(token)
            .cloned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use comanda_auth::Role;

    #[test]
    fn login_issues_token_until_logout() {
        let registry = SessionRegistry::new(LoginPolicy::new("1950"));
        let (token, principal) = registry.login("1950", Some("Ana")).unwrap();
        assert_eq!(principal.role, Role::PurchasingLead);
        assert_eq!(registry.principal(&token), Some(principal));

        assert!(registry.logout(&token));
        assert!(!registry.logout(&token));
        assert_eq!(registry.principal(&token), None);
    }

    #[test]
    fn rejected_login_creates_no_session() {
        let registry = SessionRegistry::new(LoginPolicy::new("1950"));
        assert_eq!(registry.login("", None), Err(LoginError::EmptySecret));
    }
}
