use comanda_auth::{Principal, SessionToken};

/// Authenticated session for a request, inserted by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionContext {
    token: SessionToken,
    principal: Principal,
}

impl SessionContext {
    pub fn new(token: SessionToken, principal: Principal) -> Self {
        Self { token, principal }
    }

    pub fn token(&self) -> SessionToken {
        self.token
    }

    pub fn principal(&self) -> &Principal {
        &self.principal
    }
}
