use thiserror::Error;

use comanda_auth::{AuthzError, LoginError};
use comanda_core::DomainError;
use comanda_infra::{RepositoryError, SubmitError};

/// Everything an [`AppContext`](crate::AppContext) operation can fail with.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ContextError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Authz(#[from] AuthzError),

    #[error(transparent)]
    Login(#[from] LoginError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),

    #[error(transparent)]
    Submit(#[from] SubmitError),
}
