//! Typed repositories over the document store.
//!
//! Each call is one async request/response against the store. No retries,
//! no rollback: a failed call leaves whatever the store already accepted.

pub mod catalog;
pub mod orders;

use thiserror::Error;

use comanda_core::{DomainError, ReferenceKind, SupplierId};
use comanda_ordering::Order;

use crate::document_store::StoreError;

pub use catalog::CatalogRepository;
pub use orders::OrderRepository;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum RepositoryError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("{kind} {id} not found")]
    NotFound { kind: ReferenceKind, id: String },
}

impl RepositoryError {
    pub fn not_found(kind: ReferenceKind, id: impl ToString) -> Self {
        Self::NotFound {
            kind,
            id: id.to_string(),
        }
    }
}

/// One supplier group that could not be persisted.
#[derive(Debug, Clone, PartialEq)]
pub struct SubmitFailure {
    pub supplier: SupplierId,
    pub error: RepositoryError,
}

/// Submitting a draft as orders.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum SubmitError {
    #[error("draft is empty")]
    EmptyDraft,

    /// Some supplier groups were persisted, some were not. Persisted orders
    /// stay; their lines have already left the draft.
    #[error("{}", partial_summary(.created, .failures))]
    Partial {
        created: Vec<Order>,
        failures: Vec<SubmitFailure>,
    },
}

fn partial_summary(created: &[Order], failures: &[SubmitFailure]) -> String {
    format!(
        "{} of {} orders could not be created",
        failures.len(),
        failures.len() + created.len()
    )
}
