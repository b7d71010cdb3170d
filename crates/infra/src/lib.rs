//! Infrastructure layer: document store backends, record mapping,
//! repositories and the demo seed.

pub mod document_store;
pub mod documents;
pub mod repositories;
pub mod seed;

pub use document_store::{
    ChangeKind, ChangeNotice, Collection, Direction, Document, DocumentStore, InMemoryDocumentStore,
    OrderBy, Query, ServerTimestamp, StoreError,
};
pub use repositories::{
    CatalogRepository, OrderRepository, RepositoryError, SubmitError, SubmitFailure,
};
pub use seed::{seed_demo_catalog, SeedReport};

#[cfg(feature = "postgres")]
pub use document_store::postgres::PostgresDocumentStore;
