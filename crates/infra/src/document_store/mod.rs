//! Document store abstraction and backends.

pub mod in_memory;
#[cfg(feature = "postgres")]
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryDocumentStore;
pub use r#trait::{
    ChangeKind, ChangeNotice, Collection, Direction, Document, DocumentStore, OrderBy, Query,
    ServerTimestamp, StoreError,
};
