use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use thiserror::Error;

use comanda_events::Subscription;

/// The five remote collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    Orders,
    Articles,
    Families,
    Suppliers,
    Units,
}

impl Collection {
    pub const ALL: [Collection; 5] = [
        Collection::Orders,
        Collection::Articles,
        Collection::Families,
        Collection::Suppliers,
        Collection::Units,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Collection::Orders => "orders",
            Collection::Articles => "articles",
            Collection::Families => "families",
            Collection::Suppliers => "suppliers",
            Collection::Units => "units",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Collection::ALL.into_iter().find(|c| c.as_str() == s)
    }
}

impl core::fmt::Display for Collection {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Server-native timestamp as the hosted store keeps it.
///
/// Ordered by `(seconds, nanos)`; records convert to `DateTime<Utc>` on read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ServerTimestamp {
    pub seconds: i64,
    pub nanos: u32,
}

impl ServerTimestamp {
    pub fn now() -> Self {
        Self::from_datetime(Utc::now())
    }

    pub fn from_datetime(at: DateTime<Utc>) -> Self {
        Self {
            seconds: at.timestamp(),
            nanos: at.timestamp_subsec_nanos(),
        }
    }

    /// `None` when the value is outside chrono's range.
    pub fn to_datetime(self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.seconds, self.nanos)
    }
}

impl From<DateTime<Utc>> for ServerTimestamp {
    fn from(value: DateTime<Utc>) -> Self {
        Self::from_datetime(value)
    }
}

/// A stored document: schemaless JSON body plus store-managed metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub data: JsonValue,
    pub created_at: ServerTimestamp,
    pub updated_at: ServerTimestamp,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Asc,
    Desc,
}

/// Listing order. Which variant to use depends on how the field is encoded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrderBy {
    /// A `ServerTimestamp` field.
    Timestamp { field: String, direction: Direction },
    /// A string field, compared bytewise.
    Text { field: String, direction: Direction },
}

impl OrderBy {
    pub fn timestamp(field: impl Into<String>, direction: Direction) -> Self {
        Self::Timestamp {
            field: field.into(),
            direction,
        }
    }

    pub fn text(field: impl Into<String>, direction: Direction) -> Self {
        Self::Text {
            field: field.into(),
            direction,
        }
    }
}

/// Listing query: optional top-level equality filter plus optional order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Query {
    pub filter: Option<(String, JsonValue)>,
    pub order_by: Option<OrderBy>,
}

impl Query {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn where_eq(mut self, field: impl Into<String>, value: impl Into<JsonValue>) -> Self {
        self.filter = Some((field.into(), value.into()));
        self
    }

    pub fn order_by(mut self, order_by: OrderBy) -> Self {
        self.order_by = Some(order_by);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Created,
    Updated,
    Deleted,
}

/// Pushed to watchers of a collection after every write.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangeNotice {
    pub collection: Collection,
    pub id: String,
    pub kind: ChangeKind,
}

/// Document store operation error.
///
/// Infrastructure failures only; record validation lives in the domain crates.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{collection}/{id} not found")]
    NotFound { collection: Collection, id: String },

    #[error("{collection}/{id} already exists")]
    AlreadyExists { collection: Collection, id: String },

    #[error("document body must be a JSON object")]
    NotAnObject,

    #[error("serialization failed: {0}")]
    Serialization(String),

    #[error("store backend failure: {0}")]
    Backend(String),
}

/// Remote document collections: create/get/list/update/delete plus a live
/// change feed per collection.
///
/// Writes stamp `created_at`/`updated_at` server-side. A `watch` subscription
/// receives one [`ChangeNotice`] per write to that collection, with no
/// ordering guarantee relative to the writer's own return.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn insert(
        &self,
        collection: Collection,
        id: &str,
        data: JsonValue,
    ) -> Result<Document, StoreError>;

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError>;

    async fn list(&self, collection: Collection, query: &Query) -> Result<Vec<Document>, StoreError>;

    /// Shallow merge of `patch` into the body; refreshes `updated_at`.
    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Map<String, JsonValue>,
    ) -> Result<Document, StoreError>;

    /// Returns whether a document was removed.
    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError>;

    async fn watch(&self, collection: Collection) -> Result<Subscription<ChangeNotice>, StoreError>;
}

#[async_trait]
impl<S> DocumentStore for Arc<S>
where
    S: DocumentStore + ?Sized,
{
    async fn insert(
        &self,
        collection: Collection,
        id: &str,
        data: JsonValue,
    ) -> Result<Document, StoreError> {
        (**self).insert(collection, id, data).await
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        (**self).get(collection, id).await
    }

    async fn list(&self, collection: Collection, query: &Query) -> Result<Vec<Document>, StoreError> {
        (**self).list(collection, query).await
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Map<String, JsonValue>,
    ) -> Result<Document, StoreError> {
        (**self).update(collection, id, patch).await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        (**self).delete(collection, id).await
    }

    async fn watch(&self, collection: Collection) -> Result<Subscription<ChangeNotice>, StoreError> {
        (**self).watch(collection).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn server_timestamp_converts_both_ways() {
        let at = Utc.with_ymd_and_hms(2024, 1, 31, 23, 59, 59).unwrap()
            + chrono::Duration::nanoseconds(123);
        let ts = ServerTimestamp::from_datetime(at);
        assert_eq!(ts.nanos, 123);
        assert_eq!(ts.to_datetime(), Some(at));
    }

    #[test]
    fn server_timestamps_order_by_seconds_then_nanos() {
        let a = ServerTimestamp { seconds: 10, nanos: 999 };
        let b = ServerTimestamp { seconds: 11, nanos: 0 };
        assert!(a < b);
    }

    #[test]
    fn collections_parse_from_their_names() {
        for c in Collection::ALL {
            assert_eq!(Collection::parse(c.as_str()), Some(c));
        }
        assert_eq!(Collection::parse("pedidos"), None);
    }
}
