use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use serde_json::{Map, Value as JsonValue};

use comanda_events::{EventBus, InMemoryEventBus, Subscription};

use super::r#trait::{
    ChangeKind, ChangeNotice, Collection, Direction, Document, DocumentStore, OrderBy, Query,
    ServerTimestamp, StoreError,
};

/// In-process document store.
///
/// Stand-in for the hosted store in tests/dev. Documents keep insertion
/// order, so unordered listings and ties under `OrderBy` are deterministic.
#[derive(Debug)]
pub struct InMemoryDocumentStore {
    collections: RwLock<HashMap<Collection, Vec<Document>>>,
    feeds: HashMap<Collection, InMemoryEventBus<ChangeNotice>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            feeds: Collection::ALL
                .into_iter()
                .map(|c| (c, InMemoryEventBus::new()))
                .collect(),
        }
    }

    /// Live watchers of `collection`.
    pub fn watcher_count(&self, collection: Collection) -> usize {
        self.feeds
            .get(&collection)
            .map(|bus| bus.subscriber_count())
            .unwrap_or(0)
    }

    fn notify(&self, collection: Collection, id: &str, kind: ChangeKind) {
        let Some(bus) = self.feeds.get(&collection) else {
            return;
        };
        let notice = ChangeNotice {
            collection,
            id: id.to_string(),
            kind,
        };
        if let Err(e) = bus.publish(notice) {
            tracing::warn!(%collection, id, error = ?e, "change notice dropped");
        }
    }
}

impl Default for InMemoryDocumentStore {
    fn default() -> Self {
        Self::new()
    }
}

fn poisoned() -> StoreError {
    StoreError::Backend("lock poisoned".to_string())
}

fn field<'a>(doc: &'a Document, name: &str) -> Option<&'a JsonValue> {
    doc.data.as_object().and_then(|obj| obj.get(name))
}

fn timestamp_field(doc: &Document, name: &str) -> Option<ServerTimestamp> {
    field(doc, name).and_then(|v| serde_json::from_value(v.clone()).ok())
}

fn compare(a: &Document, b: &Document, order_by: &OrderBy) -> Ordering {
    let (ordering, direction) = match order_by {
        OrderBy::Timestamp { field: name, direction } => {
            (timestamp_field(a, name).cmp(&timestamp_field(b, name)), *direction)
        }
        OrderBy::Text { field: name, direction } => {
            let text = |d: &Document| field(d, name).and_then(JsonValue::as_str).map(str::to_owned);
            (text(a).cmp(&text(b)), *direction)
        }
    };
    match direction {
        Direction::Asc => ordering,
        Direction::Desc => ordering.reverse(),
    }
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn insert(
        &self,
        collection: Collection,
        id: &str,
        data: JsonValue,
    ) -> Result<Document, StoreError> {
        if !data.is_object() {
            return Err(StoreError::NotAnObject);
        }

        let doc = {
            let mut collections = self.collections.write().map_err(|_| poisoned())?;
            let docs = collections.entry(collection).or_default();
            if docs.iter().any(|d| d.id == id) {
                return Err(StoreError::AlreadyExists {
                    collection,
                    id: id.to_string(),
                });
            }
            let now = ServerTimestamp::now();
            let doc = Document {
                id: id.to_string(),
                data,
                created_at: now,
                updated_at: now,
            };
            docs.push(doc.clone());
            doc
        };

        self.notify(collection, id, ChangeKind::Created);
        Ok(doc)
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
        let collections = self.collections.read().map_err(|_| poisoned())?;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|d| d.id == id))
            .cloned())
    }

    async fn list(&self, collection: Collection, query: &Query) -> Result<Vec<Document>, StoreError> {
        let mut docs: Vec<Document> = {
            let collections = self.collections.read().map_err(|_| poisoned())?;
            collections
                .get(&collection)
                .map(|docs| {
                    docs.iter()
                        .filter(|d| match &query.filter {
                            Some((name, expected)) => field(d, name) == Some(expected),
                            None => true,
                        })
                        .cloned()
                        .collect()
                })
                .unwrap_or_default()
        };

        if let Some(order_by) = &query.order_by {
            docs.sort_by(|a, b| compare(a, b, order_by));
        }
        Ok(docs)
    }

    async fn update(
        &self,
        collection: Collection,
        id: &str,
        patch: Map<String, JsonValue>,
    ) -> Result<Document, StoreError> {
        let doc = {
            let mut collections = self.collections.write().map_err(|_| poisoned())?;
            let doc = collections
                .get_mut(&collection)
                .and_then(|docs| docs.iter_mut().find(|d| d.id == id))
                .ok_or_else(|| StoreError::NotFound {
                    collection,
                    id: id.to_string(),
                })?;
            let body = doc.data.as_object_mut().ok_or(StoreError::NotAnObject)?;
            for (key, value) in patch {
                body.insert(key, value);
            }
            doc.updated_at = ServerTimestamp::now();
            doc.clone()
        };

        self.notify(collection, id, ChangeKind::Updated);
        Ok(doc)
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        let removed = {
            let mut collections = self.collections.write().map_err(|_| poisoned())?;
            match collections.get_mut(&collection) {
                Some(docs) => {
                    let before = docs.len();
                    docs.retain(|d| d.id != id);
                    docs.len() != before
                }
                None => false,
            }
        };

        if removed {
            self.notify(collection, id, ChangeKind::Deleted);
        }
        Ok(removed)
    }

    async fn watch(&self, collection: Collection) -> Result<Subscription<ChangeNotice>, StoreError> {
        self.feeds
            .get(&collection)
            .map(|bus| bus.subscribe())
            .ok_or_else(|| StoreError::Backend(format!("no change feed for {collection}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn insert_then_get_round_trips_and_stamps_times() {
        let store = InMemoryDocumentStore::new();
        let doc = store
            .insert(Collection::Units, "u1", json!({"name": "Kg"}))
            .await
            .unwrap();
        assert_eq!(doc.created_at, doc.updated_at);

        let got = store.get(Collection::Units, "u1").await.unwrap().unwrap();
        assert_eq!(got.data["name"], "Kg");
        assert!(store.get(Collection::Families, "u1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn duplicate_ids_and_non_objects_are_rejected() {
        let store = InMemoryDocumentStore::new();
        store.insert(Collection::Units, "u1", json!({})).await.unwrap();

        let dup = store.insert(Collection::Units, "u1", json!({})).await;
        assert!(matches!(dup, Err(StoreError::AlreadyExists { .. })));

        let scalar = store.insert(Collection::Units, "u2", json!(3)).await;
        assert_eq!(scalar, Err(StoreError::NotAnObject));
    }

    #[tokio::test]
    async fn update_merges_fields_and_missing_is_not_found() {
        let store = InMemoryDocumentStore::new();
        store
            .insert(Collection::Families, "f1", json!({"name": "Carnes", "description": "x"}))
            .await
            .unwrap();

        let mut patch = Map::new();
        patch.insert("name".into(), json!("Carnes rojas"));
        let doc = store.update(Collection::Families, "f1", patch.clone()).await.unwrap();
        assert_eq!(doc.data, json!({"name": "Carnes rojas", "description": "x"}));
        assert!(doc.updated_at >= doc.created_at);

        let missing = store.update(Collection::Families, "nope", patch).await;
        assert!(matches!(missing, Err(StoreError::NotFound { .. })));
    }

    #[tokio::test]
    async fn list_filters_and_orders() {
        let store = InMemoryDocumentStore::new();
        for (id, name, active) in [("a", "Sal", true), ("b", "Leche", false), ("c", "Ajo", true)] {
            store
                .insert(Collection::Articles, id, json!({"name": name, "active": active}))
                .await
                .unwrap();
        }

        let query = Query::all()
            .where_eq("active", true)
            .order_by(OrderBy::text("name", Direction::Asc));
        let names: Vec<String> = store
            .list(Collection::Articles, &query)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.data["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["Ajo", "Sal"]);
    }

    #[tokio::test]
    async fn timestamp_order_descending() {
        let store = InMemoryDocumentStore::new();
        for (id, seconds) in [("o1", 100), ("o2", 300), ("o3", 200)] {
            store
                .insert(Collection::Orders, id, json!({"date": {"seconds": seconds, "nanos": 0}}))
                .await
                .unwrap();
        }

        let query = Query::all().order_by(OrderBy::timestamp("date", Direction::Desc));
        let ids: Vec<String> = store
            .list(Collection::Orders, &query)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(ids, vec!["o2", "o3", "o1"]);
    }

    #[tokio::test]
    async fn watchers_see_writes_to_their_collection_only() {
        let store = InMemoryDocumentStore::new();
        let mut orders = store.watch(Collection::Orders).await.unwrap();

        store.insert(Collection::Units, "u1", json!({})).await.unwrap();
        store.insert(Collection::Orders, "o1", json!({})).await.unwrap();
        store.delete(Collection::Orders, "o1").await.unwrap();

        let first = orders.recv().await.unwrap();
        assert_eq!((first.id.as_str(), first.kind), ("o1", ChangeKind::Created));
        let second = orders.recv().await.unwrap();
        assert_eq!(second.kind, ChangeKind::Deleted);
        assert!(orders.try_recv().is_err());
    }

    #[tokio::test]
    async fn dropping_a_watch_unregisters_it() {
        let store = InMemoryDocumentStore::new();
        let sub = store.watch(Collection::Orders).await.unwrap();
        assert_eq!(store.watcher_count(Collection::Orders), 1);
        drop(sub);
        assert_eq!(store.watcher_count(Collection::Orders), 0);
    }
}
