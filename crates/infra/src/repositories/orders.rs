use std::sync::Arc;

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

use comanda_core::{OrderId, ReferenceKind};
use comanda_events::{Subscription, SubscriptionHandle};
use comanda_ordering::{NewOrder, Order, OrderDraft, OrderStatus};

use crate::document_store::{Collection, Direction, DocumentStore, OrderBy, Query};
use crate::documents::{self, fields, OrderStatusPatch};

use super::{RepositoryError, SubmitError, SubmitFailure};

/// Persisted orders. Listings are always newest first.
#[derive(Clone)]
pub struct OrderRepository {
    store: Arc<dyn DocumentStore>,
}

impl OrderRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    pub async fn create(&self, new: NewOrder) -> Result<Order, RepositoryError> {
        let order = new.validate()?.into_order(OrderId::new());
        self.store
            .insert(Collection::Orders, &order.id.to_string(), documents::order_to_body(&order)?)
            .await?;
        tracing::info!(
            order_id = %order.id,
            supplier = %order.supplier,
            lines = order.lines.len(),
            created_by = %order.created_by,
            "order created"
        );
        Ok(order)
    }

    pub async fn list(&self) -> Result<Vec<Order>, RepositoryError> {
        let query = Query::all().order_by(OrderBy::timestamp(fields::DATE, Direction::Desc));
        let docs = self.store.list(Collection::Orders, &query).await?;
        Ok(docs
            .iter()
            .map(documents::order_from_doc)
            .collect::<Result<_, _>>()?)
    }

    pub async fn get(&self, id: &OrderId) -> Result<Order, RepositoryError> {
        match self.store.get(Collection::Orders, &id.to_string()).await? {
            Some(doc) => Ok(documents::order_from_doc(&doc)?),
            None => Err(RepositoryError::not_found(ReferenceKind::Order, id)),
        }
    }

    /// Any status may follow any other; the first move to `Sent` stamps
    /// `sent_at` with `now`.
    pub async fn update_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
        now: DateTime<Utc>,
    ) -> Result<Order, RepositoryError> {
        let mut order = self.get(id).await?;
        let change = order.set_status(status, now);
        let patch = documents::patch(&OrderStatusPatch::from_order(&order))?;
        self.store
            .update(Collection::Orders, &id.to_string(), patch)
            .await?;
        tracing::info!(
            order_id = %id,
            from = %change.from,
            to = %change.to,
            stamped_sent = change.stamped_sent,
            "order status updated"
        );
        Ok(order)
    }

    pub async fn update_notes(&self, id: &OrderId, notes: Option<String>) -> Result<Order, RepositoryError> {
        let mut order = self.get(id).await?;
        order.set_notes(notes);
        let mut patch = serde_json::Map::new();
        patch.insert(fields::NOTES.to_string(), serde_json::json!(order.notes));
        self.store
            .update(Collection::Orders, &id.to_string(), patch)
            .await?;
        tracing::info!(order_id = %id, "order notes updated");
        Ok(order)
    }

    pub async fn delete(&self, id: &OrderId) -> Result<(), RepositoryError> {
        if !self.store.delete(Collection::Orders, &id.to_string()).await? {
            return Err(RepositoryError::not_found(ReferenceKind::Order, id));
        }
        tracing::info!(order_id = %id, "order deleted");
        Ok(())
    }

    /// Live order list.
    ///
    /// Delivers the full, newest-first order set once on open and again after
    /// every change to the orders collection. Consumers replace their list
    /// wholesale on each message. Cancelling the subscription (explicitly or
    /// by dropping it) stops the refresh task and releases the change feed.
    pub async fn subscribe(&self) -> Result<Subscription<Vec<Order>>, RepositoryError> {
        // Watch before the first read so no change slips in between.
        let mut changes = self.store.watch(Collection::Orders).await?;
        let initial = self.list().await?;

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(initial);

        let repo = self.clone();
        let task = tokio::spawn(async move {
            while changes.recv().await.is_some() {
                match repo.list().await {
                    Ok(snapshot) => {
                        if tx.send(snapshot).is_err() {
                            break;
                        }
                    }
                    Err(e) => tracing::error!(error = %e, "order snapshot refresh failed"),
                }
            }
        });

        let handle = SubscriptionHandle::new(move || {
            task.abort();
            tracing::debug!("order subscription released");
        });
        Ok(Subscription::new(rx, handle))
    }

    /// Persist a draft as one order per supplier.
    ///
    /// Groups are written one after another and independently. Each group
    /// that is persisted leaves the draft immediately, so retrying after a
    /// partial failure only resubmits what failed. Nothing is rolled back.
    pub async fn submit_draft(
        &self,
        draft: &mut OrderDraft,
        now: DateTime<Utc>,
        created_by: &str,
        notes: Option<String>,
    ) -> Result<Vec<Order>, SubmitError> {
        if draft.is_empty() {
            return Err(SubmitError::EmptyDraft);
        }

        let mut created = Vec::new();
        let mut failures = Vec::new();
        for new_order in draft.split_by_supplier(now, created_by) {
            let supplier = new_order.supplier;
            let new_order = NewOrder {
                notes: notes.clone(),
                ..new_order
            };
            match self.create(new_order).await {
                Ok(order) => {
                    draft.remove_supplier(&supplier);
                    created.push(order);
                }
                Err(error) => {
                    tracing::warn!(%supplier, error = %error, "order for supplier not created");
                    failures.push(SubmitFailure { supplier, error });
                }
            }
        }

        if failures.is_empty() {
            draft.clear();
            Ok(created)
        } else {
            Err(SubmitError::Partial { created, failures })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use serde_json::{Map, Value as JsonValue};

    use comanda_catalog::{Article, NewArticle};
    use comanda_core::{ArticleId, FamilyId, SupplierId, UnitId};
    use crate::document_store::{ChangeNotice, Document, InMemoryDocumentStore, StoreError};

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 15, hour, 0, 0).unwrap()
    }

    fn article(name: &str, supplier: SupplierId) -> Article {
        NewArticle::new(name, UnitId::new(), FamilyId::new(), supplier).into_article(ArticleId::new())
    }

    /// Rejects order inserts for one supplier; everything else is delegated.
    struct RejectSupplier {
        inner: InMemoryDocumentStore,
        supplier: SupplierId,
    }

    #[async_trait]
    impl DocumentStore for RejectSupplier {
        async fn insert(&self, collection: Collection, id: &str, data: JsonValue) -> Result<Document, StoreError> {
            if collection == Collection::Orders && data["supplier"] == self.supplier.to_string() {
                return Err(StoreError::Backend("unavailable".into()));
            }
            self.inner.insert(collection, id, data).await
        }

        async fn get(&self, collection: Collection, id: &str) -> Result<Option<Document>, StoreError> {
            self.inner.get(collection, id).await
        }

        async fn list(&self, collection: Collection, query: &Query) -> Result<Vec<Document>, StoreError> {
            self.inner.list(collection, query).await
        }

        async fn update(
            &self,
            collection: Collection,
            id: &str,
            patch: Map<String, JsonValue>,
        ) -> Result<Document, StoreError> {
            self.inner.update(collection, id, patch).await
        }

        async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
            self.inner.delete(collection, id).await
        }

        async fn watch(&self, collection: Collection) -> Result<Subscription<ChangeNotice>, StoreError> {
            self.inner.watch(collection).await
        }
    }

    #[tokio::test]
    async fn draft_with_two_suppliers_becomes_two_orders() {
        let repo = OrderRepository::new(Arc::new(InMemoryDocumentStore::new()));
        let (s1, s2) = (SupplierId::new(), SupplierId::new());
        let tomate = article("Tomates", s1);
        let mut draft = OrderDraft::new();
        draft.add_item(&tomate, 2.0);
        draft.add_item(&article("Leche", s2), 6.0);
        draft.add_item(&tomate, 1.5);

        let created = repo.submit_draft(&mut draft, at(8), "Marta", None).await.unwrap();

        assert_eq!(created.len(), 2);
        assert!(draft.is_empty());
        let first = created.iter().find(|o| o.supplier == s1).unwrap();
        assert_eq!(first.lines.len(), 1);
        assert_eq!(first.lines[0].quantity, 3.5);
        assert_eq!(first.created_by, "Marta");
        assert_eq!(repo.list().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn partial_failure_keeps_only_failed_groups_in_draft() {
        let (ok, failing) = (SupplierId::new(), SupplierId::new());
        let store = RejectSupplier {
            inner: InMemoryDocumentStore::new(),
            supplier: failing,
        };
        let repo = OrderRepository::new(Arc::new(store));
        let mut draft = OrderDraft::new();
        draft.add_item(&article("Pollo", ok), 1.0);
        draft.add_item(&article("Queso", failing), 2.0);

        let err = repo.submit_draft(&mut draft, at(8), "Marta", None).await.unwrap_err();

        match err {
            SubmitError::Partial { created, failures } => {
                assert_eq!(created.len(), 1);
                assert_eq!(created[0].supplier, ok);
                assert_eq!(failures.len(), 1);
                assert_eq!(failures[0].supplier, failing);
            }
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(draft.suppliers(), vec![failing]);
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn empty_draft_is_rejected() {
        let repo = OrderRepository::new(Arc::new(InMemoryDocumentStore::new()));
        let mut draft = OrderDraft::new();
        assert_eq!(
            repo.submit_draft(&mut draft, at(8), "Marta", None).await,
            Err(SubmitError::EmptyDraft)
        );
    }

    #[tokio::test]
    async fn status_update_stamps_sent_once_and_persists() {
        let repo = OrderRepository::new(Arc::new(InMemoryDocumentStore::new()));
        let mut draft = OrderDraft::new();
        draft.add_item(&article("Sal", SupplierId::new()), 1.0);
        let order = repo.submit_draft(&mut draft, at(8), "Marta", None).await.unwrap().remove(0);

        repo.update_status(&order.id, OrderStatus::Sent, at(9)).await.unwrap();
        repo.update_status(&order.id, OrderStatus::Pending, at(10)).await.unwrap();
        repo.update_status(&order.id, OrderStatus::Sent, at(11)).await.unwrap();

        let stored = repo.get(&order.id).await.unwrap();
        assert_eq!(stored.status, OrderStatus::Sent);
        assert_eq!(stored.sent_at, Some(at(9)));
    }

    #[tokio::test]
    async fn list_is_newest_first_and_delete_removes() {
        let repo = OrderRepository::new(Arc::new(InMemoryDocumentStore::new()));
        for hour in [8, 12, 10] {
            let mut draft = OrderDraft::new();
            draft.add_item(&article("Sal", SupplierId::new()), 1.0);
            repo.submit_draft(&mut draft, at(hour), "Marta", None).await.unwrap();
        }

        let orders = repo.list().await.unwrap();
        let dates: Vec<DateTime<Utc>> = orders.iter().map(|o| o.date).collect();
        assert_eq!(dates, vec![at(12), at(10), at(8)]);

        repo.delete(&orders[0].id).await.unwrap();
        assert!(matches!(
            repo.get(&orders[0].id).await,
            Err(RepositoryError::NotFound { kind: ReferenceKind::Order, .. })
        ));
        assert!(repo.delete(&orders[0].id).await.is_err());
    }

    #[tokio::test]
    async fn subscription_pushes_snapshots_and_releases_feed_once() {
        let store = Arc::new(InMemoryDocumentStore::new());
        let repo = OrderRepository::new(store.clone());

        let mut sub = repo.subscribe().await.unwrap();
        assert!(sub.recv().await.unwrap().is_empty());
        assert_eq!(store.watcher_count(Collection::Orders), 1);

        let mut draft = OrderDraft::new();
        draft.add_item(&article("Sal", SupplierId::new()), 1.0);
        repo.submit_draft(&mut draft, at(8), "Marta", None).await.unwrap();

        let snapshot = sub.recv().await.unwrap();
        assert_eq!(snapshot.len(), 1);

        let handle = sub.handle();
        assert!(sub.cancel());
        assert!(!handle.cancel());

        for _ in 0..50 {
            if store.watcher_count(Collection::Orders) == 0 {
                break;
            }
            tokio::task::yield_now().await;
        }
        assert_eq!(store.watcher_count(Collection::Orders), 0);
    }
}
