//! The live orders view.
//!
//! Mounting opens the order subscription and mirrors every snapshot into
//! the [`AppContext`]. Unmounting (or dropping the view) releases it. The
//! release runs exactly once whichever happens first.

use chrono::NaiveDate;
use tokio::task::JoinHandle;

use comanda_auth::{resolve_view, Principal, View};
use comanda_events::SubscriptionHandle;
use comanda_ordering::{Order, OrderListQuery, OrderStatus, SortKey};

use crate::context::AppContext;
use crate::error::ContextError;

struct Mounted {
    handle: SubscriptionHandle,
    pump: JoinHandle<()>,
}

pub struct OrdersView {
    ctx: AppContext,
    principal: Principal,
    query: OrderListQuery,
    mounted: Option<Mounted>,
}

impl OrdersView {
    /// Fails with `Forbidden` when the role may not open the orders view.
    pub fn new(ctx: AppContext, principal: Principal) -> Result<Self, ContextError> {
        resolve_view(principal.role, View::Orders)?;
        Ok(Self {
            ctx,
            principal,
            query: OrderListQuery::default(),
            mounted: None,
        })
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.is_some()
    }

    /// Open the live feed. Mounting twice keeps the first subscription.
    pub async fn mount(&mut self) -> Result<(), ContextError> {
        if self.mounted.is_some() {
            return Ok(());
        }

        let mut subscription = self.ctx.subscribe_orders().await?;
        let handle = subscription.handle();
        let ctx = self.ctx.clone();
        let pump = tokio::spawn(async move {
            while let Some(snapshot) = subscription.recv().await {
                ctx.replace_orders(snapshot);
            }
        });

        tracing::debug!(name = %self.principal.name, "orders view mounted");
        self.mounted = Some(Mounted { handle, pump });
        Ok(())
    }

    /// Release the feed. Returns `true` only if this call performed the
    /// release.
    pub fn unmount(&mut self) -> bool {
        let Some(mounted) = self.mounted.take() else {
            return false;
        };
        let released = mounted.handle.cancel();
        mounted.pump.abort();
        tracing::debug!(name = %self.principal.name, released, "orders view unmounted");
        released
    }

    pub fn query(&self) -> &OrderListQuery {
        &self.query
    }

    pub fn set_date_range(&mut self, from: Option<NaiveDate>, to: Option<NaiveDate>) {
        self.query.filter.date_from = from;
        self.query.filter.date_to = to;
    }

    pub fn set_status_filter(&mut self, status: Option<OrderStatus>) {
        self.query.filter.status = status;
    }

    /// Selecting the active key flips direction; a new key starts descending.
    pub fn sort_by(&mut self, key: SortKey) {
        if self.query.sort_key == key {
            self.query.direction = self.query.direction.toggled();
        } else {
            self.query.sort_key = key;
            self.query.direction = Default::default();
        }
    }

    pub fn reset(&mut self) {
        self.query.reset();
    }

    /// Current rows: the principal's visible orders under the view's query.
    pub fn rows(&self) -> Vec<Order> {
        self.ctx.visible_orders(&self.principal, &self.query)
    }
}

impl Drop for OrdersView {
    fn drop(&mut self) {
        self.unmount();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use super::*;
    use comanda_auth::{AuthzError, Role};
    use comanda_core::ArticleId;
    use comanda_events::Subscription;
    use comanda_infra::{
        seed_demo_catalog, ChangeNotice, Collection, Document, DocumentStore, InMemoryDocumentStore, Query,
        StoreError,
    };
    use comanda_ordering::SortDirection;
    use serde_json::{Map, Value as JsonValue};

    async fn seeded() -> (AppContext, Arc<InMemoryDocumentStore>) {
        let store = Arc::new(InMemoryDocumentStore::new());
        let ctx = AppContext::new(store.clone());
        seed_demo_catalog(ctx.catalog_repository()).await.unwrap();
        ctx.refresh_catalog().await.unwrap();
        (ctx, store)
    }

    fn article(ctx: &AppContext, name: &str) -> ArticleId {
        ctx.catalog()
            .articles()
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.id)
            .unwrap()
    }

    async fn eventually(mut check: impl FnMut() -> bool) -> bool {
        for _ in 0..100 {
            if check() {
                return true;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        check()
    }

    #[tokio::test]
    async fn mounted_view_follows_remote_changes() {
        let (ctx, store) = seeded().await;
        let lead = Principal::new("Jefe", Role::PurchasingLead);
        let mut view = OrdersView::new(ctx.clone(), lead).unwrap();
        view.mount().await.unwrap();
        assert_eq!(store.watcher_count(Collection::Orders), 1);

        // A write that bypasses the context still reaches the view.
        let other = AppContext::new(store.clone());
        other.refresh_catalog().await.unwrap();
        let cook = Principal::new("Marta", Role::Cook);
        let mut draft = other.draft_from_lines(&[(article(&other, "Queso"), 1.0)]).unwrap();
        other.submit_draft(&cook, &mut draft, None).await.unwrap();

        assert!(eventually(|| view.rows().len() == 1).await);
    }

    #[tokio::test]
    async fn release_happens_exactly_once() {
        let (ctx, store) = seeded().await;
        let mut view = OrdersView::new(ctx, Principal::new("Jefe", Role::PurchasingLead)).unwrap();
        view.mount().await.unwrap();

        assert!(view.unmount());
        assert!(!view.unmount());
        drop(view);

        assert!(eventually(|| store.watcher_count(Collection::Orders) == 0).await);
    }

    #[tokio::test]
    async fn dropping_a_mounted_view_releases_the_feed() {
        let (ctx, store) = seeded().await;
        let mut view = OrdersView::new(ctx, Principal::new("Jefe", Role::PurchasingLead)).unwrap();
        view.mount().await.unwrap();
        view.mount().await.unwrap();
        assert_eq!(store.watcher_count(Collection::Orders), 1);

        drop(view);

        assert!(eventually(|| store.watcher_count(Collection::Orders) == 0).await);
    }

    /// Acknowledges order inserts only after the change notice is out.
    struct LateAckStore {
        inner: Arc<InMemoryDocumentStore>,
    }

    #[async_trait::async_trait]
    impl DocumentStore for LateAckStore {
        async fn insert(&self, collection: Collection, id: &str, data: JsonValue) -> Result<Document, StoreError> {
            let doc = self.inner.insert(collection, id, data).await?;
            if collection == Collection::Orders {
                tokio::time::sleep(Duration::from_millis(100)).await;
            }
            Ok(doc)
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
    async fn pushed_order_is_not_duplicated_when_submit_returns_late() {
        let (seeder, store) = seeded().await;
        drop(seeder);
        let ctx = AppContext::new(Arc::new(LateAckStore { inner: store.clone() }));
        ctx.refresh_catalog().await.unwrap();

        let mut view = OrdersView::new(ctx.clone(), Principal::new("Jefe", Role::PurchasingLead)).unwrap();
        view.mount().await.unwrap();

        let cook = Principal::new("Marta", Role::Cook);
        let mut draft = ctx.draft_from_lines(&[(article(&ctx, "Queso"), 1.0)]).unwrap();
        let created = ctx.submit_draft(&cook, &mut draft, None).await.unwrap();

        assert_eq!(created.len(), 1);
        let ids: Vec<_> = ctx.orders().iter().map(|o| o.id).collect();
        assert_eq!(ids, vec![created[0].id]);

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(view.rows().len(), 1);
    }

    #[tokio::test]
    async fn sort_toggles_and_reset_restores_default() {
        let (ctx, _store) = seeded().await;
        let mut view = OrdersView::new(ctx, Principal::new("Marta", Role::Cook)).unwrap();

        view.sort_by(SortKey::Date);
        assert_eq!(view.query().direction, SortDirection::Asc);
        view.sort_by(SortKey::Supplier);
        assert_eq!(view.query().sort_key, SortKey::Supplier);
        assert_eq!(view.query().direction, SortDirection::Desc);

        view.set_status_filter(Some(OrderStatus::Sent));
        view.reset();
        assert_eq!(*view.query(), OrderListQuery::default());
    }

    #[test]
    fn view_gate_uses_role_navigation() {
        // Every role may open orders; the gate is still consulted.
        assert!(resolve_view(Role::Cook, View::Orders).is_ok());
        assert!(matches!(
            resolve_view(Role::Cook, View::Units),
            Err(AuthzError::ViewForbidden { .. })
        ));
    }
}
