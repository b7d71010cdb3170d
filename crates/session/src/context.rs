//! Shared application state.
//!
//! Built once at startup and handed to every consumer; clones share state.
//! Each operation catches its own failure: the message lands in the error
//! slot, is logged, and the local state is left as it was. The error is also
//! returned so callers that care (the HTTP layer) can map it.

use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;

use comanda_auth::{authorize, authorize_order_read, Permission, Principal};
use comanda_catalog::{
    Article, ArticleUpdate, CascadeOutcome, Catalog, Family, FamilyUpdate, NewArticle, NewFamily,
    NewSupplier, NewUnit, ParentRef, Supplier, SupplierUpdate, Unit, UnitUpdate,
};
use comanda_core::{ArticleId, DomainError, FamilyId, OrderId, ReferenceKind, SupplierId, UnitId};
use comanda_events::Subscription;
use comanda_infra::{CatalogRepository, DocumentStore, OrderRepository, SubmitError};
use comanda_ordering::{Order, OrderDraft, OrderListQuery, OrderStatus};

use crate::error::ContextError;

#[derive(Debug, Default)]
struct State {
    catalog: Catalog,
    orders: Vec<Order>,
    last_error: Option<String>,
}

struct Inner {
    catalog_repo: CatalogRepository,
    order_repo: OrderRepository,
    state: RwLock<State>,
}

#[derive(Clone)]
pub struct AppContext {
    inner: Arc<Inner>,
}

impl AppContext {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            inner: Arc::new(Inner {
                catalog_repo: CatalogRepository::new(store.clone()),
                order_repo: OrderRepository::new(store),
                state: RwLock::new(State::default()),
            }),
        }
    }

    pub fn catalog_repository(&self) -> &CatalogRepository {
        &self.inner.catalog_repo
    }

    fn read(&self) -> RwLockReadGuard<'_, State> {
        self.inner.state.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, State> {
        self.inner.state.write().unwrap_or_else(|p| p.into_inner())
    }

    /// Local catalog snapshot.
    pub fn catalog(&self) -> Catalog {
        self.read().catalog.clone()
    }

    /// Local order list, newest first.
    pub fn orders(&self) -> Vec<Order> {
        self.read().orders.clone()
    }

    /// Message of the most recent failed operation.
    pub fn last_error(&self) -> Option<String> {
        self.read().last_error.clone()
    }

    pub fn clear_error(&self) {
        self.write().last_error = None;
    }

    /// Wholesale replacement, as delivered by the live subscription.
    pub fn replace_orders(&self, orders: Vec<Order>) {
        self.write().orders = orders;
    }

    fn record<T, E>(&self, operation: &'static str, result: Result<T, E>) -> Result<T, ContextError>
    where
        E: Into<ContextError>,
    {
        result.map_err(|e| {
            let err: ContextError = e.into();
            tracing::error!(operation, error = %err, "operation failed");
            self.write().last_error = Some(format!("{operation}: {err}"));
            err
        })
    }

    fn permit(&self, operation: &'static str, who: &Principal, permission: Permission) -> Result<(), ContextError> {
        self.record(operation, authorize(who, &permission))
    }

    fn update_catalog(&self, apply: impl FnOnce(&mut Catalog)) {
        apply(&mut self.write().catalog);
    }

    pub async fn refresh_catalog(&self) -> Result<(), ContextError> {
        let catalog = self.record("load catalog", self.inner.catalog_repo.load().await)?;
        self.write().catalog = catalog;
        Ok(())
    }

    pub async fn refresh_orders(&self) -> Result<(), ContextError> {
        let orders = self.record("load orders", self.inner.order_repo.list().await)?;
        self.replace_orders(orders);
        Ok(())
    }

    // ── Catalog management (purchasing lead) ──────────────────────────────

    pub async fn create_family(&self, who: &Principal, new: NewFamily) -> Result<Family, ContextError> {
        self.permit("create family", who, Permission::CATALOG_WRITE)?;
        let family = self.record("create family", self.inner.catalog_repo.create_family(new).await)?;
        self.update_catalog(|c| c.upsert_family(family.clone()));
        Ok(family)
    }

    pub async fn update_family(
        &self,
        who: &Principal,
        id: &FamilyId,
        update: FamilyUpdate,
    ) -> Result<Family, ContextError> {
        self.permit("update family", who, Permission::CATALOG_WRITE)?;
        let family = self.record("update family", self.inner.catalog_repo.update_family(id, update).await)?;
        self.update_catalog(|c| c.upsert_family(family.clone()));
        Ok(family)
    }

    pub async fn delete_family(&self, who: &Principal, id: &FamilyId) -> Result<CascadeOutcome, ContextError> {
        self.permit("delete family", who, Permission::CATALOG_WRITE)?;
        let outcome = self.record("delete family", self.inner.catalog_repo.delete_family(id).await)?;
        self.update_catalog(|c| {
            c.remove_parent(ParentRef::Family(*id));
        });
        Ok(outcome)
    }

    pub async fn create_supplier(&self, who: &Principal, new: NewSupplier) -> Result<Supplier, ContextError> {
        self.permit("create supplier", who, Permission::CATALOG_WRITE)?;
        let supplier = self.record("create supplier", self.inner.catalog_repo.create_supplier(new).await)?;
        self.update_catalog(|c| c.upsert_supplier(supplier.clone()));
        Ok(supplier)
    }

    pub async fn update_supplier(
        &self,
        who: &Principal,
        id: &SupplierId,
        update: SupplierUpdate,
    ) -> Result<Supplier, ContextError> {
        self.permit("update supplier", who, Permission::CATALOG_WRITE)?;
        let supplier = self.record(
            "update supplier",
            self.inner.catalog_repo.update_supplier(id, update).await,
        )?;
        self.update_catalog(|c| c.upsert_supplier(supplier.clone()));
        Ok(supplier)
    }

    pub async fn delete_supplier(&self, who: &Principal, id: &SupplierId) -> Result<CascadeOutcome, ContextError> {
        self.permit("delete supplier", who, Permission::CATALOG_WRITE)?;
        let outcome = self.record("delete supplier", self.inner.catalog_repo.delete_supplier(id).await)?;
        self.update_catalog(|c| {
            c.remove_parent(ParentRef::Supplier(*id));
        });
        Ok(outcome)
    }

    pub async fn create_unit(&self, who: &Principal, new: NewUnit) -> Result<Unit, ContextError> {
        self.permit("create unit", who, Permission::CATALOG_WRITE)?;
        let unit = self.record("create unit", self.inner.catalog_repo.create_unit(new).await)?;
        self.update_catalog(|c| c.upsert_unit(unit.clone()));
        Ok(unit)
    }

    pub async fn update_unit(&self, who: &Principal, id: &UnitId, update: UnitUpdate) -> Result<Unit, ContextError> {
        self.permit("update unit", who, Permission::CATALOG_WRITE)?;
        let unit = self.record("update unit", self.inner.catalog_repo.update_unit(id, update).await)?;
        self.update_catalog(|c| c.upsert_unit(unit.clone()));
        Ok(unit)
    }

    pub async fn delete_unit(&self, who: &Principal, id: &UnitId) -> Result<CascadeOutcome, ContextError> {
        self.permit("delete unit", who, Permission::CATALOG_WRITE)?;
        let outcome = self.record("delete unit", self.inner.catalog_repo.delete_unit(id).await)?;
        self.update_catalog(|c| {
            c.remove_parent(ParentRef::Unit(*id));
        });
        Ok(outcome)
    }

    pub async fn create_article(&self, who: &Principal, new: NewArticle) -> Result<Article, ContextError> {
        self.permit("create article", who, Permission::CATALOG_WRITE)?;
        let article = self.record("create article", self.inner.catalog_repo.create_article(new).await)?;
        self.update_catalog(|c| c.upsert_article(article.clone()));
        Ok(article)
    }

    pub async fn update_article(
        &self,
        who: &Principal,
        id: &ArticleId,
        update: ArticleUpdate,
    ) -> Result<Article, ContextError> {
        self.permit("update article", who, Permission::CATALOG_WRITE)?;
        let article = self.record(
            "update article",
            self.inner.catalog_repo.update_article(id, update).await,
        )?;
        self.update_catalog(|c| c.upsert_article(article.clone()));
        Ok(article)
    }

    pub async fn delete_article(&self, who: &Principal, id: &ArticleId) -> Result<(), ContextError> {
        self.permit("delete article", who, Permission::CATALOG_WRITE)?;
        self.record("delete article", self.inner.catalog_repo.delete_article(id).await)?;
        self.update_catalog(|c| {
            c.remove_article(id);
        });
        Ok(())
    }

    // ── Orders ────────────────────────────────────────────────────────────

    /// Build a draft from `(article, quantity)` pairs against the local
    /// catalog. Unknown or inactive articles and non-positive quantities are
    /// rejected; repeated articles are summed.
    pub fn draft_from_lines(&self, lines: &[(ArticleId, f64)]) -> Result<OrderDraft, ContextError> {
        let state = self.read();
        let mut draft = OrderDraft::new();
        for (article_id, quantity) in lines {
            let article = state
                .catalog
                .article(article_id)
                .ok_or_else(|| DomainError::missing(ReferenceKind::Article, article_id));
            let article = match article {
                Ok(a) if a.active => a,
                Ok(a) => {
                    return Err(DomainError::validation(format!("article '{}' is inactive", a.name)).into());
                }
                Err(e) => return Err(e.into()),
            };
            if !draft.add_item(article, *quantity) {
                return Err(DomainError::validation(format!(
                    "quantity for '{}' must be positive (got {quantity})",
                    article.name
                ))
                .into());
            }
        }
        Ok(draft)
    }

    /// Submit the draft as one order per supplier, recorded as created by
    /// `who`. See [`OrderRepository::submit_draft`] for partial failures.
    pub async fn submit_draft(
        &self,
        who: &Principal,
        draft: &mut OrderDraft,
        notes: Option<String>,
    ) -> Result<Vec<Order>, ContextError> {
        self.permit("submit order", who, Permission::ORDERS_CREATE)?;
        let result = self
            .inner
            .order_repo
            .submit_draft(draft, Utc::now(), &who.name, notes)
            .await;

        let created: &[Order] = match &result {
            Ok(created) => created.as_slice(),
            Err(SubmitError::Partial { created, .. }) => created.as_slice(),
            Err(_) => &[],
        };
        if !created.is_empty() {
            self.merge_local_orders(created);
        }

        self.record("submit order", result)
    }

    /// Orders `who` may see, filtered and sorted by `query`.
    pub fn visible_orders(&self, who: &Principal, query: &OrderListQuery) -> Vec<Order> {
        let state = self.read();
        let visible: Vec<Order> = state
            .orders
            .iter()
            .filter(|o| authorize_order_read(who, &o.created_by).is_ok())
            .cloned()
            .collect();
        query.apply(&visible, &state.catalog)
    }

    pub async fn order(&self, who: &Principal, id: &OrderId) -> Result<Order, ContextError> {
        let order = self.record("load order", self.inner.order_repo.get(id).await)?;
        self.record("load order", authorize_order_read(who, &order.created_by))?;
        Ok(order)
    }

    pub async fn update_order_status(
        &self,
        who: &Principal,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, ContextError> {
        self.permit("update order status", who, Permission::ORDERS_UPDATE_STATUS)?;
        let order = self.record(
            "update order status",
            self.inner.order_repo.update_status(id, status, Utc::now()).await,
        )?;
        self.replace_local_order(&order);
        Ok(order)
    }

    /// Owner or purchasing lead.
    pub async fn update_order_notes(
        &self,
        who: &Principal,
        id: &OrderId,
        notes: Option<String>,
    ) -> Result<Order, ContextError> {
        self.order(who, id).await?;
        let order = self.record(
            "update order notes",
            self.inner.order_repo.update_notes(id, notes).await,
        )?;
        self.replace_local_order(&order);
        Ok(order)
    }

    pub async fn delete_order(&self, who: &Principal, id: &OrderId) -> Result<(), ContextError> {
        self.permit("delete order", who, Permission::ORDERS_DELETE)?;
        self.record("delete order", self.inner.order_repo.delete(id).await)?;
        self.write().orders.retain(|o| o.id != *id);
        Ok(())
    }

    /// Upsert by id: the live feed may already have delivered these orders.
    fn merge_local_orders(&self, orders: &[Order]) {
        let mut state = self.write();
        for order in orders {
            match state.orders.iter_mut().find(|o| o.id == order.id) {
                Some(slot) => *slot = order.clone(),
                None => state.orders.push(order.clone()),
            }
        }
        state.orders.sort_by(|a, b| b.date.cmp(&a.date));
    }

    fn replace_local_order(&self, order: &Order) {
        let mut state = self.write();
        if let Some(slot) = state.orders.iter_mut().find(|o| o.id == order.id) {
            *slot = order.clone();
        }
    }

    /// Open the live order feed (full snapshots, newest first).
    pub async fn subscribe_orders(&self) -> Result<Subscription<Vec<Order>>, ContextError> {
        self.record("subscribe to orders", self.inner.order_repo.subscribe().await)
    }
}
