use std::sync::Arc;

use serde_json::Value as JsonValue;

use comanda_catalog::{
    Article, ArticleUpdate, CascadeOutcome, Catalog, Family, FamilyUpdate, NewArticle, NewFamily,
    NewSupplier, NewUnit, ParentRef, Supplier, SupplierUpdate, Unit, UnitUpdate,
};
use comanda_core::{
    ArticleId, DomainError, FamilyId, ReferenceKind, SupplierId, UnitId,
};

use crate::document_store::{Collection, Direction, Document, DocumentStore, OrderBy, Query, StoreError};
use crate::documents::{self, fields};

use super::RepositoryError;

type FromDoc<T> = fn(&Document) -> Result<T, StoreError>;

/// Families, suppliers, units and articles.
///
/// Listings come back sorted by name. Article writes validate that every
/// reference exists; parent deletes cascade to the referencing articles.
#[derive(Clone)]
pub struct CatalogRepository {
    store: Arc<dyn DocumentStore>,
}

impl CatalogRepository {
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self { store }
    }

    async fn list_by_name<T>(&self, collection: Collection, query: Query, from_doc: FromDoc<T>) -> Result<Vec<T>, RepositoryError> {
        let query = query.order_by(OrderBy::text(fields::NAME, Direction::Asc));
        let docs = self.store.list(collection, &query).await?;
        Ok(docs.iter().map(from_doc).collect::<Result<_, _>>()?)
    }

    async fn fetch<T>(
        &self,
        collection: Collection,
        kind: ReferenceKind,
        id: &str,
        from_doc: FromDoc<T>,
    ) -> Result<T, RepositoryError> {
        match self.store.get(collection, id).await? {
            Some(doc) => Ok(from_doc(&doc)?),
            None => Err(RepositoryError::not_found(kind, id)),
        }
    }

    async fn write_back(&self, collection: Collection, id: &str, body: JsonValue) -> Result<(), RepositoryError> {
        let patch = documents::patch(&body)?;
        self.store.update(collection, id, patch).await?;
        Ok(())
    }

    /// Snapshot of all four collections.
    pub async fn load(&self) -> Result<Catalog, RepositoryError> {
        Ok(Catalog::new(
            self.list_families().await?,
            self.list_suppliers().await?,
            self.list_units().await?,
            self.list_articles().await?,
        ))
    }

    pub async fn list_families(&self) -> Result<Vec<Family>, RepositoryError> {
        self.list_by_name(Collection::Families, Query::all(), documents::family_from_doc)
            .await
    }

    pub async fn list_suppliers(&self) -> Result<Vec<Supplier>, RepositoryError> {
        self.list_by_name(Collection::Suppliers, Query::all(), documents::supplier_from_doc)
            .await
    }

    pub async fn list_units(&self) -> Result<Vec<Unit>, RepositoryError> {
        self.list_by_name(Collection::Units, Query::all(), documents::unit_from_doc)
            .await
    }

    pub async fn list_articles(&self) -> Result<Vec<Article>, RepositoryError> {
        self.list_by_name(Collection::Articles, Query::all(), documents::article_from_doc)
            .await
    }

    pub async fn list_active_articles(&self) -> Result<Vec<Article>, RepositoryError> {
        let query = Query::all().where_eq(fields::ACTIVE, true);
        self.list_by_name(Collection::Articles, query, documents::article_from_doc)
            .await
    }

    pub async fn family(&self, id: &FamilyId) -> Result<Family, RepositoryError> {
        self.fetch(Collection::Families, ReferenceKind::Family, &id.to_string(), documents::family_from_doc)
            .await
    }

    pub async fn supplier(&self, id: &SupplierId) -> Result<Supplier, RepositoryError> {
        self.fetch(Collection::Suppliers, ReferenceKind::Supplier, &id.to_string(), documents::supplier_from_doc)
            .await
    }

    pub async fn unit(&self, id: &UnitId) -> Result<Unit, RepositoryError> {
        self.fetch(Collection::Units, ReferenceKind::Unit, &id.to_string(), documents::unit_from_doc)
            .await
    }

    pub async fn article(&self, id: &ArticleId) -> Result<Article, RepositoryError> {
        self.fetch(Collection::Articles, ReferenceKind::Article, &id.to_string(), documents::article_from_doc)
            .await
    }

    pub async fn create_family(&self, new: NewFamily) -> Result<Family, RepositoryError> {
        let family = new.validate()?.into_family(FamilyId::new());
        self.store
            .insert(Collection::Families, &family.id.to_string(), documents::family_to_body(&family)?)
            .await?;
        tracing::info!(family_id = %family.id, name = %family.name, "family created");
        Ok(family)
    }

    pub async fn update_family(&self, id: &FamilyId, update: FamilyUpdate) -> Result<Family, RepositoryError> {
        let mut family = self.family(id).await?;
        update.apply_to(&mut family)?;
        self.write_back(Collection::Families, &id.to_string(), documents::family_to_body(&family)?)
            .await?;
        tracing::info!(family_id = %id, "family updated");
        Ok(family)
    }

    pub async fn delete_family(&self, id: &FamilyId) -> Result<CascadeOutcome, RepositoryError> {
        self.delete_parent(ParentRef::Family(*id)).await
    }

    pub async fn create_supplier(&self, new: NewSupplier) -> Result<Supplier, RepositoryError> {
        let supplier = new.validate()?.into_supplier(SupplierId::new());
        self.store
            .insert(Collection::Suppliers, &supplier.id.to_string(), documents::supplier_to_body(&supplier)?)
            .await?;
        tracing::info!(supplier_id = %supplier.id, name = %supplier.name, "supplier created");
        Ok(supplier)
    }

    pub async fn update_supplier(&self, id: &SupplierId, update: SupplierUpdate) -> Result<Supplier, RepositoryError> {
        let mut supplier = self.supplier(id).await?;
        update.apply_to(&mut supplier)?;
        self.write_back(Collection::Suppliers, &id.to_string(), documents::supplier_to_body(&supplier)?)
            .await?;
        tracing::info!(supplier_id = %id, "supplier updated");
        Ok(supplier)
    }

    pub async fn delete_supplier(&self, id: &SupplierId) -> Result<CascadeOutcome, RepositoryError> {
        self.delete_parent(ParentRef::Supplier(*id)).await
    }

    pub async fn create_unit(&self, new: NewUnit) -> Result<Unit, RepositoryError> {
        let unit = new.validate()?.into_unit(UnitId::new());
        self.store
            .insert(Collection::Units, &unit.id.to_string(), documents::unit_to_body(&unit)?)
            .await?;
        tracing::info!(unit_id = %unit.id, name = %unit.name, "unit created");
        Ok(unit)
    }

    pub async fn update_unit(&self, id: &UnitId, update: UnitUpdate) -> Result<Unit, RepositoryError> {
        let mut unit = self.unit(id).await?;
        update.apply_to(&mut unit)?;
        self.write_back(Collection::Units, &id.to_string(), documents::unit_to_body(&unit)?)
            .await?;
        tracing::info!(unit_id = %id, "unit updated");
        Ok(unit)
    }

    pub async fn delete_unit(&self, id: &UnitId) -> Result<CascadeOutcome, RepositoryError> {
        self.delete_parent(ParentRef::Unit(*id)).await
    }

    /// Reject dangling family/supplier/unit references.
    async fn ensure_article_refs(&self, article: &Article) -> Result<(), RepositoryError> {
        let checks = [
            (Collection::Families, ReferenceKind::Family, article.family.to_string()),
            (Collection::Suppliers, ReferenceKind::Supplier, article.supplier.to_string()),
            (Collection::Units, ReferenceKind::Unit, article.unit.to_string()),
        ];
        for (collection, kind, id) in checks {
            if self.store.get(collection, &id).await?.is_none() {
                tracing::warn!(article = %article.name, %kind, %id, "article references a missing record");
                return Err(DomainError::missing(kind, id).into());
            }
        }
        Ok(())
    }

    pub async fn create_article(&self, new: NewArticle) -> Result<Article, RepositoryError> {
        let article = new.validate()?.into_article(ArticleId::new());
        self.ensure_article_refs(&article).await?;
        self.store
            .insert(Collection::Articles, &article.id.to_string(), documents::article_to_body(&article)?)
            .await?;
        tracing::info!(article_id = %article.id, name = %article.name, "article created");
        Ok(article)
    }

    pub async fn update_article(&self, id: &ArticleId, update: ArticleUpdate) -> Result<Article, RepositoryError> {
        let current = self.article(id).await?;
        let next = update.applied(&current)?;
        self.ensure_article_refs(&next).await?;
        self.write_back(Collection::Articles, &id.to_string(), documents::article_to_body(&next)?)
            .await?;
        tracing::info!(article_id = %id, "article updated");
        Ok(next)
    }

    pub async fn delete_article(&self, id: &ArticleId) -> Result<(), RepositoryError> {
        if !self.store.delete(Collection::Articles, &id.to_string()).await? {
            return Err(RepositoryError::not_found(ReferenceKind::Article, id));
        }
        tracing::info!(article_id = %id, "article deleted");
        Ok(())
    }

    /// Delete the parent, then every article referencing it, one at a time.
    ///
    /// Not atomic: a failure part-way leaves the remaining articles orphaned.
    async fn delete_parent(&self, parent: ParentRef) -> Result<CascadeOutcome, RepositoryError> {
        let (collection, field, id) = match parent {
            ParentRef::Family(id) => (Collection::Families, fields::FAMILY, id.to_string()),
            ParentRef::Supplier(id) => (Collection::Suppliers, fields::SUPPLIER, id.to_string()),
            ParentRef::Unit(id) => (Collection::Units, fields::UNIT, id.to_string()),
        };

        if !self.store.delete(collection, &id).await? {
            return Err(RepositoryError::not_found(parent.kind(), id));
        }

        let dependents = self
            .store
            .list(Collection::Articles, &Query::all().where_eq(field, id.clone()))
            .await?;

        let mut removed_articles = Vec::with_capacity(dependents.len());
        for doc in &dependents {
            if let Err(e) = self.store.delete(Collection::Articles, &doc.id).await {
                tracing::error!(%parent, article = %doc.id, error = %e, "cascade delete stopped part-way");
                return Err(e.into());
            }
            removed_articles.push(documents::article_from_doc(doc)?.id);
        }

        tracing::info!(%parent, removed = removed_articles.len(), "deleted with dependent articles");
        Ok(CascadeOutcome {
            parent,
            removed_articles,
        })
    }
}
