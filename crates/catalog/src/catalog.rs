//! In-memory catalog snapshot: the flat record collections plus lookups.

use comanda_core::{ArticleId, Entity, FamilyId, ReferenceKind, SupplierId, UnitId};

use crate::reference::{ParentRef, Reference};
use crate::{Article, Family, Supplier, Unit};

/// Snapshot of every catalog collection.
///
/// Collections keep the order they were loaded in (the store lists them by
/// name). Upserts replace in place or append.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Catalog {
    families: Vec<Family>,
    suppliers: Vec<Supplier>,
    units: Vec<Unit>,
    articles: Vec<Article>,
}

/// A family together with the articles filed under it.
#[derive(Debug, Clone, PartialEq)]
pub struct FamilyArticles<'a> {
    pub family: &'a Family,
    pub articles: Vec<&'a Article>,
}

/// Result of removing a parent record locally.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeOutcome {
    pub parent: ParentRef,
    pub removed_articles: Vec<ArticleId>,
}

/// An article field pointing at a record that does not exist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DanglingReference {
    pub article: ArticleId,
    pub kind: ReferenceKind,
    pub id: String,
}

impl Catalog {
    pub fn new(
        families: Vec<Family>,
        suppliers: Vec<Supplier>,
        units: Vec<Unit>,
        articles: Vec<Article>,
    ) -> Self {
        Self {
            families,
            suppliers,
            units,
            articles,
        }
    }

    pub fn families(&self) -> &[Family] {
        &self.families
    }

    pub fn suppliers(&self) -> &[Supplier] {
        &self.suppliers
    }

    pub fn units(&self) -> &[Unit] {
        &self.units
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn active_articles(&self) -> impl Iterator<Item = &Article> {
        self.articles.iter().filter(|a| a.active)
    }

    pub fn family(&self, id: &FamilyId) -> Option<&Family> {
        self.families.iter().find(|f| f.id == *id)
    }

    pub fn supplier(&self, id: &SupplierId) -> Option<&Supplier> {
        self.suppliers.iter().find(|s| s.id == *id)
    }

    pub fn unit(&self, id: &UnitId) -> Option<&Unit> {
        self.units.iter().find(|u| u.id == *id)
    }

    pub fn article(&self, id: &ArticleId) -> Option<&Article> {
        self.articles.iter().find(|a| a.id == *id)
    }

    pub fn resolve_family(&self, id: &FamilyId) -> Reference<'_, Family> {
        resolve(self.family(id), ReferenceKind::Family, id)
    }

    pub fn resolve_supplier(&self, id: &SupplierId) -> Reference<'_, Supplier> {
        resolve(self.supplier(id), ReferenceKind::Supplier, id)
    }

    pub fn resolve_unit(&self, id: &UnitId) -> Reference<'_, Unit> {
        resolve(self.unit(id), ReferenceKind::Unit, id)
    }

    /// Supplier display name; falls back to the raw id when the supplier is gone.
    pub fn supplier_name(&self, id: &SupplierId) -> String {
        self.resolve_supplier(id).display_name().into_owned()
    }

    pub fn unit_name(&self, id: &UnitId) -> String {
        self.resolve_unit(id).display_name().into_owned()
    }

    pub fn family_name(&self, id: &FamilyId) -> String {
        self.resolve_family(id).display_name().into_owned()
    }

    /// Articles grouped under their family, families in catalog order.
    ///
    /// With `only = Some(id)` just that family is returned (empty if unknown).
    /// Families without articles are kept so the caller can show them empty.
    pub fn articles_by_family(&self, only: Option<FamilyId>) -> Vec<FamilyArticles<'_>> {
        self.families
            .iter()
            .filter(|f| only.is_none_or(|id| f.id == id))
            .map(|family| FamilyArticles {
                family,
                articles: self
                    .articles
                    .iter()
                    .filter(|a| a.family == family.id)
                    .collect(),
            })
            .collect()
    }

    /// Ids of the articles a cascading delete of `parent` must remove.
    pub fn dependents_of(&self, parent: ParentRef) -> Vec<ArticleId> {
        self.articles
            .iter()
            .filter(|a| parent.is_referenced_by(a))
            .map(|a| a.id)
            .collect()
    }

    /// Every article reference that does not resolve.
    pub fn dangling_references(&self) -> Vec<DanglingReference> {
        let mut out = Vec::new();
        for article in &self.articles {
            if self.family(&article.family).is_none() {
                out.push(DanglingReference {
                    article: article.id,
                    kind: ReferenceKind::Family,
                    id: article.family.to_string(),
                });
            }
            if self.supplier(&article.supplier).is_none() {
                out.push(DanglingReference {
                    article: article.id,
                    kind: ReferenceKind::Supplier,
                    id: article.supplier.to_string(),
                });
            }
            if self.unit(&article.unit).is_none() {
                out.push(DanglingReference {
                    article: article.id,
                    kind: ReferenceKind::Unit,
                    id: article.unit.to_string(),
                });
            }
        }
        out
    }

    // -------------------------
    // Local mutation (mirrors successful remote writes)
    // -------------------------

    pub fn upsert_family(&mut self, family: Family) {
        upsert(&mut self.families, family);
    }

    pub fn upsert_supplier(&mut self, supplier: Supplier) {
        upsert(&mut self.suppliers, supplier);
    }

    pub fn upsert_unit(&mut self, unit: Unit) {
        upsert(&mut self.units, unit);
    }

    pub fn upsert_article(&mut self, article: Article) {
        upsert(&mut self.articles, article);
    }

    pub fn remove_article(&mut self, id: &ArticleId) -> bool {
        let before = self.articles.len();
        self.articles.retain(|a| a.id != *id);
        self.articles.len() != before
    }

    /// Remove a parent record and every article referencing it.
    ///
    /// Returns `None` if the parent did not exist; its (orphaned) articles are
    /// still removed in that case.
    pub fn remove_parent(&mut self, parent: ParentRef) -> Option<CascadeOutcome> {
        let existed = match parent {
            ParentRef::Family(id) => remove_by(&mut self.families, |f| f.id == id),
            ParentRef::Supplier(id) => remove_by(&mut self.suppliers, |s| s.id == id),
            ParentRef::Unit(id) => remove_by(&mut self.units, |u| u.id == id),
        };

        let removed_articles = self.dependents_of(parent);
        self.articles.retain(|a| !parent.is_referenced_by(a));

        existed.then_some(CascadeOutcome {
            parent,
            removed_articles,
        })
    }
}

fn resolve<'a, T, I: ToString>(found: Option<&'a T>, kind: ReferenceKind, id: &I) -> Reference<'a, T> {
    match found {
        Some(t) => Reference::Found(t),
        None => Reference::Missing {
            kind,
            id: id.to_string(),
        },
    }
}

fn upsert<T: Entity>(items: &mut Vec<T>, item: T) {
    match items.iter_mut().find(|existing| existing.id() == item.id()) {
        Some(slot) => *slot = item,
        None => items.push(item),
    }
}

fn remove_by<T>(items: &mut Vec<T>, pred: impl Fn(&T) -> bool) -> bool {
    let before = items.len();
    items.retain(|t| !pred(t));
    items.len() != before
}
