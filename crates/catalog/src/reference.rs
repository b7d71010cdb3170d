//! Soft-reference resolution.

use std::borrow::Cow;

use comanda_core::{FamilyId, ReferenceKind, SupplierId, UnitId};

use crate::{Article, Family, Supplier, Unit};

/// Records with a display name.
pub trait Named {
    fn name(&self) -> &str;
}

impl Named for Family {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Supplier {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Unit {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Named for Article {
    fn name(&self) -> &str {
        &self.name
    }
}

/// Outcome of resolving an id against the catalog.
#[derive(Debug, Clone, PartialEq)]
pub enum Reference<'a, T> {
    Found(&'a T),
    /// Nothing with this id exists; carries the raw id.
    Missing { kind: ReferenceKind, id: String },
}

impl<'a, T> Reference<'a, T> {
    pub fn found(&self) -> Option<&'a T> {
        match self {
            Reference::Found(t) => Some(*t),
            Reference::Missing { .. } => None,
        }
    }

    pub fn is_missing(&self) -> bool {
        matches!(self, Reference::Missing { .. })
    }
}

impl<'a, T: Named> Reference<'a, T> {
    /// The record's name, or the raw id when the reference dangles.
    pub fn display_name(&self) -> Cow<'a, str> {
        match self {
            Reference::Found(t) => {
                let t: &'a T = *t;
                Cow::Borrowed(t.name())
            }
            Reference::Missing { id, .. } => Cow::Owned(id.clone()),
        }
    }
}

/// A parent record articles point at; deleting one cascades to its articles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParentRef {
    Family(FamilyId),
    Supplier(SupplierId),
    Unit(UnitId),
}

impl ParentRef {
    pub fn kind(&self) -> ReferenceKind {
        match self {
            ParentRef::Family(_) => ReferenceKind::Family,
            ParentRef::Supplier(_) => ReferenceKind::Supplier,
            ParentRef::Unit(_) => ReferenceKind::Unit,
        }
    }

    /// Whether `article` references this parent.
    pub fn is_referenced_by(&self, article: &Article) -> bool {
        match self {
            ParentRef::Family(id) => article.family == *id,
            ParentRef::Supplier(id) => article.supplier == *id,
            ParentRef::Unit(id) => article.unit == *id,
        }
    }
}

impl core::fmt::Display for ParentRef {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ParentRef::Family(id) => write!(f, "family {id}"),
            ParentRef::Supplier(id) => write!(f, "supplier {id}"),
            ParentRef::Unit(id) => write!(f, "unit {id}"),
        }
    }
}
