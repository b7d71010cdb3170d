//! Catalog domain module: families, suppliers, units and articles.
//!
//! Records reference each other by id only. The [`Catalog`] snapshot resolves
//! those references through validated lookups and knows which articles a
//! cascading delete of a parent record must take with it.
//!
//! Pure domain logic (no IO, no HTTP, no storage).

pub mod article;
pub mod catalog;
pub mod family;
pub mod reference;
pub mod supplier;
pub mod unit;

pub use article::{Article, ArticleUpdate, NewArticle};
pub use catalog::{Catalog, CascadeOutcome, DanglingReference, FamilyArticles};
pub use family::{Family, FamilyUpdate, NewFamily};
pub use reference::{Named, ParentRef, Reference};
pub use supplier::{ContactInfo, NewSupplier, Supplier, SupplierUpdate};
pub use unit::{NewUnit, Unit, UnitUpdate};
