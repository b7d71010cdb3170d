//! `comanda-core`: shared domain building blocks.
//!
//! Identifiers, the `Entity` trait and the domain error model. No IO lives here.

pub mod entity;
pub mod error;
pub mod id;

pub use entity::Entity;
pub use error::{DomainError, DomainResult, ReferenceKind};
pub use id::{ArticleId, FamilyId, OrderId, SupplierId, UnitId};
