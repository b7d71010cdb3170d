//! Ordering domain module: orders, the draft builder and the order list view-model.
//!
//! This crate contains the business rules for composing and tracking orders,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no storage).

pub mod draft;
pub mod listing;
pub mod order;

pub use draft::{DraftFamilyGroup, DraftLine, OrderDraft};
pub use listing::{OrderFilter, OrderListQuery, SortDirection, SortKey};
pub use order::{NewOrder, Order, OrderLine, OrderStatus, StatusChange};
