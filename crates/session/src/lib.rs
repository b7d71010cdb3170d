//! `comanda-session`: the explicit application context shared by every
//! consumer, the login session registry, and the live orders view.

pub mod context;
pub mod error;
pub mod orders_view;
pub mod sessions;

pub use context::AppContext;
pub use error::ContextError;
pub use orders_view::OrdersView;
pub use sessions::SessionRegistry;
