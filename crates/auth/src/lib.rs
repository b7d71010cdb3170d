//! `comanda-auth`: roles, permissions, role-gated navigation and the
//! shared-secret login.
//!
//! Decoupled from HTTP and storage.

pub mod authorize;
pub mod login;
pub mod permissions;
pub mod principal;
pub mod roles;
pub mod views;

pub use authorize::{authorize, authorize_order_read, AuthzError};
pub use login::{LoginError, LoginPolicy};
pub use permissions::Permission;
pub use principal::{Principal, SessionToken};
pub use roles::Role;
pub use views::{allowed_views, resolve_view, View};
