use axum::{
    routing::{get, post},
    Router,
};

pub mod articles;
pub mod catalog;
pub mod common;
pub mod families;
pub mod orders;
pub mod session;
pub mod suppliers;
pub mod system;
pub mod units;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/logout", post(session::logout))
        .route("/whoami", get(system::whoami))
        .route("/views", get(system::views))
        .route("/catalog", get(catalog::browse))
        .nest("/orders", orders::router())
        .nest("/articles", articles::router())
        .nest("/families", families::router())
        .nest("/suppliers", suppliers::router())
        .nest("/units", units::router())
}
