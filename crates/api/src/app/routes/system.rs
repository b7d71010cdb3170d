use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use comanda_auth::allowed_views;

use crate::app::dto;
use crate::context::SessionContext;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

pub async fn whoami(Extension(session): Extension<SessionContext>) -> impl IntoResponse {
    Json(dto::principal_to_json(session.principal()))
}

/// Navigation for the caller's role.
pub async fn views(Extension(session): Extension<SessionContext>) -> impl IntoResponse {
    Json(serde_json::json!({
        "items": dto::views_to_json(allowed_views(session.principal().role)),
    }))
}
