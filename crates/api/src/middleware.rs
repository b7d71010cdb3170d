use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};

use comanda_auth::SessionToken;
use comanda_session::SessionRegistry;

use crate::app::errors;
use crate::context::SessionContext;

#[derive(Clone)]
pub struct AuthState {
    pub sessions: Arc<SessionRegistry>,
}

/// Resolve `Authorization: Bearer <token>` to a live session.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, Response> {
    let unauthorized = |msg: &str| errors::json_error(StatusCode::UNAUTHORIZED, "unauthorized", msg);

    let token = extract_bearer(req.headers()).ok_or_else(|| unauthorized("missing bearer token"))?;
    let token: SessionToken = token.parse().map_err(|_| unauthorized("malformed bearer token"))?;
    let principal = state
        .sessions
        .principal(&token)
        .ok_or_else(|| unauthorized("session expired or logged out"))?;

    req.extensions_mut().insert(SessionContext::new(token, principal));

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let token = header.to_str().ok()?.strip_prefix("Bearer ")?.trim();
    (!token.is_empty()).then_some(token)
}
