//! Route-level guards.
//!
//! Catalog-management routes are only reachable by roles whose navigation
//! includes the matching view; operation permissions are checked again by
//! the application context.

use axum::{http::StatusCode, response::Response};

use comanda_auth::{resolve_view, View};

use crate::app::errors;
use crate::context::SessionContext;

pub fn require_view(session: &SessionContext, view: View) -> Result<(), Response> {
    resolve_view(session.principal().role, view)
        .map(|_| ())
        .map_err(|e| errors::json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()))
}
