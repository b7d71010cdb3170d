use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};

use comanda_core::OrderId;
use comanda_ordering::OrderStatus;

use crate::app::routes::common::parse_id;
use crate::app::services::{self, AppServices};
use crate::app::{dto, errors};
use crate::context::SessionContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_orders).post(create_orders))
        .route("/stream", get(stream_orders))
        .route("/:id", get(get_order).patch(update_notes).delete(delete_order))
        .route("/:id/status", patch(update_status))
}

/// Orders visible to the caller, filtered and sorted per the query string.
pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Query(params): Query<dto::OrderListParams>,
) -> axum::response::Response {
    let query = match params.into_query() {
        Ok(q) => q,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let ctx = services.context();
    let catalog = ctx.catalog();
    let items = ctx
        .visible_orders(session.principal(), &query)
        .iter()
        .map(|o| dto::order_row_to_json(o, &catalog))
        .collect::<Vec<_>>();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

/// Draft lines in, one order per supplier out.
pub async fn create_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Json(body): Json<dto::CreateOrdersRequest>,
) -> axum::response::Response {
    let lines = match body.lines() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let ctx = services.context();
    let mut draft = match ctx.draft_from_lines(&lines) {
        Ok(d) => d,
        Err(e) => return errors::context_error_to_response(e),
    };

    match ctx.submit_draft(session.principal(), &mut draft, body.notes).await {
        Ok(created) => {
            let catalog = ctx.catalog();
            let items = created
                .iter()
                .map(|o| dto::order_row_to_json(o, &catalog))
                .collect::<Vec<_>>();
            (StatusCode::CREATED, Json(serde_json::json!({ "items": items }))).into_response()
        }
        Err(e) => errors::context_error_to_response(e),
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OrderId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let ctx = services.context();
    match ctx.order(session.principal(), &id).await {
        Ok(order) => (StatusCode::OK, Json(dto::order_row_to_json(&order, &ctx.catalog()))).into_response(),
        Err(e) => errors::context_error_to_response(e),
    }
}

pub async fn update_status(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateStatusRequest>,
) -> axum::response::Response {
    let id: OrderId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let status: OrderStatus = match body.status.parse() {
        Ok(s) => s,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let ctx = services.context();
    match ctx.update_order_status(session.principal(), &id, status).await {
        Ok(order) => (StatusCode::OK, Json(dto::order_row_to_json(&order, &ctx.catalog()))).into_response(),
        Err(e) => errors::context_error_to_response(e),
    }
}

pub async fn update_notes(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateNotesRequest>,
) -> axum::response::Response {
    let id: OrderId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let ctx = services.context();
    match ctx.update_order_notes(session.principal(), &id, body.notes).await {
        Ok(order) => (StatusCode::OK, Json(dto::order_row_to_json(&order, &ctx.catalog()))).into_response(),
        Err(e) => errors::context_error_to_response(e),
    }
}

pub async fn delete_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: OrderId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.context().delete_order(session.principal(), &id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::context_error_to_response(e),
    }
}

/// Server-sent `orders` events, one full snapshot per change.
pub async fn stream_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
) -> axum::response::Response {
    match services::orders_sse_stream(services, session.principal().clone()).await {
        Ok(sse) => sse.into_response(),
        Err(e) => errors::context_error_to_response(e),
    }
}
