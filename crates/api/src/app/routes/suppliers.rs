use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};

use comanda_auth::View;
use comanda_catalog::{NewSupplier, SupplierUpdate};
use comanda_core::SupplierId;

use crate::app::routes::common::{parse_id, refreshed_catalog, removed_articles_json};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::require_view;
use crate::context::SessionContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_suppliers).post(create_supplier))
        .route("/:id", patch(update_supplier).delete(delete_supplier))
}

pub async fn list_suppliers(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
) -> axum::response::Response {
    if let Err(resp) = require_view(&session, View::Suppliers) {
        return resp;
    }
    let catalog = match refreshed_catalog(&services).await {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let items = catalog.suppliers().iter().map(dto::supplier_to_json).collect::<Vec<_>>();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn create_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Json(body): Json<dto::CreateSupplierRequest>,
) -> axum::response::Response {
    let new = NewSupplier {
        name: body.name,
        contact: body.contact,
    };
    match services.context().create_supplier(session.principal(), new).await {
        Ok(supplier) => (StatusCode::CREATED, Json(dto::supplier_to_json(&supplier))).into_response(),
        Err(e) => errors::context_error_to_response(e),
    }
}

pub async fn update_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateSupplierRequest>,
) -> axum::response::Response {
    let id: SupplierId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let update = SupplierUpdate {
        name: body.name,
        contact: body.contact,
    };
    match services.context().update_supplier(session.principal(), &id, update).await {
        Ok(supplier) => (StatusCode::OK, Json(dto::supplier_to_json(&supplier))).into_response(),
        Err(e) => errors::context_error_to_response(e),
    }
}

/// Cascades: articles supplied by it are removed too.
pub async fn delete_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: SupplierId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.context().delete_supplier(session.principal(), &id).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(removed_articles_json(outcome.removed_articles.len())),
        )
            .into_response(),
        Err(e) => errors::context_error_to_response(e),
    }
}
