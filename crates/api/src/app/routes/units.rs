use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};

use comanda_auth::View;
use comanda_catalog::{NewUnit, UnitUpdate};
use comanda_core::UnitId;

use crate::app::routes::common::{parse_id, refreshed_catalog, removed_articles_json};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::require_view;
use crate::context::SessionContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_units).post(create_unit))
        .route("/:id", patch(update_unit).delete(delete_unit))
}

pub async fn list_units(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
) -> axum::response::Response {
    if let Err(resp) = require_view(&session, View::Units) {
        return resp;
    }
    let catalog = match refreshed_catalog(&services).await {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let items = catalog.units().iter().map(dto::unit_to_json).collect::<Vec<_>>();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn create_unit(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Json(body): Json<dto::UnitRequest>,
) -> axum::response::Response {
    match services
        .context()
        .create_unit(session.principal(), NewUnit::named(body.name))
        .await
    {
        Ok(unit) => (StatusCode::CREATED, Json(dto::unit_to_json(&unit))).into_response(),
        Err(e) => errors::context_error_to_response(e),
    }
}

pub async fn update_unit(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UnitRequest>,
) -> axum::response::Response {
    let id: UnitId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let update = UnitUpdate { name: Some(body.name) };
    match services.context().update_unit(session.principal(), &id, update).await {
        Ok(unit) => (StatusCode::OK, Json(dto::unit_to_json(&unit))).into_response(),
        Err(e) => errors::context_error_to_response(e),
    }
}

/// Cascades: articles measured in it are removed too.
pub async fn delete_unit(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: UnitId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.context().delete_unit(session.principal(), &id).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(removed_articles_json(outcome.removed_articles.len())),
        )
            .into_response(),
        Err(e) => errors::context_error_to_response(e),
    }
}
