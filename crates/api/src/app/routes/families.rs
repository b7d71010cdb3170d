use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};

use comanda_auth::View;
use comanda_catalog::{FamilyUpdate, NewFamily};
use comanda_core::FamilyId;

use crate::app::routes::common::{parse_id, refreshed_catalog, removed_articles_json};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::require_view;
use crate::context::SessionContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_families).post(create_family))
        .route("/:id", patch(update_family).delete(delete_family))
}

pub async fn list_families(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
) -> axum::response::Response {
    if let Err(resp) = require_view(&session, View::Families) {
        return resp;
    }
    let catalog = match refreshed_catalog(&services).await {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let items = catalog.families().iter().map(dto::family_to_json).collect::<Vec<_>>();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

pub async fn create_family(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Json(body): Json<dto::CreateFamilyRequest>,
) -> axum::response::Response {
    let new = NewFamily {
        name: body.name,
        description: body.description,
    };
    match services.context().create_family(session.principal(), new).await {
        Ok(family) => (StatusCode::CREATED, Json(dto::family_to_json(&family))).into_response(),
        Err(e) => errors::context_error_to_response(e),
    }
}

pub async fn update_family(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateFamilyRequest>,
) -> axum::response::Response {
    let id: FamilyId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let update = FamilyUpdate {
        name: body.name,
        description: body.description,
    };
    match services.context().update_family(session.principal(), &id, update).await {
        Ok(family) => (StatusCode::OK, Json(dto::family_to_json(&family))).into_response(),
        Err(e) => errors::context_error_to_response(e),
    }
}

/// Cascades: the family's articles go with it.
pub async fn delete_family(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: FamilyId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.context().delete_family(session.principal(), &id).await {
        Ok(outcome) => (
            StatusCode::OK,
            Json(removed_articles_json(outcome.removed_articles.len())),
        )
            .into_response(),
        Err(e) => errors::context_error_to_response(e),
    }
}
