use std::sync::Arc;

use axum::{
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch},
    Json, Router,
};

use comanda_auth::View;
use comanda_core::ArticleId;

use crate::app::routes::common::{parse_id, refreshed_catalog};
use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::authz::require_view;
use crate::context::SessionContext;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_articles).post(create_article))
        .route("/:id", patch(update_article).delete(delete_article))
}

pub async fn list_articles(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Query(params): Query<dto::ArticleListParams>,
) -> axum::response::Response {
    if let Err(resp) = require_view(&session, View::Articles) {
        return resp;
    }
    let catalog = match refreshed_catalog(&services).await {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let items = catalog
        .articles()
        .iter()
        .filter(|a| !params.active || a.active)
        .map(|a| dto::article_to_json(a, &catalog))
        .collect::<Vec<_>>();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}

/// Rejected with 422 when the unit, family or supplier does not exist.
pub async fn create_article(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Json(body): Json<dto::CreateArticleRequest>,
) -> axum::response::Response {
    let new = match body.into_new_article() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let ctx = services.context();
    match ctx.create_article(session.principal(), new).await {
        Ok(article) => (
            StatusCode::CREATED,
            Json(dto::article_to_json(&article, &ctx.catalog())),
        )
            .into_response(),
        Err(e) => errors::context_error_to_response(e),
    }
}

pub async fn update_article(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::UpdateArticleRequest>,
) -> axum::response::Response {
    let id: ArticleId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let update = match body.into_update() {
        Ok(v) => v,
        Err(e) => return errors::domain_error_to_response(e),
    };
    let ctx = services.context();
    match ctx.update_article(session.principal(), &id, update).await {
        Ok(article) => (
            StatusCode::OK,
            Json(dto::article_to_json(&article, &ctx.catalog())),
        )
            .into_response(),
        Err(e) => errors::context_error_to_response(e),
    }
}

pub async fn delete_article(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let id: ArticleId = match parse_id(&id) {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match services.context().delete_article(session.principal(), &id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => errors::context_error_to_response(e),
    }
}
