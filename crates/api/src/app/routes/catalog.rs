use std::sync::Arc;

use axum::{
    extract::{Extension, Query},
    http::StatusCode,
    response::IntoResponse,
    Json,
};

use comanda_core::FamilyId;

use crate::app::routes::common::{parse_id, refreshed_catalog};
use crate::app::services::AppServices;
use crate::app::dto;

/// What a cook browses to compose a draft: active articles grouped by
/// family, optionally narrowed to one family.
pub async fn browse(
    Extension(services): Extension<Arc<AppServices>>,
    Query(params): Query<dto::CatalogParams>,
) -> axum::response::Response {
    let only = match params.family.as_deref().map(parse_id::<FamilyId>).transpose() {
        Ok(v) => v,
        Err(resp) => return resp,
    };

    let catalog = match refreshed_catalog(&services).await {
        Ok(c) => c,
        Err(resp) => return resp,
    };
    let families = catalog
        .articles_by_family(only)
        .iter()
        .map(|group| dto::family_section_to_json(group, &catalog))
        .collect::<Vec<_>>();
    (StatusCode::OK, Json(serde_json::json!({ "families": families }))).into_response()
}
