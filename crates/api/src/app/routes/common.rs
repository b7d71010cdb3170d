use core::str::FromStr;

use comanda_catalog::Catalog;
use comanda_core::DomainError;

use crate::app::errors;
use crate::app::services::AppServices;

/// Parse a path id, answering 400 on failure.
pub fn parse_id<T>(raw: &str) -> Result<T, axum::response::Response>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse().map_err(errors::domain_error_to_response)
}

pub fn removed_articles_json(removed: usize) -> serde_json::Value {
    serde_json::json!({ "removed_articles": removed })
}

/// Reload the shared catalog and return a snapshot of it.
pub async fn refreshed_catalog(services: &AppServices) -> Result<Catalog, axum::response::Response> {
    let ctx = services.context();
    ctx.refresh_catalog()
        .await
        .map_err(errors::context_error_to_response)?;
    Ok(ctx.catalog())
}
