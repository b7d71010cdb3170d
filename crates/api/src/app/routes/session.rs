use std::sync::Arc;

use axum::{extract::Extension, http::StatusCode, response::IntoResponse, Json};

use comanda_session::ContextError;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::SessionContext;

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    Json(body): Json<dto::LoginRequest>,
) -> axum::response::Response {
    match services.sessions().login(&body.secret, body.name.as_deref()) {
        Ok((token, principal)) => {
            let mut json = dto::principal_to_json(&principal);
            json["token"] = serde_json::Value::String(token.to_string());
            (StatusCode::OK, Json(json)).into_response()
        }
        Err(e) => errors::context_error_to_response(ContextError::from(e)),
    }
}

pub async fn logout(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(session): Extension<SessionContext>,
) -> StatusCode {
    services.sessions().logout(&session.token());
    StatusCode::NO_CONTENT
}
