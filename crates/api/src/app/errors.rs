use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use comanda_core::DomainError;
use comanda_infra::{RepositoryError, StoreError, SubmitError};
use comanda_session::ContextError;

use crate::app::dto;

pub fn context_error_to_response(err: ContextError) -> axum::response::Response {
    match err {
        ContextError::Domain(e) => domain_error_to_response(e),
        ContextError::Authz(e) => json_error(StatusCode::FORBIDDEN, "forbidden", e.to_string()),
        ContextError::Login(e) => json_error(StatusCode::BAD_REQUEST, "login_rejected", e.to_string()),
        ContextError::Repository(e) => repository_error_to_response(e),
        ContextError::Submit(SubmitError::EmptyDraft) => {
            json_error(StatusCode::BAD_REQUEST, "empty_draft", "draft has no lines")
        }
        ContextError::Submit(err @ SubmitError::Partial { .. }) => partial_submit_response(err),
    }
}

pub fn domain_error_to_response(err: DomainError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        DomainError::Validation(_) => json_error(StatusCode::BAD_REQUEST, "validation_error", message),
        DomainError::InvalidId(_) => json_error(StatusCode::BAD_REQUEST, "invalid_id", message),
        DomainError::MissingReference { .. } => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "missing_reference", message)
        }
        DomainError::InvariantViolation(_) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invariant_violation", message)
        }
        DomainError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", message),
        DomainError::Unauthorized => json_error(StatusCode::FORBIDDEN, "forbidden", message),
    }
}

fn repository_error_to_response(err: RepositoryError) -> axum::response::Response {
    let message = err.to_string();
    match err {
        RepositoryError::Domain(e) => domain_error_to_response(e),
        RepositoryError::NotFound { .. } | RepositoryError::Store(StoreError::NotFound { .. }) => {
            json_error(StatusCode::NOT_FOUND, "not_found", message)
        }
        RepositoryError::Store(StoreError::AlreadyExists { .. }) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "already_exists", message)
        }
        RepositoryError::Store(StoreError::Backend(_)) => {
            json_error(StatusCode::BAD_GATEWAY, "store_unavailable", message)
        }
        RepositoryError::Store(StoreError::NotAnObject | StoreError::Serialization(_)) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "store_error", message)
        }
    }
}

/// Some orders exist now, some do not. The body lists both so the client
/// can retry what is left in its draft.
fn partial_submit_response(err: SubmitError) -> axum::response::Response {
    let message = err.to_string();
    let SubmitError::Partial { created, failures } = err else {
        return json_error(StatusCode::BAD_REQUEST, "empty_draft", message);
    };
    (
        StatusCode::BAD_GATEWAY,
        axum::Json(json!({
            "error": "partial_submit",
            "message": message,
            "created": created.iter().map(dto::order_to_json).collect::<Vec<_>>(),
            "failures": failures
                .iter()
                .map(|f| json!({ "supplier": f.supplier.to_string(), "message": f.error.to_string() }))
                .collect::<Vec<_>>(),
        })),
    )
        .into_response()
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}
