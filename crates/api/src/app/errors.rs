use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;
use tracing::warn;

use coursedesk_auth::AdminError;
use coursedesk_core::DomainError;

use crate::app::services::NavigationError;

/// The one response for every denied request. Never names the failing flag.
pub fn forbidden() -> axum::response::Response {
    json_error(StatusCode::FORBIDDEN, "forbidden", "forbidden")
}

pub fn admin_error_to_response(err: AdminError) -> axum::response::Response {
    match err {
        AdminError::Domain(DomainError::Validation(msg)) => {
            json_error(StatusCode::BAD_REQUEST, "validation_error", msg)
        }
        AdminError::Domain(DomainError::InvalidId(msg)) => json_error(StatusCode::BAD_REQUEST, "invalid_id", msg),
        AdminError::Domain(e @ DomainError::NotFound(_)) => json_error(StatusCode::NOT_FOUND, "not_found", e.to_string()),
        AdminError::Domain(DomainError::Conflict(msg)) => json_error(StatusCode::CONFLICT, "conflict", msg),
        AdminError::Domain(DomainError::InvariantViolation(msg)) => {
            json_error(StatusCode::CONFLICT, "invariant_violation", msg)
        }
        AdminError::Store(e) => {
            warn!(error = %e, "admin mutation failed in store");
            json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", "store unavailable")
        }
    }
}

pub fn navigation_error_to_response(err: NavigationError) -> axum::response::Response {
    warn!(error = %err, "navigation projection failed");
    match err {
        NavigationError::Store(_) => {
            json_error(StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", "store unavailable")
        }
        NavigationError::Tree(_) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "navigation_error", "navigation unavailable")
        }
    }
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
