use std::sync::Arc;

use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};
use tracing::warn;

use crate::app::dto::WhoAmIResponse;
use crate::app::services::AppServices;
use crate::context::RequestIdentity;

pub async fn health() -> StatusCode {
    StatusCode::OK
}

/// Echo the caller's identity. Inactive accounts get a 401, like an unknown credential.
pub async fn whoami(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
) -> axum::response::Response {
    match services.active_account(&identity).await {
        Ok(Some(_)) => Json(WhoAmIResponse {
            user_id: identity.user_id(),
            credential_id: identity.credential_id(),
        })
        .into_response(),
        Ok(None) => StatusCode::UNAUTHORIZED.into_response(),
        Err(e) => {
            warn!(error = %e, "account lookup failed");
            StatusCode::UNAUTHORIZED.into_response()
        }
    }
}
