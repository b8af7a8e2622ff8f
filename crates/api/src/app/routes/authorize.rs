use std::sync::Arc;

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
};
use tracing::warn;

use crate::app::{
    dto::{self, AuthorizeRequest, AuthorizeResponse},
    services::AppServices,
};
use crate::context::RequestIdentity;

/// POST /authorize - lets a client mirror one check for the caller.
///
/// A store failure answers `allowed: false`, same as any other deny.
pub async fn authorize(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
    Json(body): Json<AuthorizeRequest>,
) -> axum::response::Response {
    let action = match dto::parse_action(&body.action) {
        Ok(action) => action,
        Err(response) => return response,
    };

    let allowed = match services
        .authz
        .authorize(&identity.actor(), &body.operation, action)
        .await
    {
        Ok(allowed) => allowed,
        Err(e) => {
            warn!(user_id = %identity.user_id(), error = %e, "authorization check failed; denying");
            false
        }
    };

    (StatusCode::OK, Json(AuthorizeResponse { allowed })).into_response()
}
