//! The caller's menu. Advisory: every entry is still guarded per request.

use std::sync::Arc;

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
};

use crate::app::{dto::NavigationResponse, errors, services::AppServices};
use crate::context::RequestIdentity;

/// GET /navigation
pub async fn navigation(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(identity): Extension<RequestIdentity>,
) -> axum::response::Response {
    match services.navigation_for(&identity).await {
        Ok(items) => (StatusCode::OK, Json(NavigationResponse { items })).into_response(),
        Err(e) => errors::navigation_error_to_response(e),
    }
}
