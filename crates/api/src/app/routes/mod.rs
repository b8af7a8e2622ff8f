use axum::{
    Router,
    routing::{get, post},
};

pub mod admin;
pub mod authorize;
pub mod navigation;
pub mod system;

/// Router for all authenticated endpoints.
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .route("/navigation", get(navigation::navigation))
        .route("/authorize", post(authorize::authorize))
        .nest("/admin", admin::router())
}
