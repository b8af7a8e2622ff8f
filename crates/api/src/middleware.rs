use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;
use tracing::{debug, warn};

use coursedesk_auth::CredentialStore;

use crate::context::RequestIdentity;

#[derive(Clone)]
pub struct AuthState {
    pub credentials: Arc<dyn CredentialStore>,
}

/// Resolve the bearer secret to a live credential.
///
/// Unknown, expired and revoked credentials are all a plain 401. A credential
/// store failure is also a 401: nothing passes without a confirmed credential.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = extract_bearer(req.headers())?;

    let credential = match state.credentials.credential_by_token(token).await {
        Ok(Some(credential)) => credential,
        Ok(None) => return Err(StatusCode::UNAUTHORIZED),
        Err(e) => {
            warn!(error = %e, "credential lookup failed");
            return Err(StatusCode::UNAUTHORIZED);
        }
    };

    if let Err(e) = credential.validate(Utc::now()) {
        debug!(credential_id = %credential.id, reason = %e, "credential rejected");
        return Err(StatusCode::UNAUTHORIZED);
    }

    req.extensions_mut()
        .insert(RequestIdentity::new(credential.user_id, credential.id));

    Ok(next.run(req).await)
}

fn extract_bearer(headers: &HeaderMap) -> Result<&str, StatusCode> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let header = header.to_str().map_err(|_| StatusCode::UNAUTHORIZED)?;

    let token = header
        .strip_prefix("Bearer ")
        .ok_or(StatusCode::UNAUTHORIZED)?
        .trim();

    if token.is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    Ok(token)
}
