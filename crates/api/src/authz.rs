//! Per-route authorization guard.
//!
//! Every protected handler names its logical operation and the action it
//! performs, and calls [`require`] before doing any work. Any outcome other
//! than an allow becomes the same generic 403.

use axum::response::Response;
use tracing::warn;

use coursedesk_auth::Action;

use crate::app::{errors, services::AppServices};
use crate::context::RequestIdentity;

pub async fn require(
    services: &AppServices,
    identity: &RequestIdentity,
    operation: &str,
    action: Action,
) -> Result<(), Response> {
    match services.authz.authorize(&identity.actor(), operation, action).await {
        Ok(true) => Ok(()),
        Ok(false) => Err(errors::forbidden()),
        Err(e) => {
            warn!(
                user_id = %identity.user_id(),
                operation,
                action = %action,
                error = %e,
                "authorization check failed; denying"
            );
            Err(errors::forbidden())
        }
    }
}
