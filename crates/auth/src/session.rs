//! Session gate: an inactive account is denied and loses its credentials.
//!
//! The gate never returns an error. Revocation is best effort from the
//! caller's point of view: a failure is logged at `warn` and the answer is
//! still `false`.
//!
//! Requests that passed the gate before a deactivation committed may finish.
//! Every check that starts after the commit sees the account as inactive.

use std::sync::Arc;

use tracing::{info, warn};

use coursedesk_core::CredentialId;

use crate::{CredentialStore, UserAccount};

#[derive(Clone)]
pub struct SessionGate {
    credentials: Arc<dyn CredentialStore>,
}

impl SessionGate {
    pub fn new(credentials: Arc<dyn CredentialStore>) -> Self {
        Self { credentials }
    }

    /// `true` iff the account is active. On `false`, revokes every credential
    /// of the account before returning.
    pub async fn check_active(&self, account: &UserAccount, presented: Option<CredentialId>) -> bool {
        if account.is_active() {
            return true;
        }

        self.revoke_for(account, presented).await;
        false
    }

    async fn revoke_for(&self, account: &UserAccount, presented: Option<CredentialId>) {
        match self.credentials.revoke_all(account.id).await {
            Ok(revoked) => {
                info!(user_id = %account.id, revoked, "inactive account: credentials revoked");
                return;
            }
            Err(e) => {
                warn!(user_id = %account.id, error = %e, "inactive account: revoke_all failed");
            }
        }

        // Fall back to at least killing the credential in hand.
        if let Some(credential_id) = presented {
            if let Err(e) = self.credentials.revoke(credential_id).await {
                warn!(
                    user_id = %account.id,
                    credential_id = %credential_id,
                    error = %e,
                    "inactive account: revoking presented credential failed"
                );
            }
        }
    }
}
