use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use coursedesk_core::{CredentialId, UserId};

/// A live session credential issued to a user.
///
/// The bearer secret itself is never part of this model; stores map the
/// secret to a credential id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential {
    pub id: CredentialId,
    pub user_id: UserId,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

/// Credential plus the bearer secret, returned once at issue time.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCredential {
    pub credential: Credential,
    pub token: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("credential has been revoked")]
    Revoked,

    #[error("credential has expired")]
    Expired,

    #[error("credential not yet valid (issued_at is in the future)")]
    NotYetValid,

    #[error("invalid credential time window (expires_at <= issued_at)")]
    InvalidTimeWindow,
}

impl Credential {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at.is_some()
    }

    /// Deterministically validate revocation state and the time window.
    pub fn validate(&self, now: DateTime<Utc>) -> Result<(), CredentialError> {
        if self.is_revoked() {
            return Err(CredentialError::Revoked);
        }
        if self.expires_at <= self.issued_at {
            return Err(CredentialError::InvalidTimeWindow);
        }
        if now < self.issued_at {
            return Err(CredentialError::NotYetValid);
        }
        if now >= self.expires_at {
            return Err(CredentialError::Expired);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn credential(now: DateTime<Utc>) -> Credential {
        Credential {
            id: CredentialId::new(),
            user_id: UserId::new(),
            issued_at: now,
            expires_at: now + Duration::hours(1),
            revoked_at: None,
        }
    }

    #[test]
    fn valid_inside_window() {
        let now = Utc::now();
        assert_eq!(credential(now).validate(now + Duration::minutes(5)), Ok(()));
    }

    #[test]
    fn revocation_wins_over_window() {
        let now = Utc::now();
        let mut c = credential(now);
        c.revoked_at = Some(now);
        assert_eq!(c.validate(now), Err(CredentialError::Revoked));
    }

    #[test]
    fn expired_and_future_credentials_fail() {
        let now = Utc::now();
        let c = credential(now);
        assert_eq!(c.validate(now + Duration::hours(2)), Err(CredentialError::Expired));
        assert_eq!(c.validate(now - Duration::minutes(1)), Err(CredentialError::NotYetValid));
    }

    #[test]
    fn inverted_window_is_rejected() {
        let now = Utc::now();
        let mut c = credential(now);
        c.expires_at = now;
        assert_eq!(c.validate(now), Err(CredentialError::InvalidTimeWindow));
    }
}
