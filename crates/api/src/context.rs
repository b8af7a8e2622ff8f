use coursedesk_auth::{Actor, CredentialId, UserId};

/// Authenticated identity of a request, set by the credential middleware.
///
/// Present on every protected route.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RequestIdentity {
    user_id: UserId,
    credential_id: CredentialId,
}

impl RequestIdentity {
    pub fn new(user_id: UserId, credential_id: CredentialId) -> Self {
        Self {
            user_id,
            credential_id,
        }
    }

    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    pub fn credential_id(&self) -> CredentialId {
        self.credential_id
    }

    pub fn actor(&self) -> Actor {
        Actor::user(self.user_id, Some(self.credential_id))
    }
}
