//! Authoritative allow/deny decisions.
//!
//! A check runs these steps in order and the first failing one decides:
//! 1. anonymous actors and unknown users are denied
//! 2. the session gate denies (and revokes) inactive accounts
//! 3. the operation id must resolve to a resource node
//! 4. the user needs an active permission group
//! 5. a grant cell must exist for (node, group)
//! 6. the cell's flag for the requested action is the answer
//!
//! Only store failures are errors, and callers treat them as a deny.

use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

use coursedesk_core::{CredentialId, ResourceNodeId, UserId};

use crate::{Action, GrantStore, OperationTable, ResourceStore, SessionGate, StoreError, UserStore};

/// Who is making the request, as established by the credential middleware.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Actor {
    Anonymous,
    User {
        user_id: UserId,
        credential_id: Option<CredentialId>,
    },
}

impl Actor {
    pub fn user(user_id: UserId, credential_id: Option<CredentialId>) -> Self {
        Actor::User {
            user_id,
            credential_id,
        }
    }
}

/// Only infrastructure failures surface as errors. Every `Err` is a deny.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("authorization store failure: {0}")]
    Store(#[from] StoreError),
}

/// Why a request was denied. For logs and tests; never sent to clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialKind {
    Anonymous,
    UnknownUser,
    InactiveAccount,
    UnresolvedOperation,
    NoGroup,
    /// No matrix cell for (resource, group).
    MissingGrant,
    /// A cell exists but the requested flag is false.
    ActionNotGranted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenialKind),
}

impl Decision {
    pub fn is_allow(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Maps a logical operation id to exactly one resource node, or none.
///
/// "None" is an ordinary answer (unknown id, or a path with no node) that the
/// caller turns into a deny.
#[derive(Clone)]
pub struct OperationResolver {
    table: Arc<OperationTable>,
    resources: Arc<dyn ResourceStore>,
}

impl OperationResolver {
    pub fn new(table: Arc<OperationTable>, resources: Arc<dyn ResourceStore>) -> Self {
        Self { table, resources }
    }

    pub fn table(&self) -> &OperationTable {
        &self.table
    }

    pub async fn resolve(&self, operation: &str) -> Result<Option<ResourceNodeId>, StoreError> {
        let Some(path) = self.table.path_for(operation) else {
            return Ok(None);
        };
        Ok(self.resources.node_by_path(path).await?.map(|node| node.id))
    }
}

/// The authoritative allow/deny decision for every protected request.
///
/// Steps, in order: session gate, operation resolution, group check, grant
/// lookup, exact flag. The first failing step decides.
#[derive(Clone)]
pub struct AuthorizationService {
    resolver: OperationResolver,
    users: Arc<dyn UserStore>,
    grants: Arc<dyn GrantStore>,
    gate: SessionGate,
}

impl AuthorizationService {
    pub fn new(
        resolver: OperationResolver,
        users: Arc<dyn UserStore>,
        grants: Arc<dyn GrantStore>,
        gate: SessionGate,
    ) -> Self {
        Self {
            resolver,
            users,
            grants,
            gate,
        }
    }

    pub fn resolver(&self) -> &OperationResolver {
        &self.resolver
    }

    pub async fn authorize(&self, actor: &Actor, operation: &str, action: Action) -> Result<bool, AuthzError> {
        Ok(self.decide(actor, operation, action).await?.is_allow())
    }

    #[instrument(skip_all, fields(operation = %operation, action = %action))]
    pub async fn decide(&self, actor: &Actor, operation: &str, action: Action) -> Result<Decision, AuthzError> {
        let decision = self.evaluate(actor, operation, action).await?;
        if let Decision::Deny(kind) = decision {
            debug!(?kind, "access denied");
        }
        Ok(decision)
    }

    async fn evaluate(&self, actor: &Actor, operation: &str, action: Action) -> Result<Decision, AuthzError> {
        let Actor::User {
            user_id,
            credential_id,
        } = *actor
        else {
            return Ok(Decision::Deny(DenialKind::Anonymous));
        };

        let Some(account) = self.users.user(user_id).await? else {
            return Ok(Decision::Deny(DenialKind::UnknownUser));
        };

        if !self.gate.check_active(&account, credential_id).await {
            return Ok(Decision::Deny(DenialKind::InactiveAccount));
        }

        let Some(resource) = self.resolver.resolve(operation).await? else {
            return Ok(Decision::Deny(DenialKind::UnresolvedOperation));
        };

        let Some(group_id) = account.permission_group_id else {
            return Ok(Decision::Deny(DenialKind::NoGroup));
        };
        match self.users.group(group_id).await? {
            Some(group) if group.active => {}
            _ => return Ok(Decision::Deny(DenialKind::NoGroup)),
        }

        let Some(flags) = self.grants.grant(resource, group_id).await? else {
            return Ok(Decision::Deny(DenialKind::MissingGrant));
        };

        if flags.allows(action) {
            Ok(Decision::Allow)
        } else {
            Ok(Decision::Deny(DenialKind::ActionNotGranted))
        }
    }
}
