//! Persistence ports consumed by the engine.
//!
//! Implementations live in `coursedesk-infra` (in-memory and Postgres). All
//! lookups return `Ok(None)` for absent records; `Err` is reserved for the
//! store itself failing, which callers must treat as a deny.

use async_trait::async_trait;
use chrono::Duration;
use thiserror::Error;

use coursedesk_core::{CredentialId, GroupId, ResourceNodeId, UserId};

use crate::{
    AdminError, Credential, Grant, GrantFlags, IssuedCredential, PermissionGroup, ResourceNode,
    UrlPath, UserAccount,
};

/// Infrastructure failure of a backing store.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store backend error: {0}")]
    Backend(String),

    #[error("corrupt record: {0}")]
    Corrupt(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait ResourceStore: Send + Sync {
    async fn node_by_path(&self, path: &UrlPath) -> StoreResult<Option<ResourceNode>>;
    async fn node(&self, id: ResourceNodeId) -> StoreResult<Option<ResourceNode>>;
    /// Every node, ordered by `position` then label (sibling order of the menu).
    async fn all_nodes(&self) -> StoreResult<Vec<ResourceNode>>;
}

#[async_trait]
pub trait GrantStore: Send + Sync {
    async fn grant(&self, resource: ResourceNodeId, group: GroupId) -> StoreResult<Option<GrantFlags>>;
    async fn grants_for_group(&self, group: GroupId) -> StoreResult<Vec<Grant>>;
    async fn upsert_grant(&self, grant: Grant) -> StoreResult<()>;
    /// Returns whether a cell existed.
    async fn delete_grant(&self, resource: ResourceNodeId, group: GroupId) -> StoreResult<bool>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    async fn user(&self, id: UserId) -> StoreResult<Option<UserAccount>>;
    async fn group(&self, id: GroupId) -> StoreResult<Option<PermissionGroup>>;

    /// Flip both activity signals in one atomic write.
    ///
    /// Deactivation revokes every live credential of the user inside the same
    /// write. Returns `None` if the user does not exist, otherwise the number
    /// of credentials revoked.
    async fn set_user_active(&self, id: UserId, active: bool) -> StoreResult<Option<u64>>;
}

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn credential(&self, id: CredentialId) -> StoreResult<Option<Credential>>;
    async fn credential_by_token(&self, token: &str) -> StoreResult<Option<Credential>>;
    async fn issue(&self, user: UserId, ttl: Duration) -> StoreResult<IssuedCredential>;
    /// Returns whether a live credential was revoked.
    async fn revoke(&self, id: CredentialId) -> StoreResult<bool>;
    /// Returns the number of live credentials revoked.
    async fn revoke_all(&self, user: UserId) -> StoreResult<u64>;
}

/// Low-churn administrative writes on the resource tree and groups.
#[async_trait]
pub trait AdminStore: Send + Sync {
    async fn insert_resource(&self, node: ResourceNode) -> Result<(), AdminError>;
    async fn insert_group(&self, group: PermissionGroup) -> Result<(), AdminError>;
    async fn insert_user(&self, user: UserAccount) -> Result<(), AdminError>;
    /// Deletes a childless node and cascades its grants. Returns the grants dropped.
    async fn delete_resource(&self, id: ResourceNodeId) -> Result<u64, AdminError>;
    /// Deletes a group no user references and cascades its grants. Returns the grants dropped.
    async fn delete_group(&self, id: GroupId) -> Result<u64, AdminError>;
}
