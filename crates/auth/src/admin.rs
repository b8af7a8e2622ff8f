//! Administrator-triggered mutations of the access-control data.
//!
//! Every logical change is one store write. Grant writes go through the
//! (possibly cached) grant store so the cache invalidates itself; cascade
//! deletes invalidate the cache explicitly after the store commits.

use std::sync::Arc;

use thiserror::Error;
use tracing::{info, warn};

use coursedesk_core::{DomainError, GroupId, ResourceNodeId, UserId};

use crate::{
    AdminStore, CachedGrantStore, Grant, GrantStore, PermissionGroup, ResourceNode, ResourceStore,
    StoreError, UserAccount, UserStore,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AdminError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Clone)]
pub struct PermissionAdmin {
    resources: Arc<dyn ResourceStore>,
    grants: Arc<dyn GrantStore>,
    users: Arc<dyn UserStore>,
    admin: Arc<dyn AdminStore>,
    cache: Option<Arc<CachedGrantStore>>,
}

impl PermissionAdmin {
    /// `grants` should be the same handle the authorization service reads
    /// from; pass the cache separately so cascades can invalidate it.
    pub fn new(
        resources: Arc<dyn ResourceStore>,
        grants: Arc<dyn GrantStore>,
        users: Arc<dyn UserStore>,
        admin: Arc<dyn AdminStore>,
        cache: Option<Arc<CachedGrantStore>>,
    ) -> Self {
        Self {
            resources,
            grants,
            users,
            admin,
            cache,
        }
    }

    /// Insert or replace the matrix cell of an existing node and group.
    pub async fn set_grant(&self, grant: Grant) -> Result<(), AdminError> {
        if self.resources.node(grant.resource_id).await?.is_none() {
            return Err(DomainError::validation(format!("unknown resource node {}", grant.resource_id)).into());
        }
        if self.users.group(grant.group_id).await?.is_none() {
            return Err(DomainError::validation(format!("unknown permission group {}", grant.group_id)).into());
        }
        self.grants.upsert_grant(grant).await?;
        info!(
            resource_id = %grant.resource_id,
            group_id = %grant.group_id,
            flags = ?grant.flags,
            "grant updated"
        );
        Ok(())
    }

    pub async fn remove_grant(&self, resource: ResourceNodeId, group: GroupId) -> Result<bool, AdminError> {
        let existed = self.grants.delete_grant(resource, group).await?;
        info!(resource_id = %resource, group_id = %group, existed, "grant removed");
        Ok(existed)
    }

    /// Deactivate the account and revoke its credentials in one write.
    pub async fn deactivate_user(&self, user: UserId) -> Result<u64, AdminError> {
        let revoked = self
            .users
            .set_user_active(user, false)
            .await?
            .ok_or(DomainError::not_found("user"))?;
        info!(user_id = %user, revoked, "user deactivated");
        Ok(revoked)
    }

    pub async fn activate_user(&self, user: UserId) -> Result<(), AdminError> {
        self.users
            .set_user_active(user, true)
            .await?
            .ok_or(DomainError::not_found("user"))?;
        info!(user_id = %user, "user activated");
        Ok(())
    }

    pub async fn register_resource(&self, node: ResourceNode) -> Result<(), AdminError> {
        let id = node.id;
        self.admin.insert_resource(node).await?;
        info!(resource_id = %id, "resource registered");
        Ok(())
    }

    pub async fn register_group(&self, group: PermissionGroup) -> Result<(), AdminError> {
        let id = group.id;
        self.admin.insert_group(group).await?;
        info!(group_id = %id, "group registered");
        Ok(())
    }

    pub async fn register_user(&self, user: UserAccount) -> Result<(), AdminError> {
        let id = user.id;
        self.admin.insert_user(user).await?;
        info!(user_id = %id, "user registered");
        Ok(())
    }

    pub async fn delete_resource(&self, id: ResourceNodeId) -> Result<u64, AdminError> {
        let dropped = self.admin.delete_resource(id).await?;
        if let Some(cache) = &self.cache {
            cache.invalidate_resource(id);
        }
        info!(resource_id = %id, grants_dropped = dropped, "resource deleted");
        Ok(dropped)
    }

    pub async fn delete_group(&self, id: GroupId) -> Result<u64, AdminError> {
        let result = self.admin.delete_group(id).await;
        if let Err(AdminError::Domain(e)) = &result {
            warn!(group_id = %id, error = %e, "group deletion refused");
        }
        let dropped = result?;
        if let Some(cache) = &self.cache {
            cache.invalidate_group(id);
        }
        info!(group_id = %id, grants_dropped = dropped, "group deleted");
        Ok(dropped)
    }
}
