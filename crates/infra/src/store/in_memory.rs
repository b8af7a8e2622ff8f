use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use coursedesk_auth::{
    AdminError, AdminStore, Credential, CredentialStore, Grant, GrantFlags, GrantMatrix,
    GrantStore, IssuedCredential, PermissionGroup, ResourceNode, ResourceStore, StoreError,
    StoreResult, UrlPath, UserAccount, UserStore,
};
use coursedesk_core::{CredentialId, DomainError, GroupId, ResourceNodeId, UserId};

#[derive(Debug, Default)]
struct AccessState {
    nodes: Vec<ResourceNode>,
    groups: HashMap<GroupId, PermissionGroup>,
    users: HashMap<UserId, UserAccount>,
    grants: GrantMatrix,
    credentials: HashMap<CredentialId, Credential>,
    tokens: HashMap<String, CredentialId>,
}

impl AccessState {
    fn revoke_live(&mut self, user: UserId) -> u64 {
        let now = Utc::now();
        let mut revoked = 0;
        for credential in self.credentials.values_mut() {
            if credential.user_id == user && credential.revoked_at.is_none() {
                credential.revoked_at = Some(now);
                revoked += 1;
            }
        }
        revoked
    }
}

/// In-memory access-control store for tests/dev.
///
/// One lock guards every table, so each trait call is a single atomic write,
/// including deactivation plus credential revocation.
#[derive(Debug, Default)]
pub struct InMemoryAccessStore {
    state: RwLock<AccessState>,
}

impl InMemoryAccessStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, AccessState>> {
        self.state
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, AccessState>> {
        self.state
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))
    }
}

#[async_trait]
impl ResourceStore for InMemoryAccessStore {
    async fn node_by_path(&self, path: &UrlPath) -> StoreResult<Option<ResourceNode>> {
        let state = self.read()?;
        Ok(state.nodes.iter().find(|n| &n.url_path == path).cloned())
    }

    async fn node(&self, id: ResourceNodeId) -> StoreResult<Option<ResourceNode>> {
        let state = self.read()?;
        Ok(state.nodes.iter().find(|n| n.id == id).cloned())
    }

    async fn all_nodes(&self) -> StoreResult<Vec<ResourceNode>> {
        let state = self.read()?;
        let mut nodes = state.nodes.clone();
        nodes.sort_by(|a, b| a.position.cmp(&b.position).then_with(|| a.label.cmp(&b.label)));
        Ok(nodes)
    }
}

#[async_trait]
impl GrantStore for InMemoryAccessStore {
    async fn grant(&self, resource: ResourceNodeId, group: GroupId) -> StoreResult<Option<GrantFlags>> {
        Ok(self.read()?.grants.lookup(resource, group))
    }

    async fn grants_for_group(&self, group: GroupId) -> StoreResult<Vec<Grant>> {
        Ok(self.read()?.grants.row(group))
    }

    async fn upsert_grant(&self, grant: Grant) -> StoreResult<()> {
        self.write()?.grants.upsert(grant);
        Ok(())
    }

    async fn delete_grant(&self, resource: ResourceNodeId, group: GroupId) -> StoreResult<bool> {
        Ok(self.write()?.grants.remove(resource, group))
    }
}

#[async_trait]
impl UserStore for InMemoryAccessStore {
    async fn user(&self, id: UserId) -> StoreResult<Option<UserAccount>> {
        Ok(self.read()?.users.get(&id).cloned())
    }

    async fn group(&self, id: GroupId) -> StoreResult<Option<PermissionGroup>> {
        Ok(self.read()?.groups.get(&id).cloned())
    }

    async fn set_user_active(&self, id: UserId, active: bool) -> StoreResult<Option<u64>> {
        let mut state = self.write()?;
        let Some(user) = state.users.get_mut(&id) else {
            return Ok(None);
        };

        if active {
            user.status = coursedesk_auth::AccountStatus::Active;
            user.legacy_active = true;
            return Ok(Some(0));
        }

        user.status = coursedesk_auth::AccountStatus::Inactive;
        user.legacy_active = false;
        Ok(Some(state.revoke_live(id)))
    }
}

#[async_trait]
impl CredentialStore for InMemoryAccessStore {
    async fn credential(&self, id: CredentialId) -> StoreResult<Option<Credential>> {
        Ok(self.read()?.credentials.get(&id).cloned())
    }

    async fn credential_by_token(&self, token: &str) -> StoreResult<Option<Credential>> {
        let state = self.read()?;
        Ok(state
            .tokens
            .get(token)
            .and_then(|id| state.credentials.get(id))
            .cloned())
    }

    async fn issue(&self, user: UserId, ttl: Duration) -> StoreResult<IssuedCredential> {
        let now = Utc::now();
        let credential = Credential {
            id: CredentialId::new(),
            user_id: user,
            issued_at: now,
            expires_at: now + ttl,
            revoked_at: None,
        };
        let token = super::new_token();

        let mut state = self.write()?;
        state.tokens.insert(token.clone(), credential.id);
        state.credentials.insert(credential.id, credential.clone());
        Ok(IssuedCredential { credential, token })
    }

    async fn revoke(&self, id: CredentialId) -> StoreResult<bool> {
        let mut state = self.write()?;
        match state.credentials.get_mut(&id) {
            Some(credential) if credential.revoked_at.is_none() => {
                credential.revoked_at = Some(Utc::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn revoke_all(&self, user: UserId) -> StoreResult<u64> {
        Ok(self.write()?.revoke_live(user))
    }
}

#[async_trait]
impl AdminStore for InMemoryAccessStore {
    async fn insert_resource(&self, node: ResourceNode) -> Result<(), AdminError> {
        let mut state = self.write()?;
        if state.nodes.iter().any(|n| n.id == node.id) {
            return Err(DomainError::conflict(format!("resource node {} already exists", node.id)).into());
        }
        if state.nodes.iter().any(|n| n.url_path == node.url_path) {
            return Err(DomainError::conflict(format!("url path '{}' already in use", node.url_path)).into());
        }
        if let Some(parent) = node.parent_id {
            if !state.nodes.iter().any(|n| n.id == parent) {
                return Err(DomainError::validation(format!("unknown parent node {parent}")).into());
            }
        }
        state.nodes.push(node);
        Ok(())
    }

    async fn insert_group(&self, group: PermissionGroup) -> Result<(), AdminError> {
        let mut state = self.write()?;
        if state.groups.contains_key(&group.id) {
            return Err(DomainError::conflict(format!("permission group {} already exists", group.id)).into());
        }
        state.groups.insert(group.id, group);
        Ok(())
    }

    async fn insert_user(&self, user: UserAccount) -> Result<(), AdminError> {
        let mut state = self.write()?;
        if state.users.contains_key(&user.id) {
            return Err(DomainError::conflict(format!("user {} already exists", user.id)).into());
        }
        if let Some(group) = user.permission_group_id {
            if !state.groups.contains_key(&group) {
                return Err(DomainError::validation(format!("unknown permission group {group}")).into());
            }
        }
        state.users.insert(user.id, user);
        Ok(())
    }

    async fn delete_resource(&self, id: ResourceNodeId) -> Result<u64, AdminError> {
        let mut state = self.write()?;
        if !state.nodes.iter().any(|n| n.id == id) {
            return Err(DomainError::not_found("resource node").into());
        }
        if state.nodes.iter().any(|n| n.parent_id == Some(id)) {
            return Err(DomainError::invariant("resource node still has children").into());
        }
        state.nodes.retain(|n| n.id != id);
        Ok(state.grants.remove_resource(id) as u64)
    }

    async fn delete_group(&self, id: GroupId) -> Result<u64, AdminError> {
        let mut state = self.write()?;
        if !state.groups.contains_key(&id) {
            return Err(DomainError::not_found("permission group").into());
        }
        if state.users.values().any(|u| u.permission_group_id == Some(id)) {
            return Err(DomainError::invariant("permission group is still assigned to users").into());
        }
        state.groups.remove(&id);
        Ok(state.grants.remove_group(id) as u64)
    }
}
