use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use coursedesk_auth::{
    AuthorizationService, NavNode, OperationTable, OperationTableError, PermissionAdmin,
    ResourceTree, SessionGate, StoreError, TreeError, UserAccount, project, view_grants,
};
use coursedesk_infra::config::StoreConfig;
use coursedesk_infra::store::AccessStores;

use crate::context::RequestIdentity;

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("operation table is invalid: {0}")]
    OperationTable(#[from] OperationTableError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum NavigationError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("resource tree is inconsistent: {0}")]
    Tree(#[from] TreeError),
}

/// Everything the handlers need, shared behind an `Arc`.
#[derive(Clone)]
pub struct AppServices {
    pub stores: AccessStores,
    pub table: Arc<OperationTable>,
    pub authz: AuthorizationService,
    pub admin: PermissionAdmin,
    gate: SessionGate,
}

impl AppServices {
    pub fn new(stores: AccessStores, table: Arc<OperationTable>) -> Self {
        let authz = stores.authorization_service(table.clone());
        let admin = stores.permission_admin();
        let gate = SessionGate::new(stores.credentials.clone());
        Self {
            stores,
            table,
            authz,
            admin,
            gate,
        }
    }

    /// In-memory stores with the platform operation table.
    pub fn in_memory(grant_cache: bool) -> Result<Self, BuildError> {
        Ok(Self::new(
            AccessStores::in_memory(grant_cache),
            Arc::new(OperationTable::platform()?),
        ))
    }

    /// The caller's account if it exists and passes the session gate.
    ///
    /// An inactive account loses its credentials here, as in every check.
    pub async fn active_account(&self, identity: &RequestIdentity) -> Result<Option<UserAccount>, StoreError> {
        let Some(account) = self.stores.users.user(identity.user_id()).await? else {
            return Ok(None);
        };
        if !self
            .gate
            .check_active(&account, Some(identity.credential_id()))
            .await
        {
            return Ok(None);
        }
        Ok(Some(account))
    }

    /// The caller's menu. Empty for inactive accounts and group-less users.
    pub async fn navigation_for(&self, identity: &RequestIdentity) -> Result<Vec<NavNode>, NavigationError> {
        let Some(account) = self.active_account(identity).await? else {
            return Ok(Vec::new());
        };
        let Some(group_id) = account.permission_group_id else {
            return Ok(Vec::new());
        };
        match self.stores.users.group(group_id).await? {
            Some(group) if group.active => {}
            _ => return Ok(Vec::new()),
        }

        let tree = ResourceTree::new(self.stores.resources.all_nodes().await?)?;
        let grants = self.stores.grants.grants_for_group(group_id).await?;
        let menu = project(&tree, &view_grants(&grants));
        debug!(user_id = %account.id, roots = menu.len(), "navigation projected");
        Ok(menu)
    }
}

pub async fn build_services(config: &StoreConfig) -> Result<AppServices, BuildError> {
    let stores = AccessStores::connect(config).await?;
    let table = Arc::new(OperationTable::platform()?);
    info!(operations = table.len(), "operation table loaded");
    Ok(AppServices::new(stores, table))
}
