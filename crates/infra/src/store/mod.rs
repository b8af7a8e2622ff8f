//! Store adapters and the wiring that turns them into engine services.

mod in_memory;
mod postgres;

use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};
use uuid::Uuid;

use coursedesk_auth::{
    AdminStore, AuthorizationService, CachedGrantStore, CredentialStore, GrantStore,
    OperationResolver, OperationTable, PermissionAdmin, ResourceStore, SessionGate, StoreError,
    UserStore,
};

use crate::config::{StoreBackend, StoreConfig};

pub use in_memory::InMemoryAccessStore;
pub use postgres::PostgresAccessStore;

/// Opaque bearer secret: 256 bits of randomness, hex encoded.
pub(crate) fn new_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Every store port the engine needs, backed by one concrete store.
///
/// `grants` is the cached decorator when caching is enabled, so the
/// authorization service and the admin service share one cache. The cache
/// assumes this process is the only writer of grants to the backend.
#[derive(Clone)]
pub struct AccessStores {
    pub resources: Arc<dyn ResourceStore>,
    pub grants: Arc<dyn GrantStore>,
    pub users: Arc<dyn UserStore>,
    pub credentials: Arc<dyn CredentialStore>,
    pub admin: Arc<dyn AdminStore>,
    pub cache: Option<Arc<CachedGrantStore>>,
}

impl AccessStores {
    pub fn from_backend<S>(backend: Arc<S>, grant_cache: bool) -> Self
    where
        S: ResourceStore + GrantStore + UserStore + CredentialStore + AdminStore + 'static,
    {
        let raw_grants: Arc<dyn GrantStore> = backend.clone();
        let cache = grant_cache.then(|| Arc::new(CachedGrantStore::new(raw_grants.clone())));
        let grants: Arc<dyn GrantStore> = match &cache {
            Some(cache) => cache.clone(),
            None => raw_grants,
        };

        Self {
            resources: backend.clone(),
            grants,
            users: backend.clone(),
            credentials: backend.clone(),
            admin: backend,
            cache,
        }
    }

    pub fn in_memory(grant_cache: bool) -> Self {
        Self::from_backend(Arc::new(InMemoryAccessStore::new()), grant_cache)
    }

    /// Connect, apply the schema, and wrap the pool.
    pub async fn connect(config: &StoreConfig) -> Result<Self, StoreError> {
        match &config.backend {
            StoreBackend::InMemory => {
                info!(grant_cache = config.grant_cache, "using in-memory access store");
                Ok(Self::in_memory(config.grant_cache))
            }
            StoreBackend::Postgres {
                url,
                max_connections,
            } => {
                let pool = PgPoolOptions::new()
                    .max_connections(*max_connections)
                    .connect(url)
                    .await
                    .map_err(|e| StoreError::Unavailable(format!("failed to connect to postgres: {e}")))?;
                let store = PostgresAccessStore::new(pool);
                store.migrate().await?;
                if config.grant_cache {
                    warn!("grant cache enabled over postgres: grant writes from other processes are not seen");
                }
                info!(
                    max_connections,
                    grant_cache = config.grant_cache,
                    "using postgres access store"
                );
                Ok(Self::from_backend(Arc::new(store), config.grant_cache))
            }
        }
    }

    pub fn authorization_service(&self, table: Arc<OperationTable>) -> AuthorizationService {
        AuthorizationService::new(
            OperationResolver::new(table, self.resources.clone()),
            self.users.clone(),
            self.grants.clone(),
            SessionGate::new(self.credentials.clone()),
        )
    }

    pub fn permission_admin(&self) -> PermissionAdmin {
        PermissionAdmin::new(
            self.resources.clone(),
            self.grants.clone(),
            self.users.clone(),
            self.admin.clone(),
            self.cache.clone(),
        )
    }
}
