//! Read-through cache in front of a [`GrantStore`].
//!
//! Absent cells are cached too. There is no timer: entries leave the cache
//! only when a write touches them. Every write bumps a generation counter
//! under the map lock, and a lookup that raced with a write discards its
//! result instead of caching it. A revoked grant therefore never comes back
//! from the cache once the revoking call has returned.
//!
//! Invalidation is local: only writes made through this instance are seen.
//! Use the cache only when this process is the sole writer of grants to the
//! backing store.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use async_trait::async_trait;

use coursedesk_core::{GroupId, ResourceNodeId};

use crate::{Grant, GrantFlags, GrantStore, StoreResult};

type Cell = (ResourceNodeId, GroupId);

#[derive(Debug, Default)]
struct CacheState {
    generation: u64,
    cells: HashMap<Cell, Option<GrantFlags>>,
}

pub struct CachedGrantStore {
    inner: Arc<dyn GrantStore>,
    state: RwLock<CacheState>,
}

impl CachedGrantStore {
    pub fn new(inner: Arc<dyn GrantStore>) -> Self {
        Self {
            inner,
            state: RwLock::new(CacheState::default()),
        }
    }

    pub fn len(&self) -> usize {
        self.read().cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn invalidate(&self, resource: ResourceNodeId, group: GroupId) {
        let mut state = self.write();
        state.generation += 1;
        state.cells.remove(&(resource, group));
    }

    /// Drop every cached cell of a deleted resource node.
    pub fn invalidate_resource(&self, resource: ResourceNodeId) {
        let mut state = self.write();
        state.generation += 1;
        state.cells.retain(|(r, _), _| *r != resource);
    }

    /// Drop every cached cell of a deleted group.
    pub fn invalidate_group(&self, group: GroupId) {
        let mut state = self.write();
        state.generation += 1;
        state.cells.retain(|(_, g), _| *g != group);
    }

    pub fn clear(&self) {
        let mut state = self.write();
        state.generation += 1;
        state.cells.clear();
    }

    // Critical sections are single map operations; a poisoned map is still consistent.
    fn read(&self) -> std::sync::RwLockReadGuard<'_, CacheState> {
        self.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, CacheState> {
        self.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

#[async_trait]
impl GrantStore for CachedGrantStore {
    async fn grant(&self, resource: ResourceNodeId, group: GroupId) -> StoreResult<Option<GrantFlags>> {
        let generation = {
            let state = self.read();
            if let Some(cached) = state.cells.get(&(resource, group)) {
                return Ok(*cached);
            }
            state.generation
        };

        let fresh = self.inner.grant(resource, group).await?;

        let mut state = self.write();
        if state.generation == generation {
            state.cells.insert((resource, group), fresh);
        }
        Ok(fresh)
    }

    async fn grants_for_group(&self, group: GroupId) -> StoreResult<Vec<Grant>> {
        self.inner.grants_for_group(group).await
    }

    async fn upsert_grant(&self, grant: Grant) -> StoreResult<()> {
        let result = self.inner.upsert_grant(grant).await;
        self.invalidate(grant.resource_id, grant.group_id);
        result
    }

    async fn delete_grant(&self, resource: ResourceNodeId, group: GroupId) -> StoreResult<bool> {
        let result = self.inner.delete_grant(resource, group).await;
        self.invalidate(resource, group);
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Action, GrantMatrix};
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
    use tokio::sync::Notify;

    #[derive(Default)]
    struct CountingStore {
        matrix: Mutex<GrantMatrix>,
        reads: AtomicUsize,
    }

    #[async_trait]
    impl GrantStore for CountingStore {
        async fn grant(&self, resource: ResourceNodeId, group: GroupId) -> StoreResult<Option<GrantFlags>> {
            self.reads.fetch_add(1, Ordering::SeqCst);
            Ok(self.matrix.lock().unwrap().lookup(resource, group))
        }

        async fn grants_for_group(&self, group: GroupId) -> StoreResult<Vec<Grant>> {
            Ok(self.matrix.lock().unwrap().row(group))
        }

        async fn upsert_grant(&self, grant: Grant) -> StoreResult<()> {
            self.matrix.lock().unwrap().upsert(grant);
            Ok(())
        }

        async fn delete_grant(&self, resource: ResourceNodeId, group: GroupId) -> StoreResult<bool> {
            Ok(self.matrix.lock().unwrap().remove(resource, group))
        }
    }

    #[tokio::test]
    async fn caches_hits_and_misses() {
        let inner = Arc::new(CountingStore::default());
        let cache = CachedGrantStore::new(inner.clone());
        let (node, group) = (ResourceNodeId::new(), GroupId::new());

        assert_eq!(cache.grant(node, group).await.unwrap(), None);
        assert_eq!(cache.grant(node, group).await.unwrap(), None);
        assert_eq!(inner.reads.load(Ordering::SeqCst), 1);
        assert_eq!(cache.len(), 1);
    }

    #[tokio::test]
    async fn revoking_write_is_visible_immediately() {
        let inner = Arc::new(CountingStore::default());
        let cache = CachedGrantStore::new(inner.clone());
        let (node, group) = (ResourceNodeId::new(), GroupId::new());
        let grant = Grant {
            resource_id: node,
            group_id: group,
            flags: GrantFlags::only(&[Action::View]),
        };

        cache.upsert_grant(grant).await.unwrap();
        assert!(cache.grant(node, group).await.unwrap().unwrap().view);

        cache.delete_grant(node, group).await.unwrap();
        assert_eq!(cache.grant(node, group).await.unwrap(), None);
    }

    /// Inner store whose next read captures its answer, then waits to be released.
    #[derive(Default)]
    struct ParkedReadStore {
        matrix: Mutex<GrantMatrix>,
        park_next_read: AtomicBool,
        read_started: Notify,
        release_read: Notify,
    }

    #[async_trait]
    impl GrantStore for ParkedReadStore {
        async fn grant(&self, resource: ResourceNodeId, group: GroupId) -> StoreResult<Option<GrantFlags>> {
            let answer = self.matrix.lock().unwrap().lookup(resource, group);
            if self.park_next_read.swap(false, Ordering::SeqCst) {
                self.read_started.notify_one();
                self.release_read.notified().await;
            }
            Ok(answer)
        }

        async fn grants_for_group(&self, group: GroupId) -> StoreResult<Vec<Grant>> {
            Ok(self.matrix.lock().unwrap().row(group))
        }

        async fn upsert_grant(&self, grant: Grant) -> StoreResult<()> {
            self.matrix.lock().unwrap().upsert(grant);
            Ok(())
        }

        async fn delete_grant(&self, resource: ResourceNodeId, group: GroupId) -> StoreResult<bool> {
            Ok(self.matrix.lock().unwrap().remove(resource, group))
        }
    }

    #[tokio::test]
    async fn lookup_racing_a_revocation_is_not_cached() {
        let inner = Arc::new(ParkedReadStore::default());
        let cache = Arc::new(CachedGrantStore::new(inner.clone()));
        let (node, group) = (ResourceNodeId::new(), GroupId::new());
        inner.matrix.lock().unwrap().upsert(Grant {
            resource_id: node,
            group_id: group,
            flags: GrantFlags::ALL,
        });
        inner.park_next_read.store(true, Ordering::SeqCst);

        let reader = {
            let cache = cache.clone();
            tokio::spawn(async move { cache.grant(node, group).await })
        };
        inner.read_started.notified().await;

        assert!(cache.delete_grant(node, group).await.unwrap());
        inner.release_read.notify_one();

        // The racing read still answers with what it saw, but must not cache it.
        assert_eq!(reader.await.unwrap().unwrap(), Some(GrantFlags::ALL));
        assert!(cache.is_empty());
        assert_eq!(cache.grant(node, group).await.unwrap(), None);
    }

    #[tokio::test]
    async fn cascade_invalidation_drops_matching_cells() {
        let inner = Arc::new(CountingStore::default());
        let cache = CachedGrantStore::new(inner);
        let (n1, n2, g) = (ResourceNodeId::new(), ResourceNodeId::new(), GroupId::new());

        cache.grant(n1, g).await.unwrap();
        cache.grant(n2, g).await.unwrap();
        cache.invalidate_resource(n1);
        assert_eq!(cache.len(), 1);
        cache.invalidate_group(g);
        assert!(cache.is_empty());
    }
}
