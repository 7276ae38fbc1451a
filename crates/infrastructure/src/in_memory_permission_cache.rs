use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fleetgrid_application::{PermissionCache, PermissionCacheEntry};
use fleetgrid_core::{AppResult, UserId};
use tokio::sync::RwLock;

#[derive(Default)]
struct CacheState {
    entries: HashMap<UserId, PermissionCacheEntry>,
    // Version counters outlive their entries so versions stay monotonic
    // across invalidations.
    versions: HashMap<UserId, u64>,
}

/// In-process TTL cache adapter for effective-permission snapshots.
///
/// Suitable for single-instance deployments; multi-instance deployments
/// should use [`crate::RedisPermissionCache`] so invalidations propagate.
#[derive(Default)]
pub struct InMemoryPermissionCache {
    state: RwLock<CacheState>,
}

impl InMemoryPermissionCache {
    /// Creates an empty in-memory permission cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl PermissionCache for InMemoryPermissionCache {
    async fn get(&self, user_id: UserId) -> AppResult<Option<PermissionCacheEntry>> {
        let now = Utc::now();
        {
            let state = self.state.read().await;
            let current = state.versions.get(&user_id).copied().unwrap_or(0);
            match state.entries.get(&user_id) {
                Some(entry) if entry.is_fresh_at(now) && entry.version >= current => {
                    return Ok(Some(entry.clone()));
                }
                Some(_) => {}
                None => return Ok(None),
            }
        }

        let mut state = self.state.write().await;
        let current = state.versions.get(&user_id).copied().unwrap_or(0);
        if state
            .entries
            .get(&user_id)
            .is_some_and(|entry| !entry.is_fresh_at(now) || entry.version < current)
        {
            state.entries.remove(&user_id);
        }

        Ok(None)
    }

    async fn current_version(&self, user_id: UserId) -> AppResult<u64> {
        let state = self.state.read().await;
        Ok(state.versions.get(&user_id).copied().unwrap_or(0))
    }

    async fn set(
        &self,
        user_id: UserId,
        entry: PermissionCacheEntry,
        _ttl: Duration,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        state.entries.insert(user_id, entry);
        Ok(())
    }

    async fn invalidate(&self, user_id: UserId) -> AppResult<u64> {
        let mut state = self.state.write().await;
        let version = state.versions.entry(user_id).or_insert(0);
        *version += 1;
        let version = *version;
        state.entries.remove(&user_id);
        Ok(version)
    }

    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AppResult<usize> {
        let mut state = self.state.write().await;
        let before = state.entries.len();
        state.entries.retain(|_, entry| entry.is_fresh_at(now));
        Ok(before - state.entries.len())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use chrono::{Duration as ChronoDuration, Utc};
    use fleetgrid_application::{PermissionCache, PermissionCacheEntry};
    use fleetgrid_core::UserId;
    use fleetgrid_domain::EffectivePermissions;

    use super::InMemoryPermissionCache;

    fn entry(user_id: UserId, ttl_seconds: i64) -> PermissionCacheEntry {
        let computed_at = Utc::now();
        PermissionCacheEntry {
            permissions: EffectivePermissions::empty(user_id, computed_at),
            computed_at,
            expires_at: computed_at + ChronoDuration::seconds(ttl_seconds),
            version: 0,
        }
    }

    #[tokio::test]
    async fn fresh_entry_is_returned() {
        let cache = InMemoryPermissionCache::new();
        let user_id = UserId::new();
        let stored = cache
            .set(user_id, entry(user_id, 60), Duration::from_secs(60))
            .await;
        assert!(stored.is_ok());

        let found = cache.get(user_id).await.unwrap_or(None);
        assert!(found.is_some());
    }

    #[tokio::test]
    async fn expired_entry_is_a_miss_and_evicted() {
        let cache = InMemoryPermissionCache::new();
        let user_id = UserId::new();
        let stored = cache
            .set(user_id, entry(user_id, -1), Duration::from_secs(0))
            .await;
        assert!(stored.is_ok());

        assert!(cache.get(user_id).await.unwrap_or(None).is_none());
        // Lazy eviction already removed the entry; the sweep finds nothing.
        assert_eq!(cache.cleanup_expired(Utc::now()).await.unwrap_or(usize::MAX), 0);
    }

    #[tokio::test]
    async fn invalidation_is_monotonic_and_drops_the_entry() {
        let cache = InMemoryPermissionCache::new();
        let user_id = UserId::new();
        let stored = cache
            .set(user_id, entry(user_id, 60), Duration::from_secs(60))
            .await;
        assert!(stored.is_ok());

        assert_eq!(cache.invalidate(user_id).await.unwrap_or(0), 1);
        assert!(cache.get(user_id).await.unwrap_or(None).is_none());
        assert_eq!(cache.invalidate(user_id).await.unwrap_or(0), 2);
        assert_eq!(cache.invalidate(user_id).await.unwrap_or(0), 3);
    }

    #[tokio::test]
    async fn set_stamped_with_the_bumped_version_is_served() {
        let cache = InMemoryPermissionCache::new();
        let user_id = UserId::new();
        assert_eq!(cache.invalidate(user_id).await.unwrap_or(0), 1);

        let mut fresh = entry(user_id, 60);
        fresh.version = cache.current_version(user_id).await.unwrap_or(u64::MAX);
        let stored = cache.set(user_id, fresh, Duration::from_secs(60)).await;
        assert!(stored.is_ok());

        let found = cache.get(user_id).await.unwrap_or(None);
        assert_eq!(found.map(|entry| entry.version), Some(1));
    }

    #[tokio::test]
    async fn entry_stamped_before_an_invalidation_is_rejected() {
        let cache = InMemoryPermissionCache::new();
        let user_id = UserId::new();
        let observed = cache.current_version(user_id).await.unwrap_or(u64::MAX);
        assert_eq!(cache.invalidate(user_id).await.unwrap_or(0), 1);

        // A write stamped with the pre-invalidation counter lands late.
        let mut stale = entry(user_id, 60);
        stale.version = observed;
        assert!(
            cache
                .set(user_id, stale, Duration::from_secs(60))
                .await
                .is_ok()
        );

        assert!(cache.get(user_id).await.unwrap_or(None).is_none());
    }

    #[tokio::test]
    async fn concurrent_writes_and_invalidations_never_resurrect_entries() {
        let cache = Arc::new(InMemoryPermissionCache::new());
        let user_id = UserId::new();
        for _ in 0..32 {
            let observed = cache.current_version(user_id).await.unwrap_or(u64::MAX);
            let mut snapshot = entry(user_id, 60);
            snapshot.version = observed;

            let writer = tokio::spawn({
                let cache = Arc::clone(&cache);
                async move { cache.set(user_id, snapshot, Duration::from_secs(60)).await }
            });
            let invalidator = tokio::spawn({
                let cache = Arc::clone(&cache);
                async move { cache.invalidate(user_id).await }
            });
            assert!(writer.await.is_ok_and(|stored| stored.is_ok()));
            assert!(invalidator.await.is_ok_and(|bumped| bumped.is_ok()));

            // Whichever order the tasks ran in, the write was stamped before
            // the invalidation and must stay invisible.
            assert!(cache.get(user_id).await.unwrap_or(None).is_none());
        }
    }

    #[tokio::test]
    async fn sweep_removes_only_expired_entries() {
        let cache = InMemoryPermissionCache::new();
        let live_user = UserId::new();
        let stale_user = UserId::new();
        assert!(
            cache
                .set(live_user, entry(live_user, 60), Duration::from_secs(60))
                .await
                .is_ok()
        );
        assert!(
            cache
                .set(stale_user, entry(stale_user, -1), Duration::from_secs(0))
                .await
                .is_ok()
        );

        assert_eq!(cache.cleanup_expired(Utc::now()).await.unwrap_or(usize::MAX), 1);
        assert_eq!(cache.cleanup_expired(Utc::now()).await.unwrap_or(usize::MAX), 0);
        assert!(cache.get(live_user).await.unwrap_or(None).is_some());
    }
}
