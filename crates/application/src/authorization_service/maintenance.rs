use chrono::Utc;
use fleetgrid_core::{AppResult, UserId};

use super::AuthorizationService;

impl AuthorizationService {
    /// Drops the user's cached snapshot and bumps their version counter.
    ///
    /// Reads racing the invalidation observe either the old-but-still-valid
    /// entry or a clean miss, never a mix; the next read started after this
    /// call recomputes from the store.
    pub async fn invalidate_permission_cache(&self, user_id: UserId) -> AppResult<()> {
        let version = self.cache.invalidate(user_id).await?;
        tracing::debug!(user_id = %user_id, version, "permission cache invalidated");
        Ok(())
    }

    /// Removes cache entries past their expiry. Idempotent; safe to run
    /// concurrently with checks.
    pub async fn cleanup_expired_cache(&self) -> AppResult<usize> {
        let removed = self.cache.cleanup_expired(Utc::now()).await?;
        if removed > 0 {
            tracing::debug!(removed, "swept expired permission cache entries");
        }
        Ok(removed)
    }
}
