//! Redis-backed permission cache for multi-instance deployments.

use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fleetgrid_application::{PermissionCache, PermissionCacheEntry};
use fleetgrid_core::{AppError, AppResult, UserId};
use redis::AsyncCommands;

/// Redis implementation of the permission cache port.
///
/// Entries expire through native key TTLs, so [`PermissionCache::cleanup_expired`]
/// has nothing to sweep. The per-user version counter lives under a separate
/// key and survives entry deletion, keeping versions monotonic.
#[derive(Clone)]
pub struct RedisPermissionCache {
    client: redis::Client,
    key_prefix: String,
}

impl RedisPermissionCache {
    /// Creates a cache adapter with a configured Redis client and key prefix.
    #[must_use]
    pub fn new(client: redis::Client, key_prefix: impl Into<String>) -> Self {
        Self {
            client,
            key_prefix: key_prefix.into(),
        }
    }

    fn entry_key(&self, user_id: UserId) -> String {
        format!("{}:permissions:{user_id}", self.key_prefix)
    }

    fn version_key(&self, user_id: UserId) -> String {
        format!("{}:permissions:{user_id}:version", self.key_prefix)
    }

    async fn connection(&self) -> AppResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|error| AppError::Internal(format!("failed to connect to redis: {error}")))
    }
}

#[async_trait]
impl PermissionCache for RedisPermissionCache {
    async fn get(&self, user_id: UserId) -> AppResult<Option<PermissionCacheEntry>> {
        let mut connection = self.connection().await?;

        let current: Option<u64> = connection
            .get(self.version_key(user_id))
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to read permission cache version: {error}"))
            })?;
        let encoded: Option<String> =
            connection
                .get(self.entry_key(user_id))
                .await
                .map_err(|error| {
                    AppError::Internal(format!("failed to read permission cache entry: {error}"))
                })?;

        let Some(encoded) = encoded else {
            return Ok(None);
        };

        let entry: PermissionCacheEntry = match serde_json::from_str(&encoded) {
            Ok(entry) => entry,
            Err(error) => {
                // An unreadable entry is a miss, never a grant.
                tracing::warn!(user_id = %user_id, error = %error, "discarding undecodable permission cache entry");
                return Ok(None);
            }
        };

        if !entry.is_fresh_at(Utc::now()) || entry.version < current.unwrap_or(0) {
            return Ok(None);
        }

        Ok(Some(entry))
    }

    async fn current_version(&self, user_id: UserId) -> AppResult<u64> {
        let mut connection = self.connection().await?;
        let version: Option<u64> = connection
            .get(self.version_key(user_id))
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to read permission cache version: {error}"))
            })?;
        Ok(version.unwrap_or(0))
    }

    async fn set(
        &self,
        user_id: UserId,
        entry: PermissionCacheEntry,
        ttl: Duration,
    ) -> AppResult<()> {
        if ttl.is_zero() {
            return Ok(());
        }

        let mut connection = self.connection().await?;
        let encoded = serde_json::to_string(&entry).map_err(|error| {
            AppError::Internal(format!("failed to encode permission cache entry: {error}"))
        })?;

        let () = connection
            .set_ex(self.entry_key(user_id), encoded, ttl.as_secs().max(1))
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to store permission cache entry: {error}"))
            })?;

        Ok(())
    }

    async fn invalidate(&self, user_id: UserId) -> AppResult<u64> {
        let mut connection = self.connection().await?;

        let version: u64 = connection
            .incr(self.version_key(user_id), 1u64)
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to bump permission cache version: {error}"))
            })?;

        let () = connection
            .del(self.entry_key(user_id))
            .await
            .map_err(|error| {
                AppError::Internal(format!("failed to delete permission cache entry: {error}"))
            })?;

        Ok(version)
    }

    async fn cleanup_expired(&self, _now: DateTime<Utc>) -> AppResult<usize> {
        // Native key TTLs already expire entries.
        Ok(0)
    }
}
