use chrono::{Duration as ChronoDuration, Utc};
use fleetgrid_core::{AppResult, UserId};
use fleetgrid_domain::{AssignedRole, EffectivePermissions};

use crate::access_ports::{AssignmentFilter, PermissionCacheEntry};

use super::AuthorizationService;

/// Controls whether a computation writes its result into the cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    /// Store the computed snapshot for subsequent checks.
    WriteThrough,
    /// Compute without touching the cache.
    Bypass,
}

impl AuthorizationService {
    /// Computes the deduplicated union of permissions reachable via the
    /// user's currently valid assignments, optionally narrowed by
    /// organization and team.
    ///
    /// A user with zero valid assignments yields an empty set, not an
    /// error. Unfiltered results are written through to the cache.
    pub async fn compute_effective_permissions(
        &self,
        user_id: UserId,
        filter: AssignmentFilter,
    ) -> AppResult<EffectivePermissions> {
        self.compute_effective_permissions_with(user_id, filter, CacheMode::WriteThrough)
            .await
    }

    /// Computes effective permissions with explicit cache behavior.
    pub async fn compute_effective_permissions_with(
        &self,
        user_id: UserId,
        filter: AssignmentFilter,
        cache_mode: CacheMode,
    ) -> AppResult<EffectivePermissions> {
        let now = Utc::now();

        // Narrowed computations are not representative of the full set and
        // must not overwrite the user's cache entry. For the rest, the
        // invalidation counter is observed before the store read: an
        // invalidation landing mid-computation leaves the snapshot stamped
        // behind the counter, and `get` discards it.
        let cache_version = if cache_mode == CacheMode::WriteThrough && filter.is_unfiltered() {
            match self.cache.current_version(user_id).await {
                Ok(version) => Some(version),
                Err(error) => {
                    tracing::warn!(user_id = %user_id, error = %error, "failed to read permission cache version, skipping write-through");
                    None
                }
            }
        } else {
            None
        };

        let records = self.store.find_active_assignments(user_id, filter).await?;

        let mut effective = EffectivePermissions::empty(user_id, now);
        let mut role_ids = Vec::new();
        for record in records {
            // Validity is enforced here as well, independent of store-side
            // filtering.
            if !record.assignment.contributes_at(now) || !record.role.is_active {
                continue;
            }

            if !role_ids.contains(&record.role.id) {
                role_ids.push(record.role.id);
            }
            effective.add_role(AssignedRole {
                role_id: record.role.id,
                role_name: record.role.name.clone(),
                hierarchy_level: record.role.hierarchy_level,
                capabilities: record.role.capabilities,
                organization_id: record.assignment.organization_id,
                team_id: record.assignment.team_id,
                region_id: record.assignment.region_id,
            });
        }

        if !role_ids.is_empty() {
            let grants = self.store.find_permissions_for_roles(&role_ids).await?;
            for grant in grants {
                if !grant.permission.is_active {
                    continue;
                }
                effective.add_permission(
                    grant.permission.resource,
                    grant.permission.action,
                    grant.permission.scope,
                    grant.permission.conditions,
                    grant.role_name.as_str(),
                );
            }
        }

        if let Some(version) = cache_version {
            self.cache_snapshot(user_id, &effective, version).await;
        }

        Ok(effective)
    }

    /// Returns the effective permission set for a check, preferring the
    /// cache. On a miss the set is recomputed and written through.
    pub(super) async fn effective_permissions_for_check(
        &self,
        user_id: UserId,
    ) -> AppResult<(EffectivePermissions, bool)> {
        match self.cache.get(user_id).await {
            Ok(Some(entry)) => {
                tracing::debug!(user_id = %user_id, version = entry.version, "permission cache hit");
                return Ok((entry.permissions, true));
            }
            Ok(None) => {}
            Err(error) => {
                // A broken cache read is a miss, never a grant or a failure.
                tracing::warn!(user_id = %user_id, error = %error, "permission cache read failed, recomputing");
            }
        }

        let effective = self
            .compute_effective_permissions_with(
                user_id,
                AssignmentFilter::default(),
                CacheMode::WriteThrough,
            )
            .await?;
        Ok((effective, false))
    }

    async fn cache_snapshot(&self, user_id: UserId, effective: &EffectivePermissions, version: u64) {
        let ttl = self.cache_ttl;
        let expires_at = effective.computed_at
            + ChronoDuration::from_std(ttl).unwrap_or_else(|_| ChronoDuration::minutes(15));
        let entry = PermissionCacheEntry {
            permissions: effective.clone(),
            computed_at: effective.computed_at,
            expires_at,
            version,
        };

        if let Err(error) = self.cache.set(user_id, entry, ttl).await {
            // Cache population is best-effort; the computed result stands.
            tracing::warn!(user_id = %user_id, error = %error, "failed to store permission cache entry");
        }
    }
}
