use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use fleetgrid_core::{AppResult, OrganizationId, RegionId, RoleId, TeamId, UserId};
use fleetgrid_domain::{
    EffectivePermissions, Permission, ReasonCode, Resource, Role, RoleAssignment, RoleRef,
};
use serde::{Deserialize, Serialize};

/// A valid assignment joined to its role definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentRecord {
    /// The assignment row.
    pub assignment: RoleAssignment,
    /// The role the assignment points at.
    pub role: Role,
}

/// An active permission row reachable through an active role grant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePermissionRecord {
    /// Role the permission is granted through.
    pub role_id: RoleId,
    /// Name of that role, for decision reporting.
    pub role_name: String,
    /// The permission row.
    pub permission: Permission,
}

/// Optional narrowing applied when resolving a user's assignments.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AssignmentFilter {
    /// Restrict to assignments in one organization.
    pub organization_id: Option<OrganizationId>,
    /// Restrict to assignments in one team.
    pub team_id: Option<TeamId>,
}

impl AssignmentFilter {
    /// Returns whether the filter narrows nothing.
    #[must_use]
    pub fn is_unfiltered(&self) -> bool {
        self.organization_id.is_none() && self.team_id.is_none()
    }
}

/// Request context supplied by the caller of an access check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessContext {
    /// Organization the request targets.
    pub organization_id: Option<OrganizationId>,
    /// Team the request targets.
    pub team_id: Option<TeamId>,
    /// Region the request targets.
    pub region_id: Option<RegionId>,
}

/// A concrete resource instance targeted by a contextual access check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    /// Resource kind of the instance.
    pub resource: Resource,
    /// Organization owning the instance, when known.
    pub organization_id: Option<OrganizationId>,
    /// Team owning the instance, when known.
    pub team_id: Option<TeamId>,
}

/// Outcome of an access check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    /// Whether access is permitted.
    pub allowed: bool,
    /// Machine-readable explanation for audit and enforcement.
    pub reason: ReasonCode,
    /// Roles that granted access, empty on denial.
    pub granted_by: Vec<RoleRef>,
    /// Whether the effective permission set came from the cache.
    pub cache_hit: bool,
    /// Wall-clock time spent evaluating the check.
    pub evaluation_time: Duration,
}

impl Decision {
    /// Builds a denial decision.
    #[must_use]
    pub fn denied(reason: ReasonCode, cache_hit: bool, evaluation_time: Duration) -> Self {
        Self {
            allowed: false,
            reason,
            granted_by: Vec::new(),
            cache_hit,
            evaluation_time,
        }
    }

    /// Builds a granting decision.
    #[must_use]
    pub fn granted(
        reason: ReasonCode,
        granted_by: Vec<RoleRef>,
        cache_hit: bool,
        evaluation_time: Duration,
    ) -> Self {
        Self {
            allowed: true,
            reason,
            granted_by,
            cache_hit,
            evaluation_time,
        }
    }
}

/// Cached effective-permission snapshot for one user.
///
/// `version` carries the user's monotonic invalidation counter as observed
/// before the snapshot's source data was read; an entry read back with a
/// version behind the counter is stale and must be discarded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionCacheEntry {
    /// The cached permission snapshot.
    pub permissions: EffectivePermissions,
    /// Snapshot computation time.
    pub computed_at: DateTime<Utc>,
    /// Entry expiry; the entry is usable only while `now < expires_at`.
    pub expires_at: DateTime<Utc>,
    /// Monotonic version, bumped on every invalidation.
    pub version: u64,
}

impl PermissionCacheEntry {
    /// Returns whether the entry is still usable at `now`.
    #[must_use]
    pub fn is_fresh_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}

/// Repository port over the role/permission/assignment store.
#[async_trait]
pub trait AccessStore: Send + Sync {
    /// Lists a user's active, unexpired assignments joined to their roles,
    /// optionally narrowed by organization and team.
    async fn find_active_assignments(
        &self,
        user_id: UserId,
        filter: AssignmentFilter,
    ) -> AppResult<Vec<AssignmentRecord>>;

    /// Lists active permission rows reachable through active grants on the
    /// given roles.
    async fn find_permissions_for_roles(
        &self,
        role_ids: &[RoleId],
    ) -> AppResult<Vec<RolePermissionRecord>>;

    /// Looks up a role definition by its unique name.
    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>>;
}

/// Cache port for computed effective-permission snapshots.
#[async_trait]
pub trait PermissionCache: Send + Sync {
    /// Returns the cached entry for a user, or `None` on a miss. Adapters
    /// must treat expired or stale-versioned entries as a miss.
    async fn get(&self, user_id: UserId) -> AppResult<Option<PermissionCacheEntry>>;

    /// Returns the user's current invalidation counter, `0` for a user that
    /// was never invalidated. Callers observe this before reading the data a
    /// snapshot is computed from and stamp the snapshot with it.
    async fn current_version(&self, user_id: UserId) -> AppResult<u64>;

    /// Stores an entry for a user with the given time-to-live. Last writer
    /// wins; the entry keeps the version the caller stamped.
    async fn set(
        &self,
        user_id: UserId,
        entry: PermissionCacheEntry,
        ttl: Duration,
    ) -> AppResult<()>;

    /// Drops the cached entry and bumps the user's version counter so no
    /// read started after this call can observe pre-invalidation data.
    /// Returns the bumped version.
    async fn invalidate(&self, user_id: UserId) -> AppResult<u64>;

    /// Removes entries past their expiry. Idempotent and safe to run
    /// concurrently with reads and writes. Returns the number removed.
    async fn cleanup_expired(&self, now: DateTime<Utc>) -> AppResult<usize>;
}
