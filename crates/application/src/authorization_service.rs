use std::sync::Arc;
use std::time::Duration;

use fleetgrid_domain::{AssignedRole, RoleRef};

use crate::access_ports::{AccessStore, PermissionCache};

mod check;
mod compute;
mod hierarchy;
mod maintenance;

pub use compute::CacheMode;
pub use hierarchy::NO_ROLE_LEVEL;

/// Default time-to-live for cached effective-permission snapshots.
const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(15 * 60);

/// Application service answering access-control questions for the web layer.
///
/// The single entry point for permission checks, contextual access checks,
/// effective-permission computation, and cache invalidation. Checks are
/// fail-secure: a store failure produces a denial, never an error and never
/// a default grant.
#[derive(Clone)]
pub struct AuthorizationService {
    store: Arc<dyn AccessStore>,
    cache: Arc<dyn PermissionCache>,
    cache_ttl: Duration,
}

impl AuthorizationService {
    /// Creates a service from store and cache implementations, with the
    /// default cache time-to-live.
    #[must_use]
    pub fn new(store: Arc<dyn AccessStore>, cache: Arc<dyn PermissionCache>) -> Self {
        Self {
            store,
            cache,
            cache_ttl: DEFAULT_CACHE_TTL,
        }
    }

    /// Overrides the cache time-to-live.
    #[must_use]
    pub fn with_cache_ttl(mut self, cache_ttl: Duration) -> Self {
        self.cache_ttl = cache_ttl;
        self
    }
}

fn role_refs(roles: &[&AssignedRole]) -> Vec<RoleRef> {
    let mut refs: Vec<RoleRef> = roles
        .iter()
        .map(|role| RoleRef {
            role_id: role.role_id,
            role_name: role.role_name.clone(),
        })
        .collect();
    refs.sort_by(|left, right| left.role_name.cmp(&right.role_name));
    refs.dedup();
    refs
}
