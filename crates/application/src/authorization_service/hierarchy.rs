use fleetgrid_core::{AppResult, UserId};
use fleetgrid_domain::Action;

use crate::access_ports::AssignmentFilter;

use super::AuthorizationService;

/// Sentinel hierarchy level for a user with no valid role assignment.
pub const NO_ROLE_LEVEL: i32 = -1;

impl AuthorizationService {
    /// Answers whether a role may act on another role, from hierarchy
    /// levels alone.
    ///
    /// Mutating actions require the actor to sit strictly above the target;
    /// reading actions require greater-or-equal. Unknown role names resolve
    /// to `false`.
    pub async fn can_role_perform_action(
        &self,
        actor_role_name: &str,
        target_role_name: &str,
        action: Action,
    ) -> AppResult<bool> {
        let actor = self.store.find_role_by_name(actor_role_name).await?;
        let target = self.store.find_role_by_name(target_role_name).await?;

        let (Some(actor), Some(target)) = (actor, target) else {
            return Ok(false);
        };
        if !actor.is_active || !target.is_active {
            return Ok(false);
        }

        if action.is_mutating() {
            Ok(actor.hierarchy_level > target.hierarchy_level)
        } else {
            Ok(actor.hierarchy_level >= target.hierarchy_level)
        }
    }

    /// Returns the highest hierarchy level across the user's currently
    /// valid assignments, or [`NO_ROLE_LEVEL`] if there are none.
    pub async fn get_user_highest_role_level(&self, user_id: UserId) -> AppResult<i32> {
        let effective = self
            .compute_effective_permissions_with(
                user_id,
                AssignmentFilter::default(),
                super::CacheMode::Bypass,
            )
            .await?;

        Ok(effective.highest_hierarchy_level().unwrap_or(NO_ROLE_LEVEL))
    }
}
