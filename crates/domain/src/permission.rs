use chrono::{DateTime, Utc};
use fleetgrid_core::{PermissionId, RoleId, UserId};
use serde::{Deserialize, Serialize};

use crate::{Action, PermissionScope, Resource};

/// Structured conditions attached to a permission row.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionConditions {
    /// Team-scoped grant also applies to other teams inside the granting
    /// assignment's organization. This is how field-supervisor roles read
    /// sibling teams; it is a property of the granted row, not of the role
    /// name.
    pub cross_team_access: bool,
}

impl PermissionConditions {
    /// Merges two condition sets; a condition holds if either side grants it.
    #[must_use]
    pub fn union(self, other: Self) -> Self {
        Self {
            cross_team_access: self.cross_team_access || other.cross_team_access,
        }
    }
}

/// A (resource, action, scope) capability row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Permission {
    /// Stable permission identifier.
    pub id: PermissionId,
    /// Resource the permission applies to.
    pub resource: Resource,
    /// Action the permission grants.
    pub action: Action,
    /// Boundary at which the grant applies.
    pub scope: PermissionScope,
    /// Structured conditions narrowing or widening the grant.
    pub conditions: PermissionConditions,
    /// Inactive rows contribute nothing to effective permissions.
    pub is_active: bool,
}

/// Link row attaching a permission to a role.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleGrant {
    /// Role the permission is attached to.
    pub role_id: RoleId,
    /// Attached permission.
    pub permission_id: PermissionId,
    /// Inactive links are ignored during resolution.
    pub is_active: bool,
    /// Administrator who created the link; audit only.
    pub granted_by: UserId,
    /// Link creation time; audit only.
    pub granted_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::PermissionConditions;

    #[test]
    fn condition_union_keeps_either_grant() {
        let cross_team = PermissionConditions {
            cross_team_access: true,
        };
        let plain = PermissionConditions::default();
        assert!(cross_team.union(plain).cross_team_access);
        assert!(plain.union(cross_team).cross_team_access);
        assert!(!plain.union(plain).cross_team_access);
    }
}
