use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use fleetgrid_core::{OrganizationId, RegionId, RoleId, TeamId, UserId};
use serde::{Deserialize, Serialize};

use crate::{Action, PermissionConditions, PermissionScope, Resource, RoleCapabilities};

/// One valid role assignment carried into an effective permission set,
/// with the role data needed for boundary and hierarchy decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssignedRole {
    /// Stable role identifier.
    pub role_id: RoleId,
    /// Role name at computation time.
    pub role_name: String,
    /// Role hierarchy level at computation time.
    pub hierarchy_level: i32,
    /// Role capabilities at computation time.
    pub capabilities: RoleCapabilities,
    /// Organization the assignment is scoped to.
    pub organization_id: OrganizationId,
    /// Optional team narrowing.
    pub team_id: Option<TeamId>,
    /// Optional region narrowing.
    pub region_id: Option<RegionId>,
}

/// A deduplicated (resource, action, scope) tuple with the roles granting it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePermission {
    /// Resource the tuple applies to.
    pub resource: Resource,
    /// Action the tuple grants.
    pub action: Action,
    /// Boundary at which the tuple applies.
    pub scope: PermissionScope,
    /// Union of conditions across every granting row.
    pub conditions: PermissionConditions,
    /// Names of the roles granting this tuple, sorted.
    pub granted_by: BTreeSet<String>,
}

/// Deduplicated union of all permissions reachable via a user's currently
/// valid assignments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectivePermissions {
    /// User the set was computed for.
    pub user_id: UserId,
    /// Valid assignments contributing to the set.
    pub roles: Vec<AssignedRole>,
    /// Deduplicated permission tuples.
    pub permissions: Vec<EffectivePermission>,
    /// Computation timestamp.
    pub computed_at: DateTime<Utc>,
}

impl EffectivePermissions {
    /// Creates an empty set for a user.
    #[must_use]
    pub fn empty(user_id: UserId, computed_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            roles: Vec::new(),
            permissions: Vec::new(),
            computed_at,
        }
    }

    /// Returns whether the user holds no permission at all.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.permissions.is_empty()
    }

    /// Records a contributing assignment.
    pub fn add_role(&mut self, role: AssignedRole) {
        self.roles.push(role);
    }

    /// Adds a permission tuple granted by `role_name`, merging it into an
    /// existing tuple with the same (resource, action, scope) value if one
    /// is already present.
    pub fn add_permission(
        &mut self,
        resource: Resource,
        action: Action,
        scope: PermissionScope,
        conditions: PermissionConditions,
        role_name: &str,
    ) {
        if let Some(existing) = self.permissions.iter_mut().find(|permission| {
            permission.resource == resource
                && permission.action == action
                && permission.scope == scope
        }) {
            existing.conditions = existing.conditions.union(conditions);
            existing.granted_by.insert(role_name.to_owned());
            return;
        }

        self.permissions.push(EffectivePermission {
            resource,
            action,
            scope,
            conditions,
            granted_by: BTreeSet::from([role_name.to_owned()]),
        });
    }

    /// Returns the tuples satisfying (resource, action), including MANAGE
    /// tuples on the same resource when the action is subsumed by MANAGE.
    #[must_use]
    pub fn matching(&self, resource: Resource, action: Action) -> Vec<&EffectivePermission> {
        self.permissions
            .iter()
            .filter(|permission| {
                permission.resource == resource
                    && (permission.action == action
                        || (permission.action == Action::Manage && action.subsumed_by_manage()))
            })
            .collect()
    }

    /// Returns the strongest cross-organization-capable assignment, if any.
    /// Assignments carrying the system-settings capability are preferred so
    /// the decision reports the stronger bypass reason.
    #[must_use]
    pub fn cross_organization_role(&self) -> Option<&AssignedRole> {
        self.roles
            .iter()
            .filter(|role| role.capabilities.cross_organization_access)
            .max_by_key(|role| role.capabilities.system_settings_access)
    }

    /// Returns the contributing assignments whose role grants `role_name`.
    #[must_use]
    pub fn assignments_for_roles<'a>(
        &'a self,
        granted_by: &'a BTreeSet<String>,
    ) -> impl Iterator<Item = &'a AssignedRole> {
        self.roles
            .iter()
            .filter(move |role| granted_by.contains(role.role_name.as_str()))
    }

    /// Returns the highest hierarchy level across contributing assignments.
    #[must_use]
    pub fn highest_hierarchy_level(&self) -> Option<i32> {
        self.roles.iter().map(|role| role.hierarchy_level).max()
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use fleetgrid_core::UserId;
    use proptest::prelude::*;

    use crate::{Action, PermissionConditions, PermissionScope, Resource};

    use super::EffectivePermissions;

    fn empty() -> EffectivePermissions {
        EffectivePermissions::empty(UserId::new(), Utc::now())
    }

    #[test]
    fn duplicate_tuples_merge_granting_roles() {
        let mut permissions = empty();
        permissions.add_permission(
            Resource::Teams,
            Action::Read,
            PermissionScope::Team,
            PermissionConditions::default(),
            "TEAM_MEMBER",
        );
        permissions.add_permission(
            Resource::Teams,
            Action::Read,
            PermissionScope::Team,
            PermissionConditions {
                cross_team_access: true,
            },
            "FIELD_SUPERVISOR",
        );

        assert_eq!(permissions.permissions.len(), 1);
        let tuple = &permissions.permissions[0];
        assert_eq!(tuple.granted_by.len(), 2);
        assert!(tuple.conditions.cross_team_access);
    }

    #[test]
    fn manage_tuple_matches_subsumed_actions() {
        let mut permissions = empty();
        permissions.add_permission(
            Resource::Devices,
            Action::Manage,
            PermissionScope::Organization,
            PermissionConditions::default(),
            "ORG_ADMIN",
        );

        assert_eq!(permissions.matching(Resource::Devices, Action::Read).len(), 1);
        assert_eq!(permissions.matching(Resource::Devices, Action::List).len(), 1);
        assert!(permissions.matching(Resource::Devices, Action::Execute).is_empty());
        assert!(permissions.matching(Resource::Teams, Action::Read).is_empty());
    }

    #[test]
    fn empty_set_reports_empty() {
        assert!(empty().is_empty());
    }

    fn arb_resource() -> impl Strategy<Value = Resource> {
        prop_oneof![
            Just(Resource::Teams),
            Just(Resource::Users),
            Just(Resource::Devices),
            Just(Resource::Telemetry),
        ]
    }

    fn arb_action() -> impl Strategy<Value = Action> {
        prop_oneof![
            Just(Action::Create),
            Just(Action::Read),
            Just(Action::Manage),
            Just(Action::Audit),
        ]
    }

    fn arb_scope() -> impl Strategy<Value = PermissionScope> {
        prop_oneof![
            Just(PermissionScope::System),
            Just(PermissionScope::Organization),
            Just(PermissionScope::Team),
        ]
    }

    proptest! {
        #[test]
        fn union_is_order_insensitive(
            mut rows in proptest::collection::vec(
                (arb_resource(), arb_action(), arb_scope(), any::<bool>(), "[A-Z_]{1,8}"),
                0..16,
            )
        ) {
            let user_id = UserId::new();
            let computed_at = Utc::now();

            let mut forward = EffectivePermissions::empty(user_id, computed_at);
            for (resource, action, scope, cross_team, role) in &rows {
                forward.add_permission(
                    *resource,
                    *action,
                    *scope,
                    PermissionConditions { cross_team_access: *cross_team },
                    role,
                );
            }

            rows.reverse();
            let mut backward = EffectivePermissions::empty(user_id, computed_at);
            for (resource, action, scope, cross_team, role) in &rows {
                backward.add_permission(
                    *resource,
                    *action,
                    *scope,
                    PermissionConditions { cross_team_access: *cross_team },
                    role,
                );
            }

            let mut forward_tuples = forward.permissions;
            let mut backward_tuples = backward.permissions;
            forward_tuples.sort_by_key(|p| (p.resource, p.action, p.scope));
            backward_tuples.sort_by_key(|p| (p.resource, p.action, p.scope));
            prop_assert_eq!(forward_tuples, backward_tuples);
        }

        #[test]
        fn dedup_never_yields_duplicate_keys(
            rows in proptest::collection::vec(
                (arb_resource(), arb_action(), arb_scope()),
                0..24,
            )
        ) {
            let mut permissions = EffectivePermissions::empty(UserId::new(), Utc::now());
            for (resource, action, scope) in &rows {
                permissions.add_permission(
                    *resource,
                    *action,
                    *scope,
                    PermissionConditions::default(),
                    "ROLE",
                );
            }

            let mut keys: Vec<_> = permissions
                .permissions
                .iter()
                .map(|p| (p.resource, p.action, p.scope))
                .collect();
            let total = keys.len();
            keys.sort();
            keys.dedup();
            prop_assert_eq!(keys.len(), total);
        }
    }
}
