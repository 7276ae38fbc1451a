use std::time::Instant;

use fleetgrid_core::UserId;
use fleetgrid_domain::{
    Action, AssignedRole, EffectivePermission, EffectivePermissions, PermissionScope, ReasonCode,
    Resource, RoleRef,
};

use crate::access_ports::{AccessContext, Decision, ResourceRef};

use super::{AuthorizationService, role_refs};

enum ScopeOutcome {
    Granted {
        reason: ReasonCode,
        granted_by: Vec<RoleRef>,
    },
    Denied(ReasonCode),
}

impl AuthorizationService {
    /// Decides whether the user may perform `action` on `resource` under
    /// the supplied request context.
    ///
    /// Fail-secure: any store failure is logged and reported as a denial.
    pub async fn check_permission(
        &self,
        user_id: UserId,
        resource: Resource,
        action: Action,
        context: AccessContext,
    ) -> Decision {
        let started = Instant::now();
        let (effective, cache_hit) = match self.effective_permissions_for_check(user_id).await {
            Ok(result) => result,
            Err(error) => {
                tracing::error!(
                    user_id = %user_id,
                    resource = resource.as_str(),
                    action = action.as_str(),
                    error = %error,
                    "access store failure during permission check",
                );
                return Decision::denied(ReasonCode::NoPermissions, false, started.elapsed());
            }
        };

        let decision = evaluate(&effective, resource, action, context, cache_hit, started);
        tracing::debug!(
            user_id = %user_id,
            resource = resource.as_str(),
            action = action.as_str(),
            allowed = decision.allowed,
            reason = decision.reason.as_str(),
            cache_hit = decision.cache_hit,
            evaluation_time_ms = decision.evaluation_time.as_millis() as u64,
            "permission check",
        );
        decision
    }

    /// Decides access against a concrete resource instance rather than a
    /// bare resource kind.
    ///
    /// Cross-organization-capable roles short-circuit to their bypass
    /// reason before any scope rule, independent of the target's
    /// organization or team. The one exception is system settings, which
    /// keep their capability lockout.
    pub async fn check_contextual_access(
        &self,
        user_id: UserId,
        resource_ref: ResourceRef,
        action: Action,
        context: AccessContext,
    ) -> Decision {
        let started = Instant::now();
        let (effective, cache_hit) = match self.effective_permissions_for_check(user_id).await {
            Ok(result) => result,
            Err(error) => {
                tracing::error!(
                    user_id = %user_id,
                    resource = resource_ref.resource.as_str(),
                    action = action.as_str(),
                    error = %error,
                    "access store failure during contextual access check",
                );
                return Decision::denied(ReasonCode::NoPermissions, false, started.elapsed());
            }
        };

        if effective.is_empty() {
            return Decision::denied(ReasonCode::NoPermissions, cache_hit, started.elapsed());
        }

        if resource_ref.resource != Resource::SystemSettings
            && let Some((reason, granted_by)) = capability_bypass(&effective)
        {
            return Decision::granted(reason, granted_by, cache_hit, started.elapsed());
        }

        // The target instance's own placement wins over the caller context.
        let merged = AccessContext {
            organization_id: resource_ref.organization_id.or(context.organization_id),
            team_id: resource_ref.team_id.or(context.team_id),
            region_id: context.region_id,
        };
        evaluate(
            &effective,
            resource_ref.resource,
            action,
            merged,
            cache_hit,
            started,
        )
    }
}

/// Applies match, override, and scope-boundary rules to an already resolved
/// permission set.
fn evaluate(
    effective: &EffectivePermissions,
    resource: Resource,
    action: Action,
    context: AccessContext,
    cache_hit: bool,
    started: Instant,
) -> Decision {
    if effective.is_empty() {
        return Decision::denied(ReasonCode::NoPermissions, cache_hit, started.elapsed());
    }

    let matched = effective.matching(resource, action);
    if matched.is_empty() {
        return Decision::denied(ReasonCode::NoPermission, cache_hit, started.elapsed());
    }

    // System settings are exempt from ordinary scope matching: only the
    // system-settings capability passes, whatever the matched rows say.
    if resource == Resource::SystemSettings {
        return match effective
            .roles
            .iter()
            .find(|role| role.capabilities.system_settings_access)
        {
            Some(role) => Decision::granted(
                ReasonCode::PermissionGranted,
                role_refs(&[role]),
                cache_hit,
                started.elapsed(),
            ),
            None => Decision::denied(
                ReasonCode::SystemSettingsAccessDenied,
                cache_hit,
                started.elapsed(),
            ),
        };
    }

    let mut denial: Option<ReasonCode> = None;
    for tuple in matched {
        match evaluate_scope(effective, tuple, context) {
            ScopeOutcome::Granted { reason, granted_by } => {
                return Decision::granted(reason, granted_by, cache_hit, started.elapsed());
            }
            ScopeOutcome::Denied(reason) => {
                denial = Some(prefer_denial(denial, reason));
            }
        }
    }

    Decision::denied(
        denial.unwrap_or(ReasonCode::ContextDenied),
        cache_hit,
        started.elapsed(),
    )
}

/// Keeps the most specific denial across matched tuples; a concrete scope
/// violation outranks the generic context denial.
fn prefer_denial(current: Option<ReasonCode>, new: ReasonCode) -> ReasonCode {
    match current {
        None | Some(ReasonCode::ContextDenied) => new,
        Some(existing) => existing,
    }
}

fn evaluate_scope(
    effective: &EffectivePermissions,
    tuple: &EffectivePermission,
    context: AccessContext,
) -> ScopeOutcome {
    match tuple.scope {
        PermissionScope::System => evaluate_system_scope(effective, tuple),
        PermissionScope::Organization => evaluate_organization_scope(effective, tuple, context),
        PermissionScope::Team => evaluate_team_scope(effective, tuple, context),
        PermissionScope::Region => evaluate_region_scope(effective, tuple, context),
        PermissionScope::User => evaluate_user_scope(effective, tuple),
    }
}

fn evaluate_system_scope(
    effective: &EffectivePermissions,
    tuple: &EffectivePermission,
) -> ScopeOutcome {
    let granting: Vec<&AssignedRole> = effective.assignments_for_roles(&tuple.granted_by).collect();
    ScopeOutcome::Granted {
        reason: ReasonCode::PermissionGranted,
        granted_by: role_refs(&granting),
    }
}

fn evaluate_organization_scope(
    effective: &EffectivePermissions,
    tuple: &EffectivePermission,
    context: AccessContext,
) -> ScopeOutcome {
    let granting: Vec<&AssignedRole> = effective.assignments_for_roles(&tuple.granted_by).collect();

    if let Some(organization_id) = context.organization_id {
        let in_organization: Vec<&AssignedRole> = granting
            .iter()
            .copied()
            .filter(|role| role.organization_id == organization_id)
            .collect();
        if !in_organization.is_empty() {
            return ScopeOutcome::Granted {
                reason: ReasonCode::PermissionGranted,
                granted_by: role_refs(&in_organization),
            };
        }
    }

    if let Some((reason, granted_by)) = capability_bypass(effective) {
        return ScopeOutcome::Granted { reason, granted_by };
    }

    if context.organization_id.is_some() {
        ScopeOutcome::Denied(ReasonCode::OrganizationScopeViolation)
    } else {
        ScopeOutcome::Denied(ReasonCode::ContextDenied)
    }
}

fn evaluate_team_scope(
    effective: &EffectivePermissions,
    tuple: &EffectivePermission,
    context: AccessContext,
) -> ScopeOutcome {
    let granting: Vec<&AssignedRole> = effective.assignments_for_roles(&tuple.granted_by).collect();

    if let Some(team_id) = context.team_id {
        // An assignment without team narrowing covers every team in its
        // organization, provided the context names that organization.
        let in_team: Vec<&AssignedRole> = granting
            .iter()
            .copied()
            .filter(|role| {
                role.team_id == Some(team_id)
                    || (role.team_id.is_none()
                        && context.organization_id == Some(role.organization_id))
            })
            .collect();
        if !in_team.is_empty() {
            return ScopeOutcome::Granted {
                reason: ReasonCode::PermissionGranted,
                granted_by: role_refs(&in_team),
            };
        }

        // Explicit cross-team grant: the tuple itself carries the
        // condition, and the target stays inside the granting
        // assignment's organization.
        if tuple.conditions.cross_team_access {
            let same_organization: Vec<&AssignedRole> = granting
                .iter()
                .copied()
                .filter(|role| context.organization_id == Some(role.organization_id))
                .collect();
            if !same_organization.is_empty() {
                return ScopeOutcome::Granted {
                    reason: ReasonCode::PermissionGranted,
                    granted_by: role_refs(&same_organization),
                };
            }
        }
    }

    if let Some((reason, granted_by)) = capability_bypass(effective) {
        return ScopeOutcome::Granted { reason, granted_by };
    }

    if context.team_id.is_some() {
        ScopeOutcome::Denied(ReasonCode::TeamScopeViolation)
    } else {
        ScopeOutcome::Denied(ReasonCode::ContextDenied)
    }
}

fn evaluate_region_scope(
    effective: &EffectivePermissions,
    tuple: &EffectivePermission,
    context: AccessContext,
) -> ScopeOutcome {
    let granting: Vec<&AssignedRole> = effective.assignments_for_roles(&tuple.granted_by).collect();

    if let Some(region_id) = context.region_id {
        let in_region: Vec<&AssignedRole> = granting
            .iter()
            .copied()
            .filter(|role| {
                role.region_id == Some(region_id)
                    || (role.region_id.is_none()
                        && context.organization_id == Some(role.organization_id))
            })
            .collect();
        if !in_region.is_empty() {
            return ScopeOutcome::Granted {
                reason: ReasonCode::PermissionGranted,
                granted_by: role_refs(&in_region),
            };
        }
    }

    if let Some((reason, granted_by)) = capability_bypass(effective) {
        return ScopeOutcome::Granted { reason, granted_by };
    }

    ScopeOutcome::Denied(ReasonCode::ContextDenied)
}

fn evaluate_user_scope(
    effective: &EffectivePermissions,
    tuple: &EffectivePermission,
) -> ScopeOutcome {
    // User-scoped tuples bind to the holding user, and every check is
    // already about that user.
    let granting: Vec<&AssignedRole> = effective.assignments_for_roles(&tuple.granted_by).collect();
    ScopeOutcome::Granted {
        reason: ReasonCode::PermissionGranted,
        granted_by: role_refs(&granting),
    }
}

/// Returns the bypass reason and role when the user holds a
/// cross-organization-capable role anywhere. The system-settings capability
/// reports the stronger reason.
fn capability_bypass(effective: &EffectivePermissions) -> Option<(ReasonCode, Vec<RoleRef>)> {
    effective.cross_organization_role().map(|role| {
        let reason = if role.capabilities.system_settings_access {
            ReasonCode::SystemAdminCrossTeamAccess
        } else {
            ReasonCode::NationalSupportAdminCrossTeamAccess
        };
        (reason, role_refs(&[role]))
    })
}
