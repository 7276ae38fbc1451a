use chrono::{DateTime, Utc};
use fleetgrid_core::{OrganizationId, RegionId, RoleId, TeamId, UserId};
use serde::{Deserialize, Serialize};

/// Binding of a user to a role within an organization, optionally narrowed
/// to a team and/or region, optionally time-bounded.
///
/// A user may hold any number of simultaneous assignments across roles and
/// scopes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleAssignment {
    /// User holding the role.
    pub user_id: UserId,
    /// Assigned role.
    pub role_id: RoleId,
    /// Organization the assignment is scoped to.
    pub organization_id: OrganizationId,
    /// Optional team narrowing.
    pub team_id: Option<TeamId>,
    /// Optional region narrowing.
    pub region_id: Option<RegionId>,
    /// Administrator who created the assignment; audit only.
    pub granted_by: UserId,
    /// Assignment creation time; audit only.
    pub granted_at: DateTime<Utc>,
    /// Optional expiry; `None` means open-ended.
    pub expires_at: Option<DateTime<Utc>>,
    /// Deactivated assignments contribute nothing regardless of expiry.
    pub is_active: bool,
    /// Free-form context captured at grant time.
    pub context: serde_json::Map<String, serde_json::Value>,
}

impl RoleAssignment {
    /// Returns whether the assignment contributes to effective permissions
    /// at `now`: it must be active and not yet expired.
    #[must_use]
    pub fn contributes_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expires_at.is_none_or(|expires_at| expires_at > now)
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, Utc};
    use fleetgrid_core::{OrganizationId, RoleId, UserId};

    use super::RoleAssignment;

    fn assignment() -> RoleAssignment {
        RoleAssignment {
            user_id: UserId::new(),
            role_id: RoleId::new(),
            organization_id: OrganizationId::new(),
            team_id: None,
            region_id: None,
            granted_by: UserId::new(),
            granted_at: Utc::now(),
            expires_at: None,
            is_active: true,
            context: serde_json::Map::new(),
        }
    }

    #[test]
    fn open_ended_active_assignment_contributes() {
        assert!(assignment().contributes_at(Utc::now()));
    }

    #[test]
    fn expired_assignment_never_contributes_even_if_active() {
        let mut expired = assignment();
        expired.expires_at = Some(Utc::now() - Duration::minutes(1));
        assert!(expired.is_active);
        assert!(!expired.contributes_at(Utc::now()));
    }

    #[test]
    fn inactive_assignment_never_contributes_even_if_unexpired() {
        let mut inactive = assignment();
        inactive.is_active = false;
        inactive.expires_at = Some(Utc::now() + Duration::hours(1));
        assert!(!inactive.contributes_at(Utc::now()));
    }

    #[test]
    fn expiry_boundary_is_exclusive() {
        let now = Utc::now();
        let mut boundary = assignment();
        boundary.expires_at = Some(now);
        assert!(!boundary.contributes_at(now));
    }
}
