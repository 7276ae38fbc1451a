use fleetgrid_core::RoleId;
use serde::{Deserialize, Serialize};

/// Declarative capabilities attached to a role definition.
///
/// These replace role-name string comparisons in boundary checks: a future
/// role gains cross-organization reach by setting a flag, not by matching a
/// well-known name.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleCapabilities {
    /// Role may act across organization and team boundaries.
    pub cross_organization_access: bool,
    /// Role may touch global system settings. Implies nothing else; a role
    /// can be cross-organization without it.
    pub system_settings_access: bool,
}

impl RoleCapabilities {
    /// Capabilities of an unrestricted platform administrator.
    #[must_use]
    pub fn system_admin() -> Self {
        Self {
            cross_organization_access: true,
            system_settings_access: true,
        }
    }

    /// Capabilities of a support role that crosses organizations but may
    /// not touch system settings.
    #[must_use]
    pub fn cross_organization_support() -> Self {
        Self {
            cross_organization_access: true,
            system_settings_access: false,
        }
    }
}

/// Role definition with its hierarchy position and capabilities.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Stable role identifier.
    pub id: RoleId,
    /// Unique role name.
    pub name: String,
    /// Position in the role hierarchy; higher is more powerful.
    pub hierarchy_level: i32,
    /// Indicates a platform-managed role that administrators cannot edit.
    pub is_system_role: bool,
    /// Inactive roles contribute nothing to effective permissions.
    pub is_active: bool,
    /// Declarative boundary-bypass capabilities.
    pub capabilities: RoleCapabilities,
}

/// Lightweight role reference reported in decisions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleRef {
    /// Stable role identifier.
    pub role_id: RoleId,
    /// Role name at decision time.
    pub role_name: String,
}

#[cfg(test)]
mod tests {
    use super::RoleCapabilities;

    #[test]
    fn support_capabilities_exclude_system_settings() {
        let capabilities = RoleCapabilities::cross_organization_support();
        assert!(capabilities.cross_organization_access);
        assert!(!capabilities.system_settings_access);
    }

    #[test]
    fn default_capabilities_grant_nothing() {
        assert_eq!(
            RoleCapabilities::default(),
            RoleCapabilities {
                cross_organization_access: false,
                system_settings_access: false,
            }
        );
    }
}
