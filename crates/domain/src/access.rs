use std::str::FromStr;

use fleetgrid_core::AppError;
use serde::{Deserialize, Serialize};

/// Resource kinds protected by access checks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Resource {
    /// Team records and membership.
    Teams,
    /// User accounts.
    Users,
    /// Managed devices.
    Devices,
    /// Supervisor PIN material.
    SupervisorPins,
    /// Device telemetry streams.
    Telemetry,
    /// Device policy documents.
    Policy,
    /// Authentication configuration.
    Auth,
    /// Global system settings.
    SystemSettings,
    /// Audit log entries.
    AuditLogs,
    /// Support tickets.
    SupportTickets,
    /// Organization records.
    Organization,
    /// Project records.
    Projects,
}

impl Resource {
    /// Returns a stable storage value for this resource.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Teams => "TEAMS",
            Self::Users => "USERS",
            Self::Devices => "DEVICES",
            Self::SupervisorPins => "SUPERVISOR_PINS",
            Self::Telemetry => "TELEMETRY",
            Self::Policy => "POLICY",
            Self::Auth => "AUTH",
            Self::SystemSettings => "SYSTEM_SETTINGS",
            Self::AuditLogs => "AUDIT_LOGS",
            Self::SupportTickets => "SUPPORT_TICKETS",
            Self::Organization => "ORGANIZATION",
            Self::Projects => "PROJECTS",
        }
    }
}

impl FromStr for Resource {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "TEAMS" => Ok(Self::Teams),
            "USERS" => Ok(Self::Users),
            "DEVICES" => Ok(Self::Devices),
            "SUPERVISOR_PINS" => Ok(Self::SupervisorPins),
            "TELEMETRY" => Ok(Self::Telemetry),
            "POLICY" => Ok(Self::Policy),
            "AUTH" => Ok(Self::Auth),
            "SYSTEM_SETTINGS" => Ok(Self::SystemSettings),
            "AUDIT_LOGS" => Ok(Self::AuditLogs),
            "SUPPORT_TICKETS" => Ok(Self::SupportTickets),
            "ORGANIZATION" => Ok(Self::Organization),
            "PROJECTS" => Ok(Self::Projects),
            _ => Err(AppError::Validation(format!(
                "unknown resource value '{value}'"
            ))),
        }
    }
}

/// Actions a permission can grant on a resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Action {
    /// Create a new resource instance.
    Create,
    /// Read a single resource instance.
    Read,
    /// Update an existing resource instance.
    Update,
    /// Delete a resource instance.
    Delete,
    /// List resource instances.
    List,
    /// Full administrative control over the resource.
    Manage,
    /// Execute a command against the resource (device commands, jobs).
    Execute,
    /// Review audit trails for the resource.
    Audit,
}

impl Action {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Create => "CREATE",
            Self::Read => "READ",
            Self::Update => "UPDATE",
            Self::Delete => "DELETE",
            Self::List => "LIST",
            Self::Manage => "MANAGE",
            Self::Execute => "EXECUTE",
            Self::Audit => "AUDIT",
        }
    }

    /// Returns whether a MANAGE grant on the same resource also satisfies
    /// this action.
    ///
    /// MANAGE subsumes the CRUD actions and LIST. EXECUTE and AUDIT are
    /// deliberate, separately-granted capabilities and are never implied.
    #[must_use]
    pub fn subsumed_by_manage(&self) -> bool {
        matches!(
            self,
            Self::Create | Self::Read | Self::Update | Self::Delete | Self::List | Self::Manage
        )
    }

    /// Returns whether this action mutates state for role-hierarchy
    /// comparison purposes. Mutating actions require a strictly higher
    /// hierarchy level than the target; reading actions require
    /// greater-or-equal.
    #[must_use]
    pub fn is_mutating(&self) -> bool {
        matches!(
            self,
            Self::Create | Self::Update | Self::Delete | Self::Manage | Self::Execute
        )
    }
}

impl FromStr for Action {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "CREATE" => Ok(Self::Create),
            "READ" => Ok(Self::Read),
            "UPDATE" => Ok(Self::Update),
            "DELETE" => Ok(Self::Delete),
            "LIST" => Ok(Self::List),
            "MANAGE" => Ok(Self::Manage),
            "EXECUTE" => Ok(Self::Execute),
            "AUDIT" => Ok(Self::Audit),
            _ => Err(AppError::Validation(format!(
                "unknown action value '{value}'"
            ))),
        }
    }
}

/// Boundary at which a permission applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PermissionScope {
    /// Applies across every organization the deployment serves.
    System,
    /// Applies inside one organization.
    Organization,
    /// Applies inside one geographic region.
    Region,
    /// Applies inside one team.
    Team,
    /// Applies to the holding user only.
    User,
}

impl PermissionScope {
    /// Returns a stable storage value for this scope.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::System => "SYSTEM",
            Self::Organization => "ORGANIZATION",
            Self::Region => "REGION",
            Self::Team => "TEAM",
            Self::User => "USER",
        }
    }
}

impl FromStr for PermissionScope {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "SYSTEM" => Ok(Self::System),
            "ORGANIZATION" => Ok(Self::Organization),
            "REGION" => Ok(Self::Region),
            "TEAM" => Ok(Self::Team),
            "USER" => Ok(Self::User),
            _ => Err(AppError::Validation(format!(
                "unknown permission scope value '{value}'"
            ))),
        }
    }
}

/// Machine-readable explanation attached to every access decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReasonCode {
    /// A matching permission passed every boundary rule.
    PermissionGranted,
    /// The user holds no valid role assignment at all.
    NoPermissions,
    /// The user holds roles, but none grants the requested tuple.
    NoPermission,
    /// A team-scoped permission was used outside the granting team.
    TeamScopeViolation,
    /// An organization-scoped permission was used outside the granting
    /// organization.
    OrganizationScopeViolation,
    /// The request context failed a boundary rule not otherwise classified.
    ContextDenied,
    /// SYSTEM_SETTINGS is reserved for roles carrying the
    /// system-settings capability.
    SystemSettingsAccessDenied,
    /// Granted through a role with the system-settings capability, across
    /// organization and team boundaries.
    SystemAdminCrossTeamAccess,
    /// Granted through a role with the cross-organization capability,
    /// across organization and team boundaries.
    NationalSupportAdminCrossTeamAccess,
}

impl ReasonCode {
    /// Returns the stable wire value for this reason code.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PermissionGranted => "PERMISSION_GRANTED",
            Self::NoPermissions => "NO_PERMISSIONS",
            Self::NoPermission => "NO_PERMISSION",
            Self::TeamScopeViolation => "TEAM_SCOPE_VIOLATION",
            Self::OrganizationScopeViolation => "ORGANIZATION_SCOPE_VIOLATION",
            Self::ContextDenied => "CONTEXT_DENIED",
            Self::SystemSettingsAccessDenied => "SYSTEM_SETTINGS_ACCESS_DENIED",
            Self::SystemAdminCrossTeamAccess => "SYSTEM_ADMIN_CROSS_TEAM_ACCESS",
            Self::NationalSupportAdminCrossTeamAccess => {
                "NATIONAL_SUPPORT_ADMIN_CROSS_TEAM_ACCESS"
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::{Action, PermissionScope, ReasonCode, Resource};

    #[test]
    fn resource_roundtrip_storage_value() {
        let resource = Resource::SupervisorPins;
        let restored = Resource::from_str(resource.as_str());
        assert_eq!(restored.ok(), Some(resource));
    }

    #[test]
    fn unknown_resource_is_rejected() {
        assert!(Resource::from_str("WIDGETS").is_err());
    }

    #[test]
    fn action_roundtrip_storage_value() {
        let action = Action::Execute;
        let restored = Action::from_str(action.as_str());
        assert_eq!(restored.ok(), Some(action));
    }

    #[test]
    fn scope_roundtrip_storage_value() {
        let scope = PermissionScope::Region;
        let restored = PermissionScope::from_str(scope.as_str());
        assert_eq!(restored.ok(), Some(scope));
    }

    #[test]
    fn manage_subsumes_crud_and_list_only() {
        assert!(Action::Create.subsumed_by_manage());
        assert!(Action::Read.subsumed_by_manage());
        assert!(Action::Update.subsumed_by_manage());
        assert!(Action::Delete.subsumed_by_manage());
        assert!(Action::List.subsumed_by_manage());
        assert!(Action::Manage.subsumed_by_manage());
        assert!(!Action::Execute.subsumed_by_manage());
        assert!(!Action::Audit.subsumed_by_manage());
    }

    #[test]
    fn mutating_class_covers_writes_and_execute() {
        assert!(Action::Manage.is_mutating());
        assert!(Action::Execute.is_mutating());
        assert!(!Action::Read.is_mutating());
        assert!(!Action::List.is_mutating());
        assert!(!Action::Audit.is_mutating());
    }

    #[test]
    fn reason_codes_use_original_wire_values() {
        assert_eq!(ReasonCode::PermissionGranted.as_str(), "PERMISSION_GRANTED");
        assert_eq!(
            ReasonCode::NationalSupportAdminCrossTeamAccess.as_str(),
            "NATIONAL_SUPPORT_ADMIN_CROSS_TEAM_ACCESS"
        );
    }
}
