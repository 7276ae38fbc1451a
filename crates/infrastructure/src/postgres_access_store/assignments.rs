use chrono::{DateTime, Utc};
use fleetgrid_application::{AssignmentFilter, AssignmentRecord};
use fleetgrid_core::{AppError, AppResult, OrganizationId, RegionId, RoleId, TeamId, UserId};
use fleetgrid_domain::{Role, RoleAssignment, RoleCapabilities};
use sqlx::FromRow;
use uuid::Uuid;

use super::PostgresAccessStore;

#[derive(Debug, FromRow)]
struct AssignmentRow {
    user_id: Uuid,
    role_id: Uuid,
    organization_id: Uuid,
    team_id: Option<Uuid>,
    region_id: Option<Uuid>,
    granted_by: Uuid,
    granted_at: DateTime<Utc>,
    expires_at: Option<DateTime<Utc>>,
    is_active: bool,
    context: serde_json::Value,
    role_name: String,
    hierarchy_level: i32,
    is_system_role: bool,
    role_is_active: bool,
    cross_organization_access: bool,
    system_settings_access: bool,
}

impl PostgresAccessStore {
    pub(super) async fn query_active_assignments(
        &self,
        user_id: UserId,
        filter: AssignmentFilter,
    ) -> AppResult<Vec<AssignmentRecord>> {
        let rows = sqlx::query_as::<_, AssignmentRow>(
            r#"
            SELECT assignments.user_id,
                assignments.role_id,
                assignments.organization_id,
                assignments.team_id,
                assignments.region_id,
                assignments.granted_by,
                assignments.granted_at,
                assignments.expires_at,
                assignments.is_active,
                assignments.context,
                roles.name AS role_name,
                roles.hierarchy_level,
                roles.is_system_role,
                roles.is_active AS role_is_active,
                roles.cross_organization_access,
                roles.system_settings_access
            FROM rbac_user_role_assignments AS assignments
            INNER JOIN rbac_roles AS roles
                ON roles.id = assignments.role_id
            WHERE assignments.user_id = $1
                AND assignments.is_active = TRUE
                AND (assignments.expires_at IS NULL OR assignments.expires_at > NOW())
                AND ($2::uuid IS NULL OR assignments.organization_id = $2)
                AND ($3::uuid IS NULL OR assignments.team_id = $3)
            "#,
        )
        .bind(user_id.as_uuid())
        .bind(filter.organization_id.map(|id| id.as_uuid()))
        .bind(filter.team_id.map(|id| id.as_uuid()))
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load assignments for user '{user_id}': {error}"
            ))
        })?;

        Ok(rows.into_iter().map(AssignmentRecord::from).collect())
    }
}

impl From<AssignmentRow> for AssignmentRecord {
    fn from(row: AssignmentRow) -> Self {
        let context = row
            .context
            .as_object()
            .cloned()
            .unwrap_or_default();

        Self {
            assignment: RoleAssignment {
                user_id: UserId::from_uuid(row.user_id),
                role_id: RoleId::from_uuid(row.role_id),
                organization_id: OrganizationId::from_uuid(row.organization_id),
                team_id: row.team_id.map(TeamId::from_uuid),
                region_id: row.region_id.map(RegionId::from_uuid),
                granted_by: UserId::from_uuid(row.granted_by),
                granted_at: row.granted_at,
                expires_at: row.expires_at,
                is_active: row.is_active,
                context,
            },
            role: Role {
                id: RoleId::from_uuid(row.role_id),
                name: row.role_name,
                hierarchy_level: row.hierarchy_level,
                is_system_role: row.is_system_role,
                is_active: row.role_is_active,
                capabilities: RoleCapabilities {
                    cross_organization_access: row.cross_organization_access,
                    system_settings_access: row.system_settings_access,
                },
            },
        }
    }
}
