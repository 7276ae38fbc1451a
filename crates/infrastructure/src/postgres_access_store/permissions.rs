use std::str::FromStr;

use fleetgrid_application::RolePermissionRecord;
use fleetgrid_core::{AppError, AppResult, PermissionId, RoleId};
use fleetgrid_domain::{Action, Permission, PermissionConditions, PermissionScope, Resource};
use sqlx::FromRow;
use uuid::Uuid;

use super::PostgresAccessStore;

#[derive(Debug, FromRow)]
struct PermissionRow {
    role_id: Uuid,
    role_name: String,
    permission_id: Uuid,
    resource: String,
    action: String,
    scope: String,
    cross_team_access: bool,
    is_active: bool,
}

impl PostgresAccessStore {
    pub(super) async fn query_permissions_for_roles(
        &self,
        role_ids: &[RoleId],
    ) -> AppResult<Vec<RolePermissionRecord>> {
        let ids: Vec<Uuid> = role_ids.iter().map(|role_id| role_id.as_uuid()).collect();

        let rows = sqlx::query_as::<_, PermissionRow>(
            r#"
            SELECT DISTINCT grants.role_id,
                roles.name AS role_name,
                permissions.id AS permission_id,
                permissions.resource,
                permissions.action,
                permissions.scope,
                permissions.cross_team_access,
                permissions.is_active
            FROM rbac_role_grants AS grants
            INNER JOIN rbac_roles AS roles
                ON roles.id = grants.role_id
            INNER JOIN rbac_permissions AS permissions
                ON permissions.id = grants.permission_id
            WHERE grants.role_id = ANY($1)
                AND grants.is_active = TRUE
                AND permissions.is_active = TRUE
            "#,
        )
        .bind(&ids)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role permissions: {error}")))?;

        rows.into_iter().map(RolePermissionRecord::try_from).collect()
    }
}

impl TryFrom<PermissionRow> for RolePermissionRecord {
    type Error = AppError;

    fn try_from(row: PermissionRow) -> Result<Self, Self::Error> {
        let decode = |kind: &str, value: &str, error: AppError| {
            AppError::Internal(format!(
                "failed to decode {kind} '{value}' for role '{}': {error}",
                row.role_name
            ))
        };

        let resource = Resource::from_str(row.resource.as_str())
            .map_err(|error| decode("resource", row.resource.as_str(), error))?;
        let action = Action::from_str(row.action.as_str())
            .map_err(|error| decode("action", row.action.as_str(), error))?;
        let scope = PermissionScope::from_str(row.scope.as_str())
            .map_err(|error| decode("scope", row.scope.as_str(), error))?;

        Ok(Self {
            role_id: RoleId::from_uuid(row.role_id),
            role_name: row.role_name,
            permission: Permission {
                id: PermissionId::from_uuid(row.permission_id),
                resource,
                action,
                scope,
                conditions: PermissionConditions {
                    cross_team_access: row.cross_team_access,
                },
                is_active: row.is_active,
            },
        })
    }
}
