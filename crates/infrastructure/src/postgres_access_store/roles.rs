use fleetgrid_core::{AppError, AppResult, RoleId};
use fleetgrid_domain::{Role, RoleCapabilities};
use sqlx::FromRow;
use uuid::Uuid;

use super::PostgresAccessStore;

#[derive(Debug, FromRow)]
struct RoleRow {
    id: Uuid,
    name: String,
    hierarchy_level: i32,
    is_system_role: bool,
    is_active: bool,
    cross_organization_access: bool,
    system_settings_access: bool,
}

impl PostgresAccessStore {
    pub(super) async fn query_role_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        let row = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id,
                name,
                hierarchy_level,
                is_system_role,
                is_active,
                cross_organization_access,
                system_settings_access
            FROM rbac_roles
            WHERE name = $1
            "#,
        )
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load role '{name}': {error}")))?;

        Ok(row.map(|row| Role {
            id: RoleId::from_uuid(row.id),
            name: row.name,
            hierarchy_level: row.hierarchy_level,
            is_system_role: row.is_system_role,
            is_active: row.is_active,
            capabilities: RoleCapabilities {
                cross_organization_access: row.cross_organization_access,
                system_settings_access: row.system_settings_access,
            },
        }))
    }
}
