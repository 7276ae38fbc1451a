use async_trait::async_trait;
use fleetgrid_application::{AccessStore, AssignmentFilter, AssignmentRecord, RolePermissionRecord};
use fleetgrid_core::{AppResult, RoleId, UserId};
use fleetgrid_domain::Role;
use sqlx::PgPool;

mod assignments;
mod permissions;
mod roles;

/// PostgreSQL-backed store for roles, permissions, and assignments.
#[derive(Clone)]
pub struct PostgresAccessStore {
    pool: PgPool,
}

impl PostgresAccessStore {
    /// Creates a store with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AccessStore for PostgresAccessStore {
    async fn find_active_assignments(
        &self,
        user_id: UserId,
        filter: AssignmentFilter,
    ) -> AppResult<Vec<AssignmentRecord>> {
        self.query_active_assignments(user_id, filter).await
    }

    async fn find_permissions_for_roles(
        &self,
        role_ids: &[RoleId],
    ) -> AppResult<Vec<RolePermissionRecord>> {
        self.query_permissions_for_roles(role_ids).await
    }

    async fn find_role_by_name(&self, name: &str) -> AppResult<Option<Role>> {
        self.query_role_by_name(name).await
    }
}
