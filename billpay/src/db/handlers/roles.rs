//! Database repository for roles.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::roles::{RoleCreateDBRequest, RoleDBResponse, RoleUpdateDBRequest},
};
use crate::types::{RoleId, abbrev_uuid};
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

/// Roles form one global catalogue, so listing them takes no filter
#[derive(Debug, Clone, Copy, Default)]
pub struct RoleFilter;

/// Role queries beyond plain CRUD
#[async_trait::async_trait]
pub trait RoleRepository:
    Repository<
        CreateRequest = RoleCreateDBRequest,
        UpdateRequest = RoleUpdateDBRequest,
        Response = RoleDBResponse,
        Id = RoleId,
        Filter = RoleFilter,
    >
{
    /// Look a role up by name, ignoring case
    async fn get_by_name(&mut self, name: &str) -> Result<Option<RoleDBResponse>>;

    /// Whether another role (other than `except`) already uses this name, ignoring case
    async fn name_taken(&mut self, name: &str, except: Option<RoleId>) -> Result<bool>;
}

pub struct Roles<'c> {
    db: &'c mut sqlx::PgConnection,
}

impl<'c> Roles<'c> {
    pub fn new(db: &'c mut sqlx::PgConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Roles<'c> {
    type CreateRequest = RoleCreateDBRequest;
    type UpdateRequest = RoleUpdateDBRequest;
    type Response = RoleDBResponse;
    type Id = RoleId;
    type Filter = RoleFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let role = sqlx::query_as::<_, RoleDBResponse>(
            "INSERT INTO roles (id, tenant_id, name) VALUES ($1, $2, $3) RETURNING id, tenant_id, name, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(request.tenant_id)
        .bind(&request.name)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(role)
    }

    #[instrument(skip(self), fields(role_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let role = sqlx::query_as::<_, RoleDBResponse>("SELECT id, tenant_id, name, created_at FROM roles WHERE id = $1")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(role)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let roles = sqlx::query_as::<_, RoleDBResponse>("SELECT id, tenant_id, name, created_at FROM roles WHERE id = ANY($1)")
            .bind(ids.as_slice())
            .fetch_all(&mut *self.db)
            .await?;

        Ok(roles.into_iter().map(|r| (r.id, r)).collect())
    }

    #[instrument(skip_all, err)]
    async fn list(&mut self, _filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let roles = sqlx::query_as::<_, RoleDBResponse>("SELECT id, tenant_id, name, created_at FROM roles ORDER BY LOWER(name), id")
            .fetch_all(&mut *self.db)
            .await?;
        Ok(roles)
    }

    #[instrument(skip(self), fields(role_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM roles WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(role_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let role = sqlx::query_as::<_, RoleDBResponse>(
            "UPDATE roles SET name = $2 WHERE id = $1 RETURNING id, tenant_id, name, created_at",
        )
        .bind(id)
        .bind(&request.name)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(role)
    }
}

#[async_trait::async_trait]
impl<'c> RoleRepository for Roles<'c> {
    #[instrument(skip(self), err)]
    async fn get_by_name(&mut self, name: &str) -> Result<Option<RoleDBResponse>> {
        let role = sqlx::query_as::<_, RoleDBResponse>("SELECT id, tenant_id, name, created_at FROM roles WHERE LOWER(name) = LOWER($1)")
            .bind(name)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(role)
    }

    #[instrument(skip(self), err)]
    async fn name_taken(&mut self, name: &str, except: Option<RoleId>) -> Result<bool> {
        let taken: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM roles WHERE LOWER(name) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(name)
        .bind(except)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(taken.0)
    }
}

#[cfg(all(test, feature = "postgres-tests"))]
mod tests {
    use super::*;
    use crate::types::DEFAULT_TENANT_ID;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_and_rename_role(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Roles::new(&mut conn);

        let role = repo
            .create(&RoleCreateDBRequest {
                tenant_id: DEFAULT_TENANT_ID,
                name: "Auditor".to_string(),
            })
            .await
            .unwrap();
        assert!(repo.name_taken("auditor", None).await.unwrap());
        assert!(!repo.name_taken("auditor", Some(role.id)).await.unwrap());

        let renamed = repo
            .update(
                role.id,
                &RoleUpdateDBRequest {
                    name: "Reviewer".to_string(),
                },
            )
            .await
            .unwrap();
        assert_eq!(renamed.name, "Reviewer");
        assert_eq!(repo.get_by_name("REVIEWER").await.unwrap().map(|r| r.id), Some(role.id));
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_duplicate_role_name_is_unique_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Roles::new(&mut conn);
        let request = RoleCreateDBRequest {
            tenant_id: DEFAULT_TENANT_ID,
            name: "Auditor".to_string(),
        };

        repo.create(&request).await.unwrap();
        let err = repo.create(&request).await.unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
