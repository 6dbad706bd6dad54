//! Database repository for users.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::{
        roles::RoleDBResponse,
        users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
    },
};
use crate::types::{RoleId, TenantId, UserId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgConnection};
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing users
#[derive(Debug, Clone)]
pub struct UserFilter {
    pub tenant_id: Option<TenantId>,
    pub skip: i64,
    pub limit: i64,
}

impl UserFilter {
    pub fn new(skip: i64, limit: i64) -> Self {
        Self {
            tenant_id: None,
            skip,
            limit,
        }
    }

    pub fn with_tenant(mut self, tenant_id: TenantId) -> Self {
        self.tenant_id = Some(tenant_id);
        self
    }
}

/// User queries beyond plain CRUD
#[async_trait::async_trait]
pub trait UserRepository:
    Repository<
        CreateRequest = UserCreateDBRequest,
        UpdateRequest = UserUpdateDBRequest,
        Response = UserDBResponse,
        Id = UserId,
        Filter = UserFilter,
    >
{
    /// Look a user up by username, ignoring case
    async fn get_by_username(&mut self, username: &str) -> Result<Option<UserDBResponse>>;

    /// Look a user up by email, ignoring case
    async fn get_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>>;

    /// Whether a user other than `except` already has this username
    async fn username_taken(&mut self, username: &str, except: Option<UserId>) -> Result<bool>;

    /// Whether a user other than `except` already has this email
    async fn email_taken(&mut self, email: &str, except: Option<UserId>) -> Result<bool>;

    /// Grant a role. Granting a role the user already holds is a no-op.
    async fn add_role(&mut self, user_id: UserId, role_id: RoleId) -> Result<()>;

    /// Revoke a role. Returns whether the user held it.
    async fn remove_role(&mut self, user_id: UserId, role_id: RoleId) -> Result<bool>;

    /// Number of users matching the filter, ignoring pagination
    async fn count(&mut self, filter: &UserFilter) -> Result<i64>;
}

#[derive(Debug, Clone, FromRow)]
struct User {
    id: UserId,
    tenant_id: TenantId,
    username: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow)]
struct UserRole {
    user_id: UserId,
    id: RoleId,
    tenant_id: TenantId,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<(Vec<RoleDBResponse>, User)> for UserDBResponse {
    fn from((roles, user): (Vec<RoleDBResponse>, User)) -> Self {
        Self {
            id: user.id,
            tenant_id: user.tenant_id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            roles,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

const USER_COLUMNS: &str = "id, tenant_id, username, email, password_hash, created_at, updated_at";

pub struct Users<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    /// Roles of every given user, keyed by user id
    async fn roles_for(&mut self, user_ids: &[UserId]) -> Result<HashMap<UserId, Vec<RoleDBResponse>>> {
        let rows = sqlx::query_as::<_, UserRole>(
            r#"
            SELECT ur.user_id, r.id, r.tenant_id, r.name, r.created_at
            FROM user_roles ur
            JOIN roles r ON r.id = ur.role_id
            WHERE ur.user_id = ANY($1)
            ORDER BY LOWER(r.name)
            "#,
        )
        .bind(user_ids)
        .fetch_all(&mut *self.db)
        .await?;

        let mut roles: HashMap<UserId, Vec<RoleDBResponse>> = HashMap::new();
        for row in rows {
            roles.entry(row.user_id).or_default().push(RoleDBResponse {
                id: row.id,
                tenant_id: row.tenant_id,
                name: row.name,
                created_at: row.created_at,
            });
        }
        Ok(roles)
    }

    async fn with_roles(&mut self, user: Option<User>) -> Result<Option<UserDBResponse>> {
        match user {
            Some(user) => {
                let roles = self.roles_for(&[user.id]).await?.remove(&user.id).unwrap_or_default();
                Ok(Some(UserDBResponse::from((roles, user))))
            }
            None => Ok(None),
        }
    }

    fn push_filter(query: &mut sqlx::QueryBuilder<'_, sqlx::Postgres>, filter: &UserFilter) {
        if let Some(tenant_id) = filter.tenant_id {
            query.push(" AND tenant_id = ");
            query.push_bind(tenant_id);
        }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Users<'c> {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    #[instrument(skip(self, request), fields(username = %request.username), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let user = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, tenant_id, username, email, password_hash) VALUES ($1, $2, $3, $4, $5) RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(request.tenant_id)
        .bind(&request.username)
        .bind(&request.email)
        .bind(&request.password_hash)
        .fetch_one(&mut *self.db)
        .await?;

        for role_id in &request.role_ids {
            self.add_role(user.id, *role_id).await?;
        }

        let roles = self.roles_for(&[user.id]).await?.remove(&user.id).unwrap_or_default();
        Ok(UserDBResponse::from((roles, user)))
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        self.with_roles(user).await
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let users = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = ANY($1)"))
            .bind(ids.as_slice())
            .fetch_all(&mut *self.db)
            .await?;

        let mut roles = self.roles_for(&ids).await?;
        Ok(users
            .into_iter()
            .map(|user| (user.id, UserDBResponse::from((roles.remove(&user.id).unwrap_or_default(), user))))
            .collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = sqlx::QueryBuilder::new(format!("SELECT {USER_COLUMNS} FROM users WHERE 1=1"));
        Self::push_filter(&mut query, filter);

        query.push(" ORDER BY LOWER(username) LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let users = query.build_query_as::<User>().fetch_all(&mut *self.db).await?;

        let ids: Vec<UserId> = users.iter().map(|u| u.id).collect();
        let mut roles = self.roles_for(&ids).await?;
        Ok(users
            .into_iter()
            .map(|user| UserDBResponse::from((roles.remove(&user.id).unwrap_or_default(), user)))
            .collect())
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users SET
                username = COALESCE($2, username),
                email = COALESCE($3, email),
                password_hash = COALESCE($4, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.username.as_deref())
        .bind(request.email.as_deref())
        .bind(request.password_hash.as_deref())
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        let roles = self.roles_for(&[user.id]).await?.remove(&user.id).unwrap_or_default();
        Ok(UserDBResponse::from((roles, user)))
    }
}

#[async_trait::async_trait]
impl<'c> UserRepository for Users<'c> {
    #[instrument(skip(self), err)]
    async fn get_by_username(&mut self, username: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(username) = LOWER($1)"))
            .bind(username)
            .fetch_optional(&mut *self.db)
            .await?;

        self.with_roles(user).await
    }

    #[instrument(skip(self, email), err)]
    async fn get_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, User>(&format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)"))
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?;

        self.with_roles(user).await
    }

    #[instrument(skip(self), err)]
    async fn username_taken(&mut self, username: &str, except: Option<UserId>) -> Result<bool> {
        let taken: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(username) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(username)
        .bind(except)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(taken.0)
    }

    #[instrument(skip(self, email), err)]
    async fn email_taken(&mut self, email: &str, except: Option<UserId>) -> Result<bool> {
        let taken: (bool,) = sqlx::query_as(
            "SELECT EXISTS(SELECT 1 FROM users WHERE LOWER(email) = LOWER($1) AND ($2::uuid IS NULL OR id <> $2))",
        )
        .bind(email)
        .bind(except)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(taken.0)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), role_id = %abbrev_uuid(&role_id)), err)]
    async fn add_role(&mut self, user_id: UserId, role_id: RoleId) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO user_roles (tenant_id, user_id, role_id)
            SELECT tenant_id, id, $2 FROM users WHERE id = $1
            ON CONFLICT (user_id, role_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(role_id)
        .execute(&mut *self.db)
        .await?;

        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&user_id), role_id = %abbrev_uuid(&role_id)), err)]
    async fn remove_role(&mut self, user_id: UserId, role_id: RoleId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM user_roles WHERE user_id = $1 AND role_id = $2")
            .bind(user_id)
            .bind(role_id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &UserFilter) -> Result<i64> {
        let mut query = sqlx::QueryBuilder::new("SELECT COUNT(*) FROM users WHERE 1=1");
        Self::push_filter(&mut query, filter);

        let count: (i64,) = query.build_query_as().fetch_one(&mut *self.db).await?;
        Ok(count.0)
    }
}

#[cfg(all(test, feature = "postgres-tests"))]
mod tests {
    use super::*;
    use crate::db::handlers::roles::Roles;
    use crate::db::models::roles::RoleCreateDBRequest;
    use crate::types::DEFAULT_TENANT_ID;
    use sqlx::PgPool;

    fn new_user(username: &str) -> UserCreateDBRequest {
        UserCreateDBRequest {
            tenant_id: DEFAULT_TENANT_ID,
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash: "hash".to_string(),
            role_ids: vec![],
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_create_user_with_roles(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let role = Roles::new(&mut conn)
            .create(&RoleCreateDBRequest {
                tenant_id: DEFAULT_TENANT_ID,
                name: "Auditor".to_string(),
            })
            .await
            .unwrap();

        let mut repo = Users::new(&mut conn);
        let mut request = new_user("alice");
        request.role_ids = vec![role.id];

        let user = repo.create(&request).await.unwrap();
        assert_eq!(user.username, "alice");
        assert_eq!(user.roles, vec![role]);

        let found = repo.get_by_email("ALICE@example.com").await.unwrap().unwrap();
        assert_eq!(found.id, user.id);
        assert!(repo.username_taken("Alice", None).await.unwrap());
        assert!(!repo.username_taken("alice", Some(user.id)).await.unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_add_role_is_idempotent(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let role = Roles::new(&mut conn)
            .create(&RoleCreateDBRequest {
                tenant_id: DEFAULT_TENANT_ID,
                name: "Auditor".to_string(),
            })
            .await
            .unwrap();

        let mut repo = Users::new(&mut conn);
        let user = repo.create(&new_user("bob")).await.unwrap();

        repo.add_role(user.id, role.id).await.unwrap();
        repo.add_role(user.id, role.id).await.unwrap();
        assert_eq!(repo.get_by_id(user.id).await.unwrap().unwrap().roles.len(), 1);

        assert!(repo.remove_role(user.id, role.id).await.unwrap());
        assert!(!repo.remove_role(user.id, role.id).await.unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_user_keeps_unset_fields(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let mut repo = Users::new(&mut conn);
        let user = repo.create(&new_user("carol")).await.unwrap();

        let updated = repo
            .update(
                user.id,
                &UserUpdateDBRequest {
                    email: Some("carol@new.example.com".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.username, "carol");
        assert_eq!(updated.email, "carol@new.example.com");
        assert_eq!(repo.count(&UserFilter::new(0, 10)).await.unwrap(), 1);
    }
}
