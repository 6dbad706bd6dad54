//! Database repository for payees.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::{
        Scope,
        payees::{PayeeCreateDBRequest, PayeeDBResponse, PayeeUpdateDBRequest},
    },
};
use crate::types::{PayeeId, abbrev_uuid};
use sqlx::PgConnection;
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing payees
#[derive(Debug, Clone)]
pub struct PayeeFilter {
    pub scope: Scope,
    pub skip: i64,
    pub limit: i64,
}

impl PayeeFilter {
    pub fn new(scope: Scope, skip: i64, limit: i64) -> Self {
        Self { scope, skip, limit }
    }
}

/// Payee queries beyond plain CRUD
#[async_trait::async_trait]
pub trait PayeeRepository:
    Repository<
        CreateRequest = PayeeCreateDBRequest,
        UpdateRequest = PayeeUpdateDBRequest,
        Response = PayeeDBResponse,
        Id = PayeeId,
        Filter = PayeeFilter,
    >
{
    /// Whether a payee other than `except` within the scope already uses this name, ignoring case
    async fn name_taken(&mut self, scope: &Scope, name: &str, except: Option<PayeeId>) -> Result<bool>;

    /// Number of payees matching the filter, ignoring pagination
    async fn count(&mut self, filter: &PayeeFilter) -> Result<i64>;
}

const PAYEE_COLUMNS: &str = "id, tenant_id, user_id, name, account_number, website, phone_number, notes, created_at, updated_at";

pub struct Payees<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Payees<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }
}

/// Restrict a query to the rows a scope can see
pub(crate) fn push_scope(query: &mut sqlx::QueryBuilder<'_, sqlx::Postgres>, scope: &Scope) {
    query.push(" AND tenant_id = ");
    query.push_bind(scope.tenant_id);
    if let Some(owner) = scope.owner {
        query.push(" AND user_id = ");
        query.push_bind(owner);
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Payees<'c> {
    type CreateRequest = PayeeCreateDBRequest;
    type UpdateRequest = PayeeUpdateDBRequest;
    type Response = PayeeDBResponse;
    type Id = PayeeId;
    type Filter = PayeeFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let payee = sqlx::query_as::<_, PayeeDBResponse>(&format!(
            r#"
            INSERT INTO payees (id, tenant_id, user_id, name, account_number, website, phone_number, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PAYEE_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(request.tenant_id)
        .bind(request.user_id)
        .bind(&request.name)
        .bind(&request.account_number)
        .bind(&request.website)
        .bind(&request.phone_number)
        .bind(&request.notes)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(payee)
    }

    #[instrument(skip(self), fields(payee_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let payee = sqlx::query_as::<_, PayeeDBResponse>(&format!("SELECT {PAYEE_COLUMNS} FROM payees WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(payee)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let payees = sqlx::query_as::<_, PayeeDBResponse>(&format!("SELECT {PAYEE_COLUMNS} FROM payees WHERE id = ANY($1)"))
            .bind(ids.as_slice())
            .fetch_all(&mut *self.db)
            .await?;

        Ok(payees.into_iter().map(|p| (p.id, p)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = sqlx::QueryBuilder::new(format!("SELECT {PAYEE_COLUMNS} FROM payees WHERE 1=1"));
        push_scope(&mut query, &filter.scope);

        query.push(" ORDER BY LOWER(name), id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let payees = query.build_query_as::<PayeeDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(payees)
    }

    #[instrument(skip(self), fields(payee_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM payees WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(payee_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let payee = sqlx::query_as::<_, PayeeDBResponse>(&format!(
            r#"
            UPDATE payees SET
                name = $2,
                account_number = $3,
                website = $4,
                phone_number = $5,
                notes = $6,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PAYEE_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&request.name)
        .bind(&request.account_number)
        .bind(&request.website)
        .bind(&request.phone_number)
        .bind(&request.notes)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(payee)
    }
}

#[async_trait::async_trait]
impl<'c> PayeeRepository for Payees<'c> {
    #[instrument(skip(self, scope), err)]
    async fn name_taken(&mut self, scope: &Scope, name: &str, except: Option<PayeeId>) -> Result<bool> {
        let mut query = sqlx::QueryBuilder::new("SELECT EXISTS(SELECT 1 FROM payees WHERE LOWER(name) = LOWER(");
        query.push_bind(name.to_string());
        query.push(")");
        push_scope(&mut query, scope);
        if let Some(except) = except {
            query.push(" AND id <> ");
            query.push_bind(except);
        }
        query.push(")");

        let taken: (bool,) = query.build_query_as().fetch_one(&mut *self.db).await?;
        Ok(taken.0)
    }

    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &PayeeFilter) -> Result<i64> {
        let mut query = sqlx::QueryBuilder::new("SELECT COUNT(*) FROM payees WHERE 1=1");
        push_scope(&mut query, &filter.scope);

        let count: (i64,) = query.build_query_as().fetch_one(&mut *self.db).await?;
        Ok(count.0)
    }
}
