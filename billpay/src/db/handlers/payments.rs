//! Database repository for payments.

use crate::db::{
    errors::{DbError, Result},
    handlers::{payees::push_scope, repository::Repository},
    models::{
        Scope,
        payments::{PaymentCreateDBRequest, PaymentDBResponse, PaymentUpdateDBRequest},
    },
};
use crate::types::{BillId, PaymentId, abbrev_uuid};
use sqlx::PgConnection;
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing payments
#[derive(Debug, Clone)]
pub struct PaymentFilter {
    pub scope: Scope,
    pub bill_id: Option<BillId>,
    pub skip: i64,
    pub limit: i64,
}

impl PaymentFilter {
    pub fn new(scope: Scope, skip: i64, limit: i64) -> Self {
        Self {
            scope,
            bill_id: None,
            skip,
            limit,
        }
    }

    pub fn matches(&self, payment: &PaymentDBResponse) -> bool {
        self.scope.contains(payment.tenant_id, payment.user_id) && self.bill_id.is_none_or(|b| b == payment.bill_id)
    }
}

/// Payment queries beyond plain CRUD
#[async_trait::async_trait]
pub trait PaymentRepository:
    Repository<
        CreateRequest = PaymentCreateDBRequest,
        UpdateRequest = PaymentUpdateDBRequest,
        Response = PaymentDBResponse,
        Id = PaymentId,
        Filter = PaymentFilter,
    >
{
    /// Number of payments matching the filter, ignoring pagination
    async fn count(&mut self, filter: &PaymentFilter) -> Result<i64>;
}

const PAYMENT_COLUMNS: &str =
    "id, tenant_id, user_id, bill_id, amount, payment_date, payment_method, confirmation_number, notes, created_at, updated_at";

pub struct Payments<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Payments<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    fn push_filter(query: &mut sqlx::QueryBuilder<'_, sqlx::Postgres>, filter: &PaymentFilter) {
        push_scope(query, &filter.scope);

        if let Some(bill_id) = filter.bill_id {
            query.push(" AND bill_id = ");
            query.push_bind(bill_id);
        }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Payments<'c> {
    type CreateRequest = PaymentCreateDBRequest;
    type UpdateRequest = PaymentUpdateDBRequest;
    type Response = PaymentDBResponse;
    type Id = PaymentId;
    type Filter = PaymentFilter;

    #[instrument(skip(self, request), fields(bill_id = %abbrev_uuid(&request.bill_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let payment = sqlx::query_as::<_, PaymentDBResponse>(&format!(
            r#"
            INSERT INTO payments (id, tenant_id, user_id, bill_id, amount, payment_date, payment_method, confirmation_number, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(request.tenant_id)
        .bind(request.user_id)
        .bind(request.bill_id)
        .bind(request.amount)
        .bind(request.payment_date)
        .bind(&request.payment_method)
        .bind(&request.confirmation_number)
        .bind(&request.notes)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(payment)
    }

    #[instrument(skip(self), fields(payment_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let payment = sqlx::query_as::<_, PaymentDBResponse>(&format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(payment)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let payments = sqlx::query_as::<_, PaymentDBResponse>(&format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE id = ANY($1)"))
            .bind(ids.as_slice())
            .fetch_all(&mut *self.db)
            .await?;

        Ok(payments.into_iter().map(|p| (p.id, p)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = sqlx::QueryBuilder::new(format!("SELECT {PAYMENT_COLUMNS} FROM payments WHERE 1=1"));
        Self::push_filter(&mut query, filter);

        // Most recent first
        query.push(" ORDER BY payment_date DESC, id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let payments = query.build_query_as::<PaymentDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(payments)
    }

    #[instrument(skip(self), fields(payment_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM payments WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(payment_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let payment = sqlx::query_as::<_, PaymentDBResponse>(&format!(
            r#"
            UPDATE payments SET
                tenant_id = $2,
                user_id = $3,
                bill_id = $4,
                amount = $5,
                payment_date = $6,
                payment_method = $7,
                confirmation_number = $8,
                notes = $9,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {PAYMENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.tenant_id)
        .bind(request.user_id)
        .bind(request.bill_id)
        .bind(request.amount)
        .bind(request.payment_date)
        .bind(&request.payment_method)
        .bind(&request.confirmation_number)
        .bind(&request.notes)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(payment)
    }
}

#[async_trait::async_trait]
impl<'c> PaymentRepository for Payments<'c> {
    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &PaymentFilter) -> Result<i64> {
        let mut query = sqlx::QueryBuilder::new("SELECT COUNT(*) FROM payments WHERE 1=1");
        Self::push_filter(&mut query, filter);

        let count: (i64,) = query.build_query_as().fetch_one(&mut *self.db).await?;
        Ok(count.0)
    }
}

#[cfg(all(test, feature = "postgres-tests"))]
mod tests {
    use super::*;
    use crate::db::handlers::bills::Bills;
    use crate::db::models::bills::{BillCreateDBRequest, BillStatus, BillingFrequency};
    use crate::types::DEFAULT_TENANT_ID;
    use chrono::Utc;
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_deleting_bill_removes_its_payments(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let owner = Uuid::new_v4();
        let bill = Bills::new(&mut conn)
            .create(&BillCreateDBRequest {
                tenant_id: DEFAULT_TENANT_ID,
                user_id: owner,
                payee_id: None,
                name: "Rent".to_string(),
                amount: Decimal::new(150_000, 2),
                due_date: Utc::now(),
                billing_frequency: BillingFrequency::Monthly,
                status: BillStatus::Scheduled,
                notes: None,
            })
            .await
            .unwrap();

        let mut repo = Payments::new(&mut conn);
        let payment = repo
            .create(&PaymentCreateDBRequest {
                tenant_id: DEFAULT_TENANT_ID,
                user_id: owner,
                bill_id: bill.id,
                amount: Decimal::new(150_000, 2),
                payment_date: Utc::now(),
                payment_method: Some("ach".to_string()),
                confirmation_number: None,
                notes: None,
            })
            .await
            .unwrap();

        let mut filter = PaymentFilter::new(Scope::owned_by(DEFAULT_TENANT_ID, owner), 0, 10);
        filter.bill_id = Some(bill.id);
        assert_eq!(repo.count(&filter).await.unwrap(), 1);

        assert!(Bills::new(&mut conn).delete(bill.id).await.unwrap());
        assert!(Payments::new(&mut conn).get_by_id(payment.id).await.unwrap().is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_payment_for_missing_bill_is_foreign_key_violation(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let err = Payments::new(&mut conn)
            .create(&PaymentCreateDBRequest {
                tenant_id: DEFAULT_TENANT_ID,
                user_id: Uuid::new_v4(),
                bill_id: Uuid::new_v4(),
                amount: Decimal::ONE,
                payment_date: Utc::now(),
                payment_method: None,
                confirmation_number: None,
                notes: None,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ForeignKeyViolation { .. }));
    }
}
