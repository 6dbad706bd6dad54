//! Database repository for bills.

use crate::db::{
    errors::{DbError, Result},
    handlers::{payees::push_scope, repository::Repository},
    models::{
        Scope,
        bills::{BillCreateDBRequest, BillDBResponse, BillStatus, BillUpdateDBRequest},
    },
};
use crate::types::{BillId, PayeeId, abbrev_uuid};
use chrono::{DateTime, Utc};
use sqlx::PgConnection;
use std::collections::HashMap;
use tracing::instrument;
use uuid::Uuid;

/// Filter for listing bills
#[derive(Debug, Clone)]
pub struct BillFilter {
    pub scope: Scope,
    pub status: Option<BillStatus>,
    pub payee_id: Option<PayeeId>,
    /// Inclusive lower bound on the due date
    pub due_from: Option<DateTime<Utc>>,
    /// Inclusive upper bound on the due date
    pub due_to: Option<DateTime<Utc>>,
    pub skip: i64,
    pub limit: i64,
}

impl BillFilter {
    pub fn new(scope: Scope, skip: i64, limit: i64) -> Self {
        Self {
            scope,
            status: None,
            payee_id: None,
            due_from: None,
            due_to: None,
            skip,
            limit,
        }
    }

    /// Whether a bill passes every criterion of this filter, scope included
    pub fn matches(&self, bill: &BillDBResponse) -> bool {
        self.scope.contains(bill.tenant_id, bill.user_id)
            && self.status.is_none_or(|s| s == bill.status)
            && self.payee_id.is_none_or(|p| bill.payee_id == Some(p))
            && self.due_from.is_none_or(|from| bill.due_date >= from)
            && self.due_to.is_none_or(|to| bill.due_date <= to)
    }
}

/// Bill queries beyond plain CRUD
#[async_trait::async_trait]
pub trait BillRepository:
    Repository<
        CreateRequest = BillCreateDBRequest,
        UpdateRequest = BillUpdateDBRequest,
        Response = BillDBResponse,
        Id = BillId,
        Filter = BillFilter,
    >
{
    /// Number of bills matching the filter, ignoring pagination
    async fn count(&mut self, filter: &BillFilter) -> Result<i64>;
}

const BILL_COLUMNS: &str =
    "id, tenant_id, user_id, payee_id, name, amount, due_date, billing_frequency, status, notes, created_at, updated_at";

pub struct Bills<'c> {
    db: &'c mut PgConnection,
}

impl<'c> Bills<'c> {
    pub fn new(db: &'c mut PgConnection) -> Self {
        Self { db }
    }

    fn push_filter(query: &mut sqlx::QueryBuilder<'_, sqlx::Postgres>, filter: &BillFilter) {
        push_scope(query, &filter.scope);

        if let Some(status) = filter.status {
            query.push(" AND status = ");
            query.push_bind(status);
        }
        if let Some(payee_id) = filter.payee_id {
            query.push(" AND payee_id = ");
            query.push_bind(payee_id);
        }
        if let Some(from) = filter.due_from {
            query.push(" AND due_date >= ");
            query.push_bind(from);
        }
        if let Some(to) = filter.due_to {
            query.push(" AND due_date <= ");
            query.push_bind(to);
        }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Bills<'c> {
    type CreateRequest = BillCreateDBRequest;
    type UpdateRequest = BillUpdateDBRequest;
    type Response = BillDBResponse;
    type Id = BillId;
    type Filter = BillFilter;

    #[instrument(skip(self, request), fields(name = %request.name), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let bill = sqlx::query_as::<_, BillDBResponse>(&format!(
            r#"
            INSERT INTO bills (id, tenant_id, user_id, payee_id, name, amount, due_date, billing_frequency, status, notes)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING {BILL_COLUMNS}
            "#
        ))
        .bind(Uuid::new_v4())
        .bind(request.tenant_id)
        .bind(request.user_id)
        .bind(request.payee_id)
        .bind(&request.name)
        .bind(request.amount)
        .bind(request.due_date)
        .bind(request.billing_frequency)
        .bind(request.status)
        .bind(&request.notes)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(bill)
    }

    #[instrument(skip(self), fields(bill_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let bill = sqlx::query_as::<_, BillDBResponse>(&format!("SELECT {BILL_COLUMNS} FROM bills WHERE id = $1"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(bill)
    }

    #[instrument(skip(self, ids), fields(count = ids.len()), err)]
    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let bills = sqlx::query_as::<_, BillDBResponse>(&format!("SELECT {BILL_COLUMNS} FROM bills WHERE id = ANY($1)"))
            .bind(ids.as_slice())
            .fetch_all(&mut *self.db)
            .await?;

        Ok(bills.into_iter().map(|b| (b.id, b)).collect())
    }

    #[instrument(skip(self, filter), fields(limit = filter.limit, skip = filter.skip), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut query = sqlx::QueryBuilder::new(format!("SELECT {BILL_COLUMNS} FROM bills WHERE 1=1"));
        Self::push_filter(&mut query, filter);

        // Soonest due first
        query.push(" ORDER BY due_date ASC, id LIMIT ");
        query.push_bind(filter.limit);
        query.push(" OFFSET ");
        query.push_bind(filter.skip);

        let bills = query.build_query_as::<BillDBResponse>().fetch_all(&mut *self.db).await?;
        Ok(bills)
    }

    #[instrument(skip(self), fields(bill_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM bills WHERE id = $1").bind(id).execute(&mut *self.db).await?;

        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, request), fields(bill_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let bill = sqlx::query_as::<_, BillDBResponse>(&format!(
            r#"
            UPDATE bills SET
                payee_id = $2,
                name = $3,
                amount = $4,
                due_date = $5,
                billing_frequency = $6,
                status = $7,
                notes = $8,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {BILL_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(request.payee_id)
        .bind(&request.name)
        .bind(request.amount)
        .bind(request.due_date)
        .bind(request.billing_frequency)
        .bind(request.status)
        .bind(&request.notes)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(bill)
    }
}

#[async_trait::async_trait]
impl<'c> BillRepository for Bills<'c> {
    #[instrument(skip(self, filter), err)]
    async fn count(&mut self, filter: &BillFilter) -> Result<i64> {
        let mut query = sqlx::QueryBuilder::new("SELECT COUNT(*) FROM bills WHERE 1=1");
        Self::push_filter(&mut query, filter);

        let count: (i64,) = query.build_query_as().fetch_one(&mut *self.db).await?;
        Ok(count.0)
    }
}

#[cfg(all(test, feature = "postgres-tests"))]
mod tests {
    use super::*;
    use crate::db::handlers::payees::Payees;
    use crate::db::models::bills::BillingFrequency;
    use crate::db::models::payees::PayeeCreateDBRequest;
    use crate::types::DEFAULT_TENANT_ID;
    use chrono::{Duration, TimeZone};
    use rust_decimal::Decimal;
    use sqlx::PgPool;

    fn new_bill(owner: Uuid, name: &str, due_in_days: i64) -> BillCreateDBRequest {
        BillCreateDBRequest {
            tenant_id: DEFAULT_TENANT_ID,
            user_id: owner,
            payee_id: None,
            name: name.to_string(),
            amount: Decimal::new(12_550, 2),
            due_date: Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap() + Duration::days(due_in_days),
            billing_frequency: BillingFrequency::Monthly,
            status: BillStatus::Pending,
            notes: None,
        }
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_bills_filters_and_orders_by_due_date(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let owner = Uuid::new_v4();
        let mut repo = Bills::new(&mut conn);

        repo.create(&new_bill(owner, "Rent", 10)).await.unwrap();
        repo.create(&new_bill(owner, "Internet", 2)).await.unwrap();
        let mut paid = new_bill(owner, "Phone", 5);
        paid.status = BillStatus::Paid;
        repo.create(&paid).await.unwrap();

        let scope = Scope::owned_by(DEFAULT_TENANT_ID, owner);
        let all = repo.list(&BillFilter::new(scope, 0, 10)).await.unwrap();
        assert_eq!(all.iter().map(|b| b.name.as_str()).collect::<Vec<_>>(), vec!["Internet", "Phone", "Rent"]);
        assert_eq!(all[0].amount, Decimal::new(12_550, 2));

        let mut pending = BillFilter::new(scope, 0, 10);
        pending.status = Some(BillStatus::Pending);
        assert_eq!(repo.count(&pending).await.unwrap(), 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_deleting_payee_detaches_bills(pool: PgPool) {
        let mut conn = pool.acquire().await.unwrap();
        let owner = Uuid::new_v4();
        let payee = Payees::new(&mut conn)
            .create(&PayeeCreateDBRequest {
                tenant_id: DEFAULT_TENANT_ID,
                user_id: owner,
                name: "Power Co".to_string(),
                account_number: None,
                website: None,
                phone_number: None,
                notes: None,
            })
            .await
            .unwrap();

        let mut request = new_bill(owner, "Electricity", 3);
        request.payee_id = Some(payee.id);
        let bill = Bills::new(&mut conn).create(&request).await.unwrap();
        assert_eq!(bill.payee_id, Some(payee.id));

        assert!(Payees::new(&mut conn).delete(payee.id).await.unwrap());
        let bill = Bills::new(&mut conn).get_by_id(bill.id).await.unwrap().unwrap();
        assert_eq!(bill.payee_id, None);
    }
}
