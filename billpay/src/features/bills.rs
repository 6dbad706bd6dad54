//! Bill commands and queries.

use super::payees::fetch_payee;
use super::{MAX_NAME_LENGTH, check_path_id, invalid_operation, not_found, validate_amount, validate_name};
use crate::api::models::bills::{BillCreate, BillResponse, BillUpdate, ListBillsQuery};
use crate::api::models::pagination::PaginatedResponse;
use crate::api::models::users::CurrentUser;
use crate::db::context::{Database, PersistenceContext};
use crate::db::handlers::BillFilter;
use crate::db::models::Scope;
use crate::db::models::bills::{BillCreateDBRequest, BillDBResponse, BillStatus, BillUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::types::{BillId, PayeeId, abbrev_uuid};
use tracing::{debug, instrument};

/// Fetch a bill the scope can see
pub(crate) async fn fetch_bill<C: PersistenceContext>(ctx: &mut C, scope: &Scope, id: BillId) -> Result<Option<BillDBResponse>> {
    let bill = ctx.bills().get_by_id(id).await?;
    Ok(bill.filter(|b| scope.contains(b.tenant_id, b.user_id)))
}

/// A bill may only point at one of its owner's payees
async fn check_payee<C: PersistenceContext>(ctx: &mut C, owner: &Scope, payee_id: Option<PayeeId>) -> Result<()> {
    if let Some(payee_id) = payee_id
        && fetch_payee(ctx, owner, payee_id).await?.is_none()
    {
        return Err(invalid_operation(format!("Payee {payee_id} does not exist")));
    }
    Ok(())
}

#[instrument(skip(db, query), err)]
pub async fn list_bills<D: Database>(db: &D, scope: Scope, query: &ListBillsQuery) -> Result<PaginatedResponse<BillResponse>> {
    if let (Some(from), Some(to)) = (query.due_from, query.due_to)
        && from > to
    {
        return Err(Error::BadRequest {
            message: "due_from must not be after due_to".to_string(),
        });
    }

    let page = query.pagination.window();
    let filter = BillFilter {
        status: query.status,
        payee_id: query.payee_id,
        due_from: query.due_from,
        due_to: query.due_to,
        ..BillFilter::new(scope, page.skip, page.limit)
    };

    let mut ctx = db.begin().await?;
    let bills = ctx.bills().list(&filter).await?;
    let total_count = ctx.bills().count(&filter).await?;

    Ok(PaginatedResponse::from_rows(bills, total_count, page))
}

#[instrument(skip(db), fields(bill_id = %abbrev_uuid(&id)), err)]
pub async fn get_bill<D: Database>(db: &D, scope: Scope, id: BillId) -> Result<BillResponse> {
    let mut ctx = db.begin().await?;
    let bill = fetch_bill(&mut ctx, &scope, id).await?.ok_or_else(|| not_found("Bill", id))?;
    Ok(bill.into())
}

#[instrument(skip(db, owner, request), fields(user_id = %abbrev_uuid(&owner.id)), err)]
pub async fn create_bill<D: Database>(db: &D, owner: &CurrentUser, request: BillCreate) -> Result<BillResponse> {
    let name = validate_name("Bill name", &request.name, MAX_NAME_LENGTH)?;
    validate_amount(request.amount)?;

    let mut ctx = db.begin().await?;
    check_payee(&mut ctx, &Scope::owned_by(owner.tenant_id, owner.id), request.payee_id).await?;

    let bill = ctx
        .bills()
        .create(&BillCreateDBRequest {
            tenant_id: owner.tenant_id,
            user_id: owner.id,
            payee_id: request.payee_id,
            name,
            amount: request.amount,
            due_date: request.due_date,
            billing_frequency: request.billing_frequency,
            status: request.status.unwrap_or(BillStatus::Pending),
            notes: request.notes,
        })
        .await?;
    ctx.commit().await?;

    debug!("Created bill {} due {}", bill.id, bill.due_date);
    Ok(bill.into())
}

#[instrument(skip(db, request), fields(bill_id = %abbrev_uuid(&id)), err)]
pub async fn update_bill<D: Database>(db: &D, scope: Scope, id: BillId, request: BillUpdate) -> Result<BillResponse> {
    check_path_id(id, request.id)?;
    let name = validate_name("Bill name", &request.name, MAX_NAME_LENGTH)?;
    validate_amount(request.amount)?;

    let mut ctx = db.begin().await?;
    let existing = fetch_bill(&mut ctx, &scope, id).await?.ok_or_else(|| not_found("Bill", id))?;
    check_payee(&mut ctx, &Scope::owned_by(existing.tenant_id, existing.user_id), request.payee_id).await?;

    let bill = ctx
        .bills()
        .update(
            id,
            &BillUpdateDBRequest {
                payee_id: request.payee_id,
                name,
                amount: request.amount,
                due_date: request.due_date,
                billing_frequency: request.billing_frequency,
                status: request.status,
                notes: request.notes,
            },
        )
        .await?;
    ctx.commit().await?;

    Ok(bill.into())
}

/// Delete a bill together with its payments
#[instrument(skip(db), fields(bill_id = %abbrev_uuid(&id)), err)]
pub async fn delete_bill<D: Database>(db: &D, scope: Scope, id: BillId) -> Result<()> {
    let mut ctx = db.begin().await?;
    if fetch_bill(&mut ctx, &scope, id).await?.is_none() {
        return Err(not_found("Bill", id));
    }

    ctx.bills().delete(id).await?;
    ctx.commit().await?;
    Ok(())
}
