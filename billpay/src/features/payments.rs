//! Payment commands and queries.
//!
//! A payment belongs to whoever owns the bill it pays, so an admin recording a payment on a
//! user's bill does not take that payment over.

use super::bills::fetch_bill;
use super::{check_path_id, invalid_operation, not_found, validate_amount};
use crate::api::models::pagination::PaginatedResponse;
use crate::api::models::payments::{ListPaymentsQuery, PaymentCreate, PaymentResponse, PaymentUpdate};
use crate::db::context::{Database, PersistenceContext};
use crate::db::handlers::PaymentFilter;
use crate::db::models::Scope;
use crate::db::models::bills::BillDBResponse;
use crate::db::models::payments::{PaymentCreateDBRequest, PaymentDBResponse, PaymentUpdateDBRequest};
use crate::errors::Result;
use crate::types::{BillId, PaymentId, abbrev_uuid};
use tracing::{debug, instrument};

async fn fetch_payment<C: PersistenceContext>(ctx: &mut C, scope: &Scope, id: PaymentId) -> Result<Option<PaymentDBResponse>> {
    let payment = ctx.payments().get_by_id(id).await?;
    Ok(payment.filter(|p| scope.contains(p.tenant_id, p.user_id)))
}

async fn bill_to_pay<C: PersistenceContext>(ctx: &mut C, scope: &Scope, bill_id: BillId) -> Result<BillDBResponse> {
    fetch_bill(ctx, scope, bill_id)
        .await?
        .ok_or_else(|| invalid_operation(format!("Bill {bill_id} does not exist")))
}

#[instrument(skip(db, query), err)]
pub async fn list_payments<D: Database>(db: &D, scope: Scope, query: &ListPaymentsQuery) -> Result<PaginatedResponse<PaymentResponse>> {
    let page = query.pagination.window();
    let filter = PaymentFilter {
        bill_id: query.bill_id,
        ..PaymentFilter::new(scope, page.skip, page.limit)
    };

    let mut ctx = db.begin().await?;
    let payments = ctx.payments().list(&filter).await?;
    let total_count = ctx.payments().count(&filter).await?;

    Ok(PaginatedResponse::from_rows(payments, total_count, page))
}

#[instrument(skip(db), fields(payment_id = %abbrev_uuid(&id)), err)]
pub async fn get_payment<D: Database>(db: &D, scope: Scope, id: PaymentId) -> Result<PaymentResponse> {
    let mut ctx = db.begin().await?;
    let payment = fetch_payment(&mut ctx, &scope, id).await?.ok_or_else(|| not_found("Payment", id))?;
    Ok(payment.into())
}

#[instrument(skip(db, request), fields(bill_id = %abbrev_uuid(&request.bill_id)), err)]
pub async fn create_payment<D: Database>(db: &D, scope: Scope, request: PaymentCreate) -> Result<PaymentResponse> {
    validate_amount(request.amount)?;

    let mut ctx = db.begin().await?;
    let bill = bill_to_pay(&mut ctx, &scope, request.bill_id).await?;

    let payment = ctx
        .payments()
        .create(&PaymentCreateDBRequest {
            tenant_id: bill.tenant_id,
            user_id: bill.user_id,
            bill_id: bill.id,
            amount: request.amount,
            payment_date: request.payment_date,
            payment_method: request.payment_method,
            confirmation_number: request.confirmation_number,
            notes: request.notes,
        })
        .await?;
    ctx.commit().await?;

    debug!("Recorded payment {} of {} against bill {}", payment.id, payment.amount, bill.id);
    Ok(payment.into())
}

#[instrument(skip(db, request), fields(payment_id = %abbrev_uuid(&id)), err)]
pub async fn update_payment<D: Database>(db: &D, scope: Scope, id: PaymentId, request: PaymentUpdate) -> Result<PaymentResponse> {
    check_path_id(id, request.id)?;
    validate_amount(request.amount)?;

    let mut ctx = db.begin().await?;
    if fetch_payment(&mut ctx, &scope, id).await?.is_none() {
        return Err(not_found("Payment", id));
    }
    let bill = bill_to_pay(&mut ctx, &scope, request.bill_id).await?;

    let payment = ctx
        .payments()
        .update(
            id,
            &PaymentUpdateDBRequest {
                tenant_id: bill.tenant_id,
                user_id: bill.user_id,
                bill_id: bill.id,
                amount: request.amount,
                payment_date: request.payment_date,
                payment_method: request.payment_method,
                confirmation_number: request.confirmation_number,
                notes: request.notes,
            },
        )
        .await?;
    ctx.commit().await?;

    Ok(payment.into())
}

#[instrument(skip(db), fields(payment_id = %abbrev_uuid(&id)), err)]
pub async fn delete_payment<D: Database>(db: &D, scope: Scope, id: PaymentId) -> Result<()> {
    let mut ctx = db.begin().await?;
    if fetch_payment(&mut ctx, &scope, id).await?.is_none() {
        return Err(not_found("Payment", id));
    }

    ctx.payments().delete(id).await?;
    ctx.commit().await?;
    Ok(())
}
