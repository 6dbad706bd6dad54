//! Payee commands and queries.

use super::{MAX_NAME_LENGTH, check_path_id, invalid_operation, not_found, validate_name};
use crate::api::models::pagination::PaginatedResponse;
use crate::api::models::payees::{ListPayeesQuery, PayeeCreate, PayeeResponse, PayeeUpdate};
use crate::api::models::users::CurrentUser;
use crate::db::context::{Database, PersistenceContext};
use crate::db::handlers::PayeeFilter;
use crate::db::models::Scope;
use crate::db::models::payees::{PayeeCreateDBRequest, PayeeDBResponse, PayeeUpdateDBRequest};
use crate::errors::Result;
use crate::types::{PayeeId, abbrev_uuid};
use tracing::{debug, instrument};

/// Fetch a payee the scope can see
pub(crate) async fn fetch_payee<C: PersistenceContext>(ctx: &mut C, scope: &Scope, id: PayeeId) -> Result<Option<PayeeDBResponse>> {
    let payee = ctx.payees().get_by_id(id).await?;
    Ok(payee.filter(|p| scope.contains(p.tenant_id, p.user_id)))
}

#[instrument(skip(db, query), err)]
pub async fn list_payees<D: Database>(db: &D, scope: Scope, query: &ListPayeesQuery) -> Result<PaginatedResponse<PayeeResponse>> {
    let page = query.pagination.window();
    let filter = PayeeFilter::new(scope, page.skip, page.limit);

    let mut ctx = db.begin().await?;
    let payees = ctx.payees().list(&filter).await?;
    let total_count = ctx.payees().count(&filter).await?;

    Ok(PaginatedResponse::from_rows(payees, total_count, page))
}

#[instrument(skip(db), fields(payee_id = %abbrev_uuid(&id)), err)]
pub async fn get_payee<D: Database>(db: &D, scope: Scope, id: PayeeId) -> Result<PayeeResponse> {
    let mut ctx = db.begin().await?;
    let payee = fetch_payee(&mut ctx, &scope, id).await?.ok_or_else(|| not_found("Payee", id))?;
    Ok(payee.into())
}

#[instrument(skip(db, owner, request), fields(user_id = %abbrev_uuid(&owner.id)), err)]
pub async fn create_payee<D: Database>(db: &D, owner: &CurrentUser, request: PayeeCreate) -> Result<PayeeResponse> {
    let name = validate_name("Payee name", &request.name, MAX_NAME_LENGTH)?;
    let owner_scope = Scope::owned_by(owner.tenant_id, owner.id);

    let mut ctx = db.begin().await?;
    if ctx.payees().name_taken(&owner_scope, &name, None).await? {
        return Err(invalid_operation(format!("A payee named '{name}' already exists")));
    }

    let payee = ctx
        .payees()
        .create(&PayeeCreateDBRequest {
            tenant_id: owner.tenant_id,
            user_id: owner.id,
            name,
            account_number: request.account_number,
            website: request.website,
            phone_number: request.phone_number,
            notes: request.notes,
        })
        .await?;
    ctx.commit().await?;

    debug!("Created payee {}", payee.id);
    Ok(payee.into())
}

#[instrument(skip(db, request), fields(payee_id = %abbrev_uuid(&id)), err)]
pub async fn update_payee<D: Database>(db: &D, scope: Scope, id: PayeeId, request: PayeeUpdate) -> Result<PayeeResponse> {
    check_path_id(id, request.id)?;
    let name = validate_name("Payee name", &request.name, MAX_NAME_LENGTH)?;

    let mut ctx = db.begin().await?;
    let existing = fetch_payee(&mut ctx, &scope, id).await?.ok_or_else(|| not_found("Payee", id))?;

    // Names are unique per owner, which is not necessarily the caller
    let owner_scope = Scope::owned_by(existing.tenant_id, existing.user_id);
    if ctx.payees().name_taken(&owner_scope, &name, Some(id)).await? {
        return Err(invalid_operation(format!("A payee named '{name}' already exists")));
    }

    let payee = ctx
        .payees()
        .update(
            id,
            &PayeeUpdateDBRequest {
                name,
                account_number: request.account_number,
                website: request.website,
                phone_number: request.phone_number,
                notes: request.notes,
            },
        )
        .await?;
    ctx.commit().await?;

    Ok(payee.into())
}

#[instrument(skip(db), fields(payee_id = %abbrev_uuid(&id)), err)]
pub async fn delete_payee<D: Database>(db: &D, scope: Scope, id: PayeeId) -> Result<()> {
    let mut ctx = db.begin().await?;
    if fetch_payee(&mut ctx, &scope, id).await?.is_none() {
        return Err(not_found("Payee", id));
    }

    ctx.payees().delete(id).await?;
    ctx.commit().await?;
    Ok(())
}
