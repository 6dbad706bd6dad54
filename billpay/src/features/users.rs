//! User administration. Every function here works inside the caller's tenant.

use super::roles::ensure_role;
use super::{MAX_IDENTITY_NAME_LENGTH, check_path_id, hash_password, invalid_operation, not_found, validate_email, validate_name};
use crate::api::models::pagination::PaginatedResponse;
use crate::api::models::users::{CurrentUser, ListUsersQuery, UserCreate, UserResponse, UserUpdate};
use crate::auth::password::validate_password;
use crate::config::Config;
use crate::db::context::{Database, PersistenceContext};
use crate::db::handlers::UserFilter;
use crate::db::models::roles::USER_ROLE;
use crate::db::models::users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest};
use crate::errors::Result;
use crate::types::{RoleId, TenantId, UserId, abbrev_uuid};
use tracing::{info, instrument};

/// Trimmed, validated username and email of a new account
pub(crate) struct NewIdentity {
    pub username: String,
    pub email: String,
}

pub(crate) fn validate_new_identity(username: &str, email: &str, password: &str, config: &Config) -> Result<NewIdentity> {
    let username = validate_name("Username", username, MAX_IDENTITY_NAME_LENGTH)?;
    let email = validate_email(email)?;
    validate_password(password, &config.auth.password)?;
    Ok(NewIdentity { username, email })
}

/// Reject a username or email some other account already uses
pub(crate) async fn check_identity_available<C: PersistenceContext>(
    ctx: &mut C,
    username: Option<&str>,
    email: Option<&str>,
    except: Option<UserId>,
) -> Result<()> {
    if let Some(username) = username
        && ctx.users().username_taken(username, except).await?
    {
        return Err(invalid_operation(format!("Username '{username}' is already taken")));
    }
    if let Some(email) = email
        && ctx.users().email_taken(email, except).await?
    {
        return Err(invalid_operation(format!("Email '{email}' is already registered")));
    }
    Ok(())
}

async fn fetch_user<C: PersistenceContext>(ctx: &mut C, tenant_id: TenantId, id: UserId) -> Result<UserDBResponse> {
    ctx.users()
        .get_by_id(id)
        .await?
        .filter(|u| u.tenant_id == tenant_id)
        .ok_or_else(|| not_found("User", id))
}

/// Resolve requested role ids, defaulting to the `User` role
async fn resolve_roles<C: PersistenceContext>(ctx: &mut C, tenant_id: TenantId, role_ids: Option<Vec<RoleId>>) -> Result<Vec<RoleId>> {
    let Some(mut role_ids) = role_ids else {
        return Ok(vec![ensure_role(ctx, tenant_id, USER_ROLE).await?.id]);
    };

    role_ids.sort();
    role_ids.dedup();
    let found = ctx.roles().get_bulk(role_ids.clone()).await?;
    if let Some(missing) = role_ids.iter().find(|id| !found.contains_key(id)) {
        return Err(invalid_operation(format!("Role {missing} does not exist")));
    }
    Ok(role_ids)
}

#[instrument(skip(db, caller, query), err)]
pub async fn list_users<D: Database>(db: &D, caller: &CurrentUser, query: &ListUsersQuery) -> Result<PaginatedResponse<UserResponse>> {
    let page = query.pagination.window();
    let filter = UserFilter::new(page.skip, page.limit).with_tenant(caller.tenant_id);

    let mut ctx = db.begin().await?;
    let users = ctx.users().list(&filter).await?;
    let total_count = ctx.users().count(&filter).await?;

    Ok(PaginatedResponse::from_rows(users, total_count, page))
}

#[instrument(skip(db, caller), fields(user_id = %abbrev_uuid(&id)), err)]
pub async fn get_user<D: Database>(db: &D, caller: &CurrentUser, id: UserId) -> Result<UserResponse> {
    let mut ctx = db.begin().await?;
    Ok(fetch_user(&mut ctx, caller.tenant_id, id).await?.into())
}

#[instrument(skip(db, config, caller, request), fields(username = %request.username), err)]
pub async fn create_user<D: Database>(db: &D, config: &Config, caller: &CurrentUser, request: UserCreate) -> Result<UserResponse> {
    let identity = validate_new_identity(&request.username, &request.email, &request.password, config)?;
    let password_hash = hash_password(&request.password, &config.auth.password).await?;

    let mut ctx = db.begin().await?;
    check_identity_available(&mut ctx, Some(&identity.username), Some(&identity.email), None).await?;
    let role_ids = resolve_roles(&mut ctx, caller.tenant_id, request.role_ids).await?;

    let user = ctx
        .users()
        .create(&UserCreateDBRequest {
            tenant_id: caller.tenant_id,
            username: identity.username,
            email: identity.email,
            password_hash,
            role_ids,
        })
        .await?;
    ctx.commit().await?;

    info!("Created user {} ({})", user.username, abbrev_uuid(&user.id));
    Ok(user.into())
}

#[instrument(skip(db, config, caller, request), fields(user_id = %abbrev_uuid(&id)), err)]
pub async fn update_user<D: Database>(
    db: &D,
    config: &Config,
    caller: &CurrentUser,
    id: UserId,
    request: UserUpdate,
) -> Result<UserResponse> {
    let username = request
        .username
        .as_deref()
        .map(|u| validate_name("Username", u, MAX_IDENTITY_NAME_LENGTH))
        .transpose()?;
    let email = request.email.as_deref().map(validate_email).transpose()?;
    let password_hash = match request.password.as_deref() {
        Some(password) => {
            validate_password(password, &config.auth.password)?;
            Some(hash_password(password, &config.auth.password).await?)
        }
        None => None,
    };

    let mut ctx = db.begin().await?;
    fetch_user(&mut ctx, caller.tenant_id, id).await?;
    check_identity_available(&mut ctx, username.as_deref(), email.as_deref(), Some(id)).await?;

    let user = ctx
        .users()
        .update(
            id,
            &UserUpdateDBRequest {
                username,
                email,
                password_hash,
            },
        )
        .await?;
    ctx.commit().await?;

    Ok(user.into())
}

#[instrument(skip(db, caller), fields(user_id = %abbrev_uuid(&id)), err)]
pub async fn delete_user<D: Database>(db: &D, caller: &CurrentUser, id: UserId) -> Result<()> {
    if caller.id == id {
        return Err(invalid_operation("You cannot delete your own account"));
    }

    let mut ctx = db.begin().await?;
    fetch_user(&mut ctx, caller.tenant_id, id).await?;
    ctx.users().delete(id).await?;
    ctx.commit().await?;

    info!("Deleted user {}", abbrev_uuid(&id));
    Ok(())
}

/// Grant a role. Granting a role the user already holds changes nothing.
#[instrument(skip(db, caller), fields(user_id = %abbrev_uuid(&user_id), role_id = %abbrev_uuid(&role_id)), err)]
pub async fn add_role_to_user<D: Database>(db: &D, caller: &CurrentUser, user_id: UserId, role_id: RoleId) -> Result<UserResponse> {
    let mut ctx = db.begin().await?;
    fetch_user(&mut ctx, caller.tenant_id, user_id).await?;
    if ctx.roles().get_by_id(role_id).await?.is_none() {
        return Err(invalid_operation(format!("Role {role_id} does not exist")));
    }

    ctx.users().add_role(user_id, role_id).await?;
    let user = fetch_user(&mut ctx, caller.tenant_id, user_id).await?;
    ctx.commit().await?;

    Ok(user.into())
}

/// Revoke a role. Revoking a role the user does not hold still succeeds.
#[instrument(skip(db, caller), fields(user_id = %abbrev_uuid(&user_id), role_id = %abbrev_uuid(&role_id)), err)]
pub async fn remove_role_from_user<D: Database>(db: &D, caller: &CurrentUser, user_id: UserId, role_id: RoleId) -> Result<UserResponse> {
    let mut ctx = db.begin().await?;
    fetch_user(&mut ctx, caller.tenant_id, user_id).await?;

    ctx.users().remove_role(user_id, role_id).await?;
    let user = fetch_user(&mut ctx, caller.tenant_id, user_id).await?;
    ctx.commit().await?;

    Ok(user.into())
}
