use super::{Created, created};
use crate::api::models::pagination::PaginatedResponse;
use crate::api::models::users::{AddUserRole, ListUsersQuery, UserCreate, UserResponse, UserUpdate};
use crate::auth::permissions::{RequiresPermission, operation, resource};
use crate::db::context::Database;
use crate::errors::Result;
use crate::features::users;
use crate::types::{RoleId, UserId};
use crate::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    summary = "List users",
    description = "Users of the caller's tenant, ordered by username. Admin only.",
    params(ListUsersQuery),
    responses(
        (status = 200, description = "Page of users", body = PaginatedResponse<UserResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_users<D: Database>(
    State(state): State<AppState<D>>,
    Query(query): Query<ListUsersQuery>,
    perm: RequiresPermission<resource::Users, operation::ReadAll>,
) -> Result<Json<PaginatedResponse<UserResponse>>> {
    Ok(Json(users::list_users(&state.db, &perm.current_user, &query).await?))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    summary = "Get user",
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_user<D: Database>(
    State(state): State<AppState<D>>,
    Path(id): Path<UserId>,
    perm: RequiresPermission<resource::Users, operation::ReadAll>,
) -> Result<Json<UserResponse>> {
    Ok(Json(users::get_user(&state.db, &perm.current_user, id).await?))
}

#[utoipa::path(
    post,
    path = "/users",
    tag = "users",
    summary = "Create user",
    description = "Creates a user in the caller's tenant. Without `role_ids` the user gets the `User` role.",
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Invalid user, taken username or email, or unknown role"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_user<D: Database>(
    State(state): State<AppState<D>>,
    perm: RequiresPermission<resource::Users, operation::CreateAll>,
    Json(request): Json<UserCreate>,
) -> Result<Created<UserResponse>> {
    let user = users::create_user(&state.db, &state.config, &perm.current_user, request).await?;
    Ok(created("users", user.id, user))
}

#[utoipa::path(
    put,
    path = "/users/{id}",
    tag = "users",
    summary = "Update user",
    description = "Omitted fields are left unchanged. A new password is validated and rehashed.",
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User updated", body = UserResponse),
        (status = 400, description = "Invalid user or taken username or email"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_user<D: Database>(
    State(state): State<AppState<D>>,
    Path(id): Path<UserId>,
    perm: RequiresPermission<resource::Users, operation::UpdateAll>,
    Json(request): Json<UserUpdate>,
) -> Result<Json<UserResponse>> {
    Ok(Json(
        users::update_user(&state.db, &state.config, &perm.current_user, id, request).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/users/{id}",
    tag = "users",
    summary = "Delete user",
    description = "Deletes the user together with their payees, bills and payments. Admins cannot delete themselves.",
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    responses(
        (status = 204, description = "User deleted"),
        (status = 400, description = "Attempt to delete yourself"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_user<D: Database>(
    State(state): State<AppState<D>>,
    Path(id): Path<UserId>,
    perm: RequiresPermission<resource::Users, operation::DeleteAll>,
) -> Result<StatusCode> {
    users::delete_user(&state.db, &perm.current_user, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[utoipa::path(
    post,
    path = "/users/{id}/roles",
    tag = "users",
    summary = "Grant role",
    description = "Grants a role to the user. Granting a role the user already holds is a no-op.",
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "User with the role granted", body = UserResponse),
        (status = 400, description = "Unknown role"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn add_user_role<D: Database>(
    State(state): State<AppState<D>>,
    Path(id): Path<UserId>,
    perm: RequiresPermission<resource::Users, operation::UpdateAll>,
    Json(request): Json<AddUserRole>,
) -> Result<Json<UserResponse>> {
    Ok(Json(
        users::add_role_to_user(&state.db, &perm.current_user, id, request.role_id).await?,
    ))
}

#[utoipa::path(
    delete,
    path = "/users/{id}/roles/{role_id}",
    tag = "users",
    summary = "Revoke role",
    params(
        ("id" = uuid::Uuid, Path, description = "User ID"),
        ("role_id" = uuid::Uuid, Path, description = "Role ID"),
    ),
    responses(
        (status = 200, description = "User with the role revoked", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "User not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn remove_user_role<D: Database>(
    State(state): State<AppState<D>>,
    Path((id, role_id)): Path<(UserId, RoleId)>,
    perm: RequiresPermission<resource::Users, operation::UpdateAll>,
) -> Result<Json<UserResponse>> {
    Ok(Json(
        users::remove_role_from_user(&state.db, &perm.current_user, id, role_id).await?,
    ))
}
