use super::{Created, created};
use crate::api::models::roles::{RoleCreate, RoleResponse, RoleUpdate};
use crate::auth::permissions::{RequiresPermission, operation, resource};
use crate::db::context::Database;
use crate::errors::Result;
use crate::features::roles;
use crate::types::RoleId;
use crate::AppState;
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/roles",
    tag = "roles",
    summary = "List roles",
    description = "Every role, ordered by name. Admin only.",
    responses(
        (status = 200, description = "Roles", body = Vec<RoleResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_roles<D: Database>(
    State(state): State<AppState<D>>,
    _: RequiresPermission<resource::Roles, operation::ReadAll>,
) -> Result<Json<Vec<RoleResponse>>> {
    Ok(Json(roles::list_roles(&state.db).await?))
}

#[utoipa::path(
    get,
    path = "/roles/{id}",
    tag = "roles",
    summary = "Get role",
    params(("id" = uuid::Uuid, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role", body = RoleResponse),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Role not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_role<D: Database>(
    State(state): State<AppState<D>>,
    Path(id): Path<RoleId>,
    _: RequiresPermission<resource::Roles, operation::ReadAll>,
) -> Result<Json<RoleResponse>> {
    Ok(Json(roles::get_role(&state.db, id).await?))
}

#[utoipa::path(
    post,
    path = "/roles",
    tag = "roles",
    summary = "Create role",
    responses(
        (status = 201, description = "Role created", body = RoleResponse),
        (status = 400, description = "Invalid or duplicate role name"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_role<D: Database>(
    State(state): State<AppState<D>>,
    perm: RequiresPermission<resource::Roles, operation::CreateAll>,
    Json(request): Json<RoleCreate>,
) -> Result<Created<RoleResponse>> {
    let role = roles::create_role(&state.db, perm.current_user.tenant_id, request).await?;
    Ok(created("roles", role.id, role))
}

#[utoipa::path(
    put,
    path = "/roles/{id}",
    tag = "roles",
    summary = "Rename role",
    description = "The built-in `Admin` and `User` roles cannot be renamed.",
    params(("id" = uuid::Uuid, Path, description = "Role ID")),
    responses(
        (status = 200, description = "Role updated", body = RoleResponse),
        (status = 400, description = "Invalid or duplicate name, built-in role, or ID mismatch"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Role not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_role<D: Database>(
    State(state): State<AppState<D>>,
    Path(id): Path<RoleId>,
    _: RequiresPermission<resource::Roles, operation::UpdateAll>,
    Json(request): Json<RoleUpdate>,
) -> Result<Json<RoleResponse>> {
    Ok(Json(roles::update_role(&state.db, id, request).await?))
}

#[utoipa::path(
    delete,
    path = "/roles/{id}",
    tag = "roles",
    summary = "Delete role",
    description = "Revokes the role from every user holding it. Built-in roles cannot be deleted.",
    params(("id" = uuid::Uuid, Path, description = "Role ID")),
    responses(
        (status = 204, description = "Role deleted"),
        (status = 400, description = "Built-in role"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Role not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_role<D: Database>(
    State(state): State<AppState<D>>,
    Path(id): Path<RoleId>,
    _: RequiresPermission<resource::Roles, operation::DeleteAll>,
) -> Result<StatusCode> {
    roles::delete_role(&state.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
