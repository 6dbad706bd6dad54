use super::{Created, created};
use crate::api::models::pagination::PaginatedResponse;
use crate::api::models::payees::{ListPayeesQuery, PayeeCreate, PayeeResponse, PayeeUpdate};
use crate::auth::permissions::{RequiresPermission, operation, resource};
use crate::db::context::Database;
use crate::errors::Result;
use crate::features::payees;
use crate::types::PayeeId;
use crate::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/payees",
    tag = "payees",
    summary = "List payees",
    description = "Admins see every payee of their tenant, other users only their own.",
    params(ListPayeesQuery),
    responses(
        (status = 200, description = "Page of payees", body = PaginatedResponse<PayeeResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_payees<D: Database>(
    State(state): State<AppState<D>>,
    Query(query): Query<ListPayeesQuery>,
    perm: RequiresPermission<resource::Payees, operation::ReadOwn>,
) -> Result<Json<PaginatedResponse<PayeeResponse>>> {
    Ok(Json(payees::list_payees(&state.db, perm.scope(), &query).await?))
}

#[utoipa::path(
    get,
    path = "/payees/{id}",
    tag = "payees",
    summary = "Get payee",
    params(("id" = uuid::Uuid, Path, description = "Payee ID")),
    responses(
        (status = 200, description = "Payee", body = PayeeResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Payee not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_payee<D: Database>(
    State(state): State<AppState<D>>,
    Path(id): Path<PayeeId>,
    perm: RequiresPermission<resource::Payees, operation::ReadOwn>,
) -> Result<Json<PayeeResponse>> {
    Ok(Json(payees::get_payee(&state.db, perm.scope(), id).await?))
}

#[utoipa::path(
    post,
    path = "/payees",
    tag = "payees",
    summary = "Create payee",
    description = "The payee is owned by the caller. Names are unique per owner, ignoring case.",
    responses(
        (status = 201, description = "Payee created", body = PayeeResponse),
        (status = 400, description = "Invalid payee or duplicate name"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_payee<D: Database>(
    State(state): State<AppState<D>>,
    perm: RequiresPermission<resource::Payees, operation::CreateOwn>,
    Json(request): Json<PayeeCreate>,
) -> Result<Created<PayeeResponse>> {
    let payee = payees::create_payee(&state.db, &perm.current_user, request).await?;
    Ok(created("payees", payee.id, payee))
}

#[utoipa::path(
    put,
    path = "/payees/{id}",
    tag = "payees",
    summary = "Update payee",
    params(("id" = uuid::Uuid, Path, description = "Payee ID")),
    responses(
        (status = 200, description = "Payee updated", body = PayeeResponse),
        (status = 400, description = "Invalid payee, duplicate name or ID mismatch"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Payee not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_payee<D: Database>(
    State(state): State<AppState<D>>,
    Path(id): Path<PayeeId>,
    perm: RequiresPermission<resource::Payees, operation::UpdateOwn>,
    Json(request): Json<PayeeUpdate>,
) -> Result<Json<PayeeResponse>> {
    Ok(Json(payees::update_payee(&state.db, perm.scope(), id, request).await?))
}

#[utoipa::path(
    delete,
    path = "/payees/{id}",
    tag = "payees",
    summary = "Delete payee",
    description = "Bills that referenced the payee keep existing without one.",
    params(("id" = uuid::Uuid, Path, description = "Payee ID")),
    responses(
        (status = 204, description = "Payee deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Payee not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_payee<D: Database>(
    State(state): State<AppState<D>>,
    Path(id): Path<PayeeId>,
    perm: RequiresPermission<resource::Payees, operation::DeleteOwn>,
) -> Result<StatusCode> {
    payees::delete_payee(&state.db, perm.scope(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::api::models::pagination::PaginatedResponse;
    use crate::api::models::payees::PayeeResponse;
    use crate::test_utils::{auth_header, create_test_server, create_test_user};
    use axum::http::{StatusCode, header};
    use serde_json::json;

    #[test_log::test(tokio::test)]
    async fn test_payee_crud_over_http() {
        let (server, state) = create_test_server();
        let alice = create_test_user(&state.db, "alice").await;
        let (name, value) = auth_header(&alice, &state.config);

        let response = server
            .post("/api/payees")
            .add_header(name.clone(), value.clone())
            .json(&json!({"name": "Power Co", "website": "https://power.example.com"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let payee: PayeeResponse = response.json();
        assert_eq!(
            response.header(header::LOCATION).to_str().unwrap(),
            format!("/api/payees/{}", payee.id)
        );
        assert_eq!(payee.account_number, None);

        let response = server.get("/api/payees").add_header(name.clone(), value.clone()).await;
        response.assert_status_ok();
        let page: PaginatedResponse<PayeeResponse> = response.json();
        assert_eq!(page.total_count, 1);
        assert_eq!(page.limit, 10);

        let response = server
            .put(&format!("/api/payees/{}", payee.id))
            .add_header(name.clone(), value.clone())
            .json(&json!({"name": "Power & Light"}))
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<PayeeResponse>().name, "Power & Light");

        let response = server
            .delete(&format!("/api/payees/{}", payee.id))
            .add_header(name.clone(), value.clone())
            .await;
        response.assert_status(StatusCode::NO_CONTENT);

        let response = server
            .get(&format!("/api/payees/{}", payee.id))
            .add_header(name, value)
            .await;
        response.assert_status_not_found();
    }

    #[test_log::test(tokio::test)]
    async fn test_duplicate_payee_name_is_bad_request() {
        let (server, state) = create_test_server();
        let alice = create_test_user(&state.db, "alice").await;
        let (name, value) = auth_header(&alice, &state.config);

        server
            .post("/api/payees")
            .add_header(name.clone(), value.clone())
            .json(&json!({"name": "Water"}))
            .await
            .assert_status(StatusCode::CREATED);

        let response = server
            .post("/api/payees")
            .add_header(name, value)
            .json(&json!({"name": "water"}))
            .await;
        response.assert_status_bad_request();
        let body: serde_json::Value = response.json();
        assert!(body["error"].as_str().unwrap().contains("already exists"));
    }

    #[test_log::test(tokio::test)]
    async fn test_payees_require_authentication() {
        let (server, _state) = create_test_server();
        server.get("/api/payees").await.assert_status_unauthorized();
    }
}
