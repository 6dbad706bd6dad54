use super::{Created, created};
use crate::api::models::bills::{BillCreate, BillResponse, BillUpdate, ListBillsQuery};
use crate::api::models::pagination::PaginatedResponse;
use crate::auth::permissions::{RequiresPermission, operation, resource};
use crate::db::context::Database;
use crate::errors::Result;
use crate::features::bills;
use crate::types::BillId;
use crate::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/bills",
    tag = "bills",
    summary = "List bills",
    description = "Bills ordered by due date. Filter by status, payee, or an inclusive due date window.",
    params(ListBillsQuery),
    responses(
        (status = 200, description = "Page of bills", body = PaginatedResponse<BillResponse>),
        (status = 400, description = "Invalid filter"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_bills<D: Database>(
    State(state): State<AppState<D>>,
    Query(query): Query<ListBillsQuery>,
    perm: RequiresPermission<resource::Bills, operation::ReadOwn>,
) -> Result<Json<PaginatedResponse<BillResponse>>> {
    Ok(Json(bills::list_bills(&state.db, perm.scope(), &query).await?))
}

#[utoipa::path(
    get,
    path = "/bills/{id}",
    tag = "bills",
    summary = "Get bill",
    params(("id" = uuid::Uuid, Path, description = "Bill ID")),
    responses(
        (status = 200, description = "Bill", body = BillResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Bill not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_bill<D: Database>(
    State(state): State<AppState<D>>,
    Path(id): Path<BillId>,
    perm: RequiresPermission<resource::Bills, operation::ReadOwn>,
) -> Result<Json<BillResponse>> {
    Ok(Json(bills::get_bill(&state.db, perm.scope(), id).await?))
}

#[utoipa::path(
    post,
    path = "/bills",
    tag = "bills",
    summary = "Create bill",
    description = "The bill is owned by the caller and starts out `pending` unless a status is given.",
    responses(
        (status = 201, description = "Bill created", body = BillResponse),
        (status = 400, description = "Invalid bill or unknown payee"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_bill<D: Database>(
    State(state): State<AppState<D>>,
    perm: RequiresPermission<resource::Bills, operation::CreateOwn>,
    Json(request): Json<BillCreate>,
) -> Result<Created<BillResponse>> {
    let bill = bills::create_bill(&state.db, &perm.current_user, request).await?;
    Ok(created("bills", bill.id, bill))
}

#[utoipa::path(
    put,
    path = "/bills/{id}",
    tag = "bills",
    summary = "Update bill",
    params(("id" = uuid::Uuid, Path, description = "Bill ID")),
    responses(
        (status = 200, description = "Bill updated", body = BillResponse),
        (status = 400, description = "Invalid bill, unknown payee or ID mismatch"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Bill not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_bill<D: Database>(
    State(state): State<AppState<D>>,
    Path(id): Path<BillId>,
    perm: RequiresPermission<resource::Bills, operation::UpdateOwn>,
    Json(request): Json<BillUpdate>,
) -> Result<Json<BillResponse>> {
    Ok(Json(bills::update_bill(&state.db, perm.scope(), id, request).await?))
}

#[utoipa::path(
    delete,
    path = "/bills/{id}",
    tag = "bills",
    summary = "Delete bill",
    description = "Deletes the bill and every payment recorded against it.",
    params(("id" = uuid::Uuid, Path, description = "Bill ID")),
    responses(
        (status = 204, description = "Bill deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Bill not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_bill<D: Database>(
    State(state): State<AppState<D>>,
    Path(id): Path<BillId>,
    perm: RequiresPermission<resource::Bills, operation::DeleteOwn>,
) -> Result<StatusCode> {
    bills::delete_bill(&state.db, perm.scope(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::api::models::bills::BillResponse;
    use crate::api::models::pagination::PaginatedResponse;
    use crate::db::models::bills::BillStatus;
    use crate::test_utils::{auth_header, create_test_admin, create_test_server, create_test_user};
    use axum::http::StatusCode;
    use serde_json::json;
    use uuid::Uuid;

    fn bill_json(name: &str) -> serde_json::Value {
        json!({
            "name": name,
            "amount": "42.10",
            "due_date": "2026-11-01T00:00:00Z",
            "billing_frequency": "monthly",
        })
    }

    #[test_log::test(tokio::test)]
    async fn test_create_and_fetch_bill() {
        let (server, state) = create_test_server();
        let alice = create_test_user(&state.db, "alice").await;
        let (name, value) = auth_header(&alice, &state.config);

        let response = server
            .post("/api/bills")
            .add_header(name.clone(), value.clone())
            .json(&bill_json("Internet"))
            .await;
        response.assert_status(StatusCode::CREATED);
        let bill: BillResponse = response.json();
        assert_eq!(bill.status, BillStatus::Pending);
        assert_eq!(bill.amount.to_string(), "42.10");

        let body: serde_json::Value = server
            .get(&format!("/api/bills/{}", bill.id))
            .add_header(name, value)
            .await
            .json();
        assert_eq!(body["billing_frequency"], "monthly");
        assert_eq!(body["amount"], "42.10");
        assert_eq!(body["payee_id"], serde_json::Value::Null);
    }

    #[test_log::test(tokio::test)]
    async fn test_update_bill_with_mismatched_id_is_bad_request() {
        let (server, state) = create_test_server();
        let alice = create_test_user(&state.db, "alice").await;
        let (name, value) = auth_header(&alice, &state.config);

        let bill: BillResponse = server
            .post("/api/bills")
            .add_header(name.clone(), value.clone())
            .json(&bill_json("Internet"))
            .await
            .json();

        let mut update = bill_json("Internet");
        update["id"] = json!(Uuid::new_v4());
        update["status"] = json!("paid");
        server
            .put(&format!("/api/bills/{}", bill.id))
            .add_header(name.clone(), value.clone())
            .json(&update)
            .await
            .assert_status_bad_request();

        update["id"] = json!(bill.id);
        let response = server
            .put(&format!("/api/bills/{}", bill.id))
            .add_header(name, value)
            .json(&update)
            .await;
        response.assert_status_ok();
        assert_eq!(response.json::<BillResponse>().status, BillStatus::Paid);
    }

    #[test_log::test(tokio::test)]
    async fn test_bills_are_scoped_to_owner_unless_admin() {
        let (server, state) = create_test_server();
        let alice = create_test_user(&state.db, "alice").await;
        let bob = create_test_user(&state.db, "bob").await;
        let admin = create_test_admin(&state.db, "root").await;

        let (name, value) = auth_header(&alice, &state.config);
        let bill: BillResponse = server
            .post("/api/bills")
            .add_header(name, value)
            .json(&bill_json("Rent"))
            .await
            .json();

        let (name, value) = auth_header(&bob, &state.config);
        server
            .get(&format!("/api/bills/{}", bill.id))
            .add_header(name.clone(), value.clone())
            .await
            .assert_status_not_found();
        let page: PaginatedResponse<BillResponse> = server.get("/api/bills").add_header(name, value).await.json();
        assert_eq!(page.total_count, 0);

        let (name, value) = auth_header(&admin, &state.config);
        let page: PaginatedResponse<BillResponse> = server
            .get("/api/bills")
            .add_query_param("status", "pending")
            .add_header(name, value)
            .await
            .json();
        assert_eq!(page.total_count, 1);
    }
}
