use super::{Created, created};
use crate::api::models::pagination::PaginatedResponse;
use crate::api::models::payments::{ListPaymentsQuery, PaymentCreate, PaymentResponse, PaymentUpdate};
use crate::auth::permissions::{RequiresPermission, operation, resource};
use crate::db::context::Database;
use crate::errors::Result;
use crate::features::payments;
use crate::types::PaymentId;
use crate::AppState;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

#[utoipa::path(
    get,
    path = "/payments",
    tag = "payments",
    summary = "List payments",
    description = "Most recent payments first, optionally only those made against one bill.",
    params(ListPaymentsQuery),
    responses(
        (status = 200, description = "Page of payments", body = PaginatedResponse<PaymentResponse>),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_payments<D: Database>(
    State(state): State<AppState<D>>,
    Query(query): Query<ListPaymentsQuery>,
    perm: RequiresPermission<resource::Payments, operation::ReadOwn>,
) -> Result<Json<PaginatedResponse<PaymentResponse>>> {
    Ok(Json(payments::list_payments(&state.db, perm.scope(), &query).await?))
}

#[utoipa::path(
    get,
    path = "/payments/{id}",
    tag = "payments",
    summary = "Get payment",
    params(("id" = uuid::Uuid, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment", body = PaymentResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Payment not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_payment<D: Database>(
    State(state): State<AppState<D>>,
    Path(id): Path<PaymentId>,
    perm: RequiresPermission<resource::Payments, operation::ReadOwn>,
) -> Result<Json<PaymentResponse>> {
    Ok(Json(payments::get_payment(&state.db, perm.scope(), id).await?))
}

#[utoipa::path(
    post,
    path = "/payments",
    tag = "payments",
    summary = "Record payment",
    description = "Records a payment against a bill. The payment belongs to the owner of the bill.",
    responses(
        (status = 201, description = "Payment recorded", body = PaymentResponse),
        (status = 400, description = "Invalid payment or unknown bill"),
        (status = 401, description = "Unauthorized"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_payment<D: Database>(
    State(state): State<AppState<D>>,
    perm: RequiresPermission<resource::Payments, operation::CreateOwn>,
    Json(request): Json<PaymentCreate>,
) -> Result<Created<PaymentResponse>> {
    let payment = payments::create_payment(&state.db, perm.scope(), request).await?;
    Ok(created("payments", payment.id, payment))
}

#[utoipa::path(
    put,
    path = "/payments/{id}",
    tag = "payments",
    summary = "Update payment",
    params(("id" = uuid::Uuid, Path, description = "Payment ID")),
    responses(
        (status = 200, description = "Payment updated", body = PaymentResponse),
        (status = 400, description = "Invalid payment, unknown bill or ID mismatch"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Payment not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_payment<D: Database>(
    State(state): State<AppState<D>>,
    Path(id): Path<PaymentId>,
    perm: RequiresPermission<resource::Payments, operation::UpdateOwn>,
    Json(request): Json<PaymentUpdate>,
) -> Result<Json<PaymentResponse>> {
    Ok(Json(payments::update_payment(&state.db, perm.scope(), id, request).await?))
}

#[utoipa::path(
    delete,
    path = "/payments/{id}",
    tag = "payments",
    summary = "Delete payment",
    params(("id" = uuid::Uuid, Path, description = "Payment ID")),
    responses(
        (status = 204, description = "Payment deleted"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Payment not found"),
        (status = 500, description = "Internal server error"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_payment<D: Database>(
    State(state): State<AppState<D>>,
    Path(id): Path<PaymentId>,
    perm: RequiresPermission<resource::Payments, operation::DeleteOwn>,
) -> Result<StatusCode> {
    payments::delete_payment(&state.db, perm.scope(), id).await?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use crate::api::models::bills::BillResponse;
    use crate::api::models::pagination::PaginatedResponse;
    use crate::api::models::payments::PaymentResponse;
    use crate::test_utils::{auth_header, create_test_server, create_test_user};
    use axum::http::{StatusCode, header};
    use serde_json::json;
    use uuid::Uuid;

    #[test_log::test(tokio::test)]
    async fn test_payment_lifecycle_over_http() {
        let (server, state) = create_test_server();
        let alice = create_test_user(&state.db, "alice").await;
        let (name, value) = auth_header(&alice, &state.config);

        let bill: BillResponse = server
            .post("/api/bills")
            .add_header(name.clone(), value.clone())
            .json(&json!({
                "name": "Phone",
                "amount": 35,
                "due_date": "2026-11-05T00:00:00Z",
                "billing_frequency": "monthly",
            }))
            .await
            .json();

        let response = server
            .post("/api/payments")
            .add_header(name.clone(), value.clone())
            .json(&json!({
                "bill_id": bill.id,
                "amount": "35.00",
                "payment_date": "2026-11-01T09:30:00Z",
                "payment_method": "card",
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let payment: PaymentResponse = response.json();
        assert_eq!(
            response.header(header::LOCATION).to_str().unwrap(),
            format!("/api/payments/{}", payment.id)
        );
        assert_eq!(payment.confirmation_number, None);

        let page: PaginatedResponse<PaymentResponse> = server
            .get("/api/payments")
            .add_query_param("bill_id", bill.id)
            .add_header(name.clone(), value.clone())
            .await
            .json();
        assert_eq!(page.total_count, 1);

        // Deleting the bill takes its payments with it
        server
            .delete(&format!("/api/bills/{}", bill.id))
            .add_header(name.clone(), value.clone())
            .await
            .assert_status(StatusCode::NO_CONTENT);
        server
            .get(&format!("/api/payments/{}", payment.id))
            .add_header(name, value)
            .await
            .assert_status_not_found();
    }

    #[test_log::test(tokio::test)]
    async fn test_payment_for_unknown_bill_is_bad_request() {
        let (server, state) = create_test_server();
        let alice = create_test_user(&state.db, "alice").await;
        let (name, value) = auth_header(&alice, &state.config);

        let response = server
            .post("/api/payments")
            .add_header(name, value)
            .json(&json!({
                "bill_id": Uuid::new_v4(),
                "amount": "10",
                "payment_date": "2026-11-01T09:30:00Z",
            }))
            .await;
        response.assert_status_bad_request();
    }
}
