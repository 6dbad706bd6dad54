//! API request/response models for payments.

use super::pagination::Pagination;
use crate::db::models::payments::PaymentDBResponse;
use crate::types::{BillId, PaymentId, TenantId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentCreate {
    #[schema(value_type = String, format = "uuid")]
    pub bill_id: BillId,
    #[schema(value_type = String, example = "125.50")]
    pub amount: Decimal,
    pub payment_date: DateTime<Utc>,
    /// Free-form, e.g. "ach" or "credit_card"
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub confirmation_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Full replacement of a payment's editable fields
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PaymentUpdate {
    /// Must match the path id when present
    #[schema(value_type = Option<String>, format = "uuid")]
    #[serde(default)]
    pub id: Option<PaymentId>,
    #[schema(value_type = String, format = "uuid")]
    pub bill_id: BillId,
    #[schema(value_type = String, example = "125.50")]
    pub amount: Decimal,
    pub payment_date: DateTime<Utc>,
    #[serde(default)]
    pub payment_method: Option<String>,
    #[serde(default)]
    pub confirmation_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PaymentResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: PaymentId,
    #[schema(value_type = String, format = "uuid")]
    pub tenant_id: TenantId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    #[schema(value_type = String, format = "uuid")]
    pub bill_id: BillId,
    #[schema(value_type = String, example = "125.50")]
    pub amount: Decimal,
    pub payment_date: DateTime<Utc>,
    pub payment_method: Option<String>,
    pub confirmation_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PaymentDBResponse> for PaymentResponse {
    fn from(db: PaymentDBResponse) -> Self {
        Self {
            id: db.id,
            tenant_id: db.tenant_id,
            user_id: db.user_id,
            bill_id: db.bill_id,
            amount: db.amount,
            payment_date: db.payment_date,
            payment_method: db.payment_method,
            confirmation_number: db.confirmation_number,
            notes: db.notes,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Query parameters for listing payments
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListPaymentsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only payments against this bill
    #[param(value_type = Option<String>, format = "uuid")]
    pub bill_id: Option<BillId>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_TENANT_ID;
    use uuid::Uuid;

    #[test]
    fn test_payment_response_carries_every_field() {
        let db = PaymentDBResponse {
            id: Uuid::new_v4(),
            tenant_id: DEFAULT_TENANT_ID,
            user_id: Uuid::new_v4(),
            bill_id: Uuid::new_v4(),
            amount: Decimal::new(4_250, 2),
            payment_date: Utc::now(),
            payment_method: None,
            confirmation_number: Some("CONF-1".to_string()),
            notes: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let response = PaymentResponse::from(db.clone());
        assert_eq!(response.id, db.id);
        assert_eq!(response.bill_id, db.bill_id);
        assert_eq!(response.amount, db.amount);
        assert_eq!(response.payment_date, db.payment_date);
        assert_eq!(response.confirmation_number, db.confirmation_number);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json["payment_method"].is_null());
        assert!(json["notes"].is_null());
    }
}
