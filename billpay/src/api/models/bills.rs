//! API request/response models for bills.

use super::pagination::Pagination;
use crate::db::models::bills::{BillDBResponse, BillStatus, BillingFrequency};
use crate::types::{BillId, PayeeId, TenantId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BillCreate {
    #[schema(value_type = Option<String>, format = "uuid")]
    #[serde(default)]
    pub payee_id: Option<PayeeId>,
    pub name: String,
    /// Amount due, as a decimal string or number
    #[schema(value_type = String, example = "125.50")]
    pub amount: Decimal,
    pub due_date: DateTime<Utc>,
    pub billing_frequency: BillingFrequency,
    /// Defaults to `pending`
    #[serde(default)]
    pub status: Option<BillStatus>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Full replacement of a bill's editable fields
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct BillUpdate {
    /// Must match the path id when present
    #[schema(value_type = Option<String>, format = "uuid")]
    #[serde(default)]
    pub id: Option<BillId>,
    #[schema(value_type = Option<String>, format = "uuid")]
    #[serde(default)]
    pub payee_id: Option<PayeeId>,
    pub name: String,
    #[schema(value_type = String, example = "125.50")]
    pub amount: Decimal,
    pub due_date: DateTime<Utc>,
    pub billing_frequency: BillingFrequency,
    pub status: BillStatus,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct BillResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: BillId,
    #[schema(value_type = String, format = "uuid")]
    pub tenant_id: TenantId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    #[schema(value_type = Option<String>, format = "uuid")]
    pub payee_id: Option<PayeeId>,
    pub name: String,
    #[schema(value_type = String, example = "125.50")]
    pub amount: Decimal,
    pub due_date: DateTime<Utc>,
    pub billing_frequency: BillingFrequency,
    pub status: BillStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<BillDBResponse> for BillResponse {
    fn from(db: BillDBResponse) -> Self {
        Self {
            id: db.id,
            tenant_id: db.tenant_id,
            user_id: db.user_id,
            payee_id: db.payee_id,
            name: db.name,
            amount: db.amount,
            due_date: db.due_date,
            billing_frequency: db.billing_frequency,
            status: db.status,
            notes: db.notes,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Query parameters for listing bills
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListBillsQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,

    /// Only bills with this status
    pub status: Option<BillStatus>,

    /// Only bills for this payee
    #[param(value_type = Option<String>, format = "uuid")]
    pub payee_id: Option<PayeeId>,

    /// Only bills due at or after this instant (RFC 3339)
    pub due_from: Option<DateTime<Utc>>,

    /// Only bills due at or before this instant (RFC 3339)
    pub due_to: Option<DateTime<Utc>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::DEFAULT_TENANT_ID;
    use uuid::Uuid;

    #[test]
    fn test_bill_response_carries_every_field() {
        let db = BillDBResponse {
            id: Uuid::new_v4(),
            tenant_id: DEFAULT_TENANT_ID,
            user_id: Uuid::new_v4(),
            payee_id: None,
            name: "Rent".to_string(),
            amount: Decimal::new(150_000, 2),
            due_date: Utc::now(),
            billing_frequency: BillingFrequency::Monthly,
            status: BillStatus::Scheduled,
            notes: Some("landlord prefers ACH".to_string()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let response = BillResponse::from(db.clone());
        assert_eq!(response.id, db.id);
        assert_eq!(response.tenant_id, db.tenant_id);
        assert_eq!(response.user_id, db.user_id);
        assert_eq!(response.payee_id, None);
        assert_eq!(response.name, db.name);
        assert_eq!(response.amount, db.amount);
        assert_eq!(response.due_date, db.due_date);
        assert_eq!(response.billing_frequency, db.billing_frequency);
        assert_eq!(response.status, db.status);
        assert_eq!(response.notes, db.notes);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json["payee_id"].is_null());
        assert_eq!(json["billing_frequency"], "monthly");
        assert_eq!(json["status"], "scheduled");
        assert_eq!(json["amount"], "1500.00");
    }

    #[test]
    fn test_bill_create_accepts_numeric_amount_and_defaults() {
        let create: BillCreate = serde_json::from_value(serde_json::json!({
            "name": "Internet",
            "amount": 59.99,
            "due_date": "2026-02-01T00:00:00Z",
            "billing_frequency": "bi_weekly"
        }))
        .unwrap();

        assert_eq!(create.amount, Decimal::new(5_999, 2));
        assert_eq!(create.billing_frequency, BillingFrequency::BiWeekly);
        assert_eq!(create.status, None);
        assert_eq!(create.payee_id, None);
    }
}
