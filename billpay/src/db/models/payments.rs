//! Database models for payments.

use crate::types::{BillId, PaymentId, TenantId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database request for recording a payment against a bill
#[derive(Debug, Clone)]
pub struct PaymentCreateDBRequest {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub bill_id: BillId,
    pub amount: Decimal,
    pub payment_date: DateTime<Utc>,
    pub payment_method: Option<String>,
    pub confirmation_number: Option<String>,
    pub notes: Option<String>,
}

/// Database request for replacing a payment's editable fields. The owner follows the bill.
#[derive(Debug, Clone)]
pub struct PaymentUpdateDBRequest {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub bill_id: BillId,
    pub amount: Decimal,
    pub payment_date: DateTime<Utc>,
    pub payment_method: Option<String>,
    pub confirmation_number: Option<String>,
    pub notes: Option<String>,
}

/// Database response for a payment
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PaymentDBResponse {
    pub id: PaymentId,
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub bill_id: BillId,
    pub amount: Decimal,
    pub payment_date: DateTime<Utc>,
    pub payment_method: Option<String>,
    pub confirmation_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
