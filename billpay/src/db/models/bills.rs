//! Database models for bills.

use crate::types::{BillId, PayeeId, TenantId, UserId};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// How often a bill recurs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BillingFrequency {
    OneTime,
    Weekly,
    BiWeekly,
    Monthly,
    Quarterly,
    SemiAnnually,
    Annually,
}

/// Where a bill is in its payment lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type, ToSchema)]
#[sqlx(type_name = "text", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    Pending,
    Scheduled,
    Paid,
    Overdue,
    Cancelled,
}

/// Database request for creating a new bill
#[derive(Debug, Clone)]
pub struct BillCreateDBRequest {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub payee_id: Option<PayeeId>,
    pub name: String,
    pub amount: Decimal,
    pub due_date: DateTime<Utc>,
    pub billing_frequency: BillingFrequency,
    pub status: BillStatus,
    pub notes: Option<String>,
}

/// Database request for replacing a bill's editable fields
#[derive(Debug, Clone)]
pub struct BillUpdateDBRequest {
    pub payee_id: Option<PayeeId>,
    pub name: String,
    pub amount: Decimal,
    pub due_date: DateTime<Utc>,
    pub billing_frequency: BillingFrequency,
    pub status: BillStatus,
    pub notes: Option<String>,
}

/// Database response for a bill
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct BillDBResponse {
    pub id: BillId,
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub payee_id: Option<PayeeId>,
    pub name: String,
    pub amount: Decimal,
    pub due_date: DateTime<Utc>,
    pub billing_frequency: BillingFrequency,
    pub status: BillStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
