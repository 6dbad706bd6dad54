//! Database models for payees.

use crate::types::{PayeeId, TenantId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Database request for creating a new payee
#[derive(Debug, Clone)]
pub struct PayeeCreateDBRequest {
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub name: String,
    pub account_number: Option<String>,
    pub website: Option<String>,
    pub phone_number: Option<String>,
    pub notes: Option<String>,
}

/// Database request for replacing a payee's editable fields
#[derive(Debug, Clone)]
pub struct PayeeUpdateDBRequest {
    pub name: String,
    pub account_number: Option<String>,
    pub website: Option<String>,
    pub phone_number: Option<String>,
    pub notes: Option<String>,
}

/// Database response for a payee
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PayeeDBResponse {
    pub id: PayeeId,
    pub tenant_id: TenantId,
    pub user_id: UserId,
    pub name: String,
    pub account_number: Option<String>,
    pub website: Option<String>,
    pub phone_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
