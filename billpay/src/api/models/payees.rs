//! API request/response models for payees.

use super::pagination::Pagination;
use crate::db::models::payees::PayeeDBResponse;
use crate::types::{PayeeId, TenantId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PayeeCreate {
    pub name: String,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

/// Full replacement of a payee's editable fields
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct PayeeUpdate {
    /// Must match the path id when present
    #[schema(value_type = Option<String>, format = "uuid")]
    #[serde(default)]
    pub id: Option<PayeeId>,
    pub name: String,
    #[serde(default)]
    pub account_number: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
    #[serde(default)]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PayeeResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: PayeeId,
    #[schema(value_type = String, format = "uuid")]
    pub tenant_id: TenantId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub name: String,
    pub account_number: Option<String>,
    pub website: Option<String>,
    pub phone_number: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<PayeeDBResponse> for PayeeResponse {
    fn from(db: PayeeDBResponse) -> Self {
        Self {
            id: db.id,
            tenant_id: db.tenant_id,
            user_id: db.user_id,
            name: db.name,
            account_number: db.account_number,
            website: db.website,
            phone_number: db.phone_number,
            notes: db.notes,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Query parameters for listing payees
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListPayeesQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}
