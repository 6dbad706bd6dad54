//! Database models for roles.

use crate::types::{RoleId, TenantId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// Name of the role that grants every permission within a tenant
pub const ADMIN_ROLE: &str = "Admin";

/// Name of the role given to self-registered users
pub const USER_ROLE: &str = "User";

/// Database request for creating a new role
#[derive(Debug, Clone)]
pub struct RoleCreateDBRequest {
    pub tenant_id: TenantId,
    pub name: String,
}

/// Database request for renaming a role
#[derive(Debug, Clone)]
pub struct RoleUpdateDBRequest {
    pub name: String,
}

/// Database response for a role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct RoleDBResponse {
    pub id: RoleId,
    pub tenant_id: TenantId,
    pub name: String,
    pub created_at: DateTime<Utc>,
}
