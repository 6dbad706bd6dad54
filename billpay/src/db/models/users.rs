//! Database models for users.

use crate::db::models::roles::RoleDBResponse;
use crate::types::{RoleId, TenantId, UserId};
use chrono::{DateTime, Utc};

/// Database request for creating a new user
#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub tenant_id: TenantId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub role_ids: Vec<RoleId>,
}

/// Database request for updating a user. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
}

/// Database response for a user, with the roles they hold
#[derive(Debug, Clone)]
pub struct UserDBResponse {
    pub id: UserId,
    pub tenant_id: TenantId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub roles: Vec<RoleDBResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserDBResponse {
    /// Case-insensitive role membership check
    pub fn has_role(&self, role_name: &str) -> bool {
        self.roles.iter().any(|r| r.name.eq_ignore_ascii_case(role_name))
    }
}
