//! API request/response models for users.

use super::pagination::Pagination;
use super::roles::RoleResponse;
use crate::db::models::users::UserDBResponse;
use crate::types::{RoleId, TenantId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

/// The authenticated caller, as carried in the session token
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct CurrentUser {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub username: String,
    pub email: String,
    #[schema(value_type = String, format = "uuid")]
    pub tenant_id: TenantId,
    /// Role names
    pub roles: Vec<String>,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        crate::auth::permissions::is_admin(self)
    }
}

impl From<&UserDBResponse> for CurrentUser {
    fn from(db: &UserDBResponse) -> Self {
        Self {
            id: db.id,
            username: db.username.clone(),
            email: db.email.clone(),
            tenant_id: db.tenant_id,
            roles: db.roles.iter().map(|r| r.name.clone()).collect(),
        }
    }
}

// User request models
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserCreate {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Roles to grant; defaults to the `User` role
    #[schema(value_type = Option<Vec<String>>)]
    #[serde(default)]
    pub role_ids: Option<Vec<RoleId>>,
}

/// Partial update; omitted fields are left unchanged
#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema)]
pub struct UserUpdate {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AddUserRole {
    #[schema(value_type = String, format = "uuid")]
    pub role_id: RoleId,
}

// User response models
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    #[schema(value_type = String, format = "uuid")]
    pub tenant_id: TenantId,
    pub username: String,
    pub email: String,
    pub roles: Vec<RoleResponse>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            tenant_id: db.tenant_id,
            username: db.username,
            email: db.email,
            roles: db.roles.into_iter().map(RoleResponse::from).collect(),
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Query parameters for listing users
#[derive(Debug, Default, Deserialize, IntoParams)]
pub struct ListUsersQuery {
    #[serde(flatten)]
    #[param(inline)]
    pub pagination: Pagination,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::models::roles::RoleDBResponse;
    use crate::types::DEFAULT_TENANT_ID;
    use uuid::Uuid;

    #[test]
    fn test_user_response_never_carries_password_hash() {
        let role = RoleDBResponse {
            id: Uuid::new_v4(),
            tenant_id: DEFAULT_TENANT_ID,
            name: "Admin".to_string(),
            created_at: Utc::now(),
        };
        let db = UserDBResponse {
            id: Uuid::new_v4(),
            tenant_id: DEFAULT_TENANT_ID,
            username: "admin".to_string(),
            email: "admin@example.com".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            roles: vec![role.clone()],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let current = CurrentUser::from(&db);
        assert_eq!(current.roles, vec!["Admin".to_string()]);
        assert!(current.is_admin());

        let response = UserResponse::from(db.clone());
        assert_eq!(response.id, db.id);
        assert_eq!(response.tenant_id, db.tenant_id);
        assert_eq!(response.username, db.username);
        assert_eq!(response.email, db.email);
        assert_eq!(response.roles, vec![RoleResponse::from(role)]);
        assert_eq!(response.created_at, db.created_at);

        let json = serde_json::to_value(&response).unwrap();
        assert!(json.get("password_hash").is_none());
    }
}
