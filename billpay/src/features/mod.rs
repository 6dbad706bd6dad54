//! Commands and queries over the persistence context.
//!
//! Every function here is generic over [`Database`](crate::db::context::Database) and follows the
//! same shape: validate the request, open one unit of work, fetch what it needs, persist, commit
//! (writes only) and map the rows to API responses. HTTP concerns stay in [`crate::api::handlers`].
//!
//! Payee, bill and payment functions take the caller's [`Scope`](crate::db::models::Scope). A row
//! outside the scope is reported exactly like a missing one.

pub mod auth;
pub mod bills;
pub mod payees;
pub mod payments;
pub mod roles;
pub mod users;

use crate::auth::password::{self, Argon2Params};
use crate::config::PasswordConfig;
use crate::errors::{Error, Result};
use rust_decimal::Decimal;
use std::fmt::Display;

/// Longest accepted name for payees and bills
pub const MAX_NAME_LENGTH: usize = 200;

/// Longest accepted username or role name
pub const MAX_IDENTITY_NAME_LENGTH: usize = 100;

pub(crate) fn not_found(resource: &str, id: impl Display) -> Error {
    Error::NotFound {
        resource: resource.to_string(),
        id: id.to_string(),
    }
}

pub(crate) fn invalid_operation(message: impl Into<String>) -> Error {
    Error::InvalidOperation { message: message.into() }
}

/// Trim a required name and check its length
pub(crate) fn validate_name(field: &str, value: &str, max_length: usize) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(Error::BadRequest {
            message: format!("{field} must not be empty"),
        });
    }
    if trimmed.chars().count() > max_length {
        return Err(Error::BadRequest {
            message: format!("{field} must be at most {max_length} characters"),
        });
    }
    Ok(trimmed.to_string())
}

pub(crate) fn validate_amount(amount: Decimal) -> Result<()> {
    if amount <= Decimal::ZERO {
        return Err(Error::BadRequest {
            message: "Amount must be greater than zero".to_string(),
        });
    }
    Ok(())
}

pub(crate) fn validate_email(email: &str) -> Result<String> {
    let trimmed = email.trim();
    if !trimmed.contains('@') {
        return Err(Error::BadRequest {
            message: "Email must be a valid email address".to_string(),
        });
    }
    Ok(trimmed.to_string())
}

/// Reject an update whose body names a different entity than the path
pub(crate) fn check_path_id<T: PartialEq + Display>(path_id: T, body_id: Option<T>) -> Result<()> {
    match body_id {
        Some(body_id) if body_id != path_id => Err(Error::BadRequest {
            message: format!("ID in body ({body_id}) does not match ID in path ({path_id})"),
        }),
        _ => Ok(()),
    }
}

/// Hash a password off the async runtime
pub(crate) async fn hash_password(password: &str, config: &PasswordConfig) -> Result<String> {
    let password = password.to_string();
    let params = Argon2Params::from(config);
    tokio::task::spawn_blocking(move || password::hash_string_with_params(&password, Some(params)))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })?
}

/// Verify a password off the async runtime
pub(crate) async fn verify_password(password: &str, hash: &str) -> Result<bool> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || password::verify_string(&password, &hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })?
}
