//! HTTP request handlers.
//!
//! Handlers extract and authorize the request, hand it to the matching function in
//! [`crate::features`] and shape the HTTP response. Every handler is generic over the
//! [`Database`](crate::db::context::Database) behind [`AppState`](crate::AppState).

pub mod auth;
pub mod bills;
pub mod payees;
pub mod payments;
pub mod roles;
pub mod users;

use axum::{
    Json,
    http::{HeaderName, StatusCode, header},
};
use std::fmt::Display;

/// A `201 Created` response with a `Location` header
pub type Created<T> = (StatusCode, [(HeaderName, String); 1], Json<T>);

pub(crate) fn created<T>(collection: &str, id: impl Display, body: T) -> Created<T> {
    (StatusCode::CREATED, [(header::LOCATION, format!("/api/{collection}/{id}"))], Json(body))
}
