//! API request and response data models.
//!
//! These types define the public JSON contract and are kept apart from the database models in
//! [`crate::db::models`]. Every response type has a `From<...DBResponse>` impl that carries each
//! field over unchanged; optional fields serialize as `null`.
//!
//! - [`auth`]: login and registration payloads
//! - [`users`] and [`roles`]: identity management, plus the [`users::CurrentUser`] of a request
//! - [`payees`], [`bills`], [`payments`]: the bill payment resources
//! - [`pagination`]: shared `skip`/`limit` query parameters and the paginated envelope

pub mod auth;
pub mod bills;
pub mod pagination;
pub mod payees;
pub mod payments;
pub mod roles;
pub mod users;
