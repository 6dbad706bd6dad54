//! Authentication and authorization.
//!
//! # Authentication
//!
//! Users sign in through `POST /api/auth/login` with a username (or email) and password. The
//! response carries a signed HS256 JWT, and the same token is set as an HTTP-only session
//! cookie. Later requests authenticate with either:
//!
//! - `Authorization: Bearer <jwt>`, checked first
//! - the session cookie named by `auth.session.cookie_name`
//!
//! Tokens carry the user's id, username, email, tenant and role names, and are checked against
//! the configured issuer and audience.
//!
//! # Authorization
//!
//! See [`permissions`]: admins can do everything within their tenant, everyone else works on
//! the payees, bills and payments they own.
//!
//! # Modules
//!
//! - [`current_user`]: the [`CurrentUser`](crate::api::models::users::CurrentUser) extractor
//! - [`password`]: Argon2id hashing and password rules
//! - [`permissions`]: role checks and the `RequiresPermission` extractor
//! - [`session`]: JWT creation and verification

pub mod current_user;
pub mod password;
pub mod permissions;
pub mod session;
