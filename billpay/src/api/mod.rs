//! API layer for HTTP request handling and data models.
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! Everything is served under `/api`:
//!
//! - **Authentication** (`/auth/*`): login, registration, logout and the current user
//! - **Payees**, **Bills**, **Payments** (`/payees`, `/bills`, `/payments`): owner scoped for
//!   regular users, tenant wide for admins
//! - **Users** and **Roles** (`/users`, `/roles`): admin only
//!
//! Callers authenticate with a JWT, either as `Authorization: Bearer <token>` or through the
//! session cookie set at login.

pub mod handlers;
pub mod models;
