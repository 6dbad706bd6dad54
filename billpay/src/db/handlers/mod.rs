//! Postgres repository implementations and the per-entity repository traits.
//!
//! Each repository wraps a `&mut PgConnection` (in practice the transaction owned by
//! [`crate::db::context::PgContext`]) and implements [`Repository`] plus an entity trait
//! with the lookups feature code needs beyond CRUD.
//!
//! # Available Repositories
//!
//! - [`Users`]: accounts and their role links
//! - [`Roles`]: role definitions
//! - [`Payees`]: who bills are paid to
//! - [`Bills`]: amounts due, with status and frequency
//! - [`Payments`]: amounts paid against a bill

pub mod bills;
pub mod payees;
pub mod payments;
pub mod repository;
pub mod roles;
pub mod users;

pub use bills::{BillFilter, BillRepository, Bills};
pub use payees::{PayeeFilter, PayeeRepository, Payees};
pub use payments::{PaymentFilter, PaymentRepository, Payments};
pub use repository::Repository;
pub use roles::{RoleFilter, RoleRepository, Roles};
pub use users::{UserFilter, UserRepository, Users};
