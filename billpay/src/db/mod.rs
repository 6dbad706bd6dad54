//! Database layer for data persistence and access.
//!
//! ```text
//! ┌─────────────┐
//! │  Features   │  (crate::features - commands and queries)
//! └──────┬──────┘
//!        │ begin / commit
//!        ↓
//! ┌─────────────┐
//! │   Context   │  (db::context - one unit of work)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │ Repositories│  (db::handlers for postgres, db::in_memory for local runs)
//! └──────┬──────┘
//!        │
//!        ↓
//! ┌─────────────┐
//! │   Models    │  (db::models - database records)
//! └─────────────┘
//! ```
//!
//! # Modules
//!
//! - [`context`]: the [`Database`](context::Database) and [`PersistenceContext`](context::PersistenceContext) traits
//! - [`handlers`]: postgres repositories and the per-entity repository traits
//! - [`in_memory`]: a store with the same rules as the postgres schema, kept in process memory
//! - [`models`]: database record structures matching table schemas
//! - [`errors`]: database-specific error types
//!
//! # Transactions
//!
//! Feature code never touches a pool or connection directly. It opens a context, works through
//! its repositories, and commits:
//!
//! ```ignore
//! let mut ctx = db.begin().await?;
//! let bill = ctx.bills().create(&request).await?;
//! ctx.commit().await?;
//! ```
//!
//! # Migrations
//!
//! Migrations live in `migrations/` and are applied with [`crate::migrator`].

pub mod context;
pub mod errors;
pub mod handlers;
pub mod in_memory;
pub mod models;
