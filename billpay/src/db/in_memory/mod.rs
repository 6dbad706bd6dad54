//! In-memory store for local runs and tests.
//!
//! Tables live behind a `tokio::sync::RwLock`. A context takes the write lock for its whole
//! lifetime and works on a copy of the tables; commit writes the copy back. Units of work are
//! therefore serialised, and an uncommitted context leaves the store untouched.
//!
//! The store enforces the same unique and foreign key rules, and the same cascades, as the
//! postgres schema in `migrations/`.

mod repos;

use crate::db::context::{Database, PersistenceContext};
use crate::db::errors::Result;
use crate::db::handlers::{BillRepository, PayeeRepository, PaymentRepository, RoleRepository, UserRepository};
use crate::db::models::{bills::BillDBResponse, payees::PayeeDBResponse, payments::PaymentDBResponse, roles::RoleDBResponse};
use crate::types::{BillId, PayeeId, PaymentId, RoleId, TenantId, UserId};
use chrono::{DateTime, Utc};
use repos::{MemBills, MemPayees, MemPayments, MemRoles, MemUsers};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};

/// A user row, without its roles
#[derive(Debug, Clone)]
pub(crate) struct UserRecord {
    pub id: UserId,
    pub tenant_id: TenantId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub(crate) struct Tables {
    pub users: HashMap<UserId, UserRecord>,
    pub roles: HashMap<RoleId, RoleDBResponse>,
    pub user_roles: BTreeSet<(UserId, RoleId)>,
    pub payees: HashMap<PayeeId, PayeeDBResponse>,
    pub bills: HashMap<BillId, BillDBResponse>,
    pub payments: HashMap<PaymentId, PaymentDBResponse>,
}

/// Shared handle to the in-memory tables
#[derive(Debug, Clone, Default)]
pub struct InMemoryDatabase {
    tables: Arc<RwLock<Tables>>,
    commits: Arc<AtomicUsize>,
}

impl InMemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of units of work committed so far
    pub fn commit_count(&self) -> usize {
        self.commits.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Database for InMemoryDatabase {
    type Context = InMemoryContext;

    async fn begin(&self) -> Result<InMemoryContext> {
        let guard = self.tables.clone().write_owned().await;
        let working = (*guard).clone();
        Ok(InMemoryContext {
            guard,
            working,
            commits: self.commits.clone(),
        })
    }
}

/// A unit of work over the in-memory tables
pub struct InMemoryContext {
    guard: OwnedRwLockWriteGuard<Tables>,
    working: Tables,
    commits: Arc<AtomicUsize>,
}

#[async_trait::async_trait]
impl PersistenceContext for InMemoryContext {
    fn users(&mut self) -> Box<dyn UserRepository + '_> {
        Box::new(MemUsers::new(&mut self.working))
    }

    fn roles(&mut self) -> Box<dyn RoleRepository + '_> {
        Box::new(MemRoles::new(&mut self.working))
    }

    fn payees(&mut self) -> Box<dyn PayeeRepository + '_> {
        Box::new(MemPayees::new(&mut self.working))
    }

    fn bills(&mut self) -> Box<dyn BillRepository + '_> {
        Box::new(MemBills::new(&mut self.working))
    }

    fn payments(&mut self) -> Box<dyn PaymentRepository + '_> {
        Box::new(MemPayments::new(&mut self.working))
    }

    async fn commit(self) -> Result<()> {
        let InMemoryContext {
            mut guard,
            working,
            commits,
        } = self;
        *guard = working;
        commits.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}
