//! Units of work over the repositories.
//!
//! A [`Database`] hands out one [`PersistenceContext`] per request. The context exposes one
//! repository per entity and is either committed, making every change visible at once, or
//! dropped, discarding them.

use crate::db::errors::Result;
use crate::db::handlers::{
    BillRepository, Bills, PayeeRepository, Payees, PaymentRepository, Payments, RoleRepository, Roles, UserRepository, Users,
};
use sqlx::{PgPool, Postgres, Transaction};

/// One unit of work
#[async_trait::async_trait]
pub trait PersistenceContext: Send + Sized {
    fn users(&mut self) -> Box<dyn UserRepository + '_>;

    fn roles(&mut self) -> Box<dyn RoleRepository + '_>;

    fn payees(&mut self) -> Box<dyn PayeeRepository + '_>;

    fn bills(&mut self) -> Box<dyn BillRepository + '_>;

    fn payments(&mut self) -> Box<dyn PaymentRepository + '_>;

    /// Make every change of this unit of work visible
    async fn commit(self) -> Result<()>;
}

/// Handle to a backing store that can open units of work
#[async_trait::async_trait]
pub trait Database: Clone + Send + Sync + 'static {
    type Context: PersistenceContext + 'static;

    async fn begin(&self) -> Result<Self::Context>;
}

/// Postgres-backed store. Each context is one transaction.
#[derive(Debug, Clone)]
pub struct PostgresDatabase {
    pool: PgPool,
}

impl PostgresDatabase {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait::async_trait]
impl Database for PostgresDatabase {
    type Context = PgContext;

    async fn begin(&self) -> Result<PgContext> {
        Ok(PgContext {
            tx: self.pool.begin().await?,
        })
    }
}

/// A postgres transaction. Dropping it without [`PersistenceContext::commit`] rolls back.
pub struct PgContext {
    tx: Transaction<'static, Postgres>,
}

#[async_trait::async_trait]
impl PersistenceContext for PgContext {
    fn users(&mut self) -> Box<dyn UserRepository + '_> {
        Box::new(Users::new(&mut self.tx))
    }

    fn roles(&mut self) -> Box<dyn RoleRepository + '_> {
        Box::new(Roles::new(&mut self.tx))
    }

    fn payees(&mut self) -> Box<dyn PayeeRepository + '_> {
        Box::new(Payees::new(&mut self.tx))
    }

    fn bills(&mut self) -> Box<dyn BillRepository + '_> {
        Box::new(Bills::new(&mut self.tx))
    }

    fn payments(&mut self) -> Box<dyn PaymentRepository + '_> {
        Box::new(Payments::new(&mut self.tx))
    }

    async fn commit(self) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
