//! Repository implementations over the in-memory tables.

use super::{Tables, UserRecord};
use crate::db::errors::{DbError, Result};
use crate::db::handlers::{
    BillFilter, BillRepository, PayeeFilter, PayeeRepository, PaymentFilter, PaymentRepository, Repository, RoleFilter,
    RoleRepository, UserFilter, UserRepository,
};
use crate::db::models::{
    Scope,
    bills::{BillCreateDBRequest, BillDBResponse, BillUpdateDBRequest},
    payees::{PayeeCreateDBRequest, PayeeDBResponse, PayeeUpdateDBRequest},
    payments::{PaymentCreateDBRequest, PaymentDBResponse, PaymentUpdateDBRequest},
    roles::{RoleCreateDBRequest, RoleDBResponse, RoleUpdateDBRequest},
    users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest},
};
use crate::types::{BillId, PayeeId, PaymentId, RoleId, UserId};
use chrono::Utc;
use std::collections::HashMap;
use uuid::Uuid;

/// Apply skip/limit the way `LIMIT .. OFFSET ..` does
fn paginate<T>(rows: Vec<T>, skip: i64, limit: i64) -> Vec<T> {
    rows.into_iter()
        .skip(usize::try_from(skip).unwrap_or(0))
        .take(usize::try_from(limit).unwrap_or(0))
        .collect()
}

/// Case-insensitive match with the same Unicode folding as `LOWER(..)`
fn same_name(a: &str, b: &str) -> bool {
    a.to_lowercase() == b.to_lowercase()
}

fn count_of(n: usize) -> i64 {
    i64::try_from(n).unwrap_or(i64::MAX)
}

pub(super) struct MemUsers<'c> {
    tables: &'c mut Tables,
}

impl<'c> MemUsers<'c> {
    pub(super) fn new(tables: &'c mut Tables) -> Self {
        Self { tables }
    }

    fn with_roles(&self, user: &UserRecord) -> UserDBResponse {
        let mut roles: Vec<RoleDBResponse> = self
            .tables
            .user_roles
            .iter()
            .filter(|(user_id, _)| *user_id == user.id)
            .filter_map(|(_, role_id)| self.tables.roles.get(role_id).cloned())
            .collect();
        roles.sort_by_key(|r| r.name.to_lowercase());

        UserDBResponse {
            id: user.id,
            tenant_id: user.tenant_id,
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            roles,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }

    fn find(&self, matches: impl Fn(&UserRecord) -> bool) -> Option<UserDBResponse> {
        self.tables.users.values().find(|&u| matches(u)).map(|u| self.with_roles(u))
    }

    fn check_unique(&self, username: Option<&str>, email: Option<&str>, except: Option<UserId>) -> Result<()> {
        for user in self.tables.users.values().filter(|u| Some(u.id) != except) {
            if username.is_some_and(|name| same_name(&user.username, name)) {
                return Err(DbError::unique("users", "users_username_unique"));
            }
            if email.is_some_and(|email| same_name(&user.email, email)) {
                return Err(DbError::unique("users", "users_email_unique"));
            }
        }
        Ok(())
    }

    fn matching(&self, filter: &UserFilter) -> Vec<&UserRecord> {
        self.tables
            .users
            .values()
            .filter(|u| filter.tenant_id.is_none_or(|t| t == u.tenant_id))
            .collect()
    }
}

#[async_trait::async_trait]
impl<'c> Repository for MemUsers<'c> {
    type CreateRequest = UserCreateDBRequest;
    type UpdateRequest = UserUpdateDBRequest;
    type Response = UserDBResponse;
    type Id = UserId;
    type Filter = UserFilter;

    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        self.check_unique(Some(&request.username), Some(&request.email), None)?;
        if request.role_ids.iter().any(|id| !self.tables.roles.contains_key(id)) {
            return Err(DbError::foreign_key("user_roles", "user_roles_role_id_fkey"));
        }

        let now = Utc::now();
        let user = UserRecord {
            id: Uuid::new_v4(),
            tenant_id: request.tenant_id,
            username: request.username.clone(),
            email: request.email.clone(),
            password_hash: request.password_hash.clone(),
            created_at: now,
            updated_at: now,
        };
        for role_id in &request.role_ids {
            self.tables.user_roles.insert((user.id, *role_id));
        }
        let response = self.with_roles(&user);
        self.tables.users.insert(user.id, user);
        Ok(response)
    }

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        Ok(self.tables.users.get(&id).map(|u| self.with_roles(u)))
    }

    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        Ok(ids
            .into_iter()
            .filter_map(|id| self.tables.users.get(&id).map(|u| (id, self.with_roles(u))))
            .collect())
    }

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut users = self.matching(filter);
        users.sort_by_key(|u| (u.username.to_lowercase(), u.id));
        let users: Vec<UserDBResponse> = users.into_iter().map(|u| self.with_roles(u)).collect();
        Ok(paginate(users, filter.skip, filter.limit))
    }

    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let removed = self.tables.users.remove(&id).is_some();
        self.tables.user_roles.retain(|(user_id, _)| *user_id != id);
        Ok(removed)
    }

    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        self.check_unique(request.username.as_deref(), request.email.as_deref(), Some(id))?;

        let user = self.tables.users.get_mut(&id).ok_or(DbError::NotFound)?;
        if let Some(username) = &request.username {
            user.username = username.clone();
        }
        if let Some(email) = &request.email {
            user.email = email.clone();
        }
        if let Some(password_hash) = &request.password_hash {
            user.password_hash = password_hash.clone();
        }
        user.updated_at = Utc::now();

        let user = user.clone();
        Ok(self.with_roles(&user))
    }
}

#[async_trait::async_trait]
impl<'c> UserRepository for MemUsers<'c> {
    async fn get_by_username(&mut self, username: &str) -> Result<Option<UserDBResponse>> {
        Ok(self.find(|u| same_name(&u.username, username)))
    }

    async fn get_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>> {
        Ok(self.find(|u| same_name(&u.email, email)))
    }

    async fn username_taken(&mut self, username: &str, except: Option<UserId>) -> Result<bool> {
        Ok(self.check_unique(Some(username), None, except).is_err())
    }

    async fn email_taken(&mut self, email: &str, except: Option<UserId>) -> Result<bool> {
        Ok(self.check_unique(None, Some(email), except).is_err())
    }

    async fn add_role(&mut self, user_id: UserId, role_id: RoleId) -> Result<()> {
        if !self.tables.roles.contains_key(&role_id) {
            return Err(DbError::foreign_key("user_roles", "user_roles_role_id_fkey"));
        }
        if self.tables.users.contains_key(&user_id) {
            self.tables.user_roles.insert((user_id, role_id));
        }
        Ok(())
    }

    async fn remove_role(&mut self, user_id: UserId, role_id: RoleId) -> Result<bool> {
        Ok(self.tables.user_roles.remove(&(user_id, role_id)))
    }

    async fn count(&mut self, filter: &UserFilter) -> Result<i64> {
        Ok(count_of(self.matching(filter).len()))
    }
}

pub(super) struct MemRoles<'c> {
    tables: &'c mut Tables,
}

impl<'c> MemRoles<'c> {
    pub(super) fn new(tables: &'c mut Tables) -> Self {
        Self { tables }
    }

    fn check_unique(&self, name: &str, except: Option<RoleId>) -> Result<()> {
        if self
            .tables
            .roles
            .values()
            .any(|r| Some(r.id) != except && same_name(&r.name, name))
        {
            return Err(DbError::unique("roles", "roles_name_unique"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl<'c> Repository for MemRoles<'c> {
    type CreateRequest = RoleCreateDBRequest;
    type UpdateRequest = RoleUpdateDBRequest;
    type Response = RoleDBResponse;
    type Id = RoleId;
    type Filter = RoleFilter;

    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        self.check_unique(&request.name, None)?;

        let role = RoleDBResponse {
            id: Uuid::new_v4(),
            tenant_id: request.tenant_id,
            name: request.name.clone(),
            created_at: Utc::now(),
        };
        self.tables.roles.insert(role.id, role.clone());
        Ok(role)
    }

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        Ok(self.tables.roles.get(&id).cloned())
    }

    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        Ok(ids
            .into_iter()
            .filter_map(|id| self.tables.roles.get(&id).map(|r| (id, r.clone())))
            .collect())
    }

    async fn list(&mut self, _filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut roles: Vec<RoleDBResponse> = self.tables.roles.values().cloned().collect();
        roles.sort_by_key(|r| (r.name.to_lowercase(), r.id));
        Ok(roles)
    }

    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let removed = self.tables.roles.remove(&id).is_some();
        self.tables.user_roles.retain(|(_, role_id)| *role_id != id);
        Ok(removed)
    }

    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        self.check_unique(&request.name, Some(id))?;

        let role = self.tables.roles.get_mut(&id).ok_or(DbError::NotFound)?;
        role.name = request.name.clone();
        Ok(role.clone())
    }
}

#[async_trait::async_trait]
impl<'c> RoleRepository for MemRoles<'c> {
    async fn get_by_name(&mut self, name: &str) -> Result<Option<RoleDBResponse>> {
        Ok(self.tables.roles.values().find(|r| same_name(&r.name, name)).cloned())
    }

    async fn name_taken(&mut self, name: &str, except: Option<RoleId>) -> Result<bool> {
        Ok(self.check_unique(name, except).is_err())
    }
}

pub(super) struct MemPayees<'c> {
    tables: &'c mut Tables,
}

impl<'c> MemPayees<'c> {
    pub(super) fn new(tables: &'c mut Tables) -> Self {
        Self { tables }
    }

    fn matching(&self, filter: &PayeeFilter) -> Vec<&PayeeDBResponse> {
        self.tables
            .payees
            .values()
            .filter(|p| filter.scope.contains(p.tenant_id, p.user_id))
            .collect()
    }
}

#[async_trait::async_trait]
impl<'c> Repository for MemPayees<'c> {
    type CreateRequest = PayeeCreateDBRequest;
    type UpdateRequest = PayeeUpdateDBRequest;
    type Response = PayeeDBResponse;
    type Id = PayeeId;
    type Filter = PayeeFilter;

    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let now = Utc::now();
        let payee = PayeeDBResponse {
            id: Uuid::new_v4(),
            tenant_id: request.tenant_id,
            user_id: request.user_id,
            name: request.name.clone(),
            account_number: request.account_number.clone(),
            website: request.website.clone(),
            phone_number: request.phone_number.clone(),
            notes: request.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        self.tables.payees.insert(payee.id, payee.clone());
        Ok(payee)
    }

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        Ok(self.tables.payees.get(&id).cloned())
    }

    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        Ok(ids
            .into_iter()
            .filter_map(|id| self.tables.payees.get(&id).map(|p| (id, p.clone())))
            .collect())
    }

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut payees: Vec<PayeeDBResponse> = self.matching(filter).into_iter().cloned().collect();
        payees.sort_by_key(|p| (p.name.to_lowercase(), p.id));
        Ok(paginate(payees, filter.skip, filter.limit))
    }

    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let removed = self.tables.payees.remove(&id).is_some();
        for bill in self.tables.bills.values_mut().filter(|b| b.payee_id == Some(id)) {
            bill.payee_id = None;
        }
        Ok(removed)
    }

    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let payee = self.tables.payees.get_mut(&id).ok_or(DbError::NotFound)?;
        payee.name = request.name.clone();
        payee.account_number = request.account_number.clone();
        payee.website = request.website.clone();
        payee.phone_number = request.phone_number.clone();
        payee.notes = request.notes.clone();
        payee.updated_at = Utc::now();
        Ok(payee.clone())
    }
}

#[async_trait::async_trait]
impl<'c> PayeeRepository for MemPayees<'c> {
    async fn name_taken(&mut self, scope: &Scope, name: &str, except: Option<PayeeId>) -> Result<bool> {
        Ok(self
            .tables
            .payees
            .values()
            .any(|p| Some(p.id) != except && scope.contains(p.tenant_id, p.user_id) && same_name(&p.name, name)))
    }

    async fn count(&mut self, filter: &PayeeFilter) -> Result<i64> {
        Ok(count_of(self.matching(filter).len()))
    }
}

pub(super) struct MemBills<'c> {
    tables: &'c mut Tables,
}

impl<'c> MemBills<'c> {
    pub(super) fn new(tables: &'c mut Tables) -> Self {
        Self { tables }
    }

    fn check_payee(&self, payee_id: Option<PayeeId>) -> Result<()> {
        match payee_id {
            Some(id) if !self.tables.payees.contains_key(&id) => Err(DbError::foreign_key("bills", "bills_payee_id_fkey")),
            _ => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for MemBills<'c> {
    type CreateRequest = BillCreateDBRequest;
    type UpdateRequest = BillUpdateDBRequest;
    type Response = BillDBResponse;
    type Id = BillId;
    type Filter = BillFilter;

    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        self.check_payee(request.payee_id)?;

        let now = Utc::now();
        let bill = BillDBResponse {
            id: Uuid::new_v4(),
            tenant_id: request.tenant_id,
            user_id: request.user_id,
            payee_id: request.payee_id,
            name: request.name.clone(),
            amount: request.amount,
            due_date: request.due_date,
            billing_frequency: request.billing_frequency,
            status: request.status,
            notes: request.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        self.tables.bills.insert(bill.id, bill.clone());
        Ok(bill)
    }

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        Ok(self.tables.bills.get(&id).cloned())
    }

    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        Ok(ids
            .into_iter()
            .filter_map(|id| self.tables.bills.get(&id).map(|b| (id, b.clone())))
            .collect())
    }

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut bills: Vec<BillDBResponse> = self.tables.bills.values().filter(|b| filter.matches(b)).cloned().collect();
        bills.sort_by_key(|b| (b.due_date, b.id));
        Ok(paginate(bills, filter.skip, filter.limit))
    }

    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let removed = self.tables.bills.remove(&id).is_some();
        self.tables.payments.retain(|_, p| p.bill_id != id);
        Ok(removed)
    }

    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        self.check_payee(request.payee_id)?;

        let bill = self.tables.bills.get_mut(&id).ok_or(DbError::NotFound)?;
        bill.payee_id = request.payee_id;
        bill.name = request.name.clone();
        bill.amount = request.amount;
        bill.due_date = request.due_date;
        bill.billing_frequency = request.billing_frequency;
        bill.status = request.status;
        bill.notes = request.notes.clone();
        bill.updated_at = Utc::now();
        Ok(bill.clone())
    }
}

#[async_trait::async_trait]
impl<'c> BillRepository for MemBills<'c> {
    async fn count(&mut self, filter: &BillFilter) -> Result<i64> {
        Ok(count_of(self.tables.bills.values().filter(|b| filter.matches(b)).count()))
    }
}

pub(super) struct MemPayments<'c> {
    tables: &'c mut Tables,
}

impl<'c> MemPayments<'c> {
    pub(super) fn new(tables: &'c mut Tables) -> Self {
        Self { tables }
    }

    fn check_bill(&self, bill_id: BillId) -> Result<()> {
        if !self.tables.bills.contains_key(&bill_id) {
            return Err(DbError::foreign_key("payments", "payments_bill_id_fkey"));
        }
        Ok(())
    }
}

#[async_trait::async_trait]
impl<'c> Repository for MemPayments<'c> {
    type CreateRequest = PaymentCreateDBRequest;
    type UpdateRequest = PaymentUpdateDBRequest;
    type Response = PaymentDBResponse;
    type Id = PaymentId;
    type Filter = PaymentFilter;

    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        self.check_bill(request.bill_id)?;

        let now = Utc::now();
        let payment = PaymentDBResponse {
            id: Uuid::new_v4(),
            tenant_id: request.tenant_id,
            user_id: request.user_id,
            bill_id: request.bill_id,
            amount: request.amount,
            payment_date: request.payment_date,
            payment_method: request.payment_method.clone(),
            confirmation_number: request.confirmation_number.clone(),
            notes: request.notes.clone(),
            created_at: now,
            updated_at: now,
        };
        self.tables.payments.insert(payment.id, payment.clone());
        Ok(payment)
    }

    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        Ok(self.tables.payments.get(&id).cloned())
    }

    async fn get_bulk(&mut self, ids: Vec<Self::Id>) -> Result<HashMap<Self::Id, Self::Response>> {
        Ok(ids
            .into_iter()
            .filter_map(|id| self.tables.payments.get(&id).map(|p| (id, p.clone())))
            .collect())
    }

    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let mut payments: Vec<PaymentDBResponse> = self.tables.payments.values().filter(|p| filter.matches(p)).cloned().collect();
        payments.sort_by(|a, b| b.payment_date.cmp(&a.payment_date).then(a.id.cmp(&b.id)));
        Ok(paginate(payments, filter.skip, filter.limit))
    }

    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        Ok(self.tables.payments.remove(&id).is_some())
    }

    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        self.check_bill(request.bill_id)?;

        let payment = self.tables.payments.get_mut(&id).ok_or(DbError::NotFound)?;
        payment.tenant_id = request.tenant_id;
        payment.user_id = request.user_id;
        payment.bill_id = request.bill_id;
        payment.amount = request.amount;
        payment.payment_date = request.payment_date;
        payment.payment_method = request.payment_method.clone();
        payment.confirmation_number = request.confirmation_number.clone();
        payment.notes = request.notes.clone();
        payment.updated_at = Utc::now();
        Ok(payment.clone())
    }
}

#[async_trait::async_trait]
impl<'c> PaymentRepository for MemPayments<'c> {
    async fn count(&mut self, filter: &PaymentFilter) -> Result<i64> {
        Ok(count_of(self.tables.payments.values().filter(|p| filter.matches(p)).count()))
    }
}
