//! Database record structures and the request types repositories accept.

pub mod bills;
pub mod payees;
pub mod payments;
pub mod roles;
pub mod users;

use crate::types::{TenantId, UserId};

/// The slice of data a caller may see: their tenant, and for non-admins only the rows they own.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Scope {
    pub tenant_id: TenantId,
    pub owner: Option<UserId>,
}

impl Scope {
    /// Every row of the tenant
    pub fn tenant(tenant_id: TenantId) -> Self {
        Self { tenant_id, owner: None }
    }

    /// Only rows of the tenant owned by `user_id`
    pub fn owned_by(tenant_id: TenantId, user_id: UserId) -> Self {
        Self {
            tenant_id,
            owner: Some(user_id),
        }
    }

    /// Whether a row with this tenant and owner is visible
    pub fn contains(&self, tenant_id: TenantId, user_id: UserId) -> bool {
        self.tenant_id == tenant_id && self.owner.is_none_or(|owner| owner == user_id)
    }
}
