//! Common type definitions and permission system types.
//!
//! This module defines:
//! - Type aliases for entity IDs (UserId, BillId, etc.)
//! - The default tenant used when a request does not name one
//! - Resource and operation enums for access control
//!
//! # Permission System
//!
//! - [`Resource`]: What entity type is being accessed (Users, Bills, Payments, etc.)
//! - [`Operation`]: What action is being performed (Read, Create, Update, Delete)
//! - [`Permission`]: Authorization requirement combining resource and operation
//!
//! Operations come in two flavors:
//! - **All**: Unrestricted access to every entity in the caller's tenant (e.g., `ReadAll`)
//! - **Own**: Restricted to entities the caller owns (e.g., `ReadOwn`, `UpdateOwn`)

use std::fmt;
use uuid::{Uuid, uuid};

// Type aliases for IDs
pub type UserId = Uuid;
pub type RoleId = Uuid;
pub type TenantId = Uuid;
pub type PayeeId = Uuid;
pub type BillId = Uuid;
pub type PaymentId = Uuid;

/// Tenant assigned to rows created without an explicit tenant.
pub const DEFAULT_TENANT_ID: TenantId = uuid!("3e802e65-916e-4f2c-8068-abdd3b93dc2c");

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}

// Operations that can be performed on resources
// *-All means unrestricted access within the tenant, *-Own means restricted to own resources
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    CreateAll,
    CreateOwn,
    ReadAll,
    ReadOwn,
    UpdateAll,
    UpdateOwn,
    DeleteAll,
    DeleteOwn,
}

impl Operation {
    /// The unrestricted counterpart of this operation (`ReadOwn` -> `ReadAll`).
    pub fn as_all(self) -> Self {
        match self {
            Operation::CreateAll | Operation::CreateOwn => Operation::CreateAll,
            Operation::ReadAll | Operation::ReadOwn => Operation::ReadAll,
            Operation::UpdateAll | Operation::UpdateOwn => Operation::UpdateAll,
            Operation::DeleteAll | Operation::DeleteOwn => Operation::DeleteAll,
        }
    }
}

// Resources that can be operated on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Users,
    Roles,
    Payees,
    Bills,
    Payments,
}

// Permission types for authorization
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Permission {
    /// Simple permission: (Resource, Operation)
    Allow(Resource, Operation),
    /// Logical combinator
    Any(Vec<Permission>),
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::CreateAll | Operation::CreateOwn => write!(f, "Create"),
            Operation::ReadAll | Operation::ReadOwn => write!(f, "Read"),
            Operation::UpdateAll | Operation::UpdateOwn => write!(f, "Update"),
            Operation::DeleteAll | Operation::DeleteOwn => write!(f, "Delete"),
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Resource::Users => write!(f, "users"),
            Resource::Roles => write!(f, "roles"),
            Resource::Payees => write!(f, "payees"),
            Resource::Bills => write!(f, "bills"),
            Resource::Payments => write!(f, "payments"),
        }
    }
}
