//! Role-based access control.
//!
//! The `Admin` role (matched case-insensitively) grants every operation on every resource within
//! the caller's tenant. Every other authenticated user may work on the payees, bills and payments
//! they own, and nothing else.
//!
//! Handlers state what they need in their signature:
//!
//! ```ignore
//! async fn delete_bill<D: Database>(perm: RequiresPermission<resource::Bills, operation::DeleteOwn>, ..) { .. }
//! ```
//!
//! Own-level requirements are met by All-level grants, and [`RequiresPermission::scope`] tells the
//! handler which rows the caller can reach.

use crate::{
    AppState,
    api::models::users::CurrentUser,
    db::{context::Database, models::Scope},
    errors::Error,
    types::{Operation, Permission, Resource},
};
use axum::{extract::FromRequestParts, http::request::Parts};
use std::marker::PhantomData;

/// Type-level resources for [`RequiresPermission`]
pub mod resource {
    use crate::types::Resource;

    pub trait ResourceType: Send + Sync + 'static {
        const RESOURCE: Resource;
    }

    macro_rules! resources {
        ($($name:ident),* $(,)?) => {
            $(
                pub struct $name;
                impl ResourceType for $name {
                    const RESOURCE: Resource = Resource::$name;
                }
            )*
        };
    }

    resources!(Users, Roles, Payees, Bills, Payments);
}

/// Type-level operations for [`RequiresPermission`]
pub mod operation {
    use crate::types::Operation;

    pub trait OperationType: Send + Sync + 'static {
        const OPERATION: Operation;
    }

    macro_rules! operations {
        ($($name:ident),* $(,)?) => {
            $(
                pub struct $name;
                impl OperationType for $name {
                    const OPERATION: Operation = Operation::$name;
                }
            )*
        };
    }

    operations!(CreateAll, CreateOwn, ReadAll, ReadOwn, UpdateAll, UpdateOwn, DeleteAll, DeleteOwn);
}

/// Whether the user holds the `Admin` role
pub fn is_admin(user: &CurrentUser) -> bool {
    user.roles.iter().any(|r| r.eq_ignore_ascii_case(crate::db::models::roles::ADMIN_ROLE))
}

/// Whether the user may perform `operation` on `resource`
pub fn has_permission(user: &CurrentUser, resource: Resource, operation: Operation) -> bool {
    if is_admin(user) {
        return true;
    }

    let owned = matches!(resource, Resource::Payees | Resource::Bills | Resource::Payments);
    let own_level = matches!(
        operation,
        Operation::CreateOwn | Operation::ReadOwn | Operation::UpdateOwn | Operation::DeleteOwn
    );
    owned && own_level
}

/// The rows of `resource` the user can reach with `operation`
pub fn scope_for(user: &CurrentUser, resource: Resource, operation: Operation) -> Scope {
    if has_permission(user, resource, operation.as_all()) {
        Scope::tenant(user.tenant_id)
    } else {
        Scope::owned_by(user.tenant_id, user.id)
    }
}

/// Extractor that authenticates the caller and rejects them unless they hold the permission
pub struct RequiresPermission<R: resource::ResourceType, O: operation::OperationType> {
    pub current_user: CurrentUser,
    _marker: PhantomData<(R, O)>,
}

impl<R: resource::ResourceType, O: operation::OperationType> RequiresPermission<R, O> {
    /// The rows the caller can reach with this permission
    pub fn scope(&self) -> Scope {
        scope_for(&self.current_user, R::RESOURCE, O::OPERATION)
    }
}

impl<D, R, O> FromRequestParts<AppState<D>> for RequiresPermission<R, O>
where
    D: Database,
    R: resource::ResourceType,
    O: operation::OperationType,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &AppState<D>) -> Result<Self, Self::Rejection> {
        let current_user = CurrentUser::from_request_parts(parts, state).await?;

        if !has_permission(&current_user, R::RESOURCE, O::OPERATION) {
            return Err(Error::InsufficientPermissions {
                required: Permission::Allow(R::RESOURCE, O::OPERATION),
                action: O::OPERATION,
                resource: R::RESOURCE.to_string(),
            });
        }

        Ok(Self {
            current_user,
            _marker: PhantomData,
        })
    }
}
