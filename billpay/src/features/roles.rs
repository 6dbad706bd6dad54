//! Role administration.
//!
//! Roles form one catalogue shared by every tenant: names are unique across the whole store and
//! each role records the tenant of the admin who created it. The built-in `Admin` and `User` roles
//! cannot be renamed or deleted, since permissions and registration look them up by name.

use super::{MAX_IDENTITY_NAME_LENGTH, check_path_id, invalid_operation, not_found, validate_name};
use crate::api::models::roles::{RoleCreate, RoleResponse, RoleUpdate};
use crate::db::context::{Database, PersistenceContext};
use crate::db::handlers::RoleFilter;
use crate::db::models::roles::{ADMIN_ROLE, RoleCreateDBRequest, RoleDBResponse, RoleUpdateDBRequest, USER_ROLE};
use crate::errors::Result;
use crate::types::{RoleId, TenantId, abbrev_uuid};
use tracing::{info, instrument};

fn is_builtin(role: &RoleDBResponse) -> bool {
    role.name.eq_ignore_ascii_case(ADMIN_ROLE) || role.name.eq_ignore_ascii_case(USER_ROLE)
}

/// Look a role up by name, creating it if it does not exist yet
pub(crate) async fn ensure_role<C: PersistenceContext>(ctx: &mut C, tenant_id: TenantId, name: &str) -> Result<RoleDBResponse> {
    if let Some(role) = ctx.roles().get_by_name(name).await? {
        return Ok(role);
    }

    let role = ctx
        .roles()
        .create(&RoleCreateDBRequest {
            tenant_id,
            name: name.to_string(),
        })
        .await?;
    info!("Created role {}", role.name);
    Ok(role)
}

#[instrument(skip(db), err)]
pub async fn list_roles<D: Database>(db: &D) -> Result<Vec<RoleResponse>> {
    let mut ctx = db.begin().await?;
    let roles = ctx.roles().list(&RoleFilter::default()).await?;
    Ok(roles.into_iter().map(RoleResponse::from).collect())
}

#[instrument(skip(db), fields(role_id = %abbrev_uuid(&id)), err)]
pub async fn get_role<D: Database>(db: &D, id: RoleId) -> Result<RoleResponse> {
    let mut ctx = db.begin().await?;
    let role = ctx.roles().get_by_id(id).await?.ok_or_else(|| not_found("Role", id))?;
    Ok(role.into())
}

#[instrument(skip(db, request), err)]
pub async fn create_role<D: Database>(db: &D, tenant_id: TenantId, request: RoleCreate) -> Result<RoleResponse> {
    let name = validate_name("Role name", &request.name, MAX_IDENTITY_NAME_LENGTH)?;

    let mut ctx = db.begin().await?;
    if ctx.roles().name_taken(&name, None).await? {
        return Err(invalid_operation(format!("A role named '{name}' already exists")));
    }

    let role = ctx.roles().create(&RoleCreateDBRequest { tenant_id, name }).await?;
    ctx.commit().await?;

    Ok(role.into())
}

#[instrument(skip(db, request), fields(role_id = %abbrev_uuid(&id)), err)]
pub async fn update_role<D: Database>(db: &D, id: RoleId, request: RoleUpdate) -> Result<RoleResponse> {
    check_path_id(id, request.id)?;
    let name = validate_name("Role name", &request.name, MAX_IDENTITY_NAME_LENGTH)?;

    let mut ctx = db.begin().await?;
    let existing = ctx.roles().get_by_id(id).await?.ok_or_else(|| not_found("Role", id))?;
    if is_builtin(&existing) && existing.name != name {
        return Err(invalid_operation(format!("The built-in role '{}' cannot be renamed", existing.name)));
    }
    if ctx.roles().name_taken(&name, Some(id)).await? {
        return Err(invalid_operation(format!("A role named '{name}' already exists")));
    }

    let role = ctx.roles().update(id, &RoleUpdateDBRequest { name }).await?;
    ctx.commit().await?;

    Ok(role.into())
}

/// Delete a role, taking it away from every user who holds it
#[instrument(skip(db), fields(role_id = %abbrev_uuid(&id)), err)]
pub async fn delete_role<D: Database>(db: &D, id: RoleId) -> Result<()> {
    let mut ctx = db.begin().await?;
    let existing = ctx.roles().get_by_id(id).await?.ok_or_else(|| not_found("Role", id))?;
    if is_builtin(&existing) {
        return Err(invalid_operation(format!("The built-in role '{}' cannot be deleted", existing.name)));
    }

    ctx.roles().delete(id).await?;
    ctx.commit().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::in_memory::InMemoryDatabase;
    use crate::errors::Error;
    use crate::test_utils::create_test_admin;
    use crate::types::DEFAULT_TENANT_ID;
    use uuid::Uuid;

    fn role_create(name: &str) -> RoleCreate {
        RoleCreate { name: name.to_string() }
    }

    #[tokio::test]
    async fn test_create_role_commits_once() {
        let db = InMemoryDatabase::new();
        let commits_before = db.commit_count();

        let role = create_role(&db, DEFAULT_TENANT_ID, role_create(" Auditor ")).await.unwrap();

        assert_eq!(db.commit_count(), commits_before + 1);
        assert_eq!(role.name, "Auditor");
        assert_eq!(role.tenant_id, DEFAULT_TENANT_ID);
        assert_eq!(get_role(&db, role.id).await.unwrap(), role);
    }

    #[tokio::test]
    async fn test_role_names_are_validated_and_unique() {
        let db = InMemoryDatabase::new();
        create_role(&db, DEFAULT_TENANT_ID, role_create("Auditor")).await.unwrap();

        let err = create_role(&db, DEFAULT_TENANT_ID, role_create("AUDITOR")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidOperation { .. }));

        let err = create_role(&db, DEFAULT_TENANT_ID, role_create("  ")).await.unwrap_err();
        assert!(matches!(err, Error::BadRequest { .. }));
    }

    #[tokio::test]
    async fn test_update_role() {
        let db = InMemoryDatabase::new();
        let auditor = create_role(&db, DEFAULT_TENANT_ID, role_create("Auditor")).await.unwrap();
        create_role(&db, DEFAULT_TENANT_ID, role_create("Viewer")).await.unwrap();

        let renamed = update_role(
            &db,
            auditor.id,
            RoleUpdate {
                id: Some(auditor.id),
                name: "Reviewer".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(renamed.name, "Reviewer");

        let err = update_role(
            &db,
            auditor.id,
            RoleUpdate {
                id: None,
                name: "viewer".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::InvalidOperation { .. }));

        let err = update_role(
            &db,
            auditor.id,
            RoleUpdate {
                id: Some(Uuid::new_v4()),
                name: "Other".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::BadRequest { .. }));
    }

    #[tokio::test]
    async fn test_roles_form_one_catalogue_across_tenants() {
        let db = InMemoryDatabase::new();
        let other_tenant = Uuid::new_v4();
        create_role(&db, DEFAULT_TENANT_ID, RoleCreate { name: "Auditor".to_string() }).await.unwrap();
        create_role(&db, other_tenant, RoleCreate { name: "Accountant".to_string() }).await.unwrap();

        let names: Vec<String> = list_roles(&db).await.unwrap().into_iter().map(|r| r.name).collect();
        assert_eq!(names, ["Accountant", "Auditor"]);

        let err = create_role(&db, other_tenant, RoleCreate { name: "auditor".to_string() })
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidOperation { .. }));
    }

    #[tokio::test]
    async fn test_builtin_roles_are_protected() {
        let db = InMemoryDatabase::new();
        create_test_admin(&db, "root").await;
        let roles = list_roles(&db).await.unwrap();
        let admin_role = roles.iter().find(|r| r.name == ADMIN_ROLE).unwrap();

        let err = delete_role(&db, admin_role.id).await.unwrap_err();
        assert!(matches!(err, Error::InvalidOperation { .. }));

        let err = update_role(
            &db,
            admin_role.id,
            RoleUpdate {
                id: None,
                name: "Superuser".to_string(),
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::InvalidOperation { .. }));
    }

    #[tokio::test]
    async fn test_delete_role() {
        let db = InMemoryDatabase::new();
        let role = create_role(&db, DEFAULT_TENANT_ID, role_create("Auditor")).await.unwrap();

        delete_role(&db, role.id).await.unwrap();

        let err = get_role(&db, role.id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        let err = delete_role(&db, role.id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_ensure_role_is_idempotent() {
        let db = InMemoryDatabase::new();

        let mut ctx = db.begin().await.unwrap();
        let first = ensure_role(&mut ctx, DEFAULT_TENANT_ID, USER_ROLE).await.unwrap();
        let second = ensure_role(&mut ctx, DEFAULT_TENANT_ID, "user").await.unwrap();
        ctx.commit().await.unwrap();

        assert_eq!(first.id, second.id);
        assert_eq!(list_roles(&db).await.unwrap().len(), 1);
    }
}
