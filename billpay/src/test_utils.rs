//! Shared fixtures for unit and HTTP tests.

use crate::AppState;
use crate::api::models::users::CurrentUser;
use crate::auth::session;
use crate::config::Config;
use crate::db::context::{Database, PersistenceContext};
use crate::db::in_memory::InMemoryDatabase;
use crate::db::models::Scope;
use crate::db::models::roles::{ADMIN_ROLE, RoleCreateDBRequest, USER_ROLE};
use crate::db::models::users::UserCreateDBRequest;
use crate::types::{DEFAULT_TENANT_ID, TenantId};
use axum::http::{HeaderName, HeaderValue, header};
use axum_test::TestServer;

/// Password every fixture user is created with
pub const TEST_PASSWORD: &str = "test-password-123";

pub fn create_test_config() -> Config {
    let mut config = Config {
        secret_key: Some("billpay-test-secret-key".to_string()),
        admin_password: Some("admin-password-123".to_string()),
        ..Default::default()
    };
    config.auth.allow_registration = true;
    config.auth.session.cookie_secure = false;
    // Cheap hashing so the suite stays fast
    config.auth.password.argon2_memory_kib = 128;
    config.auth.password.argon2_iterations = 1;
    config
}

pub fn create_test_state() -> AppState<InMemoryDatabase> {
    AppState::builder().db(InMemoryDatabase::new()).config(create_test_config()).build()
}

/// Create a user holding the named roles, creating any role that does not exist yet
pub async fn create_test_user_in<D: Database>(db: &D, tenant_id: TenantId, username: &str, roles: &[&str]) -> CurrentUser {
    let password_hash = crate::features::hash_password(TEST_PASSWORD, &create_test_config().auth.password)
        .await
        .unwrap();

    let mut ctx = db.begin().await.unwrap();
    let mut role_ids = Vec::new();
    for name in roles {
        let existing = ctx.roles().get_by_name(name).await.unwrap();
        let role = match existing {
            Some(role) => role,
            None => ctx
                .roles()
                .create(&RoleCreateDBRequest {
                    tenant_id: DEFAULT_TENANT_ID,
                    name: name.to_string(),
                })
                .await
                .unwrap(),
        };
        role_ids.push(role.id);
    }

    let user = ctx
        .users()
        .create(&UserCreateDBRequest {
            tenant_id,
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password_hash,
            role_ids,
        })
        .await
        .unwrap();
    ctx.commit().await.unwrap();

    CurrentUser::from(&user)
}

pub async fn create_test_user<D: Database>(db: &D, username: &str) -> CurrentUser {
    create_test_user_in(db, DEFAULT_TENANT_ID, username, &[USER_ROLE]).await
}

pub async fn create_test_admin<D: Database>(db: &D, username: &str) -> CurrentUser {
    create_test_user_in(db, DEFAULT_TENANT_ID, username, &[ADMIN_ROLE, USER_ROLE]).await
}

/// Scope a regular user works in
pub fn own_scope(user: &CurrentUser) -> Scope {
    Scope::owned_by(user.tenant_id, user.id)
}

/// Scope an admin works in
pub fn tenant_scope(user: &CurrentUser) -> Scope {
    Scope::tenant(user.tenant_id)
}

/// `Authorization: Bearer <jwt>` for the given user
pub fn auth_header(user: &CurrentUser, config: &Config) -> (HeaderName, HeaderValue) {
    let token = session::create_session_token(user, config).unwrap().token;
    (header::AUTHORIZATION, HeaderValue::from_str(&format!("Bearer {token}")).unwrap())
}

/// A test server over the full router, backed by a fresh in-memory store
pub fn create_test_server() -> (TestServer, AppState<InMemoryDatabase>) {
    let state = create_test_state();
    let router = crate::build_router(state.clone()).unwrap();
    (TestServer::new(router).unwrap(), state)
}
