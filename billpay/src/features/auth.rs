//! Login, self-registration and the identity seeded at startup.

use super::roles::ensure_role;
use super::users::{check_identity_available, validate_new_identity};
use super::{hash_password, not_found, verify_password};
use crate::api::models::auth::{AuthResponse, LoginRequest, RegisterRequest};
use crate::api::models::users::{CurrentUser, UserResponse};
use crate::auth::session;
use crate::config::Config;
use crate::db::context::{Database, PersistenceContext};
use crate::db::models::roles::{ADMIN_ROLE, USER_ROLE};
use crate::db::models::users::{UserCreateDBRequest, UserDBResponse, UserUpdateDBRequest};
use crate::errors::{Error, Result};
use crate::types::{DEFAULT_TENANT_ID, UserId, abbrev_uuid};
use std::sync::OnceLock;
use tracing::{info, instrument, warn};

fn auth_response(user: UserDBResponse, config: &Config) -> Result<AuthResponse> {
    let token = session::create_session_token(&CurrentUser::from(&user), config)?;
    Ok(AuthResponse {
        token: token.token,
        expires_at: token.expires_at,
        user: UserResponse::from(user),
    })
}

static UNKNOWN_ACCOUNT_HASH: OnceLock<String> = OnceLock::new();

/// Hash verified when no account matches, so unknown names cost the same Argon2 work as known ones
async fn unknown_account_hash(config: &Config) -> Result<&'static str> {
    if let Some(hash) = UNKNOWN_ACCOUNT_HASH.get() {
        return Ok(hash);
    }
    let hash = hash_password("billpay-unknown-account", &config.auth.password).await?;
    Ok(UNKNOWN_ACCOUNT_HASH.get_or_init(|| hash))
}

/// Check credentials and issue a session token. `username` may also be an email address.
#[instrument(skip_all, err)]
pub async fn login<D: Database>(db: &D, config: &Config, request: LoginRequest) -> Result<AuthResponse> {
    let invalid = || Error::Unauthenticated {
        message: Some("Invalid username or password".to_string()),
    };

    let mut ctx = db.begin().await?;
    let login = request.username.trim();
    let by_username = ctx.users().get_by_username(login).await?;
    let user = match by_username {
        Some(user) => Some(user),
        None => ctx.users().get_by_email(login).await?,
    };
    drop(ctx);

    let Some(user) = user else {
        verify_password(&request.password, unknown_account_hash(config).await?).await?;
        return Err(invalid());
    };
    if !verify_password(&request.password, &user.password_hash).await? {
        return Err(invalid());
    }

    info!("User {} logged in", abbrev_uuid(&user.id));
    auth_response(user, config)
}

/// Create an account with the `User` role and log it in
#[instrument(skip_all, err)]
pub async fn register<D: Database>(db: &D, config: &Config, request: RegisterRequest) -> Result<AuthResponse> {
    if !config.auth.allow_registration {
        return Err(Error::BadRequest {
            message: "User registration is disabled".to_string(),
        });
    }

    let identity = validate_new_identity(&request.username, &request.email, &request.password, config)?;
    let password_hash = hash_password(&request.password, &config.auth.password).await?;
    let tenant_id = request.tenant_id.unwrap_or(DEFAULT_TENANT_ID);

    let mut ctx = db.begin().await?;
    check_identity_available(&mut ctx, Some(&identity.username), Some(&identity.email), None).await?;
    let role = ensure_role(&mut ctx, DEFAULT_TENANT_ID, USER_ROLE).await?;

    let user = ctx
        .users()
        .create(&UserCreateDBRequest {
            tenant_id,
            username: identity.username,
            email: identity.email,
            password_hash,
            role_ids: vec![role.id],
        })
        .await?;
    ctx.commit().await?;

    info!("Registered user {} in tenant {}", abbrev_uuid(&user.id), abbrev_uuid(&tenant_id));
    auth_response(user, config)
}

/// The caller's own profile, as currently stored
#[instrument(skip_all, fields(user_id = %abbrev_uuid(&caller.id)), err)]
pub async fn current_user<D: Database>(db: &D, caller: &CurrentUser) -> Result<UserResponse> {
    let mut ctx = db.begin().await?;
    let user = ctx
        .users()
        .get_by_id(caller.id)
        .await?
        .ok_or_else(|| not_found("User", caller.id))?;
    Ok(user.into())
}

/// Create the built-in roles and the configured admin account.
///
/// Safe to run on every startup: existing roles are reused, and an existing admin account gets
/// its password reset to the configured one and the `Admin` role re-granted. Without an
/// `admin_password` only the roles are created.
#[instrument(skip_all, err)]
pub async fn seed_identity<D: Database>(db: &D, config: &Config) -> Result<Option<UserId>> {
    let password_hash = match config.admin_password.as_deref() {
        Some(password) => Some(hash_password(password, &config.auth.password).await?),
        None => None,
    };

    let mut ctx = db.begin().await?;
    let admin_role = ensure_role(&mut ctx, DEFAULT_TENANT_ID, ADMIN_ROLE).await?;
    let user_role = ensure_role(&mut ctx, DEFAULT_TENANT_ID, USER_ROLE).await?;

    let Some(password_hash) = password_hash else {
        ctx.commit().await?;
        warn!("No admin_password configured, skipping creation of the admin user");
        return Ok(None);
    };

    let existing = ctx.users().get_by_username(&config.admin_username).await?;
    let admin_id = match existing {
        Some(existing) => {
            ctx.users()
                .update(
                    existing.id,
                    &UserUpdateDBRequest {
                        password_hash: Some(password_hash),
                        ..Default::default()
                    },
                )
                .await?;
            ctx.users().add_role(existing.id, admin_role.id).await?;
            existing.id
        }
        None => {
            let user = ctx
                .users()
                .create(&UserCreateDBRequest {
                    tenant_id: DEFAULT_TENANT_ID,
                    username: config.admin_username.clone(),
                    email: config.admin_email.clone(),
                    password_hash,
                    role_ids: vec![admin_role.id, user_role.id],
                })
                .await?;
            info!("Created admin user {}", user.username);
            user.id
        }
    };
    ctx.commit().await?;

    Ok(Some(admin_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::in_memory::InMemoryDatabase;
    use crate::features::roles::list_roles;
    use crate::test_utils::{TEST_PASSWORD, create_test_config, create_test_user};
    use uuid::Uuid;

    fn login_request(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    fn register_request(username: &str) -> RegisterRequest {
        RegisterRequest {
            username: username.to_string(),
            email: format!("{username}@example.com"),
            password: TEST_PASSWORD.to_string(),
            tenant_id: None,
        }
    }

    #[tokio::test]
    async fn test_login_by_username_or_email() {
        let db = InMemoryDatabase::new();
        let config = create_test_config();
        let alice = create_test_user(&db, "alice").await;

        let response = login(&db, &config, login_request("alice", TEST_PASSWORD)).await.unwrap();
        assert_eq!(response.user.id, alice.id);
        let claims = session::verify_session_token(&response.token, &config).unwrap();
        assert_eq!(claims, alice);

        let response = login(&db, &config, login_request("alice@example.com", TEST_PASSWORD)).await.unwrap();
        assert_eq!(response.user.id, alice.id);
    }

    #[tokio::test]
    async fn test_login_rejects_bad_credentials() {
        let db = InMemoryDatabase::new();
        let config = create_test_config();
        create_test_user(&db, "alice").await;

        let err = login(&db, &config, login_request("alice", "wrong-password")).await.unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));

        let err = login(&db, &config, login_request("nobody", TEST_PASSWORD)).await.unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));
    }

    #[tokio::test]
    async fn test_unknown_account_still_checks_a_password_hash() {
        let db = InMemoryDatabase::new();
        let config = create_test_config();

        let err = login(&db, &config, login_request("ghost", "whatever-password")).await.unwrap_err();
        assert!(matches!(err, Error::Unauthenticated { .. }));

        let hash = UNKNOWN_ACCOUNT_HASH.get().expect("hash is computed on first miss");
        assert!(hash.starts_with("$argon2id$"));
        assert!(!verify_password("whatever-password", hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_register_creates_user_with_user_role() {
        let db = InMemoryDatabase::new();
        let config = create_test_config();
        let commits_before = db.commit_count();

        let response = register(&db, &config, register_request("newbie")).await.unwrap();

        assert_eq!(db.commit_count(), commits_before + 1);
        assert_eq!(response.user.username, "newbie");
        assert_eq!(response.user.tenant_id, DEFAULT_TENANT_ID);
        assert_eq!(response.user.roles.len(), 1);
        assert_eq!(response.user.roles[0].name, USER_ROLE);

        let err = register(&db, &config, register_request("newbie")).await.unwrap_err();
        assert!(matches!(err, Error::InvalidOperation { .. }));
    }

    #[tokio::test]
    async fn test_register_into_named_tenant() {
        let db = InMemoryDatabase::new();
        let config = create_test_config();
        let tenant_id = Uuid::new_v4();

        let mut request = register_request("tenant-user");
        request.tenant_id = Some(tenant_id);
        let response = register(&db, &config, request).await.unwrap();
        assert_eq!(response.user.tenant_id, tenant_id);
    }

    #[tokio::test]
    async fn test_register_disabled() {
        let db = InMemoryDatabase::new();
        let mut config = create_test_config();
        config.auth.allow_registration = false;

        let err = register(&db, &config, register_request("newbie")).await.unwrap_err();
        assert!(matches!(err, Error::BadRequest { .. }));
        assert_eq!(db.commit_count(), 0);
    }

    #[tokio::test]
    async fn test_current_user_reads_stored_profile() {
        let db = InMemoryDatabase::new();
        let alice = create_test_user(&db, "alice").await;

        let profile = current_user(&db, &alice).await.unwrap();
        assert_eq!(profile.id, alice.id);
        assert_eq!(profile.email, alice.email);

        let mut ghost = alice.clone();
        ghost.id = Uuid::new_v4();
        let err = current_user(&db, &ghost).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_seed_identity_is_idempotent() {
        let db = InMemoryDatabase::new();
        let mut config = create_test_config();

        let first = seed_identity(&db, &config).await.unwrap().unwrap();
        config.admin_password = Some("rotated-password-1".to_string());
        let second = seed_identity(&db, &config).await.unwrap().unwrap();
        assert_eq!(first, second);

        let roles = list_roles(&db).await.unwrap();
        assert_eq!(roles.len(), 2);

        // The password follows the configuration
        let response = login(&db, &config, login_request(&config.admin_username, "rotated-password-1"))
            .await
            .unwrap();
        assert!(response.user.roles.iter().any(|r| r.name == ADMIN_ROLE));
    }

    #[tokio::test]
    async fn test_seed_identity_without_admin_password_only_creates_roles() {
        let db = InMemoryDatabase::new();
        let mut config = create_test_config();
        config.admin_password = None;

        assert_eq!(seed_identity(&db, &config).await.unwrap(), None);
        assert_eq!(list_roles(&db).await.unwrap().len(), 2);
    }
}
