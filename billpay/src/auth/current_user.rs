use crate::{
    AppState,
    api::models::users::CurrentUser,
    auth::session,
    config::Config,
    db::context::Database,
    errors::{Error, Result},
};
use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts},
};
use tracing::{debug, instrument, trace};

/// Extract user from an `Authorization: Bearer <jwt>` header if present and valid
/// Returns:
/// - None: No Authorization header, or not a Bearer token
/// - Some(Ok(user)): Valid JWT found and verified
/// - Some(Err(error)): Bearer token present but invalid/expired
#[instrument(skip(parts, config))]
fn try_bearer_auth(parts: &Parts, config: &Config) -> Option<Result<CurrentUser>> {
    let auth_header = parts.headers.get(header::AUTHORIZATION)?;

    let auth_str = match auth_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid authorization header: {e}"),
            }));
        }
    };

    // Not a Bearer token, try other auth methods
    let token = auth_str.strip_prefix("Bearer ")?;

    Some(session::verify_session_token(token.trim(), config))
}

/// Extract user from JWT session cookie if present and valid
/// Returns:
/// - None: No session cookie present
/// - Some(Ok(user)): Valid JWT found and verified
/// - Some(Err(error)): Session cookie present but invalid/malformed
#[instrument(skip(parts, config))]
fn try_session_cookie_auth(parts: &Parts, config: &Config) -> Option<Result<CurrentUser>> {
    let cookie_header = parts.headers.get(header::COOKIE)?;

    let cookie_str = match cookie_header.to_str() {
        Ok(s) => s,
        Err(e) => {
            return Some(Err(Error::BadRequest {
                message: format!("Invalid cookie header: {e}"),
            }));
        }
    };
    let cookie_name = &config.auth.session.cookie_name;

    let mut last_error = None;
    for cookie in cookie_str.split(';') {
        if let Some((name, value)) = cookie.trim().split_once('=')
            && name == cookie_name
        {
            match session::verify_session_token(value, config) {
                Ok(user) => return Some(Ok(user)),
                // Expired tokens are expected here; keep looking at the remaining cookies
                Err(e) => last_error = Some(e),
            }
        }
    }
    last_error.map(Err)
}

impl<D: Database> FromRequestParts<AppState<D>> for CurrentUser {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState<D>) -> Result<Self> {
        // Each method returns Option<Result<CurrentUser>>:
        // - None means the method is not applicable (no credentials present)
        // - Some(Ok(user)) means successful authentication
        // - Some(Err(error)) means credentials were present but invalid
        //
        // The first success wins, so a valid cookie still authenticates alongside a stale bearer token.
        let mut auth_errors = Vec::new();

        match try_bearer_auth(parts, &state.config) {
            Some(Ok(user)) => {
                debug!("Found bearer token authenticated user: {}", user.id);
                return Ok(user);
            }
            Some(Err(e)) => {
                trace!("Bearer token authentication failed: {:?}", e);
                auth_errors.push(("Bearer token", e));
            }
            None => trace!("No bearer token authentication attempted"),
        }

        match try_session_cookie_auth(parts, &state.config) {
            Some(Ok(user)) => {
                debug!("Found session cookie authenticated user: {}", user.id);
                return Ok(user);
            }
            Some(Err(e)) => {
                trace!("Session cookie authentication failed: {:?}", e);
                auth_errors.push(("Session cookie", e));
            }
            None => trace!("No session cookie authentication attempted"),
        }

        if auth_errors.is_empty() {
            trace!("No authentication credentials found in request");
        } else {
            trace!("All authentication attempts failed ({}): {:?}", auth_errors.len(), auth_errors);
        }
        Err(Error::Unauthenticated { message: None })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::db::in_memory::InMemoryDatabase;
    use crate::types::DEFAULT_TENANT_ID;
    use axum::extract::FromRequestParts as _;
    use uuid::Uuid;

    fn test_state() -> AppState<InMemoryDatabase> {
        let config = Config {
            secret_key: Some("current-user-test-secret".to_string()),
            ..Default::default()
        };
        AppState::builder().db(InMemoryDatabase::new()).config(config).build()
    }

    fn test_user() -> CurrentUser {
        CurrentUser {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "alice@example.com".to_string(),
            tenant_id: DEFAULT_TENANT_ID,
            roles: vec!["User".to_string()],
        }
    }

    fn parts_with(headers: &[(header::HeaderName, String)]) -> Parts {
        let mut builder = axum::http::Request::builder().uri("http://localhost/api/bills");
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        let (parts, _body) = builder.body(()).unwrap().into_parts();
        parts
    }

    #[tokio::test]
    async fn test_bearer_token_authenticates() {
        let state = test_state();
        let user = test_user();
        let token = session::create_session_token(&user, &state.config).unwrap().token;

        let mut parts = parts_with(&[(header::AUTHORIZATION, format!("Bearer {token}"))]);
        let extracted = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(extracted, user);
    }

    #[tokio::test]
    async fn test_cookie_used_when_bearer_is_invalid() {
        let state = test_state();
        let user = test_user();
        let token = session::create_session_token(&user, &state.config).unwrap().token;
        let cookie = format!("theme=dark; {}={token}", state.config.auth.session.cookie_name);

        let mut parts = parts_with(&[
            (header::AUTHORIZATION, "Bearer stale.token.value".to_string()),
            (header::COOKIE, cookie),
        ]);
        let extracted = CurrentUser::from_request_parts(&mut parts, &state).await.unwrap();
        assert_eq!(extracted.id, user.id);
    }

    #[tokio::test]
    async fn test_missing_or_invalid_credentials_are_unauthenticated() {
        let state = test_state();

        let mut parts = parts_with(&[]);
        let result = CurrentUser::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(Error::Unauthenticated { .. })));

        let mut parts = parts_with(&[(header::AUTHORIZATION, "Basic dXNlcjpwYXNz".to_string())]);
        let result = CurrentUser::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(Error::Unauthenticated { .. })));

        let mut parts = parts_with(&[(header::AUTHORIZATION, "Bearer garbage".to_string())]);
        let result = CurrentUser::from_request_parts(&mut parts, &state).await;
        assert!(matches!(result, Err(Error::Unauthenticated { .. })));
    }
}
