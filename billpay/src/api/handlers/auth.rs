use crate::api::models::auth::{
    AuthResponse, AuthSuccessResponse, LoginRequest, LoginResponse, LogoutResponse, RegisterRequest,
};
use crate::api::models::users::{CurrentUser, UserResponse};
use crate::config::Config;
use crate::db::context::Database;
use crate::errors::Result;
use crate::features::auth;
use crate::AppState;
use axum::{Json, extract::State, http::StatusCode};

/// Login with username (or email) and password
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    tag = "auth",
    responses(
        (status = 200, description = "Login successful, session cookie set", body = AuthResponse),
        (status = 401, description = "Invalid credentials"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login<D: Database>(State(state): State<AppState<D>>, Json(request): Json<LoginRequest>) -> Result<LoginResponse> {
    let auth_response = auth::login(&state.db, &state.config, request).await?;
    let cookie = session_cookie(&auth_response.token, &state.config);

    Ok(LoginResponse {
        status: StatusCode::OK,
        auth_response,
        cookie,
    })
}

/// Register a new account and log it in
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    tag = "auth",
    responses(
        (status = 201, description = "User registered, session cookie set", body = AuthResponse),
        (status = 400, description = "Invalid input, taken username or email, or registration disabled"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register<D: Database>(State(state): State<AppState<D>>, Json(request): Json<RegisterRequest>) -> Result<LoginResponse> {
    let auth_response = auth::register(&state.db, &state.config, request).await?;
    let cookie = session_cookie(&auth_response.token, &state.config);

    Ok(LoginResponse {
        status: StatusCode::CREATED,
        auth_response,
        cookie,
    })
}

/// Logout (clear session cookie)
#[utoipa::path(
    post,
    path = "/auth/logout",
    tag = "auth",
    responses(
        (status = 200, description = "Logout successful", body = AuthSuccessResponse),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn logout<D: Database>(State(state): State<AppState<D>>) -> Result<LogoutResponse> {
    // An empty value with Max-Age=0 makes the browser drop the cookie
    let cookie = cookie_with_attributes(&state.config, "", 0);

    Ok(LogoutResponse {
        auth_response: AuthSuccessResponse {
            message: "Logout successful".to_string(),
        },
        cookie,
    })
}

/// The authenticated caller's own profile
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "The account no longer exists"),
    ),
    security(("BearerAuth" = []), ("CookieAuth" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn me<D: Database>(State(state): State<AppState<D>>, current_user: CurrentUser) -> Result<Json<UserResponse>> {
    Ok(Json(auth::current_user(&state.db, &current_user).await?))
}

fn session_cookie(token: &str, config: &Config) -> String {
    cookie_with_attributes(config, token, config.auth.jwt.expiry.as_secs())
}

fn cookie_with_attributes(config: &Config, value: &str, max_age: u64) -> String {
    let session = &config.auth.session;
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite={}; Max-Age={}",
        session.cookie_name, value, session.cookie_same_site, max_age
    );
    if session.cookie_secure {
        cookie.push_str("; Secure");
    }
    cookie
}
