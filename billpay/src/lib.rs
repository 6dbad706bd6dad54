//! # billpay: Bill Payment Scheduler
//!
//! `billpay` keeps track of who a household pays (payees), what is due and when (bills), and
//! what has been paid (payments), behind a small identity service with users, roles and JWT
//! sessions.
//!
//! ## Architecture
//!
//! Requests flow through three layers:
//!
//! - [`api`]: axum handlers and the JSON request/response models. Handlers authenticate the
//!   caller, check the required permission and pick the [`Scope`](db::models::Scope) of rows the
//!   caller may reach.
//! - [`features`]: one function per operation. Each opens a unit of work, validates the request
//!   against the stored state and commits.
//! - [`db`]: the [`Database`](db::context::Database) abstraction with a PostgreSQL backend and
//!   an in-memory backend that follows the same rules.
//!
//! Admins see and manage every row of their tenant; everyone else works on the rows they own.
//!
//! ## Quick Start
//!
//! ```no_run
//! use billpay::{Application, Config};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = Config::default();
//!     let app = Application::new(config).await?;
//!     app.serve(std::future::pending()).await
//! }
//! ```
//!
//! ## Configuration
//!
//! See [`config`] for the YAML layout and the `BILLPAY_` environment overrides.

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod features;
pub mod openapi;
pub mod telemetry;
pub mod types;

#[cfg(test)]
mod test_utils;

use crate::config::{CorsOrigin, DatabaseConfig, PoolSettings};
use crate::db::context::{Database, PostgresDatabase};
use crate::db::in_memory::InMemoryDatabase;
use crate::openapi::ApiDoc;
use axum::{
    Json, Router,
    http::{self, HeaderValue},
    routing::{delete, get, post},
};
use bon::Builder;
pub use config::Config;
use sqlx::{PgPool, postgres::PgPoolOptions};
use std::time::Duration;
use tokio::net::TcpListener;
use tower_http::{
    cors::{AllowOrigin, CorsLayer},
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{Level, info, instrument};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

/// Application state shared across all request handlers.
///
/// # Example
///
/// ```ignore
/// let state = AppState::builder()
///     .db(InMemoryDatabase::new())
///     .config(config)
///     .build();
/// ```
#[derive(Clone, Builder)]
pub struct AppState<D: Database> {
    pub db: D,
    pub config: Config,
}

/// Get the billpay database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Build the CORS layer from the configured origins
fn create_cors_layer(config: &Config) -> anyhow::Result<CorsLayer> {
    let mut origins = Vec::new();
    let mut any_origin = false;
    for origin in &config.auth.cors.allowed_origins {
        match origin {
            CorsOrigin::Wildcard => any_origin = true,
            // Url::as_str keeps a trailing slash that browsers never send in Origin
            CorsOrigin::Url(url) => origins.push(url.as_str().trim_end_matches('/').parse::<HeaderValue>()?),
        }
    }
    let allow_origin = if any_origin { AllowOrigin::any() } else { AllowOrigin::list(origins) };

    let mut cors = CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([http::Method::GET, http::Method::POST, http::Method::PUT, http::Method::DELETE])
        .allow_headers([http::header::AUTHORIZATION, http::header::CONTENT_TYPE])
        .allow_credentials(config.auth.cors.allow_credentials)
        .expose_headers(vec![http::header::LOCATION]);

    if let Some(max_age) = config.auth.cors.max_age {
        cors = cors.max_age(Duration::from_secs(max_age));
    }

    Ok(cors)
}

/// Build the application router: the `/api` routes, health check, OpenAPI docs, CORS and
/// request tracing.
///
/// # Errors
///
/// Returns an error if the CORS configuration is invalid.
#[instrument(skip_all)]
pub fn build_router<D: Database>(state: AppState<D>) -> anyhow::Result<Router> {
    use crate::api::handlers::{auth, bills, payees, payments, roles, users};

    let auth_routes = Router::new()
        .route("/auth/login", post(auth::login::<D>))
        .route("/auth/register", post(auth::register::<D>))
        .route("/auth/logout", post(auth::logout::<D>))
        .route("/auth/me", get(auth::me::<D>));

    let api_routes = Router::new()
        // Payees
        .route("/payees", get(payees::list_payees::<D>).post(payees::create_payee::<D>))
        .route(
            "/payees/{id}",
            get(payees::get_payee::<D>)
                .put(payees::update_payee::<D>)
                .delete(payees::delete_payee::<D>),
        )
        // Bills
        .route("/bills", get(bills::list_bills::<D>).post(bills::create_bill::<D>))
        .route(
            "/bills/{id}",
            get(bills::get_bill::<D>).put(bills::update_bill::<D>).delete(bills::delete_bill::<D>),
        )
        // Payments
        .route("/payments", get(payments::list_payments::<D>).post(payments::create_payment::<D>))
        .route(
            "/payments/{id}",
            get(payments::get_payment::<D>)
                .put(payments::update_payment::<D>)
                .delete(payments::delete_payment::<D>),
        )
        // User management (admin only)
        .route("/users", get(users::list_users::<D>).post(users::create_user::<D>))
        .route(
            "/users/{id}",
            get(users::get_user::<D>).put(users::update_user::<D>).delete(users::delete_user::<D>),
        )
        .route("/users/{id}/roles", post(users::add_user_role::<D>))
        .route("/users/{id}/roles/{role_id}", delete(users::remove_user_role::<D>))
        // Role management (admin only)
        .route("/roles", get(roles::list_roles::<D>).post(roles::create_role::<D>))
        .route(
            "/roles/{id}",
            get(roles::get_role::<D>).put(roles::update_role::<D>).delete(roles::delete_role::<D>),
        );

    let cors_layer = create_cors_layer(&state.config)?;

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .nest("/api", auth_routes.merge(api_routes).with_state(state))
        .route("/api-docs/openapi.json", get(|| async { Json(ApiDoc::openapi()) }))
        .merge(Scalar::with_url("/docs", ApiDoc::openapi()))
        .layer(cors_layer)
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_request(DefaultOnRequest::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        );

    Ok(router)
}

/// Connect to PostgreSQL with the configured pool settings
async fn connect_pool(url: &str, settings: &PoolSettings) -> anyhow::Result<PgPool> {
    let non_zero = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));

    let pool = PgPoolOptions::new()
        .max_connections(settings.max_connections)
        .min_connections(settings.min_connections)
        .acquire_timeout(Duration::from_secs(settings.acquire_timeout_secs))
        .idle_timeout(non_zero(settings.idle_timeout_secs))
        .max_lifetime(non_zero(settings.max_lifetime_secs))
        .connect(url)
        .await?;
    Ok(pool)
}

/// Seed the identity data and build the router over a ready store
async fn prepare<D: Database>(db: D, config: &Config) -> anyhow::Result<Router> {
    if let Some(admin_id) = features::auth::seed_identity(&db, config).await? {
        info!("Admin user {} is ready", types::abbrev_uuid(&admin_id));
    }
    build_router(AppState::builder().db(db).config(config.clone()).build())
}

/// The configured server: a router over the chosen store, ready to be served.
pub struct Application {
    router: Router,
    config: Config,
    pool: Option<PgPool>,
}

impl Application {
    /// Set up the store (connecting and migrating PostgreSQL when configured), seed the built-in
    /// roles and admin account, and build the router.
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        let (router, pool) = match &config.database {
            DatabaseConfig::External { url, pool: settings } => {
                info!("Using external PostgreSQL database");
                let pool = connect_pool(url, settings).await?;
                migrator().run(&pool).await?;
                let router = prepare(PostgresDatabase::new(pool.clone()), &config).await?;
                (router, Some(pool))
            }
            DatabaseConfig::Memory => {
                info!("Using in-memory store, data is lost on shutdown");
                (prepare(InMemoryDatabase::new(), &config).await?, None)
            }
        };

        Ok(Self { router, config, pool })
    }

    /// Serve until `shutdown` resolves, then close the pool and flush telemetry
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!(
            "Bill payment scheduler listening on http://{}, docs at http://localhost:{}/docs",
            bind_addr, self.config.port
        );

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        if let Some(pool) = self.pool {
            info!("Closing database connections...");
            pool.close().await;
        }

        info!("Shutting down telemetry...");
        telemetry::shutdown_telemetry();

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::api::models::auth::AuthResponse;
    use crate::test_utils::{create_test_config, create_test_server};
    use axum_test::TestServer;
    use serde_json::json;

    #[test_log::test(tokio::test)]
    async fn test_healthz() {
        let (server, _state) = create_test_server();
        let response = server.get("/healthz").await;
        response.assert_status_ok();
        response.assert_text("OK");
    }

    #[test_log::test(tokio::test)]
    async fn test_openapi_document_is_served() {
        let (server, _state) = create_test_server();
        let doc: serde_json::Value = server.get("/api-docs/openapi.json").await.json();
        assert_eq!(doc["info"]["title"], "Bill Payment Scheduler API");
        assert!(doc["paths"]["/bills"].is_object());
    }

    #[test_log::test(tokio::test)]
    async fn test_seeded_admin_can_log_in_and_manage_users() {
        let config = create_test_config();
        let router = prepare(InMemoryDatabase::new(), &config).await.unwrap();
        let server = TestServer::new(router).unwrap();

        let body: AuthResponse = server
            .post("/api/auth/login")
            .json(&json!({"username": "admin", "password": "admin-password-123"}))
            .await
            .json();
        assert!(body.user.roles.iter().any(|r| r.name == "Admin"));

        server
            .get("/api/users")
            .add_header(http::header::AUTHORIZATION, format!("Bearer {}", body.token))
            .await
            .assert_status_ok();
    }

    #[test_log::test(tokio::test)]
    async fn test_cors_preflight_allows_configured_origin() {
        let (server, _state) = create_test_server();
        let response = server
            .method(http::Method::OPTIONS, "/api/bills")
            .add_header(http::header::ORIGIN, "http://localhost:4200")
            .add_header(http::header::ACCESS_CONTROL_REQUEST_METHOD, "GET")
            .await;
        assert_eq!(
            response.header(http::header::ACCESS_CONTROL_ALLOW_ORIGIN).to_str().unwrap(),
            "http://localhost:4200"
        );
    }
}
