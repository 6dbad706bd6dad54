//! OpenAPI documentation for the `/api` surface, served as JSON at `/api-docs/openapi.json` and
//! rendered with Scalar at `/docs`.

use utoipa::{
    Modify, OpenApi,
    openapi::security::{ApiKey, ApiKeyValue, HttpAuthScheme, HttpBuilder, SecurityScheme},
};

use crate::api;
use crate::api::models::{auth, bills, payees, payments, roles, users};
use crate::db::models::bills::{BillStatus, BillingFrequency};

/// Bearer JWT and the session cookie carrying the same token.
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.security_schemes.insert(
                "BearerAuth".to_string(),
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .description(Some(
                            "Session token returned by `POST /auth/login`, sent in the `Authorization` header:\n\n\
                            ```\nAuthorization: Bearer YOUR_TOKEN\n```",
                        ))
                        .build(),
                ),
            );
            components.security_schemes.insert(
                "CookieAuth".to_string(),
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::with_description(
                    "billpay_session",
                    "Session cookie set by login and registration",
                ))),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    servers(
        (url = "/api", description = "Bill payment API")
    ),
    modifiers(&SecurityAddon),
    paths(
        api::handlers::auth::login,
        api::handlers::auth::register,
        api::handlers::auth::logout,
        api::handlers::auth::me,
        api::handlers::payees::list_payees,
        api::handlers::payees::get_payee,
        api::handlers::payees::create_payee,
        api::handlers::payees::update_payee,
        api::handlers::payees::delete_payee,
        api::handlers::bills::list_bills,
        api::handlers::bills::get_bill,
        api::handlers::bills::create_bill,
        api::handlers::bills::update_bill,
        api::handlers::bills::delete_bill,
        api::handlers::payments::list_payments,
        api::handlers::payments::get_payment,
        api::handlers::payments::create_payment,
        api::handlers::payments::update_payment,
        api::handlers::payments::delete_payment,
        api::handlers::users::list_users,
        api::handlers::users::get_user,
        api::handlers::users::create_user,
        api::handlers::users::update_user,
        api::handlers::users::delete_user,
        api::handlers::users::add_user_role,
        api::handlers::users::remove_user_role,
        api::handlers::roles::list_roles,
        api::handlers::roles::get_role,
        api::handlers::roles::create_role,
        api::handlers::roles::update_role,
        api::handlers::roles::delete_role,
    ),
    components(
        schemas(
            auth::LoginRequest,
            auth::RegisterRequest,
            auth::AuthResponse,
            auth::AuthSuccessResponse,
            payees::PayeeCreate,
            payees::PayeeUpdate,
            payees::PayeeResponse,
            bills::BillCreate,
            bills::BillUpdate,
            bills::BillResponse,
            BillStatus,
            BillingFrequency,
            payments::PaymentCreate,
            payments::PaymentUpdate,
            payments::PaymentResponse,
            users::UserCreate,
            users::UserUpdate,
            users::UserResponse,
            users::AddUserRole,
            roles::RoleCreate,
            roles::RoleUpdate,
            roles::RoleResponse,
        )
    ),
    tags(
        (name = "auth", description = "Login, registration and the current session"),
        (name = "payees", description = "Who bills are paid to"),
        (name = "bills", description = "Amounts due, with their schedule and status"),
        (name = "payments", description = "Payments recorded against bills"),
        (name = "users", description = "User administration (admin only)"),
        (name = "roles", description = "Role administration (admin only)"),
    ),
    info(
        title = "Bill Payment Scheduler API",
        version = "1.0.0",
        description = "Track payees, upcoming bills and the payments made against them.",
    )
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_lists_every_route_and_scheme() {
        let doc = ApiDoc::openapi();

        for path in [
            "/auth/login",
            "/auth/me",
            "/payees",
            "/payees/{id}",
            "/bills/{id}",
            "/payments",
            "/users/{id}/roles/{role_id}",
            "/roles/{id}",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }

        let components = doc.components.unwrap();
        assert!(components.security_schemes.contains_key("BearerAuth"));
        assert!(components.security_schemes.contains_key("CookieAuth"));
        assert!(components.schemas.contains_key("BillResponse"));
    }
}
