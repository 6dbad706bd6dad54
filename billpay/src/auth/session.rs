//! JWT session token creation and verification.

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    api::models::users::CurrentUser,
    config::Config,
    errors::Error,
    types::{TenantId, UserId},
};

/// JWT session claims
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sub: UserId,          // Subject (user ID)
    pub username: String,     // Username
    pub email: String,        // User email
    pub tenant_id: TenantId,  // Tenant the user belongs to
    pub roles: Vec<String>,   // Role names
    pub jti: Uuid,            // Token ID
    pub iat: i64,             // Issued at
    pub exp: i64,             // Expiration time
    pub iss: String,          // Issuer
    pub aud: String,          // Audience
}

impl SessionClaims {
    /// Create new session claims for a user
    pub fn new(user: &CurrentUser, config: &Config) -> Self {
        let now = Utc::now();
        let exp = now + config.auth.jwt.expiry;

        Self {
            sub: user.id,
            username: user.username.clone(),
            email: user.email.clone(),
            tenant_id: user.tenant_id,
            roles: user.roles.clone(),
            jti: Uuid::new_v4(),
            iat: now.timestamp(),
            exp: exp.timestamp(),
            iss: config.auth.jwt.issuer.clone(),
            aud: config.auth.jwt.audience.clone(),
        }
    }
}

impl From<SessionClaims> for CurrentUser {
    fn from(claims: SessionClaims) -> Self {
        Self {
            id: claims.sub,
            username: claims.username,
            email: claims.email,
            tenant_id: claims.tenant_id,
            roles: claims.roles,
        }
    }
}

/// A signed token and the moment it stops being accepted
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

fn secret_key(config: &Config) -> Result<&str, Error> {
    config.secret_key.as_deref().ok_or_else(|| Error::Internal {
        operation: "JWT sessions: secret_key is required".to_string(),
    })
}

/// Create a JWT token for a user session
pub fn create_session_token(user: &CurrentUser, config: &Config) -> Result<SessionToken, Error> {
    let claims = SessionClaims::new(user, config);
    let expires_at = DateTime::from_timestamp(claims.exp, 0).ok_or_else(|| Error::Internal {
        operation: format!("compute token expiry from {}", claims.exp),
    })?;

    let key = EncodingKey::from_secret(secret_key(config)?.as_bytes());
    let token = encode(&Header::new(Algorithm::HS256), &claims, &key).map_err(|e| Error::Internal {
        operation: format!("create JWT: {e}"),
    })?;

    Ok(SessionToken { token, expires_at })
}

/// Verify and decode a JWT session token
pub fn verify_session_token(token: &str, config: &Config) -> Result<CurrentUser, Error> {
    let key = DecodingKey::from_secret(secret_key(config)?.as_bytes());

    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.auth.jwt.issuer]);
    validation.set_audience(&[&config.auth.jwt.audience]);

    let token_data = decode::<SessionClaims>(token, &key, &validation).map_err(|e| match e.kind() {
        // Client errors (401) - malformed tokens, invalid claims, expired tokens
        jsonwebtoken::errors::ErrorKind::InvalidToken
        | jsonwebtoken::errors::ErrorKind::InvalidSignature
        | jsonwebtoken::errors::ErrorKind::ExpiredSignature
        | jsonwebtoken::errors::ErrorKind::MissingRequiredClaim(_)
        | jsonwebtoken::errors::ErrorKind::InvalidIssuer
        | jsonwebtoken::errors::ErrorKind::InvalidAudience
        | jsonwebtoken::errors::ErrorKind::InvalidSubject
        | jsonwebtoken::errors::ErrorKind::ImmatureSignature
        | jsonwebtoken::errors::ErrorKind::Base64(_)
        | jsonwebtoken::errors::ErrorKind::Json(_)
        | jsonwebtoken::errors::ErrorKind::Utf8(_)
        | jsonwebtoken::errors::ErrorKind::InvalidAlgorithm => Error::Unauthenticated { message: None },

        // Server errors (500) - key issues, internal failures
        _ => Error::Internal {
            operation: format!("JWT verification: {e}"),
        },
    })?;

    Ok(CurrentUser::from(token_data.claims))
}
