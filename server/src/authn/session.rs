//! Bearer-token session verification
//!
//! Session issuance belongs to the identity provider; this module only
//! verifies the HS256 tokens it hands out and exposes the caller's user id
//! to handlers through an extractor.

use std::sync::Arc;

use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use chrono::Utc;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use crate::errors::PortalError;
use crate::server::state::ServerState;

/// Session verification options
#[derive(Debug, Clone)]
pub struct AuthOptions {
    /// Shared HS256 secret with the identity provider
    pub session_secret: SecretString,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            session_secret: SecretString::from("dev-session-secret"),
        }
    }
}

/// Claims carried by a session token. The role is intentionally not in the
/// token; handlers resolve it from the store.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// Subject (user ID)
    pub sub: String,

    /// Issued at timestamp
    pub iat: i64,

    /// Expiration timestamp
    pub exp: i64,
}

/// Verify a raw bearer token and return its claims
pub fn verify_session(secret: &SecretString, raw: &str) -> Result<SessionClaims, PortalError> {
    let validation = Validation::new(Algorithm::HS256);

    let token_data = decode::<SessionClaims>(
        raw,
        &DecodingKey::from_secret(secret.expose_secret().as_bytes()),
        &validation,
    )
    .map_err(|e| PortalError::Unauthorized(format!("Invalid session token: {}", e)))?;

    Ok(token_data.claims)
}

/// Mint a session token. Used by the identity-provider integration and the
/// test suite.
pub fn issue_session(
    secret: &SecretString,
    user_id: &str,
    ttl_secs: i64,
) -> Result<String, PortalError> {
    let now = Utc::now().timestamp();
    let claims = SessionClaims {
        sub: user_id.to_string(),
        iat: now,
        exp: now + ttl_secs,
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.expose_secret().as_bytes()),
    )
    .map_err(|e| PortalError::Internal(format!("Failed to sign session token: {}", e)))
}

/// Authenticated caller, extracted from the Authorization header.
/// Rejects with 401 before any lookup when the header is missing or the
/// token does not verify.
#[derive(Debug, Clone)]
pub struct Session {
    pub user_id: String,
}

impl FromRequestParts<Arc<ServerState>> for Session {
    type Rejection = PortalError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<ServerState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| PortalError::Unauthorized("Missing session".to_string()))?;

        let raw = header
            .strip_prefix("Bearer ")
            .ok_or_else(|| PortalError::Unauthorized("Malformed Authorization header".to_string()))?;

        let claims = verify_session(&state.auth.session_secret, raw)?;

        Ok(Session {
            user_id: claims.sub,
        })
    }
}
