//! Sync token issuance and verification.
//!
//! A sync token bootstraps exactly one sync session, so its lifetime is
//! fixed at five minutes and not configurable.

use chrono::Utc;
use jsonwebtoken::{Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use syncgate_core::models::resolution::ResolutionResult;

use crate::error::AuthError;
use crate::key::{SigningKey, install_crypto_provider};

/// Lifetime of every issued token, in seconds.
pub const SYNC_TOKEN_LIFETIME_SECS: i64 = 300;

/// Registered claim names that custom claims may not shadow.
const REGISTERED_CLAIMS: [&str; 5] = ["sub", "iat", "iss", "aud", "exp"];

/// JWT claims of a sync token.
///
/// Serialized in declaration order: `sub`, custom claims, `iat`, `iss`,
/// `aud`, `exp`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SyncTokenClaims {
    /// Subject: organisation ID.
    pub sub: String,
    /// Resolver-provided claims (empty for organisation-ID requests).
    #[serde(flatten)]
    pub custom: Map<String, Value>,
    /// Issued-at (Unix timestamp).
    pub iat: i64,
    /// Issuer: this service's base URL.
    pub iss: String,
    /// Audience: the standard sync endpoint.
    pub aud: String,
    /// Expiration (Unix timestamp), always `iat + 300`.
    pub exp: i64,
}

/// Build the claims set for `resolution` as of `now`.
pub fn build_claims(resolution: &ResolutionResult, issuer: &str, now: i64) -> SyncTokenClaims {
    let mut custom = resolution.claims.clone();
    custom.retain(|name, _| !REGISTERED_CLAIMS.contains(&name.as_str()));

    SyncTokenClaims {
        sub: resolution.subject.clone(),
        custom,
        iat: now,
        iss: issuer.to_string(),
        aud: resolution.audience_url.clone(),
        exp: now + SYNC_TOKEN_LIFETIME_SECS,
    }
}

/// Issue a signed sync token for `resolution`.
pub fn issue_sync_token(
    resolution: &ResolutionResult,
    key: &SigningKey,
    issuer: &str,
) -> Result<String, AuthError> {
    let claims = build_claims(resolution, issuer, Utc::now().timestamp());
    key.sign(&claims)
}

/// Verify a sync token's signature, expiry, issuer and audience and
/// return its claims.
pub fn decode_sync_token(
    token: &str,
    key: &DecodingKey,
    algorithm: Algorithm,
    issuer: &str,
    audience: &str,
) -> Result<SyncTokenClaims, AuthError> {
    install_crypto_provider();

    let mut validation = Validation::new(algorithm);
    validation.set_issuer(&[issuer]);
    validation.set_audience(&[audience]);
    validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);

    jsonwebtoken::decode::<SyncTokenClaims>(token, key, &validation)
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid(e.to_string()),
        })
}
