//! Credentials and tokens.
//!
//! Two token kinds with different trust models: access tokens are
//! self-contained HS256 JWTs valid for one hour; refresh tokens are opaque
//! random strings looked up against the datastore. Passwords are hashed with
//! bcrypt at a configurable cost.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, Result};

/// Issuer claim stamped into every access token.
pub const TOKEN_ISSUER: &str = "chirpy";

/// Access token lifetime.
const TOKEN_TTL_HOURS: i64 = 1;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
}

/// Hashes a password with bcrypt. Primitive failure is exceptional and maps
/// to an internal error, not a client-facing one.
pub fn hash_password(plain: &str, cost: u32) -> Result<String> {
    bcrypt::hash(plain, cost).map_err(|e| ApiError::Internal(format!("bcrypt hash failed: {e}")))
}

/// Checks a password against a stored bcrypt digest.
pub fn verify_password(plain: &str, digest: &str) -> Result<bool> {
    bcrypt::verify(plain, digest)
        .map_err(|e| ApiError::Internal(format!("bcrypt verify failed: {e}")))
}

/// Issues an access token for `user_id`, valid for one hour from now.
pub fn create_token(user_id: u64, secret: &str) -> Result<String> {
    create_token_at(user_id, secret, Utc::now())
}

/// Issues an access token with an explicit issue time. Production code goes
/// through [`create_token`]; tests use this to exercise expiry.
pub fn create_token_at(user_id: u64, secret: &str, issued_at: DateTime<Utc>) -> Result<String> {
    let claims = Claims {
        iss: TOKEN_ISSUER.to_string(),
        sub: user_id.to_string(),
        iat: issued_at.timestamp(),
        exp: (issued_at + Duration::hours(TOKEN_TTL_HOURS)).timestamp(),
    };

    encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ApiError::Internal(format!("token signing failed: {e}")))
}

/// Validates an access token and returns its subject user id.
///
/// Only HS256 is accepted; a token declaring any other algorithm fails
/// validation regardless of its signature. All failure modes collapse to
/// `Unauthorized` outward, with the distinction kept in the log detail.
pub fn validate_token(token: &str, secret: &str) -> Result<u64> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    let data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map_err(|e| {
        let detail = match e.kind() {
            ErrorKind::ExpiredSignature => "token expired".to_string(),
            ErrorKind::InvalidSignature => "invalid token signature".to_string(),
            other => format!("malformed token: {other:?}"),
        };
        ApiError::unauthorized(detail)
    })?;

    data.claims
        .sub
        .parse::<u64>()
        .map_err(|_| ApiError::unauthorized(format!("non-numeric subject: {}", data.claims.sub)))
}

/// Issues an opaque refresh token: 32 bytes of OS randomness, hex-encoded.
/// Randomness-source exhaustion aborts the process.
pub fn create_refresh_token() -> String {
    let mut bytes = [0u8; 32];
    OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}
