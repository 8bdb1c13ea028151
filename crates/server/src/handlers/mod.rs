//! HTTP handlers.

pub mod chirps;
pub mod metrics;
pub mod users;
pub mod webhooks;

pub use chirps::{delete_chirp, get_chirp, get_chirps, post_chirp};
pub use metrics::{count_hits, metrics_page, metrics_reset};
pub use users::{post_login, post_refresh, post_revoke, post_user, put_user};
pub use webhooks::post_polka;

use axum::http::{header, HeaderMap};

use crate::auth;
use crate::error::{ApiError, Result};

/// Extracts the bearer credential from the authorization header.
pub(crate) fn bearer_token(headers: &HeaderMap) -> Result<&str> {
    scheme_token(headers, "Bearer ")
}

/// Extracts the webhook caller's pre-shared key.
pub(crate) fn api_key(headers: &HeaderMap) -> Result<&str> {
    scheme_token(headers, "ApiKey ")
}

fn scheme_token<'a>(headers: &'a HeaderMap, scheme: &str) -> Result<&'a str> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| ApiError::unauthorized("missing authorization header"))?;
    let value = value
        .to_str()
        .map_err(|_| ApiError::unauthorized("non-ascii authorization header"))?;
    value
        .strip_prefix(scheme)
        .ok_or_else(|| ApiError::unauthorized(format!("expected {} scheme", scheme.trim_end())))
}

/// Resolves the acting user from a bearer access token. Any failure along
/// the way surfaces as `Unauthorized`.
pub(crate) fn authenticated_user(headers: &HeaderMap, jwt_secret: &str) -> Result<u64> {
    let token = bearer_token(headers)?;
    auth::validate_token(token, jwt_secret)
}
