//! Payment-provider webhook.
//!
//! Authenticated by a pre-shared static key, not a bearer token. Only the
//! `user.upgraded` event has an effect; anything else is acknowledged and
//! dropped.

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use super::api_key;
use crate::config::AppState;
use crate::error::{ApiError, Result};

const UPGRADE_EVENT: &str = "user.upgraded";

#[derive(Debug, Deserialize)]
pub struct PolkaRequest {
    pub event: String,
    pub data: PolkaData,
}

#[derive(Debug, Deserialize)]
pub struct PolkaData {
    pub user_id: u64,
}

/// POST /api/polka/webhooks
pub async fn post_polka(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PolkaRequest>,
) -> Result<StatusCode> {
    let key = api_key(&headers)?;
    if key != state.config.polka_key {
        return Err(ApiError::unauthorized("invalid polka api key"));
    }

    if req.event != UPGRADE_EVENT {
        return Ok(StatusCode::NO_CONTENT);
    }

    state.store.upgrade_to_red(req.data.user_id).await?;
    info!("polka webhook upgraded user {}", req.data.user_id);

    Ok(StatusCode::NO_CONTENT)
}
