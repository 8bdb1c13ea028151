//! Chirp handlers.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use super::authenticated_user;
use crate::config::AppState;
use crate::error::{ApiError, Result};
use crate::models::{Chirp, SortOrder};

const MAX_CHIRP_LEN: usize = 140;

/// Whole words replaced with a mask at write time.
const PROFANITY: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];

#[derive(Debug, Deserialize)]
pub struct PostChirpRequest {
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct ListChirpsQuery {
    pub author_id: Option<String>,
    pub sort: Option<String>,
}

/// GET /api/chirps
pub async fn get_chirps(
    State(state): State<AppState>,
    Query(query): Query<ListChirpsQuery>,
) -> Result<Json<Vec<Chirp>>> {
    let mut errors = HashMap::new();

    let author_id = match query.author_id.as_deref() {
        None => None,
        Some(raw) => match raw.parse::<u64>() {
            Ok(id) => Some(id),
            Err(_) => {
                errors.insert("author_id", "invalid author_id query parameter".to_string());
                None
            }
        },
    };

    let order = match SortOrder::from_param(query.sort.as_deref().unwrap_or("asc")) {
        Some(order) => order,
        None => {
            errors.insert("sort", "invalid sort query parameter".to_string());
            SortOrder::Ascending
        }
    };

    if !errors.is_empty() {
        return Err(ApiError::validation("invalid request params", errors));
    }

    let chirps = match author_id {
        Some(id) => state.store.get_chirps_by_author(id, order).await?,
        None => state.store.get_chirps(order).await?,
    };
    Ok(Json(chirps))
}

/// GET /api/chirps/{chirp_id}
pub async fn get_chirp(
    State(state): State<AppState>,
    Path(chirp_id): Path<String>,
) -> Result<Json<Chirp>> {
    let chirp_id = parse_chirp_id(&chirp_id)?;
    let chirp = state.store.get_chirp(chirp_id).await?;
    Ok(Json(chirp))
}

/// POST /api/chirps
pub async fn post_chirp(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<PostChirpRequest>,
) -> Result<(StatusCode, Json<Chirp>)> {
    let user_id = authenticated_user(&headers, &state.config.jwt_secret)?;

    if req.body.is_empty() || req.body.chars().count() > MAX_CHIRP_LEN {
        let mut errors = HashMap::new();
        errors.insert("body", "invalid body".to_string());
        return Err(ApiError::validation("Invalid body parameters", errors));
    }

    let clean = clean_profanity(&req.body);
    let chirp = state.store.create_chirp(clean, user_id).await?;
    info!("user {} posted chirp {}", user_id, chirp.id);

    Ok((StatusCode::CREATED, Json(chirp)))
}

/// DELETE /api/chirps/{chirp_id}
pub async fn delete_chirp(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(chirp_id): Path<String>,
) -> Result<StatusCode> {
    let user_id = authenticated_user(&headers, &state.config.jwt_secret)?;
    let chirp_id = parse_chirp_id(&chirp_id)?;

    state.store.delete_chirp(user_id, chirp_id).await?;
    info!("user {} deleted chirp {}", user_id, chirp_id);

    Ok(StatusCode::NO_CONTENT)
}

fn parse_chirp_id(raw: &str) -> Result<u64> {
    raw.parse::<u64>().map_err(|_| {
        let mut errors = HashMap::new();
        errors.insert("chirp_id", "chirp_id not provided or invalid".to_string());
        ApiError::validation("invalid request params", errors)
    })
}

/// Replaces denied whole words (case-insensitive, space-delimited) with a
/// 4-character mask. Applied once, before storage.
pub(crate) fn clean_profanity(body: &str) -> String {
    body.split(' ')
        .map(|word| {
            if PROFANITY.contains(&word.to_lowercase().as_str()) {
                "****"
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
