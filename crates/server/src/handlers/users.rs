//! User, login, and token-lifecycle handlers.

use std::collections::HashMap;

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::Deserialize;
use tracing::info;

use super::{authenticated_user, bearer_token};
use crate::auth;
use crate::config::AppState;
use crate::error::{ApiError, Result};
use crate::models::{LoginResponse, TokenResponse, UserResponse};

#[derive(Debug, Deserialize)]
pub struct UserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

impl UserRequest {
    fn validate(&self) -> Result<()> {
        let mut errors = HashMap::new();
        if self.email.is_empty() {
            errors.insert("email", "invalid email".to_string());
        }
        if self.password.is_empty() {
            errors.insert("password", "invalid password".to_string());
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(ApiError::validation("Invalid body parameters", errors))
        }
    }
}

/// POST /api/users
pub async fn post_user(
    State(state): State<AppState>,
    Json(req): Json<UserRequest>,
) -> Result<(StatusCode, Json<UserResponse>)> {
    req.validate()?;

    let user = state.store.create_user(req.email, &req.password).await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

/// PUT /api/users
pub async fn put_user(
    State(state): State<AppState>,
    headers: HeaderMap,
    Json(req): Json<UserRequest>,
) -> Result<Json<UserResponse>> {
    let user_id = authenticated_user(&headers, &state.config.jwt_secret)?;
    req.validate()?;

    let user = state
        .store
        .update_user(user_id, req.email, &req.password)
        .await?;
    Ok(Json(user.into()))
}

/// POST /api/login
///
/// Credential check, access-token issuance, and refresh-token save are three
/// steps, not one atomic unit; a crash in between can leave an issued token
/// that was never persisted.
pub async fn post_login(
    State(state): State<AppState>,
    Json(req): Json<UserRequest>,
) -> Result<Json<LoginResponse>> {
    req.validate()?;

    let user = state.store.login(&req.email, &req.password).await?;
    let token = auth::create_token(user.id, &state.config.jwt_secret)?;
    let refresh_token = auth::create_refresh_token();
    state.store.save_refresh_token(user.id, &refresh_token).await?;

    info!("user {} logged in", user.id);
    Ok(Json(LoginResponse {
        id: user.id,
        email: user.email,
        is_chirpy_red: user.is_chirpy_red,
        token,
        refresh_token,
    }))
}

/// POST /api/refresh
pub async fn post_refresh(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<TokenResponse>> {
    let refresh_token = bearer_token(&headers)?;

    let user = state
        .store
        .validate_refresh_token(refresh_token)
        .await
        .map_err(|e| ApiError::unauthorized(e.to_string()))?;
    let token = auth::create_token(user.id, &state.config.jwt_secret)?;

    Ok(Json(TokenResponse { token }))
}

/// POST /api/revoke
pub async fn post_revoke(State(state): State<AppState>, headers: HeaderMap) -> Result<StatusCode> {
    let refresh_token = bearer_token(&headers)?;

    state
        .store
        .revoke_refresh_token(refresh_token)
        .await
        .map_err(|e| ApiError::unauthorized(e.to_string()))?;

    Ok(StatusCode::NO_CONTENT)
}
