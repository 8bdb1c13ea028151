//! Error types for the Chirpy API.
//!
//! Domain operations return `ApiError` instead of terminating the process.
//! The variant decides the HTTP status and the public message; internal
//! detail stays on the server side of the log.

use std::collections::HashMap;

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Result type for Chirpy domain operations.
pub type Result<T> = std::result::Result<T, ApiError>;

/// Errors that can surface from a domain operation.
#[derive(Error, Debug)]
#[non_exhaustive]
pub enum ApiError {
    #[error("chirp id not found")]
    ChirpNotFound,

    #[error("user doesn't exist")]
    UserNotFound,

    #[error("user already exists")]
    UserAlreadyExists,

    #[error("incorrect password")]
    IncorrectPassword,

    #[error("incorrect chirp id")]
    IncorrectChirpId,

    #[error("incorrect author id")]
    IncorrectAuthorId,

    #[error("unauthorized: {detail}")]
    Unauthorized { detail: String },

    #[error("{message}")]
    Validation {
        message: &'static str,
        errors: HashMap<&'static str, String>,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Unauthorized with an internal-only detail message.
    pub fn unauthorized(detail: impl Into<String>) -> Self {
        Self::Unauthorized {
            detail: detail.into(),
        }
    }

    /// Field-level validation failure.
    pub fn validation(message: &'static str, errors: HashMap<&'static str, String>) -> Self {
        Self::Validation { message, errors }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::ChirpNotFound
            | Self::UserNotFound
            | Self::UserAlreadyExists
            | Self::IncorrectPassword
            | Self::IncorrectChirpId
            | Self::IncorrectAuthorId
            | Self::Validation { .. } => StatusCode::BAD_REQUEST,
            Self::Unauthorized { .. } => StatusCode::UNAUTHORIZED,
            Self::Io(_) | Self::Json(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show to the caller. Internal detail never leaks here.
    fn public_message(&self) -> String {
        match self {
            Self::Unauthorized { .. } => "Unauthorized".to_string(),
            Self::Io(_) | Self::Json(_) | Self::Internal(_) => "internal server error".to_string(),
            Self::Validation { message, .. } => (*message).to_string(),
            other => other.to_string(),
        }
    }
}

#[derive(Serialize)]
struct ErrorBody {
    code: u16,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    errors: Option<HashMap<&'static str, String>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("request failed: {self}");
        } else {
            warn!("request rejected: {self}");
        }

        let error = self.public_message();
        let errors = match self {
            Self::Validation { errors, .. } => Some(errors),
            _ => None,
        };

        let body = ErrorBody {
            code: status.as_u16(),
            error,
            errors,
        };
        (status, Json(body)).into_response()
    }
}
