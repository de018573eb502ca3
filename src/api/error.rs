use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use std::fmt;

use crate::services::AuthError;

/// Error body shape: a short machine-ish label plus a human-readable
/// message. Field names are part of the API contract.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub message: String,
}

#[derive(Debug)]
pub enum ApiError {
    ValidationError(String),

    DuplicateUser { field: &'static str },

    InvalidCredentials,

    Unauthorized(String),

    InvalidToken(String),

    DatabaseError(String),

    InternalError(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            ApiError::DuplicateUser { field } => write!(f, "Duplicate user ({})", field),
            ApiError::InvalidCredentials => write!(f, "Invalid credentials"),
            ApiError::Unauthorized(msg) => write!(f, "Unauthorized: {}", msg),
            ApiError::InvalidToken(msg) => write!(f, "Invalid token: {}", msg),
            ApiError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            ApiError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for ApiError {}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::ValidationError(msg) => {
                (StatusCode::BAD_REQUEST, "Validation error".to_string(), msg)
            }
            ApiError::DuplicateUser { field: "username" } => (
                StatusCode::BAD_REQUEST,
                "Username taken".to_string(),
                "This username is already taken".to_string(),
            ),
            ApiError::DuplicateUser { .. } => (
                StatusCode::BAD_REQUEST,
                "User already exists".to_string(),
                "An account with this email already exists".to_string(),
            ),
            ApiError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                "Invalid credentials".to_string(),
                "Email or password is incorrect".to_string(),
            ),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string(), msg),
            ApiError::InvalidToken(msg) => (StatusCode::BAD_REQUEST, "Invalid token".to_string(), msg),
            ApiError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Database error".to_string(),
                    "A database error occurred".to_string(),
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                    "An unexpected error occurred".to_string(),
                )
            }
        };

        (status, Json(ErrorBody { error, message })).into_response()
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::Validation { message, .. } => ApiError::ValidationError(message),
            AuthError::DuplicateUser(field) => ApiError::DuplicateUser { field },
            AuthError::InvalidCredentials => ApiError::InvalidCredentials,
            AuthError::Unauthorized => ApiError::Unauthorized(
                "Authentication token is missing or invalid".to_string(),
            ),
            AuthError::InvalidToken => {
                ApiError::InvalidToken("Token is invalid or unknown".to_string())
            }
            AuthError::TokenExpired => ApiError::InvalidToken("Token has expired".to_string()),
            AuthError::TokenAlreadyUsed => {
                ApiError::InvalidToken("Token has already been used".to_string())
            }
            AuthError::Database(msg) => ApiError::DatabaseError(msg),
            AuthError::Internal(msg) => ApiError::InternalError(msg),
        }
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::InternalError(err.to_string())
    }
}

impl ApiError {
    pub fn unauthorized(msg: impl Into<String>) -> Self {
        ApiError::Unauthorized(msg.into())
    }
}
