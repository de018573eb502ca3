use axum::{
    Extension, Json,
    extract::{Query, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use serde::Deserialize;
use std::sync::Arc;

use super::types::{AuthResponse, MessageResponse, ProtectedResponse, UserResponse};
use super::{ApiError, AppState};
use crate::db::User;

/// Fixed response for reset requests. Identical whether or not the account
/// exists, so the endpoint cannot be used to probe for registered emails.
const RESET_REQUESTED_MESSAGE: &str =
    "If an account with that email exists, a password reset link has been sent.";

// ============================================================================
// Request Types
// ============================================================================

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Deserialize)]
pub struct VerifyEmailQuery {
    #[serde(default)]
    pub token: String,
}

#[derive(Deserialize)]
pub struct RequestPasswordResetRequest {
    pub email: String,
}

#[derive(Deserialize)]
pub struct ResetPasswordRequest {
    pub token: String,
    pub password: String,
}

/// The authorized user, stashed in request extensions by the middleware.
#[derive(Clone)]
pub struct CurrentUser(pub User);

// ============================================================================
// Middleware
// ============================================================================

/// Guard for protected routes: resolves `Authorization: Bearer <token>` to a
/// user and stores it in request extensions, or rejects with 401.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let Some(token) = bearer_token(request.headers()) else {
        return Err(ApiError::unauthorized("Authentication token is missing"));
    };

    let user = state.auth().authorize(&token).await.map_err(ApiError::from)?;

    tracing::Span::current().record("user_id", user.id);
    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}

/// Extract the token from an `Authorization: Bearer` header.
fn bearer_token(headers: &HeaderMap) -> Option<String> {
    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /api/auth/register
/// Create an account and return a session token
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<AuthResponse>), ApiError> {
    let session = state
        .auth()
        .register(payload.username.trim(), payload.email.trim(), &payload.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            message: "User registered successfully".to_string(),
            user: session.user.into(),
            token: session.token,
        }),
    ))
}

/// POST /api/auth/login
/// Authenticate with email and password, returns a session token on success
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<AuthResponse>, ApiError> {
    let session = state
        .auth()
        .login(payload.email.trim(), &payload.password)
        .await?;

    Ok(Json(AuthResponse {
        message: "Login successful".to_string(),
        user: session.user.into(),
        token: session.token,
    }))
}

/// GET /api/auth/me
/// Get current user information (requires authentication)
pub async fn me(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<UserResponse> {
    Json(UserResponse { user: user.into() })
}

/// POST /api/auth/logout
/// Session tokens are stateless; logout is client-side token removal.
pub async fn logout(Extension(CurrentUser(_)): Extension<CurrentUser>) -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    })
}

/// GET /api/auth/verify-email?token=
pub async fn verify_email(
    State(state): State<Arc<AppState>>,
    Query(query): Query<VerifyEmailQuery>,
) -> Result<Json<MessageResponse>, ApiError> {
    state.auth().verify_email(&query.token).await?;

    Ok(Json(MessageResponse {
        message: "Email verified successfully".to_string(),
    }))
}

/// POST /api/auth/request-password-reset
/// Always responds with the same body, whether or not the account exists.
pub async fn request_password_reset(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RequestPasswordResetRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .auth()
        .request_password_reset(payload.email.trim())
        .await?;

    Ok(Json(MessageResponse {
        message: RESET_REQUESTED_MESSAGE.to_string(),
    }))
}

/// POST /api/auth/reset-password
pub async fn reset_password(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .auth()
        .reset_password(&payload.token, &payload.password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password reset successfully".to_string(),
    }))
}

/// GET /api/protected
/// Example protected route
pub async fn protected(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<ProtectedResponse> {
    Json(ProtectedResponse {
        message: "This is a protected route".to_string(),
        user: user.into(),
    })
}
