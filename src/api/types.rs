use serde::Serialize;

use crate::db::User;

/// Public user shape. Never carries the password hash or the verification
/// token.
#[derive(Debug, Clone, Serialize)]
pub struct UserDto {
    pub id: i32,
    pub username: String,
    pub email: String,
    /// ISO-8601 / RFC 3339
    pub created_at: String,
    pub is_active: bool,
    pub is_verified: bool,
}

impl From<User> for UserDto {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            email: user.email,
            created_at: user.created_at,
            is_active: user.is_active,
            is_verified: user.is_verified,
        }
    }
}

/// Body for register/login: message + user + session token.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    pub message: String,
    pub user: UserDto,
    pub token: String,
}

#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub user: UserDto,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct ProtectedResponse {
    pub message: String,
    pub user: UserDto,
}

/// Root endpoint body.
#[derive(Debug, Serialize)]
pub struct ServiceInfo {
    pub message: String,
    pub status: String,
    pub version: String,
}

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: String,
}
