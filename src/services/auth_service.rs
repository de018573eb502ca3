//! Domain service for authentication and account management.
//!
//! Handles registration, login, email verification, and the password-reset
//! token lifecycle.

use thiserror::Error;

use crate::db::User;

/// Errors specific to authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Field-level input failure the client can fix.
    #[error("{message}")]
    Validation {
        field: &'static str,
        message: String,
    },

    /// Username or email already taken. Carries the offending field.
    #[error("duplicate {0}")]
    DuplicateUser(&'static str),

    /// Deliberately generic: covers unknown email, wrong password, and
    /// inactive account alike.
    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Unauthorized")]
    Unauthorized,

    /// Reset or verification token with no matching record.
    #[error("Token is invalid or unknown")]
    InvalidToken,

    #[error("Token has expired")]
    TokenExpired,

    #[error("Token has already been used")]
    TokenAlreadyUsed,

    #[error("Database error: {0}")]
    Database(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<sea_orm::DbErr> for AuthError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::Database(err.to_string())
    }
}

impl From<anyhow::Error> for AuthError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

/// A successfully authenticated (or freshly registered) user plus their
/// session token.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

/// Domain service trait for authentication.
#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Creates an account and issues a session token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Validation`] for bad input and
    /// [`AuthError::DuplicateUser`] when the username or email is taken.
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError>;

    /// Verifies credentials and issues a session token.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidCredentials`] whether the account is
    /// unknown, the password is wrong, or the account is inactive. Callers
    /// must not be able to tell these apart.
    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError>;

    /// Issues a reset token and dispatches the reset link, if the email
    /// belongs to an account. Succeeds either way; the caller's response
    /// must not reveal whether the account exists.
    async fn request_password_reset(&self, email: &str) -> Result<(), AuthError>;

    /// Consumes a reset token and sets the new password. Exactly one of two
    /// concurrent calls with the same token can succeed.
    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError>;

    /// Marks the account behind an email-verification token as verified.
    /// The token is single-use; a replay fails with
    /// [`AuthError::InvalidToken`].
    async fn verify_email(&self, token: &str) -> Result<User, AuthError>;

    /// Resolves a bearer token to its user. Guard for protected routes.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Unauthorized`] on any codec or lookup failure.
    async fn authorize(&self, bearer_token: &str) -> Result<User, AuthError>;
}
