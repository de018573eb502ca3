//! `SeaORM` implementation of the `AuthService` trait.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use uuid::Uuid;

use crate::clients::mail::Mailer;
use crate::config::AuthConfig;
use crate::db::{NewUser, Store, User};
use crate::services::auth_service::{AuthError, AuthService, AuthSession};
use crate::services::password::CredentialStore;
use crate::services::token::TokenCodec;
use crate::services::validation;

pub struct SeaOrmAuthService {
    store: Store,
    tokens: TokenCodec,
    passwords: CredentialStore,
    mailer: Arc<dyn Mailer>,
    config: AuthConfig,
}

impl SeaOrmAuthService {
    #[must_use]
    pub fn new(
        store: Store,
        tokens: TokenCodec,
        passwords: CredentialStore,
        mailer: Arc<dyn Mailer>,
        config: AuthConfig,
    ) -> Self {
        Self {
            store,
            tokens,
            passwords,
            mailer,
            config,
        }
    }

    fn issue_session(&self, user: &User) -> Result<String, AuthError> {
        self.tokens
            .issue(user.id, &user.username)
            .map_err(|e| AuthError::Internal(e.to_string()))
    }

    /// Look up a reset token and check its state. Does not consume it; the
    /// caller closes the check-to-use gap with a conditional update.
    async fn validate_reset_token(&self, token: &str) -> Result<crate::db::ResetToken, AuthError> {
        let row = self
            .store
            .find_reset_token(token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        if row.used {
            return Err(AuthError::TokenAlreadyUsed);
        }
        if Utc::now().timestamp() > row.expires_at {
            return Err(AuthError::TokenExpired);
        }

        Ok(row)
    }
}

#[async_trait]
impl AuthService for SeaOrmAuthService {
    async fn register(
        &self,
        username: &str,
        email: &str,
        password: &str,
    ) -> Result<AuthSession, AuthError> {
        validation::validate_username(username)?;
        validation::validate_email(email)?;
        validation::validate_password(password)?;

        if self.store.find_user_by_email(email).await?.is_some() {
            return Err(AuthError::DuplicateUser("email"));
        }
        if self.store.find_user_by_username(username).await?.is_some() {
            return Err(AuthError::DuplicateUser("username"));
        }

        let password_hash = self.passwords.hash(password).await?;
        let verification_token = Uuid::new_v4().simple().to_string();

        let user = self
            .store
            .create_user(NewUser {
                username: username.to_string(),
                email: email.to_string(),
                password_hash,
                email_verification_token: verification_token.clone(),
            })
            .await?;

        let link = format!(
            "{}?token={}",
            self.config.verification_link_base, verification_token
        );
        if let Err(e) = self.mailer.send_email_verification(&user.email, &link).await {
            tracing::warn!("Failed to dispatch verification mail: {e}");
        }

        let token = self.issue_session(&user)?;

        tracing::info!(user_id = user.id, "New user registered");

        Ok(AuthSession { user, token })
    }

    async fn login(&self, email: &str, password: &str) -> Result<AuthSession, AuthError> {
        let Some((user, password_hash)) =
            self.store.find_user_by_email_with_password(email).await?
        else {
            return Err(AuthError::InvalidCredentials);
        };

        let is_valid = self.passwords.verify(password, &password_hash).await?;

        // Inactive accounts fail the same way as wrong passwords.
        if !is_valid || !user.is_active {
            return Err(AuthError::InvalidCredentials);
        }

        let token = self.issue_session(&user)?;

        Ok(AuthSession { user, token })
    }

    async fn request_password_reset(&self, email: &str) -> Result<(), AuthError> {
        let Some(user) = self.store.find_user_by_email(email).await? else {
            // Unknown address: do nothing, report nothing.
            return Ok(());
        };

        let token = self
            .store
            .issue_reset_token(user.id, self.config.reset_token_ttl_minutes)
            .await?;

        let link = format!("{}?token={}", self.config.reset_link_base, token);
        if let Err(e) = self.mailer.send_password_reset(&user.email, &link).await {
            tracing::warn!("Failed to dispatch password reset mail: {e}");
        }

        Ok(())
    }

    async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        validation::validate_password(new_password)?;

        let row = self.validate_reset_token(token).await?;

        let new_hash = self.passwords.hash(new_password).await?;

        // Conditional update inside the store closes the gap between the
        // check above and the write: a concurrent consumer that got here
        // first leaves nothing for us to affect.
        let consumed = self
            .store
            .consume_reset_token(token, row.user_id, new_hash)
            .await?;

        if !consumed {
            let row = self
                .store
                .find_reset_token(token)
                .await?
                .ok_or(AuthError::InvalidToken)?;
            if row.used {
                return Err(AuthError::TokenAlreadyUsed);
            }
            return Err(AuthError::TokenExpired);
        }

        tracing::info!(user_id = row.user_id, "Password reset completed");

        Ok(())
    }

    async fn verify_email(&self, token: &str) -> Result<User, AuthError> {
        let user = self
            .store
            .mark_user_verified(token)
            .await?
            .ok_or(AuthError::InvalidToken)?;

        tracing::info!(user_id = user.id, "Email address verified");

        Ok(user)
    }

    async fn authorize(&self, bearer_token: &str) -> Result<User, AuthError> {
        let claims = self
            .tokens
            .verify(bearer_token)
            .map_err(|_| AuthError::Unauthorized)?;

        let user_id = claims.user_id().map_err(|_| AuthError::Unauthorized)?;

        let user = self
            .store
            .find_user_by_id(user_id)
            .await?
            .ok_or(AuthError::Unauthorized)?;

        if !user.is_active {
            return Err(AuthError::Unauthorized);
        }

        Ok(user)
    }
}
