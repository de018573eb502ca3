use anyhow::{Context, Result};
use chrono::Utc;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, Set,
    TransactionTrait,
};

use crate::entities::password_reset_tokens;

use super::user::UserRepository;

/// A password-reset token row as stored.
#[derive(Debug, Clone)]
pub struct ResetToken {
    pub id: i32,
    pub user_id: i32,
    pub token: String,
    pub created_at: String,
    pub expires_at: i64,
    pub used: bool,
}

impl From<password_reset_tokens::Model> for ResetToken {
    fn from(model: password_reset_tokens::Model) -> Self {
        Self {
            id: model.id,
            user_id: model.user_id,
            token: model.token,
            created_at: model.created_at,
            expires_at: model.expires_at,
            used: model.used,
        }
    }
}

pub struct ResetTokenRepository {
    conn: DatabaseConnection,
}

impl ResetTokenRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Issue a fresh reset token for a user.
    ///
    /// Invalidating prior active tokens and inserting the replacement happen
    /// in one transaction, so at most one active token exists per user at any
    /// point an outside observer can see.
    pub async fn issue(&self, user_id: i32, ttl_minutes: i64) -> Result<String> {
        let token = generate_reset_token();
        let now = Utc::now();
        let created_at = now.to_rfc3339();
        let expires_at = now.timestamp() + ttl_minutes * 60;

        let inserted_token = token.clone();
        self.conn
            .transaction::<_, (), DbErr>(move |txn| {
                Box::pin(async move {
                    password_reset_tokens::Entity::update_many()
                        .col_expr(password_reset_tokens::Column::Used, Expr::value(true))
                        .filter(password_reset_tokens::Column::UserId.eq(user_id))
                        .filter(password_reset_tokens::Column::Used.eq(false))
                        .exec(txn)
                        .await?;

                    password_reset_tokens::ActiveModel {
                        user_id: Set(user_id),
                        token: Set(inserted_token),
                        created_at: Set(created_at),
                        expires_at: Set(expires_at),
                        used: Set(false),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    Ok(())
                })
            })
            .await
            .context("Failed to issue password reset token")?;

        Ok(token)
    }

    /// Exact-match lookup. The caller decides what absence, expiry, or the
    /// used flag mean.
    pub async fn find(&self, token: &str) -> Result<Option<ResetToken>> {
        let row = password_reset_tokens::Entity::find()
            .filter(password_reset_tokens::Column::Token.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query password reset token")?;

        Ok(row.map(ResetToken::from))
    }

    /// Atomically consume the token and overwrite the owner's password hash.
    ///
    /// The guard is a conditional update on `used = false AND expires_at >
    /// now`: of two concurrent consumers exactly one sees a row affected, and
    /// only that one writes the new hash. Returns whether this call won.
    pub async fn consume_and_set_password(
        &self,
        token: &str,
        user_id: i32,
        new_hash: String,
    ) -> Result<bool> {
        let now = Utc::now().timestamp();
        let token = token.to_string();

        let consumed = self
            .conn
            .transaction::<_, bool, DbErr>(move |txn| {
                Box::pin(async move {
                    let result = password_reset_tokens::Entity::update_many()
                        .col_expr(password_reset_tokens::Column::Used, Expr::value(true))
                        .filter(password_reset_tokens::Column::Token.eq(token))
                        .filter(password_reset_tokens::Column::Used.eq(false))
                        .filter(password_reset_tokens::Column::ExpiresAt.gt(now))
                        .exec(txn)
                        .await?;

                    if result.rows_affected == 0 {
                        return Ok(false);
                    }

                    UserRepository::set_password_hash_on(txn, user_id, &new_hash).await?;

                    Ok(true)
                })
            })
            .await
            .context("Failed to consume password reset token")?;

        Ok(consumed)
    }

    /// Delete every expired row, used or not. Only ever touches rows past
    /// their expiry, so it cannot race a valid consume.
    pub async fn cleanup_expired(&self) -> Result<u64> {
        let result = password_reset_tokens::Entity::delete_many()
            .filter(password_reset_tokens::Column::ExpiresAt.lt(Utc::now().timestamp()))
            .exec(&self.conn)
            .await
            .context("Failed to clean up expired reset tokens")?;

        Ok(result.rows_affected)
    }
}

/// Generate a random reset token (64 character hex string, 32 bytes of
/// entropy).
fn generate_reset_token() -> String {
    use rand::Rng;

    let mut rng = rand::rng();
    let bytes: [u8; 32] = rng.random();

    bytes.iter().fold(String::with_capacity(64), |mut acc, b| {
        use std::fmt::Write;
        let _ = write!(acc, "{b:02x}");
        acc
    })
}
