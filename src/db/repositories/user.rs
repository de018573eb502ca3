use anyhow::{Context, Result};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set,
};

use crate::entities::users;

/// User data returned from the repository (without the password hash).
#[derive(Debug, Clone)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub email: String,
    pub created_at: String,
    pub is_active: bool,
    pub is_verified: bool,
}

impl From<users::Model> for User {
    fn from(model: users::Model) -> Self {
        Self {
            id: model.id,
            username: model.username,
            email: model.email,
            created_at: model.created_at,
            is_active: model.is_active,
            is_verified: model.is_verified,
        }
    }
}

/// Insert payload for a new account. The password arrives pre-hashed; the
/// repository never sees plaintext.
#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub email_verification_token: String,
}

pub struct UserRepository {
    conn: DatabaseConnection,
}

impl UserRepository {
    #[must_use]
    pub const fn new(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Insert a new user. Fresh accounts are active but unverified.
    pub async fn create(&self, new_user: NewUser) -> Result<User> {
        let now = chrono::Utc::now().to_rfc3339();

        let model = users::ActiveModel {
            username: Set(new_user.username),
            email: Set(new_user.email),
            password_hash: Set(new_user.password_hash),
            created_at: Set(now),
            is_active: Set(true),
            is_verified: Set(false),
            email_verification_token: Set(Some(new_user.email_verification_token)),
            ..Default::default()
        }
        .insert(&self.conn)
        .await
        .context("Failed to insert user")?;

        Ok(model.into())
    }

    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user by email")?;

        Ok(user.map(User::from))
    }

    pub async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::Username.eq(username))
            .one(&self.conn)
            .await
            .context("Failed to query user by username")?;

        Ok(user.map(User::from))
    }

    pub async fn find_by_id(&self, id: i32) -> Result<Option<User>> {
        let user = users::Entity::find_by_id(id)
            .one(&self.conn)
            .await
            .context("Failed to query user by ID")?;

        Ok(user.map(User::from))
    }

    /// Get user by email along with the stored password hash, for credential
    /// verification.
    pub async fn find_by_email_with_password(&self, email: &str) -> Result<Option<(User, String)>> {
        let user = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.conn)
            .await
            .context("Failed to query user for credential check")?;

        Ok(user.map(|u| {
            let password_hash = u.password_hash.clone();
            (User::from(u), password_hash)
        }))
    }

    /// Look up a user by their email-verification token, flip `is_verified`,
    /// and clear the token so a replay finds nothing.
    pub async fn mark_verified(&self, token: &str) -> Result<Option<User>> {
        let user = users::Entity::find()
            .filter(users::Column::EmailVerificationToken.eq(token))
            .one(&self.conn)
            .await
            .context("Failed to query user by verification token")?;

        let Some(user) = user else {
            return Ok(None);
        };

        let mut active: users::ActiveModel = user.into();
        active.is_verified = Set(true);
        active.email_verification_token = Set(None);
        let updated = active
            .update(&self.conn)
            .await
            .context("Failed to mark user verified")?;

        Ok(Some(updated.into()))
    }

    /// Overwrite the password hash. Leaves activity and verification state
    /// untouched. Takes any connection so the reset ledger can call it
    /// inside its consume transaction.
    pub async fn set_password_hash_on<C: ConnectionTrait>(
        conn: &C,
        user_id: i32,
        new_hash: &str,
    ) -> Result<(), DbErr> {
        users::Entity::update_many()
            .col_expr(users::Column::PasswordHash, Expr::value(new_hash))
            .filter(users::Column::Id.eq(user_id))
            .exec(conn)
            .await?;

        Ok(())
    }
}
