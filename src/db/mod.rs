use anyhow::Result;
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, Statement};
use std::path::Path;
use std::time::Duration;
use tracing::info;

pub mod migrator;
pub mod repositories;

pub use repositories::reset_token::ResetToken;
pub use repositories::user::{NewUser, User};

#[derive(Clone)]
pub struct Store {
    pub conn: DatabaseConnection,
}

impl Store {
    pub async fn new(db_url: &str) -> Result<Self> {
        Self::with_pool_options(db_url, 5, 1).await
    }

    pub async fn with_pool_options(
        db_url: &str,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self> {
        use sea_orm_migration::MigratorTrait;

        let path_str = db_url.trim_start_matches("sqlite:");
        if !path_str.starts_with(":memory:") {
            if let Some(parent) = Path::new(path_str).parent() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
            if !Path::new(path_str).exists() {
                std::fs::File::create(path_str)?;
            }
        }

        let mut opt = ConnectOptions::new(db_url.to_string());
        opt.max_connections(max_connections)
            .min_connections(min_connections)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(10))
            .idle_timeout(Duration::from_secs(300))
            .max_lifetime(Duration::from_secs(600))
            .sqlx_logging(false);

        let conn = Database::connect(opt).await?;

        migrator::Migrator::up(&conn, None).await?;

        info!(
            "Database connected & migrations applied (pool: {}-{})",
            min_connections, max_connections
        );

        Ok(Self { conn })
    }

    pub async fn ping(&self) -> Result<()> {
        let backend = self.conn.get_database_backend();
        self.conn
            .query_one(Statement::from_string(backend, "SELECT 1".to_string()))
            .await?;
        Ok(())
    }

    fn user_repo(&self) -> repositories::user::UserRepository {
        repositories::user::UserRepository::new(self.conn.clone())
    }

    fn reset_token_repo(&self) -> repositories::reset_token::ResetTokenRepository {
        repositories::reset_token::ResetTokenRepository::new(self.conn.clone())
    }

    // ========== User Repository Methods ==========

    pub async fn create_user(&self, new_user: NewUser) -> Result<User> {
        self.user_repo().create(new_user).await
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        self.user_repo().find_by_email(email).await
    }

    pub async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        self.user_repo().find_by_username(username).await
    }

    pub async fn find_user_by_id(&self, id: i32) -> Result<Option<User>> {
        self.user_repo().find_by_id(id).await
    }

    pub async fn find_user_by_email_with_password(
        &self,
        email: &str,
    ) -> Result<Option<(User, String)>> {
        self.user_repo().find_by_email_with_password(email).await
    }

    pub async fn mark_user_verified(&self, token: &str) -> Result<Option<User>> {
        self.user_repo().mark_verified(token).await
    }

    // ========== Reset Token Repository Methods ==========

    pub async fn issue_reset_token(&self, user_id: i32, ttl_minutes: i64) -> Result<String> {
        self.reset_token_repo().issue(user_id, ttl_minutes).await
    }

    pub async fn find_reset_token(&self, token: &str) -> Result<Option<ResetToken>> {
        self.reset_token_repo().find(token).await
    }

    pub async fn consume_reset_token(
        &self,
        token: &str,
        user_id: i32,
        new_hash: String,
    ) -> Result<bool> {
        self.reset_token_repo()
            .consume_and_set_password(token, user_id, new_hash)
            .await
    }

    pub async fn cleanup_expired_reset_tokens(&self) -> Result<u64> {
        self.reset_token_repo().cleanup_expired().await
    }
}
