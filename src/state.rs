use std::sync::Arc;

use crate::clients::{LogMailer, Mailer};
use crate::config::Config;
use crate::db::Store;
use crate::services::{AuthService, CredentialStore, SeaOrmAuthService, TokenCodec};

/// Shared application services, built once at startup. Everything here is
/// read-only after construction; the database is the only mutable resource.
#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub store: Store,

    pub auth_service: Arc<dyn AuthService>,
}

impl SharedState {
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        Self::with_mailer(config, Arc::new(LogMailer)).await
    }

    /// Like [`SharedState::new`] but with an explicit mail collaborator,
    /// mainly for tests that want to observe dispatches.
    pub async fn with_mailer(config: Config, mailer: Arc<dyn Mailer>) -> anyhow::Result<Self> {
        let store = Store::with_pool_options(
            &config.general.database_path,
            config.general.max_db_connections,
            config.general.min_db_connections,
        )
        .await?;

        let tokens = TokenCodec::new(
            config.auth.secret.as_bytes(),
            config.auth.session_token_ttl_minutes,
        );
        let passwords = CredentialStore::new(config.security.clone());

        let auth_service = Arc::new(SeaOrmAuthService::new(
            store.clone(),
            tokens,
            passwords,
            mailer,
            config.auth.clone(),
        )) as Arc<dyn AuthService>;

        Ok(Self {
            config: Arc::new(config),
            store,
            auth_service,
        })
    }
}
