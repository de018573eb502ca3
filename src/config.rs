use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub auth: AuthConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub database_path: String,

    pub log_level: String,

    /// Number of tokio worker threads (default: 2)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,

    /// Maximum database connections (default: 5)
    pub max_db_connections: u32,

    /// Minimum database connections (default: 1)
    pub min_db_connections: u32,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            database_path: "sqlite:data/gatehouse.db".to_string(),
            log_level: "info".to_string(),
            worker_threads: 2,
            max_db_connections: 5,
            min_db_connections: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 5000,
            cors_allowed_origins: vec!["http://localhost:3000".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SecurityConfig {
    /// Argon2 memory cost in KiB (default: 8192 = 8MB)
    pub argon2_memory_cost_kib: u32,

    /// Argon2 time cost (iterations)
    pub argon2_time_cost: u32,

    /// Argon2 parallelism (default: 1)
    pub argon2_parallelism: u32,
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            argon2_memory_cost_kib: 8192,
            argon2_time_cost: 3,
            argon2_parallelism: 1,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC signing secret for session tokens. Must be set before startup,
    /// either here or via the `SECRET_KEY` environment variable; an empty
    /// secret fails validation.
    pub secret: String,

    /// Session token lifetime (default: 15 minutes)
    pub session_token_ttl_minutes: i64,

    /// Password reset token lifetime (default: 10 minutes)
    pub reset_token_ttl_minutes: i64,

    /// How often the expired-token cleanup job runs (default: 60 minutes)
    pub cleanup_interval_minutes: u64,

    /// Optional cron expression for the cleanup job; takes precedence over
    /// the interval when set.
    pub cleanup_cron_expression: Option<String>,

    /// Base URL the emailed reset link points at (the frontend route).
    pub reset_link_base: String,

    /// Base URL the emailed verification link points at.
    pub verification_link_base: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            session_token_ttl_minutes: 15,
            reset_token_ttl_minutes: 10,
            cleanup_interval_minutes: 60,
            cleanup_cron_expression: None,
            reset_link_base: "http://localhost:3000/reset-password".to_string(),
            verification_link_base: "http://localhost:3000/verify-email".to_string(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            general: GeneralConfig::default(),
            server: ServerConfig::default(),
            security: SecurityConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let paths = Self::config_paths();

        let mut config = None;
        for path in &paths {
            if path.exists() {
                info!("Loading config from: {}", path.display());
                config = Some(Self::load_from_path(path)?);
                break;
            }
        }

        let mut config = config.unwrap_or_else(|| {
            info!("No config file found, using defaults");
            Self::default()
        });

        config.apply_env_overrides();

        Ok(config)
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Environment wins over file values, matching the deployment story of
    /// the usual container setups.
    fn apply_env_overrides(&mut self) {
        if let Ok(secret) = std::env::var("SECRET_KEY")
            && !secret.is_empty()
        {
            self.auth.secret = secret;
        }

        if let Ok(url) = std::env::var("DATABASE_URL")
            && !url.is_empty()
        {
            self.general.database_path = url;
        }

        if let Ok(port) = std::env::var("PORT")
            && let Ok(port) = port.parse()
        {
            self.server.port = port;
        }
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("gatehouse").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".gatehouse").join("config.toml"));
        }

        paths
    }

    /// Fatal configuration checks, run once before serving. A process that
    /// fails here never reaches request handling.
    pub fn validate(&self) -> Result<()> {
        if self.auth.secret.is_empty() {
            anyhow::bail!(
                "Signing secret is not set; provide [auth].secret or the SECRET_KEY env var"
            );
        }

        if self.auth.session_token_ttl_minutes <= 0 || self.auth.reset_token_ttl_minutes <= 0 {
            anyhow::bail!("Token TTLs must be positive");
        }

        if self.auth.cleanup_interval_minutes == 0 && self.auth.cleanup_cron_expression.is_none() {
            anyhow::bail!("Cleanup interval must be > 0 or a cron expression must be set");
        }

        if self.general.max_db_connections == 0 {
            anyhow::bail!("max_db_connections must be at least 1");
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.server.port, 5000);
        assert_eq!(config.auth.session_token_ttl_minutes, 15);
        assert_eq!(config.auth.reset_token_ttl_minutes, 10);
        assert_eq!(config.security.argon2_parallelism, 1);
        assert!(config.auth.secret.is_empty());
    }

    #[test]
    fn test_validate_requires_secret() {
        let mut config = Config::default();
        assert!(config.validate().is_err());

        config.auth.secret = "some-secret".to_string();
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_zero_ttl() {
        let mut config = Config::default();
        config.auth.secret = "some-secret".to_string();
        config.auth.reset_token_ttl_minutes = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_deserialization() {
        let toml_str = r#"
            [general]
            log_level = "debug"

            [auth]
            secret = "file-secret"
            session_token_ttl_minutes = 30
        "#;

        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.general.log_level, "debug");
        assert_eq!(config.auth.secret, "file-secret");
        assert_eq!(config.auth.session_token_ttl_minutes, 30);

        assert_eq!(config.auth.reset_token_ttl_minutes, 10);
        assert_eq!(config.server.port, 5000);
    }

    #[test]
    fn test_config_serialization() {
        let config = Config::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[general]"));
        assert!(toml_str.contains("[server]"));
        assert!(toml_str.contains("[auth]"));
    }
}
