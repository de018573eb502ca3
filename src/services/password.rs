//! Password hashing and verification.
//!
//! Argon2id with costs from [`SecurityConfig`]. The work is CPU-bound, so
//! both directions run on the blocking pool instead of stalling the async
//! runtime.

use anyhow::{Context, Result};
use argon2::{
    Algorithm, Argon2, Params, Version,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use tokio::task;

use crate::config::SecurityConfig;

#[derive(Clone)]
pub struct CredentialStore {
    config: SecurityConfig,
}

impl CredentialStore {
    #[must_use]
    pub const fn new(config: SecurityConfig) -> Self {
        Self { config }
    }

    /// Hash a password with a fresh random salt.
    pub async fn hash(&self, password: &str) -> Result<String> {
        let password = password.to_string();
        let config = self.config.clone();

        task::spawn_blocking(move || hash_password(&password, &config))
            .await
            .context("Password hashing task panicked")?
    }

    /// Verify a password against a stored hash using the scheme's own
    /// comparison primitive.
    pub async fn verify(&self, password: &str, password_hash: &str) -> Result<bool> {
        let password = password.to_string();
        let password_hash = password_hash.to_string();

        task::spawn_blocking(move || verify_password(&password, &password_hash))
            .await
            .context("Password verification task panicked")?
    }
}

fn hash_password(password: &str, config: &SecurityConfig) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);

    let params = Params::new(
        config.argon2_memory_cost_kib,
        config.argon2_time_cost,
        config.argon2_parallelism,
        None,
    )
    .map_err(|e| anyhow::anyhow!("Invalid Argon2 params: {e}"))?;

    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

    let hash = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!("Failed to hash password: {e}"))?;

    Ok(hash.to_string())
}

fn verify_password(password: &str, password_hash: &str) -> Result<bool> {
    let parsed_hash = PasswordHash::new(password_hash)
        .map_err(|e| anyhow::anyhow!("Invalid password hash format: {e}"))?;

    // Params come from the PHC string itself.
    Ok(Argon2::default()
        .verify_password(password.as_bytes(), &parsed_hash)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_config() -> SecurityConfig {
        SecurityConfig {
            argon2_memory_cost_kib: 1024,
            argon2_time_cost: 1,
            argon2_parallelism: 1,
        }
    }

    #[tokio::test]
    async fn hash_and_verify_round_trip() {
        let store = CredentialStore::new(fast_config());

        let hash = store.hash("secret1").await.unwrap();
        assert_ne!(hash, "secret1");
        assert!(hash.starts_with("$argon2id$"));

        assert!(store.verify("secret1", &hash).await.unwrap());
        assert!(!store.verify("wrongpassword", &hash).await.unwrap());
    }

    #[tokio::test]
    async fn same_password_hashes_differently() {
        let store = CredentialStore::new(fast_config());

        let a = store.hash("secret1").await.unwrap();
        let b = store.hash("secret1").await.unwrap();
        assert_ne!(a, b);
    }

    #[tokio::test]
    async fn garbage_hash_is_an_error() {
        let store = CredentialStore::new(fast_config());

        assert!(store.verify("secret1", "not-a-phc-string").await.is_err());
    }
}
