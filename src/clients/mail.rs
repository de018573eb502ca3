//! Outbound mail collaborator.
//!
//! The auth flows only need two messages: the password-reset link and the
//! email-verification link. Delivery is behind a trait so deployments can
//! plug in a real transport; the default implementation records the dispatch
//! in the log stream.

use anyhow::Result;
use async_trait::async_trait;
use tracing::{debug, info};

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send_password_reset(&self, to: &str, link: &str) -> Result<()>;

    async fn send_email_verification(&self, to: &str, link: &str) -> Result<()>;
}

/// Logs dispatches instead of delivering them. The link itself only appears
/// at debug level since it embeds the token.
pub struct LogMailer;

#[async_trait]
impl Mailer for LogMailer {
    async fn send_password_reset(&self, to: &str, link: &str) -> Result<()> {
        info!(recipient = %to, "Dispatching password reset link");
        debug!("Password reset link: {link}");
        Ok(())
    }

    async fn send_email_verification(&self, to: &str, link: &str) -> Result<()> {
        info!(recipient = %to, "Dispatching email verification link");
        debug!("Email verification link: {link}");
        Ok(())
    }
}
