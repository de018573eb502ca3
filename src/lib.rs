pub mod api;
pub mod clients;
pub mod config;
pub mod db;
pub mod entities;
pub mod scheduler;
pub mod services;
pub mod state;

use std::sync::Arc;
use tokio::signal;

use anyhow::Context;
pub use config::Config;
use scheduler::Scheduler;
use state::SharedState;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

pub async fn run() -> anyhow::Result<()> {
    let config = Config::load()?;
    config.validate()?;

    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();

    info!(
        "Gatehouse v{} starting in daemon mode...",
        env!("CARGO_PKG_VERSION")
    );

    let shared = Arc::new(SharedState::new(config.clone()).await?);
    let api_state = api::create_app_state(shared);

    api_state
        .store()
        .ping()
        .await
        .context("Database is not reachable")?;

    // Stale rows from previous runs; best-effort.
    match api_state.store().cleanup_expired_reset_tokens().await {
        Ok(0) => {}
        Ok(n) => info!("Removed {} expired password reset tokens at startup", n),
        Err(e) => warn!("Startup reset token cleanup failed: {}", e),
    }

    let sched = Scheduler::new(
        api_state.store().clone(),
        config.auth.cleanup_interval_minutes,
        config.auth.cleanup_cron_expression.clone(),
    );
    let scheduler_handle = tokio::spawn(async move {
        if let Err(e) = sched.start().await {
            error!("Scheduler error: {}", e);
        }
    });

    let port = config.server.port;
    let app = api::router(api_state);
    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let server_handle = tokio::spawn(async move {
        info!("Web server running at http://0.0.0.0:{port}");
        if let Err(e) = axum::serve(listener, app).await {
            error!("Web server error: {}", e);
        }
    });

    info!("Daemon running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => {
            info!("Shutdown signal received");
        }
        Err(e) => {
            error!("Error listening for shutdown: {}", e);
        }
    }

    scheduler_handle.abort();
    server_handle.abort();
    info!("Daemon stopped");

    Ok(())
}
