use anyhow::Result;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, interval};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::db::Store;

/// Background maintenance for the reset-token ledger.
///
/// Cleanup only ever touches rows that are already past their expiry, so it
/// can run alongside live traffic. A failed pass logs and waits for the next
/// tick; it never blocks request handling.
pub struct Scheduler {
    store: Store,
    interval_minutes: u64,
    cron_expression: Option<String>,
    running: Arc<RwLock<bool>>,
}

impl Scheduler {
    #[must_use]
    pub fn new(store: Store, interval_minutes: u64, cron_expression: Option<String>) -> Self {
        Self {
            store,
            interval_minutes,
            cron_expression,
            running: Arc::new(RwLock::new(false)),
        }
    }

    pub async fn start(&self) -> Result<()> {
        *self.running.write().await = true;

        if let Some(cron_expr) = self.cron_expression.clone() {
            self.run_with_cron(&cron_expr).await
        } else {
            self.run_with_interval().await
        }
    }

    async fn run_with_cron(&self, cron_expr: &str) -> Result<()> {
        let mut sched = JobScheduler::new().await?;

        let store = self.store.clone();
        let running = Arc::clone(&self.running);

        let job = Job::new_async(cron_expr, move |_uuid, _lock| {
            let store = store.clone();
            let running = Arc::clone(&running);
            Box::pin(async move {
                if !*running.read().await {
                    return;
                }
                cleanup_pass(&store).await;
            })
        })?;

        sched.add(job).await?;
        sched.start().await?;

        info!("Cleanup scheduler running with cron: {}", cron_expr);

        loop {
            if !*self.running.read().await {
                break;
            }
            tokio::time::sleep(Duration::from_secs(1)).await;
        }

        sched.shutdown().await?;
        Ok(())
    }

    async fn run_with_interval(&self) -> Result<()> {
        info!(
            "Cleanup scheduler running every {} minutes",
            self.interval_minutes
        );

        let mut tick = interval(Duration::from_secs(self.interval_minutes * 60));

        // The first tick fires immediately; startup already ran a pass.
        tick.tick().await;

        loop {
            tick.tick().await;
            if !*self.running.read().await {
                break;
            }
            cleanup_pass(&self.store).await;
        }

        Ok(())
    }

    pub async fn stop(&self) {
        info!("Stopping cleanup scheduler...");
        *self.running.write().await = false;
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }
}

async fn cleanup_pass(store: &Store) {
    match store.cleanup_expired_reset_tokens().await {
        Ok(0) => {}
        Ok(n) => info!("Reaped {} expired password reset tokens", n),
        Err(e) => error!("Reset token cleanup failed: {}", e),
    }
}
