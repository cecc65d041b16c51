//! Restart-on-failure wrapper around the scheduler loop

use crate::config::Config;
use crate::crawler::{ReqwestTransport, TaskScheduler};
use crate::storage::{open_storage, shared};
use crate::Result;
use std::future::Future;
use std::time::Duration;

/// Runs `start` until it returns `Ok`, waiting `restart_delay` after each error
///
/// Every run starts from scratch; whatever the failed run left in storage
/// is where the next one picks up. Ctrl-C during the wait stops the loop.
pub async fn supervise<F, Fut>(restart_delay: Duration, mut start: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<()>>,
{
    loop {
        match start().await {
            Ok(()) => return,
            Err(e) => {
                tracing::error!("Scheduler stopped with error: {}", e);
                tracing::info!("Restarting in {}s", restart_delay.as_secs_f64());
            }
        }

        tokio::select! {
            _ = tokio::time::sleep(restart_delay) => {}
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, not restarting");
                return;
            }
        }
    }
}

/// One scheduler run: open storage, build the HTTP client, tick until stopped
pub async fn run_session(config: &Config) -> Result<()> {
    let storage = shared(open_storage(&config.storage)?);
    let transport = ReqwestTransport::new(&config.fetcher)?;
    let scheduler = TaskScheduler::new(storage, transport, config)?;

    scheduler.run().await
}
