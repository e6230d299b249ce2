// Background cache maintenance.
// Periodically evicts expired entries so memory is reclaimed without traffic.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use super::store::TtlCache;

/// Default sweep interval: 5 minutes.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(5 * 60);

/// Owned handle to the periodic sweep task.
///
/// Dropping the handle also ends the task, but without waiting for it.
#[derive(Debug)]
pub struct CacheSweeper {
    shutdown: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl CacheSweeper {
    /// Start sweeping `cache` every `interval`. Must be called inside a tokio runtime.
    pub fn spawn(cache: Arc<TtlCache>, interval: Duration) -> Self {
        let (shutdown, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let evicted = cache.sweep();
                        debug!(evicted, remaining = cache.len(), "cache sweep");
                    }
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                    }
                }
            }
        });

        info!(interval_secs = interval.as_secs(), "cache sweeper started");
        Self { shutdown, handle }
    }

    /// Signal the task to stop and wait for it to finish.
    pub async fn stop(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.handle.await {
            warn!(error = %e, "cache sweeper task failed");
        }
        info!("cache sweeper stopped");
    }
}
