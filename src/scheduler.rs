// src/scheduler.rs
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::dispatch::WindowPolicy;
use crate::filter::FilterPolicy;
use crate::notify::DeliveryChannel;
use crate::source::SourceAdapter;
use crate::store::RecordStore;

/// Spawn the watch loop: one full run (discover + dispatch) per tick. Each
/// run executes on its own task holding the run lock; a tick that fires
/// while the previous run is still in flight is skipped with a warning, so
/// runs never overlap and the cadence stays aligned to the interval.
pub fn spawn_watch_loop(
    store: Arc<RecordStore>,
    adapters: Arc<Vec<Box<dyn SourceAdapter>>>,
    policy: Arc<FilterPolicy>,
    window: WindowPolicy,
    channel: Arc<dyn DeliveryChannel>,
    interval: Duration,
) -> JoinHandle<()> {
    let run_lock = Arc::new(tokio::sync::Mutex::new(()));
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let Ok(guard) = run_lock.clone().try_lock_owned() else {
                tracing::warn!("previous run still in flight; skipping tick");
                continue;
            };
            let store = store.clone();
            let adapters = adapters.clone();
            let policy = policy.clone();
            let channel = channel.clone();
            tokio::spawn(async move {
                let _guard = guard;
                match crate::run_once(&store, &adapters, &policy, window, channel.as_ref()).await {
                    Ok(report) => {
                        tracing::info!(
                            added = report.total_added(),
                            skipped = report.total_skipped(),
                            notified = report.notified,
                            failed_sources = ?report.failed_sources(),
                            "scheduled run complete"
                        );
                    }
                    Err(error) => {
                        tracing::error!(error = ?error, "scheduled run failed");
                    }
                }
            });
        }
    })
}
