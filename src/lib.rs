// src/lib.rs
// Public library surface for integration tests (and potential reuse).

pub mod config;
pub mod discover;
pub mod dispatch;
pub mod error;
pub mod filter;
pub mod model;
pub mod notify;
pub mod scheduler;
pub mod source;
pub mod store;

// ---- Re-exports for stable public API ----
pub use crate::config::AppConfig;
pub use crate::discover::run_discovery;
pub use crate::dispatch::{dispatch, WindowPolicy};
pub use crate::error::RunError;
pub use crate::filter::FilterPolicy;
pub use crate::model::{NotificationState, Posting, RawPosting, RunReport, SourceOutcome};
pub use crate::notify::DeliveryChannel;
pub use crate::source::SourceAdapter;
pub use crate::store::{InsertOutcome, RecordStore};

use chrono::Utc;

/// One full run: discovery across all adapters, then one dispatch of the
/// pending window. The run instant is sampled once so the posted-today
/// filter, `discovered_at`, and the notify window all agree on "now".
pub async fn run_once(
    store: &RecordStore,
    adapters: &[Box<dyn SourceAdapter>],
    policy: &FilterPolicy,
    window: WindowPolicy,
    channel: &dyn DeliveryChannel,
) -> Result<RunReport, RunError> {
    let now = Utc::now();
    let mut report = run_discovery(store, adapters, policy, now).await?;
    report.notified = dispatch(store, channel, window, now).await?;
    Ok(report)
}
