// src/discover.rs
//
// Discovery orchestrator: runs every configured source adapter, filters the
// output, and reconciles survivors against the record store. One source's
// outage never blocks the others; a store error aborts the run.

use chrono::{DateTime, Utc};
use metrics::{counter, describe_counter};
use once_cell::sync::OnceCell;

use crate::error::RunError;
use crate::filter::{self, FilterPolicy};
use crate::model::RunReport;
use crate::source::SourceAdapter;
use crate::store::{InsertOutcome, RecordStore};

/// One-time metrics registration.
fn ensure_metrics_described() {
    static ONCE: OnceCell<()> = OnceCell::new();
    ONCE.get_or_init(|| {
        describe_counter!(
            "discover_postings_total",
            "Raw postings fetched from all sources."
        );
        describe_counter!(
            "discover_added_total",
            "Postings inserted into the record store."
        );
        describe_counter!(
            "discover_skipped_total",
            "Postings already present in the record store."
        );
        describe_counter!(
            "discover_excluded_total",
            "Postings removed by the filter stage."
        );
        describe_counter!(
            "discover_source_failures_total",
            "Source adapters that failed hard during a run."
        );
        describe_counter!(
            "notify_delivered_total",
            "Postings delivered to the notification channel."
        );
    });
}

/// Run discovery across all adapters. Every posting that survives the filter
/// is offered to the store with insert-if-absent semantics; the per-source
/// added/skipped/failed tallies form the run report.
pub async fn run_discovery(
    store: &RecordStore,
    adapters: &[Box<dyn SourceAdapter>],
    policy: &FilterPolicy,
    now: DateTime<Utc>,
) -> Result<RunReport, RunError> {
    ensure_metrics_described();

    let mut report = RunReport::default();
    for adapter in adapters {
        let name = adapter.name().to_string();
        let outcome = report.per_source.entry(name.clone()).or_default();

        let raw = match adapter.fetch_postings().await {
            Ok(raw) => raw,
            Err(error) => {
                tracing::warn!(source = %name, error = ?error, "source unavailable");
                counter!("discover_source_failures_total").increment(1);
                outcome.failed = true;
                continue;
            }
        };
        counter!("discover_postings_total").increment(raw.len() as u64);

        let fetched = raw.len();
        let (kept, excluded) = filter::apply(policy, now, raw);
        counter!("discover_excluded_total").increment(excluded as u64);

        // Per-event increments: the report entry accumulates across adapters
        // that share a name, so incrementing by the entry total would
        // double-count.
        for posting in &kept {
            match store.insert_if_absent(&name, posting, now).await? {
                InsertOutcome::Inserted => {
                    outcome.added += 1;
                    counter!("discover_added_total").increment(1);
                }
                InsertOutcome::AlreadyPresent => {
                    outcome.skipped += 1;
                    counter!("discover_skipped_total").increment(1);
                }
            }
        }

        tracing::info!(
            source = %name,
            fetched,
            excluded,
            added = outcome.added,
            skipped = outcome.skipped,
            "source reconciled"
        );
    }
    Ok(report)
}
