// src/model.rs
use std::collections::BTreeMap;

use chrono::{DateTime, Utc};

/// One posting as produced by a source adapter, before it is reconciled
/// against the record store. `external_id` is unique within the adapter's
/// source; `(source, external_id)` becomes the dedup key at insertion.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RawPosting {
    pub external_id: String,
    pub title: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub url: Option<String>,
}

/// Notification lifecycle of a stored posting. Transitions only
/// `Pending -> Sent`, and only after the delivery channel confirmed.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize, sqlx::Type,
)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum NotificationState {
    Pending,
    Sent,
}

/// Canonical stored posting. Immutable after creation except for the single
/// `Pending -> Sent` transition performed by the dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize, sqlx::FromRow)]
pub struct Posting {
    pub source: String,
    pub external_id: String,
    pub title: String,
    pub location: Option<String>,
    pub description: Option<String>,
    pub posted_at: Option<DateTime<Utc>>,
    pub url: Option<String>,
    /// Assigned by the store at first insertion; never revised.
    pub discovered_at: DateTime<Utc>,
    pub notification_state: NotificationState,
    pub notified_at: Option<DateTime<Utc>>,
}

impl Posting {
    pub fn key(&self) -> (&str, &str) {
        (&self.source, &self.external_id)
    }
}

/// Per-source tallies for one discovery run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SourceOutcome {
    pub added: usize,
    pub skipped: usize,
    pub failed: bool,
}

/// The observable output of a run, besides store mutations. A failed source
/// shows up as `failed = true` here instead of aborting the run.
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct RunReport {
    pub per_source: BTreeMap<String, SourceOutcome>,
    pub notified: usize,
}

impl RunReport {
    pub fn total_added(&self) -> usize {
        self.per_source.values().map(|o| o.added).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.per_source.values().map(|o| o.skipped).sum()
    }

    pub fn failed_sources(&self) -> Vec<&str> {
        self.per_source
            .iter()
            .filter(|(_, o)| o.failed)
            .map(|(name, _)| name.as_str())
            .collect()
    }
}
