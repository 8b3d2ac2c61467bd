// src/notify/mod.rs
pub mod email;
pub mod webhook;

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;

use crate::model::Posting;

/// External delivery channel for one notification batch. `Ok(())` is the
/// delivery confirmation the dispatcher relies on before committing the
/// sent transition; implementations must not report success they cannot
/// vouch for. Never called with an empty batch.
#[async_trait::async_trait]
pub trait DeliveryChannel: Send + Sync {
    async fn deliver(&self, batch: &[Posting]) -> anyhow::Result<()>;
    fn name(&self) -> &'static str;
}

/// The calendar date at `now` in the configured zone. Every day-boundary
/// decision (window cutoffs, digest subjects) renders through this, so a
/// late-evening batch carries the local date, not UTC's.
pub fn local_date(now: DateTime<Utc>, tz: Tz) -> NaiveDate {
    now.with_timezone(&tz).date_naive()
}

pub fn digest_subject(batch: &[Posting], today: NaiveDate) -> String {
    format!(
        "New Job Listings - {} job(s) ({})",
        batch.len(),
        today.format("%Y-%m-%d")
    )
}

/// Plain-text digest grouped by source.
pub fn digest_body(batch: &[Posting]) -> String {
    let mut by_source: BTreeMap<&str, Vec<&Posting>> = BTreeMap::new();
    for posting in batch {
        by_source.entry(&posting.source).or_default().push(posting);
    }

    let mut body = String::new();
    for (source, postings) in by_source {
        body.push_str(&format!(
            "{}\n{} - {} job(s)\n{}\n\n",
            "=".repeat(60),
            source.to_uppercase(),
            postings.len(),
            "=".repeat(60)
        ));
        for posting in postings {
            body.push_str(&format!("Title: {}\n", posting.title));
            if let Some(location) = &posting.location {
                body.push_str(&format!("Location: {location}\n"));
            }
            if let Some(posted_at) = posting.posted_at {
                body.push_str(&format!("Date Posted: {}\n", posted_at.format("%Y-%m-%d")));
            }
            body.push_str(&format!("Job ID: {}\n", posting.external_id));
            if let Some(description) = &posting.description {
                let short: String = description.chars().take(300).collect();
                body.push_str(&format!("Description: {short}\n"));
            }
            if let Some(url) = &posting.url {
                body.push_str(&format!("URL: {url}\n"));
            }
            body.push('\n');
        }
    }
    body
}
