// src/dispatch.rs
//
// Notification dispatcher: selects pending postings inside the run's window,
// hands them to the delivery channel as one batch, and commits the
// pending -> sent transition only after the channel confirmed. A failed
// delivery leaves everything pending for the next run (at-least-once).

use chrono::{DateTime, LocalResult, NaiveTime, Utc};
use chrono_tz::Tz;
use metrics::counter;

use crate::error::RunError;
use crate::notify::DeliveryChannel;
use crate::store::RecordStore;

/// How the window start for "new since last notification" is computed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowPolicy {
    /// Postings discovered by the current run only.
    RunStart,
    /// Postings discovered since local midnight in the given zone.
    CalendarDay(Tz),
}

impl WindowPolicy {
    pub fn window_start(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        match self {
            WindowPolicy::RunStart => now,
            WindowPolicy::CalendarDay(tz) => {
                let midnight = now.with_timezone(tz).date_naive().and_time(NaiveTime::MIN);
                match midnight.and_local_timezone(*tz) {
                    LocalResult::Single(dt) | LocalResult::Ambiguous(dt, _) => {
                        dt.with_timezone(&Utc)
                    }
                    // Midnight erased by a DST jump; fall back to the run start.
                    LocalResult::None => now,
                }
            }
        }
    }
}

/// Dispatch one batch. Returns the number of postings delivered (zero means
/// the channel was never called).
pub async fn dispatch(
    store: &RecordStore,
    channel: &dyn DeliveryChannel,
    policy: WindowPolicy,
    now: DateTime<Utc>,
) -> Result<usize, RunError> {
    let window_start = policy.window_start(now);
    let pending = store.pending_since(window_start).await?;
    if pending.is_empty() {
        tracing::info!(%window_start, "no pending postings in window; nothing to deliver");
        return Ok(0);
    }

    channel
        .deliver(&pending)
        .await
        .map_err(RunError::Delivery)?;

    // Confirmed delivery: commit the transition for exactly the delivered set.
    let keys: Vec<(String, String)> = pending
        .iter()
        .map(|p| (p.source.clone(), p.external_id.clone()))
        .collect();
    let transitioned = store.mark_sent(&keys, Utc::now()).await?;
    counter!("notify_delivered_total").increment(pending.len() as u64);
    tracing::info!(
        delivered = pending.len(),
        transitioned,
        channel = channel.name(),
        "notification batch delivered"
    );
    Ok(pending.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn run_start_window_is_now() {
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 15, 30, 0).unwrap();
        assert_eq!(WindowPolicy::RunStart.window_start(now), now);
    }

    #[test]
    fn calendar_day_window_starts_at_local_midnight() {
        let tz: Tz = "America/Toronto".parse().unwrap();
        // 02:00 UTC June 10 = 22:00 June 9 in Toronto, so the window opens at
        // Toronto midnight June 9 = 04:00 UTC June 9.
        let now = Utc.with_ymd_and_hms(2025, 6, 10, 2, 0, 0).unwrap();
        let start = WindowPolicy::CalendarDay(tz).window_start(now);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 6, 9, 4, 0, 0).unwrap());
    }
}
