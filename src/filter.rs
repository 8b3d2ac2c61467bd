// src/filter.rs
//
// Pure filter stage: (raw postings, policy, run instant) -> (kept, excluded).
// No I/O, no clock reads; the caller supplies `now` so day-boundary math is
// deterministic under test.

use chrono::{DateTime, Utc};
use chrono_tz::Tz;

use crate::model::RawPosting;

/// What to do with a posting whose `posted_at` is unknown when date
/// windowing is enabled. Must be configured explicitly; the default is
/// `Drop`, matching the behavior of boards that only surface a parsed date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UnknownPostedAt {
    Keep,
    Drop,
}

impl Default for UnknownPostedAt {
    fn default() -> Self {
        UnknownPostedAt::Drop
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateWindow {
    /// Keep everything regardless of `posted_at`.
    All,
    /// Keep only postings whose `posted_at` falls on the run's calendar date
    /// in the given zone. Never host-local time.
    PostedToday { tz: Tz, unknown: UnknownPostedAt },
}

#[derive(Debug, Clone)]
pub struct FilterPolicy {
    pub exclude_keywords: Vec<String>,
    pub window: DateWindow,
}

impl FilterPolicy {
    pub fn keywords_only(exclude_keywords: Vec<String>) -> Self {
        Self {
            exclude_keywords,
            window: DateWindow::All,
        }
    }
}

/// Case-insensitive substring match against the exclusion set. An empty set
/// excludes nothing.
pub fn title_is_excluded(title: &str, keywords: &[String]) -> bool {
    if keywords.is_empty() {
        return false;
    }
    let title = title.to_lowercase();
    keywords
        .iter()
        .filter(|k| !k.trim().is_empty())
        .any(|k| title.contains(&k.to_lowercase()))
}

fn within_today(posted_at: Option<DateTime<Utc>>, now: DateTime<Utc>, tz: Tz, unknown: UnknownPostedAt) -> bool {
    match posted_at {
        Some(ts) => ts.with_timezone(&tz).date_naive() == now.with_timezone(&tz).date_naive(),
        None => unknown == UnknownPostedAt::Keep,
    }
}

/// Apply the policy to one adapter's output. Returns the surviving postings
/// and the number excluded.
pub fn apply(policy: &FilterPolicy, now: DateTime<Utc>, raw: Vec<RawPosting>) -> (Vec<RawPosting>, usize) {
    let mut kept = Vec::with_capacity(raw.len());
    let mut excluded = 0usize;
    for posting in raw {
        if title_is_excluded(&posting.title, &policy.exclude_keywords) {
            excluded += 1;
            continue;
        }
        if let DateWindow::PostedToday { tz, unknown } = policy.window {
            if !within_today(posting.posted_at, now, tz, unknown) {
                excluded += 1;
                continue;
            }
        }
        kept.push(posting);
    }
    (kept, excluded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn raw(title: &str, posted_at: Option<DateTime<Utc>>) -> RawPosting {
        RawPosting {
            external_id: "1".into(),
            title: title.into(),
            location: None,
            description: None,
            posted_at,
            url: None,
        }
    }

    #[test]
    fn keyword_exclusion_is_case_insensitive_substring() {
        let kw = vec!["Senior".to_string(), "Staff".to_string()];
        assert!(title_is_excluded("Senior Software Engineer", &kw));
        assert!(title_is_excluded("SENIOR staff engineer", &kw));
        assert!(!title_is_excluded("Software Engineer II", &kw));
        assert!(!title_is_excluded("Software Engineer II", &[]));
    }

    #[test]
    fn empty_and_blank_keywords_exclude_nothing() {
        let kw = vec!["   ".to_string(), "".to_string()];
        assert!(!title_is_excluded("Senior Engineer", &kw));
    }

    #[test]
    fn apply_counts_excluded() {
        let policy = FilterPolicy::keywords_only(vec!["Manager".into()]);
        let now = Utc::now();
        let raw = vec![
            raw("Engineering Manager", None),
            raw("Backend Engineer", None),
        ];
        let (kept, excluded) = apply(&policy, now, raw);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "Backend Engineer");
        assert_eq!(excluded, 1);
    }

    #[test]
    fn posted_today_window_uses_configured_zone() {
        let tz: Tz = "America/Toronto".parse().unwrap();
        let policy = FilterPolicy {
            exclude_keywords: vec![],
            window: DateWindow::PostedToday {
                tz,
                unknown: UnknownPostedAt::Drop,
            },
        };
        // 02:00 UTC on June 2 is still June 1 in Toronto.
        let now = Utc.with_ymd_and_hms(2025, 6, 2, 2, 0, 0).unwrap();
        let late_june_1 = Utc.with_ymd_and_hms(2025, 6, 2, 1, 0, 0).unwrap();
        let june_2_noon = Utc.with_ymd_and_hms(2025, 6, 2, 16, 0, 0).unwrap();

        let (kept, excluded) = apply(
            &policy,
            now,
            vec![raw("A", Some(late_june_1)), raw("B", Some(june_2_noon))],
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].title, "A");
        assert_eq!(excluded, 1);
    }

    #[test]
    fn unknown_posted_at_follows_explicit_policy() {
        let tz: Tz = "UTC".parse().unwrap();
        let now = Utc::now();
        let drop_policy = FilterPolicy {
            exclude_keywords: vec![],
            window: DateWindow::PostedToday {
                tz,
                unknown: UnknownPostedAt::Drop,
            },
        };
        let keep_policy = FilterPolicy {
            exclude_keywords: vec![],
            window: DateWindow::PostedToday {
                tz,
                unknown: UnknownPostedAt::Keep,
            },
        };

        let (kept, _) = apply(&drop_policy, now, vec![raw("A", None)]);
        assert!(kept.is_empty());
        let (kept, _) = apply(&keep_policy, now, vec![raw("A", None)]);
        assert_eq!(kept.len(), 1);
    }
}
