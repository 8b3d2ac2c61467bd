// src/source/workday.rs
//
// Generic adapter for Workday-hosted job boards (any tenant on
// *.myworkdayjobs.com). Talks to the CXS JSON endpoint that backs the board
// UI: POST https://{host}/wday/cxs/{tenant}/{site}/jobs with limit/offset
// pagination. Workday only reports relative posting dates ("Posted Today",
// "Posted 3 Days Ago"), which are resolved against the run instant.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::Deserialize;

use crate::model::RawPosting;
use crate::source::{normalize_text, FetchSettings, SourceAdapter};

const PAGE_SIZE: usize = 20;
const MAX_PAGES: usize = 50;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobsPage {
    total: Option<u64>,
    #[serde(default)]
    job_postings: Vec<JobPostingItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobPostingItem {
    title: Option<String>,
    external_path: Option<String>,
    locations_text: Option<String>,
    posted_on: Option<String>,
    #[serde(default)]
    bullet_fields: Vec<String>,
}

enum Mode {
    /// Parse a single captured API page; for tests and offline runs.
    Fixture(String),
    Http {
        endpoint: String,
        client: reqwest::Client,
        page_delay: std::time::Duration,
    },
}

pub struct WorkdayAdapter {
    name: String,
    /// `https://{host}`, used to turn externalPath into an absolute job URL.
    origin: String,
    mode: Mode,
}

impl WorkdayAdapter {
    /// Derive tenant and site from a board URL such as
    /// `https://nvidia.wd5.myworkdayjobs.com/NVIDIAExternalCareerSite`.
    pub fn from_board_url(name: &str, board_url: &str, settings: &FetchSettings) -> Result<Self> {
        let url = reqwest::Url::parse(board_url)
            .with_context(|| format!("invalid workday board url: {board_url}"))?;
        let host = url
            .host_str()
            .ok_or_else(|| anyhow!("workday board url has no host: {board_url}"))?
            .to_string();
        let tenant = host
            .split('.')
            .next()
            .filter(|s| !s.is_empty())
            .ok_or_else(|| anyhow!("cannot derive workday tenant from host {host}"))?
            .to_string();
        let site = url
            .path_segments()
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty() && !s.eq_ignore_ascii_case("en-us"))
            .last()
            .ok_or_else(|| anyhow!("cannot derive workday site from url {board_url}"))?
            .to_string();

        Ok(Self {
            name: name.to_string(),
            origin: format!("https://{host}"),
            mode: Mode::Http {
                endpoint: format!("https://{host}/wday/cxs/{tenant}/{site}/jobs"),
                client: crate::source::http_client(settings)?,
                page_delay: settings.page_delay,
            },
        })
    }

    pub fn from_fixture(name: &str, origin: &str, page_json: &str) -> Self {
        Self {
            name: name.to_string(),
            origin: origin.to_string(),
            mode: Mode::Fixture(page_json.to_string()),
        }
    }

    fn parse_page(&self, body: &str, now: DateTime<Utc>) -> Result<(Vec<RawPosting>, Option<u64>)> {
        let page: JobsPage = serde_json::from_str(body).context("parsing workday jobs page")?;
        let mut out = Vec::with_capacity(page.job_postings.len());
        for item in page.job_postings {
            match self.convert(item, now) {
                Some(p) => out.push(p),
                None => {
                    tracing::debug!(source = %self.name, "skipping malformed workday item");
                }
            }
        }
        Ok((out, page.total))
    }

    fn convert(&self, item: JobPostingItem, now: DateTime<Utc>) -> Option<RawPosting> {
        let title = item.title.as_deref().map(normalize_text).filter(|t| !t.is_empty())?;
        let external_path = item.external_path?;
        // bulletFields carries the requisition id; fall back to the path.
        let external_id = item
            .bullet_fields
            .iter()
            .find(|f| !f.trim().is_empty())
            .cloned()
            .unwrap_or_else(|| external_path.clone());

        Some(RawPosting {
            external_id,
            title,
            location: item.locations_text.filter(|l| !l.trim().is_empty()),
            description: None,
            posted_at: item.posted_on.as_deref().and_then(|s| parse_posted_on(s, now)),
            url: Some(format!("{}{}", self.origin, external_path)),
        })
    }

    async fn fetch_paginated(
        &self,
        endpoint: &str,
        client: &reqwest::Client,
        page_delay: std::time::Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<RawPosting>> {
        let mut all = Vec::new();
        for page_no in 0..MAX_PAGES {
            if page_no > 0 {
                tokio::time::sleep(page_delay).await;
            }
            let offset = page_no * PAGE_SIZE;
            let body = serde_json::json!({
                "appliedFacets": {},
                "limit": PAGE_SIZE,
                "offset": offset,
                "searchText": "",
            });
            let text = client
                .post(endpoint)
                .json(&body)
                .send()
                .await
                .with_context(|| format!("workday POST {endpoint} offset {offset}"))?
                .error_for_status()
                .context("workday non-2xx")?
                .text()
                .await
                .context("workday response body")?;

            let (mut postings, total) = self.parse_page(&text, now)?;
            let page_len = postings.len();
            all.append(&mut postings);

            let done = page_len == 0
                || total.is_some_and(|t| (offset + PAGE_SIZE) as u64 >= t);
            if done {
                break;
            }
        }
        Ok(all)
    }
}

#[async_trait::async_trait]
impl SourceAdapter for WorkdayAdapter {
    async fn fetch_postings(&self) -> Result<Vec<RawPosting>> {
        let now = Utc::now();
        match &self.mode {
            Mode::Fixture(body) => Ok(self.parse_page(body, now)?.0),
            Mode::Http {
                endpoint,
                client,
                page_delay,
            } => self.fetch_paginated(endpoint, client, *page_delay, now).await,
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Resolve Workday's relative posting dates. Unknown phrasings map to `None`
/// and are handled by the filter stage's unknown-date policy.
fn parse_posted_on(raw: &str, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
    let s = raw.trim().to_ascii_lowercase();
    let s = s.strip_prefix("posted").unwrap_or(&s).trim_start();
    if s.starts_with("today") {
        return Some(now);
    }
    if s.starts_with("yesterday") {
        return Some(now - ChronoDuration::days(1));
    }
    static RE_DAYS: OnceCell<Regex> = OnceCell::new();
    let re = RE_DAYS.get_or_init(|| Regex::new(r"^(\d+)\+?\s+days?\s+ago").unwrap());
    let caps = re.captures(s)?;
    let days: i64 = caps.get(1)?.as_str().parse().ok()?;
    Some(now - ChronoDuration::days(days))
}
