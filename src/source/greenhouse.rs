// src/source/greenhouse.rs
//
// Adapter for Greenhouse-hosted boards via the public boards API:
// GET https://boards-api.greenhouse.io/v1/boards/{board}/jobs

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::model::RawPosting;
use crate::source::{normalize_text, FetchSettings, SourceAdapter};

#[derive(Debug, Deserialize)]
struct JobsResponse {
    #[serde(default)]
    jobs: Vec<JobItem>,
}

#[derive(Debug, Deserialize)]
struct JobItem {
    id: Option<u64>,
    title: Option<String>,
    location: Option<Location>,
    absolute_url: Option<String>,
    updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Location {
    name: Option<String>,
}

enum Mode {
    Fixture(String),
    Http {
        endpoint: String,
        client: reqwest::Client,
    },
}

pub struct GreenhouseAdapter {
    name: String,
    mode: Mode,
}

impl GreenhouseAdapter {
    /// Accepts a board page URL such as `https://boards.greenhouse.io/acme`;
    /// the last path segment is the board token.
    pub fn from_board_url(name: &str, board_url: &str, settings: &FetchSettings) -> Result<Self> {
        let url = reqwest::Url::parse(board_url)
            .with_context(|| format!("invalid greenhouse board url: {board_url}"))?;
        let board = url
            .path_segments()
            .into_iter()
            .flatten()
            .filter(|s| !s.is_empty())
            .last()
            .ok_or_else(|| anyhow!("cannot derive greenhouse board token from {board_url}"))?;

        Ok(Self {
            name: name.to_string(),
            mode: Mode::Http {
                endpoint: format!("https://boards-api.greenhouse.io/v1/boards/{board}/jobs"),
                client: crate::source::http_client(settings)?,
            },
        })
    }

    pub fn from_fixture(name: &str, body_json: &str) -> Self {
        Self {
            name: name.to_string(),
            mode: Mode::Fixture(body_json.to_string()),
        }
    }

    fn parse_body(&self, body: &str) -> Result<Vec<RawPosting>> {
        let resp: JobsResponse = serde_json::from_str(body).context("parsing greenhouse jobs")?;
        let mut out = Vec::with_capacity(resp.jobs.len());
        for item in resp.jobs {
            let (Some(id), Some(title)) = (item.id, item.title.as_deref()) else {
                tracing::debug!(source = %self.name, "skipping malformed greenhouse item");
                continue;
            };
            let title = normalize_text(title);
            if title.is_empty() {
                tracing::debug!(source = %self.name, "skipping greenhouse item with empty title");
                continue;
            }
            out.push(RawPosting {
                external_id: id.to_string(),
                title,
                location: item.location.and_then(|l| l.name).filter(|l| !l.trim().is_empty()),
                description: None,
                posted_at: item.updated_at.as_deref().and_then(parse_timestamp),
                url: item.absolute_url,
            });
        }
        Ok(out)
    }
}

fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[async_trait::async_trait]
impl SourceAdapter for GreenhouseAdapter {
    async fn fetch_postings(&self) -> Result<Vec<RawPosting>> {
        match &self.mode {
            Mode::Fixture(body) => self.parse_body(body),
            Mode::Http { endpoint, client } => {
                let body = client
                    .get(endpoint)
                    .send()
                    .await
                    .with_context(|| format!("greenhouse GET {endpoint}"))?
                    .error_for_status()
                    .context("greenhouse non-2xx")?
                    .text()
                    .await
                    .context("greenhouse response body")?;
                self.parse_body(&body)
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
