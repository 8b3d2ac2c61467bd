// src/source/rss.rs
//
// Generic adapter for job boards that publish an RSS feed. `guid` (or the
// item link, when no guid is present) is the source-scoped external id.

use anyhow::{anyhow, Context, Result};
use chrono::{DateTime, Utc};
use quick_xml::de::from_str;
use serde::Deserialize;

use crate::model::RawPosting;
use crate::source::{normalize_text, FetchSettings, SourceAdapter};

#[derive(Debug, Deserialize)]
struct Rss {
    channel: Channel,
}

#[derive(Debug, Deserialize)]
struct Channel {
    #[serde(rename = "item", default)]
    item: Vec<Item>,
}

#[derive(Debug, Deserialize)]
struct Item {
    guid: Option<String>,
    title: Option<String>,
    link: Option<String>,
    #[serde(rename = "pubDate")]
    pub_date: Option<String>,
    description: Option<String>,
}

enum Mode {
    Fixture(String),
    Http {
        url: String,
        client: reqwest::Client,
    },
}

pub struct RssAdapter {
    name: String,
    mode: Mode,
}

impl RssAdapter {
    pub fn from_url(name: &str, feed_url: &str, settings: &FetchSettings) -> Result<Self> {
        reqwest::Url::parse(feed_url).with_context(|| format!("invalid rss feed url: {feed_url}"))?;
        Ok(Self {
            name: name.to_string(),
            mode: Mode::Http {
                url: feed_url.to_string(),
                client: crate::source::http_client(settings)?,
            },
        })
    }

    pub fn from_fixture(name: &str, xml: &str) -> Self {
        Self {
            name: name.to_string(),
            mode: Mode::Fixture(xml.to_string()),
        }
    }

    fn parse_feed(&self, xml: &str) -> Result<Vec<RawPosting>> {
        let rss: Rss = from_str(xml).context("parsing rss feed xml")?;
        let mut out = Vec::with_capacity(rss.channel.item.len());
        for item in rss.channel.item {
            let Some(external_id) = item.guid.clone().or_else(|| item.link.clone()) else {
                tracing::debug!(source = %self.name, "skipping rss item without guid or link");
                continue;
            };
            let title = item.title.as_deref().map(normalize_text).unwrap_or_default();
            if title.is_empty() {
                tracing::debug!(source = %self.name, "skipping rss item with empty title");
                continue;
            }
            out.push(RawPosting {
                external_id,
                title,
                location: None,
                description: item
                    .description
                    .as_deref()
                    .map(normalize_text)
                    .filter(|d| !d.is_empty()),
                posted_at: item.pub_date.as_deref().and_then(parse_rfc2822),
                url: item.link,
            });
        }
        Ok(out)
    }
}

fn parse_rfc2822(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[async_trait::async_trait]
impl SourceAdapter for RssAdapter {
    async fn fetch_postings(&self) -> Result<Vec<RawPosting>> {
        match &self.mode {
            Mode::Fixture(xml) => self.parse_feed(xml),
            Mode::Http { url, client } => {
                let xml = client
                    .get(url)
                    .send()
                    .await
                    .with_context(|| format!("rss GET {url}"))?
                    .error_for_status()
                    .context("rss non-2xx")?
                    .text()
                    .await
                    .context("rss response body")?;
                if xml.trim().is_empty() {
                    return Err(anyhow!("rss feed {url} returned an empty body"));
                }
                self.parse_feed(&xml)
            }
        }
    }

    fn name(&self) -> &str {
        &self.name
    }
}
