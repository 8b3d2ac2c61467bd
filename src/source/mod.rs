// src/source/mod.rs
pub mod greenhouse;
pub mod rss;
pub mod workday;

use std::time::Duration;

use anyhow::{bail, Result};

use crate::model::RawPosting;

/// One external job board. `Err` means the source is unreachable
/// (network/auth/parse-fatal); `Ok(vec![])` means the source has nothing —
/// the orchestrator must be able to tell these apart. A single malformed
/// item inside an otherwise healthy response is skipped, never an error.
#[async_trait::async_trait]
pub trait SourceAdapter: Send + Sync {
    async fn fetch_postings(&self) -> Result<Vec<RawPosting>>;
    fn name(&self) -> &str;
}

/// Shared HTTP knobs for all adapters: a hard per-request timeout (a timed-out
/// fetch is a hard source failure) and a bounded delay between requests of a
/// paginated fetch.
#[derive(Debug, Clone, Copy)]
pub struct FetchSettings {
    pub timeout: Duration,
    pub page_delay: Duration,
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            page_delay: Duration::from_millis(2000),
        }
    }
}

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

pub(crate) fn http_client(settings: &FetchSettings) -> Result<reqwest::Client> {
    use anyhow::Context;
    reqwest::Client::builder()
        .timeout(settings.timeout)
        .user_agent(USER_AGENT)
        .build()
        .context("building http client")
}

/// Normalize free text coming off a board: decode HTML entities, strip tags,
/// collapse whitespace, cap length.
pub fn normalize_text(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, " ").to_string();

    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    if out.chars().count() > 1000 {
        out = out.chars().take(1000).collect();
    }
    out
}

/// Pick an adapter kind from the board URL when the config does not name one.
pub fn detect_kind(url: &str) -> Option<&'static str> {
    let url = url.to_ascii_lowercase();
    if url.contains("myworkdayjobs.com") {
        Some("workday")
    } else if url.contains("greenhouse.io") {
        Some("greenhouse")
    } else if url.ends_with(".xml") || url.contains("/rss") || url.contains("feed") {
        Some("rss")
    } else {
        None
    }
}

/// Build the adapter for one configured source. `kind` may be given
/// explicitly in config or auto-detected from the URL.
pub fn build_adapter(
    name: &str,
    url: &str,
    kind: Option<&str>,
    settings: &FetchSettings,
) -> Result<Box<dyn SourceAdapter>> {
    let kind = match kind {
        Some(k) => k.to_ascii_lowercase(),
        None => match detect_kind(url) {
            Some(k) => k.to_string(),
            None => bail!("no adapter available for source '{name}' ({url})"),
        },
    };
    match kind.as_str() {
        "workday" => Ok(Box::new(workday::WorkdayAdapter::from_board_url(
            name, url, settings,
        )?)),
        "greenhouse" => Ok(Box::new(greenhouse::GreenhouseAdapter::from_board_url(
            name, url, settings,
        )?)),
        "rss" => Ok(Box::new(rss::RssAdapter::from_url(name, url, settings)?)),
        other => bail!("unknown source kind '{other}' for source '{name}'"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_strips_tags_entities_and_whitespace() {
        let s = "  <b>Backend&nbsp;Engineer</b>\n\t&amp; Platform  ";
        assert_eq!(normalize_text(s), "Backend Engineer & Platform");
    }

    #[test]
    fn kind_detection_from_url() {
        assert_eq!(
            detect_kind("https://nvidia.wd5.myworkdayjobs.com/NVIDIAExternalCareerSite"),
            Some("workday")
        );
        assert_eq!(
            detect_kind("https://boards.greenhouse.io/acme"),
            Some("greenhouse")
        );
        assert_eq!(detect_kind("https://jobs.example.com/feed.xml"), Some("rss"));
        assert_eq!(detect_kind("https://careers.example.com/jobs"), None);
    }
}
