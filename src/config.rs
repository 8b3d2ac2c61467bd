// src/config.rs
//
// Configuration surface. Everything is read once at startup and treated as
// immutable for the run: board list, exclusion keywords, window policies,
// pacing. Secrets (SMTP credentials, webhook URL) come from the environment,
// not from this file.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use chrono_tz::Tz;

use crate::dispatch::WindowPolicy;
use crate::filter::{DateWindow, FilterPolicy, UnknownPostedAt};
use crate::source::FetchSettings;

const ENV_CONFIG_PATH: &str = "JOBSCOUT_CONFIG";
const DEFAULT_CONFIG_PATH: &str = "config/jobscout.toml";

#[derive(Debug, Clone, serde::Deserialize)]
pub struct SourceConfig {
    pub name: String,
    pub url: String,
    /// "workday" | "greenhouse" | "rss"; auto-detected from the URL when
    /// omitted.
    #[serde(default)]
    pub kind: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NotifyWindow {
    CalendarDay,
    RunStart,
}

impl Default for NotifyWindow {
    fn default() -> Self {
        NotifyWindow::CalendarDay
    }
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct AppConfig {
    #[serde(default = "default_database_url")]
    pub database_url: String,
    /// IANA zone driving every day-boundary decision (posted-today filter
    /// and calendar-day notify window). Host-local time is never used.
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub filter_today_only: bool,
    #[serde(default)]
    pub unknown_posted_at: UnknownPostedAt,
    #[serde(default)]
    pub exclude_title_keywords: Vec<String>,
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,
    #[serde(default = "default_fetch_delay_ms")]
    pub fetch_delay_ms: u64,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default)]
    pub notify_window: NotifyWindow,
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

fn default_database_url() -> String {
    "sqlite:jobs.db?mode=rwc".to_string()
}

fn default_timezone() -> String {
    "UTC".to_string()
}

fn default_fetch_timeout_secs() -> u64 {
    30
}

fn default_fetch_delay_ms() -> u64 {
    2000
}

fn default_interval_secs() -> u64 {
    3600
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: default_database_url(),
            timezone: default_timezone(),
            filter_today_only: false,
            unknown_posted_at: UnknownPostedAt::default(),
            exclude_title_keywords: Vec::new(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            fetch_delay_ms: default_fetch_delay_ms(),
            interval_secs: default_interval_secs(),
            notify_window: NotifyWindow::default(),
            sources: Vec::new(),
        }
    }
}

impl AppConfig {
    pub fn from_toml_str(s: &str) -> Result<Self> {
        let mut cfg: AppConfig = toml::from_str(s).context("parsing config toml")?;
        cfg.exclude_title_keywords = clean_keywords(cfg.exclude_title_keywords);
        cfg.tz()?; // fail fast on a bad zone name
        Ok(cfg)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading config from {}", path.display()))?;
        Self::from_toml_str(&content)
    }

    /// Load order: $JOBSCOUT_CONFIG, then config/jobscout.toml, then built-in
    /// defaults. $DATABASE_URL overrides the file in any case.
    pub fn load_default() -> Result<Self> {
        let mut cfg = if let Ok(p) = std::env::var(ENV_CONFIG_PATH) {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("JOBSCOUT_CONFIG points to non-existent path"));
            }
            Self::from_path(&pb)?
        } else {
            let default = PathBuf::from(DEFAULT_CONFIG_PATH);
            if default.exists() {
                Self::from_path(&default)?
            } else {
                AppConfig::default()
            }
        };
        if let Ok(url) = std::env::var("DATABASE_URL") {
            cfg.database_url = url;
        }
        Ok(cfg)
    }

    pub fn tz(&self) -> Result<Tz> {
        self.timezone
            .parse()
            .map_err(|_| anyhow!("unknown timezone '{}'", self.timezone))
    }

    pub fn filter_policy(&self) -> Result<FilterPolicy> {
        let window = if self.filter_today_only {
            DateWindow::PostedToday {
                tz: self.tz()?,
                unknown: self.unknown_posted_at,
            }
        } else {
            DateWindow::All
        };
        Ok(FilterPolicy {
            exclude_keywords: self.exclude_title_keywords.clone(),
            window,
        })
    }

    pub fn window_policy(&self) -> Result<WindowPolicy> {
        Ok(match self.notify_window {
            NotifyWindow::CalendarDay => WindowPolicy::CalendarDay(self.tz()?),
            NotifyWindow::RunStart => WindowPolicy::RunStart,
        })
    }

    pub fn fetch_settings(&self) -> FetchSettings {
        FetchSettings {
            timeout: Duration::from_secs(self.fetch_timeout_secs),
            page_delay: Duration::from_millis(self.fetch_delay_ms),
        }
    }
}

fn clean_keywords(items: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let trimmed = item.trim();
        if !trimmed.is_empty() && !out.iter().any(|k| k.eq_ignore_ascii_case(trimmed)) {
            out.push(trimmed.to_string());
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_config_parses() {
        let toml = r#"
            database_url = "sqlite:jobs.db?mode=rwc"
            timezone = "America/Toronto"
            filter_today_only = true
            unknown_posted_at = "keep"
            exclude_title_keywords = ["Senior", " Sr ", "", "senior"]
            fetch_timeout_secs = 10
            fetch_delay_ms = 500
            notify_window = "run-start"

            [[sources]]
            name = "nvidia"
            url = "https://nvidia.wd5.myworkdayjobs.com/NVIDIAExternalCareerSite"

            [[sources]]
            name = "acme"
            url = "https://boards.greenhouse.io/acme"
            kind = "greenhouse"
        "#;
        let cfg = AppConfig::from_toml_str(toml).unwrap();
        assert_eq!(cfg.exclude_title_keywords, vec!["Senior", "Sr"]);
        assert_eq!(cfg.sources.len(), 2);
        assert_eq!(cfg.notify_window, NotifyWindow::RunStart);
        assert!(matches!(
            cfg.filter_policy().unwrap().window,
            DateWindow::PostedToday {
                unknown: UnknownPostedAt::Keep,
                ..
            }
        ));
    }

    #[test]
    fn defaults_are_usable() {
        let cfg = AppConfig::from_toml_str("").unwrap();
        assert_eq!(cfg.timezone, "UTC");
        assert!(!cfg.filter_today_only);
        assert_eq!(cfg.unknown_posted_at, UnknownPostedAt::Drop);
        assert!(matches!(
            cfg.window_policy().unwrap(),
            WindowPolicy::CalendarDay(_)
        ));
    }

    #[test]
    fn bad_timezone_is_rejected_at_load() {
        let toml = r#"timezone = "Mars/Olympus_Mons""#;
        assert!(AppConfig::from_toml_str(toml).is_err());
    }

    #[serial_test::serial]
    #[test]
    fn load_honors_env_path_and_database_url_override() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("jobscout.toml");
        std::fs::write(&path, r#"timezone = "UTC""#).unwrap();

        std::env::set_var(ENV_CONFIG_PATH, path.display().to_string());
        std::env::set_var("DATABASE_URL", "sqlite:other.db");
        let cfg = AppConfig::load_default().unwrap();
        assert_eq!(cfg.database_url, "sqlite:other.db");
        std::env::remove_var(ENV_CONFIG_PATH);
        std::env::remove_var("DATABASE_URL");
    }
}
