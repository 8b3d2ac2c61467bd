//! jobscout — binary entrypoint.
//!
//! Discovers postings from every configured job board, reconciles them
//! against the record store, and emails (or webhooks) the postings that are
//! new in the current window. Exits non-zero when the run itself fails;
//! "no new jobs" is a successful run with zero counts.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Result};
use chrono::Utc;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use jobscout::config::AppConfig;
use jobscout::notify::{email::EmailChannel, webhook::WebhookChannel, DeliveryChannel};
use jobscout::source::{build_adapter, SourceAdapter};
use jobscout::store::RecordStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    Once,
    DiscoverOnly,
    NotifyOnly,
    Watch,
}

fn parse_mode() -> Result<Mode> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.first().map(String::as_str) {
        None => Ok(Mode::Once),
        Some("--discover-only") => Ok(Mode::DiscoverOnly),
        Some("--notify-only") => Ok(Mode::NotifyOnly),
        Some("--watch") => Ok(Mode::Watch),
        Some(other) => bail!(
            "unknown argument '{other}' (expected --discover-only, --notify-only, or --watch)"
        ),
    }
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("jobscout=info,warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().compact())
        .init();
}

fn build_adapters(cfg: &AppConfig) -> Vec<Box<dyn SourceAdapter>> {
    let settings = cfg.fetch_settings();
    let mut adapters = Vec::with_capacity(cfg.sources.len());
    for source in &cfg.sources {
        match build_adapter(&source.name, &source.url, source.kind.as_deref(), &settings) {
            Ok(adapter) => adapters.push(adapter),
            Err(error) => {
                tracing::warn!(source = %source.name, error = ?error, "skipping source");
            }
        }
    }
    adapters
}

fn build_channel(tz: chrono_tz::Tz) -> Result<Box<dyn DeliveryChannel>> {
    if let Some(webhook) = WebhookChannel::from_env(tz) {
        return Ok(Box::new(webhook));
    }
    Ok(Box::new(EmailChannel::from_env(tz)?))
}

#[tokio::main]
async fn main() -> Result<()> {
    let _ = dotenvy::dotenv();
    init_tracing();

    let mode = parse_mode()?;
    let cfg = AppConfig::load_default()?;
    let policy = cfg.filter_policy()?;
    let window = cfg.window_policy()?;
    let tz = cfg.tz()?;

    let store = RecordStore::connect(&cfg.database_url).await?;
    tracing::info!(
        database = %cfg.database_url,
        sources = cfg.sources.len(),
        timezone = %cfg.timezone,
        "jobscout starting"
    );

    match mode {
        Mode::Once => {
            let adapters = build_adapters(&cfg);
            let channel = build_channel(tz)?;
            let report =
                jobscout::run_once(&store, &adapters, &policy, window, channel.as_ref()).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Mode::DiscoverOnly => {
            let adapters = build_adapters(&cfg);
            let report = jobscout::run_discovery(&store, &adapters, &policy, Utc::now()).await?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Mode::NotifyOnly => {
            if window == jobscout::WindowPolicy::RunStart {
                // A run-start window only covers postings discovered at or
                // after this instant, and a notify-only run discovers
                // nothing. Anything already pending stays outside the window.
                tracing::warn!(
                    "notify_window = \"run-start\" with --notify-only sends nothing; \
                     use notify_window = \"calendar-day\" to flush pending postings"
                );
            }
            let channel = build_channel(tz)?;
            let notified = jobscout::dispatch(&store, channel.as_ref(), window, Utc::now()).await?;
            tracing::info!(notified, "notify-only run complete");
        }
        Mode::Watch => {
            let adapters = Arc::new(build_adapters(&cfg));
            let channel: Arc<dyn DeliveryChannel> = Arc::from(build_channel(tz)?);
            let handle = jobscout::scheduler::spawn_watch_loop(
                Arc::new(store),
                adapters,
                Arc::new(policy),
                window,
                channel,
                Duration::from_secs(cfg.interval_secs),
            );
            handle.await?;
        }
    }
    Ok(())
}
