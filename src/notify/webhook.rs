// src/notify/webhook.rs
//
// Slack-compatible webhook channel: one JSON {"text": ...} POST per batch.
// The 2xx status is the delivery confirmation.

use anyhow::{Context, Result};
use chrono_tz::Tz;
use reqwest::Client;

use super::{digest_body, digest_subject, local_date, DeliveryChannel};
use crate::model::Posting;

pub struct WebhookChannel {
    webhook_url: String,
    client: Client,
    tz: Tz,
}

impl WebhookChannel {
    pub fn new(webhook_url: String, tz: Tz) -> Self {
        Self {
            webhook_url,
            client: Client::new(),
            tz,
        }
    }

    /// `None` when NOTIFY_WEBHOOK_URL is unset; the caller falls back to
    /// another channel rather than treating "disabled" as delivered.
    pub fn from_env(tz: Tz) -> Option<Self> {
        std::env::var("NOTIFY_WEBHOOK_URL")
            .ok()
            .map(|url| Self::new(url, tz))
    }
}

#[async_trait::async_trait]
impl DeliveryChannel for WebhookChannel {
    async fn deliver(&self, batch: &[Posting]) -> Result<()> {
        let today = local_date(chrono::Utc::now(), self.tz);
        let text = format!("*{}*\n\n{}", digest_subject(batch, today), digest_body(batch));
        let body = serde_json::json!({ "text": text });

        self.client
            .post(&self.webhook_url)
            .json(&body)
            .send()
            .await
            .context("webhook post")?
            .error_for_status()
            .context("webhook non-2xx")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "webhook"
    }
}
