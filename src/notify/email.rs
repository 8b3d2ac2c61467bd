// src/notify/email.rs
use anyhow::{Context, Result};
use chrono_tz::Tz;
use lettre::message::{header, Mailbox, Message};
use lettre::transport::smtp::{authentication::Credentials, AsyncSmtpTransport};
use lettre::{AsyncTransport, Tokio1Executor};

use super::{digest_body, digest_subject, local_date, DeliveryChannel};
use crate::model::Posting;

pub struct EmailChannel {
    mailer: AsyncSmtpTransport<Tokio1Executor>,
    from: Mailbox,
    to: Mailbox,
    tz: Tz,
}

impl EmailChannel {
    pub fn from_env(tz: Tz) -> Result<Self> {
        let host = std::env::var("SMTP_HOST").context("SMTP_HOST missing")?;
        let user = std::env::var("SMTP_USER").context("SMTP_USER missing")?;
        let pass = std::env::var("SMTP_PASS").context("SMTP_PASS missing")?;
        let from_addr = std::env::var("NOTIFY_EMAIL_FROM").context("NOTIFY_EMAIL_FROM missing")?;
        let to_addr = std::env::var("NOTIFY_EMAIL_TO").context("NOTIFY_EMAIL_TO missing")?;

        let creds = Credentials::new(user, pass);
        let mailer = AsyncSmtpTransport::<Tokio1Executor>::relay(&host)
            .context("invalid SMTP_HOST")?
            .credentials(creds)
            .build();

        let from = from_addr.parse().context("invalid NOTIFY_EMAIL_FROM")?;
        let to = to_addr.parse().context("invalid NOTIFY_EMAIL_TO")?;

        Ok(Self {
            mailer,
            from,
            to,
            tz,
        })
    }
}

#[async_trait::async_trait]
impl DeliveryChannel for EmailChannel {
    async fn deliver(&self, batch: &[Posting]) -> Result<()> {
        let today = local_date(chrono::Utc::now(), self.tz);
        let msg = Message::builder()
            .from(self.from.clone())
            .to(self.to.clone())
            .subject(digest_subject(batch, today))
            .header(header::ContentType::TEXT_PLAIN)
            .body(digest_body(batch))
            .context("build email")?;

        self.mailer.send(msg).await.context("send email")?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "email"
    }
}
