use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;

use crate::report::{render_text, EligibilityReport};

#[async_trait]
pub trait ReportSink: Send + Sync {
    fn name(&self) -> &'static str;

    async fn deliver(&self, report: &EligibilityReport) -> Result<()>;
}

pub struct StdoutSink;

#[async_trait]
impl ReportSink for StdoutSink {
    fn name(&self) -> &'static str {
        "stdout"
    }

    async fn deliver(&self, report: &EligibilityReport) -> Result<()> {
        println!("To: {} <{}>", report.recipient_name, report.email);
        println!("Subject: {}", report.subject);
        println!();
        println!("{}", render_text(report));
        Ok(())
    }
}

/// Posts the report as JSON. Discord webhooks get a plain `content` message.
pub struct WebhookSink {
    client: Client,
    url: String,
}

impl WebhookSink {
    pub fn new(url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent("grant-triage/0.1")
            .timeout(Duration::from_secs(10))
            .build()
            .context("failed to build webhook HTTP client")?;
        Ok(Self {
            client,
            url: url.into(),
        })
    }
}

#[async_trait]
impl ReportSink for WebhookSink {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn deliver(&self, report: &EligibilityReport) -> Result<()> {
        let req = if self.url.contains("discord.com/api/webhooks")
            || self.url.contains("discordapp.com/api/webhooks")
        {
            let content = format!("{}\n{}", report.subject, render_text(report));
            self.client
                .post(&self.url)
                .json(&serde_json::json!({ "content": content }))
        } else {
            self.client.post(&self.url).json(report)
        };

        req.send()
            .await
            .with_context(|| format!("webhook request failed: {}", self.url))?
            .error_for_status()?;
        Ok(())
    }
}
