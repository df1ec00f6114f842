//! Reminder delivery: an HTTP mail webhook, or log lines when none is configured.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{env_opt, env_or};

#[derive(Debug, Clone)]
pub struct MailerConfig {
    pub webhook_url: Option<String>,
    pub api_key: Option<String>,
    pub from: String,
    pub timeout_secs: u64,
}

impl Default for MailerConfig {
    fn default() -> Self {
        Self {
            webhook_url: env_opt("MAILER_WEBHOOK_URL"),
            api_key: env_opt("MAILER_API_KEY"),
            from: env_opt("MAILER_FROM").unwrap_or_else(|| "contracts@localhost".to_string()),
            timeout_secs: env_or("MAILER_TIMEOUT_SECS", 15),
        }
    }
}

/// One expiry notification addressed to a contract's contact
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reminder {
    pub contract_id: Uuid,
    pub to: String,
    pub subject: String,
    pub body: String,
}

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("mail request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("mail service returned HTTP {0}")]
    Status(u16),
}

#[async_trait]
pub trait Notifier: Send + Sync {
    fn name(&self) -> &'static str;

    async fn send(&self, reminder: &Reminder) -> Result<(), NotifyError>;
}

/// Writes each reminder to the log instead of sending it
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    fn name(&self) -> &'static str {
        "log"
    }

    async fn send(&self, reminder: &Reminder) -> Result<(), NotifyError> {
        tracing::info!(
            contract_id = %reminder.contract_id,
            to = %reminder.to,
            subject = %reminder.subject,
            "reminder (not delivered: no mail webhook configured)"
        );
        Ok(())
    }
}

/// POSTs `{from, to, subject, body, contract_id}` to a mail-sending endpoint
pub struct WebhookNotifier {
    client: reqwest::Client,
    url: String,
    api_key: Option<String>,
    from: String,
}

impl WebhookNotifier {
    pub fn new(config: &MailerConfig, url: String) -> Result<Self, NotifyError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            url,
            api_key: config.api_key.clone(),
            from: config.from.clone(),
        })
    }
}

#[async_trait]
impl Notifier for WebhookNotifier {
    fn name(&self) -> &'static str {
        "webhook"
    }

    async fn send(&self, reminder: &Reminder) -> Result<(), NotifyError> {
        let mut request = self.client.post(&self.url).json(&json!({
            "from": self.from,
            "to": reminder.to,
            "subject": reminder.subject,
            "body": reminder.body,
            "contract_id": reminder.contract_id,
        }));
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::warn!(
                contract_id = %reminder.contract_id,
                status = %status,
                "mail webhook rejected reminder"
            );
            return Err(NotifyError::Status(status.as_u16()));
        }
        Ok(())
    }
}

pub fn build_notifier(config: &MailerConfig) -> Arc<dyn Notifier> {
    let Some(url) = config.webhook_url.clone() else {
        tracing::info!("MAILER_WEBHOOK_URL not set. Reminders will only be logged.");
        return Arc::new(LogNotifier);
    };
    match WebhookNotifier::new(config, url) {
        Ok(notifier) => Arc::new(notifier),
        Err(e) => {
            tracing::error!(error = %e, "Failed to build mail webhook client. Reminders will only be logged.");
            Arc::new(LogNotifier)
        }
    }
}
