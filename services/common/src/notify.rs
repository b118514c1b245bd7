//! Outbound notification sinks
//!
//! Notifications are fire-and-forget: callers go through [`notify_best_effort`]
//! so a failed delivery is reported as a warning and never aborts the caller.

use crate::constants::http::{MAX_ERROR_BODY_LEN, TELEGRAM_API_URL};
use crate::errors::{ServiceError, ServiceResult};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Plain-text notification sink
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Deliver one message
    async fn send(&self, text: &str) -> ServiceResult<()>;
}

/// Send a message and downgrade any failure to a warning
pub async fn notify_best_effort(sink: &dyn NotificationSink, text: &str) -> bool {
    match sink.send(text).await {
        Ok(()) => true,
        Err(e) => {
            warn!("Notification delivery failed: {}", e);
            false
        }
    }
}

/// Telegram Bot API credentials
#[derive(Debug, Clone)]
pub struct TelegramConfig {
    pub bot_token: String,
    pub chat_id: String,
    pub api_url: String,
    pub timeout_secs: u64,
}

impl TelegramConfig {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Self {
        Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            api_url: TELEGRAM_API_URL.to_string(),
            timeout_secs: 10,
        }
    }

    /// Point the notifier at a different API root (used by tests)
    #[must_use]
    pub fn with_api_url(mut self, api_url: impl Into<String>) -> Self {
        self.api_url = api_url.into();
        self
    }
}

/// Delivers messages through Telegram `sendMessage`
pub struct TelegramNotifier {
    config: TelegramConfig,
    client: Client,
}

impl TelegramNotifier {
    pub fn new(config: TelegramConfig) -> ServiceResult<Self> {
        if config.bot_token.is_empty() || config.chat_id.is_empty() {
            return Err(ServiceError::Configuration(
                "telegram bot_token and chat_id must be set".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/bot{}/sendMessage",
            self.config.api_url.trim_end_matches('/'),
            self.config.bot_token
        )
    }
}

#[async_trait]
impl NotificationSink for TelegramNotifier {
    async fn send(&self, text: &str) -> ServiceResult<()> {
        let params = [("chat_id", self.config.chat_id.as_str()), ("text", text)];

        let response = self.client.post(self.endpoint()).form(&params).send().await?;

        let status = response.status();
        if !status.is_success() {
            let mut body = response.text().await.unwrap_or_default();
            if body.len() > MAX_ERROR_BODY_LEN {
                let mut end = MAX_ERROR_BODY_LEN;
                while !body.is_char_boundary(end) {
                    end -= 1;
                }
                body.truncate(end);
            }
            return Err(ServiceError::DeliveryRejected {
                status: status.as_u16(),
                body,
            });
        }

        debug!("Telegram message delivered ({} chars)", text.len());
        Ok(())
    }
}

/// Writes notifications to the log only; used when no remote sink is configured
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl NotificationSink for LogNotifier {
    async fn send(&self, text: &str) -> ServiceResult<()> {
        info!(target: "notifications", "{}", text);
        Ok(())
    }
}
