use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::errors::{Result, WatchError};

const SEND_TIMEOUT: Duration = Duration::from_secs(10);

/// Outbound notification channel. Callers treat delivery as fire-and-forget;
/// a failure is logged at the call site and never alters control flow.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, text: &str) -> Result<()>;
}

/// Telegram bot channel.
pub struct TelegramNotifier {
    bot_token: String,
    chat_id: String,
    client: reqwest::Client,
}

impl TelegramNotifier {
    pub fn new(bot_token: impl Into<String>, chat_id: impl Into<String>) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(SEND_TIMEOUT)
            .build()
            .map_err(|e| WatchError::Notify(e.to_string()))?;

        Ok(Self {
            bot_token: bot_token.into(),
            chat_id: chat_id.into(),
            client,
        })
    }
}

#[async_trait]
impl Notifier for TelegramNotifier {
    async fn send(&self, text: &str) -> Result<()> {
        let url = format!(
            "https://api.telegram.org/bot{}/sendMessage",
            self.bot_token
        );

        let payload = serde_json::json!({
            "chat_id": self.chat_id,
            "text": text,
        });

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| WatchError::Notify(format!("Telegram request failed: {}", e)))?;

        if response.status().is_success() {
            debug!("Telegram message delivered");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(WatchError::Notify(format!(
                "Telegram API returned {}: {}",
                status, body
            )))
        }
    }
}
