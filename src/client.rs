use std::time::Duration;

use anyhow::{bail, Context, Result};
use reqwest::Client;
use serde::Serialize;
use tracing::debug;

const API_BASE: &str = "https://api.telegram.org";

#[derive(Serialize)]
struct SendMessage<'a> {
    chat_id: &'a str,
    text: &'a str,
}

/// Minimal Telegram Bot API client: only `sendMessage` is needed.
pub struct TelegramClient {
    client: Client,
    base: String,
    bot_token: String,
    chat_id: String,
}

impl TelegramClient {
    pub fn new(bot_token: &str, chat_id: &str) -> Result<Self> {
        Self::with_base(API_BASE, bot_token, chat_id)
    }

    /// Point the client at another Bot API host (local bot server, tests).
    pub fn with_base(base: &str, bot_token: &str, chat_id: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            base: base.trim_end_matches('/').to_string(),
            bot_token: bot_token.to_string(),
            chat_id: chat_id.to_string(),
        })
    }

    pub async fn send_message(&self, text: &str) -> Result<()> {
        let url = format!("{}/bot{}/sendMessage", self.base, self.bot_token);

        let resp = self
            .client
            .post(&url)
            .json(&SendMessage {
                chat_id: &self.chat_id,
                text,
            })
            .send()
            .await
            .context("Failed to send Telegram message")?;

        let status = resp.status();
        let text = resp.text().await.context("Failed to read Telegram response")?;
        debug!("Telegram response (status {}): {}", status, text);

        let body: serde_json::Value = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse Telegram response (status {status}): {text}"))?;

        let ok = body.get("ok").and_then(|v| v.as_bool()).unwrap_or(false);
        if !ok {
            let msg = body
                .get("description")
                .and_then(|v| v.as_str())
                .unwrap_or("unknown error");
            bail!("Telegram rejected message (status {status}): {msg}");
        }
        Ok(())
    }
}
