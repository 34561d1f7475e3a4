//! Discord adapter.
//!
//! Implements the `badger-core` MessagingPort over the Discord REST API,
//! posting as the account that owns the configured token.

use std::time::Duration;

use async_trait::async_trait;

use badger_core::{
    domain::{ChannelId, MessageRef},
    errors::Error,
    messaging::port::MessagingPort,
    Result,
};

pub const API_BASE: &str = "https://discord.com/api/v9";

// Requests look like the desktop client's.
const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; WOW64) AppleWebKit/537.36 (KHTML, \
like Gecko) discord/1.0.9017 Chrome/108.0.5359.215 Electron/22.3.12 Safari/537.36";

#[derive(Clone, Debug)]
pub struct DiscordMessenger {
    http: reqwest::Client,
    api_base: String,
}

impl DiscordMessenger {
    pub fn new(token: &str) -> Result<Self> {
        Self::with_api_base(token, API_BASE)
    }

    pub fn with_api_base(token: &str, api_base: impl Into<String>) -> Result<Self> {
        Self::build(reqwest::Client::builder(), token, api_base)
    }

    fn build(
        builder: reqwest::ClientBuilder,
        token: &str,
        api_base: impl Into<String>,
    ) -> Result<Self> {
        let mut auth = reqwest::header::HeaderValue::from_str(token.trim())
            .map_err(|_| Error::Config("token contains invalid characters".to_string()))?;
        auth.set_sensitive(true);

        let mut headers = reqwest::header::HeaderMap::new();
        headers.insert(reqwest::header::AUTHORIZATION, auth);

        let http = builder
            .user_agent(USER_AGENT)
            .default_headers(headers)
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| Error::External(format!("discord client build error: {e}")))?;

        Ok(Self {
            http,
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn messages_url(&self, channel_id: ChannelId) -> String {
        format!("{}/channels/{channel_id}/messages", self.api_base)
    }
}

#[async_trait]
impl MessagingPort for DiscordMessenger {
    async fn send_text(&self, channel_id: ChannelId, text: &str) -> Result<MessageRef> {
        let resp = self
            .http
            .post(self.messages_url(channel_id))
            .json(&serde_json::json!({ "content": text }))
            .send()
            .await
            .map_err(|e| Error::External(format!("discord request error: {e}")))?;

        // The bot's reaction is what matters; a rejected post is only logged.
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            tracing::warn!(
                %status,
                body = %body.chars().take(200).collect::<String>(),
                "discord rejected message"
            );
            return Ok(MessageRef {
                channel_id,
                message_id: None,
            });
        }

        let v: serde_json::Value = resp.json().await.unwrap_or_default();
        Ok(MessageRef {
            channel_id,
            message_id: message_id(&v),
        })
    }
}

fn message_id(v: &serde_json::Value) -> Option<String> {
    v.get("id").and_then(|id| id.as_str()).map(str::to_string)
}
