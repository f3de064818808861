//! Minimal Telegram Bot API client covering what the bot needs.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use tracing::debug;

use super::PublishError;

/// Long-poll wait passed to `getUpdates`.
pub const POLL_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum ChatId {
    Id(i64),
    Username(String),
}

impl From<i64> for ChatId {
    fn from(id: i64) -> Self {
        ChatId::Id(id)
    }
}

impl From<&str> for ChatId {
    fn from(channel: &str) -> Self {
        match channel.parse::<i64>() {
            Ok(id) => ChatId::Id(id),
            Err(_) => ChatId::Username(channel.to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct User {
    pub first_name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Chat {
    pub id: i64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Message {
    pub message_id: i64,
    pub chat: Chat,
    pub from: Option<User>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Update {
    pub update_id: i64,
    pub message: Option<Message>,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Clone)]
pub struct TelegramClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl TelegramClient {
    pub fn new(base_url: &str, token: &str) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(POLL_TIMEOUT_SECS + 15))
            .build()?;
        Ok(TelegramClient {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client,
        })
    }

    pub async fn send_message(
        &self,
        chat_id: impl Into<ChatId>,
        text: &str,
        parse_mode: Option<&str>,
    ) -> Result<Message, PublishError> {
        let chat_id: ChatId = chat_id.into();
        let mut body = json!({ "chat_id": chat_id, "text": text });
        if let Some(mode) = parse_mode {
            body["parse_mode"] = json!(mode);
        }
        self.call("sendMessage", &body).await
    }

    pub async fn edit_message_text(
        &self,
        chat_id: i64,
        message_id: i64,
        text: &str,
        parse_mode: Option<&str>,
    ) -> Result<(), PublishError> {
        let mut body = json!({ "chat_id": chat_id, "message_id": message_id, "text": text });
        if let Some(mode) = parse_mode {
            body["parse_mode"] = json!(mode);
        }
        // The result is the edited message, or `true` for inline messages.
        let _: serde_json::Value = self.call("editMessageText", &body).await?;
        Ok(())
    }

    pub async fn get_updates(&self, offset: Option<i64>) -> Result<Vec<Update>, PublishError> {
        let mut body = json!({
            "timeout": POLL_TIMEOUT_SECS,
            "allowed_updates": ["message"],
        });
        if let Some(offset) = offset {
            body["offset"] = json!(offset);
        }
        self.call("getUpdates", &body).await
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: &str,
        body: &serde_json::Value,
    ) -> Result<T, PublishError> {
        // The token is part of the URL, so only the method name is logged.
        debug!(method, "Calling Telegram");
        let url = format!("{}/bot{}/{}", self.base_url, self.token, method);
        let response = self.client.post(&url).json(body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        parse_response(status, &text)
    }
}

fn parse_response<T: DeserializeOwned>(status: StatusCode, text: &str) -> Result<T, PublishError> {
    let parsed: Option<ApiResponse<T>> = serde_json::from_str(text).ok();
    match parsed {
        Some(ApiResponse {
            ok: true,
            result: Some(result),
            ..
        }) if status.is_success() => Ok(result),
        Some(response) if !status.is_success() => Err(PublishError::Status(
            status,
            response.description.unwrap_or_default(),
        )),
        Some(response) => Err(PublishError::Api(
            response
                .description
                .unwrap_or_else(|| "response without result".to_string()),
        )),
        None if !status.is_success() => Err(PublishError::Status(status, text.to_string())),
        None => Err(PublishError::Api(format!("unreadable response: {text}"))),
    }
}
