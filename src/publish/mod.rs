//! Delivery of finished reports.

pub mod telegram;

use async_trait::async_trait;
use reqwest::StatusCode;
use std::io::Write;
use thiserror::Error;

use crate::report::PARSE_MODE;
use telegram::TelegramClient;

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("request to Telegram failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("Telegram returned HTTP {0}: {1}")]
    Status(StatusCode, String),
    #[error("Telegram rejected the request: {0}")]
    Api(String),
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait Publisher: Send + Sync {
    async fn publish(&self, text: &str) -> Result<(), PublishError>;
}

/// Posts reports to a Telegram channel.
pub struct ChannelPublisher {
    client: TelegramClient,
    channel_id: String,
}

impl ChannelPublisher {
    pub fn new(client: TelegramClient, channel_id: &str) -> Self {
        ChannelPublisher {
            client,
            channel_id: channel_id.to_string(),
        }
    }
}

#[async_trait]
impl Publisher for ChannelPublisher {
    async fn publish(&self, text: &str) -> Result<(), PublishError> {
        self.client
            .send_message(self.channel_id.as_str(), text, Some(PARSE_MODE))
            .await?;
        Ok(())
    }
}

/// Prints reports to stdout. Used when no bot token is configured.
pub struct ConsolePublisher;

#[async_trait]
impl Publisher for ConsolePublisher {
    async fn publish(&self, text: &str) -> Result<(), PublishError> {
        let mut stdout = std::io::stdout().lock();
        writeln!(stdout, "{text}")?;
        stdout.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_channel_publisher_sends_markdown() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot1:t/sendMessage"))
            .and(body_partial_json(
                json!({"chat_id": "@nerkh", "text": "report", "parse_mode": "Markdown"}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"ok": true, "result": {"message_id": 3, "chat": {"id": -1001}}}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = TelegramClient::new(&server.uri(), "1:t").unwrap();
        let publisher = ChannelPublisher::new(client, "@nerkh");
        publisher.publish("report").await.unwrap();
    }

    #[tokio::test]
    async fn test_channel_publisher_reports_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(502).set_body_string("Bad Gateway"))
            .mount(&server)
            .await;

        let client = TelegramClient::new(&server.uri(), "1:t").unwrap();
        let publisher = ChannelPublisher::new(client, "@nerkh");
        assert!(matches!(
            publisher.publish("report").await.unwrap_err(),
            PublishError::Status(status, _) if status == StatusCode::BAD_GATEWAY
        ));
    }
}
