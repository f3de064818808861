//! Answers `/start` and `/price` commands sent to the bot.

use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::pipeline::ReportPipeline;
use crate::publish::PublishError;
use crate::publish::telegram::{Message, TelegramClient};
use crate::report::{FAILURE_NOTICE, PARSE_MODE, persian_digits};

const PLACEHOLDER: &str = "⏳ ...";
const POLL_ERROR_BACKOFF: Duration = Duration::from_secs(5);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Start,
    Help,
    Price,
}

/// Parses the leading command of a message, accepting the `/cmd@botname`
/// form used in groups.
pub fn parse_command(text: &str) -> Option<Command> {
    let first = text.split_whitespace().next()?;
    let name = first.strip_prefix('/')?;
    let name = name.split_once('@').map_or(name, |(cmd, _)| cmd);
    match name.to_lowercase().as_str() {
        "start" => Some(Command::Start),
        "help" => Some(Command::Help),
        "price" => Some(Command::Price),
        _ => None,
    }
}

/// Interval in whole minutes rounded to nearest, or in seconds below a minute.
fn interval_text(interval_secs: u64) -> String {
    if interval_secs < 60 {
        format!("{} ثانیه", persian_digits(interval_secs))
    } else {
        format!("{} دقیقه", persian_digits((interval_secs + 30) / 60))
    }
}

pub fn welcome_text(first_name: &str, channel: &str, interval_secs: u64) -> String {
    format!(
        "سلام {first_name} عزیز! 👋\n\n\
         🤖 من ربات هوشمند اعلام نرخ طلا و ارز هستم.\n\
         ⏰ بروزرسانی خودکار هر {} در کانال:\n{channel}",
        interval_text(interval_secs)
    )
}

pub struct Bot {
    client: TelegramClient,
    pipeline: Arc<ReportPipeline>,
    channel: String,
    interval_secs: u64,
}

impl Bot {
    pub fn new(
        client: TelegramClient,
        pipeline: Arc<ReportPipeline>,
        channel: &str,
        interval_secs: u64,
    ) -> Self {
        Bot {
            client,
            pipeline,
            channel: channel.to_string(),
            interval_secs,
        }
    }

    /// Long-polls for updates forever. Each command is handled on its own
    /// task so a slow `/price` never holds up polling.
    pub async fn run(self: Arc<Self>) {
        info!("Bot polling started");
        let mut offset = None;
        loop {
            let updates = match self.client.get_updates(offset).await {
                Ok(updates) => updates,
                Err(e) => {
                    warn!(error = %e, "Polling for updates failed");
                    tokio::time::sleep(POLL_ERROR_BACKOFF).await;
                    continue;
                }
            };

            for update in updates {
                offset = Some(update.update_id + 1);
                let Some(message) = update.message else {
                    continue;
                };
                let bot = Arc::clone(&self);
                tokio::spawn(async move {
                    if let Err(e) = bot.handle_message(message).await {
                        warn!(error = %e, "Failed to answer command");
                    }
                });
            }
        }
    }

    pub async fn handle_message(&self, message: Message) -> Result<(), PublishError> {
        let Some(command) = message.text.as_deref().and_then(parse_command) else {
            return Ok(());
        };
        debug!(?command, chat_id = message.chat.id, "Received command");

        match command {
            Command::Start | Command::Help => {
                let first_name = message
                    .from
                    .as_ref()
                    .map_or("", |user| user.first_name.as_str());
                let text = welcome_text(first_name, &self.channel, self.interval_secs);
                self.client.send_message(message.chat.id, &text, None).await?;
            }
            Command::Price => {
                let placeholder = self
                    .client
                    .send_message(message.chat.id, PLACEHOLDER, None)
                    .await?;
                match self.pipeline.prepare_report().await {
                    Some(report) => {
                        self.client
                            .edit_message_text(
                                message.chat.id,
                                placeholder.message_id,
                                &report,
                                Some(PARSE_MODE),
                            )
                            .await?
                    }
                    None => {
                        self.client
                            .edit_message_text(
                                message.chat.id,
                                placeholder.message_id,
                                FAILURE_NOTICE,
                                None,
                            )
                            .await?
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::tests::pipeline;
    use crate::publish::telegram::Chat;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn message(text: &str) -> Message {
        Message {
            message_id: 1,
            chat: Chat { id: 42 },
            from: Some(crate::publish::telegram::User {
                first_name: "Sara".to_string(),
            }),
            text: Some(text.to_string()),
        }
    }

    async fn mock_placeholder(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/bot1:t/sendMessage"))
            .and(body_partial_json(json!({"chat_id": 42, "text": PLACEHOLDER})))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"ok": true, "result": {"message_id": 9, "chat": {"id": 42}}}"#,
            ))
            .expect(1)
            .mount(server)
            .await;
    }

    fn bot(server: &MockServer, prices: ReportPipeline) -> Bot {
        let client = TelegramClient::new(&server.uri(), "1:t").unwrap();
        Bot::new(client, Arc::new(prices), "@nerkh", 600)
    }

    #[test]
    fn test_parse_command() {
        assert_eq!(parse_command("/price"), Some(Command::Price));
        assert_eq!(parse_command("/price@NerkhBot"), Some(Command::Price));
        assert_eq!(parse_command("/start now"), Some(Command::Start));
        assert_eq!(parse_command("/HELP"), Some(Command::Help));
        assert_eq!(parse_command("price"), None);
        assert_eq!(parse_command("/unknown"), None);
        assert_eq!(parse_command(""), None);
    }

    #[test]
    fn test_welcome_text() {
        let text = welcome_text("Sara", "@nerkh", 600);
        assert!(text.starts_with("سلام Sara عزیز!"));
        assert!(text.contains("هر ۱۰ دقیقه"));
        assert!(text.ends_with("@nerkh"));
    }

    #[test]
    fn test_interval_text_rounds_and_uses_seconds_below_a_minute() {
        assert_eq!(interval_text(30), "۳۰ ثانیه");
        assert_eq!(interval_text(60), "۱ دقیقه");
        assert_eq!(interval_text(89), "۱ دقیقه");
        assert_eq!(interval_text(90), "۲ دقیقه");
        assert_eq!(interval_text(600), "۱۰ دقیقه");
        assert!(welcome_text("Sara", "@nerkh", 45).contains("هر ۴۵ ثانیه"));
    }

    #[tokio::test]
    async fn test_price_command_edits_placeholder_with_report() {
        let server = MockServer::start().await;
        mock_placeholder(&server).await;
        Mock::given(method("POST"))
            .and(path("/bot1:t/editMessageText"))
            .and(body_partial_json(
                json!({"chat_id": 42, "message_id": 9, "parse_mode": "Markdown"}),
            ))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"ok": true, "result": true}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let bot = bot(&server, pipeline(Some("2000"), Some("60000"), None, None));
        bot.handle_message(message("/price")).await.unwrap();
    }

    #[tokio::test]
    async fn test_price_command_reports_failure_notice() {
        let server = MockServer::start().await;
        mock_placeholder(&server).await;
        Mock::given(method("POST"))
            .and(path("/bot1:t/editMessageText"))
            .and(body_partial_json(
                json!({"chat_id": 42, "message_id": 9, "text": FAILURE_NOTICE}),
            ))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"ok": true, "result": true}"#),
            )
            .expect(1)
            .mount(&server)
            .await;

        let bot = bot(&server, pipeline(None, None, None, None));
        bot.handle_message(message("/price")).await.unwrap();
    }

    #[tokio::test]
    async fn test_start_command_sends_welcome() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/bot1:t/sendMessage"))
            .and(body_partial_json(json!({"chat_id": 42})))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"ok": true, "result": {"message_id": 2, "chat": {"id": 42}}}"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let bot = bot(&server, pipeline(None, None, None, None));
        bot.handle_message(message("/start")).await.unwrap();
    }

    #[tokio::test]
    async fn test_plain_text_is_ignored() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .expect(0)
            .mount(&server)
            .await;

        let bot = bot(&server, pipeline(Some("2000"), None, None, None));
        bot.handle_message(message("hello")).await.unwrap();
    }
}
