use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use shared::domain::{Formatting, Label, ReplyPayload};
use tokio::sync::mpsc;
use tracing::{info, warn};
use url::Url;

use crate::transport::{InboundMessage, Transport, TransportError};

const RETRY_DELAY: Duration = Duration::from_secs(5);
/// Slack on top of the long-poll timeout before the HTTP client gives up.
const CLIENT_TIMEOUT_SLACK: Duration = Duration::from_secs(10);

/// Long-polls the Telegram Bot API and replies through `sendMessage`.
pub struct TelegramTransport {
    api_base: Url,
    bot_token: String,
    keyboard: Vec<Vec<Label>>,
    poll_timeout: Duration,
    retry_delay: Duration,
    client: Client,
}

#[derive(Debug, Deserialize)]
struct ApiResponse<T> {
    ok: bool,
    result: Option<T>,
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Update {
    pub(crate) update_id: i64,
    pub(crate) message: Option<Message>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Message {
    pub(crate) chat: Chat,
    pub(crate) from: Option<User>,
    pub(crate) text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Chat {
    pub(crate) id: i64,
}

#[derive(Debug, Deserialize)]
pub(crate) struct User {
    pub(crate) id: i64,
}

#[derive(Debug, Serialize)]
struct GetUpdatesRequest<'a> {
    offset: i64,
    timeout: u64,
    allowed_updates: &'a [&'a str],
}

#[derive(Debug, Serialize)]
pub(crate) struct SendMessageRequest<'a> {
    pub(crate) chat_id: i64,
    pub(crate) text: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) parse_mode: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) reply_markup: Option<ReplyKeyboardMarkup<'a>>,
}

#[derive(Debug, Serialize)]
pub(crate) struct ReplyKeyboardMarkup<'a> {
    pub(crate) keyboard: Vec<Vec<KeyboardButton<'a>>>,
    pub(crate) resize_keyboard: bool,
}

#[derive(Debug, Serialize)]
pub(crate) struct KeyboardButton<'a> {
    pub(crate) text: &'a str,
}

impl TelegramTransport {
    pub fn new(
        api_base: Url,
        bot_token: String,
        keyboard: Vec<Vec<Label>>,
        poll_timeout: Duration,
    ) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(poll_timeout + CLIENT_TIMEOUT_SLACK)
            .build()?;
        Ok(Self {
            api_base,
            bot_token,
            keyboard,
            poll_timeout,
            retry_delay: RETRY_DELAY,
            client,
        })
    }

    pub fn with_retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = retry_delay;
        self
    }

    pub(crate) fn api_url(&self, method: &str) -> String {
        format!(
            "{}/bot{}/{method}",
            self.api_base.as_str().trim_end_matches('/'),
            self.bot_token
        )
    }

    pub(crate) fn send_request<'a>(
        &'a self,
        chat_id: i64,
        reply: &'a ReplyPayload,
    ) -> SendMessageRequest<'a> {
        let parse_mode = match reply.formatting {
            Formatting::Plain => None,
            Formatting::Rich => Some("HTML"),
        };
        let reply_markup = reply.keyboard_attached.then(|| ReplyKeyboardMarkup {
            keyboard: self
                .keyboard
                .iter()
                .map(|row| {
                    row.iter()
                        .map(|label| KeyboardButton {
                            text: label.as_str(),
                        })
                        .collect()
                })
                .collect(),
            resize_keyboard: true,
        });
        SendMessageRequest {
            chat_id,
            text: &reply.text,
            parse_mode,
            reply_markup,
        }
    }

    async fn call<B, T>(&self, method: &str, body: &B) -> Result<T, TransportError>
    where
        B: Serialize + ?Sized,
        T: for<'de> Deserialize<'de>,
    {
        let response = self
            .client
            .post(self.api_url(method))
            .json(body)
            .send()
            .await?;
        // Error statuses still carry an `ok:false` envelope with the reason.
        let status = response.status();
        let response: ApiResponse<T> = match response.json().await {
            Ok(response) => response,
            Err(_) if !status.is_success() => {
                return Err(TransportError::Rejected(format!("{method} failed with {status}")));
            }
            Err(error) => return Err(error.into()),
        };

        match (response.ok, response.result) {
            (true, Some(result)) => Ok(result),
            _ => Err(TransportError::Rejected(
                response
                    .description
                    .unwrap_or_else(|| format!("{method} returned no result")),
            )),
        }
    }

    async fn get_updates(&self, offset: i64) -> Result<Vec<Update>, TransportError> {
        let body = GetUpdatesRequest {
            offset,
            timeout: self.poll_timeout.as_secs(),
            allowed_updates: &["message"],
        };
        self.call("getUpdates", &body).await
    }
}

pub(crate) fn inbound_from_update(update: Update) -> Option<InboundMessage> {
    let message = update.message?;
    let text = message.text?;
    Some(InboundMessage {
        user_id: message.from.map(|user| user.id),
        chat_id: message.chat.id,
        text,
    })
}

#[async_trait]
impl Transport for TelegramTransport {
    fn name(&self) -> &str {
        "telegram"
    }

    async fn listen(&self, tx: mpsc::Sender<InboundMessage>) -> anyhow::Result<()> {
        let mut offset: i64 = 0;
        info!("telegram transport polling for updates");

        loop {
            if tx.is_closed() {
                return Ok(());
            }
            let updates = match self.get_updates(offset).await {
                Ok(updates) => updates,
                Err(error) => {
                    warn!(%error, "telegram poll failed; retrying");
                    tokio::time::sleep(self.retry_delay).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                let Some(inbound) = inbound_from_update(update) else {
                    continue;
                };
                if tx.send(inbound).await.is_err() {
                    return Ok(());
                }
            }
        }
    }

    async fn send(&self, chat_id: i64, reply: &ReplyPayload) -> Result<(), TransportError> {
        let body = self.send_request(chat_id, reply);
        let _sent: serde_json::Value = self.call("sendMessage", &body).await?;
        Ok(())
    }
}

#[cfg(test)]
#[path = "tests/telegram_tests.rs"]
mod tests;
