//! Telegram Adapter
//!
//! Telegram Bot adapter using teloxide for long-polling message reception,
//! with chat allow-listing and message splitting for Telegram's 4096
//! character limit.

use super::RemoteAdapter;
use crate::models::settings::TelegramSettings;
use crate::services::remote::types::{IncomingMessage, RemoteError};
use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Telegram Bot adapter using teloxide with long-polling.
pub struct TelegramAdapter {
    pub(crate) config: TelegramSettings,
    pub(crate) bot: teloxide::Bot,
    pub(crate) cancel_token: CancellationToken,
}

impl TelegramAdapter {
    pub fn new(config: TelegramSettings) -> Result<Self, RemoteError> {
        let bot_token = config
            .bot_token
            .as_ref()
            .filter(|t| !t.trim().is_empty())
            .ok_or_else(|| RemoteError::ConfigError("Bot token is required".to_string()))?;
        let bot = teloxide::Bot::new(bot_token);

        Ok(Self {
            config,
            bot,
            cancel_token: CancellationToken::new(),
        })
    }

    fn is_allowed(allowed_chat_ids: &[i64], chat_id: i64) -> bool {
        allowed_chat_ids.is_empty() || allowed_chat_ids.contains(&chat_id)
    }
}

/// Split long messages at line boundaries to respect platform limits.
///
/// Lengths are counted in characters; a line longer than `max_len` is cut
/// on character boundaries.
pub fn split_message(text: &str, max_len: usize) -> Vec<String> {
    let max_len = max_len.max(1);
    if text.chars().count() <= max_len {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in text.lines() {
        let line_len = line.chars().count();
        if current_len + line_len + 1 > max_len {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }
            if line_len > max_len {
                let chars: Vec<char> = line.chars().collect();
                for piece in chars.chunks(max_len) {
                    chunks.push(piece.iter().collect());
                }
                continue;
            }
        }
        if !current.is_empty() {
            current.push('\n');
            current_len += 1;
        }
        current.push_str(line);
        current_len += line_len;
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

#[async_trait]
impl RemoteAdapter for TelegramAdapter {
    async fn start(&self, message_tx: mpsc::Sender<IncomingMessage>) -> Result<(), RemoteError> {
        use teloxide::dispatching::{Dispatcher, UpdateFilterExt};
        use teloxide::types::{Message, Update};

        let bot = self.bot.clone();
        let allowed_chat_ids = self.config.allowed_chat_ids.clone();
        let cancel = self.cancel_token.clone();

        tokio::spawn(async move {
            let handler =
                Update::filter_message().endpoint(move |msg: Message, _bot: teloxide::Bot| {
                    let tx = message_tx.clone();
                    let allowed_chats = allowed_chat_ids.clone();
                    async move {
                        let chat_id = msg.chat.id.0;
                        if !Self::is_allowed(&allowed_chats, chat_id) {
                            tracing::debug!(chat_id, "ignoring message from chat not on the allow-list");
                            return Ok::<(), Box<dyn std::error::Error + Send + Sync>>(());
                        }

                        if let Some(text) = msg.text() {
                            let incoming = IncomingMessage {
                                chat_id,
                                user_id: msg.from.as_ref().map(|u| u.id.0 as i64).unwrap_or(0),
                                username: msg.from.as_ref().and_then(|u| u.username.clone()),
                                text: text.to_string(),
                                message_id: msg.id.0 as i64,
                                timestamp: chrono::Utc::now(),
                            };
                            if tx.send(incoming).await.is_err() {
                                tracing::warn!(chat_id, "gateway is gone, dropping message");
                            }
                        }
                        Ok(())
                    }
                });

            let mut dispatcher = Dispatcher::builder(bot, handler)
                .enable_ctrlc_handler()
                .build();

            let shutdown_token = dispatcher.shutdown_token();
            let cancel_clone = cancel.clone();
            tokio::spawn(async move {
                cancel_clone.cancelled().await;
                let _ = shutdown_token.shutdown();
            });

            tracing::info!("telegram long polling started");
            dispatcher.dispatch().await;
            tracing::info!("telegram long polling stopped");
        });

        Ok(())
    }

    async fn stop(&self) -> Result<(), RemoteError> {
        self.cancel_token.cancel();
        Ok(())
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64, RemoteError> {
        use teloxide::prelude::*;
        use teloxide::types::ChatId;

        let sent = self
            .bot
            .send_message(ChatId(chat_id), text)
            .await
            .map_err(|e| RemoteError::SendFailed(e.to_string()))?;
        Ok(sent.id.0 as i64)
    }

    async fn send_answer(&self, chat_id: i64, text: &str) -> Result<(), RemoteError> {
        use teloxide::prelude::*;
        use teloxide::types::{ChatId, ParseMode};

        for chunk in split_message(text, self.config.max_message_length) {
            // Model answers use legacy Markdown, which needs no escaping.
            #[allow(deprecated)]
            let formatted = self
                .bot
                .send_message(ChatId(chat_id), &chunk)
                .parse_mode(ParseMode::Markdown)
                .await;
            if let Err(e) = formatted {
                tracing::debug!(chat_id, error = %e, "markdown rejected, resending as plain text");
                self.bot
                    .send_message(ChatId(chat_id), &chunk)
                    .await
                    .map_err(|e| RemoteError::SendFailed(e.to_string()))?;
            }
        }
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), RemoteError> {
        use teloxide::prelude::*;
        use teloxide::types::{ChatId, MessageId};

        self.bot
            .delete_message(ChatId(chat_id), MessageId(message_id as i32))
            .await
            .map_err(|e| RemoteError::SendFailed(e.to_string()))?;
        Ok(())
    }

    async fn send_typing(&self, chat_id: i64) -> Result<(), RemoteError> {
        use teloxide::prelude::*;
        use teloxide::types::{ChatAction, ChatId};

        self.bot
            .send_chat_action(ChatId(chat_id), ChatAction::Typing)
            .await
            .map_err(|e| RemoteError::SendFailed(e.to_string()))?;
        Ok(())
    }

    async fn health_check(&self) -> Result<(), RemoteError> {
        use teloxide::prelude::*;

        self.bot
            .get_me()
            .await
            .map_err(|e| RemoteError::ConfigError(format!("Bot health check failed: {}", e)))?;
        Ok(())
    }
}
