//! Remote Gateway
//!
//! Drives one chat adapter: receives messages, answers questions through the
//! assistant, and streams progress notifications back into the same chat.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::adapters::RemoteAdapter;
use super::types::{ChatCommand, IncomingMessage, RemoteError};
use crate::services::notification::{NotificationQueue, Notifier, NotifyError};
use crate::services::orchestrator::Assistant;

pub const GREETING: &str = "Hello! I am a language model. Ask me anything!";
/// Sent right away and deleted once the answer is out.
pub const PLACEHOLDER: &str = "🤖";
pub const APOLOGY: &str = "Sorry, something went wrong while answering. Please try again later.";

/// Delivers progress notifications into one chat.
pub struct ChatNotifier {
    adapter: Arc<dyn RemoteAdapter>,
    chat_id: i64,
}

impl ChatNotifier {
    pub fn new(adapter: Arc<dyn RemoteAdapter>, chat_id: i64) -> Self {
        Self { adapter, chat_id }
    }
}

#[async_trait]
impl Notifier for ChatNotifier {
    async fn notify(&self, text: &str) -> Result<(), NotifyError> {
        self.adapter.send_message(self.chat_id, text).await?;
        Ok(())
    }
}

pub struct RemoteGateway {
    adapter: Arc<dyn RemoteAdapter>,
    assistant: Arc<dyn Assistant>,
    cancel_token: CancellationToken,
}

impl RemoteGateway {
    pub fn new(adapter: Arc<dyn RemoteAdapter>, assistant: Arc<dyn Assistant>) -> Self {
        Self {
            adapter,
            assistant,
            cancel_token: CancellationToken::new(),
        }
    }

    /// Cancelling this token stops [`RemoteGateway::run`].
    pub fn cancel_token(&self) -> CancellationToken {
        self.cancel_token.clone()
    }

    /// Receive and answer messages until cancelled or the adapter hangs up.
    ///
    /// Each message is handled on its own task, so a slow analysis never
    /// blocks other chats.
    pub async fn run(&self) -> Result<(), RemoteError> {
        let (tx, mut rx) = mpsc::channel::<IncomingMessage>(100);
        self.adapter.start(tx).await?;
        tracing::info!("remote gateway started");

        loop {
            tokio::select! {
                msg = rx.recv() => {
                    let Some(msg) = msg else {
                        tracing::info!("adapter closed its message channel");
                        break;
                    };
                    let adapter = self.adapter.clone();
                    let assistant = self.assistant.clone();
                    tokio::spawn(async move {
                        Self::handle_message(adapter, assistant, msg).await;
                    });
                }
                _ = self.cancel_token.cancelled() => break,
            }
        }

        self.adapter.stop().await?;
        tracing::info!("remote gateway stopped");
        Ok(())
    }

    pub(crate) async fn handle_message(
        adapter: Arc<dyn RemoteAdapter>,
        assistant: Arc<dyn Assistant>,
        msg: IncomingMessage,
    ) {
        let chat_id = msg.chat_id;
        match ChatCommand::parse(&msg.text) {
            ChatCommand::Start => {
                if let Err(e) = adapter.send_message(chat_id, GREETING).await {
                    tracing::warn!(chat_id, error = %e, "failed to send greeting");
                }
            }
            ChatCommand::Unknown(command) => {
                tracing::debug!(chat_id, command = %command, "ignoring unsupported command");
            }
            ChatCommand::Question(question) if question.is_empty() => {}
            ChatCommand::Question(question) => {
                tracing::info!(
                    chat_id,
                    user_id = msg.user_id,
                    username = msg.username.as_deref().unwrap_or("-"),
                    "question received"
                );
                Self::answer_question(adapter, assistant, chat_id, &question).await;
            }
        }
    }

    async fn answer_question(
        adapter: Arc<dyn RemoteAdapter>,
        assistant: Arc<dyn Assistant>,
        chat_id: i64,
        question: &str,
    ) {
        let placeholder = match adapter.send_message(chat_id, PLACEHOLDER).await {
            Ok(id) => Some(id),
            Err(e) => {
                tracing::warn!(chat_id, error = %e, "failed to send placeholder");
                None
            }
        };
        if let Err(e) = adapter.send_typing(chat_id).await {
            tracing::debug!(chat_id, error = %e, "failed to send typing action");
        }

        let queue = NotificationQueue::spawn(Arc::new(ChatNotifier::new(adapter.clone(), chat_id)));
        let result = assistant.answer(question, Some(&queue)).await;
        let delivered = queue.close().await;
        tracing::debug!(chat_id, delivered, "progress notifications flushed");

        let reply = match result {
            Ok(answer) => answer,
            Err(e) => {
                tracing::error!(chat_id, error = %e, "failed to answer question");
                APOLOGY.to_string()
            }
        };
        if let Err(e) = adapter.send_answer(chat_id, &reply).await {
            tracing::warn!(chat_id, error = %e, "failed to send answer");
        }

        if let Some(message_id) = placeholder {
            if let Err(e) = adapter.delete_message(chat_id, message_id).await {
                tracing::debug!(chat_id, error = %e, "failed to delete placeholder");
            }
        }
    }
}
