//! Remote Chat Types
//!
//! Messages received from a chat platform and the errors adapters raise.

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::services::notification::NotifyError;
use crate::utils::error::AppError;

/// A text message received from a chat.
#[derive(Debug, Clone, PartialEq)]
pub struct IncomingMessage {
    pub chat_id: i64,
    pub user_id: i64,
    pub username: Option<String>,
    pub text: String,
    pub message_id: i64,
    pub timestamp: DateTime<Utc>,
}

/// What an incoming message asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Start,
    /// A bot command this assistant does not handle.
    Unknown(String),
    Question(String),
}

impl ChatCommand {
    /// `/start` and `/start@bot_name` are the same command.
    pub fn parse(text: &str) -> Self {
        let text = text.trim();
        let Some(command) = text.strip_prefix('/') else {
            return ChatCommand::Question(text.to_string());
        };
        let name = command
            .split_whitespace()
            .next()
            .unwrap_or_default()
            .split('@')
            .next()
            .unwrap_or_default();
        match name {
            "start" => ChatCommand::Start,
            other => ChatCommand::Unknown(other.to_string()),
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RemoteError {
    #[error("Failed to send message: {0}")]
    SendFailed(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl From<RemoteError> for NotifyError {
    fn from(err: RemoteError) -> Self {
        NotifyError::Delivery(err.to_string())
    }
}

impl From<RemoteError> for AppError {
    fn from(err: RemoteError) -> Self {
        AppError::telegram(err.to_string())
    }
}
