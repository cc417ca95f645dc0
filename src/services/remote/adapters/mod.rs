//! Remote Adapters
//!
//! Platform-specific message receiving and sending.

pub mod telegram;

use async_trait::async_trait;
use tokio::sync::mpsc;

use super::types::{IncomingMessage, RemoteError};

/// Remote adapter trait for platform-specific message handling.
#[async_trait]
pub trait RemoteAdapter: Send + Sync {
    /// Start receiving messages; each one is forwarded on `message_tx`.
    ///
    /// The adapter spawns its own task for the receive loop.
    async fn start(&self, message_tx: mpsc::Sender<IncomingMessage>) -> Result<(), RemoteError>;

    /// Stop receiving messages.
    async fn stop(&self) -> Result<(), RemoteError>;

    /// Send plain text and return the id of the sent message.
    async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64, RemoteError>;

    /// Send a formatted answer, split to the platform's length limit.
    ///
    /// Falls back to plain text when the platform rejects the formatting.
    async fn send_answer(&self, chat_id: i64, text: &str) -> Result<(), RemoteError>;

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), RemoteError>;

    /// Show a typing indicator.
    async fn send_typing(&self, chat_id: i64) -> Result<(), RemoteError>;

    /// Check platform connectivity and credentials.
    async fn health_check(&self) -> Result<(), RemoteError>;
}
