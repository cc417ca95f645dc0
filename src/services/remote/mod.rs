//! Remote Chat
//!
//! Serves the assistant over a messaging platform. Currently Telegram.
//!
//! ```text
//! Telegram → RemoteAdapter → mpsc → RemoteGateway → Assistant
//!                                        ↓
//!                          NotificationQueue → ChatNotifier → RemoteAdapter
//! ```

pub mod adapters;
pub mod gateway;
pub mod types;

pub use adapters::telegram::TelegramAdapter;
pub use adapters::RemoteAdapter;
pub use gateway::{ChatNotifier, RemoteGateway};
pub use types::{ChatCommand, IncomingMessage, RemoteError};
