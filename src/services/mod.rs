//! Services
//!
//! Business logic behind the assistant: check catalog and selection, the
//! analysis engine, the orchestration loop, and the chat transport.

pub mod catalog;
pub mod checks;
pub mod embedding;
pub mod engine;
pub mod notification;
pub mod orchestrator;
pub mod remote;

pub use catalog::CheckCatalog;
pub use checks::{CheckRunner, CheckSelector, Selection};
pub use notification::{NotificationQueue, Notifier};
pub use orchestrator::{Assistant, OrchestratorService, SecurityAssistant};
pub use remote::{RemoteGateway, TelegramAdapter};
