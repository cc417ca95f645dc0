//! Error Handling
//!
//! Unified error types for the application.
//! Uses thiserror for ergonomic error definitions.

use contract_guard_core::CoreError;
use contract_guard_llm::LlmError;
use thiserror::Error;

use crate::services::embedding::EmbeddingError;
use crate::services::engine::EngineError;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Core model errors (tool parsing, serialization of the scope)
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Language-model provider errors
    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    /// Embedding provider or vector index errors
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    /// Analysis engine errors
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// The engine returned a different number of result slots than checks requested
    #[error("Engine returned {actual} result slots for {expected} requested checks")]
    EngineMisaligned { expected: usize, actual: usize },

    /// The check catalog names checks the engine does not accept
    #[error("Catalog lists checks unknown to the engine: {}", .unknown.join(", "))]
    CatalogMismatch { unknown: Vec<String> },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// File I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// Chat transport errors
    #[error("Telegram error: {0}")]
    Telegram(String),

    /// Generic internal errors
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias for application errors
pub type AppResult<T> = Result<T, AppError>;

impl AppError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a telegram error
    pub fn telegram(msg: impl Into<String>) -> Self {
        Self::Telegram(msg.into())
    }

    /// Create an internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Whether this error aborts the current orchestration round only.
    ///
    /// Everything else raised while executing a tool ends the run.
    pub fn is_round_abort(&self) -> bool {
        matches!(self, AppError::EngineMisaligned { .. })
    }
}
