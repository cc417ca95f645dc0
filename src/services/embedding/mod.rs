//! Embedding Provider Abstraction
//!
//! Defines the async [`EmbeddingProvider`] trait used to vectorize the check
//! catalog and incoming queries, with a local TF-IDF backend and the OpenAI
//! embeddings API, and the flat cosine [`VectorIndex`] built on top of them.

pub mod index;
pub mod openai;
pub mod tfidf;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::models::settings::{EmbeddingSettings, LlmSettings};

pub use index::{ScoredDocument, VectorIndex};
pub use openai::OpenAIEmbeddingProvider;
pub use tfidf::TfIdfEmbeddingProvider;

/// Errors that can occur during embedding operations.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbeddingError {
    /// Authentication failed (invalid or missing API key).
    #[error("authentication failed: {0}")]
    AuthenticationFailed(String),

    /// A network or connection error occurred.
    #[error("network error: {0}")]
    Network(String),

    /// The provider returned an HTTP error.
    #[error("server error (HTTP {status}): {message}")]
    Server { status: u16, message: String },

    /// The provider returned an unexpected or unparseable response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Vectors of different dimension were mixed in one index.
    #[error("dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    /// Configuration is invalid or incomplete.
    #[error("invalid config: {0}")]
    InvalidConfig(String),
}

/// Convenience alias for embedding operation results.
pub type EmbeddingResult<T> = Result<T, EmbeddingError>;

/// A backend that turns text into dense vectors.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Short provider name for logs.
    fn name(&self) -> &'static str;

    /// Embed a corpus; one vector per document, in input order.
    async fn embed_documents(&self, documents: &[String]) -> EmbeddingResult<Vec<Vec<f32>>>;

    /// Embed a single query.
    async fn embed_query(&self, query: &str) -> EmbeddingResult<Vec<f32>>;
}

/// Build the provider named in the settings.
pub fn provider_from_settings(
    embedding: &EmbeddingSettings,
    llm: &LlmSettings,
) -> EmbeddingResult<Arc<dyn EmbeddingProvider>> {
    match embedding.provider.as_str() {
        "tfidf" => Ok(Arc::new(TfIdfEmbeddingProvider::new())),
        "openai" => {
            let api_key = llm
                .api_key
                .clone()
                .filter(|k| !k.is_empty())
                .ok_or_else(|| {
                    EmbeddingError::InvalidConfig(
                        "OpenAI embeddings require OPENAI_API_KEY".to_string(),
                    )
                })?;
            Ok(Arc::new(OpenAIEmbeddingProvider::new(
                api_key,
                embedding.model.clone(),
                embedding.base_url.clone(),
                embedding.batch_size,
                llm.timeout_secs,
            )?))
        }
        other => Err(EmbeddingError::InvalidConfig(format!(
            "unknown embedding provider: {}",
            other
        ))),
    }
}

/// Compute the cosine similarity between two vectors.
///
/// Returns 0.0 when the lengths differ or either vector has zero magnitude.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f32;
    let mut mag_a = 0.0f32;
    let mut mag_b = 0.0f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot += x * y;
        mag_a += x * x;
        mag_b += y * y;
    }

    let denom = mag_a.sqrt() * mag_b.sqrt();
    if denom == 0.0 {
        0.0
    } else {
        dot / denom
    }
}
