//! Contract Guard LLM
//!
//! Provides the provider interface used by the decision, refinement and
//! summarization steps, together with the OpenAI chat completions provider
//! and the HTTP client factory.

pub mod http_client;
pub mod openai;
pub mod provider;
pub mod types;

// Re-export main types
pub use http_client::build_http_client;
pub use openai::OpenAIProvider;
pub use provider::LlmProvider;
pub use types::*;
