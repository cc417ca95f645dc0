//! Summarizer
//!
//! Turns the final scope of a run into the answer shown to the user.

use std::sync::Arc;

use async_trait::async_trait;
use contract_guard_core::Scope;
use contract_guard_llm::{LlmProvider, LlmRequestOptions, Message, ToolCallMode};

use super::prompts::{render, SUMMARY_TEMPLATE};
use crate::utils::error::{AppError, AppResult};

#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, query: &str, scope: &Scope) -> AppResult<String>;
}

/// Summarizer backed by a chat model.
pub struct LlmSummarizer {
    provider: Arc<dyn LlmProvider>,
}

impl LlmSummarizer {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl Summarizer for LlmSummarizer {
    async fn summarize(&self, query: &str, scope: &Scope) -> AppResult<String> {
        let context = scope.to_context_json()?;
        tracing::debug!(context_bytes = context.len(), "summarizing scope");
        let prompt = render(SUMMARY_TEMPLATE, &[("context", context.as_str()), ("input", query)]);

        let response = self
            .provider
            .send_message(
                vec![Message::user(prompt)],
                None,
                vec![],
                LlmRequestOptions::default().with_tool_call_mode(ToolCallMode::None),
            )
            .await?;

        response
            .content
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .ok_or_else(|| AppError::internal("language model returned an empty answer"))
    }
}
