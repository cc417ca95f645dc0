//! Decision Step
//!
//! Picks the next tool for a run. The allowed tool kinds are passed on every
//! call; the language-model implementation only advertises those tools.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use contract_guard_core::{CoreError, Scope, ToolInvocation, ToolKind};
use contract_guard_llm::{
    LlmProvider, LlmRequestOptions, Message, ParameterSchema, ToolCallMode, ToolDefinition,
};

use super::prompts::{self, render};
use crate::utils::error::AppResult;

/// Chooses at most one tool invocation per round.
#[async_trait]
pub trait DecisionStep: Send + Sync {
    /// `context` is the scope accumulated so far; it is `None` on the first round.
    async fn select(
        &self,
        query: &str,
        allowed: &[ToolKind],
        context: Option<&Scope>,
    ) -> AppResult<Option<ToolInvocation>>;
}

/// Function definition advertised to the model for `kind`.
pub fn tool_definition(kind: ToolKind) -> ToolDefinition {
    let address = || ParameterSchema::string(Some(prompts::ADDRESS_PARAM_DESCRIPTION));
    let (description, properties, required) = match kind {
        ToolKind::DetectorsCheck => (
            prompts::DETECTORS_CHECK_DESCRIPTION,
            HashMap::from([
                ("address".to_string(), address()),
                (
                    "query".to_string(),
                    ParameterSchema::string(Some(prompts::QUERY_PARAM_DESCRIPTION)),
                ),
            ]),
            vec!["address".to_string()],
        ),
        ToolKind::MintCheck => (
            prompts::MINT_CHECK_DESCRIPTION,
            HashMap::from([("address".to_string(), address())]),
            vec!["address".to_string()],
        ),
        ToolKind::UnprotectedFunc => (
            prompts::UNPROTECTED_FUNC_DESCRIPTION,
            HashMap::from([("address".to_string(), address())]),
            vec!["address".to_string()],
        ),
        ToolKind::Skip => (prompts::SKIP_DESCRIPTION, HashMap::new(), Vec::new()),
    };

    ToolDefinition {
        name: kind.name().to_string(),
        description: description.to_string(),
        input_schema: ParameterSchema::object(None, properties, required),
    }
}

/// Decision step backed by a tool-calling chat model.
pub struct LlmDecisionStep {
    provider: Arc<dyn LlmProvider>,
}

impl LlmDecisionStep {
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl DecisionStep for LlmDecisionStep {
    async fn select(
        &self,
        query: &str,
        allowed: &[ToolKind],
        context: Option<&Scope>,
    ) -> AppResult<Option<ToolInvocation>> {
        let mut messages = vec![Message::user(query)];
        if let Some(scope) = context {
            let json = scope.to_context_json()?;
            tracing::debug!(context_bytes = json.len(), "passing accumulated scope to decision step");
            messages.push(Message::user(render(
                prompts::FOLLOW_UP_TEMPLATE,
                &[("context", json.as_str())],
            )));
        }

        let tools: Vec<ToolDefinition> = allowed.iter().copied().map(tool_definition).collect();
        let options = LlmRequestOptions::default()
            .with_tool_call_mode(ToolCallMode::Auto)
            .with_temperature(0.0);

        let response = self
            .provider
            .send_message(
                messages,
                Some(prompts::DECISION_SYSTEM_PROMPT.to_string()),
                tools,
                options,
            )
            .await?;

        let Some(call) = response.tool_calls.first() else {
            tracing::debug!("decision step made no tool call");
            return Ok(None);
        };
        if response.tool_calls.len() > 1 {
            tracing::debug!(
                calls = response.tool_calls.len(),
                "decision step returned several tool calls, using the first"
            );
        }

        match ToolInvocation::from_call(&call.name, &call.arguments) {
            Ok(invocation) => Ok(Some(invocation)),
            Err(CoreError::UnknownTool(name)) => {
                tracing::warn!(tool = %name, "decision step called an unknown tool");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }
}
