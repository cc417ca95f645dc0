//! Tool Dispatcher
//!
//! Executes one tool invocation against a run's model cache.

use std::sync::Arc;

use contract_guard_core::{ToolInvocation, ToolResult};

use crate::services::checks::{
    run_mint_check, run_unprotected_func, CheckRunner, CheckSelector, Selection,
};
use crate::services::engine::ModelCache;
use crate::utils::error::AppResult;

pub struct ToolDispatcher {
    selector: Arc<CheckSelector>,
    runner: Arc<CheckRunner>,
}

impl ToolDispatcher {
    pub fn new(selector: Arc<CheckSelector>, runner: Arc<CheckRunner>) -> Self {
        Self { selector, runner }
    }

    /// Run `invocation`. `query` is the user question, used for check
    /// selection when the invocation carries no query of its own.
    pub async fn dispatch(
        &self,
        invocation: &ToolInvocation,
        query: &str,
        cache: &mut ModelCache,
    ) -> AppResult<ToolResult> {
        match invocation {
            ToolInvocation::DetectorsCheck {
                address,
                query: tool_query,
            } => {
                let query = tool_query.as_deref().unwrap_or(query);
                match self.selector.select(address.as_deref(), query).await {
                    Selection::NoTarget => Ok(ToolResult::empty_detectors()),
                    Selection::Checks { address, ids } => {
                        self.runner.run(cache, &address, &ids).await
                    }
                }
            }
            ToolInvocation::MintCheck { address } => {
                Ok(run_mint_check(cache, address.as_deref()).await)
            }
            ToolInvocation::UnprotectedFunc { address } => {
                Ok(run_unprotected_func(cache, address.as_deref()).await)
            }
            ToolInvocation::Skip => Ok(ToolResult::Skip),
        }
    }
}
