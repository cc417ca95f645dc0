//! Orchestrator
//!
//! The bounded tool loop behind every answer: a decision step picks a tool,
//! the dispatcher runs it, the scope accumulates results, and a summarizer
//! turns the final scope into a reply.

pub mod assistant;
pub mod decision;
pub mod dispatcher;
pub mod prompts;
mod service;
pub mod summarizer;

pub use assistant::{Assistant, SecurityAssistant};
pub use decision::{DecisionStep, LlmDecisionStep};
pub use dispatcher::ToolDispatcher;
pub use service::{OrchestratorService, RunOutcome, StopReason, MAX_ROUNDS};
pub use summarizer::{LlmSummarizer, Summarizer};
