//! Security Assistant
//!
//! One question in, one answer out: run the tool loop, then summarize what it
//! gathered.

use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::service::OrchestratorService;
use super::summarizer::Summarizer;
use crate::services::notification::NotificationQueue;
use crate::utils::error::AppResult;

/// Answers chat questions.
#[async_trait]
pub trait Assistant: Send + Sync {
    async fn answer(&self, query: &str, notifications: Option<&NotificationQueue>) -> AppResult<String>;
}

pub struct SecurityAssistant {
    orchestrator: Arc<OrchestratorService>,
    summarizer: Arc<dyn Summarizer>,
    shutdown: CancellationToken,
}

impl SecurityAssistant {
    pub fn new(orchestrator: Arc<OrchestratorService>, summarizer: Arc<dyn Summarizer>) -> Self {
        Self {
            orchestrator,
            summarizer,
            shutdown: CancellationToken::new(),
        }
    }

    /// Cancelling this token stops every run in flight.
    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }
}

#[async_trait]
impl Assistant for SecurityAssistant {
    async fn answer(&self, query: &str, notifications: Option<&NotificationQueue>) -> AppResult<String> {
        let outcome = self
            .orchestrator
            .run(query, notifications, self.shutdown.child_token())
            .await?;
        tracing::debug!(
            run_id = %outcome.run_id,
            rounds = outcome.rounds,
            elapsed_ms = (chrono::Utc::now() - outcome.started_at).num_milliseconds(),
            "summarizing run"
        );
        self.summarizer.summarize(query, &outcome.scope).await
    }
}
