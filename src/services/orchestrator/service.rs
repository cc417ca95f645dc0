//! Orchestrator Service
//!
//! Runs the bounded tool loop for one question: ask the decision step for a
//! tool, execute it, fold the result into the run's [`Scope`], repeat. The
//! first round may only triage (run detectors or skip); later rounds may also
//! run the point checks. A run ends on a skip, when the decision step makes
//! no valid choice, after [`MAX_ROUNDS`] rounds, or on cancellation/timeout.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use contract_guard_core::{Scope, ToolKind, ToolResult};
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use super::decision::DecisionStep;
use super::dispatcher::ToolDispatcher;
use crate::services::engine::{AnalysisEngine, ModelCache};
use crate::services::notification::{announcement, NotificationQueue};
use crate::utils::error::{AppError, AppResult};

/// Hard cap on rounds per run.
pub const MAX_ROUNDS: u32 = 3;

/// Why a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The decision step chose to skip further checks.
    Skipped,
    /// [`MAX_ROUNDS`] rounds were played.
    RoundCap,
    /// The decision step chose nothing usable.
    NoDecision,
    Cancelled,
    TimedOut,
}

/// Result of one run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_id: String,
    pub started_at: DateTime<Utc>,
    pub scope: Scope,
    /// Rounds played, including aborted ones and the final skip.
    pub rounds: u32,
    pub stop_reason: StopReason,
}

enum RoundOutcome {
    NoDecision,
    Disallowed(ToolKind),
    Executed(ToolResult),
    Aborted(AppError),
}

pub struct OrchestratorService {
    decision: Arc<dyn DecisionStep>,
    dispatcher: Arc<ToolDispatcher>,
    engine: Arc<dyn AnalysisEngine>,
    run_timeout: Option<Duration>,
}

impl OrchestratorService {
    pub fn new(
        decision: Arc<dyn DecisionStep>,
        dispatcher: Arc<ToolDispatcher>,
        engine: Arc<dyn AnalysisEngine>,
    ) -> Self {
        Self {
            decision,
            dispatcher,
            engine,
            run_timeout: None,
        }
    }

    /// Bound every run by wall-clock time. A zero duration disables the bound.
    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = (!timeout.is_zero()).then_some(timeout);
        self
    }

    /// Run the loop for `query`.
    ///
    /// First-time merges of each result kind are announced on
    /// `notifications`. On cancellation or timeout the scope holds every
    /// round that completed before it; a round in flight is discarded. Only
    /// a failing decision step is an error.
    pub async fn run(
        &self,
        query: &str,
        notifications: Option<&NotificationQueue>,
        cancel: CancellationToken,
    ) -> AppResult<RunOutcome> {
        let run_id = uuid::Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let deadline = self.run_timeout.map(|t| Instant::now() + t);
        tracing::info!(run_id = %run_id, query_len = query.len(), "orchestration run started");

        let mut scope = Scope::new();
        let mut cache = ModelCache::new(self.engine.clone());
        let mut rounds = 0u32;

        let stop_reason = loop {
            if rounds >= MAX_ROUNDS {
                break StopReason::RoundCap;
            }
            let allowed: &[ToolKind] = if rounds == 0 {
                &ToolKind::TRIAGE
            } else {
                &ToolKind::ALL
            };
            let context = (rounds > 0).then_some(&scope);

            let outcome = tokio::select! {
                biased;
                _ = cancel.cancelled() => break StopReason::Cancelled,
                _ = deadline_elapsed(deadline) => break StopReason::TimedOut,
                outcome = self.play_round(query, allowed, context, &mut cache) => outcome?,
            };
            let result = match outcome {
                RoundOutcome::NoDecision => break StopReason::NoDecision,
                RoundOutcome::Disallowed(kind) => {
                    tracing::warn!(run_id = %run_id, round = rounds + 1, tool = %kind, "tool not allowed this round");
                    break StopReason::NoDecision;
                }
                RoundOutcome::Aborted(e) => {
                    rounds += 1;
                    tracing::error!(run_id = %run_id, round = rounds, error = %e, "round aborted");
                    continue;
                }
                RoundOutcome::Executed(result) => result,
            };
            rounds += 1;

            if result.is_skip() {
                break StopReason::Skipped;
            }
            tracing::debug!(run_id = %run_id, round = rounds, tool = %result.kind(), "merging tool result");
            let Some(event) = scope.merge(result) else {
                continue;
            };
            if let (Some(queue), Some(text)) = (notifications, announcement(event, &scope)) {
                queue.push(text);
            }
        };

        tracing::info!(
            run_id = %run_id,
            rounds,
            stop_reason = ?stop_reason,
            findings = scope.detectors_checks().len(),
            issues = scope.issue_count(),
            "orchestration run finished"
        );

        Ok(RunOutcome {
            run_id,
            started_at,
            scope,
            rounds,
            stop_reason,
        })
    }

    async fn play_round(
        &self,
        query: &str,
        allowed: &[ToolKind],
        context: Option<&Scope>,
        cache: &mut ModelCache,
    ) -> AppResult<RoundOutcome> {
        let Some(invocation) = self.decision.select(query, allowed, context).await? else {
            return Ok(RoundOutcome::NoDecision);
        };
        let kind = invocation.kind();
        if !allowed.contains(&kind) {
            return Ok(RoundOutcome::Disallowed(kind));
        }

        match self.dispatcher.dispatch(&invocation, query, cache).await {
            Ok(result) => Ok(RoundOutcome::Executed(result)),
            Err(e) if e.is_round_abort() => Ok(RoundOutcome::Aborted(e)),
            Err(e) => Err(e),
        }
    }
}

async fn deadline_elapsed(deadline: Option<Instant>) {
    match deadline {
        Some(deadline) => tokio::time::sleep_until(deadline).await,
        None => std::future::pending().await,
    }
}
