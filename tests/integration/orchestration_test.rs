//! Full runs of the tool loop over the real selector, runner and point checks.

use std::sync::Arc;
use std::time::Duration;

use contract_guard::services::checks::point_checks::{ALL_GOOD, SKIPPED_NO_ADDRESS};
use contract_guard::services::notification::NotificationQueue;
use contract_guard::services::orchestrator::{StopReason, MAX_ROUNDS};
use contract_guard_core::{ToolInvocation, ToolKind};
use tokio_util::sync::CancellationToken;

use crate::support::*;

const QUERY: &str = "Is there a reentrancy problem when withdrawing ether?";

#[tokio::test]
async fn test_three_rounds_then_cap() {
    let decision = ScriptedDecision::new(vec![
        detectors(TOKEN, None),
        mint(TOKEN),
        unprotected(TOKEN),
        detectors(TOKEN, None),
    ]);
    let engine = Arc::new(FixtureEngine::new());
    let service = orchestrator(decision.clone(), engine.clone());

    let outcome = service.run(QUERY, None, CancellationToken::new()).await.unwrap();

    assert_eq!(outcome.stop_reason, StopReason::RoundCap);
    assert_eq!(outcome.rounds, MAX_ROUNDS);
    assert_eq!(decision.call_count(), 3);

    let scope = &outcome.scope;
    assert!(!scope.detectors_checks().is_empty());
    assert_eq!(scope.source_code(), Some(TOKEN_SOURCE));
    assert_eq!(
        scope.mint_check(),
        Some("Check result -> Error: Token overrides the _mint function")
    );
    assert_eq!(
        scope.unprotected_func(),
        Some("Check result -> Error: setFee(uint256) is unprotected")
    );
    // One load serves all three rounds.
    assert_eq!(engine.load_count(), 1);
}

#[tokio::test]
async fn test_first_round_triage_then_full_toolset() {
    let decision = ScriptedDecision::new(vec![detectors(TOKEN, None), mint(TOKEN)]);
    let engine = Arc::new(FixtureEngine::new());
    let service = orchestrator(decision.clone(), engine);

    let outcome = service.run(QUERY, None, CancellationToken::new()).await.unwrap();
    assert_eq!(outcome.stop_reason, StopReason::NoDecision);
    assert_eq!(outcome.rounds, 2);

    let calls = decision.calls.lock().unwrap();
    assert_eq!(calls[0].0, ToolKind::TRIAGE.to_vec());
    assert!(calls[0].1.is_none());
    assert_eq!(calls[1].0, ToolKind::ALL.to_vec());
    let context = calls[1].1.as_ref().unwrap();
    assert!(context.has_observed(ToolKind::DetectorsCheck));
    assert!(!context.has_observed(ToolKind::MintCheck));
}

#[tokio::test]
async fn test_skip_stops_early() {
    let decision = ScriptedDecision::new(vec![
        detectors(TOKEN, None),
        Some(ToolInvocation::Skip),
        mint(TOKEN),
    ]);
    let engine = Arc::new(FixtureEngine::new());
    let service = orchestrator(decision.clone(), engine);

    let outcome = service.run(QUERY, None, CancellationToken::new()).await.unwrap();
    assert_eq!(outcome.stop_reason, StopReason::Skipped);
    assert_eq!(outcome.rounds, 2);
    assert_eq!(decision.call_count(), 2);
    assert!(outcome.scope.mint_check().is_none());
}

#[tokio::test]
async fn test_immediate_skip_leaves_empty_scope() {
    let decision = ScriptedDecision::new(vec![Some(ToolInvocation::Skip)]);
    let engine = Arc::new(FixtureEngine::new());
    let service = orchestrator(decision, engine.clone());

    let outcome = service.run("gm", None, CancellationToken::new()).await.unwrap();
    assert_eq!(outcome.stop_reason, StopReason::Skipped);
    assert_eq!(outcome.rounds, 1);
    assert!(outcome.scope.is_empty());
    assert_eq!(engine.load_count(), 0);
}

#[tokio::test]
async fn test_selected_checks_come_from_catalog() {
    let decision = ScriptedDecision::new(vec![detectors(TOKEN, None)]);
    let engine = Arc::new(FixtureEngine::new());
    let service = orchestrator(decision, engine.clone());

    let outcome = service.run(QUERY, None, CancellationToken::new()).await.unwrap();

    let requested = engine.requested();
    assert_eq!(requested.len(), 1);
    let ids = &requested[0];
    assert!(!ids.is_empty());
    assert!(ids.len() <= 5);
    let catalog = catalog();
    assert!(ids.iter().all(|id| catalog.contains(id)));
    assert!(ids.iter().any(|id| id.starts_with("reentrancy")));

    let flagged = ids.iter().filter(|id| id.contains("reentrancy")).count();
    assert_eq!(outcome.scope.issue_count(), flagged);
    assert_eq!(outcome.scope.detectors_checks().len(), ids.len());
    for finding in outcome.scope.detectors_checks() {
        assert_eq!(finding.check_info.argument, finding.check_id);
    }
}

#[tokio::test]
async fn test_repeated_detectors_append_and_keep_first_source() {
    let decision = ScriptedDecision::new(vec![
        detectors(TOKEN, None),
        detectors(OTHER_TOKEN, Some("reentrancy")),
        Some(ToolInvocation::Skip),
    ]);
    let engine = Arc::new(FixtureEngine::new());
    let service = orchestrator(decision, engine.clone());

    let outcome = service.run(QUERY, None, CancellationToken::new()).await.unwrap();

    let requested = engine.requested();
    assert_eq!(requested.len(), 2);
    let total: usize = requested.iter().map(Vec::len).sum();
    assert_eq!(outcome.scope.detectors_checks().len(), total);
    assert_eq!(outcome.scope.source_code(), Some(TOKEN_SOURCE));
    assert_eq!(engine.load_count(), 2);
}

#[tokio::test]
async fn test_point_checks_last_writer_wins() {
    let decision = ScriptedDecision::new(vec![
        detectors(TOKEN, None),
        unprotected(TOKEN),
        unprotected(OTHER_TOKEN),
    ]);
    let engine = Arc::new(FixtureEngine::new());
    let service = orchestrator(decision, engine);

    let outcome = service.run(QUERY, None, CancellationToken::new()).await.unwrap();
    assert_eq!(outcome.scope.unprotected_func(), Some(ALL_GOOD));
}

#[tokio::test]
async fn test_placeholder_address_never_reaches_engine() {
    let decision = ScriptedDecision::new(vec![
        detectors(PLACEHOLDER, None),
        mint(PLACEHOLDER),
        Some(ToolInvocation::Skip),
    ]);
    let engine = Arc::new(FixtureEngine::new());
    let service = orchestrator(decision, engine.clone());

    let outcome = service.run("Is this token safe?", None, CancellationToken::new()).await.unwrap();

    assert_eq!(engine.load_count(), 0);
    assert!(engine.requested().is_empty());
    assert!(outcome.scope.detectors_checks().is_empty());
    assert!(outcome.scope.source_code().is_none());
    assert_eq!(outcome.scope.mint_check(), Some(SKIPPED_NO_ADDRESS));
}

#[tokio::test]
async fn test_unverified_contract_gives_empty_findings() {
    let unverified = "0x00000000219ab540356cbb839cbe05303d7705fa";
    let decision = ScriptedDecision::new(vec![detectors(unverified, None), Some(ToolInvocation::Skip)]);
    let engine = Arc::new(FixtureEngine::new());
    let service = orchestrator(decision, engine.clone());

    let outcome = service.run(QUERY, None, CancellationToken::new()).await.unwrap();
    assert_eq!(outcome.stop_reason, StopReason::Skipped);
    assert!(outcome.scope.detectors_checks().is_empty());
    assert!(outcome.scope.source_code().is_none());
    assert!(engine.requested().is_empty());
}

#[tokio::test]
async fn test_misaligned_engine_aborts_rounds() {
    let decision = ScriptedDecision::new(vec![
        detectors(TOKEN, None),
        detectors(TOKEN, None),
        mint(TOKEN),
    ]);
    let engine = Arc::new(FixtureEngine::misaligned());
    let service = orchestrator(decision, engine.clone());

    let outcome = service.run(QUERY, None, CancellationToken::new()).await.unwrap();

    assert_eq!(outcome.stop_reason, StopReason::RoundCap);
    assert_eq!(outcome.rounds, MAX_ROUNDS);
    assert!(outcome.scope.detectors_checks().is_empty());
    assert!(outcome.scope.source_code().is_none());
    assert!(outcome.scope.mint_check().is_some());
    assert_eq!(engine.requested().len(), 2);
}

#[tokio::test]
async fn test_each_kind_announced_once() {
    let decision = ScriptedDecision::new(vec![
        detectors(TOKEN, None),
        detectors(TOKEN, None),
        mint(TOKEN),
    ]);
    let engine = Arc::new(FixtureEngine::new());
    let service = orchestrator(decision, engine);
    let notifier = Arc::new(RecordingNotifier::default());
    let queue = NotificationQueue::spawn(notifier.clone());

    service
        .run(QUERY, Some(&queue), CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(queue.close().await, 2);

    let sent = notifier.sent();
    assert_eq!(sent.len(), 2);
    assert!(sent[0].starts_with("🔎 Ran "));
    assert_eq!(
        sent[1],
        "🪙 Mint check: Check result -> Error: Token overrides the _mint function"
    );
}

#[tokio::test]
async fn test_cancelled_run_keeps_nothing() {
    let decision = ScriptedDecision::new(vec![detectors(TOKEN, None)]);
    let engine = Arc::new(FixtureEngine::new());
    let service = orchestrator(decision.clone(), engine.clone());
    let cancel = CancellationToken::new();
    cancel.cancel();

    let outcome = service.run(QUERY, None, cancel).await.unwrap();
    assert_eq!(outcome.stop_reason, StopReason::Cancelled);
    assert_eq!(outcome.rounds, 0);
    assert!(outcome.scope.is_empty());
    assert_eq!(engine.load_count(), 0);
}

#[tokio::test]
async fn test_zero_timeout_disables_bound() {
    let decision = ScriptedDecision::new(vec![detectors(TOKEN, None), Some(ToolInvocation::Skip)]);
    let engine = Arc::new(FixtureEngine::new());
    let service = orchestrator(decision, engine).with_run_timeout(Duration::ZERO);

    let outcome = service.run(QUERY, None, CancellationToken::new()).await.unwrap();
    assert_eq!(outcome.stop_reason, StopReason::Skipped);
}
