//! Question-to-answer flow: assistant and chat gateway over scripted doubles.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use contract_guard::services::notification::NotificationQueue;
use contract_guard::services::orchestrator::{Assistant, SecurityAssistant};
use contract_guard::services::remote::gateway::{GREETING, PLACEHOLDER as THINKING};
use contract_guard::services::remote::{IncomingMessage, RemoteAdapter, RemoteError, RemoteGateway};
use contract_guard_core::ToolInvocation;
use tokio::sync::mpsc;

use crate::support::*;

fn assistant(script: Vec<Option<ToolInvocation>>) -> (SecurityAssistant, Arc<DigestSummarizer>) {
    let decision = ScriptedDecision::new(script);
    let engine = Arc::new(FixtureEngine::new());
    let summarizer = Arc::new(DigestSummarizer::default());
    let assistant = SecurityAssistant::new(
        Arc::new(orchestrator(decision, engine)),
        summarizer.clone(),
    );
    (assistant, summarizer)
}

#[tokio::test]
async fn test_answer_summarizes_final_scope() {
    let (assistant, summarizer) = assistant(vec![
        detectors(TOKEN, None),
        mint(TOKEN),
        Some(ToolInvocation::Skip),
    ]);
    let notifier = Arc::new(RecordingNotifier::default());
    let queue = NotificationQueue::spawn(notifier.clone());

    let answer = assistant
        .answer("Any reentrancy in this token?", Some(&queue))
        .await
        .unwrap();
    queue.close().await;

    let seen = summarizer.seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let scope = &seen[0];
    assert!(scope.mint_check().is_some());
    assert!(answer.starts_with("Any reentrancy in this token?: "));
    assert!(answer.contains(&format!("{} finding(s)", scope.detectors_checks().len())));
    assert_eq!(notifier.sent().len(), 2);
}

#[tokio::test]
async fn test_small_talk_summarizes_empty_scope() {
    let (assistant, summarizer) = assistant(vec![None]);
    let answer = assistant.answer("Hi there", None).await.unwrap();
    assert_eq!(answer, "Hi there: 0 finding(s), 0 issue(s)");
    assert!(summarizer.seen.lock().unwrap()[0].is_empty());
}

#[tokio::test]
async fn test_shutdown_cancels_runs() {
    let (assistant, summarizer) = assistant(vec![detectors(TOKEN, None)]);
    assistant.shutdown_token().cancel();

    let answer = assistant.answer("Is it safe?", None).await.unwrap();
    assert_eq!(answer, "Is it safe?: 0 finding(s), 0 issue(s)");
    assert!(summarizer.seen.lock().unwrap()[0].is_empty());
}

/// Delivers a fixed inbox, then hangs up; records everything sent back.
struct InboxAdapter {
    inbox: Mutex<Vec<IncomingMessage>>,
    sent: Mutex<Vec<(i64, String)>>,
    answers: Mutex<Vec<(i64, String)>>,
    deleted: Mutex<Vec<(i64, i64)>>,
}

impl InboxAdapter {
    fn new(texts: &[(i64, &str)]) -> Self {
        let inbox = texts
            .iter()
            .enumerate()
            .map(|(i, (chat_id, text))| IncomingMessage {
                chat_id: *chat_id,
                user_id: 1,
                username: None,
                text: text.to_string(),
                message_id: i as i64 + 1,
                timestamp: chrono::Utc::now(),
            })
            .collect();
        Self {
            inbox: Mutex::new(inbox),
            sent: Mutex::new(Vec::new()),
            answers: Mutex::new(Vec::new()),
            deleted: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RemoteAdapter for InboxAdapter {
    async fn start(&self, message_tx: mpsc::Sender<IncomingMessage>) -> Result<(), RemoteError> {
        let inbox: Vec<_> = self.inbox.lock().unwrap().drain(..).collect();
        tokio::spawn(async move {
            for msg in inbox {
                let _ = message_tx.send(msg).await;
            }
        });
        Ok(())
    }

    async fn stop(&self) -> Result<(), RemoteError> {
        Ok(())
    }

    async fn send_message(&self, chat_id: i64, text: &str) -> Result<i64, RemoteError> {
        let mut sent = self.sent.lock().unwrap();
        sent.push((chat_id, text.to_string()));
        Ok(100 + sent.len() as i64)
    }

    async fn send_answer(&self, chat_id: i64, text: &str) -> Result<(), RemoteError> {
        self.answers.lock().unwrap().push((chat_id, text.to_string()));
        Ok(())
    }

    async fn delete_message(&self, chat_id: i64, message_id: i64) -> Result<(), RemoteError> {
        self.deleted.lock().unwrap().push((chat_id, message_id));
        Ok(())
    }

    async fn send_typing(&self, _chat_id: i64) -> Result<(), RemoteError> {
        Ok(())
    }

    async fn health_check(&self) -> Result<(), RemoteError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_gateway_answers_question_and_greets() {
    let (assistant, _) = assistant(vec![detectors(TOKEN, None), Some(ToolInvocation::Skip)]);
    let adapter = Arc::new(InboxAdapter::new(&[
        (7, "/start"),
        (9, "Is there reentrancy in withdraw?"),
    ]));
    let gateway = RemoteGateway::new(adapter.clone(), Arc::new(assistant));

    gateway.run().await.unwrap();

    // Handlers run on their own tasks and may outlive the receive loop.
    for _ in 0..100 {
        if !adapter.deleted.lock().unwrap().is_empty() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    let sent = adapter.sent.lock().unwrap().clone();
    assert!(sent.contains(&(7, GREETING.to_string())));
    assert!(sent.contains(&(9, THINKING.to_string())));
    assert!(sent.iter().any(|(chat, text)| *chat == 9 && text.starts_with("🔎 ")));

    let answers = adapter.answers.lock().unwrap().clone();
    assert_eq!(answers.len(), 1);
    assert_eq!(answers[0].0, 9);
    assert!(answers[0].1.starts_with("Is there reentrancy in withdraw?: "));

    let deleted = adapter.deleted.lock().unwrap().clone();
    assert_eq!(deleted.len(), 1);
    assert_eq!(deleted[0].0, 9);
}
