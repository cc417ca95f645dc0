//! Notifications
//!
//! Progress messages pushed to the chat while a run is still in flight.
//! Pushing never blocks the orchestration loop: messages go through an
//! unbounded channel drained by a single worker task, so delivery order is
//! push order, and delivery failures are logged and dropped.

pub mod events;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

pub use events::announcement;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum NotifyError {
    #[error("notification delivery failed: {0}")]
    Delivery(String),

    #[error("notification channel closed")]
    Closed,
}

/// A destination for progress messages.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, text: &str) -> Result<(), NotifyError>;
}

/// Ordered fire-and-forget delivery through one [`Notifier`].
pub struct NotificationQueue {
    tx: mpsc::UnboundedSender<String>,
    worker: JoinHandle<usize>,
}

impl NotificationQueue {
    /// Spawn the delivery worker.
    pub fn spawn(notifier: Arc<dyn Notifier>) -> Self {
        let (tx, mut rx) = mpsc::unbounded_channel::<String>();
        let worker = tokio::spawn(async move {
            let mut delivered = 0;
            while let Some(text) = rx.recv().await {
                match notifier.notify(&text).await {
                    Ok(()) => delivered += 1,
                    Err(e) => tracing::warn!(error = %e, "notification dropped"),
                }
            }
            delivered
        });
        Self { tx, worker }
    }

    /// Queue `text` for delivery.
    pub fn push(&self, text: impl Into<String>) {
        if self.tx.send(text.into()).is_err() {
            tracing::warn!(error = %NotifyError::Closed, "notification dropped");
        }
    }

    /// Stop accepting messages and wait until the queue is drained.
    ///
    /// Returns how many messages were delivered.
    pub async fn close(self) -> usize {
        drop(self.tx);
        match self.worker.await {
            Ok(delivered) => delivered,
            Err(e) => {
                tracing::warn!(error = %e, "notification worker failed");
                0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn notify(&self, text: &str) -> Result<(), NotifyError> {
            // Uneven delays must not reorder delivery.
            let delay = if text.ends_with('1') { 20 } else { 1 };
            tokio::time::sleep(Duration::from_millis(delay)).await;
            if text.contains("fail") {
                return Err(NotifyError::Delivery("chat not found".to_string()));
            }
            self.sent.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_delivery_preserves_push_order() {
        let notifier = Arc::new(RecordingNotifier::default());
        let queue = NotificationQueue::spawn(notifier.clone());
        for i in 1..=4 {
            queue.push(format!("round {}", i));
        }
        assert_eq!(queue.close().await, 4);
        assert_eq!(
            *notifier.sent.lock().unwrap(),
            vec!["round 1", "round 2", "round 3", "round 4"]
        );
    }

    #[tokio::test]
    async fn test_failures_are_dropped() {
        let notifier = Arc::new(RecordingNotifier::default());
        let queue = NotificationQueue::spawn(notifier.clone());
        queue.push("first");
        queue.push("this will fail");
        queue.push("last");
        assert_eq!(queue.close().await, 2);
        assert_eq!(*notifier.sent.lock().unwrap(), vec!["first", "last"]);
    }
}
