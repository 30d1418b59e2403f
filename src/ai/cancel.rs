//! Cooperative cancellation for backend waits.
//!
//! A `CancelToken` is cheap to clone; cancelling any clone cancels all of
//! them. `run` races a future against cancellation and drops the future
//! (aborting any in-flight HTTP request or backoff sleep) when cancelled.

use std::future::Future;
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

use crate::types::{DocForgeError, Result};

#[derive(Debug, Clone)]
pub struct CancelToken {
    sender: Arc<watch::Sender<bool>>,
    receiver: watch::Receiver<bool>,
}

impl Default for CancelToken {
    fn default() -> Self {
        Self::new()
    }
}

impl CancelToken {
    pub fn new() -> Self {
        let (sender, receiver) = watch::channel(false);
        Self {
            sender: Arc::new(sender),
            receiver,
        }
    }

    /// Cancel every clone of this token. Idempotent.
    pub fn cancel(&self) {
        self.sender.send_replace(true);
    }

    pub fn is_cancelled(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once the token is cancelled
    pub async fn cancelled(&self) {
        let mut receiver = self.receiver.clone();
        if receiver.wait_for(|cancelled| *cancelled).await.is_err() {
            // Sender is held by every clone, so this only happens during teardown
            std::future::pending::<()>().await;
        }
    }

    /// Fail fast when already cancelled
    pub fn check(&self, operation: &str) -> Result<()> {
        if self.is_cancelled() {
            return Err(DocForgeError::cancelled(operation));
        }
        Ok(())
    }

    /// Run `future` unless cancelled first; cancellation drops the future
    pub async fn run<T, F>(&self, operation: &str, future: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        self.check(operation)?;
        tokio::select! {
            biased;
            _ = self.cancelled() => {
                debug!(operation, "Operation cancelled");
                Err(DocForgeError::cancelled(operation))
            }
            result = future => result,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_run_completes_when_not_cancelled() {
        let token = CancelToken::new();
        let value = token.run("work", async { Ok(7) }).await.unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_cancel_interrupts_pending_future() {
        let token = CancelToken::new();
        let canceller = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            canceller.cancel();
        });

        let started = std::time::Instant::now();
        let result: Result<()> = token
            .run("backend call", std::future::pending())
            .await;

        assert!(matches!(result, Err(DocForgeError::Cancelled { .. })));
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_already_cancelled_skips_future() {
        let token = CancelToken::new();
        token.cancel();
        assert!(token.is_cancelled());

        let result = token
            .run("never", async { Ok::<_, DocForgeError>(1) })
            .await;
        assert!(result.unwrap_err().is_cancelled());
    }
}
