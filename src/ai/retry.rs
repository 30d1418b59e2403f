//! Bounded exponential backoff for backend calls (backon).
//!
//! Only `Connection`/`Timeout` failures are retried. When every attempt
//! fails transiently the last cause is wrapped in `GenerationBackend`.
//! `Model` failures surface on the attempt that produced them.

use backon::{ExponentialBuilder, Retryable};
use std::future::Future;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tracing::warn;

use super::backend::{Completion, CompletionRequest, ModelBackend};
use crate::config::RetryConfig;
use crate::types::{DocForgeError, Result};

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    max_delay: Duration,
    factor: f32,
    jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetryConfig::default())
    }
}

impl From<&RetryConfig> for RetryPolicy {
    fn from(config: &RetryConfig) -> Self {
        Self {
            max_attempts: config.max_attempts.max(1),
            base_delay: Duration::from_millis(config.base_delay_ms),
            max_delay: Duration::from_millis(config.max_delay_ms),
            factor: config.factor,
            jitter: config.jitter,
        }
    }
}

impl RetryPolicy {
    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Policy without jitter and with the given delays
    pub fn fixed(max_attempts: u32, base_delay: Duration, max_delay: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            max_delay,
            factor: 2.0,
            jitter: false,
        }
    }

    fn backoff(&self) -> ExponentialBuilder {
        let builder = ExponentialBuilder::default()
            .with_min_delay(self.base_delay)
            .with_max_delay(self.max_delay)
            .with_factor(self.factor)
            .with_max_times((self.max_attempts - 1) as usize);
        if self.jitter {
            builder.with_jitter()
        } else {
            builder
        }
    }

    /// Run `operation` under the policy
    pub async fn run<T, F, Fut>(&self, operation: &str, mut attempt: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = AtomicU32::new(0);
        let counter = &attempts;

        let result = (|| {
            counter.fetch_add(1, Ordering::SeqCst);
            attempt()
        })
        .retry(self.backoff())
        .when(|e: &DocForgeError| e.is_retryable())
        .notify(|e: &DocForgeError, delay: Duration| {
            warn!(
                operation,
                attempt = counter.load(Ordering::SeqCst),
                delay_ms = delay.as_millis() as u64,
                error = %e,
                "Transient backend failure, retrying"
            );
        })
        .await;

        result.map_err(|e| {
            if e.is_retryable() {
                DocForgeError::GenerationBackend {
                    attempts: attempts.load(Ordering::SeqCst),
                    source: Box::new(e),
                }
            } else {
                e
            }
        })
    }

    /// Submit one completion request under the policy
    pub async fn complete(
        &self,
        backend: &dyn ModelBackend,
        request: &CompletionRequest,
    ) -> Result<Completion> {
        self.run(backend.name(), || backend.complete(request)).await
    }
}
