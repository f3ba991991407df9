//! Retry loop for per-document optimistic transactions.
//!
//! A transaction body reads one document, computes the next value and writes
//! it back with the version it read. When the store reports a version
//! conflict the whole body runs again against a fresh read, with exponential
//! backoff between attempts.

use std::future::Future;
use std::time::Duration;

use backoff::ExponentialBackoffBuilder;
use tracing::{debug, warn};

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::TransactionConfig;

#[derive(Debug, Clone)]
pub struct TransactionRunner {
    max_attempts: u32,
    initial_backoff: Duration,
    max_backoff: Duration,
}

impl Default for TransactionRunner {
    fn default() -> Self {
        Self::from(&TransactionConfig::default())
    }
}

impl From<&TransactionConfig> for TransactionRunner {
    fn from(config: &TransactionConfig) -> Self {
        Self::new(config.max_attempts, config.initial_backoff_ms, config.max_backoff_ms)
    }
}

impl TransactionRunner {
    pub fn new(max_attempts: u32, initial_backoff_ms: u64, max_backoff_ms: u64) -> Self {
        let initial_backoff_ms = initial_backoff_ms.max(1);
        Self {
            max_attempts: max_attempts.max(1),
            initial_backoff: Duration::from_millis(initial_backoff_ms),
            max_backoff: Duration::from_millis(max_backoff_ms.max(initial_backoff_ms)),
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Run `body` until it commits, fails with a non-conflict error, or
    /// conflicts `max_attempts` times.
    ///
    /// `body` must be safe to re-run: everything it computes has to be
    /// derived from what it reads inside the same attempt.
    pub async fn run<T, F, Fut>(&self, document: &str, mut body: F) -> DomainResult<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = DomainResult<T>>,
    {
        let policy = ExponentialBackoffBuilder::new()
            .with_initial_interval(self.initial_backoff)
            .with_max_interval(self.max_backoff)
            .with_max_elapsed_time(None)
            .build();

        let max_attempts = self.max_attempts;
        let mut attempts = 0u32;

        backoff::future::retry(policy, || {
            attempts += 1;
            let attempt = attempts;
            let fut = body();
            async move {
                match fut.await {
                    Ok(value) => Ok(value),
                    Err(err) if err.is_conflict() && attempt < max_attempts => {
                        debug!(document, attempt, "version conflict, retrying");
                        Err(backoff::Error::transient(err))
                    }
                    Err(err) if err.is_conflict() => {
                        warn!(document, attempts = attempt, "giving up after repeated conflicts");
                        Err(backoff::Error::permanent(DomainError::TransactionConflictExhausted {
                            document: document.to_string(),
                            attempts: attempt,
                        }))
                    }
                    Err(err) => Err(backoff::Error::permanent(err)),
                }
            }
        })
        .await
    }
}
