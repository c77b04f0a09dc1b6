//! Bounded retry with deterministic exponential backoff.
//!
//! One policy governs every provider-calling path. Backoff is
//! `base * 2^retry_count` capped at `max`, with no jitter, so delays are
//! exact in tests.

use std::future::Future;
use std::time::Duration;

use crate::error::{ClassifiedError, ErrorKind};
use crate::provider::ProviderFailure;

/// Hard ceiling on automatic retries per operation.
const MAX_RETRIES: u32 = 3;

/// First retry waits this long; each subsequent retry doubles it.
const BASE_DELAY_MS: u64 = 1_000;

/// Backoff cap.
const MAX_DELAY_MS: u64 = 10_000;

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            base_delay_ms: BASE_DELAY_MS,
            max_delay_ms: MAX_DELAY_MS,
        }
    }
}

impl RetryPolicy {
    /// Whether to retry after `retry_count` retries have already run.
    ///
    /// Auth and validation failures are refused regardless of the error's
    /// own `retryable` flag.
    pub fn should_retry(&self, error: &ClassifiedError, retry_count: u32) -> bool {
        if matches!(error.kind, ErrorKind::Auth | ErrorKind::Validation) {
            return false;
        }
        error.retryable && retry_count < self.max_retries
    }

    /// Delay before the retry with zero-based index `retry_count`.
    pub fn retry_delay(&self, retry_count: u32) -> Duration {
        let factor = 2u64.saturating_pow(retry_count);
        let millis = self
            .base_delay_ms
            .saturating_mul(factor)
            .min(self.max_delay_ms);
        Duration::from_millis(millis)
    }
}

/// Run a provider call under the retry policy.
///
/// Each failure is classified; retryable ones sleep out the backoff and try
/// again until the ceiling, the terminal one is returned classified.
pub async fn call_with_retry<T, F, Fut>(policy: &RetryPolicy, op: F) -> Result<T, ClassifiedError>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, ProviderFailure>>,
{
    let mut retry_count = 0u32;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(failure) => {
                let classified = failure.classify();
                if !policy.should_retry(&classified, retry_count) {
                    return Err(classified);
                }
                let delay = policy.retry_delay(retry_count);
                log::warn!(
                    "retry: attempt {} failed ({}), retrying in {:?}",
                    retry_count + 1,
                    classified.kind,
                    delay
                );
                tokio::time::sleep(delay).await;
                retry_count += 1;
            }
        }
    }
}
