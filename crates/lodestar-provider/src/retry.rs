//! Bounded retry with exponential backoff for provider calls.
//!
//! Retry lives at the provider boundary only; the search controller never
//! retries. Each attempt runs under its own timeout.

use std::future::Future;
use std::time::Duration;

use lodestar_core::config::ProviderConfig;

use crate::ProviderError;

/// Retry policy derived from the engine's provider knobs.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub retries: u32,
    pub base_delay: Duration,
    pub call_timeout: Duration,
}

impl RetryPolicy {
    pub fn from_config(config: &ProviderConfig) -> Self {
        Self {
            retries: config.retries,
            base_delay: Duration::from_millis(100),
            call_timeout: Duration::from_millis(config.call_timeout_ms),
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from_config(&ProviderConfig::default())
    }
}

/// Run a provider call, retrying retryable failures with exponential
/// backoff. Non-retryable errors surface immediately.
pub async fn with_retry<T, F, Fut>(
    policy: RetryPolicy,
    what: &str,
    mut call: F,
) -> Result<T, ProviderError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, ProviderError>>,
{
    let mut attempt = 0u32;
    loop {
        let outcome = match tokio::time::timeout(policy.call_timeout, call()).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout {
                elapsed_ms: policy.call_timeout.as_millis() as u64,
            }),
        };

        match outcome {
            Ok(value) => return Ok(value),
            Err(e) if e.is_retryable() && attempt < policy.retries => {
                let delay = policy.base_delay * 2u32.saturating_pow(attempt);
                tracing::warn!("{what} failed (attempt {}): {e}; retrying", attempt + 1);
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy(retries: u32) -> RetryPolicy {
        RetryPolicy {
            retries,
            base_delay: Duration::from_millis(1),
            call_timeout: Duration::from_secs(1),
        }
    }

    #[tokio::test]
    async fn succeeds_after_transient_failures() {
        let calls = AtomicU32::new(0);
        let result = with_retry(policy(3), "lookup", || {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            async move {
                if n < 2 {
                    Err(ProviderError::Lookup {
                        source_id: "s".to_string(),
                        message: "flaky".to_string(),
                    })
                } else {
                    Ok(42)
                }
            }
        })
        .await;
        assert_eq!(result.unwrap(), 42);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn non_retryable_fails_fast() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = with_retry(policy(3), "lookup", || {
            calls.fetch_add(1, Ordering::SeqCst);
            async {
                Err(ProviderError::UnknownSource {
                    source_id: "s".to_string(),
                })
            }
        })
        .await;
        assert!(matches!(result, Err(ProviderError::UnknownSource { .. })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn exhausted_retries_surface_last_error() {
        let result: Result<(), _> = with_retry(policy(1), "lookup", || async {
            Err(ProviderError::Lookup {
                source_id: "s".to_string(),
                message: "down".to_string(),
            })
        })
        .await;
        assert!(matches!(result, Err(ProviderError::Lookup { .. })));
    }
}
