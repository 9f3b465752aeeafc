//! Retry wrapper with a per-attempt timeout and exponential backoff.
//!
//! Transient failures (rate limits, timeouts, network errors) are retried up
//! to the configured number of extra attempts. Everything else is returned
//! to the caller immediately.

use async_trait::async_trait;
use deskmate_core::error::ProviderError;
use deskmate_core::provider::*;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Call policy applied to every request.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_retries: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            max_retries: 2,
            backoff: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(llm: &deskmate_config::LlmConfig) -> Self {
        Self {
            timeout: Duration::from_secs(llm.timeout_secs),
            max_retries: llm.max_retries,
            backoff: Duration::from_millis(llm.backoff_ms),
        }
    }

    /// Delay before retry number `retry` (0-based), doubling each time.
    fn delay(&self, retry: u32) -> Duration {
        self.backoff.saturating_mul(1u32 << retry.min(16))
    }

    /// Delay before retrying after `error`. A provider-supplied retry-after
    /// wins when it is longer than the backoff.
    fn delay_after(&self, retry: u32, error: &ProviderError) -> Duration {
        let backoff = self.delay(retry);
        match error {
            ProviderError::RateLimited { retry_after_secs } => {
                backoff.max(Duration::from_secs(*retry_after_secs))
            }
            _ => backoff,
        }
    }
}

/// A provider that retries transient failures of an inner provider.
pub struct RetryProvider {
    inner: Arc<dyn deskmate_core::Provider>,
    policy: RetryPolicy,
}

impl RetryProvider {
    pub fn new(inner: Arc<dyn deskmate_core::Provider>, policy: RetryPolicy) -> Self {
        Self { inner, policy }
    }

    pub fn policy(&self) -> RetryPolicy {
        self.policy
    }
}

#[async_trait]
impl deskmate_core::Provider for RetryProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn complete(
        &self,
        request: ProviderRequest,
    ) -> std::result::Result<ProviderResponse, ProviderError> {
        let total = self.policy.max_retries + 1;
        let mut attempt = 0;

        loop {
            attempt += 1;

            let error = match tokio::time::timeout(
                self.policy.timeout,
                self.inner.complete(request.clone()),
            )
            .await
            {
                Ok(Ok(response)) => {
                    if attempt > 1 {
                        info!(provider = %self.inner.name(), attempt, "Retry succeeded");
                    }
                    return Ok(response);
                }
                Ok(Err(e)) => e,
                Err(_) => ProviderError::Timeout(format!(
                    "Provider '{}' timed out after {}s",
                    self.inner.name(),
                    self.policy.timeout.as_secs()
                )),
            };

            if !error.is_transient() || attempt >= total {
                warn!(
                    provider = %self.inner.name(),
                    attempt,
                    total,
                    error = %error,
                    "Provider call failed"
                );
                return Err(error);
            }

            let delay = self.policy.delay_after(attempt - 1, &error);
            warn!(
                provider = %self.inner.name(),
                attempt,
                total,
                delay_ms = delay.as_millis() as u64,
                error = %error,
                "Transient provider failure, retrying"
            );
            tokio::time::sleep(delay).await;
        }
    }

    async fn health_check(&self) -> std::result::Result<bool, ProviderError> {
        match tokio::time::timeout(self.policy.timeout, self.inner.health_check()).await {
            Ok(result) => result,
            Err(_) => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deskmate_core::Provider;
    use deskmate_core::message::Message;
    use std::sync::Mutex;

    /// Fails with the scripted errors in order, then succeeds.
    struct ScriptedProvider {
        errors: Mutex<Vec<ProviderError>>,
        call_count: Mutex<usize>,
    }

    impl ScriptedProvider {
        fn new(mut errors: Vec<ProviderError>) -> Self {
            errors.reverse();
            Self {
                errors: Mutex::new(errors),
                call_count: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.call_count.lock().unwrap()
        }
    }

    #[async_trait]
    impl deskmate_core::Provider for ScriptedProvider {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            *self.call_count.lock().unwrap() += 1;
            if let Some(e) = self.errors.lock().unwrap().pop() {
                return Err(e);
            }
            Ok(ProviderResponse {
                message: Message::assistant("success"),
                usage: None,
                model: "test-model".into(),
            })
        }
    }

    /// A mock provider that hangs forever (for timeout testing).
    struct HangingProvider;

    #[async_trait]
    impl deskmate_core::Provider for HangingProvider {
        fn name(&self) -> &str {
            "hanging"
        }

        async fn complete(
            &self,
            _request: ProviderRequest,
        ) -> std::result::Result<ProviderResponse, ProviderError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Err(ProviderError::Network("unreachable".into()))
        }
    }

    fn test_request() -> ProviderRequest {
        ProviderRequest::single_shot("test", "sys", "hello", 0.5, 64)
    }

    fn fast_policy(max_retries: u32) -> RetryPolicy {
        RetryPolicy {
            timeout: Duration::from_millis(50),
            max_retries,
            backoff: Duration::from_millis(1),
        }
    }

    #[tokio::test]
    async fn first_attempt_succeeds() {
        let inner = Arc::new(ScriptedProvider::new(vec![]));
        let retry = RetryProvider::new(inner.clone(), fast_policy(2));

        let result = retry.complete(test_request()).await;
        assert_eq!(result.unwrap().message.content, "success");
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test]
    async fn retries_rate_limit_then_succeeds() {
        let inner = Arc::new(ScriptedProvider::new(vec![
            ProviderError::RateLimited {
                retry_after_secs: 0,
            },
            ProviderError::Network("reset".into()),
        ]));
        let retry = RetryProvider::new(inner.clone(), fast_policy(2));

        assert!(retry.complete(test_request()).await.is_ok());
        assert_eq!(inner.calls(), 3);
    }

    #[tokio::test]
    async fn gives_up_after_max_retries() {
        let inner = Arc::new(ScriptedProvider::new(vec![
            ProviderError::Network("down".into()),
            ProviderError::Network("down".into()),
            ProviderError::Network("still down".into()),
        ]));
        let retry = RetryProvider::new(inner.clone(), fast_policy(1));

        match retry.complete(test_request()).await {
            Err(ProviderError::Network(msg)) => assert_eq!(msg, "down"),
            other => panic!("Expected Network, got: {other:?}"),
        }
        assert_eq!(inner.calls(), 2);
    }

    #[tokio::test]
    async fn permanent_errors_are_not_retried() {
        let inner = Arc::new(ScriptedProvider::new(vec![
            ProviderError::AuthenticationFailed("bad key".into()),
        ]));
        let retry = RetryProvider::new(inner.clone(), fast_policy(3));

        assert!(matches!(
            retry.complete(test_request()).await,
            Err(ProviderError::AuthenticationFailed(_))
        ));
        assert_eq!(inner.calls(), 1);
    }

    #[tokio::test]
    async fn hanging_provider_times_out() {
        let retry = RetryProvider::new(Arc::new(HangingProvider), fast_policy(1));
        assert!(matches!(
            retry.complete(test_request()).await,
            Err(ProviderError::Timeout(_))
        ));
    }

    #[test]
    fn backoff_doubles() {
        let policy = RetryPolicy {
            backoff: Duration::from_millis(500),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay(0), Duration::from_millis(500));
        assert_eq!(policy.delay(1), Duration::from_millis(1000));
        assert_eq!(policy.delay(2), Duration::from_millis(2000));
    }

    #[test]
    fn retry_after_wins_when_longer() {
        let policy = RetryPolicy {
            backoff: Duration::from_millis(500),
            ..RetryPolicy::default()
        };
        let limited = |secs| ProviderError::RateLimited {
            retry_after_secs: secs,
        };
        assert_eq!(policy.delay_after(0, &limited(3)), Duration::from_secs(3));
        assert_eq!(policy.delay_after(2, &limited(1)), Duration::from_millis(2000));
        assert_eq!(policy.delay_after(0, &limited(0)), Duration::from_millis(500));
        assert_eq!(
            policy.delay_after(1, &ProviderError::Network("reset".into())),
            Duration::from_millis(1000)
        );
    }

    #[test]
    fn policy_from_config() {
        let llm = deskmate_config::LlmConfig::default();
        let policy = RetryPolicy::from_config(&llm);
        assert_eq!(policy.timeout, Duration::from_secs(60));
        assert_eq!(policy.max_retries, 2);
    }
}
