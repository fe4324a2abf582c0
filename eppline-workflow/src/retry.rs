//! Bounded retry with exponential backoff around any [`RegistryTransport`].
//!
//! Only transient failures (network, timeout) are retried. A registry that
//! answers with a result code has made a decision; repeating the command
//! would not change it.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, warn};

use eppline_core::{
    Command, ProviderCatalog, ProviderId, RegistryTransport, RetrySettings, TransportError,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
    pub attempt_timeout: Duration,
}

impl RetryPolicy {
    /// A single attempt, no backoff.
    pub fn none(attempt_timeout: Duration) -> Self {
        Self {
            max_attempts: 1,
            base_backoff: Duration::ZERO,
            max_backoff: Duration::ZERO,
            attempt_timeout,
        }
    }

    /// Delay before attempt `attempt + 1`, where `attempt` starts at 1.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.base_backoff.saturating_mul(exp).min(self.max_backoff)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::from(&RetrySettings::default())
    }
}

impl From<&RetrySettings> for RetryPolicy {
    fn from(s: &RetrySettings) -> Self {
        Self {
            max_attempts: s.max_attempts.max(1),
            base_backoff: s.base_backoff(),
            max_backoff: s.max_backoff(),
            attempt_timeout: s.attempt_timeout(),
        }
    }
}

/// Transport wrapper applying a per-registry [`RetryPolicy`].
pub struct RetryingTransport<T> {
    inner: T,
    default_policy: RetryPolicy,
    policies: HashMap<ProviderId, RetryPolicy>,
}

impl<T: RegistryTransport> RetryingTransport<T> {
    pub fn new(inner: T, policy: RetryPolicy) -> Self {
        Self {
            inner,
            default_policy: policy,
            policies: HashMap::new(),
        }
    }

    /// Use each provider's configured retry settings.
    pub fn from_catalog(inner: T, catalog: &ProviderCatalog) -> Self {
        let policies = catalog
            .providers
            .iter()
            .map(|p| (p.id.clone(), RetryPolicy::from(&p.retry)))
            .collect();
        Self {
            inner,
            default_policy: RetryPolicy::default(),
            policies,
        }
    }

    pub fn with_policy(mut self, registry: impl Into<ProviderId>, policy: RetryPolicy) -> Self {
        self.policies.insert(registry.into(), policy);
        self
    }

    pub fn policy_for(&self, registry: &ProviderId) -> RetryPolicy {
        self.policies
            .get(registry)
            .copied()
            .unwrap_or(self.default_policy)
    }
}

#[async_trait]
impl<T: RegistryTransport> RegistryTransport for RetryingTransport<T> {
    async fn call(
        &self,
        registry: &ProviderId,
        command: Command,
        payload: Value,
    ) -> Result<Value, TransportError> {
        let policy = self.policy_for(registry);
        let mut attempt = 1u32;
        loop {
            let outcome = tokio::time::timeout(
                policy.attempt_timeout,
                self.inner.call(registry, command, payload.clone()),
            )
            .await
            .unwrap_or_else(|_| {
                Err(TransportError::Timeout {
                    registry: registry.clone(),
                    after: policy.attempt_timeout,
                })
            });

            let err = match outcome {
                Ok(value) => {
                    if attempt > 1 {
                        debug!(registry = %registry, command = %command, attempt, "call succeeded after retry");
                    }
                    return Ok(value);
                }
                Err(err) => err,
            };

            if !err.is_transient() {
                return Err(err);
            }
            if attempt >= policy.max_attempts {
                warn!(
                    registry = %registry,
                    command = %command,
                    attempts = attempt,
                    error = %err,
                    "giving up after transient failures"
                );
                return Err(err);
            }

            let backoff = policy.backoff(attempt);
            warn!(
                registry = %registry,
                command = %command,
                attempt,
                backoff = ?backoff,
                error = %err,
                "transient transport failure, retrying"
            );
            tokio::time::sleep(backoff).await;
            attempt += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let p = RetryPolicy {
            max_attempts: 5,
            base_backoff: Duration::from_millis(100),
            max_backoff: Duration::from_millis(350),
            attempt_timeout: Duration::from_secs(1),
        };
        assert_eq!(p.backoff(1), Duration::from_millis(100));
        assert_eq!(p.backoff(2), Duration::from_millis(200));
        assert_eq!(p.backoff(3), Duration::from_millis(350));
        assert_eq!(p.backoff(40), Duration::from_millis(350));
    }

    #[test]
    fn zero_attempts_in_settings_still_tries_once() {
        let settings = RetrySettings {
            max_attempts: 0,
            ..RetrySettings::default()
        };
        assert_eq!(RetryPolicy::from(&settings).max_attempts, 1);
    }
}
