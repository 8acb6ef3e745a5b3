//! Per-provider retry policies and the retry wrapper.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};

use crate::error::{SendError, normalize};
use crate::events::{EventSink, RuntimeEvent};
use crate::message::{EmailRequest, EmailResponse};
use crate::provider::EmailProvider;

/// Decides whether, and after how long, a failed provider send is retried.
///
/// `attempt` is 1-based: it counts the attempt that just failed.
#[cfg_attr(test, mockall::automock)]
pub trait RetryPolicy: Send + Sync {
    fn should_retry(&self, error: &SendError, attempt: u32) -> bool;

    fn delay_before_attempt(&self, attempt: u32) -> Duration;
}

/// Never retries. The runtime default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRetry;

impl RetryPolicy for NoRetry {
    fn should_retry(&self, _error: &SendError, _attempt: u32) -> bool {
        false
    }

    fn delay_before_attempt(&self, _attempt: u32) -> Duration {
        Duration::ZERO
    }
}

/// Exponential backoff for transient failures.
///
/// Retries `rate-limited` and `provider-unavailable` errors up to
/// `max_retries` times. The delay after attempt N is
/// `base_delay_ms * 2^(N-1)`, capped at `max_delay_ms`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackoffPolicy {
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    #[serde(default = "defaults::base_delay_ms")]
    pub base_delay_ms: u64,

    #[serde(default = "defaults::max_delay_ms")]
    pub max_delay_ms: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            max_retries: defaults::max_retries(),
            base_delay_ms: defaults::base_delay_ms(),
            max_delay_ms: defaults::max_delay_ms(),
        }
    }
}

impl RetryPolicy for BackoffPolicy {
    fn should_retry(&self, error: &SendError, attempt: u32) -> bool {
        error.kind().is_transient() && attempt <= self.max_retries
    }

    fn delay_before_attempt(&self, attempt: u32) -> Duration {
        let factor = 1u64
            .checked_shl(attempt.saturating_sub(1))
            .unwrap_or(u64::MAX);
        let delay = self.base_delay_ms.saturating_mul(factor).min(self.max_delay_ms);
        Duration::from_millis(delay)
    }
}

mod defaults {
    pub const fn max_retries() -> u32 {
        3
    }

    pub const fn base_delay_ms() -> u64 {
        1000
    }

    pub const fn max_delay_ms() -> u64 {
        30_000
    }
}

/// Wraps a provider so each send is retried according to a [`RetryPolicy`].
///
/// The wrapper has the same shape as the provider it wraps. It places no
/// bound on attempts of its own; the policy decides when to stop.
pub struct RetryingProvider {
    inner: Arc<dyn EmailProvider>,
    policy: Arc<dyn RetryPolicy>,
    events: Arc<dyn EventSink>,
}

impl RetryingProvider {
    pub fn new(
        inner: Arc<dyn EmailProvider>,
        policy: Arc<dyn RetryPolicy>,
        events: Arc<dyn EventSink>,
    ) -> Self {
        Self {
            inner,
            policy,
            events,
        }
    }

    /// Send through the wrapped provider, retrying while the policy allows.
    ///
    /// Returns the first success, or the classified error of the attempt the
    /// policy declined to retry.
    pub async fn send_with_retry(&self, request: &EmailRequest) -> Result<EmailResponse, SendError> {
        self.send_from_attempt(request, 1).await
    }

    /// The retry loop, numbering the first call `attempt`. The counter
    /// saturates, so a policy that never gives up keeps seeing `u32::MAX`.
    async fn send_from_attempt(
        &self,
        request: &EmailRequest,
        mut attempt: u32,
    ) -> Result<EmailResponse, SendError> {
        let name = self.inner.name();

        loop {
            let error = match self.inner.send(request).await {
                Ok(response) => match check_response(name, response) {
                    Ok(response) => return Ok(response),
                    Err(e) => e,
                },
                Err(e) => normalize(e, Some(name)),
            };

            if !self.policy.should_retry(&error, attempt) {
                debug!("{}: giving up after attempt {}: {}", name, attempt, error);
                return Err(error);
            }

            let delay = self.policy.delay_before_attempt(attempt);
            self.events.emit(&RuntimeEvent::Retrying {
                provider: name.to_string(),
                attempt,
                delay_ms: u64::try_from(delay.as_millis()).unwrap_or(u64::MAX),
                kind: error.kind(),
            });

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt = attempt.saturating_add(1);
        }
    }
}

#[async_trait]
impl EmailProvider for RetryingProvider {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn send(&self, request: &EmailRequest) -> Result<EmailResponse> {
        Ok(self.send_with_retry(request).await?)
    }
}

/// A success must carry a message id and at least one accepted recipient.
fn check_response(name: &str, response: EmailResponse) -> Result<EmailResponse, SendError> {
    if response.message_id.is_empty() {
        return Err(SendError::unavailable(name)
            .message(format!("{} did not return a message id", name)));
    }
    if response.accepted.is_empty() {
        return Err(SendError::unavailable(name)
            .message(format!("{} accepted no recipients", name)));
    }
    Ok(response)
}
