//! Best-effort invocation of host calls.
//!
//! Every host call made by this crate goes through [`Invoker::invoke`]. A call that reports a
//! transient status is retried, waiting `base_delay × n` after the n-th busy answer, up to
//! `max_attempts` attempts in total. Anything else, including running out of attempts, is
//! logged and swallowed: the caller sees `None` and carries on with a degraded result.

use serde::{Deserialize, Serialize};
use std::{future::Future, time::Duration};
use tokio::time::sleep;

use crate::error::{ErrorClass, HostError};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy {
            max_attempts: 3,
            base_delay_ms: 250,
        }
    }
}

impl RetryPolicy {
    /// Wait before `attempt` (1-based). The first attempt runs immediately.
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        if attempt <= 1 {
            return Duration::ZERO;
        }
        Duration::from_millis(self.base_delay_ms.saturating_mul(u64::from(attempt - 1)))
    }
}

/// Runs units of host work under a [`RetryPolicy`].
#[derive(Debug, Clone, Default)]
pub struct Invoker {
    policy: RetryPolicy,
}

impl Invoker {
    pub fn new(policy: RetryPolicy) -> Self {
        Invoker { policy }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Run `work`, retrying while it fails with a transient status.
    ///
    /// Returns `None` after a permanent failure or once attempts are exhausted. Failures are
    /// reported through `tracing` only.
    pub async fn invoke<T, F, Fut>(&self, operation: &str, mut work: F) -> Option<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, HostError>>,
    {
        let max_attempts = self.policy.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match work().await {
                Ok(value) => {
                    if attempt > 1 {
                        tracing::info!(
                            "[Invoker::invoke] {operation} completed after {} retries",
                            attempt - 1
                        );
                    }
                    return Some(value);
                }
                Err(err) => match err.class() {
                    ErrorClass::Transient if attempt < max_attempts => {
                        attempt += 1;
                        let delay = self.policy.delay_for_attempt(attempt);
                        tracing::debug!(
                            "[Invoker::invoke] {operation} found the host busy, \
                             attempt {attempt} in {}ms",
                            delay.as_millis()
                        );
                        sleep(delay).await;
                    }
                    ErrorClass::Transient => {
                        tracing::error!(
                            "[Invoker::invoke] {operation} abandoned, host still busy after \
                             {attempt} attempts: {err}"
                        );
                        return None;
                    }
                    ErrorClass::Permanent => {
                        tracing::error!("[Invoker::invoke] {operation} failed: {err}");
                        return None;
                    }
                },
            }
        }
    }
}
