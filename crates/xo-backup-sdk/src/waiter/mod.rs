// Copyright (C) 2025 SyncMyOrders Sp. z o.o.
// SPDX-License-Identifier: AGPL-3.0-or-later
//! State-change waiter.
//!
//! Turns a fire-and-forget remote command into a bounded wait for a target
//! condition. A wait repeatedly asks a [`RefreshSource`] for the current value
//! of some attribute, hands it to a [`Condition`], and stops on:
//!
//! - **success**: the condition reported `Target` on `min_confirmations`
//!   consecutive refreshes
//! - **failure**: the condition reported a state the backup cannot leave, a
//!   refresh failed with a non-retryable error, or retryable refresh errors
//!   exceeded `retry_budget` in a row
//! - **timeout**: the deadline passed; the error carries the last observed
//!   value and the elapsed time
//! - **cancellation**: the caller's token fired
//!
//! # Timing
//!
//! The first refresh happens immediately on entry, so an already-satisfied
//! condition returns without delay. After every refresh the deadline is
//! checked; otherwise the loop pauses for `min(poll_interval, remaining)`.
//! A zero timeout therefore performs exactly one refresh. A refresh that is
//! still running one poll interval past the deadline is dropped and the wait
//! times out, so no wait outlives `timeout + poll_interval` regardless of how
//! slow the remote side is. Cancellation also interrupts a running refresh.
//!
//! Each call to [`StateWaiter::wait`] owns its own poll state. Sources and
//! conditions are shared by reference and must be stateless.

mod conditions;

pub use conditions::{AddressCondition, GenerationAdvanced, PowerStateCondition};

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::error::{Result, SdkError};

/// Verdict of a condition on one observed value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Evaluation {
    /// Not there yet; keep polling.
    Pending,
    /// The desired condition holds.
    Target,
    /// A state that will never lead to the target; the string names it.
    Failed(String),
}

/// Pure predicate over an observed value.
pub trait Condition<V>: Send + Sync {
    fn evaluate(&self, value: &V) -> Evaluation;
}

/// One uncached remote read of the value a condition examines.
#[async_trait]
pub trait RefreshSource: Send + Sync {
    type Value: fmt::Debug + Send + Sync;

    async fn refresh(&self, id: &str) -> Result<Self::Value>;
}

/// Polling policy for a single wait.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WaitConfig {
    /// Pause between refreshes.
    pub poll_interval: Duration,
    /// Consecutive `Target` observations required before succeeding.
    pub min_confirmations: u32,
    /// Overall deadline, measured from entry.
    pub timeout: Duration,
    /// Consecutive retryable refresh errors tolerated.
    pub retry_budget: u32,
}

impl Default for WaitConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(5),
            min_confirmations: 1,
            timeout: Duration::from_secs(300),
            retry_budget: 3,
        }
    }
}

impl WaitConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Values below one are treated as one.
    pub fn with_min_confirmations(mut self, confirmations: u32) -> Self {
        self.min_confirmations = confirmations;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_retry_budget(mut self, budget: u32) -> Self {
        self.retry_budget = budget;
        self
    }
}

/// Successful end of a wait.
#[derive(Debug, Clone, PartialEq)]
pub struct WaitOutcome<V> {
    /// The value that satisfied the condition.
    pub value: V,
    /// Refresh calls made, including failed ones.
    pub attempts: u32,
    pub elapsed: Duration,
}

/// Runs waits with a fixed [`WaitConfig`].
#[derive(Debug, Clone, Default)]
pub struct StateWaiter {
    config: WaitConfig,
}

impl StateWaiter {
    pub fn new(config: WaitConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &WaitConfig {
        &self.config
    }

    /// Block until `condition` holds for the value `source` reports for `id`.
    pub async fn wait<S, C>(
        &self,
        source: &S,
        condition: &C,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<WaitOutcome<S::Value>>
    where
        S: RefreshSource + ?Sized,
        C: Condition<S::Value> + ?Sized,
    {
        let started = Instant::now();
        let min_confirmations = self.config.min_confirmations.max(1);
        let mut attempts = 0u32;
        let mut consecutive_failures = 0u32;
        let mut confirmations = 0u32;
        let mut last_observed: Option<S::Value> = None;
        // A refresh in flight is abandoned one poll interval past the deadline.
        let refresh_deadline = started + self.config.timeout + self.config.poll_interval;

        loop {
            if cancel.is_cancelled() {
                return Err(SdkError::Cancelled);
            }

            attempts += 1;
            let refreshed = tokio::select! {
                biased;

                _ = cancel.cancelled() => return Err(SdkError::Cancelled),
                result = tokio::time::timeout_at(refresh_deadline, source.refresh(id)) => result,
            };
            let Ok(result) = refreshed else {
                let elapsed = started.elapsed();
                warn!(id, attempts, ?elapsed, "refresh still running at the hard deadline");
                return Err(SdkError::WaitTimeout {
                    id: id.to_string(),
                    elapsed,
                    last_observed: last_observed.map(|v| format!("{:?}", v)),
                });
            };

            match result {
                Ok(value) => {
                    consecutive_failures = 0;
                    match condition.evaluate(&value) {
                        Evaluation::Target => {
                            confirmations += 1;
                            if confirmations >= min_confirmations {
                                let elapsed = started.elapsed();
                                debug!(id, attempts, ?elapsed, "wait condition reached");
                                return Ok(WaitOutcome {
                                    value,
                                    attempts,
                                    elapsed,
                                });
                            }
                        }
                        Evaluation::Failed(state) => {
                            return Err(SdkError::UnexpectedState {
                                id: id.to_string(),
                                state,
                            });
                        }
                        Evaluation::Pending => confirmations = 0,
                    }
                    last_observed = Some(value);
                }
                Err(err) if err.is_retryable() => {
                    consecutive_failures += 1;
                    confirmations = 0;
                    if consecutive_failures > self.config.retry_budget {
                        return Err(SdkError::RetryBudgetExhausted {
                            attempts: consecutive_failures,
                            source: Box::new(err),
                        });
                    }
                    warn!(
                        id,
                        error = %err,
                        consecutive_failures,
                        budget = self.config.retry_budget,
                        "refresh failed, retrying"
                    );
                }
                Err(err) => return Err(err),
            }

            let elapsed = started.elapsed();
            if elapsed >= self.config.timeout {
                return Err(SdkError::WaitTimeout {
                    id: id.to_string(),
                    elapsed,
                    last_observed: last_observed.map(|v| format!("{:?}", v)),
                });
            }

            let pause = self.config.poll_interval.min(self.config.timeout - elapsed);
            debug!(id, attempts, ?pause, "condition pending");
            tokio::select! {
                biased;

                _ = cancel.cancelled() => return Err(SdkError::Cancelled),
                _ = tokio::time::sleep(pause) => {}
            }
        }
    }
}
