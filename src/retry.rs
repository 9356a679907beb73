//! Retry operations with exponential backoff and lifecycle reporting
//!
//! This module holds the one piece of real machinery in the crate: a generic
//! invoker that runs any fallible async operation under a [`RetryPolicy`],
//! decides per attempt whether the failure is retryable by testing its status
//! against a [`RetryableStatuses`] set, and notifies an [`Observer`] at each
//! stage.
//!
//! The invoker never wraps or re-types errors. Whatever the final attempt
//! returned is what the caller receives.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::error::Failure;
use crate::observer::Observer;

/// Configuration for the exponential backoff retry strategy
///
/// `max_attempts` counts every attempt including the first, so a policy with
/// `max_attempts: 3` runs the operation at most three times and reports at
/// most two retries.
///
/// A policy always has `max_attempts >= 1` and `backoff_factor > 1`. The
/// builders keep those bounds and deserialization rejects values outside them.
///
/// # Examples
///
/// ```
/// use clerk_guard::retry::RetryPolicy;
/// use std::time::Duration;
///
/// let policy = RetryPolicy::default();
/// assert_eq!(policy.max_attempts, 32);
/// assert_eq!(policy.delay_for(1), Duration::from_millis(1000));
/// assert_eq!(policy.delay_for(3), Duration::from_millis(4000));
/// assert_eq!(policy.delay_for(4), Duration::from_millis(5000));
///
/// let quick = RetryPolicy::default()
///     .with_max_attempts(3)
///     .with_min_delay_ms(10)
///     .with_max_delay_ms(50);
/// assert_eq!(quick.delay_for(2), Duration::from_millis(20));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RetryPolicyFields")]
pub struct RetryPolicy {
    /// Total number of attempts, including the first
    pub max_attempts: u32,

    /// Multiplier applied to the delay after each retry
    pub backoff_factor: f64,

    /// Delay before the first retry, in milliseconds
    pub min_delay_ms: u64,

    /// Upper bound for any single delay, in milliseconds
    pub max_delay_ms: u64,

    /// Whether to spread each delay by ±10%
    pub randomize: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 32,
            backoff_factor: 2.0,
            min_delay_ms: 1000,
            max_delay_ms: 5000,
            randomize: false,
        }
    }
}

/// A retry policy outside its allowed bounds
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PolicyError {
    #[error("max_attempts must be at least 1")]
    NoAttempts,

    #[error("backoff_factor must be greater than 1, got {0}")]
    FactorTooSmall(f64),
}

/// Deserialized form of [`RetryPolicy`], checked before it becomes one
#[derive(Deserialize)]
#[serde(default)]
struct RetryPolicyFields {
    max_attempts: u32,
    backoff_factor: f64,
    min_delay_ms: u64,
    max_delay_ms: u64,
    randomize: bool,
}

impl Default for RetryPolicyFields {
    fn default() -> Self {
        let policy = RetryPolicy::default();
        Self {
            max_attempts: policy.max_attempts,
            backoff_factor: policy.backoff_factor,
            min_delay_ms: policy.min_delay_ms,
            max_delay_ms: policy.max_delay_ms,
            randomize: policy.randomize,
        }
    }
}

impl TryFrom<RetryPolicyFields> for RetryPolicy {
    type Error = PolicyError;

    fn try_from(fields: RetryPolicyFields) -> Result<Self, Self::Error> {
        let policy = Self {
            max_attempts: fields.max_attempts,
            backoff_factor: fields.backoff_factor,
            min_delay_ms: fields.min_delay_ms,
            max_delay_ms: fields.max_delay_ms,
            randomize: fields.randomize,
        };
        policy.validate()?;
        Ok(policy)
    }
}

impl RetryPolicy {
    /// Sets the attempt ceiling. Zero is raised to one.
    #[must_use]
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Sets the backoff multiplier. A factor not above 1 is ignored.
    #[must_use]
    pub fn with_backoff_factor(mut self, backoff_factor: f64) -> Self {
        if backoff_factor > 1.0 {
            self.backoff_factor = backoff_factor;
        } else {
            warn!(
                "Ignoring backoff factor {}, keeping {}",
                backoff_factor, self.backoff_factor
            );
        }
        self
    }

    #[must_use]
    pub fn with_min_delay_ms(mut self, min_delay_ms: u64) -> Self {
        self.min_delay_ms = min_delay_ms;
        self
    }

    #[must_use]
    pub fn with_max_delay_ms(mut self, max_delay_ms: u64) -> Self {
        self.max_delay_ms = max_delay_ms;
        self
    }

    #[must_use]
    pub fn with_randomize(mut self, randomize: bool) -> Self {
        self.randomize = randomize;
        self
    }

    /// Checks the bounds every policy must satisfy
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.max_attempts == 0 {
            return Err(PolicyError::NoAttempts);
        }
        // also rejects NaN
        if !(self.backoff_factor > 1.0) {
            return Err(PolicyError::FactorTooSmall(self.backoff_factor));
        }
        Ok(())
    }

    /// Delay to wait after the given failed attempt (1-based)
    ///
    /// `min(min_delay * backoff_factor^(attempt - 1), max_delay)`, optionally
    /// spread by ±10% and capped again.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(i32::MAX as u32) as i32;
        let mut delay_ms = (self.min_delay_ms as f64 * self.backoff_factor.powi(exponent))
            .min(self.max_delay_ms as f64);

        if self.randomize {
            let jitter_factor = rand::random::<f64>() * 0.2 + 0.9; // 0.9-1.1 range
            delay_ms = (delay_ms * jitter_factor).min(self.max_delay_ms as f64);
        }

        Duration::from_millis(delay_ms as u64)
    }

    /// Whether another attempt is allowed after `attempt` attempts have run
    pub fn has_attempts_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }
}

/// The set of statuses that make a failure eligible for retry
///
/// `None` stands for "the failure carried no status", which is how network
/// level failures present themselves.
///
/// # Examples
///
/// ```
/// use clerk_guard::retry::RetryableStatuses;
///
/// let statuses = RetryableStatuses::default();
/// assert!(statuses.contains(None));
/// assert!(statuses.contains(Some(429)));
/// assert!(!statuses.contains(Some(404)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RetryableStatuses(BTreeSet<Option<u16>>);

impl Default for RetryableStatuses {
    fn default() -> Self {
        Self::new([None, Some(429)])
    }
}

impl RetryableStatuses {
    pub fn new(statuses: impl IntoIterator<Item = Option<u16>>) -> Self {
        Self(statuses.into_iter().collect())
    }

    /// A set that never retries
    pub fn none() -> Self {
        Self(BTreeSet::new())
    }

    #[must_use]
    pub fn with(mut self, status: Option<u16>) -> Self {
        self.0.insert(status);
        self
    }

    pub fn contains(&self, status: Option<u16>) -> bool {
        self.0.contains(&status)
    }

    pub fn iter(&self) -> impl Iterator<Item = Option<u16>> + '_ {
        self.0.iter().copied()
    }
}

/// Runs `operation` with retry and backoff, reporting to `observer`
///
/// The observer sees `input` once, then one `retryError` per retried failure,
/// then exactly one of `output` or `error`. A failure is retried only while
/// the policy has attempts left and its status is in `retryable`.
///
/// # Arguments
/// * `operation_name` - Name reported with every event
/// * `arguments` - Arguments captured by the caller, reported with `input`
/// * `operation` - Produces a fresh future for each attempt
/// * `policy` - Attempt ceiling and backoff curve
/// * `retryable` - Statuses that allow another attempt
/// * `observer` - Receiver of lifecycle events
///
/// # Returns
/// * `Result<T, E>` - The first success, or the error of the final attempt
///
/// # Examples
///
/// ```
/// use clerk_guard::error::ClerkError;
/// use clerk_guard::observer::NullObserver;
/// use clerk_guard::retry::{invoke, RetryPolicy, RetryableStatuses};
/// use serde_json::json;
///
/// # async fn example() -> Result<(), ClerkError> {
/// let value = invoke(
///     "example.answer",
///     json!([]),
///     || async { Ok::<_, ClerkError>(42) },
///     &RetryPolicy::default(),
///     &RetryableStatuses::default(),
///     &NullObserver,
/// )
/// .await?;
/// assert_eq!(value, 42);
/// # Ok(())
/// # }
/// ```
pub async fn invoke<F, Fut, T, E>(
    operation_name: &str,
    arguments: Value,
    operation: F,
    policy: &RetryPolicy,
    retryable: &RetryableStatuses,
    observer: &dyn Observer,
) -> Result<T, E>
where
    F: Fn() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    T: Serialize,
    E: Failure,
{
    observer.report_input(operation_name, &arguments);

    let mut attempt: u32 = 1;

    loop {
        match operation().await {
            Ok(value) => {
                let rendered = serde_json::to_value(&value).unwrap_or(Value::Null);
                observer.report_output(operation_name, &rendered);
                return Ok(value);
            }
            Err(err) => {
                let status = err.status();

                if !policy.has_attempts_after(attempt) || !retryable.contains(status) {
                    debug!(
                        "{} failed on attempt {}/{} with status {:?}, giving up",
                        operation_name, attempt, policy.max_attempts, status
                    );
                    observer.report_failure(operation_name, &err);
                    return Err(err);
                }

                observer.report_retry(operation_name, attempt, &err);

                let delay = policy.delay_for(attempt);
                debug!(
                    "Retry attempt {}/{} of {} after {}ms delay (status {:?})",
                    attempt,
                    policy.max_attempts,
                    operation_name,
                    delay.as_millis(),
                    status
                );

                sleep(delay).await;
                attempt += 1;
            }
        }
    }
}

/// The policy, retryable set and observer shared by every facade of a client
///
/// Cloning is cheap; all three parts are reference counted and read-only.
#[derive(Clone)]
pub struct Invoker {
    policy: Arc<RetryPolicy>,
    retryable: Arc<RetryableStatuses>,
    observer: Arc<dyn Observer>,
}

impl Invoker {
    pub fn new(
        policy: RetryPolicy,
        retryable: RetryableStatuses,
        observer: Arc<dyn Observer>,
    ) -> Self {
        Self {
            policy: Arc::new(policy),
            retryable: Arc::new(retryable),
            observer,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    pub fn retryable(&self) -> &RetryableStatuses {
        &self.retryable
    }

    pub fn observer(&self) -> &Arc<dyn Observer> {
        &self.observer
    }

    /// Runs `operation` through [`invoke`] with the shared configuration
    pub async fn call<F, Fut, T, E>(
        &self,
        operation_name: &str,
        arguments: Value,
        operation: F,
    ) -> Result<T, E>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T, E>>,
        T: Serialize,
        E: Failure,
    {
        invoke(
            operation_name,
            arguments,
            operation,
            &self.policy,
            &self.retryable,
            self.observer.as_ref(),
        )
        .await
    }
}

impl std::fmt::Debug for Invoker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Invoker")
            .field("policy", &self.policy)
            .field("retryable", &self.retryable)
            .finish_non_exhaustive()
    }
}
