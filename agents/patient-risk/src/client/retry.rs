//! Retry policy for patient API requests
//!
//! Rate limiting and server failure are budgeted separately:
//!
//! - HTTP 429 draws on `max_rate_limit_retries` and waits
//!   `rate_limit_backoff * n` before retry `n`. It never touches the general
//!   budget, so a burst of 429s cannot starve server-error retries.
//! - HTTP 500/502/503 draw on `max_retries` and wait `server_backoff * n`,
//!   where `n` is the number of general retries already used (so the first
//!   retry is immediate).
//! - Any other status and network failures draw on `max_retries` and retry
//!   without waiting.
//! - Any non-429 outcome resets the rate-limit counter.
//!
//! [`RetryPolicy::decide`] is a pure state transition; [`RetryExecutor`] owns
//! the sleeping and the I/O.

use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use super::{AttemptError, ClientError};
use crate::config::RetryConfig;
use crate::telemetry::AssessmentMetrics;

/// What one attempt of a logical request produced
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttemptOutcome {
    /// 2xx response
    Success,
    /// Any non-2xx HTTP status
    Status(u16),
    /// No response at all (connect error, timeout, broken body)
    NoStatus,
}

impl AttemptOutcome {
    pub fn from_status(status: u16) -> Self {
        if (200..300).contains(&status) {
            AttemptOutcome::Success
        } else {
            AttemptOutcome::Status(status)
        }
    }
}

/// Which budget a retry was charged to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RetryReason {
    RateLimited,
    ServerError,
    Transient,
}

impl RetryReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RetryReason::RateLimited => "rate_limited",
            RetryReason::ServerError => "server_error",
            RetryReason::Transient => "transient",
        }
    }
}

impl fmt::Display for RetryReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Budget that ran out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exhausted {
    RateLimit,
    ServerError { status: u16 },
    Transient,
}

/// Result of applying the policy to one outcome
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryDecision {
    /// The request succeeded
    Done,
    /// Wait `delay`, then send the request again
    Retry { delay: Duration, reason: RetryReason },
    /// Stop retrying
    GiveUp(Exhausted),
}

/// Counters for one logical request. Start a fresh one per request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RetryState {
    attempt: u32,
    rate_limit_attempts: u32,
}

impl RetryState {
    pub fn new() -> Self {
        Self::default()
    }

    /// General retries consumed so far
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Consecutive 429 responses seen so far
    pub fn rate_limit_attempts(&self) -> u32 {
        self.rate_limit_attempts
    }
}

/// Pure two-counter retry policy
#[derive(Debug, Clone, Default)]
pub struct RetryPolicy {
    config: RetryConfig,
}

impl RetryPolicy {
    pub fn new(config: RetryConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Advance `state` for `outcome` and say what to do next
    pub fn decide(&self, state: &mut RetryState, outcome: &AttemptOutcome) -> RetryDecision {
        match *outcome {
            AttemptOutcome::Success => RetryDecision::Done,
            AttemptOutcome::Status(429) => {
                state.rate_limit_attempts += 1;
                if state.rate_limit_attempts > self.config.max_rate_limit_retries {
                    return RetryDecision::GiveUp(Exhausted::RateLimit);
                }
                RetryDecision::Retry {
                    delay: scaled(self.config.rate_limit_backoff_ms, state.rate_limit_attempts),
                    reason: RetryReason::RateLimited,
                }
            }
            AttemptOutcome::Status(status @ (500 | 502 | 503)) => {
                state.rate_limit_attempts = 0;
                if state.attempt >= self.config.max_retries {
                    return RetryDecision::GiveUp(Exhausted::ServerError { status });
                }
                let delay = scaled(self.config.server_backoff_ms, state.attempt);
                state.attempt += 1;
                RetryDecision::Retry {
                    delay,
                    reason: RetryReason::ServerError,
                }
            }
            AttemptOutcome::Status(_) | AttemptOutcome::NoStatus => {
                state.rate_limit_attempts = 0;
                if state.attempt >= self.config.max_retries {
                    return RetryDecision::GiveUp(Exhausted::Transient);
                }
                state.attempt += 1;
                RetryDecision::Retry {
                    delay: Duration::ZERO,
                    reason: RetryReason::Transient,
                }
            }
        }
    }
}

fn scaled(base_ms: u64, factor: u32) -> Duration {
    Duration::from_millis(base_ms.saturating_mul(u64::from(factor)))
}

fn exhausted_error(exhausted: Exhausted, state: &RetryState, message: String) -> ClientError {
    match exhausted {
        Exhausted::RateLimit => ClientError::RateLimitExceeded {
            attempts: state.rate_limit_attempts(),
            message,
        },
        Exhausted::ServerError { status } => ClientError::ServerErrorExhausted {
            status,
            attempts: state.attempt(),
            message,
        },
        Exhausted::Transient => ClientError::TransientRequestError {
            attempts: state.attempt(),
            message,
        },
    }
}

/// Drives a [`RetryPolicy`] around an async request
#[derive(Clone, Default)]
pub struct RetryExecutor {
    policy: RetryPolicy,
    metrics: Option<Arc<AssessmentMetrics>>,
}

impl RetryExecutor {
    pub fn new(policy: RetryPolicy) -> Self {
        Self {
            policy,
            metrics: None,
        }
    }

    /// Record retries and request results on `metrics`
    pub fn with_metrics(mut self, metrics: Arc<AssessmentMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Run `send` until it succeeds or a budget is exhausted.
    ///
    /// `request` names the logical request in logs and metrics. Each call
    /// starts from a fresh [`RetryState`].
    pub async fn execute<T, F, Fut>(&self, request: &str, mut send: F) -> Result<T, ClientError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, AttemptError>>,
    {
        let mut state = RetryState::new();

        loop {
            let result = send().await;
            let outcome = match &result {
                Ok(_) => AttemptOutcome::Success,
                Err(err) => err.outcome(),
            };

            match self.policy.decide(&mut state, &outcome) {
                RetryDecision::Done => {
                    self.record_request(request, "success");
                    return result.map_err(|err| ClientError::TransientRequestError {
                        attempts: state.attempt(),
                        message: err.to_string(),
                    });
                }
                RetryDecision::Retry { delay, reason } => {
                    let error = result.err().map(|err| err.to_string()).unwrap_or_default();
                    tracing::warn!(
                        request,
                        reason = %reason,
                        attempt = state.attempt(),
                        rate_limit_attempts = state.rate_limit_attempts(),
                        delay_ms = delay.as_millis() as u64,
                        error = %error,
                        "Retrying request"
                    );
                    if let Some(metrics) = &self.metrics {
                        metrics.record_retry(reason.as_str());
                    }
                    sleep(delay).await;
                }
                RetryDecision::GiveUp(exhausted) => {
                    let message = result.err().map(|err| err.to_string()).unwrap_or_default();
                    self.record_request(request, "failure");
                    let error = exhausted_error(exhausted, &state, message);
                    tracing::warn!(request, error = %error, "Giving up on request");
                    return Err(error);
                }
            }
        }
    }

    fn record_request(&self, request: &str, result: &str) {
        if let Some(metrics) = &self.metrics {
            metrics.record_request(request, result);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn policy() -> RetryPolicy {
        RetryPolicy::new(RetryConfig::default())
    }

    fn fast_policy() -> RetryPolicy {
        RetryPolicy::new(RetryConfig {
            rate_limit_backoff_ms: 1,
            server_backoff_ms: 1,
            ..RetryConfig::default()
        })
    }

    fn status_error(status: u16) -> AttemptError {
        AttemptError::Status {
            status,
            message: format!("status {}", status),
        }
    }

    #[test]
    fn test_success_is_terminal() {
        let mut state = RetryState::new();
        assert_eq!(policy().decide(&mut state, &AttemptOutcome::Success), RetryDecision::Done);
        assert_eq!(state, RetryState::new());
    }

    #[test]
    fn test_from_status() {
        assert_eq!(AttemptOutcome::from_status(200), AttemptOutcome::Success);
        assert_eq!(AttemptOutcome::from_status(204), AttemptOutcome::Success);
        assert_eq!(AttemptOutcome::from_status(429), AttemptOutcome::Status(429));
    }

    #[test]
    fn test_rate_limit_backoff_is_linear() {
        let policy = policy();
        let mut state = RetryState::new();

        for n in 1..=8u64 {
            let decision = policy.decide(&mut state, &AttemptOutcome::Status(429));
            assert_eq!(
                decision,
                RetryDecision::Retry {
                    delay: Duration::from_millis(3000 * n),
                    reason: RetryReason::RateLimited,
                }
            );
        }
        assert_eq!(state.attempt(), 0);

        let decision = policy.decide(&mut state, &AttemptOutcome::Status(429));
        assert_eq!(decision, RetryDecision::GiveUp(Exhausted::RateLimit));
        assert_eq!(state.rate_limit_attempts(), 9);
    }

    #[test]
    fn test_server_errors_use_general_budget() {
        let policy = policy();
        let mut state = RetryState::new();

        for (n, status) in [(0u64, 500), (1, 502), (2, 503)] {
            let decision = policy.decide(&mut state, &AttemptOutcome::Status(status));
            assert_eq!(
                decision,
                RetryDecision::Retry {
                    delay: Duration::from_millis(1000 * n),
                    reason: RetryReason::ServerError,
                }
            );
        }

        let decision = policy.decide(&mut state, &AttemptOutcome::Status(503));
        assert_eq!(decision, RetryDecision::GiveUp(Exhausted::ServerError { status: 503 }));
        assert_eq!(state.attempt(), 3);
    }

    #[test]
    fn test_other_failures_are_retried_permissively() {
        let policy = policy();
        let mut state = RetryState::new();

        for outcome in [
            AttemptOutcome::NoStatus,
            AttemptOutcome::Status(404),
            AttemptOutcome::Status(401),
        ] {
            assert_eq!(
                policy.decide(&mut state, &outcome),
                RetryDecision::Retry {
                    delay: Duration::ZERO,
                    reason: RetryReason::Transient,
                }
            );
        }
        assert_eq!(state.attempt(), 3);

        assert_eq!(
            policy.decide(&mut state, &AttemptOutcome::NoStatus),
            RetryDecision::GiveUp(Exhausted::Transient)
        );
    }

    #[test]
    fn test_non_429_resets_rate_limit_counter() {
        let policy = policy();
        let mut state = RetryState::new();

        policy.decide(&mut state, &AttemptOutcome::Status(429));
        policy.decide(&mut state, &AttemptOutcome::Status(429));
        assert_eq!(state.rate_limit_attempts(), 2);

        policy.decide(&mut state, &AttemptOutcome::Status(500));
        assert_eq!(state.rate_limit_attempts(), 0);
        assert_eq!(state.attempt(), 1);

        let decision = policy.decide(&mut state, &AttemptOutcome::Status(429));
        assert_eq!(
            decision,
            RetryDecision::Retry {
                delay: Duration::from_millis(3000),
                reason: RetryReason::RateLimited,
            }
        );
    }

    #[test]
    fn test_budgets_are_never_exceeded() {
        let policy = RetryPolicy::new(RetryConfig {
            max_retries: 2,
            max_rate_limit_retries: 3,
            ..RetryConfig::default()
        });
        let outcomes = [
            AttemptOutcome::Status(429),
            AttemptOutcome::Status(500),
            AttemptOutcome::NoStatus,
            AttemptOutcome::Status(429),
            AttemptOutcome::Status(418),
        ];

        let mut state = RetryState::new();
        let mut retries = 0;
        for outcome in outcomes.iter().cycle().take(50) {
            match policy.decide(&mut state, outcome) {
                RetryDecision::Retry { .. } => retries += 1,
                RetryDecision::GiveUp(_) => break,
                RetryDecision::Done => unreachable!(),
            }
            assert!(state.attempt() <= 2);
            assert!(state.rate_limit_attempts() <= 4);
        }
        assert!(retries <= 2 + 3 * 3);
    }

    #[test]
    fn test_executor_first_try() {
        let executor = RetryExecutor::default();
        let result = tokio_test::block_on(executor.execute("test", || async { Ok::<_, AttemptError>(7) }));
        assert_eq!(tokio_test::assert_ok!(result), 7);
    }

    #[tokio::test]
    async fn test_executor_rate_limit_then_success() {
        let executor = RetryExecutor::new(fast_policy());
        let calls = AtomicU32::new(0);

        let result = executor
            .execute("test", || {
                let call = calls.fetch_add(1, Ordering::SeqCst);
                async move {
                    if call == 0 {
                        Err(status_error(429))
                    } else {
                        Ok("payload")
                    }
                }
            })
            .await;

        assert_eq!(result.unwrap(), "payload");
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_executor_server_error_exhaustion() {
        let executor = RetryExecutor::new(fast_policy());
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = executor
            .execute("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(status_error(502)) }
            })
            .await;

        match result.unwrap_err() {
            ClientError::ServerErrorExhausted {
                status, attempts, ..
            } => {
                assert_eq!(status, 502);
                assert_eq!(attempts, 3);
            }
            other => panic!("unexpected error: {other}"),
        }
        // One initial attempt plus three retries
        assert_eq!(calls.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_executor_rate_limit_exhaustion() {
        let executor = RetryExecutor::new(RetryPolicy::new(RetryConfig {
            max_rate_limit_retries: 2,
            rate_limit_backoff_ms: 1,
            server_backoff_ms: 1,
            ..RetryConfig::default()
        }));
        let calls = AtomicU32::new(0);

        let result: Result<(), _> = executor
            .execute("test", || {
                calls.fetch_add(1, Ordering::SeqCst);
                async { Err(status_error(429)) }
            })
            .await;

        assert!(matches!(
            result.unwrap_err(),
            ClientError::RateLimitExceeded { attempts: 3, .. }
        ));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_executor_network_errors() {
        let executor = RetryExecutor::new(fast_policy());

        let result: Result<(), _> = executor
            .execute("test", || async {
                Err(AttemptError::Network("connection refused".to_string()))
            })
            .await;

        let err = result.unwrap_err();
        assert!(matches!(err, ClientError::TransientRequestError { attempts: 3, .. }));
        assert!(err.to_string().contains("connection refused"));
    }
}
