//! Retry planning for a single backend route.
//!
//! Pure decision logic: given the classified failure of an attempt and how
//! many attempts were already spent, decide whether to retry immediately,
//! retry after a pause, or give up. The orchestrator owns the actual sleeping
//! and looping, which keeps this table fully unit-testable.

use std::time::Duration;

use crate::types::BackendFailure;

/// Attempt bound and delays applied to one backend route
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptPolicy {
    pub max_attempts: u32,
    pub warmup_delay: Duration,
    pub rate_limit_delay: Duration,
}

impl AttemptPolicy {
    /// Policy with the given attempt bound (clamped to at least one) and no
    /// retry delays
    pub fn new(max_attempts: u32) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            warmup_delay: Duration::ZERO,
            rate_limit_delay: Duration::ZERO,
        }
    }

    pub fn with_warmup_delay(mut self, delay: Duration) -> Self {
        self.warmup_delay = delay;
        self
    }

    pub fn with_rate_limit_delay(mut self, delay: Duration) -> Self {
        self.rate_limit_delay = delay;
        self
    }
}

/// What the orchestrator should do after a failed attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NextAction {
    RetryNow,
    RetryAfter(Duration),
    GiveUp,
}

/// Decide the next step after attempt number `attempt` (1-based) failed.
///
/// Configuration-class failures are never retried: a missing credential or a
/// disabled backend will not heal within this request.
pub fn next_action(failure: &BackendFailure, attempt: u32, policy: &AttemptPolicy) -> NextAction {
    match failure {
        BackendFailure::MissingCredentials | BackendFailure::Disabled(_) => NextAction::GiveUp,
        _ if attempt >= policy.max_attempts => NextAction::GiveUp,
        BackendFailure::WarmingUp => delay_or_now(policy.warmup_delay),
        BackendFailure::RateLimited => delay_or_now(policy.rate_limit_delay),
        BackendFailure::Placeholder { .. }
        | BackendFailure::Network(_)
        | BackendFailure::Upstream { .. }
        | BackendFailure::NotAnImage(_) => NextAction::RetryNow,
    }
}

fn delay_or_now(delay: Duration) -> NextAction {
    if delay.is_zero() {
        NextAction::RetryNow
    } else {
        NextAction::RetryAfter(delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policy() -> AttemptPolicy {
        AttemptPolicy::new(3)
            .with_warmup_delay(Duration::from_secs(5))
            .with_rate_limit_delay(Duration::ZERO)
    }

    #[test]
    fn test_retryable_failures_before_bound() {
        let p = policy();
        assert_eq!(
            next_action(&BackendFailure::RateLimited, 1, &p),
            NextAction::RetryNow
        );
        assert_eq!(
            next_action(&BackendFailure::Network("refused".into()), 2, &p),
            NextAction::RetryNow
        );
        assert_eq!(
            next_action(&BackendFailure::Placeholder { size: 12 }, 1, &p),
            NextAction::RetryNow
        );
        assert_eq!(
            next_action(
                &BackendFailure::Upstream {
                    status: 500,
                    message: "boom".into()
                },
                2,
                &p
            ),
            NextAction::RetryNow
        );
        assert_eq!(
            next_action(&BackendFailure::NotAnImage("<html>".into()), 2, &p),
            NextAction::RetryNow
        );
    }

    #[test]
    fn test_warmup_waits_before_retry() {
        assert_eq!(
            next_action(&BackendFailure::WarmingUp, 1, &policy()),
            NextAction::RetryAfter(Duration::from_secs(5))
        );
    }

    #[test]
    fn test_configured_rate_limit_delay_is_used() {
        let p = AttemptPolicy::new(3).with_rate_limit_delay(Duration::from_millis(250));
        assert_eq!(
            next_action(&BackendFailure::RateLimited, 1, &p),
            NextAction::RetryAfter(Duration::from_millis(250))
        );
    }

    #[test]
    fn test_bound_exhausts_retries() {
        let p = policy();
        assert_eq!(
            next_action(&BackendFailure::RateLimited, 3, &p),
            NextAction::GiveUp
        );
        assert_eq!(
            next_action(&BackendFailure::WarmingUp, 3, &p),
            NextAction::GiveUp
        );
        assert_eq!(
            next_action(&BackendFailure::Network("timeout".into()), 7, &p),
            NextAction::GiveUp
        );
    }

    #[test]
    fn test_configuration_failures_never_retry() {
        let p = policy();
        assert_eq!(
            next_action(&BackendFailure::MissingCredentials, 1, &p),
            NextAction::GiveUp
        );
        assert_eq!(
            next_action(&BackendFailure::Disabled("no proxy".into()), 1, &p),
            NextAction::GiveUp
        );
    }

    #[test]
    fn test_attempt_bound_clamped_to_one() {
        let p = AttemptPolicy::new(0);
        assert_eq!(p.max_attempts, 1);
        assert_eq!(
            next_action(&BackendFailure::RateLimited, 1, &p),
            NextAction::GiveUp
        );
    }
}
