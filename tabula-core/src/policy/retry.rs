use crate::{status::is_transient, stub::CallContext};
use std::{fmt::Debug, time::Duration};
use tokio::time::Instant;
use tonic::Status;

/// Decides whether an operation may issue another attempt after a failure.
pub trait RetryPolicy: Send + Sync + Debug {
    /// Returns a new instance with the same configuration and no accumulated state.
    fn clone_box(&self) -> Box<dyn RetryPolicy>;

    /// Prepares the context of the next attempt, typically by setting its deadline.
    fn setup(&self, context: &mut CallContext);

    /// Records a failure and returns `true` if the caller may try again.
    ///
    /// Permanent failures always return `false` and do not consume any budget.
    fn on_failure(&mut self, status: &Status) -> bool;

    /// Returns `true` if no retry policy could ever make this failure succeed.
    fn is_permanent_failure(&self, status: &Status) -> bool {
        !is_transient(status.code())
    }
}

impl Clone for Box<dyn RetryPolicy> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Gives up once `maximum_failures` transient failures have been observed.
///
/// The bound is therefore the total number of attempts an operation makes when every
/// attempt fails transiently.
#[derive(Debug, Clone)]
pub struct LimitedErrorCountRetryPolicy {
    maximum_failures: u32,
    failure_count: u32,
    attempt_timeout: Option<Duration>,
}

impl LimitedErrorCountRetryPolicy {
    pub fn new(maximum_failures: u32) -> Self {
        Self {
            maximum_failures,
            failure_count: 0,
            attempt_timeout: None,
        }
    }

    /// Sets a deadline applied to each individual attempt.
    pub fn with_attempt_timeout(mut self, timeout: Duration) -> Self {
        self.attempt_timeout = Some(timeout);
        self
    }

    pub fn failure_count(&self) -> u32 {
        self.failure_count
    }
}

impl RetryPolicy for LimitedErrorCountRetryPolicy {
    fn clone_box(&self) -> Box<dyn RetryPolicy> {
        Box::new(Self {
            failure_count: 0,
            ..self.clone()
        })
    }

    fn setup(&self, context: &mut CallContext) {
        if let Some(timeout) = self.attempt_timeout {
            context.set_timeout(timeout);
        }
    }

    fn on_failure(&mut self, status: &Status) -> bool {
        if self.is_permanent_failure(status) {
            return false;
        }
        self.failure_count += 1;
        self.failure_count < self.maximum_failures
    }
}

/// Allows retries until `maximum_duration` has elapsed since the policy was created.
///
/// Each attempt's deadline is capped at the time left, so a single slow attempt cannot
/// outlive the operation.
#[derive(Debug, Clone)]
pub struct LimitedTimeRetryPolicy {
    maximum_duration: Duration,
    deadline: Instant,
}

impl LimitedTimeRetryPolicy {
    pub fn new(maximum_duration: Duration) -> Self {
        Self {
            maximum_duration,
            deadline: Instant::now() + maximum_duration,
        }
    }

    pub fn maximum_duration(&self) -> Duration {
        self.maximum_duration
    }
}

impl RetryPolicy for LimitedTimeRetryPolicy {
    fn clone_box(&self) -> Box<dyn RetryPolicy> {
        Box::new(Self::new(self.maximum_duration))
    }

    fn setup(&self, context: &mut CallContext) {
        context.set_timeout(self.deadline.saturating_duration_since(Instant::now()));
    }

    fn on_failure(&mut self, status: &Status) -> bool {
        if self.is_permanent_failure(status) {
            return false;
        }
        Instant::now() < self.deadline
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn error_count_bound_is_the_number_of_attempts() {
        let mut policy = LimitedErrorCountRetryPolicy::new(3);
        let unavailable = Status::unavailable("try again");

        assert!(policy.on_failure(&unavailable));
        assert!(policy.on_failure(&unavailable));
        assert!(!policy.on_failure(&unavailable));
        assert_eq!(policy.failure_count(), 3);
    }

    #[test]
    fn permanent_failures_do_not_consume_budget() {
        let mut policy = LimitedErrorCountRetryPolicy::new(2);

        assert!(!policy.on_failure(&Status::permission_denied("nope")));
        assert_eq!(policy.failure_count(), 0);
        assert!(policy.on_failure(&Status::aborted("conflict")));
    }

    #[test]
    fn error_count_clones_are_independent() {
        let mut original = LimitedErrorCountRetryPolicy::new(2);
        let unavailable = Status::unavailable("try again");

        let mut clone = original.clone_box();
        assert!(clone.on_failure(&unavailable));
        assert!(!clone.on_failure(&unavailable));

        // The original saw none of the clone's failures.
        assert_eq!(original.failure_count(), 0);
        assert!(original.on_failure(&unavailable));

        // A clone of a used policy starts from scratch.
        let mut fresh = original.clone_box();
        assert!(fresh.on_failure(&unavailable));
    }

    #[test]
    fn attempt_timeout_is_applied() {
        let policy =
            LimitedErrorCountRetryPolicy::new(3).with_attempt_timeout(Duration::from_secs(2));
        let mut context = CallContext::new();

        policy.setup(&mut context);
        assert_eq!(context.timeout(), Some(Duration::from_secs(2)));
    }

    #[tokio::test(start_paused = true)]
    async fn time_limit_expires() {
        let mut policy = LimitedTimeRetryPolicy::new(Duration::from_secs(10));
        let unavailable = Status::unavailable("try again");

        assert!(policy.on_failure(&unavailable));
        tokio::time::advance(Duration::from_secs(11)).await;
        assert!(!policy.on_failure(&unavailable));
    }

    #[tokio::test(start_paused = true)]
    async fn time_limit_caps_attempt_deadline() {
        let policy = LimitedTimeRetryPolicy::new(Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(4)).await;

        let mut context = CallContext::new();
        policy.setup(&mut context);
        assert_eq!(context.timeout(), Some(Duration::from_secs(6)));
    }

    #[tokio::test(start_paused = true)]
    async fn time_limit_clones_restart_the_clock() {
        let original = LimitedTimeRetryPolicy::new(Duration::from_secs(10));
        tokio::time::advance(Duration::from_secs(11)).await;

        let mut clone = original.clone_box();
        assert!(clone.on_failure(&Status::unavailable("try again")));
        assert!(!clone.on_failure(&Status::invalid_argument("bad request")));
    }
}
