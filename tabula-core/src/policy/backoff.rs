use crate::stub::CallContext;
use std::{fmt::Debug, time::Duration};
use tonic::Status;

/// Computes the delay between two attempts of the same operation.
pub trait BackoffPolicy: Send + Sync + Debug {
    /// Returns a new instance with the same configuration and no accumulated state.
    fn clone_box(&self) -> Box<dyn BackoffPolicy>;

    /// Prepares the context of the next attempt. Most policies have nothing to add.
    fn setup(&self, _context: &mut CallContext) {}

    /// Records a completed (failed) attempt and returns how long to wait before the next one.
    fn on_completion(&mut self, status: &Status) -> Duration;
}

impl Clone for Box<dyn BackoffPolicy> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Doubles the delay after every attempt, starting at `initial_delay` and never
/// exceeding `maximum_delay`.
#[derive(Debug, Clone)]
pub struct ExponentialBackoffPolicy {
    initial_delay: Duration,
    maximum_delay: Duration,
    current_delay: Duration,
}

impl ExponentialBackoffPolicy {
    pub fn new(initial_delay: Duration, maximum_delay: Duration) -> Self {
        let initial_delay = initial_delay.min(maximum_delay);
        Self {
            initial_delay,
            maximum_delay,
            current_delay: initial_delay,
        }
    }
}

impl BackoffPolicy for ExponentialBackoffPolicy {
    fn clone_box(&self) -> Box<dyn BackoffPolicy> {
        Box::new(Self::new(self.initial_delay, self.maximum_delay))
    }

    fn on_completion(&mut self, _status: &Status) -> Duration {
        let delay = self.current_delay;
        self.current_delay = self
            .current_delay
            .saturating_mul(2)
            .min(self.maximum_delay);
        delay
    }
}
