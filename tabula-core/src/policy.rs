//! # Policies
//!
//! Strategies that govern how an operation behaves when attempts fail:
//!
//! * **[`RetryPolicy`]**: decides whether another attempt is allowed after a failure.
//! * **[`BackoffPolicy`]**: decides how long to wait before that attempt.
//! * **[`IdempotencyPolicy`]**: decides whether replaying a mutation is safe at all.
//! * **[`MetadataUpdatePolicy`]**: attaches the routing headers to every attempt.
//!
//! Retry and backoff policies are stateful (they count failures or track elapsed time),
//! so the table keeps one *prototype* of each and every logical operation starts from its
//! own [`clone_box`](RetryPolicy::clone_box). Clones never share state: two concurrent
//! operations cannot consume each other's retry budget.
pub mod backoff;
pub mod idempotency;
pub mod metadata;
pub mod retry;

pub use backoff::{BackoffPolicy, ExponentialBackoffPolicy};
pub use idempotency::{AlwaysRetryMutationPolicy, IdempotencyPolicy, SafeIdempotentMutationPolicy};
pub use metadata::{MetadataError, MetadataUpdatePolicy};
pub use retry::{LimitedErrorCountRetryPolicy, LimitedTimeRetryPolicy, RetryPolicy};

/// Fresh policy instances for one logical operation.
#[derive(Debug)]
pub(crate) struct OperationPolicies {
    pub retry: Box<dyn RetryPolicy>,
    pub backoff: Box<dyn BackoffPolicy>,
    pub idempotency: Box<dyn IdempotencyPolicy>,
    pub metadata: MetadataUpdatePolicy,
}

impl OperationPolicies {
    /// Builds the per-attempt context: each policy gets to set its deadline or headers.
    pub fn call_context(&self) -> crate::stub::CallContext {
        let mut context = crate::stub::CallContext::new();
        self.retry.setup(&mut context);
        self.backoff.setup(&mut context);
        self.metadata.setup(&mut context);
        context
    }
}
