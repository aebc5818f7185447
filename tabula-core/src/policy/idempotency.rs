use crate::{
    mutation::SERVER_SET_TIMESTAMP,
    proto::v2::{CheckAndMutateRowRequest, Mutation, mutation},
};
use std::fmt::Debug;

/// Classifies whether sending a mutation (or a whole request) twice is safe.
///
/// A request that failed with an ambiguous status may or may not have been applied; only
/// idempotent requests are ever sent again.
pub trait IdempotencyPolicy: Send + Sync + Debug {
    fn clone_box(&self) -> Box<dyn IdempotencyPolicy>;

    fn is_idempotent_mutation(&self, mutation: &Mutation) -> bool;

    fn is_idempotent_check_and_mutate(&self, request: &CheckAndMutateRowRequest) -> bool;

    /// A set of mutations is idempotent only if every one of them is.
    fn are_idempotent(&self, mutations: &[Mutation]) -> bool {
        mutations.iter().all(|m| self.is_idempotent_mutation(m))
    }
}

impl Clone for Box<dyn IdempotencyPolicy> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// Only retries mutations whose outcome does not depend on when they are applied.
///
/// * A set-cell with a server-assigned timestamp writes a new version on every replay,
///   so it is not idempotent.
/// * Conditional mutations are never idempotent: the first attempt may have changed the
///   outcome of the predicate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SafeIdempotentMutationPolicy;

impl IdempotencyPolicy for SafeIdempotentMutationPolicy {
    fn clone_box(&self) -> Box<dyn IdempotencyPolicy> {
        Box::new(*self)
    }

    fn is_idempotent_mutation(&self, mutation: &Mutation) -> bool {
        match &mutation.mutation {
            Some(mutation::Mutation::SetCell(set_cell)) => {
                set_cell.timestamp_micros != SERVER_SET_TIMESTAMP
            }
            _ => true,
        }
    }

    fn is_idempotent_check_and_mutate(&self, _request: &CheckAndMutateRowRequest) -> bool {
        false
    }
}

/// Treats every mutation as safe to replay.
///
/// Useful when the application tolerates duplicated cell versions.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysRetryMutationPolicy;

impl IdempotencyPolicy for AlwaysRetryMutationPolicy {
    fn clone_box(&self) -> Box<dyn IdempotencyPolicy> {
        Box::new(*self)
    }

    fn is_idempotent_mutation(&self, _mutation: &Mutation) -> bool {
        true
    }

    fn is_idempotent_check_and_mutate(&self, _request: &CheckAndMutateRowRequest) -> bool {
        true
    }
}
