//! Retry loop shared by the single-request operations (`MutateRow`, `CheckAndMutateRow`).
use crate::{policy::OperationPolicies, status::make_permanent, stub::CallContext};
use std::future::Future;
use tonic::Status;

/// Issues `call` until it succeeds, the request turns out to be unsafe to replay, or the
/// retry policy gives up.
///
/// A non-idempotent request is attempted exactly once. Every failure that ends the loop is
/// reported through [`make_permanent`], keeping the code of the last attempt.
pub(crate) async fn retry_unary<T, F, Fut>(
    mut policies: OperationPolicies,
    idempotent: bool,
    operation: &'static str,
    mut call: F,
) -> Result<T, Status>
where
    F: FnMut(CallContext) -> Fut,
    Fut: Future<Output = Result<T, Status>>,
{
    let mut attempt: u32 = 0;
    loop {
        attempt += 1;
        let status = match call(policies.call_context()).await {
            Ok(response) => return Ok(response),
            Err(status) => status,
        };

        if !idempotent || !policies.retry.on_failure(&status) {
            tracing::warn!(
                attempt,
                idempotent,
                code = ?status.code(),
                error = status.message(),
                "{operation} failed"
            );
            return Err(make_permanent(&status, operation));
        }

        let delay = policies.backoff.on_completion(&status);
        tracing::debug!(
            attempt,
            ?delay,
            code = ?status.code(),
            "{operation} attempt failed, retrying"
        );
        tokio::time::sleep(delay).await;
    }
}
