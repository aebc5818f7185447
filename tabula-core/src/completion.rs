//! # Completion Queue & Deferred Results
//!
//! Asynchronous operations run as tasks on a [`CompletionQueue`], a handle onto the
//! background threads that drive RPC completions and backoff timers. Their result is
//! delivered through a [`Deferred`], a future that resolves exactly once.
//!
//! ## Exactly-once delivery
//!
//! A [`Promise`] and its [`Deferred`] share a single-assignment slot (a `oneshot`
//! channel). [`Promise::set_value`] consumes the promise, so a second resolution cannot be
//! written. If the promise is dropped without a value, for instance because the
//! background threads were shut down, the deferred resolves with `CANCELLED`.
//!
//! ## Cancellation
//!
//! Dropping a [`Deferred`] only stops the caller from observing the result. The task keeps
//! running and the RPCs it already issued complete normally; only the deadline set on each
//! attempt bounds them.
use futures_util::{FutureExt, future::BoxFuture};
use std::{
    future::Future,
    pin::Pin,
    sync::Arc,
    task::{Context, Poll},
};
use tokio::{
    runtime::{Builder, Handle, Runtime},
    sync::oneshot,
};
use tonic::Status;

#[derive(Debug, thiserror::Error)]
pub enum CompletionQueueError {
    #[error("Failed to start the background threads: '{0}'")]
    Runtime(#[source] std::io::Error),
    #[error("No async runtime is available on this thread: '{0}'")]
    NoRuntime(#[source] tokio::runtime::TryCurrentError),
}

/// Shuts an owned runtime down without blocking, so the queue can be dropped anywhere.
#[derive(Debug)]
struct OwnedRuntime(Option<Runtime>);

impl Drop for OwnedRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.0.take() {
            runtime.shutdown_background();
        }
    }
}

/// Handle onto the background threads used by asynchronous operations.
///
/// Clones share the same threads. The threads are stopped once the queue that created
/// them, and every clone of it, has been dropped.
#[derive(Debug, Clone)]
pub struct CompletionQueue {
    handle: Handle,
    _owned: Option<Arc<OwnedRuntime>>,
}

impl CompletionQueue {
    /// Starts `threads` dedicated background threads.
    pub fn new(threads: usize) -> Result<Self, CompletionQueueError> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(threads.max(1))
            .thread_name("tabula-cq")
            .enable_all()
            .build()
            .map_err(CompletionQueueError::Runtime)?;

        Ok(Self {
            handle: runtime.handle().clone(),
            _owned: Some(Arc::new(OwnedRuntime(Some(runtime)))),
        })
    }

    /// Uses the threads of an existing runtime.
    pub fn from_handle(handle: Handle) -> Self {
        Self {
            handle,
            _owned: None,
        }
    }

    /// Uses the runtime the calling code is running on.
    pub fn current() -> Result<Self, CompletionQueueError> {
        Handle::try_current()
            .map(Self::from_handle)
            .map_err(CompletionQueueError::NoRuntime)
    }

    pub fn handle(&self) -> &Handle {
        &self.handle
    }

    /// Schedules `operation` on the background threads.
    pub fn spawn<F, T>(&self, operation: F) -> Deferred<T>
    where
        F: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (promise, deferred) = Promise::new();
        self.handle.spawn(async move {
            promise.set_value(operation.await);
        });
        deferred
    }

    /// Runs `operation` to completion, blocking the calling thread.
    ///
    /// This drives the synchronous API. It must not be called from within an async
    /// context.
    pub fn block_on<F: Future>(&self, operation: F) -> F::Output {
        self.handle.block_on(operation)
    }
}

/// The write side of a [`Deferred`].
#[derive(Debug)]
pub struct Promise<T> {
    sender: oneshot::Sender<T>,
}

impl<T: Send + 'static> Promise<T> {
    /// Creates a connected promise/deferred pair.
    pub fn new() -> (Self, Deferred<T>) {
        let (sender, receiver) = oneshot::channel();
        let deferred = Deferred {
            inner: receiver
                .map(|result| {
                    result.map_err(|_| {
                        Status::cancelled("the operation was dropped before it completed")
                    })
                })
                .boxed(),
        };
        (Self { sender }, deferred)
    }

    /// Resolves the deferred value. Consumes the promise: there is no second resolution.
    pub fn set_value(self, value: T) {
        // The caller may have dropped the deferred; the value is then discarded.
        let _ = self.sender.send(value);
    }
}

/// A result that will be available once an asynchronous operation completes.
///
/// Resolves to `Ok(value)` with the operation's own result (which may itself be an error
/// status), or to `Err(CANCELLED)` if the operation was dropped before producing one.
#[must_use = "a deferred value does nothing unless awaited"]
pub struct Deferred<T> {
    inner: BoxFuture<'static, Result<T, Status>>,
}

impl<T: Send + 'static> Deferred<T> {
    /// A deferred value that is already resolved.
    pub fn ready(value: T) -> Self {
        Self {
            inner: futures_util::future::ready(Ok(value)).boxed(),
        }
    }

    /// Chains a transform applied to the value once it is available.
    pub fn then<U, F>(self, transform: F) -> Deferred<U>
    where
        F: FnOnce(T) -> U + Send + 'static,
        U: Send + 'static,
    {
        Deferred {
            inner: self.inner.map(|result| result.map(transform)).boxed(),
        }
    }
}

impl<T: Send + 'static> Deferred<Result<T, Status>> {
    /// Merges an operation's own error with the cancellation error.
    pub fn flatten(self) -> Deferred<T> {
        Deferred {
            inner: self.inner.map(|result| result.and_then(|value| value)).boxed(),
        }
    }
}

impl<T> Future for Deferred<T> {
    type Output = Result<T, Status>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.inner.as_mut().poll(cx)
    }
}

impl<T> std::fmt::Debug for Deferred<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Deferred").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;
    use tonic::Code;

    #[tokio::test]
    async fn resolves_once_with_the_value() {
        let (promise, deferred) = Promise::new();
        promise.set_value(42);

        assert_eq!(deferred.await.unwrap(), 42);
    }

    #[tokio::test]
    async fn dropped_promise_resolves_cancelled() {
        let (promise, deferred) = Promise::<u32>::new();
        drop(promise);

        assert_eq!(deferred.await.unwrap_err().code(), Code::Cancelled);
    }

    #[tokio::test]
    async fn then_transforms_the_value() {
        let deferred = Deferred::ready(Ok::<u32, Status>(7)).then(|r| r.map(|_| ()));
        assert!(deferred.await.unwrap().is_ok());
    }

    #[tokio::test]
    async fn flatten_surfaces_the_operation_error() {
        let deferred = Deferred::ready(Err::<u32, Status>(Status::aborted("conflict")));
        assert_eq!(deferred.flatten().await.unwrap_err().code(), Code::Aborted);
    }

    #[tokio::test]
    async fn spawned_work_completes_after_the_deferred_is_dropped() {
        let cq = CompletionQueue::current().unwrap();
        let (done_promise, done) = Promise::new();

        let deferred = cq.spawn(async move {
            tokio::time::sleep(Duration::from_millis(5)).await;
            done_promise.set_value(());
        });
        drop(deferred);

        done.await.unwrap();
    }

    #[test]
    fn owned_queue_runs_blocking_and_async_work() {
        let cq = CompletionQueue::new(2).unwrap();

        assert_eq!(cq.block_on(async { 1 + 1 }), 2);

        let deferred = cq.spawn(async { "from the background" });
        assert_eq!(cq.block_on(deferred).unwrap(), "from the background");
    }

    #[test]
    fn current_fails_outside_a_runtime() {
        assert!(matches!(
            CompletionQueue::current(),
            Err(CompletionQueueError::NoRuntime(_))
        ));
    }
}
