//! # Data Stub
//!
//! The stub is the seam between the retry engine and the transport. [`DataStub`] exposes
//! one method per RPC of the `tabula.v2` data service; the retry loops in
//! [`crate::table`] only ever talk to this trait, which keeps them independent of the
//! transport and lets tests script failures with an in-memory implementation.
//!
//! ## Implementations
//!
//! * **[`DefaultDataStub`]**: wraps a `tonic` service (usually a
//!   [`tonic::transport::Channel`]) and performs the real calls.
//! * **[`LoggingDataStub`]**: a decorator that logs every call and its outcome through
//!   `tracing` before delegating to the wrapped stub.
//!
//! ## Calling convention
//!
//! * Unary methods return `Result<Response, Status>`.
//! * Server-streaming methods return a [`ResponseStream`] once the call has been accepted;
//!   failures after that point are delivered through [`ResponseStream::message`].
//! * Every call receives a [`CallContext`] prepared by the policies before the attempt.
pub mod default;
pub mod logging;

pub use default::{DefaultDataStub, StubConnectError};
pub use logging::LoggingDataStub;

use crate::proto::{
    longrunning::{CancelOperationRequest, GetOperationRequest, Operation},
    v2::{
        CheckAndMutateRowRequest, CheckAndMutateRowResponse, MutateRowRequest,
        MutateRowResponse, MutateRowsRequest, MutateRowsResponse, ReadRowsRequest,
        ReadRowsResponse,
    },
};
use futures_util::{Stream, StreamExt, stream::BoxStream};
use std::{fmt, sync::Arc, time::Duration};
use tonic::{Status, metadata::MetadataMap};

/// Per-attempt call settings: the deadline and the metadata (headers) sent with the request.
///
/// A fresh context is built for every attempt. The retry policy, the backoff policy and
/// the metadata policy each get a chance to modify it before the RPC is issued.
#[derive(Debug, Clone, Default)]
pub struct CallContext {
    timeout: Option<Duration>,
    metadata: MetadataMap,
}

impl CallContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time budget of this attempt, if any policy set one.
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Sets the attempt deadline. When called more than once the tightest value wins.
    pub fn set_timeout(&mut self, timeout: Duration) {
        self.timeout = Some(match self.timeout {
            Some(current) => current.min(timeout),
            None => timeout,
        });
    }

    pub fn metadata(&self) -> &MetadataMap {
        &self.metadata
    }

    pub fn metadata_mut(&mut self) -> &mut MetadataMap {
        &mut self.metadata
    }

    /// Wraps `message` in a `tonic::Request` carrying this context's metadata and deadline.
    pub fn into_request<T>(self, message: T) -> tonic::Request<T> {
        let mut request = tonic::Request::new(message);
        *request.metadata_mut() = self.metadata;
        if let Some(timeout) = self.timeout {
            request.set_timeout(timeout);
        }
        request
    }
}

/// Pull-based handle over the responses of a server-streaming call.
pub struct ResponseStream<T> {
    inner: BoxStream<'static, Result<T, Status>>,
}

impl<T> ResponseStream<T> {
    pub fn new(stream: impl Stream<Item = Result<T, Status>> + Send + 'static) -> Self {
        Self {
            inner: stream.boxed(),
        }
    }

    /// Fetches the next message.
    ///
    /// # Returns
    ///
    /// * `Ok(Some(message))` - The server sent another message.
    /// * `Ok(None)` - The stream ended cleanly.
    /// * `Err(Status)` - The stream broke; no more messages will follow.
    pub async fn message(&mut self) -> Result<Option<T>, Status> {
        self.inner.next().await.transpose()
    }
}

impl<T> fmt::Debug for ResponseStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseStream").finish_non_exhaustive()
    }
}

/// One method per RPC of the data service.
#[tonic::async_trait]
pub trait DataStub: Send + Sync {
    async fn mutate_row(
        &self,
        context: CallContext,
        request: MutateRowRequest,
    ) -> Result<MutateRowResponse, Status>;

    async fn mutate_rows(
        &self,
        context: CallContext,
        request: MutateRowsRequest,
    ) -> Result<ResponseStream<MutateRowsResponse>, Status>;

    async fn read_rows(
        &self,
        context: CallContext,
        request: ReadRowsRequest,
    ) -> Result<ResponseStream<ReadRowsResponse>, Status>;

    async fn check_and_mutate_row(
        &self,
        context: CallContext,
        request: CheckAndMutateRowRequest,
    ) -> Result<CheckAndMutateRowResponse, Status>;

    /// Polls a long-running operation. Stubs without operation support keep the default.
    async fn get_operation(
        &self,
        _context: CallContext,
        _request: GetOperationRequest,
    ) -> Result<Operation, Status> {
        Err(Status::unimplemented(
            "long-running operations are not supported by this stub",
        ))
    }

    /// Requests cancellation of a long-running operation.
    async fn cancel_operation(
        &self,
        _context: CallContext,
        _request: CancelOperationRequest,
    ) -> Result<(), Status> {
        Err(Status::unimplemented(
            "long-running operations are not supported by this stub",
        ))
    }
}

/// Shared stubs forward every call, so a table can hold an `Arc<dyn DataStub>`.
#[tonic::async_trait]
impl<T> DataStub for Arc<T>
where
    T: DataStub + ?Sized,
{
    async fn mutate_row(
        &self,
        context: CallContext,
        request: MutateRowRequest,
    ) -> Result<MutateRowResponse, Status> {
        (**self).mutate_row(context, request).await
    }

    async fn mutate_rows(
        &self,
        context: CallContext,
        request: MutateRowsRequest,
    ) -> Result<ResponseStream<MutateRowsResponse>, Status> {
        (**self).mutate_rows(context, request).await
    }

    async fn read_rows(
        &self,
        context: CallContext,
        request: ReadRowsRequest,
    ) -> Result<ResponseStream<ReadRowsResponse>, Status> {
        (**self).read_rows(context, request).await
    }

    async fn check_and_mutate_row(
        &self,
        context: CallContext,
        request: CheckAndMutateRowRequest,
    ) -> Result<CheckAndMutateRowResponse, Status> {
        (**self).check_and_mutate_row(context, request).await
    }

    async fn get_operation(
        &self,
        context: CallContext,
        request: GetOperationRequest,
    ) -> Result<Operation, Status> {
        (**self).get_operation(context, request).await
    }

    async fn cancel_operation(
        &self,
        context: CallContext,
        request: CancelOperationRequest,
    ) -> Result<(), Status> {
        (**self).cancel_operation(context, request).await
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn tightest_timeout_wins() {
        let mut context = CallContext::new();
        assert_eq!(context.timeout(), None);

        context.set_timeout(Duration::from_secs(30));
        context.set_timeout(Duration::from_secs(5));
        context.set_timeout(Duration::from_secs(60));

        assert_eq!(context.timeout(), Some(Duration::from_secs(5)));
    }

    #[test]
    fn request_carries_metadata_and_deadline() {
        let mut context = CallContext::new();
        context.set_timeout(Duration::from_millis(250));
        context
            .metadata_mut()
            .insert("x-goog-request-params", "table_name=t".parse().unwrap());

        let request = context.into_request(());

        assert_eq!(
            request.metadata().get("x-goog-request-params").unwrap(),
            "table_name=t"
        );
        assert!(request.metadata().get("grpc-timeout").is_some());
    }

    #[tokio::test]
    async fn response_stream_yields_messages_then_end() {
        let mut stream = ResponseStream::new(tokio_stream::iter(vec![Ok(1), Ok(2)]));

        assert_eq!(stream.message().await.unwrap(), Some(1));
        assert_eq!(stream.message().await.unwrap(), Some(2));
        assert_eq!(stream.message().await.unwrap(), None);
    }

    #[tokio::test]
    async fn response_stream_surfaces_errors() {
        let mut stream = ResponseStream::new(tokio_stream::iter(vec![
            Ok(1),
            Err(Status::unavailable("reset")),
        ]));

        assert_eq!(stream.message().await.unwrap(), Some(1));
        let err = stream.message().await.unwrap_err();
        assert_eq!(err.code(), tonic::Code::Unavailable);
    }
}
