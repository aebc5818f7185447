//! # Default Data Stub
//!
//! This module wraps a standard `tonic` client to perform the data service RPCs.
//!
//! ## How it works
//!
//! The [`DefaultDataStub`] drives a `tonic::client::Grpc` with the prost codec. It does not
//! retry anything: each method is exactly one attempt, and the outcome is translated into
//! a [`Status`] so the retry loops can classify it.
//!
//! * **Readiness failures** (the transport could not be used at all) become `UNAVAILABLE`.
//! * **Deadlines** from the [`CallContext`] are sent as `grpc-timeout` and also enforced
//!   locally, surfacing as `DEADLINE_EXCEEDED`.
use super::{CallContext, DataStub, ResponseStream};
use crate::{
    BoxError,
    proto::{
        longrunning::{CancelOperationRequest, GetOperationRequest, Operation},
        v2::{
            CheckAndMutateRowRequest, CheckAndMutateRowResponse, MutateRowRequest,
            MutateRowResponse, MutateRowsRequest, MutateRowsResponse, ReadRowsRequest,
            ReadRowsResponse,
        },
    },
};
use http::uri::PathAndQuery;
use http_body::Body as HttpBody;
use std::{future::Future, time::Duration};
use tonic::{
    Status,
    client::GrpcService,
    transport::{Channel, Endpoint},
};
use tonic_prost::ProstCodec;

const READ_ROWS: &str = "/tabula.v2.Tabula/ReadRows";
const MUTATE_ROW: &str = "/tabula.v2.Tabula/MutateRow";
const MUTATE_ROWS: &str = "/tabula.v2.Tabula/MutateRows";
const CHECK_AND_MUTATE_ROW: &str = "/tabula.v2.Tabula/CheckAndMutateRow";
const GET_OPERATION: &str = "/tabula.v2.Operations/GetOperation";
const CANCEL_OPERATION: &str = "/tabula.v2.Operations/CancelOperation";

/// Errors that can occur when connecting to the table service.
#[derive(Debug, thiserror::Error)]
pub enum StubConnectError {
    #[error("Invalid URL '{0}': {1}")]
    InvalidUrl(String, #[source] tonic::transport::Error),
    #[error("Failed to connect to '{0}': {1}")]
    ConnectionFailed(String, #[source] tonic::transport::Error),
}

/// Performs every data service RPC over a `tonic` service, one attempt per call.
#[derive(Debug, Clone)]
pub struct DefaultDataStub<S = Channel> {
    client: tonic::client::Grpc<S>,
}

impl DefaultDataStub<Channel> {
    /// Connects to the table service eagerly.
    ///
    /// # Arguments
    ///
    /// * `addr` - The server URI (e.g., `http://localhost:8086`).
    pub async fn connect(addr: &str) -> Result<Self, StubConnectError> {
        let channel = endpoint(addr)?
            .connect()
            .await
            .map_err(|e| StubConnectError::ConnectionFailed(addr.to_string(), e))?;

        Ok(Self::new(channel))
    }

    /// Builds a stub whose connection is only established on the first call.
    ///
    /// Connection failures then surface as `UNAVAILABLE` statuses, which the retry
    /// policies treat as transient.
    pub fn connect_lazy(addr: &str) -> Result<Self, StubConnectError> {
        Ok(Self::new(endpoint(addr)?.connect_lazy()))
    }
}

fn endpoint(addr: &str) -> Result<Endpoint, StubConnectError> {
    Endpoint::new(addr.to_string()).map_err(|e| StubConnectError::InvalidUrl(addr.to_string(), e))
}

impl<S> DefaultDataStub<S>
where
    S: GrpcService<tonic::body::Body>,
    S::Error: Into<BoxError>,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    /// Creates a stub from an existing Tonic service/channel.
    pub fn new(service: S) -> Self {
        let client = tonic::client::Grpc::new(service);
        Self { client }
    }
}

impl<S> DefaultDataStub<S>
where
    S: GrpcService<tonic::body::Body> + Clone + Send + Sync + 'static,
    S::Future: Send,
    S::Error: Into<BoxError> + Send,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    /// Clones the underlying client and waits until the transport can take a request.
    async fn ready_client(&self) -> Result<tonic::client::Grpc<S>, Status> {
        let mut client = self.client.clone();
        client.ready().await.map_err(|e| {
            let e: BoxError = e.into();
            Status::unavailable(format!("The transport was not ready: '{e}'"))
        })?;
        Ok(client)
    }

    async fn unary<Req, Res>(
        &self,
        path: &'static str,
        context: CallContext,
        message: Req,
    ) -> Result<Res, Status>
    where
        Req: prost::Message + Send + Sync + 'static,
        Res: prost::Message + Default + Send + Sync + 'static,
    {
        let timeout = context.timeout();
        let request = context.into_request(message);

        with_deadline(timeout, async move {
            let mut client = self.ready_client().await?;
            let response = client
                .unary(request, PathAndQuery::from_static(path), ProstCodec::default())
                .await?;
            Ok(response.into_inner())
        })
        .await
    }

    async fn server_streaming<Req, Res>(
        &self,
        path: &'static str,
        context: CallContext,
        message: Req,
    ) -> Result<ResponseStream<Res>, Status>
    where
        Req: prost::Message + Send + Sync + 'static,
        Res: prost::Message + Default + Send + Sync + 'static,
    {
        let timeout = context.timeout();
        let request = context.into_request(message);

        with_deadline(timeout, async move {
            let mut client = self.ready_client().await?;
            let response = client
                .server_streaming(request, PathAndQuery::from_static(path), ProstCodec::default())
                .await?;
            Ok(ResponseStream::new(response.into_inner()))
        })
        .await
    }
}

async fn with_deadline<T>(
    timeout: Option<Duration>,
    call: impl Future<Output = Result<T, Status>>,
) -> Result<T, Status> {
    match timeout {
        Some(timeout) => tokio::time::timeout(timeout, call)
            .await
            .unwrap_or_else(|_| {
                Err(Status::deadline_exceeded(
                    "Deadline expired before the call completed",
                ))
            }),
        None => call.await,
    }
}

#[tonic::async_trait]
impl<S> DataStub for DefaultDataStub<S>
where
    S: GrpcService<tonic::body::Body> + Clone + Send + Sync + 'static,
    S::Future: Send,
    S::Error: Into<BoxError> + Send,
    S::ResponseBody: HttpBody<Data = tonic::codegen::Bytes> + Send + 'static,
    <S::ResponseBody as HttpBody>::Error: Into<BoxError> + Send,
{
    async fn mutate_row(
        &self,
        context: CallContext,
        request: MutateRowRequest,
    ) -> Result<MutateRowResponse, Status> {
        self.unary(MUTATE_ROW, context, request).await
    }

    async fn mutate_rows(
        &self,
        context: CallContext,
        request: MutateRowsRequest,
    ) -> Result<ResponseStream<MutateRowsResponse>, Status> {
        self.server_streaming(MUTATE_ROWS, context, request).await
    }

    async fn read_rows(
        &self,
        context: CallContext,
        request: ReadRowsRequest,
    ) -> Result<ResponseStream<ReadRowsResponse>, Status> {
        self.server_streaming(READ_ROWS, context, request).await
    }

    async fn check_and_mutate_row(
        &self,
        context: CallContext,
        request: CheckAndMutateRowRequest,
    ) -> Result<CheckAndMutateRowResponse, Status> {
        self.unary(CHECK_AND_MUTATE_ROW, context, request).await
    }

    async fn get_operation(
        &self,
        context: CallContext,
        request: GetOperationRequest,
    ) -> Result<Operation, Status> {
        self.unary(GET_OPERATION, context, request).await
    }

    async fn cancel_operation(
        &self,
        context: CallContext,
        request: CancelOperationRequest,
    ) -> Result<(), Status> {
        self.unary(CANCEL_OPERATION, context, request).await
    }
}
