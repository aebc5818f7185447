//! # Logging Decorator
//!
//! [`LoggingDataStub`] logs each RPC (a short request summary, then the resulting status)
//! and delegates to the wrapped stub. It is installed by [`crate::table::Table::new`] when
//! the `"rpc"` tracing component is enabled in [`crate::table::TableOptions`].
use super::{CallContext, DataStub, ResponseStream};
use crate::proto::{
    longrunning::{CancelOperationRequest, GetOperationRequest, Operation},
    v2::{
        CheckAndMutateRowRequest, CheckAndMutateRowResponse, MutateRowRequest, MutateRowResponse,
        MutateRowsRequest, MutateRowsResponse, ReadRowsRequest, ReadRowsResponse,
    },
};
use std::fmt::Debug;
use tonic::Status;

#[derive(Debug, Clone)]
pub struct LoggingDataStub<S> {
    inner: S,
}

impl<S> LoggingDataStub<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

fn log_outcome<T>(rpc: &'static str, result: Result<T, Status>) -> Result<T, Status> {
    match &result {
        Ok(_) => tracing::debug!(rpc, "rpc succeeded"),
        Err(status) => tracing::debug!(
            rpc,
            code = ?status.code(),
            error = status.message(),
            "rpc failed"
        ),
    }
    result
}

fn log_request(rpc: &'static str, context: &CallContext, summary: impl Debug) {
    tracing::debug!(rpc, timeout = ?context.timeout(), request = ?summary, "issuing rpc");
}

#[tonic::async_trait]
impl<S> DataStub for LoggingDataStub<S>
where
    S: DataStub,
{
    async fn mutate_row(
        &self,
        context: CallContext,
        request: MutateRowRequest,
    ) -> Result<MutateRowResponse, Status> {
        log_request(
            "MutateRow",
            &context,
            (&request.table_name, &request.row_key, request.mutations.len()),
        );
        log_outcome("MutateRow", self.inner.mutate_row(context, request).await)
    }

    async fn mutate_rows(
        &self,
        context: CallContext,
        request: MutateRowsRequest,
    ) -> Result<ResponseStream<MutateRowsResponse>, Status> {
        log_request(
            "MutateRows",
            &context,
            (&request.table_name, request.entries.len()),
        );
        log_outcome("MutateRows", self.inner.mutate_rows(context, request).await)
    }

    async fn read_rows(
        &self,
        context: CallContext,
        request: ReadRowsRequest,
    ) -> Result<ResponseStream<ReadRowsResponse>, Status> {
        log_request(
            "ReadRows",
            &context,
            (&request.table_name, &request.rows, request.rows_limit),
        );
        log_outcome("ReadRows", self.inner.read_rows(context, request).await)
    }

    async fn check_and_mutate_row(
        &self,
        context: CallContext,
        request: CheckAndMutateRowRequest,
    ) -> Result<CheckAndMutateRowResponse, Status> {
        log_request(
            "CheckAndMutateRow",
            &context,
            (&request.table_name, &request.row_key),
        );
        log_outcome(
            "CheckAndMutateRow",
            self.inner.check_and_mutate_row(context, request).await,
        )
    }

    async fn get_operation(
        &self,
        context: CallContext,
        request: GetOperationRequest,
    ) -> Result<Operation, Status> {
        log_request("GetOperation", &context, &request.name);
        log_outcome("GetOperation", self.inner.get_operation(context, request).await)
    }

    async fn cancel_operation(
        &self,
        context: CallContext,
        request: CancelOperationRequest,
    ) -> Result<(), Status> {
        log_request("CancelOperation", &context, &request.name);
        log_outcome(
            "CancelOperation",
            self.inner.cancel_operation(context, request).await,
        )
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use std::{
        io,
        sync::{Arc, Mutex},
    };
    use tracing_subscriber::fmt::MakeWriter;

    /// Log output collected by a test subscriber.
    #[derive(Clone, Default)]
    pub(crate) struct CapturedLines(Arc<Mutex<Vec<u8>>>);

    impl CapturedLines {
        /// Installs a debug-level subscriber writing here for the current thread.
        pub(crate) fn install(&self) -> tracing::subscriber::DefaultGuard {
            let subscriber = tracing_subscriber::fmt()
                .with_max_level(tracing::Level::DEBUG)
                .with_ansi(false)
                .with_writer(self.clone())
                .finish();
            tracing::subscriber::set_default(subscriber)
        }

        pub(crate) fn contents(&self) -> String {
            String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
        }
    }

    impl io::Write for CapturedLines {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for CapturedLines {
        type Writer = CapturedLines;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    struct Unavailable;

    #[tonic::async_trait]
    impl DataStub for Unavailable {
        async fn mutate_row(
            &self,
            _context: CallContext,
            _request: MutateRowRequest,
        ) -> Result<MutateRowResponse, Status> {
            Err(Status::unavailable("backend is overloaded"))
        }

        async fn mutate_rows(
            &self,
            _context: CallContext,
            _request: MutateRowsRequest,
        ) -> Result<ResponseStream<MutateRowsResponse>, Status> {
            Err(Status::unavailable("backend is overloaded"))
        }

        async fn read_rows(
            &self,
            _context: CallContext,
            _request: ReadRowsRequest,
        ) -> Result<ResponseStream<ReadRowsResponse>, Status> {
            Err(Status::unavailable("backend is overloaded"))
        }

        async fn check_and_mutate_row(
            &self,
            _context: CallContext,
            _request: CheckAndMutateRowRequest,
        ) -> Result<CheckAndMutateRowResponse, Status> {
            Ok(CheckAndMutateRowResponse {
                predicate_matched: true,
            })
        }
    }

    #[tokio::test]
    async fn logs_request_and_failure_status() {
        let lines = CapturedLines::default();
        let _guard = lines.install();

        let stub = LoggingDataStub::new(Unavailable);
        let err = stub
            .mutate_row(CallContext::new(), MutateRowRequest::default())
            .await
            .unwrap_err();

        let output = lines.contents();
        assert!(output.contains("issuing rpc"));
        assert!(output.contains("MutateRow"));
        assert!(output.contains(err.message()));
    }

    #[tokio::test]
    async fn passes_results_through() {
        let stub = LoggingDataStub::new(Unavailable);

        let response = stub
            .check_and_mutate_row(CallContext::new(), CheckAndMutateRowRequest::default())
            .await
            .unwrap();
        assert!(response.predicate_matched);

        let err = stub
            .get_operation(CallContext::new(), GetOperationRequest::default())
            .await
            .unwrap_err();
        assert_eq!(err.code(), tonic::Code::Unimplemented);
    }
}
