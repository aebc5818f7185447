//! In-memory [`DataStub`] replaying scripted outcomes and recording every request.
use crate::{
    proto::v2::{
        CheckAndMutateRowRequest, CheckAndMutateRowResponse, MutateRowRequest,
        MutateRowResponse, MutateRowsRequest, MutateRowsResponse, ReadRowsRequest,
        ReadRowsResponse, mutate_rows_response,
    },
    proto::google::rpc,
    stub::{CallContext, DataStub, ResponseStream},
};
use std::{collections::VecDeque, sync::Mutex};
use tonic::{Code, Status};

type StreamScript<T> = Result<Vec<Result<T, Status>>, Status>;

#[derive(Debug, Default)]
pub(crate) struct ScriptedStub {
    mutate_row: Mutex<VecDeque<Result<MutateRowResponse, Status>>>,
    mutate_rows: Mutex<VecDeque<StreamScript<MutateRowsResponse>>>,
    read_rows: Mutex<VecDeque<StreamScript<ReadRowsResponse>>>,
    check_and_mutate_row: Mutex<VecDeque<Result<CheckAndMutateRowResponse, Status>>>,

    pub mutate_row_requests: Mutex<Vec<(CallContext, MutateRowRequest)>>,
    pub mutate_rows_requests: Mutex<Vec<MutateRowsRequest>>,
    pub read_rows_requests: Mutex<Vec<ReadRowsRequest>>,
    pub check_and_mutate_row_requests: Mutex<Vec<CheckAndMutateRowRequest>>,
}

impl ScriptedStub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_mutate_row(self, outcome: Result<MutateRowResponse, Status>) -> Self {
        self.mutate_row.lock().unwrap().push_back(outcome);
        self
    }

    pub fn on_mutate_rows(self, outcome: StreamScript<MutateRowsResponse>) -> Self {
        self.mutate_rows.lock().unwrap().push_back(outcome);
        self
    }

    pub fn on_read_rows(self, outcome: StreamScript<ReadRowsResponse>) -> Self {
        self.read_rows.lock().unwrap().push_back(outcome);
        self
    }

    pub fn on_check_and_mutate_row(
        self,
        outcome: Result<CheckAndMutateRowResponse, Status>,
    ) -> Self {
        self.check_and_mutate_row.lock().unwrap().push_back(outcome);
        self
    }

    pub fn mutate_row_calls(&self) -> usize {
        self.mutate_row_requests.lock().unwrap().len()
    }

    pub fn read_rows_calls(&self) -> usize {
        self.read_rows_requests.lock().unwrap().len()
    }
}

fn next<T>(script: &Mutex<VecDeque<Result<T, Status>>>) -> Result<T, Status> {
    script
        .lock()
        .unwrap()
        .pop_front()
        .unwrap_or_else(|| Err(Status::new(Code::Internal, "unscripted call")))
}

fn into_stream<T: Send + 'static>(messages: Vec<Result<T, Status>>) -> ResponseStream<T> {
    ResponseStream::new(tokio_stream::iter(messages))
}

#[tonic::async_trait]
impl DataStub for ScriptedStub {
    async fn mutate_row(
        &self,
        context: CallContext,
        request: MutateRowRequest,
    ) -> Result<MutateRowResponse, Status> {
        self.mutate_row_requests
            .lock()
            .unwrap()
            .push((context, request));
        next(&self.mutate_row)
    }

    async fn mutate_rows(
        &self,
        _context: CallContext,
        request: MutateRowsRequest,
    ) -> Result<ResponseStream<MutateRowsResponse>, Status> {
        self.mutate_rows_requests.lock().unwrap().push(request);
        next(&self.mutate_rows).map(into_stream)
    }

    async fn read_rows(
        &self,
        _context: CallContext,
        request: ReadRowsRequest,
    ) -> Result<ResponseStream<ReadRowsResponse>, Status> {
        self.read_rows_requests.lock().unwrap().push(request);
        next(&self.read_rows).map(into_stream)
    }

    async fn check_and_mutate_row(
        &self,
        _context: CallContext,
        request: CheckAndMutateRowRequest,
    ) -> Result<CheckAndMutateRowResponse, Status> {
        self.check_and_mutate_row_requests
            .lock()
            .unwrap()
            .push(request);
        next(&self.check_and_mutate_row)
    }
}

/// One `MutateRows` response message reporting `(index, code)` per entry.
pub(crate) fn entry_statuses(entries: &[(i64, Code)]) -> MutateRowsResponse {
    MutateRowsResponse {
        entries: entries
            .iter()
            .map(|(index, code)| mutate_rows_response::Entry {
                index: *index,
                status: Some(rpc::Status {
                    code: *code as i32,
                    message: format!("{code:?}"),
                    details: vec![],
                }),
            })
            .collect(),
    }
}
