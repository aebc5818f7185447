//! # Row Reader
//!
//! A [`RowReader`] turns a scan into a lazy, forward-only sequence of rows. Nothing is
//! sent until the first pull; each pull either yields a row, yields a terminal error, or
//! reports the end of the sequence.
//!
//! ## Resuming interrupted scans
//!
//! Rows arrive in key order, so the key of the last row handed to the caller is enough to
//! know what has been seen. When the stream breaks with a failure the retry policy
//! accepts, the reader waits the backoff delay, shrinks the row set to the keys after that
//! row and issues a new scan. Rows are never delivered twice, and the row limit sent with
//! each scan is what remains of the caller's limit, so it holds across retries.
//!
//! ## Consumption
//!
//! * [`RowReader::next_row`] pulls one row asynchronously.
//! * [`RowReader::into_stream`] adapts the reader into a [`Stream`].
//! * [`RowReader::blocking`] adapts it into an [`Iterator`] for synchronous callers.
use crate::{
    completion::CompletionQueue,
    filter::Filter,
    parser::ReadRowsParser,
    policy::OperationPolicies,
    proto::v2::{ReadRowsRequest, ReadRowsResponse, RowFilter},
    row::Row,
    row_set::RowSet,
    status::{make_permanent, protocol_violation},
    stub::{DataStub, ResponseStream},
};
use bytes::Bytes;
use futures_util::Stream;
use std::sync::Arc;
use tonic::Status;
use tracing::{Instrument, Span};

/// Lazy sequence of the rows matched by a scan.
pub struct RowReader {
    stub: Arc<dyn DataStub>,
    table_name: String,
    app_profile_id: String,
    row_set: RowSet,
    rows_limit: Option<u64>,
    filter: RowFilter,
    policies: OperationPolicies,
    parser: ReadRowsParser,
    stream: Option<ResponseStream<ReadRowsResponse>>,
    last_read_key: Option<Bytes>,
    rows_count: u64,
    done: bool,
    span: Span,
}

impl RowReader {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        stub: Arc<dyn DataStub>,
        table_name: String,
        app_profile_id: String,
        row_set: RowSet,
        rows_limit: Option<u64>,
        filter: Filter,
        policies: OperationPolicies,
        span: Span,
    ) -> Self {
        Self {
            stub,
            table_name,
            app_profile_id,
            row_set,
            rows_limit,
            filter: filter.into_wire(),
            policies,
            parser: ReadRowsParser::new(),
            stream: None,
            last_read_key: None,
            rows_count: 0,
            done: false,
            span,
        }
    }

    /// Pulls the next row.
    ///
    /// Returns `None` once the scan is complete. An error is always the last item: after
    /// it, every call returns `None`.
    pub async fn next_row(&mut self) -> Option<Result<Row, Status>> {
        if self.done {
            return None;
        }

        let span = self.span.clone();
        match self.advance().instrument(span).await {
            Ok(Some(row)) => Some(Ok(row)),
            Ok(None) => {
                self.cancel();
                None
            }
            Err(status) => {
                self.cancel();
                Some(Err(status))
            }
        }
    }

    /// Stops the scan: closes the current stream and ends the sequence.
    pub fn cancel(&mut self) {
        self.done = true;
        self.stream = None;
        self.parser.reset();
    }

    /// Number of rows handed to the caller so far.
    pub fn rows_count(&self) -> u64 {
        self.rows_count
    }

    pub fn into_stream(self) -> impl Stream<Item = Result<Row, Status>> + Send {
        futures_util::stream::unfold(self, |mut reader| async move {
            let row = reader.next_row().await?;
            Some((row, reader))
        })
    }

    /// Adapts the reader into an iterator that blocks the calling thread on each pull.
    pub fn blocking(self, completion_queue: &CompletionQueue) -> BlockingRowReader {
        BlockingRowReader {
            reader: self,
            completion_queue: completion_queue.clone(),
        }
    }

    /// Reports whether the current stream carries a row beyond the ones delivered so far.
    ///
    /// Reads the rest of the open stream. A stream failure at this point is not an error:
    /// the rows asked for have already arrived.
    pub(crate) async fn has_excess_row(&mut self) -> Result<bool, Status> {
        loop {
            if self.parser.has_next() {
                return Ok(true);
            }
            let Some(stream) = self.stream.as_mut() else {
                return Ok(false);
            };
            match stream.message().await {
                Ok(Some(response)) => {
                    for chunk in response.chunks {
                        self.parser.handle_chunk(chunk)?;
                    }
                }
                Ok(None) => {
                    self.stream = None;
                    self.parser.handle_end_of_stream()?;
                }
                Err(_) => self.stream = None,
            }
        }
    }

    fn limit_reached(&self) -> bool {
        self.rows_limit.is_some_and(|limit| self.rows_count >= limit)
    }

    async fn advance(&mut self) -> Result<Option<Row>, Status> {
        loop {
            if self.limit_reached() {
                return Ok(None);
            }

            if let Some(row) = self.parser.next_row() {
                return self.deliver(row).map(Some);
            }

            let message = match self.stream.as_mut() {
                Some(stream) => stream.message().await,
                None => {
                    if self.row_set.is_empty() {
                        return Ok(None);
                    }
                    self.start_stream().await?;
                    continue;
                }
            };

            match message {
                Ok(Some(response)) => {
                    for chunk in response.chunks {
                        self.parser.handle_chunk(chunk)?;
                    }
                }
                Ok(None) => {
                    self.parser.handle_end_of_stream()?;
                    return Ok(None);
                }
                Err(status) => self.on_stream_failure(status).await?,
            }
        }
    }

    fn deliver(&mut self, row: Row) -> Result<Row, Status> {
        if let Some(last) = &self.last_read_key {
            if row.key() <= last {
                return Err(protocol_violation(format!(
                    "rows are not in key order: {:?} after {:?}",
                    row.key(),
                    last
                )));
            }
        }
        self.last_read_key = Some(row.key().clone());
        self.rows_count += 1;
        Ok(row)
    }

    async fn start_stream(&mut self) -> Result<(), Status> {
        let rows_limit = match self.rows_limit {
            Some(limit) => i64::try_from(limit - self.rows_count).unwrap_or(i64::MAX),
            None => 0,
        };
        let request = ReadRowsRequest {
            table_name: self.table_name.clone(),
            rows: Some(self.row_set.clone().into_wire()),
            filter: Some(self.filter.clone()),
            rows_limit,
            app_profile_id: self.app_profile_id.clone(),
        };

        tracing::debug!(rows_limit, rows_read = self.rows_count, "starting scan");
        match self
            .stub
            .read_rows(self.policies.call_context(), request)
            .await
        {
            Ok(stream) => {
                self.stream = Some(stream);
                Ok(())
            }
            Err(status) => self.on_stream_failure(status).await,
        }
    }

    /// Decides whether a broken scan is resumed. Returns the terminal error otherwise.
    async fn on_stream_failure(&mut self, status: Status) -> Result<(), Status> {
        self.stream = None;
        self.parser.reset();

        if !self.policies.retry.on_failure(&status) {
            tracing::warn!(
                rows_read = self.rows_count,
                code = ?status.code(),
                error = status.message(),
                "scan failed"
            );
            return Err(make_permanent(&status, "RowReader"));
        }

        let delay = self.policies.backoff.on_completion(&status);
        tracing::debug!(?delay, code = ?status.code(), "scan interrupted, resuming");
        tokio::time::sleep(delay).await;

        if let Some(last) = &self.last_read_key {
            self.row_set = self.row_set.remaining_after(last);
        }
        Ok(())
    }
}

impl std::fmt::Debug for RowReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RowReader")
            .field("table_name", &self.table_name)
            .field("row_set", &self.row_set)
            .field("rows_limit", &self.rows_limit)
            .field("rows_count", &self.rows_count)
            .field("done", &self.done)
            .finish_non_exhaustive()
    }
}

/// Blocking [`Iterator`] over a [`RowReader`].
#[derive(Debug)]
pub struct BlockingRowReader {
    reader: RowReader,
    completion_queue: CompletionQueue,
}

impl BlockingRowReader {
    pub fn cancel(&mut self) {
        self.reader.cancel();
    }
}

impl Iterator for BlockingRowReader {
    type Item = Result<Row, Status>;

    fn next(&mut self) -> Option<Self::Item> {
        self.completion_queue.block_on(self.reader.next_row())
    }
}

/// Reads at most one row and reports whether it was found.
pub(crate) async fn read_one_row(
    mut reader: RowReader,
    row_key: Bytes,
) -> Result<(bool, Row), Status> {
    let row = match reader.next_row().await {
        None => return Ok((false, Row::new(row_key, vec![]))),
        Some(row) => row?,
    };

    // The limit stops the reader after one row, so look at what the server sent past it.
    let excess = reader.has_excess_row().await;
    reader.cancel();
    if excess? {
        return Err(protocol_violation("RowReader returned 2 rows in ReadRow()"));
    }
    Ok((true, row))
}
