//! # Table
//!
//! [`Table`] is the entry point for data operations on one table. Each operation is a
//! *logical* request that may take several RPCs: the table clones its policy prototypes,
//! hands them to the right executor, and returns a single outcome.
//!
//! | Operation | Executor | Result |
//! |---|---|---|
//! | [`apply`](Table::apply) | unary retry loop | `Result<(), Status>` |
//! | [`check_and_mutate_row`](Table::check_and_mutate_row) | unary retry loop | `Result<bool, Status>` |
//! | [`bulk_apply`](Table::bulk_apply) | bulk mutator | `Vec<FailedMutation>` |
//! | [`read_rows`](Table::read_rows) | row reader | lazy sequence of `Result<Row, Status>` |
//! | [`read_row`](Table::read_row) | row reader, limit 1 | `Result<(bool, Row), Status>` |
//!
//! ## Synchronous and asynchronous calls
//!
//! Plain methods block the calling thread until the operation completes, including the
//! backoff sleeps between attempts. They run on the [`CompletionQueue`] the table was
//! built with and must not be called from async code.
//!
//! The `async_*` methods schedule the same operation on a caller-supplied
//! [`CompletionQueue`] and return a [`Deferred`] resolving exactly once.
//!
//! ## Example
//!
//! ```rust,no_run
//! use tabula_core::{
//!     completion::CompletionQueue,
//!     mutation::{CellTimestamp, SingleRowMutation, set_cell},
//!     table::{Table, TableOptions, table_name},
//! };
//!
//! # fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let cq = CompletionQueue::new(2)?;
//! let table = Table::connect_lazy(
//!     "http://localhost:8086",
//!     table_name("my-project", "my-instance", "users"),
//!     TableOptions::default(),
//!     cq,
//! )?;
//!
//! table.apply(SingleRowMutation::new(
//!     "user#42",
//!     [set_cell("profile", "name", CellTimestamp::Micros(1_000), "Ada")],
//! ))?;
//!
//! let (found, row) = table.read_row("user#42", Default::default())?;
//! assert!(found);
//! println!("{} cells", row.cells().len());
//! # Ok(())
//! # }
//! ```
pub mod bulk_mutator;
pub mod row_reader;
mod unary;

#[cfg(test)]
pub(crate) mod scripted;

pub use row_reader::{BlockingRowReader, RowReader};

use crate::{
    completion::{CompletionQueue, CompletionQueueError, Deferred},
    filter::Filter,
    mutation::{BulkMutation, FailedMutation, Mutation, SingleRowMutation},
    policy::{
        BackoffPolicy, ExponentialBackoffPolicy, IdempotencyPolicy, LimitedTimeRetryPolicy,
        MetadataError, MetadataUpdatePolicy, OperationPolicies, RetryPolicy,
        SafeIdempotentMutationPolicy,
    },
    proto::v2::{CheckAndMutateRowRequest, MutateRowRequest},
    row::Row,
    row_set::RowSet,
    stub::{DataStub, DefaultDataStub, LoggingDataStub, StubConnectError},
};
use bulk_mutator::BulkMutator;
use bytes::Bytes;
use std::{collections::BTreeSet, sync::Arc, time::Duration};
use tonic::Status;
use tracing::{Instrument, Span};

/// Component name enabling the per-RPC logging decorator.
pub const RPC_TRACING_COMPONENT: &str = "rpc";

/// Maximum time an operation keeps retrying with the default policies.
pub const DEFAULT_MAXIMUM_RETRY_PERIOD: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_INITIAL_BACKOFF: Duration = Duration::from_millis(10);
pub const DEFAULT_MAXIMUM_BACKOFF: Duration = Duration::from_secs(5 * 60);

/// Errors that can occur when building a [`Table`].
#[derive(Debug, thiserror::Error)]
pub enum TableConnectError {
    #[error(transparent)]
    Connect(#[from] StubConnectError),
    #[error(transparent)]
    Metadata(#[from] MetadataError),
    #[error(transparent)]
    CompletionQueue(#[from] CompletionQueueError),
}

/// Formats the full resource name of a table.
pub fn table_name(project: &str, instance: &str, table: &str) -> String {
    format!("projects/{project}/instances/{instance}/tables/{table}")
}

/// Configuration of a [`Table`].
///
/// The policies given here are prototypes: every operation starts from a fresh clone.
///
/// | Setting | Default |
/// |---|---|
/// | retry | [`LimitedTimeRetryPolicy`], 10 minutes |
/// | backoff | [`ExponentialBackoffPolicy`], 10ms doubling up to 5 minutes |
/// | idempotency | [`SafeIdempotentMutationPolicy`] |
/// | app profile | none (the service default) |
#[derive(Debug, Clone)]
pub struct TableOptions {
    retry: Box<dyn RetryPolicy>,
    backoff: Box<dyn BackoffPolicy>,
    idempotency: Box<dyn IdempotencyPolicy>,
    app_profile_id: String,
    headers: Vec<(String, String)>,
    tracing_components: BTreeSet<String>,
    span: Option<Span>,
}

impl Default for TableOptions {
    fn default() -> Self {
        Self {
            retry: Box::new(LimitedTimeRetryPolicy::new(DEFAULT_MAXIMUM_RETRY_PERIOD)),
            backoff: Box::new(ExponentialBackoffPolicy::new(
                DEFAULT_INITIAL_BACKOFF,
                DEFAULT_MAXIMUM_BACKOFF,
            )),
            idempotency: Box::new(SafeIdempotentMutationPolicy),
            app_profile_id: String::new(),
            headers: Vec::new(),
            tracing_components: BTreeSet::new(),
            span: None,
        }
    }
}

impl TableOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_retry_policy(mut self, policy: impl RetryPolicy + 'static) -> Self {
        self.retry = Box::new(policy);
        self
    }

    pub fn with_backoff_policy(mut self, policy: impl BackoffPolicy + 'static) -> Self {
        self.backoff = Box::new(policy);
        self
    }

    pub fn with_idempotency_policy(mut self, policy: impl IdempotencyPolicy + 'static) -> Self {
        self.idempotency = Box::new(policy);
        self
    }

    pub fn with_app_profile_id(mut self, app_profile_id: impl Into<String>) -> Self {
        self.app_profile_id = app_profile_id.into();
        self
    }

    /// Adds a header sent with every RPC.
    pub fn with_header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    /// Turns on logging for a component. `"rpc"` logs every RPC and its outcome.
    pub fn enable_tracing(mut self, component: impl Into<String>) -> Self {
        self.tracing_components.insert(component.into());
        self
    }

    pub fn tracing_enabled(&self, component: &str) -> bool {
        self.tracing_components.contains(component)
    }

    /// Parent span of every operation. Without one, operations attach to the caller's
    /// current span.
    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    pub fn app_profile_id(&self) -> &str {
        &self.app_profile_id
    }
}

/// Data operations on one table.
///
/// Cloning is cheap and clones share the stub and the completion queue.
#[derive(Clone)]
pub struct Table {
    stub: Arc<dyn DataStub>,
    table_name: String,
    options: Arc<TableOptions>,
    metadata: MetadataUpdatePolicy,
    completion_queue: CompletionQueue,
}

impl std::fmt::Debug for Table {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Table")
            .field("table_name", &self.table_name)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Table {
    /// Builds a table over an existing stub.
    ///
    /// `completion_queue` runs the synchronous operations.
    pub fn new(
        stub: Arc<dyn DataStub>,
        table_name: impl Into<String>,
        options: TableOptions,
        completion_queue: CompletionQueue,
    ) -> Result<Self, MetadataError> {
        let table_name = table_name.into();
        let metadata = MetadataUpdatePolicy::new(
            &table_name,
            &options.app_profile_id,
            options.headers.clone(),
        )?;

        let stub: Arc<dyn DataStub> = if options.tracing_enabled(RPC_TRACING_COMPONENT) {
            Arc::new(LoggingDataStub::new(stub))
        } else {
            stub
        };

        Ok(Self {
            stub,
            table_name,
            options: Arc::new(options),
            metadata,
            completion_queue,
        })
    }

    /// Builds a table talking to `addr`. The connection is established on the first RPC.
    pub fn connect_lazy(
        addr: &str,
        table_name: impl Into<String>,
        options: TableOptions,
        completion_queue: CompletionQueue,
    ) -> Result<Self, TableConnectError> {
        let stub = {
            let _runtime = completion_queue.handle().enter();
            DefaultDataStub::connect_lazy(addr)?
        };
        Ok(Self::new(
            Arc::new(stub),
            table_name,
            options,
            completion_queue,
        )?)
    }

    /// Connects to `addr` eagerly. Uses the runtime the caller runs on.
    pub async fn connect(
        addr: &str,
        table_name: impl Into<String>,
        options: TableOptions,
    ) -> Result<Self, TableConnectError> {
        let stub = DefaultDataStub::connect(addr).await?;
        let completion_queue = CompletionQueue::current()?;
        Ok(Self::new(
            Arc::new(stub),
            table_name,
            options,
            completion_queue,
        )?)
    }

    pub fn table_name(&self) -> &str {
        &self.table_name
    }

    pub fn app_profile_id(&self) -> &str {
        self.options.app_profile_id()
    }

    pub fn completion_queue(&self) -> &CompletionQueue {
        &self.completion_queue
    }

    /// Applies one row mutation, retrying transient failures when every mutation in it is
    /// idempotent.
    pub fn apply(&self, mutation: SingleRowMutation) -> Result<(), Status> {
        self.completion_queue.block_on(self.apply_future(mutation))
    }

    pub fn async_apply(
        &self,
        completion_queue: &CompletionQueue,
        mutation: SingleRowMutation,
    ) -> Deferred<()> {
        completion_queue
            .spawn(self.apply_future(mutation))
            .flatten()
    }

    /// Applies a batch of row mutations and returns the entries that could not be applied.
    ///
    /// Failures are returned as data; this never fails as a whole.
    pub fn bulk_apply(&self, mutation: BulkMutation) -> Vec<FailedMutation> {
        self.completion_queue
            .block_on(self.bulk_apply_future(mutation))
    }

    /// Asynchronous [`bulk_apply`](Self::bulk_apply).
    ///
    /// If the background threads stop before the batch completes, the deferred resolves
    /// with `CANCELLED` and the outcome of each entry is unknown.
    pub fn async_bulk_apply(
        &self,
        completion_queue: &CompletionQueue,
        mutation: BulkMutation,
    ) -> Deferred<Vec<FailedMutation>> {
        completion_queue.spawn(self.bulk_apply_future(mutation))
    }

    /// Scans the rows in `row_set`.
    pub fn read_rows(&self, row_set: RowSet, filter: Filter) -> RowReader {
        self.row_reader(row_set, None, filter, "read_rows")
    }

    /// Scans at most `rows_limit` rows of `row_set`.
    pub fn read_rows_with_limit(
        &self,
        row_set: RowSet,
        rows_limit: u64,
        filter: Filter,
    ) -> RowReader {
        self.row_reader(row_set, Some(rows_limit), filter, "read_rows")
    }

    /// Reads one row. Returns `(false, empty row)` when no cell of the row matches.
    pub fn read_row(
        &self,
        row_key: impl Into<Bytes>,
        filter: Filter,
    ) -> Result<(bool, Row), Status> {
        self.completion_queue
            .block_on(self.read_row_future(row_key.into(), filter))
    }

    pub fn async_read_row(
        &self,
        completion_queue: &CompletionQueue,
        row_key: impl Into<Bytes>,
        filter: Filter,
    ) -> Deferred<(bool, Row)> {
        completion_queue
            .spawn(self.read_row_future(row_key.into(), filter))
            .flatten()
    }

    /// Applies `true_mutations` if `predicate` matches any cell of the row, `false_mutations`
    /// otherwise. Returns whether the predicate matched.
    ///
    /// With the default idempotency policy this is attempted exactly once.
    pub fn check_and_mutate_row(
        &self,
        row_key: impl Into<Bytes>,
        predicate: Filter,
        true_mutations: Vec<Mutation>,
        false_mutations: Vec<Mutation>,
    ) -> Result<bool, Status> {
        self.completion_queue
            .block_on(self.check_and_mutate_row_future(
                row_key.into(),
                predicate,
                true_mutations,
                false_mutations,
            ))
    }

    pub fn async_check_and_mutate_row(
        &self,
        completion_queue: &CompletionQueue,
        row_key: impl Into<Bytes>,
        predicate: Filter,
        true_mutations: Vec<Mutation>,
        false_mutations: Vec<Mutation>,
    ) -> Deferred<bool> {
        completion_queue
            .spawn(self.check_and_mutate_row_future(
                row_key.into(),
                predicate,
                true_mutations,
                false_mutations,
            ))
            .flatten()
    }

    fn policies(&self) -> OperationPolicies {
        OperationPolicies {
            retry: self.options.retry.clone_box(),
            backoff: self.options.backoff.clone_box(),
            idempotency: self.options.idempotency.clone_box(),
            metadata: self.metadata.clone(),
        }
    }

    fn span(&self, operation: &'static str) -> Span {
        match &self.options.span {
            Some(parent) => tracing::debug_span!(
                parent: parent,
                "table_operation",
                operation,
                table = %self.table_name
            ),
            None => tracing::debug_span!("table_operation", operation, table = %self.table_name),
        }
    }

    fn row_reader(
        &self,
        row_set: RowSet,
        rows_limit: Option<u64>,
        filter: Filter,
        operation: &'static str,
    ) -> RowReader {
        RowReader::new(
            self.stub.clone(),
            self.table_name.clone(),
            self.options.app_profile_id.clone(),
            row_set,
            rows_limit,
            filter,
            self.policies(),
            self.span(operation),
        )
    }

    fn apply_future(
        &self,
        mutation: SingleRowMutation,
    ) -> impl Future<Output = Result<(), Status>> + Send + 'static {
        let stub = self.stub.clone();
        let policies = self.policies();
        let (row_key, mutations) = mutation.into_wire();
        let idempotent = policies.idempotency.are_idempotent(&mutations);
        let request = MutateRowRequest {
            table_name: self.table_name.clone(),
            row_key,
            mutations,
            app_profile_id: self.options.app_profile_id.clone(),
        };

        async move {
            unary::retry_unary(policies, idempotent, "Table::apply()", |context| {
                let stub = stub.clone();
                let request = request.clone();
                async move { stub.mutate_row(context, request).await }
            })
            .await
            .map(|_| ())
        }
        .instrument(self.span("apply"))
    }

    fn bulk_apply_future(
        &self,
        mutation: BulkMutation,
    ) -> impl Future<Output = Vec<FailedMutation>> + Send + 'static {
        let stub = self.stub.clone();
        let policies = self.policies();
        let mutator = BulkMutator::new(
            self.table_name.clone(),
            self.options.app_profile_id.clone(),
            mutation,
            policies.idempotency.as_ref(),
        );

        async move { mutator.run(stub.as_ref(), policies).await }
            .instrument(self.span("bulk_apply"))
    }

    fn read_row_future(
        &self,
        row_key: Bytes,
        filter: Filter,
    ) -> impl Future<Output = Result<(bool, Row), Status>> + Send + 'static {
        let row_set = RowSet::new().with_key(row_key.clone());
        let reader = self.row_reader(row_set, Some(1), filter, "read_row");
        row_reader::read_one_row(reader, row_key)
    }

    fn check_and_mutate_row_future(
        &self,
        row_key: Bytes,
        predicate: Filter,
        true_mutations: Vec<Mutation>,
        false_mutations: Vec<Mutation>,
    ) -> impl Future<Output = Result<bool, Status>> + Send + 'static {
        let stub = self.stub.clone();
        let policies = self.policies();
        let request = CheckAndMutateRowRequest {
            table_name: self.table_name.clone(),
            row_key,
            true_mutations: true_mutations.into_iter().map(Mutation::into_wire).collect(),
            false_mutations: false_mutations
                .into_iter()
                .map(Mutation::into_wire)
                .collect(),
            predicate_filter: Some(predicate.into_wire()),
            app_profile_id: self.options.app_profile_id.clone(),
        };
        let idempotent = policies.idempotency.is_idempotent_check_and_mutate(&request);

        async move {
            unary::retry_unary(
                policies,
                idempotent,
                "Table::check_and_mutate_row()",
                |context| {
                    let stub = stub.clone();
                    let request = request.clone();
                    async move { stub.check_and_mutate_row(context, request).await }
                },
            )
            .await
            .map(|response| response.predicate_matched)
        }
        .instrument(self.span("check_and_mutate_row"))
    }
}
