//! # Tabula Core
//!
//! `tabula-core` is a resilient client for a sorted key-value table service reachable over
//! gRPC. It turns logical requests (apply a row mutation, apply a batch of them, scan a
//! range of rows, read one row, conditionally mutate a row) into one or more RPCs, and
//! produces well-defined results when individual attempts fail transiently.
//!
//! ## Key Components
//!
//! * **[`Table`](table::Table):** The entry point. Every data operation starts here, in a
//!   blocking or an asynchronous flavour.
//! * **[`policy`]:** Pluggable retry, backoff and idempotency strategies. The table keeps
//!   prototypes and every operation works on fresh clones.
//! * **[`RowReader`](table::RowReader):** Lazy scan results. Interrupted scans resume where
//!   they stopped without returning a row twice.
//! * **[`DataStub`](stub::DataStub):** The transport seam. [`DefaultDataStub`](stub::DefaultDataStub)
//!   talks to a real server through `tonic`; tests plug in their own implementation.
//! * **[`CompletionQueue`](completion::CompletionQueue) & [`Deferred`](completion::Deferred):**
//!   The background threads that run asynchronous operations and the single-assignment
//!   futures that deliver their results.
//!
//! ## Errors
//!
//! Operation results use [`tonic::Status`]. Errors that can only happen while building a
//! table (bad URL, invalid header, no runtime) have their own `thiserror` types.
//!
//! ## Feature Flags
//!
//! * `gen-proto`: Enables the `generate-data-service` binary that regenerates the wire
//!   types under `src/proto/generated`.
//!
//! ## Re-exports
//!
//! This crate re-exports `prost` and `tonic` to ensure that consumers use compatible
//! versions of these underlying dependencies.
pub mod completion;
pub mod filter;
pub mod mutation;
pub mod parser;
pub mod policy;
pub mod proto;
pub mod row;
pub mod row_set;
pub mod status;
pub mod stub;
pub mod table;

// Re-exports
pub use prost;
pub use tonic;

/// Type alias for the standard boxed error used in generic bounds.
type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;
