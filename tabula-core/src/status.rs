//! # Status Taxonomy
//!
//! Every RPC outcome is a [`tonic::Status`]. This module holds the small helpers that
//! classify statuses and build the terminal errors reported by the retry loops:
//!
//! - **Transient**: `UNAVAILABLE`, `DEADLINE_EXCEEDED` and `ABORTED`. Retry policies may
//!   allow another attempt.
//! - **Permanent**: any other failure, or a transient one on a non-idempotent request.
//! - **Policy-exhausted**: reported exactly like a permanent failure, with the original code.
//! - **Protocol violation**: always `INTERNAL`, never retried.
use crate::proto::google::rpc;
use tonic::{Code, Status};

/// Returns true when a status with this code may succeed if the request is sent again.
pub fn is_transient(code: Code) -> bool {
    matches!(
        code,
        Code::Unavailable | Code::DeadlineExceeded | Code::Aborted
    )
}

/// Wraps a failed RPC status into the terminal error returned to the caller.
///
/// The code is preserved so callers can still tell an overloaded service from a
/// rejected request; the message records the operation that gave up.
pub fn make_permanent(status: &Status, operation: &str) -> Status {
    Status::new(
        status.code(),
        format!(
            "Permanent (or too many transient) errors in {operation}: {}",
            status.message()
        ),
    )
}

/// Builds the error reported when the server or the parser breaks a protocol invariant.
pub fn protocol_violation(message: impl Into<String>) -> Status {
    Status::internal(message)
}

/// Converts a per-entry wire status into a [`Status`].
pub fn from_rpc_status(status: &rpc::Status) -> Status {
    Status::new(Code::from_i32(status.code), status.message.clone())
}
