//! # Bulk Mutator
//!
//! Applies a [`BulkMutation`] in rounds. Each round sends one `MutateRows` request holding
//! exactly the entries still pending; the response stream reports a status per entry,
//! indexed by its position *in that request*. The mutator maps those positions back to the
//! entry's index in the original submission, so the [`FailedMutation`]s it returns always
//! refer to what the caller submitted.
//!
//! ## Per-entry outcome
//!
//! * **Success**: the entry leaves the pending set.
//! * **Failure on a non-idempotent entry, or a permanent status**: the entry fails with
//!   that status.
//! * **Transient failure on an idempotent entry**: the entry stays pending, remembering the
//!   status.
//!
//! Entries the stream never reported take the status that broke the stream. If the stream
//! closed cleanly without reporting them, the server broke the protocol and they fail with
//! `INTERNAL`. A request that failed outright is the same situation with no entry reported.
//!
//! After a round that left failed entries pending, the retry policy is consulted once. If
//! it refuses, every pending entry fails with its last status; otherwise the mutator waits
//! the backoff delay and starts the next round.
use crate::{
    mutation::{BulkMutation, FailedMutation},
    policy::{IdempotencyPolicy, OperationPolicies},
    proto::v2::{MutateRowsRequest, mutate_rows_request},
    status::{from_rpc_status, is_transient, protocol_violation},
    stub::{CallContext, DataStub},
};
use std::collections::BTreeMap;
use tonic::{Code, Status};

#[derive(Debug)]
struct PendingEntry {
    entry: mutate_rows_request::Entry,
    idempotent: bool,
    last_status: Option<Status>,
}

#[derive(Debug)]
pub(crate) struct BulkMutator {
    table_name: String,
    app_profile_id: String,
    pending: BTreeMap<usize, PendingEntry>,
    failures: Vec<FailedMutation>,
}

impl BulkMutator {
    pub fn new(
        table_name: String,
        app_profile_id: String,
        mutation: BulkMutation,
        idempotency: &dyn IdempotencyPolicy,
    ) -> Self {
        let pending = mutation
            .into_iter()
            .enumerate()
            .map(|(index, mutation)| {
                let entry = mutation.into_entry();
                let idempotent = idempotency.are_idempotent(&entry.mutations);
                let pending = PendingEntry {
                    entry,
                    idempotent,
                    last_status: None,
                };
                (index, pending)
            })
            .collect();

        Self {
            table_name,
            app_profile_id,
            pending,
            failures: Vec::new(),
        }
    }

    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Runs rounds until nothing is pending or the retry policy gives up.
    pub async fn run(
        mut self,
        stub: &dyn DataStub,
        mut policies: OperationPolicies,
    ) -> Vec<FailedMutation> {
        let mut round: u32 = 0;
        while self.has_pending() {
            round += 1;
            let Some(status) = self.make_one_request(stub, policies.call_context()).await else {
                continue;
            };

            if !policies.retry.on_failure(&status) {
                tracing::warn!(
                    round,
                    pending = self.pending.len(),
                    code = ?status.code(),
                    "retry policy exhausted, failing pending mutations"
                );
                self.fail_pending(&status);
                break;
            }

            let delay = policies.backoff.on_completion(&status);
            tracing::debug!(
                round,
                pending = self.pending.len(),
                ?delay,
                code = ?status.code(),
                "retrying failed mutations"
            );
            tokio::time::sleep(delay).await;
        }

        self.into_failures()
    }

    /// Sends the pending entries once.
    ///
    /// Returns the most recent status among the entries left pending after a failure, or
    /// `None` when no entry needs another round.
    async fn make_one_request(
        &mut self,
        stub: &dyn DataStub,
        context: CallContext,
    ) -> Option<Status> {
        let (request, sent) = self.make_request();
        let mut reported = vec![false; sent.len()];
        let mut last_failure = None;

        let stream_status = match stub.mutate_rows(context, request).await {
            Err(status) => status,
            Ok(mut stream) => loop {
                match stream.message().await {
                    Ok(Some(response)) => {
                        for entry in response.entries {
                            let Some(position) = usize::try_from(entry.index)
                                .ok()
                                .filter(|position| *position < sent.len())
                            else {
                                tracing::warn!(index = entry.index, "ignoring unknown entry index");
                                continue;
                            };
                            if std::mem::replace(&mut reported[position], true) {
                                tracing::warn!(
                                    index = entry.index,
                                    "ignoring duplicate entry index"
                                );
                                continue;
                            }
                            let status = entry
                                .status
                                .as_ref()
                                .map(from_rpc_status)
                                .unwrap_or_else(|| Status::ok(""));
                            if let Some(failure) = self.on_entry_status(sent[position], status) {
                                last_failure = Some(failure);
                            }
                        }
                    }
                    Ok(None) => {
                        break protocol_violation("the server did not report every mutation");
                    }
                    Err(status) => break status,
                }
            },
        };

        for (position, index) in sent.iter().enumerate() {
            if !reported[position] {
                if let Some(failure) = self.on_entry_status(*index, stream_status.clone()) {
                    last_failure = Some(failure);
                }
            }
        }

        last_failure
    }

    /// Builds the request for the pending entries, along with the original index of each
    /// entry in request order.
    fn make_request(&self) -> (MutateRowsRequest, Vec<usize>) {
        let (sent, entries) = self
            .pending
            .iter()
            .map(|(index, pending)| (*index, pending.entry.clone()))
            .unzip();

        let request = MutateRowsRequest {
            table_name: self.table_name.clone(),
            entries,
            app_profile_id: self.app_profile_id.clone(),
        };
        (request, sent)
    }

    /// Applies one entry outcome. Returns the status if the entry stays pending for a retry.
    fn on_entry_status(&mut self, index: usize, status: Status) -> Option<Status> {
        if status.code() == Code::Ok {
            self.pending.remove(&index);
            return None;
        }

        let retryable = self
            .pending
            .get(&index)
            .is_some_and(|pending| pending.idempotent && is_transient(status.code()));

        if retryable {
            if let Some(pending) = self.pending.get_mut(&index) {
                pending.last_status = Some(status.clone());
            }
            Some(status)
        } else {
            if self.pending.remove(&index).is_some() {
                self.failures.push(FailedMutation::new(index, status));
            }
            None
        }
    }

    fn fail_pending(&mut self, status: &Status) {
        for (index, pending) in std::mem::take(&mut self.pending) {
            let status = pending.last_status.unwrap_or_else(|| status.clone());
            self.failures.push(FailedMutation::new(index, status));
        }
    }

    fn into_failures(mut self) -> Vec<FailedMutation> {
        self.failures.sort_by_key(FailedMutation::original_index);
        self.failures
    }
}
