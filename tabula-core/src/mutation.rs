//! # Mutations
//!
//! The client-side representation of writes. A [`Mutation`] is a single operation on one
//! row; a [`SingleRowMutation`] groups mutations that the service applies atomically to one
//! row key; a [`BulkMutation`] batches many of those, each identified by its position.
//!
//! Mutations are plain values. They are converted to wire form only when a request is
//! built, and are moved (not copied) into it.
use crate::proto::v2::{self, mutate_rows_request, mutation};
use bytes::Bytes;
use tonic::Status;

/// Wire value asking the server to assign the cell timestamp.
pub const SERVER_SET_TIMESTAMP: i64 = -1;

/// Timestamp of a written cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CellTimestamp {
    /// The server picks the timestamp when it applies the mutation. Writes using this are
    /// not idempotent: every replay creates a new cell version.
    ServerAssigned,
    /// An explicit timestamp in microseconds.
    Micros(i64),
}

impl CellTimestamp {
    fn into_wire(self) -> i64 {
        match self {
            CellTimestamp::ServerAssigned => SERVER_SET_TIMESTAMP,
            CellTimestamp::Micros(micros) => micros,
        }
    }
}

/// A half-open `[start, end)` range of cell timestamps in microseconds. An `end` of
/// `None` means "no upper bound".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimestampRange {
    pub start_micros: i64,
    pub end_micros: Option<i64>,
}

/// One set/delete operation targeting a single row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Mutation {
    SetCell {
        family: String,
        column: Bytes,
        timestamp: CellTimestamp,
        value: Bytes,
    },
    DeleteFromColumn {
        family: String,
        column: Bytes,
        time_range: Option<TimestampRange>,
    },
    DeleteFromFamily {
        family: String,
    },
    DeleteFromRow,
}

impl Mutation {
    pub fn into_wire(self) -> v2::Mutation {
        let op = match self {
            Mutation::SetCell {
                family,
                column,
                timestamp,
                value,
            } => mutation::Mutation::SetCell(mutation::SetCell {
                family_name: family,
                column_qualifier: column,
                timestamp_micros: timestamp.into_wire(),
                value,
            }),
            Mutation::DeleteFromColumn {
                family,
                column,
                time_range,
            } => mutation::Mutation::DeleteFromColumn(mutation::DeleteFromColumn {
                family_name: family,
                column_qualifier: column,
                time_range: time_range.map(|range| v2::TimestampRange {
                    start_timestamp_micros: range.start_micros,
                    end_timestamp_micros: range.end_micros.unwrap_or(0),
                }),
            }),
            Mutation::DeleteFromFamily { family } => {
                mutation::Mutation::DeleteFromFamily(mutation::DeleteFromFamily {
                    family_name: family,
                })
            }
            Mutation::DeleteFromRow => {
                mutation::Mutation::DeleteFromRow(mutation::DeleteFromRow {})
            }
        };
        v2::Mutation { mutation: Some(op) }
    }
}

pub fn set_cell(
    family: impl Into<String>,
    column: impl Into<Bytes>,
    timestamp: CellTimestamp,
    value: impl Into<Bytes>,
) -> Mutation {
    Mutation::SetCell {
        family: family.into(),
        column: column.into(),
        timestamp,
        value: value.into(),
    }
}

/// Deletes every version of one column.
pub fn delete_from_column(family: impl Into<String>, column: impl Into<Bytes>) -> Mutation {
    Mutation::DeleteFromColumn {
        family: family.into(),
        column: column.into(),
        time_range: None,
    }
}

/// Deletes the versions of one column whose timestamp falls in `range`.
pub fn delete_from_column_range(
    family: impl Into<String>,
    column: impl Into<Bytes>,
    range: TimestampRange,
) -> Mutation {
    Mutation::DeleteFromColumn {
        family: family.into(),
        column: column.into(),
        time_range: Some(range),
    }
}

pub fn delete_from_family(family: impl Into<String>) -> Mutation {
    Mutation::DeleteFromFamily {
        family: family.into(),
    }
}

pub fn delete_from_row() -> Mutation {
    Mutation::DeleteFromRow
}

/// Mutations applied atomically to a single row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SingleRowMutation {
    row_key: Bytes,
    mutations: Vec<Mutation>,
}

impl SingleRowMutation {
    pub fn new(row_key: impl Into<Bytes>, mutations: impl IntoIterator<Item = Mutation>) -> Self {
        Self {
            row_key: row_key.into(),
            mutations: mutations.into_iter().collect(),
        }
    }

    pub fn push(&mut self, mutation: Mutation) -> &mut Self {
        self.mutations.push(mutation);
        self
    }

    pub fn row_key(&self) -> &Bytes {
        &self.row_key
    }

    pub fn mutations(&self) -> &[Mutation] {
        &self.mutations
    }

    /// Splits the mutation into its row key and wire-form mutations.
    pub fn into_wire(self) -> (Bytes, Vec<v2::Mutation>) {
        let mutations = self.mutations.into_iter().map(Mutation::into_wire).collect();
        (self.row_key, mutations)
    }

    pub(crate) fn into_entry(self) -> mutate_rows_request::Entry {
        let (row_key, mutations) = self.into_wire();
        mutate_rows_request::Entry { row_key, mutations }
    }
}

/// A batch of [`SingleRowMutation`]s with independent outcomes.
///
/// The position of each entry is its identity: failures are reported by that index.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BulkMutation {
    entries: Vec<SingleRowMutation>,
}

impl BulkMutation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, mutation: SingleRowMutation) -> &mut Self {
        self.entries.push(mutation);
        self
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[SingleRowMutation] {
        &self.entries
    }
}

impl From<Vec<SingleRowMutation>> for BulkMutation {
    fn from(entries: Vec<SingleRowMutation>) -> Self {
        Self { entries }
    }
}

impl FromIterator<SingleRowMutation> for BulkMutation {
    fn from_iter<I: IntoIterator<Item = SingleRowMutation>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for BulkMutation {
    type Item = SingleRowMutation;
    type IntoIter = std::vec::IntoIter<SingleRowMutation>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Terminal outcome of one [`BulkMutation`] entry that could not be applied.
#[derive(Debug, Clone)]
pub struct FailedMutation {
    original_index: usize,
    status: Status,
}

impl FailedMutation {
    pub fn new(original_index: usize, status: Status) -> Self {
        Self {
            original_index,
            status,
        }
    }

    /// Position of the entry in the submitted [`BulkMutation`].
    pub fn original_index(&self) -> usize {
        self.original_index
    }

    /// The last status reported for the entry.
    pub fn status(&self) -> &Status {
        &self.status
    }
}
