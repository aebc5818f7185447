//! # Read Rows Parser
//!
//! The read stream does not carry rows, it carries [`CellChunk`]s: fragments of cells that
//! must be stitched back together. A cell may be split across several chunks (signalled by
//! a non-zero `value_size`), chunks omit the row key, family and qualifier when they
//! repeat, and a row only exists once a chunk commits it. A chunk may also reset the row
//! in progress, discarding everything received for it.
//!
//! [`ReadRowsParser`] validates that sequence and produces complete [`Row`]s. Any chunk
//! that does not fit is a protocol violation reported as `INTERNAL`.
use crate::{
    proto::v2::read_rows_response::{CellChunk, cell_chunk::RowStatus},
    row::{Cell, Row},
    status::protocol_violation,
};
use bytes::{Bytes, BytesMut};
use std::collections::VecDeque;
use tonic::Status;

/// Upper bound on the buffer reserved up front for a split cell. Larger values grow as
/// their chunks arrive.
const MAX_VALUE_PREALLOCATION: usize = 1 << 20;

#[derive(Debug, Default)]
struct PartialCell {
    family: String,
    column: Bytes,
    timestamp_micros: i64,
    labels: Vec<String>,
    value: BytesMut,
}

#[derive(Debug, Default)]
pub struct ReadRowsParser {
    row_key: Option<Bytes>,
    cells: Vec<Cell>,
    cell: Option<PartialCell>,
    family: Option<String>,
    column: Option<Bytes>,
    ready: VecDeque<Row>,
}

impl ReadRowsParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feeds one chunk to the parser.
    pub fn handle_chunk(&mut self, chunk: CellChunk) -> Result<(), Status> {
        if let Some(RowStatus::ResetRow(true)) = chunk.row_status {
            if !chunk.row_key.is_empty() || chunk.family_name.is_some() || !chunk.value.is_empty()
            {
                return Err(protocol_violation("reset_row chunk carries cell data"));
            }
            if self.row_key.is_none() {
                return Err(protocol_violation("reset_row chunk outside of a row"));
            }
            self.reset_row();
            return Ok(());
        }

        self.start_cell(&chunk)?;

        let value_size = chunk.value_size;
        let cell = self
            .cell
            .as_mut()
            .ok_or_else(|| protocol_violation("cell chunk without a cell"))?;
        cell.value.extend_from_slice(&chunk.value);

        if value_size == 0 {
            self.finish_cell();
        }

        if let Some(RowStatus::CommitRow(true)) = chunk.row_status {
            if self.cell.is_some() {
                return Err(protocol_violation("commit_row chunk in the middle of a cell"));
            }
            self.commit_row()?;
        }

        Ok(())
    }

    /// Checks the stream ended on a row boundary.
    pub fn handle_end_of_stream(&mut self) -> Result<(), Status> {
        if self.row_key.is_some() {
            return Err(protocol_violation(
                "the read stream ended in the middle of a row",
            ));
        }
        Ok(())
    }

    /// Returns the next complete row, if any.
    pub fn next_row(&mut self) -> Option<Row> {
        self.ready.pop_front()
    }

    pub fn has_next(&self) -> bool {
        !self.ready.is_empty()
    }

    /// Discards the row in progress and any buffered rows, ready for a new stream.
    pub fn reset(&mut self) {
        self.reset_row();
        self.ready.clear();
    }

    fn start_cell(&mut self, chunk: &CellChunk) -> Result<(), Status> {
        let continues_cell = self.cell.is_some();

        if !chunk.row_key.is_empty() {
            match &self.row_key {
                Some(key) if key != &chunk.row_key => {
                    return Err(protocol_violation("row key changed in the middle of a row"));
                }
                Some(_) => {}
                None => self.row_key = Some(chunk.row_key.clone()),
            }
        } else if self.row_key.is_none() {
            return Err(protocol_violation("first chunk of a row has no row key"));
        }

        if continues_cell {
            if chunk.family_name.is_some() || chunk.qualifier.is_some() {
                return Err(protocol_violation(
                    "a split cell changed its family or qualifier",
                ));
            }
            return Ok(());
        }

        if let Some(family) = &chunk.family_name {
            if chunk.qualifier.is_none() {
                return Err(protocol_violation("new family without a qualifier"));
            }
            self.family = Some(family.clone());
        }
        if let Some(qualifier) = &chunk.qualifier {
            self.column = Some(Bytes::copy_from_slice(qualifier));
        }

        let (Some(family), Some(column)) = (&self.family, &self.column) else {
            return Err(protocol_violation("cell chunk without family or qualifier"));
        };

        self.cell = Some(PartialCell {
            family: family.clone(),
            column: column.clone(),
            timestamp_micros: chunk.timestamp_micros,
            labels: chunk.labels.clone(),
            value: BytesMut::with_capacity(
                usize::try_from(chunk.value_size)
                    .unwrap_or(0)
                    .min(MAX_VALUE_PREALLOCATION),
            ),
        });
        Ok(())
    }

    fn finish_cell(&mut self) {
        if let Some(cell) = self.cell.take() {
            self.cells.push(Cell {
                family: cell.family,
                column: cell.column,
                timestamp_micros: cell.timestamp_micros,
                labels: cell.labels,
                value: cell.value.freeze(),
            });
        }
    }

    fn commit_row(&mut self) -> Result<(), Status> {
        let key = self
            .row_key
            .take()
            .ok_or_else(|| protocol_violation("commit_row chunk outside of a row"))?;
        let cells = std::mem::take(&mut self.cells);
        self.family = None;
        self.column = None;
        self.ready.push_back(Row::new(key, cells));
        Ok(())
    }

    fn reset_row(&mut self) {
        self.row_key = None;
        self.cells.clear();
        self.cell = None;
        self.family = None;
        self.column = None;
    }
}
