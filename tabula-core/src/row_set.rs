//! # Row Sets
//!
//! A [`RowSet`] describes which rows a scan covers: individual keys plus key ranges.
//!
//! Note the difference with the wire format, where an empty set means "the whole table".
//! Here an empty set matches nothing and the whole table is [`RowSet::all`]; the row
//! reader never sends an empty set, it simply stops.
//!
//! When a scan is interrupted and resumed, the rows already delivered must not be
//! requested again. [`RowSet::remaining_after`] computes the rows still to read from the
//! original set and the last delivered key; since rows arrive in key order, everything up
//! to and including that key has been seen.
use crate::proto::v2::{self, row_range};
use bytes::Bytes;
use std::ops::Bound;

/// A contiguous range of row keys.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RowRange {
    start: Bound<Bytes>,
    end: Bound<Bytes>,
}

impl RowRange {
    pub fn new(start: Bound<Bytes>, end: Bound<Bytes>) -> Self {
        Self { start, end }
    }

    /// Every row in the table.
    pub fn infinite() -> Self {
        Self::new(Bound::Unbounded, Bound::Unbounded)
    }

    /// `[start, +inf)`
    pub fn starting_at(start: impl Into<Bytes>) -> Self {
        Self::new(Bound::Included(start.into()), Bound::Unbounded)
    }

    /// `[start, end)`
    pub fn right_open(start: impl Into<Bytes>, end: impl Into<Bytes>) -> Self {
        Self::new(Bound::Included(start.into()), Bound::Excluded(end.into()))
    }

    /// `[start, end]`
    pub fn closed(start: impl Into<Bytes>, end: impl Into<Bytes>) -> Self {
        Self::new(Bound::Included(start.into()), Bound::Included(end.into()))
    }

    /// `(start, end)`
    pub fn open(start: impl Into<Bytes>, end: impl Into<Bytes>) -> Self {
        Self::new(Bound::Excluded(start.into()), Bound::Excluded(end.into()))
    }

    /// Every row whose key starts with `prefix`.
    pub fn prefix(prefix: impl Into<Bytes>) -> Self {
        let prefix = prefix.into();
        let end = match prefix_successor(&prefix) {
            Some(end) => Bound::Excluded(end),
            None => Bound::Unbounded,
        };
        Self::new(Bound::Included(prefix), end)
    }

    pub fn start(&self) -> &Bound<Bytes> {
        &self.start
    }

    pub fn end(&self) -> &Bound<Bytes> {
        &self.end
    }

    /// Returns true if no row key can fall in this range.
    pub fn is_empty(&self) -> bool {
        match (&self.start, &self.end) {
            (_, Bound::Unbounded) => false,
            (Bound::Unbounded, Bound::Included(_)) => false,
            // The empty key is the smallest key, nothing sorts before it.
            (Bound::Unbounded, Bound::Excluded(end)) => end.is_empty(),
            (Bound::Included(start), Bound::Included(end)) => start > end,
            (Bound::Included(start), Bound::Excluded(end)) => start >= end,
            (Bound::Excluded(start), Bound::Included(end)) => start >= end,
            // (k, k\0) is empty too: k\0 is the immediate successor of k.
            (Bound::Excluded(start), Bound::Excluded(end)) => {
                end <= start || is_immediate_successor(start, end)
            }
        }
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        let after_start = match &self.start {
            Bound::Unbounded => true,
            Bound::Included(start) => key >= start.as_ref(),
            Bound::Excluded(start) => key > start.as_ref(),
        };
        let before_end = match &self.end {
            Bound::Unbounded => true,
            Bound::Included(end) => key <= end.as_ref(),
            Bound::Excluded(end) => key < end.as_ref(),
        };
        after_start && before_end
    }

    /// The part of this range strictly after `key`.
    pub fn after(&self, key: &[u8]) -> RowRange {
        let start = match &self.start {
            Bound::Included(start) if start.as_ref() > key => Bound::Included(start.clone()),
            Bound::Excluded(start) if start.as_ref() >= key => Bound::Excluded(start.clone()),
            _ => Bound::Excluded(Bytes::copy_from_slice(key)),
        };
        RowRange::new(start, self.end.clone())
    }

    fn into_wire(self) -> v2::RowRange {
        let start_key = match self.start {
            Bound::Included(key) => Some(row_range::StartKey::StartKeyClosed(key)),
            Bound::Excluded(key) => Some(row_range::StartKey::StartKeyOpen(key)),
            Bound::Unbounded => None,
        };
        let end_key = match self.end {
            Bound::Included(key) => Some(row_range::EndKey::EndKeyClosed(key)),
            Bound::Excluded(key) => Some(row_range::EndKey::EndKeyOpen(key)),
            Bound::Unbounded => None,
        };
        v2::RowRange { start_key, end_key }
    }
}

fn is_immediate_successor(key: &[u8], candidate: &[u8]) -> bool {
    candidate.len() == key.len() + 1 && candidate.starts_with(key) && candidate.last() == Some(&0)
}

/// Smallest key greater than every key starting with `prefix`, if there is one.
fn prefix_successor(prefix: &[u8]) -> Option<Bytes> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < u8::MAX {
            end.push(last + 1);
            return Some(Bytes::from(end));
        }
    }
    None
}

/// The rows covered by a scan.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct RowSet {
    row_keys: Vec<Bytes>,
    row_ranges: Vec<RowRange>,
}

impl RowSet {
    /// A set matching no rows.
    pub fn new() -> Self {
        Self::default()
    }

    /// A set matching every row of the table.
    pub fn all() -> Self {
        RowRange::infinite().into()
    }

    pub fn with_key(mut self, key: impl Into<Bytes>) -> Self {
        self.row_keys.push(key.into());
        self
    }

    pub fn with_range(mut self, range: RowRange) -> Self {
        self.row_ranges.push(range);
        self
    }

    pub fn row_keys(&self) -> &[Bytes] {
        &self.row_keys
    }

    pub fn row_ranges(&self) -> &[RowRange] {
        &self.row_ranges
    }

    /// Returns true if the set cannot match any row.
    pub fn is_empty(&self) -> bool {
        self.row_keys.is_empty() && self.row_ranges.iter().all(RowRange::is_empty)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.row_keys.iter().any(|k| k.as_ref() == key)
            || self.row_ranges.iter().any(|r| r.contains(key))
    }

    /// The rows of this set that sort strictly after `last_delivered`.
    ///
    /// Keys at or before `last_delivered` are dropped, ranges are clipped, and ranges that
    /// become empty are removed.
    pub fn remaining_after(&self, last_delivered: &[u8]) -> RowSet {
        RowSet {
            row_keys: self
                .row_keys
                .iter()
                .filter(|key| key.as_ref() > last_delivered)
                .cloned()
                .collect(),
            row_ranges: self
                .row_ranges
                .iter()
                .map(|range| range.after(last_delivered))
                .filter(|range| !range.is_empty())
                .collect(),
        }
    }

    pub(crate) fn into_wire(self) -> v2::RowSet {
        v2::RowSet {
            row_keys: self.row_keys,
            row_ranges: self
                .row_ranges
                .into_iter()
                .map(RowRange::into_wire)
                .collect(),
        }
    }
}

impl From<RowRange> for RowSet {
    fn from(range: RowRange) -> Self {
        RowSet::new().with_range(range)
    }
}
