//! # Row Filters
//!
//! A [`Filter`] restricts which cells a read returns. Filters are evaluated by the
//! service; the client only builds them and converts them to wire form.
use crate::proto::v2::{RowFilter, row_filter};
use bytes::Bytes;

#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub enum Filter {
    #[default]
    PassAll,
    BlockAll,
    /// Keeps rows whose key matches the RE2 regular expression.
    RowKeyRegex(Bytes),
    /// Keeps cells whose family name matches the RE2 regular expression.
    FamilyRegex(String),
    /// Keeps cells whose column qualifier matches the RE2 regular expression.
    ColumnRegex(Bytes),
    /// Keeps at most this many cells per row.
    CellsRowLimit(i32),
    /// Keeps the latest `n` versions of each column.
    Latest(i32),
    /// Returns cells with empty values.
    StripValue,
    /// Applies each filter to the output of the previous one.
    Chain(Vec<Filter>),
    /// Applies every filter to the input and merges the results.
    Interleave(Vec<Filter>),
}

impl Filter {
    pub fn into_wire(self) -> RowFilter {
        let filter = match self {
            Filter::PassAll => row_filter::Filter::PassAllFilter(true),
            Filter::BlockAll => row_filter::Filter::BlockAllFilter(true),
            Filter::RowKeyRegex(regex) => row_filter::Filter::RowKeyRegexFilter(regex),
            Filter::FamilyRegex(regex) => row_filter::Filter::FamilyNameRegexFilter(regex),
            Filter::ColumnRegex(regex) => row_filter::Filter::ColumnQualifierRegexFilter(regex),
            Filter::CellsRowLimit(n) => row_filter::Filter::CellsPerRowLimitFilter(n),
            Filter::Latest(n) => row_filter::Filter::CellsPerColumnLimitFilter(n),
            Filter::StripValue => row_filter::Filter::StripValueTransformer(true),
            Filter::Chain(filters) => row_filter::Filter::Chain(row_filter::Chain {
                filters: filters.into_iter().map(Filter::into_wire).collect(),
            }),
            Filter::Interleave(filters) => row_filter::Filter::Interleave(row_filter::Interleave {
                filters: filters.into_iter().map(Filter::into_wire).collect(),
            }),
        };
        RowFilter {
            filter: Some(filter),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn nested_chain_to_wire() {
        let filter = Filter::Chain(vec![
            Filter::FamilyRegex("^cf$".to_string()),
            Filter::Interleave(vec![Filter::Latest(1), Filter::StripValue]),
        ]);

        let Some(row_filter::Filter::Chain(chain)) = filter.into_wire().filter else {
            panic!("expected a chain");
        };
        assert_eq!(chain.filters.len(), 2);
        assert_eq!(
            chain.filters[0].filter,
            Some(row_filter::Filter::FamilyNameRegexFilter("^cf$".to_string()))
        );

        let Some(row_filter::Filter::Interleave(interleave)) = &chain.filters[1].filter else {
            panic!("expected an interleave");
        };
        assert_eq!(
            interleave.filters[0].filter,
            Some(row_filter::Filter::CellsPerColumnLimitFilter(1))
        );
    }

    #[test]
    fn default_passes_everything() {
        assert_eq!(
            Filter::default().into_wire().filter,
            Some(row_filter::Filter::PassAllFilter(true))
        );
    }
}
