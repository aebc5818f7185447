use tabula_core::{row::Row, tonic::Status};

/// A wrapper struct for a formatted string.
///
/// Implements `Display` so it can be printed directly.
pub struct FormattedString(pub String);

/// The outcome of a single-row lookup.
pub struct RowLookup(pub bool, pub Row);

impl std::fmt::Display for FormattedString {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "{}", self.0)
    }
}

impl From<Status> for FormattedString {
    fn from(status: Status) -> Self {
        FormattedString(format!(
            "RPC Failed: code={:?} message={:?}",
            status.code(),
            status.message()
        ))
    }
}

impl From<&Row> for FormattedString {
    fn from(row: &Row) -> Self {
        let mut out = String::from_utf8_lossy(row.key()).into_owned();
        for cell in row.cells() {
            out.push_str(&format!(
                "\n  {}:{} @{}\n    {}",
                cell.family,
                String::from_utf8_lossy(&cell.column),
                cell.timestamp_micros,
                String::from_utf8_lossy(&cell.value),
            ));
        }
        FormattedString(out)
    }
}

impl From<RowLookup> for FormattedString {
    fn from(RowLookup(found, row): RowLookup) -> Self {
        if found {
            FormattedString::from(&row)
        } else {
            FormattedString(format!(
                "Row '{}' not found",
                String::from_utf8_lossy(row.key())
            ))
        }
    }
}
