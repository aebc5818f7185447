use bytes::Bytes;

/// One version of one column of a row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Cell {
    pub family: String,
    pub column: Bytes,
    pub timestamp_micros: i64,
    pub labels: Vec<String>,
    pub value: Bytes,
}

/// A row key and the cells returned for it, in the order the service sent them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Row {
    key: Bytes,
    cells: Vec<Cell>,
}

impl Row {
    pub fn new(key: impl Into<Bytes>, cells: Vec<Cell>) -> Self {
        Self {
            key: key.into(),
            cells,
        }
    }

    pub fn key(&self) -> &Bytes {
        &self.key
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn into_cells(self) -> Vec<Cell> {
        self.cells
    }
}
