use crate::Value;

/// Rows returned by a driver. Each row holds one value per selected column,
/// positionally.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Response {
    pub rows: Vec<Vec<Value>>,
}

impl Response {
    pub fn rows(rows: Vec<Vec<Value>>) -> Self {
        Self { rows }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    /// A single-row, single-column response, as returned by a count.
    pub fn scalar(value: impl Into<Value>) -> Self {
        Self {
            rows: vec![vec![value.into()]],
        }
    }

    pub fn into_rows(self) -> Vec<Vec<Value>> {
        self.rows
    }

    /// The first column of the first row.
    pub fn first_value(&self) -> Option<&Value> {
        self.rows.first().and_then(|row| row.first())
    }
}
