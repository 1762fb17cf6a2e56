use super::select::Column;

use arbor_core::{Document, Error, Result, Value};

/// Turns result rows into nested documents.
///
/// Row values line up positionally with `columns`. Typed columns are
/// normalized to their declared type; hidden key columns keep the backend's
/// representation.
pub(crate) fn scan(columns: &[Column], rows: Vec<Vec<Value>>) -> Result<Vec<Document>> {
    rows.into_iter()
        .map(|row| {
            if row.len() < columns.len() {
                return Err(Error::query_execution(RowShape {
                    expected: columns.len(),
                    actual: row.len(),
                }));
            }

            let flat = columns.iter().zip(row).map(|(column, value)| {
                let value = match column.ty {
                    Some(ty) => ty.coerce(value),
                    None => value,
                };
                (column.key.clone(), value)
            });

            Ok(Document::fold(flat))
        })
        .collect()
}

#[derive(Debug)]
struct RowShape {
    expected: usize,
    actual: usize,
}

impl std::error::Error for RowShape {}

impl std::fmt::Display for RowShape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "row has {} values but {} columns were selected",
            self.actual, self.expected
        )
    }
}
