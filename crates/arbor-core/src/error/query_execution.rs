use super::Error;

/// Error when the storage backend fails to execute a statement.
///
/// Wraps the driver library's error (tokio-postgres, etc.) and walks its
/// source chain when displayed.
#[derive(Debug)]
pub(super) struct QueryExecutionError {
    pub(super) inner: Box<dyn std::error::Error + Send + Sync>,
}

impl std::error::Error for QueryExecutionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(self.inner.as_ref())
    }
}

impl core::fmt::Display for QueryExecutionError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("query execution failed: ")?;
        core::fmt::Display::fmt(&self.inner, f)?;
        let mut source = self.inner.source();
        while let Some(err) = source {
            write!(f, ": {}", err)?;
            source = err.source();
        }
        Ok(())
    }
}

impl Error {
    /// Creates an error from a backend failure.
    ///
    /// This is the preferred way to convert driver-specific errors into arbor errors.
    pub fn query_execution(err: impl std::error::Error + Send + Sync + 'static) -> Error {
        Error::from(super::ErrorKind::QueryExecution(QueryExecutionError {
            inner: Box::new(err),
        }))
    }

    /// Returns `true` if this error, or any error it wraps, is a backend failure.
    pub fn is_query_execution(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::QueryExecution(_)))
    }
}
