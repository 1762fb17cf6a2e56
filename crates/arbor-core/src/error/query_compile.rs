use super::Error;

/// Error when a request cannot be compiled into a statement.
///
/// This occurs when:
/// - A filter key carries an unknown operator
/// - A filter value has the wrong shape for its operator (`in` without an array)
/// - A sort entry has an invalid direction
/// - A list request names no preset
#[derive(Debug)]
pub(super) struct QueryCompileError {
    message: Box<str>,
}

impl std::error::Error for QueryCompileError {}

impl core::fmt::Display for QueryCompileError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "query compile error: {}", self.message)
    }
}

impl Error {
    /// Creates a query compile error.
    pub fn query_compile(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::QueryCompile(QueryCompileError {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error, or any error it wraps, is a query compile error.
    pub fn is_query_compile(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::QueryCompile(_)))
    }
}
