use super::Error;

/// Error when the schema graph, or a request against it, references something
/// that does not exist or is malformed.
///
/// This occurs when:
/// - A model, relation, preset, or computable name cannot be resolved
/// - A relation declares an invalid `type`
/// - A `through` relation has no matching link on the junction model
/// - A preset's `extends` chain loops back on itself
#[derive(Debug)]
pub(super) struct SchemaError {
    message: Box<str>,
}

impl std::error::Error for SchemaError {}

impl core::fmt::Display for SchemaError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "schema error: {}", self.message)
    }
}

impl Error {
    /// Creates a schema error.
    pub fn schema(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Schema(SchemaError {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error, or any error it wraps, is a schema error.
    pub fn is_schema(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::Schema(_)))
    }
}
