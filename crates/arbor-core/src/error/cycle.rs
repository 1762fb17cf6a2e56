use super::Error;

/// Error when a traversal revisits a model it is not allowed to revisit.
///
/// Raised for a revisit through a non-reentrant relation, and for a revisit
/// that goes past the relation's effective max depth.
#[derive(Debug)]
pub(super) struct CycleError {
    message: Box<str>,
}

impl std::error::Error for CycleError {}

impl core::fmt::Display for CycleError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "cycle detected: {}", self.message)
    }
}

impl Error {
    /// Creates a cycle error.
    pub fn cycle(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Cycle(CycleError {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error, or any error it wraps, is a cycle error.
    pub fn is_cycle(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::Cycle(_)))
    }
}
