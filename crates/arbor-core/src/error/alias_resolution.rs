use super::Error;

/// A statement referenced a relation path that the alias planner never
/// assigned an alias to. This is an internal consistency failure.
#[derive(Debug)]
pub(super) struct AliasResolutionError {
    path: Box<str>,
}

impl std::error::Error for AliasResolutionError {}

impl core::fmt::Display for AliasResolutionError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "no alias planned for relation path `{}`", self.path)
    }
}

impl Error {
    /// Creates an alias resolution error for the given relation path.
    pub fn alias_resolution(path: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::AliasResolution(AliasResolutionError {
            path: path.into().into(),
        }))
    }

    /// Returns `true` if this error, or any error it wraps, is an alias resolution error.
    pub fn is_alias_resolution(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::AliasResolution(_)))
    }
}
