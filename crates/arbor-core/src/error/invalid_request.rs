use super::Error;

/// Error when an inbound request document is malformed, e.g. `filters` is
/// not an object.
#[derive(Debug)]
pub(super) struct InvalidRequestError {
    message: Box<str>,
}

impl std::error::Error for InvalidRequestError {}

impl core::fmt::Display for InvalidRequestError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid request: {}", self.message)
    }
}

impl Error {
    /// Creates an invalid request error.
    pub fn invalid_request(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidRequest(InvalidRequestError {
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error, or any error it wraps, is an invalid request error.
    pub fn is_invalid_request(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::InvalidRequest(_)))
    }
}
