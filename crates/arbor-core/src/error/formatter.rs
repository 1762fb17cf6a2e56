use super::Error;

/// Error when a template ternary condition cannot be parsed.
///
/// Rendering never fails with this error: the ternary evaluates to its else
/// branch and the error is logged.
#[derive(Debug)]
pub(super) struct FormatterError {
    template: Box<str>,
    message: Box<str>,
}

impl std::error::Error for FormatterError {}

impl core::fmt::Display for FormatterError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "formatter error in `{}`: {}", self.template, self.message)
    }
}

impl Error {
    /// Creates a formatter error for `template`.
    pub fn formatter(template: impl Into<String>, message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Formatter(FormatterError {
            template: template.into().into(),
            message: message.into().into(),
        }))
    }

    /// Returns `true` if this error, or any error it wraps, is a formatter error.
    pub fn is_formatter(&self) -> bool {
        self.any_kind(|kind| matches!(kind, super::ErrorKind::Formatter(_)))
    }
}
