// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

/// Classifies an [`Error`] by what went wrong.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum ErrorKind {
    /// The operation was attempted on a stream or view that has already been closed.
    ClosedResource,

    /// An exact ("fully") operation could not complete because the data or capacity ran out.
    ///
    /// Raw sequential reads and writes do not use this kind to signal the end of a stream, they
    /// report `Progress::End` (see `bytewise_io`) instead.
    EndOfStream,

    /// A negative offset, an out-of-range integer width or a malformed range was supplied.
    InvalidArgument,

    /// A wrapped endpoint failed. The cause chain holds the endpoint's own error.
    Underlying,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::ClosedResource => "resource is closed",
            Self::EndOfStream => "end of stream",
            Self::InvalidArgument => "invalid argument",
            Self::Underlying => "underlying stream failed",
        };

        f.write_str(text)
    }
}

/// An error signaled by byte region, codec or stream logic.
///
/// Every error carries an [`ErrorKind`] and optionally a cause describing the details, which
/// is shown as part of the error chain when the error is displayed.
///
/// # Example
///
/// ```
/// use bytewise::{Error, ErrorKind};
///
/// let error = Error::invalid_argument("width must be between 1 and 8");
/// assert_eq!(error.kind(), ErrorKind::InvalidArgument);
/// ```
#[ohno::error]
#[display("{kind}")]
pub struct Error {
    kind: ErrorKind,
}

impl Error {
    /// Creates an error of the given kind with a cause.
    pub fn with_kind(kind: ErrorKind, cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(kind, cause)
    }

    /// Creates an [`ErrorKind::EndOfStream`] error.
    pub fn end_of_stream(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::EndOfStream, cause)
    }

    /// Creates an [`ErrorKind::InvalidArgument`] error.
    pub fn invalid_argument(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::InvalidArgument, cause)
    }

    /// Creates an [`ErrorKind::ClosedResource`] error.
    #[must_use]
    pub fn closed() -> Self {
        Self::new(ErrorKind::ClosedResource)
    }

    /// Wraps a failure reported by an underlying endpoint.
    pub fn underlying(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::caused_by(ErrorKind::Underlying, cause)
    }

    /// The kind of failure this error represents.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    /// Whether this error has the [`ErrorKind::EndOfStream`] kind.
    #[must_use]
    pub fn is_end_of_stream(&self) -> bool {
        self.kind == ErrorKind::EndOfStream
    }
}

/// A `Result` that may contain an [`Error`] from this crate.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constructors_assign_kind() {
        assert_eq!(Error::end_of_stream("x").kind(), ErrorKind::EndOfStream);
        assert_eq!(Error::invalid_argument("x").kind(), ErrorKind::InvalidArgument);
        assert_eq!(Error::closed().kind(), ErrorKind::ClosedResource);
        assert_eq!(Error::underlying("x").kind(), ErrorKind::Underlying);
        assert_eq!(Error::with_kind(ErrorKind::Underlying, "x").kind(), ErrorKind::Underlying);
    }

    #[test]
    fn display_contains_kind_and_cause() {
        let error = Error::end_of_stream("needed 4 more bytes");
        let display = format!("{error}");

        assert!(display.contains("end of stream"), "got: {display}");
        assert!(display.contains("needed 4 more bytes"), "got: {display}");
    }

    #[test]
    fn is_end_of_stream_matches_kind_only() {
        assert!(Error::end_of_stream("x").is_end_of_stream());
        assert!(!Error::closed().is_end_of_stream());
    }
}
