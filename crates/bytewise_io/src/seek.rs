// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use bytewise::{Error, Result};

/// The reference point a [`Seek::seek()`] offset is measured from.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum SeekOrigin {
    /// The beginning of the stream.
    Start,

    /// The current position.
    Current,

    /// The end of the stream.
    End,
}

/// A stream with a movable position.
pub trait Seek {
    /// The current position, measured in bytes from the start of the stream.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::ClosedResource`][bytewise::ErrorKind::ClosedResource] after the
    /// stream has been closed.
    fn position(&self) -> Result<u64>;

    /// Moves the position to `offset` bytes from `origin` and returns the new position.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::InvalidArgument`][bytewise::ErrorKind::InvalidArgument] if the
    /// target is negative and with [`ErrorKind::EndOfStream`][bytewise::ErrorKind::EndOfStream] if
    /// it lies beyond the end of the stream. The position does not change on failure.
    fn seek(&mut self, origin: SeekOrigin, offset: i64) -> Result<u64>;
}

/// A stream whose total size is known.
pub trait HasSize {
    /// The size of the stream in bytes.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::ClosedResource`][bytewise::ErrorKind::ClosedResource] after the
    /// stream has been closed.
    fn size(&self) -> Result<u64>;
}

/// Resolves a seek request against a stream of `size` bytes positioned at `current`.
pub(crate) fn resolve_seek(origin: SeekOrigin, offset: i64, current: u64, size: u64) -> Result<u64> {
    let base = match origin {
        SeekOrigin::Start => 0,
        SeekOrigin::Current => current,
        SeekOrigin::End => size,
    };

    let target = i128::from(base) + i128::from(offset);
    if target < 0 {
        return Err(Error::invalid_argument(format!(
            "seeking {offset} bytes from {origin:?} lands before the start of the stream"
        )));
    }

    match u64::try_from(target) {
        Ok(target) if target <= size => Ok(target),
        _ => Err(Error::end_of_stream(format!(
            "seeking {offset} bytes from {origin:?} lands beyond the end of a {size} byte stream"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use bytewise::ErrorKind;

    use super::*;

    #[test]
    fn resolve_from_each_origin() {
        assert_eq!(resolve_seek(SeekOrigin::Start, 3, 5, 10).unwrap(), 3);
        assert_eq!(resolve_seek(SeekOrigin::Current, -2, 5, 10).unwrap(), 3);
        assert_eq!(resolve_seek(SeekOrigin::End, -10, 5, 10).unwrap(), 0);
        assert_eq!(resolve_seek(SeekOrigin::End, 0, 5, 10).unwrap(), 10);
    }

    #[test]
    fn negative_target_is_invalid() {
        let error = resolve_seek(SeekOrigin::Current, -6, 5, 10).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn target_past_end_is_end_of_stream() {
        let error = resolve_seek(SeekOrigin::Start, 11, 0, 10).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::EndOfStream);

        let error = resolve_seek(SeekOrigin::End, i64::MAX, 0, u64::MAX).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::EndOfStream);
    }
}
