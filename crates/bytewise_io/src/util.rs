// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::num::NonZero;

use bytewise::{Error, Result};

use crate::MIN_BUFFER_SIZE;

pub(crate) fn ensure_open(closed: bool) -> Result<()> {
    if closed { Err(Error::closed()) } else { Ok(()) }
}

/// Raises a configured buffer size to the floor every buffering layer relies on.
pub(crate) fn effective_buffer_size(requested: NonZero<usize>) -> usize {
    requested.get().max(MIN_BUFFER_SIZE)
}

/// Converts a byte count to a stream offset.
pub(crate) fn to_u64(count: usize) -> u64 {
    u64::try_from(count).unwrap_or(u64::MAX)
}

/// Converts a stream distance to a byte count, saturating on targets with a narrow `usize`.
///
/// Used for clipping, where "more than fits in memory" and "everything" mean the same thing.
pub(crate) fn saturating_usize(distance: u64) -> usize {
    usize::try_from(distance).unwrap_or(usize::MAX)
}

pub(crate) fn seek_offset(offset: u64) -> Result<i64> {
    i64::try_from(offset).map_err(Error::invalid_argument)
}

/// Computes `position + count`, reporting an overflow as running off the end of the stream.
pub(crate) fn offset_after(position: u64, count: usize) -> Result<u64> {
    position
        .checked_add(to_u64(count))
        .ok_or_else(|| Error::end_of_stream(format!("{count} bytes at offset {position} overflow the offset space")))
}

#[cfg(test)]
mod tests {
    use bytewise::ErrorKind;

    use super::*;

    #[test]
    fn ensure_open_reports_closed() {
        ensure_open(false).unwrap();
        assert_eq!(ensure_open(true).unwrap_err().kind(), ErrorKind::ClosedResource);
    }

    #[test]
    fn buffer_size_has_floor() {
        assert_eq!(effective_buffer_size(NonZero::new(1).unwrap()), MIN_BUFFER_SIZE);
        assert_eq!(effective_buffer_size(NonZero::new(4096).unwrap()), 4096);
    }

    #[test]
    fn offset_after_detects_overflow() {
        assert_eq!(offset_after(10, 5).unwrap(), 15);
        assert_eq!(offset_after(u64::MAX, 1).unwrap_err().kind(), ErrorKind::EndOfStream);
    }

    #[test]
    fn seek_offset_rejects_huge_values() {
        assert_eq!(seek_offset(7).unwrap(), 7);
        assert_eq!(seek_offset(u64::MAX).unwrap_err().kind(), ErrorKind::InvalidArgument);
    }
}
