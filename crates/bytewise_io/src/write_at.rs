// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Debug;

use bytewise::{ByteOrder, ByteRegion, Error, Result, Signedness, codec};

use crate::Progress;
use crate::util::offset_after;

/// Allows for writing at explicit offsets.
///
/// Positional writes neither consult nor change any sequential position the stream may also
/// have.
pub trait WriteAt: Debug {
    /// Writes up to `from.remaining()` bytes starting at `position`.
    ///
    /// Returns [`Progress::End`] if the stream cannot accept any bytes at `position`.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::ClosedResource`][bytewise::ErrorKind::ClosedResource] after the
    /// stream has been closed.
    fn write_at(&mut self, position: u64, from: &mut ByteRegion) -> Result<Progress>;

    /// Writes all remaining bytes of `from` starting at `position`.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::EndOfStream`][bytewise::ErrorKind::EndOfStream] if the stream stops
    /// accepting bytes first.
    fn write_fully_at(&mut self, position: u64, from: &mut ByteRegion) -> Result<()> {
        let mut offset = position;

        while from.has_remaining() {
            match self.write_at(offset, from)? {
                Progress::Bytes(count) if count > 0 => offset = offset_after(offset, count)?,
                _ => {
                    return Err(Error::end_of_stream(format!(
                        "stream stopped accepting data at offset {offset} with {} bytes still to write",
                        from.remaining()
                    )));
                }
            }
        }

        Ok(())
    }

    /// Writes all of `data` starting at `position`.
    ///
    /// # Errors
    ///
    /// Fails as [`write_fully_at()`][Self::write_fully_at] does.
    fn write_slice_at(&mut self, position: u64, data: &[u8]) -> Result<()> {
        self.write_fully_at(position, &mut ByteRegion::copied_from_slice(data))
    }

    /// Writes one byte at `position`.
    ///
    /// # Errors
    ///
    /// Fails as [`write_fully_at()`][Self::write_fully_at] does.
    fn write_byte_at(&mut self, position: u64, value: u8) -> Result<()> {
        self.write_slice_at(position, &[value])
    }

    /// Writes an integer as `width` bytes starting at `position`.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::InvalidArgument`][bytewise::ErrorKind::InvalidArgument] for an
    /// unsupported width, in which case nothing is written.
    fn write_int_at(&mut self, position: u64, width: usize, value: i64, order: ByteOrder, signedness: Signedness) -> Result<()> {
        let encoded = codec::encode(width, value, order, signedness)?;
        self.write_slice_at(position, &encoded)
    }
}
