// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Debug;

use bytewise::{ByteOrder, ByteRegion, Error, Result, Signedness, codec};

use crate::Progress;
use crate::util::offset_after;

/// Allows for reading at explicit offsets.
///
/// Positional reads neither consult nor change any sequential position the stream may also
/// have. Offsets are measured from the start of the stream.
pub trait ReadAt: Debug {
    /// Reads up to `into.remaining()` bytes starting at `position`.
    ///
    /// Returns [`Progress::End`] if `position` is at or past the end of the stream.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::ClosedResource`][bytewise::ErrorKind::ClosedResource] after the
    /// stream has been closed.
    fn read_at(&mut self, position: u64, into: &mut ByteRegion) -> Result<Progress>;

    /// Fills all remaining bytes of `into` from the bytes starting at `position`.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::EndOfStream`][bytewise::ErrorKind::EndOfStream] if the stream ends
    /// first.
    fn read_fully_at(&mut self, position: u64, into: &mut ByteRegion) -> Result<()> {
        let mut offset = position;

        while into.has_remaining() {
            match self.read_at(offset, into)? {
                Progress::Bytes(count) if count > 0 => offset = offset_after(offset, count)?,
                _ => {
                    return Err(Error::end_of_stream(format!(
                        "stream ended at offset {offset} with {} bytes still to read",
                        into.remaining()
                    )));
                }
            }
        }

        Ok(())
    }

    /// Reads the byte at `position`.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::EndOfStream`][bytewise::ErrorKind::EndOfStream] if `position` is at
    /// or past the end of the stream.
    fn read_byte_at(&mut self, position: u64) -> Result<u8> {
        let mut region = ByteRegion::with_capacity(1);
        self.read_fully_at(position, &mut region)?;
        region.flip();
        region.get_byte()
    }

    /// Reads an integer of `width` bytes starting at `position`.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::InvalidArgument`][bytewise::ErrorKind::InvalidArgument] for an
    /// unsupported width and with [`ErrorKind::EndOfStream`][bytewise::ErrorKind::EndOfStream] if
    /// the integer does not fit before the end of the stream.
    fn read_int_at(&mut self, position: u64, width: usize, order: ByteOrder, signedness: Signedness) -> Result<i64> {
        codec::validate_width(width, signedness)?;

        let mut scratch = ByteRegion::with_capacity(width);
        self.read_fully_at(position, &mut scratch)?;
        scratch.flip();
        scratch.get_int(width, order, signedness)
    }
}
