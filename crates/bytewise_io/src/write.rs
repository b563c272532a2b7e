// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Debug;

use bytewise::{ByteOrder, ByteRegion, Error, Result, Signedness, codec};

use crate::Progress;

/// Allows for sequential writing of bytes.
///
/// A sink owns a position that every successful write advances by the number of bytes that
/// were accepted.
///
/// [`write_some()`][Self::write_some] is the raw primitive and may accept fewer bytes than
/// offered. The provided methods loop over it until everything is written, failing with
/// [`ErrorKind::EndOfStream`][bytewise::ErrorKind::EndOfStream] if the sink stops accepting data.
pub trait Write: Debug {
    /// Writes up to `from.remaining()` bytes from `from`, advancing its position past the bytes
    /// that were accepted.
    ///
    /// Returns [`Progress::End`] if the sink cannot accept any more bytes.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::ClosedResource`][bytewise::ErrorKind::ClosedResource] after the sink
    /// has been closed and with [`ErrorKind::Underlying`][bytewise::ErrorKind::Underlying] if a wrapped
    /// endpoint fails.
    fn write_some(&mut self, from: &mut ByteRegion) -> Result<Progress>;

    /// Pushes any buffered bytes down to the final destination.
    ///
    /// # Errors
    ///
    /// Fails if buffered bytes cannot be written.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Writes all remaining bytes of `from`.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::EndOfStream`][bytewise::ErrorKind::EndOfStream] if the sink stops
    /// accepting bytes first. The bytes accepted before that point stay written.
    fn write_fully(&mut self, from: &mut ByteRegion) -> Result<()> {
        while from.has_remaining() {
            if self.write_some(from)?.is_stalled() {
                return Err(Error::end_of_stream(format!(
                    "sink stopped accepting data with {} bytes still to write",
                    from.remaining()
                )));
            }
        }

        Ok(())
    }

    /// Writes all of `data`.
    ///
    /// # Errors
    ///
    /// Fails as [`write_fully()`][Self::write_fully] does.
    fn write_slice(&mut self, data: &[u8]) -> Result<()> {
        self.write_fully(&mut ByteRegion::copied_from_slice(data))
    }

    /// Writes exactly one byte.
    ///
    /// # Errors
    ///
    /// Fails as [`write_fully()`][Self::write_fully] does.
    fn write_byte(&mut self, value: u8) -> Result<()> {
        self.write_slice(&[value])
    }

    /// Writes an integer as `width` bytes.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::InvalidArgument`][bytewise::ErrorKind::InvalidArgument] for a width
    /// the codec does not support, in which case nothing is written.
    fn write_int(&mut self, width: usize, value: i64, order: ByteOrder, signedness: Signedness) -> Result<()> {
        let encoded = codec::encode(width, value, order, signedness)?;
        self.write_slice(&encoded)
    }
}
