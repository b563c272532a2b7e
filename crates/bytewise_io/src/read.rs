// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt::Debug;

use bytewise::{ByteOrder, ByteRegion, Error, Result, Signedness, codec};

use crate::Progress;
use crate::util::to_u64;

// Upper bound on the scratch region the default `skip_up_to()` reads into.
const SKIP_SCRATCH_SIZE: usize = 4096;

/// Allows for sequential reading of bytes.
///
/// A source owns a position that every successful read advances by the number of bytes that
/// were transferred.
///
/// # Raw reads and exact reads
///
/// [`read_some()`][Self::read_some] is the raw primitive: it transfers as many bytes as the
/// source finds convenient, possibly fewer than requested, and reports the end of the stream as
/// [`Progress::End`] instead of failing.
///
/// The provided methods build exact operations on top of it. They either transfer everything
/// that was asked for or fail with [`ErrorKind::EndOfStream`][bytewise::ErrorKind::EndOfStream].
/// Implementations may override them to skip intermediate copies, for example by decoding an
/// integer in place.
pub trait Read: Debug {
    /// Reads up to `into.remaining()` bytes into `into`, advancing its position.
    ///
    /// Returns [`Progress::Bytes`] with a non-zero count if any bytes were read, `Progress::Bytes(0)`
    /// if `into` has no remaining bytes and [`Progress::End`] if the source has no more data.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::ClosedResource`][bytewise::ErrorKind::ClosedResource] after the source
    /// has been closed and with [`ErrorKind::Underlying`][bytewise::ErrorKind::Underlying] if a wrapped
    /// endpoint fails.
    fn read_some(&mut self, into: &mut ByteRegion) -> Result<Progress>;

    /// Reads exactly one byte.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::EndOfStream`][bytewise::ErrorKind::EndOfStream] if the source has no
    /// more data.
    fn read_byte(&mut self) -> Result<u8> {
        let mut region = ByteRegion::with_capacity(1);
        self.read_fully(&mut region)?;
        region.flip();
        region.get_byte()
    }

    /// Fills all remaining bytes of `into`.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::EndOfStream`][bytewise::ErrorKind::EndOfStream] if the source ends
    /// first. The bytes read before that point stay in `into`.
    fn read_fully(&mut self, into: &mut ByteRegion) -> Result<()> {
        while into.has_remaining() {
            if self.read_some(into)?.is_stalled() {
                return Err(Error::end_of_stream(format!(
                    "source ended with {} bytes still to read",
                    into.remaining()
                )));
            }
        }

        Ok(())
    }

    /// Reads an integer of `width` bytes.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::InvalidArgument`][bytewise::ErrorKind::InvalidArgument] for a width
    /// the codec does not support and with [`ErrorKind::EndOfStream`][bytewise::ErrorKind::EndOfStream]
    /// if fewer than `width` bytes are left.
    fn read_int(&mut self, width: usize, order: ByteOrder, signedness: Signedness) -> Result<i64> {
        codec::validate_width(width, signedness)?;

        let mut scratch = ByteRegion::with_capacity(width);
        self.read_fully(&mut scratch)?;
        scratch.flip();
        scratch.get_int(width, order, signedness)
    }

    /// Discards up to `count` bytes, returning how many were discarded.
    ///
    /// May discard fewer bytes than requested even when more are available. Returns zero only
    /// when `count` is zero or the source has ended.
    ///
    /// # Errors
    ///
    /// Fails as [`read_some()`][Self::read_some] does.
    fn skip_up_to(&mut self, count: u64) -> Result<u64> {
        if count == 0 {
            return Ok(0);
        }

        let scratch_size = usize::try_from(count).unwrap_or(usize::MAX).min(SKIP_SCRATCH_SIZE);
        let mut scratch = ByteRegion::with_capacity(scratch_size);

        Ok(to_u64(self.read_some(&mut scratch)?.bytes()))
    }
}

#[cfg(test)]
mod tests {
    use bytewise::ErrorKind;
    use new_zealand::nz;

    use super::*;
    use crate::testing::FakeRead;

    #[test]
    fn read_fully_joins_short_reads() {
        let mut source = FakeRead::builder().contents(vec![1, 2, 3, 4, 5]).max_read_size(nz!(2)).build();

        let mut region = ByteRegion::with_capacity(5);
        source.read_fully(&mut region).unwrap();
        region.flip();

        assert_eq!(region.as_slice(), &[1, 2, 3, 4, 5]);
    }

    #[test]
    fn read_fully_keeps_partial_data_on_end() {
        let mut source = FakeRead::new(vec![9, 8]);

        let mut region = ByteRegion::with_capacity(4);
        let error = source.read_fully(&mut region).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::EndOfStream);
        assert_eq!(region.processed(), &[9, 8]);
    }

    #[test]
    fn read_int_across_one_byte_reads() {
        let mut source = FakeRead::builder()
            .contents(vec![0x01, 0x02, 0x03, 0x04])
            .max_read_size(nz!(1))
            .build();

        let value = source.read_int(4, ByteOrder::BigEndian, Signedness::Signed).unwrap();
        assert_eq!(value, 0x0102_0304);
    }

    #[test]
    fn read_int_rejects_bad_width_without_consuming() {
        let mut source = FakeRead::new(vec![1; 8]);

        let error = source.read_int(8, ByteOrder::LittleEndian, Signedness::Unsigned).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidArgument);
        assert_eq!(source.remaining(), 8);
    }

    #[test]
    fn read_byte_at_end() {
        let mut source = FakeRead::new(vec![7]);

        assert_eq!(source.read_byte().unwrap(), 7);
        assert_eq!(source.read_byte().unwrap_err().kind(), ErrorKind::EndOfStream);
    }

    #[test]
    fn skip_up_to_is_bounded_by_data() {
        let mut source = FakeRead::new(vec![0; 10]);

        assert_eq!(source.skip_up_to(0).unwrap(), 0);
        assert_eq!(source.skip_up_to(4).unwrap(), 4);
        assert_eq!(source.skip_up_to(100).unwrap(), 6);
        assert_eq!(source.skip_up_to(1).unwrap(), 0);
    }
}
