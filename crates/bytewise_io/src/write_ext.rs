// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use bytewise::{Result, Signedness};

use crate::{ByteOrdered, Write, WriteAt};

/// Typed integer writes using the stream's configured [`ByteOrder`][bytewise::ByteOrder].
///
/// Automatically implemented for every [`Write`] that is also [`ByteOrdered`].
///
/// # Example
///
/// ```
/// use bytewise::ByteOrder;
/// use bytewise_io::{MemoryStream, WriteExt};
///
/// let mut stream = MemoryStream::builder().byte_order(ByteOrder::BigEndian).build();
/// stream.write_u16(0x1234).unwrap();
/// stream.write_i8(-1).unwrap();
///
/// assert_eq!(stream.as_slice(), &[0x12, 0x34, 0xFF]);
/// ```
pub trait WriteExt: Write + ByteOrdered {
    /// Writes a signed integer as `width` bytes (1 to 8).
    ///
    /// # Errors
    ///
    /// Fails as [`Write::write_int()`] does.
    fn write_signed(&mut self, width: usize, value: i64) -> Result<()> {
        let order = self.byte_order();
        self.write_int(width, value, order, Signedness::Signed)
    }

    /// Writes an unsigned integer as `width` bytes (1 to 7).
    ///
    /// # Errors
    ///
    /// Fails as [`Write::write_int()`] does.
    fn write_unsigned(&mut self, width: usize, value: i64) -> Result<()> {
        let order = self.byte_order();
        self.write_int(width, value, order, Signedness::Unsigned)
    }

    /// Writes a `u8`.
    ///
    /// # Errors
    ///
    /// Fails as [`Write::write_byte()`] does.
    fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_byte(value)
    }

    /// Writes an `i8`.
    ///
    /// # Errors
    ///
    /// Fails as [`Write::write_int()`] does.
    fn write_i8(&mut self, value: i8) -> Result<()> {
        self.write_signed(1, i64::from(value))
    }

    /// Writes a `u16`.
    ///
    /// # Errors
    ///
    /// Fails as [`Write::write_int()`] does.
    fn write_u16(&mut self, value: u16) -> Result<()> {
        self.write_unsigned(2, i64::from(value))
    }

    /// Writes an `i16`.
    ///
    /// # Errors
    ///
    /// Fails as [`Write::write_int()`] does.
    fn write_i16(&mut self, value: i16) -> Result<()> {
        self.write_signed(2, i64::from(value))
    }

    /// Writes a `u32`.
    ///
    /// # Errors
    ///
    /// Fails as [`Write::write_int()`] does.
    fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_unsigned(4, i64::from(value))
    }

    /// Writes an `i32`.
    ///
    /// # Errors
    ///
    /// Fails as [`Write::write_int()`] does.
    fn write_i32(&mut self, value: i32) -> Result<()> {
        self.write_signed(4, i64::from(value))
    }

    /// Writes an `i64`.
    ///
    /// # Errors
    ///
    /// Fails as [`Write::write_int()`] does.
    fn write_i64(&mut self, value: i64) -> Result<()> {
        self.write_signed(8, value)
    }
}

impl<T> WriteExt for T where T: Write + ByteOrdered + ?Sized {}

/// Typed positional integer writes using the stream's configured [`ByteOrder`][bytewise::ByteOrder].
///
/// Automatically implemented for every [`WriteAt`] that is also [`ByteOrdered`].
pub trait WriteAtExt: WriteAt + ByteOrdered {
    /// Writes a signed integer as `width` bytes at `position`.
    ///
    /// # Errors
    ///
    /// Fails as [`WriteAt::write_int_at()`] does.
    fn write_signed_at(&mut self, position: u64, width: usize, value: i64) -> Result<()> {
        let order = self.byte_order();
        self.write_int_at(position, width, value, order, Signedness::Signed)
    }

    /// Writes an unsigned integer as `width` bytes at `position`.
    ///
    /// # Errors
    ///
    /// Fails as [`WriteAt::write_int_at()`] does.
    fn write_unsigned_at(&mut self, position: u64, width: usize, value: i64) -> Result<()> {
        let order = self.byte_order();
        self.write_int_at(position, width, value, order, Signedness::Unsigned)
    }

    /// Writes a `u16` at `position`.
    ///
    /// # Errors
    ///
    /// Fails as [`WriteAt::write_int_at()`] does.
    fn write_u16_at(&mut self, position: u64, value: u16) -> Result<()> {
        self.write_unsigned_at(position, 2, i64::from(value))
    }

    /// Writes an `i16` at `position`.
    ///
    /// # Errors
    ///
    /// Fails as [`WriteAt::write_int_at()`] does.
    fn write_i16_at(&mut self, position: u64, value: i16) -> Result<()> {
        self.write_signed_at(position, 2, i64::from(value))
    }

    /// Writes a `u32` at `position`.
    ///
    /// # Errors
    ///
    /// Fails as [`WriteAt::write_int_at()`] does.
    fn write_u32_at(&mut self, position: u64, value: u32) -> Result<()> {
        self.write_unsigned_at(position, 4, i64::from(value))
    }

    /// Writes an `i32` at `position`.
    ///
    /// # Errors
    ///
    /// Fails as [`WriteAt::write_int_at()`] does.
    fn write_i32_at(&mut self, position: u64, value: i32) -> Result<()> {
        self.write_signed_at(position, 4, i64::from(value))
    }

    /// Writes an `i64` at `position`.
    ///
    /// # Errors
    ///
    /// Fails as [`WriteAt::write_int_at()`] does.
    fn write_i64_at(&mut self, position: u64, value: i64) -> Result<()> {
        self.write_signed_at(position, 8, value)
    }
}

impl<T> WriteAtExt for T where T: WriteAt + ByteOrdered + ?Sized {}

#[cfg(test)]
mod tests {
    use bytewise::ByteOrder;

    use super::*;
    use crate::MemoryStream;

    #[test]
    fn typed_writes_follow_configured_order() {
        let mut stream = MemoryStream::builder().byte_order(ByteOrder::LittleEndian).build();

        stream.write_u32(0x0102_0304).unwrap();
        stream.write_i16(-2).unwrap();
        stream.write_u8(9).unwrap();

        assert_eq!(stream.as_slice(), &[0x04, 0x03, 0x02, 0x01, 0xFE, 0xFF, 9]);
    }

    #[test]
    fn i64_round_trips_extremes() {
        let mut stream = MemoryStream::new();

        stream.write_i64(i64::MIN).unwrap();
        stream.write_i64_at(8, i64::MAX).unwrap();

        assert_eq!(stream.as_slice()[..8], i64::MIN.to_le_bytes());
        assert_eq!(stream.as_slice()[8..], i64::MAX.to_le_bytes());
    }

    #[test]
    fn positional_typed_writes_overwrite_in_place() {
        let mut stream = MemoryStream::builder()
            .contents(vec![0; 6])
            .byte_order(ByteOrder::BigEndian)
            .fixed_size()
            .build();

        stream.write_u16_at(1, 0xABCD).unwrap();
        stream.write_unsigned_at(3, 3, 0x01_0203).unwrap();

        assert_eq!(stream.as_slice(), &[0, 0xAB, 0xCD, 0x01, 0x02, 0x03]);
    }
}
