// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use bytewise::{Error, Result, Signedness};

use crate::{ByteOrdered, Read, ReadAt};

fn narrow<T>(value: i64) -> Result<T>
where
    T: TryFrom<i64>,
    T::Error: std::error::Error + Send + Sync + 'static,
{
    T::try_from(value).map_err(Error::invalid_argument)
}

/// Typed integer reads using the stream's configured [`ByteOrder`][bytewise::ByteOrder].
///
/// Automatically implemented for every [`Read`] that is also [`ByteOrdered`].
///
/// # Example
///
/// ```
/// use bytewise::ByteOrder;
/// use bytewise_io::{MemoryStream, ReadExt};
///
/// let mut stream = MemoryStream::builder()
///     .contents(vec![0x12, 0x34, 0xFF])
///     .byte_order(ByteOrder::BigEndian)
///     .build();
///
/// assert_eq!(stream.read_u16().unwrap(), 0x1234);
/// assert_eq!(stream.read_i8().unwrap(), -1);
/// ```
pub trait ReadExt: Read + ByteOrdered {
    /// Reads a signed integer of `width` bytes (1 to 8).
    ///
    /// # Errors
    ///
    /// Fails as [`Read::read_int()`] does.
    fn read_signed(&mut self, width: usize) -> Result<i64> {
        let order = self.byte_order();
        self.read_int(width, order, Signedness::Signed)
    }

    /// Reads an unsigned integer of `width` bytes (1 to 7).
    ///
    /// # Errors
    ///
    /// Fails as [`Read::read_int()`] does.
    fn read_unsigned(&mut self, width: usize) -> Result<i64> {
        let order = self.byte_order();
        self.read_int(width, order, Signedness::Unsigned)
    }

    /// Reads a `u8`.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::EndOfStream`][bytewise::ErrorKind::EndOfStream] at the end of the stream.
    fn read_u8(&mut self) -> Result<u8> {
        self.read_byte()
    }

    /// Reads an `i8`.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::EndOfStream`][bytewise::ErrorKind::EndOfStream] at the end of the stream.
    fn read_i8(&mut self) -> Result<i8> {
        narrow(self.read_signed(1)?)
    }

    /// Reads a `u16`.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::EndOfStream`][bytewise::ErrorKind::EndOfStream] if fewer than 2 bytes are left.
    fn read_u16(&mut self) -> Result<u16> {
        narrow(self.read_unsigned(2)?)
    }

    /// Reads an `i16`.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::EndOfStream`][bytewise::ErrorKind::EndOfStream] if fewer than 2 bytes are left.
    fn read_i16(&mut self) -> Result<i16> {
        narrow(self.read_signed(2)?)
    }

    /// Reads a `u32`.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::EndOfStream`][bytewise::ErrorKind::EndOfStream] if fewer than 4 bytes are left.
    fn read_u32(&mut self) -> Result<u32> {
        narrow(self.read_unsigned(4)?)
    }

    /// Reads an `i32`.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::EndOfStream`][bytewise::ErrorKind::EndOfStream] if fewer than 4 bytes are left.
    fn read_i32(&mut self) -> Result<i32> {
        narrow(self.read_signed(4)?)
    }

    /// Reads an `i64`.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::EndOfStream`][bytewise::ErrorKind::EndOfStream] if fewer than 8 bytes are left.
    fn read_i64(&mut self) -> Result<i64> {
        self.read_signed(8)
    }
}

impl<T> ReadExt for T where T: Read + ByteOrdered + ?Sized {}

/// Typed positional integer reads using the stream's configured [`ByteOrder`][bytewise::ByteOrder].
///
/// Automatically implemented for every [`ReadAt`] that is also [`ByteOrdered`].
pub trait ReadAtExt: ReadAt + ByteOrdered {
    /// Reads a signed integer of `width` bytes at `position`.
    ///
    /// # Errors
    ///
    /// Fails as [`ReadAt::read_int_at()`] does.
    fn read_signed_at(&mut self, position: u64, width: usize) -> Result<i64> {
        let order = self.byte_order();
        self.read_int_at(position, width, order, Signedness::Signed)
    }

    /// Reads an unsigned integer of `width` bytes at `position`.
    ///
    /// # Errors
    ///
    /// Fails as [`ReadAt::read_int_at()`] does.
    fn read_unsigned_at(&mut self, position: u64, width: usize) -> Result<i64> {
        let order = self.byte_order();
        self.read_int_at(position, width, order, Signedness::Unsigned)
    }

    /// Reads a `u16` at `position`.
    ///
    /// # Errors
    ///
    /// Fails as [`ReadAt::read_int_at()`] does.
    fn read_u16_at(&mut self, position: u64) -> Result<u16> {
        narrow(self.read_unsigned_at(position, 2)?)
    }

    /// Reads an `i16` at `position`.
    ///
    /// # Errors
    ///
    /// Fails as [`ReadAt::read_int_at()`] does.
    fn read_i16_at(&mut self, position: u64) -> Result<i16> {
        narrow(self.read_signed_at(position, 2)?)
    }

    /// Reads a `u32` at `position`.
    ///
    /// # Errors
    ///
    /// Fails as [`ReadAt::read_int_at()`] does.
    fn read_u32_at(&mut self, position: u64) -> Result<u32> {
        narrow(self.read_unsigned_at(position, 4)?)
    }

    /// Reads an `i32` at `position`.
    ///
    /// # Errors
    ///
    /// Fails as [`ReadAt::read_int_at()`] does.
    fn read_i32_at(&mut self, position: u64) -> Result<i32> {
        narrow(self.read_signed_at(position, 4)?)
    }

    /// Reads an `i64` at `position`.
    ///
    /// # Errors
    ///
    /// Fails as [`ReadAt::read_int_at()`] does.
    fn read_i64_at(&mut self, position: u64) -> Result<i64> {
        self.read_signed_at(position, 8)
    }
}

impl<T> ReadAtExt for T where T: ReadAt + ByteOrdered + ?Sized {}
