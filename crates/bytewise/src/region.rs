// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::fmt;

use crate::{ByteOrder, Error, GrowthStrategy, Result, Signedness, codec};

/// An owned byte buffer with a cursor.
///
/// A region covers a window of its buffer described by three indexes that always satisfy
/// `start <= position <= end <= capacity`:
///
/// * `start` is where the region begins. It never changes after construction.
/// * `position` is where the next byte is read from or written to. Every read and write
///   advances it.
/// * `end` is where the region stops. Reads and writes never cross it.
///
/// The bytes between `position` and `end` are the *remaining* bytes. When reading, these are the
/// bytes that have not been consumed yet. When writing, they are the unused capacity.
///
/// A region is typically filled by a writer and then [flipped][Self::flip] so that what was
/// written becomes readable.
///
/// ```
/// use bytewise::{ByteOrder, ByteRegion, Signedness};
///
/// let mut region = ByteRegion::with_capacity(16);
/// region.put_slice(b"id");
/// region.put_int(4, 1234, ByteOrder::BigEndian, Signedness::Signed).unwrap();
///
/// region.flip();
/// assert_eq!(region.remaining(), 6);
///
/// let mut tag = [0_u8; 2];
/// region.get_slice(&mut tag);
/// assert_eq!(&tag, b"id");
/// assert_eq!(region.get_int(4, ByteOrder::BigEndian, Signedness::Signed).unwrap(), 1234);
/// ```
#[derive(Clone, Default)]
pub struct ByteRegion {
    buffer: Vec<u8>,
    start: usize,
    position: usize,
    end: usize,
}

impl ByteRegion {
    /// Creates a region with no capacity.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            buffer: Vec::new(),
            start: 0,
            position: 0,
            end: 0,
        }
    }

    /// Creates a zero-filled region of `capacity` bytes, ready to be written to.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: vec![0; capacity],
            start: 0,
            position: 0,
            end: capacity,
        }
    }

    /// Creates a region over `buffer` whose whole contents are remaining (readable).
    #[must_use]
    pub fn from_vec(buffer: Vec<u8>) -> Self {
        let end = buffer.len();

        Self {
            buffer,
            start: 0,
            position: 0,
            end,
        }
    }

    /// Creates a region holding a copy of `data`, all of it remaining.
    #[must_use]
    pub fn copied_from_slice(data: &[u8]) -> Self {
        Self::from_vec(data.to_vec())
    }

    /// Creates a region over `buffer` with explicit indexes.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidArgument`][crate::ErrorKind::InvalidArgument] unless
    /// `start <= position <= end <= buffer.len()`.
    pub fn from_parts(buffer: Vec<u8>, start: usize, position: usize, end: usize) -> Result<Self> {
        if start > position || position > end || end > buffer.len() {
            return Err(Error::invalid_argument(format!(
                "region indexes must satisfy start <= position <= end <= capacity, got {start}, {position}, {end}, {}",
                buffer.len()
            )));
        }

        Ok(Self {
            buffer,
            start,
            position,
            end,
        })
    }

    /// Index of the first byte of the region.
    #[must_use]
    pub fn start(&self) -> usize {
        self.start
    }

    /// Index of the next byte to read or write.
    #[must_use]
    pub fn position(&self) -> usize {
        self.position
    }

    /// Index one past the last byte that may be read or written.
    #[must_use]
    pub fn end(&self) -> usize {
        self.end
    }

    /// Size of the backing buffer.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Number of bytes between the position and the end.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.end - self.position
    }

    /// Whether any bytes remain between the position and the end.
    #[must_use]
    pub fn has_remaining(&self) -> bool {
        self.position < self.end
    }

    /// Moves the position.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidArgument`][crate::ErrorKind::InvalidArgument] unless
    /// `start <= position <= end`.
    pub fn set_position(&mut self, position: usize) -> Result<()> {
        if position < self.start || position > self.end {
            return Err(Error::invalid_argument(format!(
                "position {position} is outside of region {}..={}",
                self.start, self.end
            )));
        }

        self.position = position;
        Ok(())
    }

    /// Moves the end.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidArgument`][crate::ErrorKind::InvalidArgument] unless
    /// `position <= end <= capacity`.
    pub fn set_end(&mut self, end: usize) -> Result<()> {
        if end < self.position || end > self.buffer.len() {
            return Err(Error::invalid_argument(format!(
                "end {end} is outside of {}..={}",
                self.position,
                self.buffer.len()
            )));
        }

        self.end = end;
        Ok(())
    }

    /// Advances the position by `count` bytes without touching them.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::EndOfStream`][crate::ErrorKind::EndOfStream] if fewer than `count`
    /// bytes remain. The position is not changed in that case.
    pub fn advance(&mut self, count: usize) -> Result<()> {
        if count > self.remaining() {
            return Err(Error::end_of_stream(format!(
                "cannot advance by {count} bytes, only {} remain",
                self.remaining()
            )));
        }

        self.position += count;
        Ok(())
    }

    /// Turns the bytes written so far into the readable contents of the region.
    ///
    /// The end moves to the current position and the position moves back to the start.
    pub fn flip(&mut self) {
        self.end = self.position;
        self.position = self.start;
    }

    /// Moves the position back to the start, keeping the end.
    pub fn rewind(&mut self) {
        self.position = self.start;
    }

    /// Makes the whole buffer from the start onwards available for writing again.
    pub fn clear(&mut self) {
        self.position = self.start;
        self.end = self.buffer.len();
    }

    /// Moves the remaining bytes to the start and prepares the region for writing after them.
    ///
    /// Used when some but not all bytes have been consumed and more are to be appended.
    pub fn compact(&mut self) {
        let remaining = self.remaining();
        self.buffer.copy_within(self.position..self.end, self.start);
        self.position = self.start + remaining;
        self.end = self.buffer.len();
    }

    /// The remaining bytes.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.buffer[self.position..self.end]
    }

    /// The remaining bytes, mutably.
    ///
    /// Combine with [`advance()`][Self::advance] to write into the region directly.
    #[must_use]
    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buffer[self.position..self.end]
    }

    /// The bytes between the start and the position, i.e. what has been consumed or written.
    #[must_use]
    pub fn processed(&self) -> &[u8] {
        &self.buffer[self.start..self.position]
    }

    /// Consumes one byte.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::EndOfStream`][crate::ErrorKind::EndOfStream] if no bytes remain.
    pub fn get_byte(&mut self) -> Result<u8> {
        if !self.has_remaining() {
            return Err(Error::end_of_stream("no bytes remain in the region"));
        }

        let byte = self.buffer[self.position];
        self.position += 1;
        Ok(byte)
    }

    /// Writes one byte.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::EndOfStream`][crate::ErrorKind::EndOfStream] if the region is full.
    pub fn put_byte(&mut self, value: u8) -> Result<()> {
        if !self.has_remaining() {
            return Err(Error::end_of_stream("no capacity remains in the region"));
        }

        self.buffer[self.position] = value;
        self.position += 1;
        Ok(())
    }

    /// Copies as many remaining bytes as fit into `dst`, returning how many were copied.
    pub fn get_slice(&mut self, dst: &mut [u8]) -> usize {
        let count = dst.len().min(self.remaining());
        dst[..count].copy_from_slice(&self.buffer[self.position..self.position + count]);
        self.position += count;
        count
    }

    /// Copies as much of `src` as fits into the region, returning how many bytes were copied.
    pub fn put_slice(&mut self, src: &[u8]) -> usize {
        let count = src.len().min(self.remaining());
        self.buffer[self.position..self.position + count].copy_from_slice(&src[..count]);
        self.position += count;
        count
    }

    /// Moves as many bytes as possible from the remaining bytes of `src` into this region.
    pub fn transfer_from(&mut self, src: &mut Self) -> usize {
        let count = self.put_slice(src.as_slice());
        src.position += count;
        count
    }

    /// Decodes an integer in place at the position and advances past it.
    ///
    /// # Errors
    ///
    /// Fails as [`codec::decode()`] does. The position is not changed on error.
    pub fn get_int(&mut self, width: usize, order: ByteOrder, signedness: Signedness) -> Result<i64> {
        let value = codec::decode(&self.buffer[..self.end], self.position, width, order, signedness)?;
        self.position += width;
        Ok(value)
    }

    /// Encodes an integer in place at the position and advances past it.
    ///
    /// # Errors
    ///
    /// Fails as [`codec::encode_into()`] does. Neither the bytes nor the position change on error.
    pub fn put_int(&mut self, width: usize, value: i64, order: ByteOrder, signedness: Signedness) -> Result<()> {
        codec::encode_into(&mut self.buffer[..self.end], self.position, width, value, order, signedness)?;
        self.position += width;
        Ok(())
    }

    /// Runs `f` with the end temporarily pulled in so that at most `max` bytes remain.
    ///
    /// The original end is restored afterwards, keeping whatever position `f` left behind.
    pub fn limited<T>(&mut self, max: usize, f: impl FnOnce(&mut Self) -> T) -> T {
        let end = self.end;
        self.end = self.position + max.min(self.remaining());

        let result = f(self);

        self.end = end.max(self.position);
        result
    }

    /// Ensures at least `additional` bytes can be written after the position.
    ///
    /// Unused buffer space past the end is reclaimed first. The buffer only grows, through
    /// `strategy`, when that is still not enough. Afterwards the end sits at the end of the buffer.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::InvalidArgument`][crate::ErrorKind::InvalidArgument] if the new size
    /// overflows `usize`.
    pub fn reserve(&mut self, additional: usize, strategy: &GrowthStrategy) -> Result<()> {
        if self.remaining() >= additional {
            return Ok(());
        }

        let shortfall = additional.saturating_sub(self.buffer.len() - self.position);
        if shortfall > 0 {
            let new_len = strategy.new_size(self.buffer.len(), shortfall)?;
            self.buffer.resize(new_len, 0);
        }

        self.end = self.buffer.len();
        Ok(())
    }

    /// Returns the backing buffer, discarding the indexes.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.buffer
    }
}

impl From<Vec<u8>> for ByteRegion {
    fn from(value: Vec<u8>) -> Self {
        Self::from_vec(value)
    }
}

impl fmt::Debug for ByteRegion {
    #[cfg_attr(test, mutants::skip)] // We have no API contract here.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ByteRegion")
            .field("start", &self.start)
            .field("position", &self.position)
            .field("end", &self.end)
            .field("capacity", &self.buffer.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    #[test]
    fn with_capacity_is_writable() {
        let region = ByteRegion::with_capacity(10);

        assert_eq!(region.start(), 0);
        assert_eq!(region.position(), 0);
        assert_eq!(region.end(), 10);
        assert_eq!(region.remaining(), 10);
    }

    #[test]
    fn from_vec_is_readable() {
        let mut region = ByteRegion::from_vec(vec![1, 2, 3]);

        assert_eq!(region.remaining(), 3);
        assert_eq!(region.get_byte().unwrap(), 1);
        assert_eq!(region.as_slice(), &[2, 3]);
        assert_eq!(region.processed(), &[1]);
    }

    #[test]
    fn from_parts_validates_indexes() {
        assert!(ByteRegion::from_parts(vec![0; 4], 1, 2, 3).is_ok());

        for (start, position, end) in [(2, 1, 3), (0, 4, 3), (0, 0, 5)] {
            let error = ByteRegion::from_parts(vec![0; 4], start, position, end).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::InvalidArgument);
        }
    }

    #[test]
    fn flip_exposes_written_bytes() {
        let mut region = ByteRegion::from_parts(vec![0; 8], 2, 2, 8).unwrap();
        region.put_byte(7).unwrap();
        region.put_byte(8).unwrap();

        region.flip();

        assert_eq!(region.position(), 2);
        assert_eq!(region.end(), 4);
        assert_eq!(region.as_slice(), &[7, 8]);
    }

    #[test]
    fn get_and_put_byte_respect_end() {
        let mut region = ByteRegion::with_capacity(1);
        region.put_byte(1).unwrap();
        assert_eq!(region.put_byte(2).unwrap_err().kind(), ErrorKind::EndOfStream);

        region.flip();
        assert_eq!(region.get_byte().unwrap(), 1);
        assert_eq!(region.get_byte().unwrap_err().kind(), ErrorKind::EndOfStream);
    }

    #[test]
    fn slices_copy_partially() {
        let mut region = ByteRegion::with_capacity(3);
        assert_eq!(region.put_slice(&[1, 2, 3, 4]), 3);

        region.flip();
        let mut dst = [0_u8; 2];
        assert_eq!(region.get_slice(&mut dst), 2);
        assert_eq!(dst, [1, 2]);
        assert_eq!(region.get_slice(&mut dst), 1);
        assert_eq!(dst[0], 3);
    }

    #[test]
    fn transfer_moves_both_positions() {
        let mut src = ByteRegion::from_vec(vec![1, 2, 3, 4]);
        let mut dst = ByteRegion::with_capacity(3);

        assert_eq!(dst.transfer_from(&mut src), 3);
        assert_eq!(src.as_slice(), &[4]);
        assert_eq!(dst.processed(), &[1, 2, 3]);
    }

    #[test]
    fn integers_in_place() {
        let mut region = ByteRegion::with_capacity(6);
        region.put_int(2, -2, ByteOrder::LittleEndian, Signedness::Signed).unwrap();
        region.put_int(4, 0x0A0B_0C0D, ByteOrder::BigEndian, Signedness::Unsigned).unwrap();

        region.flip();
        assert_eq!(region.as_slice(), &[0xFE, 0xFF, 0x0A, 0x0B, 0x0C, 0x0D]);
        assert_eq!(region.get_int(2, ByteOrder::LittleEndian, Signedness::Signed).unwrap(), -2);
        assert_eq!(region.get_int(4, ByteOrder::BigEndian, Signedness::Unsigned).unwrap(), 0x0A0B_0C0D);
    }

    #[test]
    fn integers_do_not_cross_end() {
        let mut region = ByteRegion::from_parts(vec![0xAA; 8], 0, 0, 3).unwrap();

        let error = region.put_int(4, 1, ByteOrder::LittleEndian, Signedness::Signed).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::EndOfStream);
        assert_eq!(region.position(), 0);
        assert_eq!(region.as_slice(), &[0xAA; 3]);

        let error = region.get_int(4, ByteOrder::LittleEndian, Signedness::Signed).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::EndOfStream);
    }

    #[test]
    fn limited_clips_and_restores() {
        let mut region = ByteRegion::from_vec(vec![1, 2, 3, 4, 5]);

        let copied = region.limited(2, |r| {
            assert_eq!(r.remaining(), 2);
            let mut dst = [0_u8; 5];
            r.get_slice(&mut dst)
        });

        assert_eq!(copied, 2);
        assert_eq!(region.remaining(), 3);
        assert_eq!(region.end(), 5);
    }

    #[test]
    fn limited_never_extends() {
        let mut region = ByteRegion::from_vec(vec![1, 2]);
        region.limited(10, |r| assert_eq!(r.remaining(), 2));
    }

    #[test]
    fn compact_keeps_unread_bytes() {
        let mut region = ByteRegion::from_vec(vec![1, 2, 3, 4]);
        region.advance(3).unwrap();

        region.compact();

        assert_eq!(region.position(), 1);
        assert_eq!(region.end(), 4);
        assert_eq!(region.processed(), &[4]);
    }

    #[test]
    fn position_and_end_validated() {
        let mut region = ByteRegion::from_parts(vec![0; 8], 2, 4, 6).unwrap();

        assert_eq!(region.set_position(1).unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert_eq!(region.set_position(7).unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert_eq!(region.set_end(3).unwrap_err().kind(), ErrorKind::InvalidArgument);
        assert_eq!(region.set_end(9).unwrap_err().kind(), ErrorKind::InvalidArgument);

        region.set_end(8).unwrap();
        region.set_position(2).unwrap();
        assert_eq!(region.remaining(), 6);

        assert_eq!(region.advance(7).unwrap_err().kind(), ErrorKind::EndOfStream);
        assert_eq!(region.position(), 2);
    }

    #[test]
    fn clear_and_rewind() {
        let mut region = ByteRegion::with_capacity(4);
        region.put_slice(&[1, 2]);
        region.flip();
        region.advance(1).unwrap();

        region.rewind();
        assert_eq!(region.as_slice(), &[1, 2]);

        region.clear();
        assert_eq!(region.remaining(), 4);
    }

    #[test]
    fn reserve_reclaims_before_growing() {
        let mut region = ByteRegion::with_capacity(8);
        region.put_slice(&[1, 2, 3]);
        region.set_end(4).unwrap();

        region.reserve(5, &GrowthStrategy::Exact).unwrap();
        assert_eq!(region.capacity(), 8);
        assert_eq!(region.remaining(), 5);

        region.reserve(7, &GrowthStrategy::Chunked(new_zealand::nz!(16))).unwrap();
        assert_eq!(region.capacity(), 16);
        assert_eq!(region.remaining(), 13);
        assert_eq!(region.processed(), &[1, 2, 3]);
    }

    #[test]
    fn reserve_is_noop_when_room_remains() {
        let mut region = ByteRegion::with_capacity(4);
        region.set_end(2).unwrap();

        region.reserve(2, &GrowthStrategy::Doubling).unwrap();
        assert_eq!(region.end(), 2);
    }
}
