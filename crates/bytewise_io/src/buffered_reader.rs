// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::num::NonZero;

use bytewise::{ByteOrder, ByteRegion, Error, Result, Signedness, codec};
use tracing::{Level, event};

use crate::util::{effective_buffer_size, ensure_open, saturating_usize, to_u64};
use crate::{ByteOrdered, Close, DEFAULT_BUFFER_SIZE, Progress, Read};

/// Adds a lookahead buffer to a [`Read`].
///
/// Reads are served from a single reusable lookahead region that is refilled from the source
/// only when it runs dry, so many small reads turn into few large ones. Integers are decoded
/// in place when the lookahead holds all of their bytes and are assembled byte by byte across
/// refills otherwise. Either way, an integer is decoded correctly no matter how the source splits
/// its data.
///
/// # Example
///
/// ```
/// use bytewise::ByteOrder;
/// use bytewise_io::{BufferedReader, MemoryStream, ReadExt};
///
/// let source = MemoryStream::from_vec(vec![0, 0, 1, 0]);
/// let mut reader = BufferedReader::builder(source).byte_order(ByteOrder::BigEndian).build();
///
/// assert_eq!(reader.read_i32().unwrap(), 256);
/// ```
#[derive(Debug)]
pub struct BufferedReader<R> {
    source: R,

    // Holds the bytes read from the source but not yet handed out, between position and end.
    lookahead: ByteRegion,

    buffer_size: usize,
    byte_order: ByteOrder,
    close_source: bool,
    closed: bool,
}

impl<R: Read> BufferedReader<R> {
    /// Starts building a reader over `source`.
    #[must_use]
    pub fn builder(source: R) -> BufferedReaderBuilder<R> {
        BufferedReaderBuilder {
            source,
            buffer_size: DEFAULT_BUFFER_SIZE,
            byte_order: ByteOrder::default(),
            close_source: true,
        }
    }

    /// Creates a reader over `source` with the default configuration.
    #[must_use]
    pub fn new(source: R) -> Self {
        Self::builder(source).build()
    }

    /// The bytes read from the source but not yet consumed.
    #[must_use]
    pub fn buffered(&self) -> &[u8] {
        self.lookahead.as_slice()
    }

    /// The size of the lookahead buffer.
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// References the underlying source.
    #[must_use]
    pub fn get_ref(&self) -> &R {
        &self.source
    }

    /// Mutably references the underlying source.
    ///
    /// Reading from the source directly skips over whatever is still buffered.
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.source
    }

    /// Consumes the reader and returns the underlying source. Buffered bytes are lost.
    #[must_use]
    pub fn into_inner(self) -> R {
        self.source
    }

    /// Refills the lookahead from the source. Returns `false` if the source has ended.
    fn fill(&mut self) -> Result<bool> {
        if self.lookahead.capacity() == self.buffer_size {
            self.lookahead.clear();
        } else {
            self.lookahead = ByteRegion::with_capacity(self.buffer_size);
        }

        let progress = self.source.read_some(&mut self.lookahead);

        // Expose exactly the bytes that arrived, even if the read failed.
        self.lookahead.flip();

        let filled = !progress?.is_stalled();
        event!(Level::TRACE, message = "lookahead refilled", bytes = self.lookahead.remaining());

        Ok(filled)
    }

    /// Ensures the lookahead holds at least one byte. Returns `false` if the source has ended.
    fn ensure_buffered(&mut self) -> Result<bool> {
        if self.lookahead.has_remaining() {
            return Ok(true);
        }

        self.fill()
    }
}

/// Builder for [`BufferedReader`].
#[derive(Debug)]
pub struct BufferedReaderBuilder<R> {
    source: R,
    buffer_size: usize,
    byte_order: ByteOrder,
    close_source: bool,
}

impl<R: Read> BufferedReaderBuilder<R> {
    /// Sets the size of the lookahead buffer.
    ///
    /// Sizes below [`MIN_BUFFER_SIZE`][crate::MIN_BUFFER_SIZE] are raised to it.
    #[must_use]
    pub fn buffer_size(mut self, buffer_size: NonZero<usize>) -> Self {
        self.buffer_size = effective_buffer_size(buffer_size);
        self
    }

    /// Sets the byte order typed helpers use.
    #[must_use]
    pub fn byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = order;
        self
    }

    /// Sets whether closing the reader also closes the source. Defaults to `true`.
    #[must_use]
    pub fn close_source(mut self, close_source: bool) -> Self {
        self.close_source = close_source;
        self
    }

    /// Builds the `BufferedReader`. No memory is reserved until the first read.
    #[must_use]
    pub fn build(self) -> BufferedReader<R> {
        BufferedReader {
            source: self.source,
            lookahead: ByteRegion::new(),
            buffer_size: self.buffer_size,
            byte_order: self.byte_order,
            close_source: self.close_source,
            closed: false,
        }
    }
}

impl<R: Read> Read for BufferedReader<R> {
    fn read_some(&mut self, into: &mut ByteRegion) -> Result<Progress> {
        ensure_open(self.closed)?;

        if !into.has_remaining() {
            return Ok(Progress::Bytes(0));
        }

        if !self.ensure_buffered()? {
            return Ok(Progress::End);
        }

        Ok(Progress::Bytes(into.transfer_from(&mut self.lookahead)))
    }

    fn read_byte(&mut self) -> Result<u8> {
        ensure_open(self.closed)?;

        if !self.ensure_buffered()? {
            return Err(Error::end_of_stream("source ended before the requested byte"));
        }

        self.lookahead.get_byte()
    }

    fn read_int(&mut self, width: usize, order: ByteOrder, signedness: Signedness) -> Result<i64> {
        ensure_open(self.closed)?;
        codec::validate_width(width, signedness)?;

        if self.lookahead.remaining() >= width {
            return self.lookahead.get_int(width, order, signedness);
        }

        let mut scratch = [0_u8; codec::MAX_WIDTH];
        for slot in &mut scratch[..width] {
            *slot = self.read_byte()?;
        }

        codec::decode(&scratch, 0, width, order, signedness)
    }

    fn skip_up_to(&mut self, count: u64) -> Result<u64> {
        ensure_open(self.closed)?;

        if count == 0 || !self.ensure_buffered()? {
            return Ok(0);
        }

        let skipped = saturating_usize(count).min(self.lookahead.remaining());
        self.lookahead.advance(skipped)?;
        Ok(to_u64(skipped))
    }
}

impl<R: Read + Close> Close for BufferedReader<R> {
    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        self.closed = true;
        self.lookahead = ByteRegion::new();

        if self.close_source { self.source.close() } else { Ok(()) }
    }
}

impl<R> ByteOrdered for BufferedReader<R> {
    fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    fn set_byte_order(&mut self, order: ByteOrder) {
        self.byte_order = order;
    }
}

#[cfg(test)]
mod tests {
    use bytewise::ErrorKind;
    use new_zealand::nz;

    use super::*;
    use crate::ReadExt;
    use crate::testing::FakeRead;

    fn chunked(contents: Vec<u8>, max_read_size: NonZero<usize>) -> FakeRead {
        FakeRead::builder().contents(contents).max_read_size(max_read_size).build()
    }

    #[test]
    fn small_reads_are_batched() {
        let mut reader = BufferedReader::new(FakeRead::new((0..100).collect()));

        for expected in 0..100 {
            assert_eq!(reader.read_byte().unwrap(), expected);
        }

        assert_eq!(reader.get_ref().read_calls(), 1);
        assert_eq!(reader.read_byte().unwrap_err().kind(), ErrorKind::EndOfStream);
    }

    #[test]
    fn int_from_one_byte_chunks() {
        let source = chunked(0x0102_0304_0506_0708_i64.to_be_bytes().to_vec(), nz!(1));
        let mut reader = BufferedReader::builder(source).byte_order(ByteOrder::BigEndian).build();

        assert_eq!(reader.read_i64().unwrap(), 0x0102_0304_0506_0708);
    }

    #[test]
    fn int_across_refill() {
        // Padding fills all but one byte of the first read, so the integer straddles the refill.
        let mut contents = vec![0xAA; 15];
        contents.extend_from_slice(&0x1122_3344_i32.to_le_bytes());
        let source = chunked(contents, nz!(16));

        let mut reader = BufferedReader::builder(source).buffer_size(nz!(16)).build();
        assert_eq!(reader.skip_up_to(15).unwrap(), 15);

        assert_eq!(reader.read_i32().unwrap(), 0x1122_3344);
        assert_eq!(reader.get_ref().read_calls(), 2);
    }

    #[test]
    fn int_in_place_when_buffered() {
        let mut reader = BufferedReader::new(FakeRead::new(vec![0xFE, 0xFF, 0x01]));

        assert_eq!(reader.read_int(2, ByteOrder::LittleEndian, Signedness::Signed).unwrap(), -2);
        assert_eq!(reader.buffered(), &[0x01]);
    }

    #[test]
    fn int_past_end_is_end_of_stream() {
        let mut reader = BufferedReader::new(FakeRead::new(vec![1, 2, 3]));

        assert_eq!(reader.read_i32().unwrap_err().kind(), ErrorKind::EndOfStream);
    }

    #[test]
    fn invalid_width_consumes_nothing() {
        let mut reader = BufferedReader::new(FakeRead::new(vec![1; 8]));

        let error = reader.read_int(0, ByteOrder::LittleEndian, Signedness::Signed).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidArgument);
        assert_eq!(reader.get_ref().read_calls(), 0);
    }

    #[test]
    fn read_some_reports_end() {
        let mut reader = BufferedReader::new(FakeRead::new(vec![5, 6]));
        let mut into = ByteRegion::with_capacity(8);

        assert_eq!(reader.read_some(&mut into).unwrap(), Progress::Bytes(2));
        assert_eq!(reader.read_some(&mut into).unwrap(), Progress::End);
    }

    #[test]
    fn read_fully_across_refills() {
        let source = chunked((0..40).collect(), nz!(7));
        let mut reader = BufferedReader::builder(source).buffer_size(nz!(16)).build();

        let mut into = ByteRegion::with_capacity(40);
        reader.read_fully(&mut into).unwrap();
        into.flip();

        assert_eq!(into.as_slice(), (0..40).collect::<Vec<u8>>().as_slice());
    }

    #[test]
    fn skip_is_limited_to_one_refill() {
        let source = chunked(vec![0; 100], nz!(10));
        let mut reader = BufferedReader::new(source);

        assert_eq!(reader.skip_up_to(50).unwrap(), 10);
        assert_eq!(reader.skip_up_to(0).unwrap(), 0);
    }

    #[test]
    fn tiny_buffer_is_raised_to_floor() {
        let reader = BufferedReader::builder(FakeRead::new(vec![])).buffer_size(nz!(1)).build();
        assert_eq!(reader.buffer_size(), crate::MIN_BUFFER_SIZE);
    }

    #[test]
    fn close_is_idempotent_and_closes_source() {
        let mut reader = BufferedReader::new(FakeRead::new(vec![1, 2]));
        reader.read_byte().unwrap();

        reader.close().unwrap();
        reader.close().unwrap();

        assert!(reader.get_ref().is_closed());
        assert!(reader.buffered().is_empty());
        assert_eq!(reader.read_byte().unwrap_err().kind(), ErrorKind::ClosedResource);
    }

    #[test]
    fn close_can_leave_source_open() {
        let mut reader = BufferedReader::builder(FakeRead::new(vec![])).close_source(false).build();

        reader.close().unwrap();

        assert!(!reader.into_inner().is_closed());
    }
}
