// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use bytewise::{ByteOrder, ByteRegion, Error, GrowthStrategy, Result, Signedness, codec};

use crate::seek::resolve_seek;
use crate::util::{ensure_open, offset_after, saturating_usize, to_u64};
use crate::{ByteOrdered, Close, HasSize, Progress, Read, ReadAt, Seek, SeekOrigin, Write, WriteAt};

/// A stream over an in-memory byte array.
///
/// The stream is either fixed-size, in which case writes past the end report
/// [`Progress::End`], or growable, in which case writes past the end extend it. A growable
/// stream consults its [`GrowthStrategy`] whenever the backing allocation is too small.
///
/// Closing the stream drops the byte array, so extract the contents with
/// [`as_slice()`][Self::as_slice] or [`into_vec()`][Self::into_vec] before closing.
///
/// # Example
///
/// ```
/// use bytewise_io::{MemoryStream, Read, Seek, SeekOrigin, Write};
///
/// let mut stream = MemoryStream::new();
/// stream.write_slice(b"hello").unwrap();
///
/// stream.seek(SeekOrigin::Start, 1).unwrap();
/// assert_eq!(stream.read_byte().unwrap(), b'e');
/// ```
#[derive(Debug)]
pub struct MemoryStream {
    data: Vec<u8>,
    position: usize,

    // `None` means the size is fixed.
    growth: Option<GrowthStrategy>,

    byte_order: ByteOrder,
    closed: bool,
}

impl MemoryStream {
    /// Starts building a new `MemoryStream`.
    #[must_use]
    pub fn builder() -> MemoryStreamBuilder {
        MemoryStreamBuilder {
            contents: Vec::new(),
            growth: Some(GrowthStrategy::default()),
            byte_order: ByteOrder::default(),
        }
    }

    /// Creates an empty growable stream.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// Creates a growable stream holding `contents`, positioned at the start.
    #[must_use]
    pub fn from_vec(contents: Vec<u8>) -> Self {
        Self::builder().contents(contents).build()
    }

    /// Creates a fixed-size stream over `contents`.
    #[must_use]
    pub fn fixed(contents: Vec<u8>) -> Self {
        Self::builder().contents(contents).fixed_size().build()
    }

    /// The contents of the stream.
    #[must_use]
    pub fn as_slice(&self) -> &[u8] {
        &self.data
    }

    /// Consumes the stream and returns its contents.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }

    /// Whether writes past the end extend the stream.
    #[must_use]
    pub fn is_growable(&self) -> bool {
        self.growth.is_some()
    }

    /// Truncates or zero-extends a growable stream to `size` bytes.
    ///
    /// The position is pulled back to the new end if it would otherwise lie beyond it.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::InvalidArgument`][bytewise::ErrorKind::InvalidArgument] if the stream
    /// has a fixed size or `size` cannot be addressed in memory.
    pub fn set_size(&mut self, size: u64) -> Result<()> {
        ensure_open(self.closed)?;

        if self.growth.is_none() {
            return Err(Error::invalid_argument("cannot resize a fixed-size stream"));
        }

        let size = usize::try_from(size).map_err(Error::invalid_argument)?;
        self.reserve_for(size)?;
        self.data.resize(size, 0);
        self.position = self.position.min(size);

        Ok(())
    }

    /// Makes room for the stream to reach `required_len` bytes, consulting the growth strategy.
    fn reserve_for(&mut self, required_len: usize) -> Result<()> {
        let capacity = self.data.capacity();
        if required_len <= capacity {
            return Ok(());
        }

        let strategy = self.growth.as_ref().ok_or_else(|| Error::invalid_argument("cannot grow a fixed-size stream"))?;
        let new_capacity = strategy.new_size(capacity, required_len - capacity)?;
        self.data.reserve_exact(new_capacity - self.data.len());

        Ok(())
    }

    /// How many bytes of `wanted` can be written at `offset`, growing the stream if allowed.
    fn prepare_write(&mut self, offset: usize, wanted: usize) -> Result<usize> {
        if self.growth.is_none() {
            return Ok(self.data.len().saturating_sub(offset).min(wanted));
        }

        let end = offset
            .checked_add(wanted)
            .ok_or_else(|| Error::invalid_argument(format!("writing {wanted} bytes at offset {offset} overflows")))?;

        if end > self.data.len() {
            self.reserve_for(end)?;
            self.data.resize(end, 0);
        }

        Ok(wanted)
    }

    fn copy_out(&self, offset: usize, into: &mut ByteRegion) -> Progress {
        match self.data.get(offset..) {
            Some(available) if !available.is_empty() => Progress::Bytes(into.put_slice(available)),
            _ => Progress::End,
        }
    }

    fn copy_in(&mut self, offset: usize, from: &mut ByteRegion) -> Result<Progress> {
        let count = self.prepare_write(offset, from.remaining())?;
        if count == 0 {
            return Ok(Progress::End);
        }

        from.get_slice(&mut self.data[offset..offset + count]);
        Ok(Progress::Bytes(count))
    }

    fn check_fits(&self, position: u64, count: usize) -> Result<usize> {
        let end = offset_after(position, count)?;
        if end > to_u64(self.data.len()) {
            return Err(Error::end_of_stream(format!(
                "{count} bytes at offset {position} do not fit in a {} byte stream",
                self.data.len()
            )));
        }

        Ok(saturating_usize(position))
    }
}

impl Default for MemoryStream {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`MemoryStream`].
#[derive(Debug)]
pub struct MemoryStreamBuilder {
    contents: Vec<u8>,
    growth: Option<GrowthStrategy>,
    byte_order: ByteOrder,
}

impl MemoryStreamBuilder {
    /// Sets the initial contents of the stream.
    #[must_use]
    pub fn contents(mut self, contents: Vec<u8>) -> Self {
        self.contents = contents;
        self
    }

    /// Makes the stream growable with the given strategy. Streams are growable with
    /// [`GrowthStrategy::Doubling`] by default.
    #[must_use]
    pub fn growth(mut self, strategy: GrowthStrategy) -> Self {
        self.growth = Some(strategy);
        self
    }

    /// Fixes the size of the stream to the size of its initial contents.
    #[must_use]
    pub fn fixed_size(mut self) -> Self {
        self.growth = None;
        self
    }

    /// Sets the byte order typed helpers use.
    #[must_use]
    pub fn byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = order;
        self
    }

    /// Builds the `MemoryStream`.
    #[must_use]
    pub fn build(self) -> MemoryStream {
        MemoryStream {
            data: self.contents,
            position: 0,
            growth: self.growth,
            byte_order: self.byte_order,
            closed: false,
        }
    }
}

impl Read for MemoryStream {
    fn read_some(&mut self, into: &mut ByteRegion) -> Result<Progress> {
        ensure_open(self.closed)?;

        if !into.has_remaining() {
            return Ok(Progress::Bytes(0));
        }

        let progress = self.copy_out(self.position, into);
        self.position += progress.bytes();
        Ok(progress)
    }

    fn read_int(&mut self, width: usize, order: ByteOrder, signedness: Signedness) -> Result<i64> {
        ensure_open(self.closed)?;

        let value = codec::decode(&self.data, self.position, width, order, signedness)?;
        self.position += width;
        Ok(value)
    }

    fn skip_up_to(&mut self, count: u64) -> Result<u64> {
        ensure_open(self.closed)?;

        let skipped = saturating_usize(count).min(self.data.len().saturating_sub(self.position));
        self.position += skipped;
        Ok(to_u64(skipped))
    }
}

impl Write for MemoryStream {
    fn write_some(&mut self, from: &mut ByteRegion) -> Result<Progress> {
        ensure_open(self.closed)?;

        if !from.has_remaining() {
            return Ok(Progress::Bytes(0));
        }

        let progress = self.copy_in(self.position, from)?;
        self.position += progress.bytes();
        Ok(progress)
    }

    fn flush(&mut self) -> Result<()> {
        ensure_open(self.closed)
    }
}

impl Seek for MemoryStream {
    fn position(&self) -> Result<u64> {
        ensure_open(self.closed)?;
        Ok(to_u64(self.position))
    }

    fn seek(&mut self, origin: SeekOrigin, offset: i64) -> Result<u64> {
        ensure_open(self.closed)?;

        let target = resolve_seek(origin, offset, to_u64(self.position), to_u64(self.data.len()))?;
        self.position = saturating_usize(target);
        Ok(target)
    }
}

impl HasSize for MemoryStream {
    fn size(&self) -> Result<u64> {
        ensure_open(self.closed)?;
        Ok(to_u64(self.data.len()))
    }
}

impl ReadAt for MemoryStream {
    fn read_at(&mut self, position: u64, into: &mut ByteRegion) -> Result<Progress> {
        ensure_open(self.closed)?;

        if !into.has_remaining() {
            return Ok(Progress::Bytes(0));
        }

        Ok(self.copy_out(saturating_usize(position), into))
    }

    fn read_fully_at(&mut self, position: u64, into: &mut ByteRegion) -> Result<()> {
        ensure_open(self.closed)?;

        let offset = self.check_fits(position, into.remaining())?;
        into.put_slice(&self.data[offset..]);
        Ok(())
    }

    fn read_int_at(&mut self, position: u64, width: usize, order: ByteOrder, signedness: Signedness) -> Result<i64> {
        ensure_open(self.closed)?;
        codec::decode(&self.data, saturating_usize(position), width, order, signedness)
    }
}

impl WriteAt for MemoryStream {
    fn write_at(&mut self, position: u64, from: &mut ByteRegion) -> Result<Progress> {
        ensure_open(self.closed)?;

        if !from.has_remaining() {
            return Ok(Progress::Bytes(0));
        }

        let offset = usize::try_from(position).map_err(Error::invalid_argument)?;
        self.copy_in(offset, from)
    }

    fn write_fully_at(&mut self, position: u64, from: &mut ByteRegion) -> Result<()> {
        ensure_open(self.closed)?;

        if self.growth.is_none() {
            self.check_fits(position, from.remaining())?;
        }

        let offset = usize::try_from(position).map_err(Error::invalid_argument)?;
        self.copy_in(offset, from)?;
        Ok(())
    }

    fn write_int_at(&mut self, position: u64, width: usize, value: i64, order: ByteOrder, signedness: Signedness) -> Result<()> {
        ensure_open(self.closed)?;

        let encoded = codec::encode(width, value, order, signedness)?;
        self.write_fully_at(position, &mut ByteRegion::copied_from_slice(&encoded))
    }
}

impl Close for MemoryStream {
    fn close(&mut self) -> Result<()> {
        self.closed = true;
        self.data = Vec::new();
        self.position = 0;
        Ok(())
    }
}

impl ByteOrdered for MemoryStream {
    fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    fn set_byte_order(&mut self, order: ByteOrder) {
        self.byte_order = order;
    }
}
