// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use bytewise::{ByteOrder, ByteRegion, Error, Result, Signedness, codec};
use tracing::{Level, event};

use crate::seek::resolve_seek;
use crate::util::{ensure_open, offset_after, saturating_usize, seek_offset, to_u64};
use crate::{ByteOrdered, Close, HasSize, Progress, Read, ReadAt, Seek, SeekOrigin, StreamingComposite, Write, WriteAt};

#[derive(Debug)]
struct Segment<S> {
    stream: S,
    global_start: u64,
    size: u64,
}

impl<S> Segment<S> {
    fn global_end(&self) -> u64 {
        self.global_start + self.size
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Cursor {
    // Index of the segment holding the global position, or the segment count at the end.
    index: usize,
    child_position: u64,
    global_position: u64,

    // Whether the child's own position has been moved to `child_position`.
    synced: bool,
}

/// Presents an ordered list of sized streams as one contiguous stream.
///
/// The composite's address space is the concatenation of its children: a child of size `n`
/// that starts at global offset `g` serves the offsets `g..g + n`. The sizes of all children
/// are read once, when the composite is built, and must not change afterwards.
///
/// Both sequential access (through [`Read`], [`Write`] and [`Seek`]) and positional access
/// (through [`ReadAt`] and [`WriteAt`]) are offered when the children support them. No single
/// child transfer ever crosses a segment boundary. Integers that straddle a boundary are
/// assembled byte by byte; integers that fit in one child are delegated to that child.
///
/// Seeking only moves the composite's cursor. The child under the cursor is repositioned
/// lazily, right before it is next read from or written to.
///
/// # Example
///
/// ```
/// use bytewise_io::{CompositeStream, MemoryStream, ReadAtExt};
///
/// let mut composite = CompositeStream::new([
///     MemoryStream::from_vec(vec![1, 0, 0]),
///     MemoryStream::from_vec(vec![0, 0, 0, 0, 0]),
/// ])
/// .unwrap();
///
/// // The integer straddles both children.
/// assert_eq!(composite.read_i32_at(0).unwrap(), 1);
/// ```
#[derive(Debug)]
pub struct CompositeStream<S> {
    segments: Vec<Segment<S>>,
    cursor: Cursor,
    size: u64,
    byte_order: ByteOrder,
    close_children: bool,
    closed: bool,
}

impl CompositeStream<()> {
    /// Starts building a composite.
    #[must_use]
    pub fn builder() -> CompositeStreamBuilder {
        CompositeStreamBuilder {
            byte_order: ByteOrder::default(),
            close_children: true,
        }
    }
}

impl<S: HasSize> CompositeStream<S> {
    /// Creates a composite over `children` with the default configuration.
    ///
    /// # Errors
    ///
    /// Fails if the size of a child cannot be determined, or with
    /// [`ErrorKind::InvalidArgument`][bytewise::ErrorKind::InvalidArgument] if the total size
    /// overflows.
    pub fn new(children: impl IntoIterator<Item = S>) -> Result<Self> {
        CompositeStream::builder().build(children)
    }
}

impl<S> CompositeStream<S> {
    /// The number of children.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.segments.len()
    }

    /// References the child at `index`.
    #[must_use]
    pub fn child(&self, index: usize) -> Option<&S> {
        self.segments.get(index).map(|segment| &segment.stream)
    }

    /// Consumes the composite and returns its children in order.
    #[must_use]
    pub fn into_children(self) -> Vec<S> {
        self.segments.into_iter().map(|segment| segment.stream).collect()
    }

    /// Finds the segment that serves `offset`, skipping empty segments.
    ///
    /// Returns the segment count if `offset` is at or past the end.
    fn locate(&self, offset: u64) -> usize {
        self.segments.partition_point(|segment| segment.global_end() <= offset)
    }

    fn move_cursor(&mut self, target: u64) {
        let index = self.locate(target);
        let child_position = self.segments.get(index).map_or(0, |segment| target - segment.global_start);

        if index != self.cursor.index {
            event!(Level::TRACE, message = "segment changed", from = self.cursor.index, to = index);
        }

        self.cursor = Cursor {
            index,
            child_position,
            global_position: target,
            synced: false,
        };
    }

    fn advance_cursor(&mut self, count: usize) {
        let target = self.cursor.global_position + to_u64(count);
        let index = self.cursor.index;

        if self.segments.get(index).is_some_and(|segment| target < segment.global_end()) {
            self.cursor.child_position += to_u64(count);
            self.cursor.global_position = target;
        } else {
            self.move_cursor(target);
        }
    }

    fn remaining(&self) -> u64 {
        self.size - self.cursor.global_position
    }

    fn check_fits(&self, position: u64, count: usize) -> Result<()> {
        if offset_after(position, count)? > self.size {
            return Err(Error::end_of_stream(format!(
                "{count} bytes at offset {position} do not fit in a {} byte composite",
                self.size
            )));
        }

        Ok(())
    }

    /// The number of bytes the current segment has left after the cursor.
    fn segment_remaining(&self) -> u64 {
        self.segments
            .get(self.cursor.index)
            .map_or(0, |segment| segment.size - self.cursor.child_position)
    }
}

impl<S: Seek> CompositeStream<S> {
    /// Returns the current segment, positioning its child at the cursor first.
    fn current_segment(&mut self) -> Result<Option<&mut Segment<S>>> {
        let cursor = self.cursor;
        let Some(segment) = self.segments.get_mut(cursor.index) else {
            return Ok(None);
        };

        if !cursor.synced {
            segment.stream.seek(SeekOrigin::Start, seek_offset(cursor.child_position)?)?;
            self.cursor.synced = true;
        }

        Ok(Some(segment))
    }
}

fn premature_end(index: usize) -> Error {
    Error::end_of_stream(format!("segment {index} ended before its reported size"))
}

/// Builder for [`CompositeStream`] and [`StreamingComposite`].
#[derive(Debug)]
pub struct CompositeStreamBuilder {
    byte_order: ByteOrder,
    close_children: bool,
}

impl CompositeStreamBuilder {
    /// Sets the byte order typed helpers use.
    #[must_use]
    pub fn byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = order;
        self
    }

    /// Sets whether closing the composite also closes its children. Defaults to `true`.
    #[must_use]
    pub fn close_children(mut self, close_children: bool) -> Self {
        self.close_children = close_children;
        self
    }

    /// Builds a [`CompositeStream`], reading the size of every child.
    ///
    /// # Errors
    ///
    /// Fails if the size of a child cannot be determined, or with
    /// [`ErrorKind::InvalidArgument`][bytewise::ErrorKind::InvalidArgument] if the total size
    /// overflows.
    pub fn build<S: HasSize>(self, children: impl IntoIterator<Item = S>) -> Result<CompositeStream<S>> {
        let mut segments = Vec::new();
        let mut global_start = 0_u64;

        for stream in children {
            let size = stream.size()?;
            let next_start = global_start
                .checked_add(size)
                .ok_or_else(|| Error::invalid_argument("total size of the children overflows"))?;

            segments.push(Segment {
                stream,
                global_start,
                size,
            });
            global_start = next_start;
        }

        event!(Level::DEBUG, message = "composite built", segments = segments.len(), size = global_start);

        let mut composite = CompositeStream {
            segments,
            cursor: Cursor::default(),
            size: global_start,
            byte_order: self.byte_order,
            close_children: self.close_children,
            closed: false,
        };
        composite.move_cursor(0);

        Ok(composite)
    }

    /// Builds a [`StreamingComposite`], which reads or writes its children one after another
    /// and releases each one as soon as it ends.
    #[must_use]
    pub fn build_streaming<S>(self, children: impl IntoIterator<Item = S>) -> StreamingComposite<S> {
        StreamingComposite::from_parts(children.into_iter().collect(), self.byte_order, self.close_children)
    }
}

impl<S: Read + Seek> Read for CompositeStream<S> {
    fn read_some(&mut self, into: &mut ByteRegion) -> Result<Progress> {
        ensure_open(self.closed)?;

        if !into.has_remaining() {
            return Ok(Progress::Bytes(0));
        }

        let index = self.cursor.index;
        let available = saturating_usize(self.segment_remaining());
        let Some(segment) = self.current_segment()? else {
            return Ok(Progress::End);
        };

        let progress = into.limited(available, |clipped| segment.stream.read_some(clipped))?;
        if progress.is_stalled() {
            return Err(premature_end(index));
        }

        self.advance_cursor(progress.bytes());
        Ok(progress)
    }

    fn read_int(&mut self, width: usize, order: ByteOrder, signedness: Signedness) -> Result<i64> {
        ensure_open(self.closed)?;
        codec::validate_width(width, signedness)?;

        if self.remaining() < to_u64(width) {
            return Err(Error::end_of_stream(format!(
                "{width} byte integer does not fit in the {} bytes left",
                self.remaining()
            )));
        }

        if self.segment_remaining() >= to_u64(width) {
            let index = self.cursor.index;
            let value = match self.current_segment()? {
                Some(segment) => segment.stream.read_int(width, order, signedness)?,
                None => return Err(premature_end(index)),
            };

            self.advance_cursor(width);
            return Ok(value);
        }

        let mut scratch = [0_u8; codec::MAX_WIDTH];
        for slot in &mut scratch[..width] {
            *slot = self.read_byte()?;
        }

        codec::decode(&scratch, 0, width, order, signedness)
    }

    fn skip_up_to(&mut self, count: u64) -> Result<u64> {
        ensure_open(self.closed)?;

        let skipped = count.min(self.remaining());
        self.move_cursor(self.cursor.global_position + skipped);
        Ok(skipped)
    }
}

impl<S: Write + Seek> Write for CompositeStream<S> {
    fn write_some(&mut self, from: &mut ByteRegion) -> Result<Progress> {
        ensure_open(self.closed)?;

        if !from.has_remaining() {
            return Ok(Progress::Bytes(0));
        }

        let index = self.cursor.index;
        let available = saturating_usize(self.segment_remaining());
        let Some(segment) = self.current_segment()? else {
            return Ok(Progress::End);
        };

        let progress = from.limited(available, |clipped| segment.stream.write_some(clipped))?;
        if progress.is_stalled() {
            return Err(premature_end(index));
        }

        self.advance_cursor(progress.bytes());
        Ok(progress)
    }

    fn flush(&mut self) -> Result<()> {
        ensure_open(self.closed)?;
        self.segments.iter_mut().try_for_each(|segment| segment.stream.flush())
    }

    fn write_int(&mut self, width: usize, value: i64, order: ByteOrder, signedness: Signedness) -> Result<()> {
        ensure_open(self.closed)?;
        let encoded = codec::encode(width, value, order, signedness)?;

        if self.remaining() < to_u64(width) {
            return Err(Error::end_of_stream(format!(
                "{width} byte integer does not fit in the {} bytes left",
                self.remaining()
            )));
        }

        if self.segment_remaining() >= to_u64(width) {
            let index = self.cursor.index;
            match self.current_segment()? {
                Some(segment) => segment.stream.write_int(width, value, order, signedness)?,
                None => return Err(premature_end(index)),
            }

            self.advance_cursor(width);
            return Ok(());
        }

        encoded.iter().try_for_each(|byte| self.write_byte(*byte))
    }
}

impl<S> Seek for CompositeStream<S> {
    fn position(&self) -> Result<u64> {
        ensure_open(self.closed)?;
        Ok(self.cursor.global_position)
    }

    fn seek(&mut self, origin: SeekOrigin, offset: i64) -> Result<u64> {
        ensure_open(self.closed)?;

        let target = resolve_seek(origin, offset, self.cursor.global_position, self.size)?;
        self.move_cursor(target);
        Ok(target)
    }
}

impl<S> HasSize for CompositeStream<S> {
    fn size(&self) -> Result<u64> {
        ensure_open(self.closed)?;
        Ok(self.size)
    }
}

impl<S: ReadAt> ReadAt for CompositeStream<S> {
    fn read_at(&mut self, position: u64, into: &mut ByteRegion) -> Result<Progress> {
        ensure_open(self.closed)?;

        if !into.has_remaining() {
            return Ok(Progress::Bytes(0));
        }

        let index = self.locate(position);
        let Some(segment) = self.segments.get_mut(index) else {
            return Ok(Progress::End);
        };

        let local = position - segment.global_start;
        let available = saturating_usize(segment.size - local);

        let progress = into.limited(available, |clipped| segment.stream.read_at(local, clipped))?;
        if progress.is_stalled() {
            return Err(premature_end(index));
        }

        Ok(progress)
    }

    fn read_fully_at(&mut self, position: u64, into: &mut ByteRegion) -> Result<()> {
        ensure_open(self.closed)?;
        self.check_fits(position, into.remaining())?;

        let mut offset = position;
        while into.has_remaining() {
            let count = self.read_at(offset, into)?.bytes();
            offset += to_u64(count);
        }

        Ok(())
    }

    fn read_int_at(&mut self, position: u64, width: usize, order: ByteOrder, signedness: Signedness) -> Result<i64> {
        ensure_open(self.closed)?;
        codec::validate_width(width, signedness)?;
        self.check_fits(position, width)?;

        let index = self.locate(position);
        if let Some(segment) = self.segments.get_mut(index) {
            let local = position - segment.global_start;
            if segment.size - local >= to_u64(width) {
                return segment.stream.read_int_at(local, width, order, signedness);
            }
        }

        let mut scratch = [0_u8; codec::MAX_WIDTH];
        for (offset, slot) in (position..).zip(&mut scratch[..width]) {
            *slot = self.read_byte_at(offset)?;
        }

        codec::decode(&scratch, 0, width, order, signedness)
    }
}

impl<S: WriteAt> WriteAt for CompositeStream<S> {
    fn write_at(&mut self, position: u64, from: &mut ByteRegion) -> Result<Progress> {
        ensure_open(self.closed)?;

        if !from.has_remaining() {
            return Ok(Progress::Bytes(0));
        }

        let index = self.locate(position);
        let Some(segment) = self.segments.get_mut(index) else {
            return Ok(Progress::End);
        };

        let local = position - segment.global_start;
        let available = saturating_usize(segment.size - local);

        let progress = from.limited(available, |clipped| segment.stream.write_at(local, clipped))?;
        if progress.is_stalled() {
            return Err(premature_end(index));
        }

        Ok(progress)
    }

    fn write_fully_at(&mut self, position: u64, from: &mut ByteRegion) -> Result<()> {
        ensure_open(self.closed)?;
        self.check_fits(position, from.remaining())?;

        let mut offset = position;
        while from.has_remaining() {
            let count = self.write_at(offset, from)?.bytes();
            offset += to_u64(count);
        }

        Ok(())
    }

    fn write_int_at(&mut self, position: u64, width: usize, value: i64, order: ByteOrder, signedness: Signedness) -> Result<()> {
        ensure_open(self.closed)?;
        let encoded = codec::encode(width, value, order, signedness)?;
        self.check_fits(position, width)?;

        let index = self.locate(position);
        if let Some(segment) = self.segments.get_mut(index) {
            let local = position - segment.global_start;
            if segment.size - local >= to_u64(width) {
                return segment.stream.write_int_at(local, width, value, order, signedness);
            }
        }

        for (offset, byte) in (position..).zip(encoded) {
            self.write_byte_at(offset, byte)?;
        }

        Ok(())
    }
}

impl<S: Close> Close for CompositeStream<S> {
    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        self.closed = true;

        if !self.close_children {
            return Ok(());
        }

        // Close every child even if an earlier one fails, then report the first failure.
        self.segments
            .iter_mut()
            .map(|segment| segment.stream.close())
            .fold(Ok(()), Result::and)
    }
}

impl<S> ByteOrdered for CompositeStream<S> {
    fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    fn set_byte_order(&mut self, order: ByteOrder) {
        self.byte_order = order;
    }
}
