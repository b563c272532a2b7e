// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::ops::Range;

use bytewise::{ByteOrder, ByteRegion, Error, Result, Signedness, codec};

use crate::seek::resolve_seek;
use crate::util::{ensure_open, offset_after, saturating_usize, to_u64};
use crate::{ByteOrdered, Close, HasSize, Progress, Read, ReadAt, Seek, SeekOrigin, Write, WriteAt};

/// Restricts a positional stream to a window of its bytes.
///
/// The view addresses the parent bytes `start..end` as its own offsets `0..end - start`. Every
/// operation is translated into a positional operation on the parent, so the view never moves
/// the parent's own position and several views can address one parent, for example through a
/// [`SharedStream`][crate::SharedStream].
///
/// Raw transfers are clipped at the end of the window. Exact transfers that would cross it fail
/// with [`ErrorKind::EndOfStream`][bytewise::ErrorKind::EndOfStream] without transferring
/// anything. The size of the view is fixed.
///
/// # Example
///
/// ```
/// use bytewise_io::{HasSize, MemoryStream, Read, SubRangeView};
///
/// let parent = MemoryStream::from_vec(b"headerPAYLOADtrailer".to_vec());
/// let mut view = SubRangeView::new(parent, 6..13).unwrap();
///
/// assert_eq!(view.size().unwrap(), 7);
/// assert_eq!(view.read_byte().unwrap(), b'P');
/// ```
#[derive(Debug)]
pub struct SubRangeView<P> {
    parent: P,
    start: u64,
    len: u64,
    position: u64,
    byte_order: ByteOrder,
    close_parent: bool,
    closed: bool,
}

impl<P: HasSize> SubRangeView<P> {
    /// Creates a view of the parent bytes in `range`.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::InvalidArgument`][bytewise::ErrorKind::InvalidArgument] if the
    /// range is reversed or extends past the end of the parent.
    pub fn new(parent: P, range: Range<u64>) -> Result<Self> {
        let parent_size = parent.size()?;

        if range.start > range.end || range.end > parent_size {
            return Err(Error::invalid_argument(format!(
                "range {range:?} is not within a {parent_size} byte stream"
            )));
        }

        Ok(Self {
            parent,
            start: range.start,
            len: range.end - range.start,
            position: 0,
            byte_order: ByteOrder::default(),
            close_parent: false,
            closed: false,
        })
    }
}

impl<P> SubRangeView<P> {
    /// Sets the byte order typed helpers use.
    #[must_use]
    pub fn with_byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = order;
        self
    }

    /// Sets whether closing the view also closes the parent. Defaults to `false`.
    #[must_use]
    pub fn with_close_parent(mut self, close_parent: bool) -> Self {
        self.close_parent = close_parent;
        self
    }

    /// The window of the parent this view covers.
    #[must_use]
    pub fn parent_range(&self) -> Range<u64> {
        self.start..self.start + self.len
    }

    /// References the parent.
    #[must_use]
    pub fn get_ref(&self) -> &P {
        &self.parent
    }

    /// Consumes the view and returns the parent.
    #[must_use]
    pub fn into_inner(self) -> P {
        self.parent
    }

    /// Translates a view offset into a parent offset, returning how many bytes the window has
    /// left from there. `None` means the offset is past the end of the window.
    fn translate(&self, position: u64) -> Option<(u64, u64)> {
        (position <= self.len).then(|| (self.start + position, self.len - position))
    }

    /// Translates a view offset for a transfer that must fit in the window as a whole.
    fn translate_exact(&self, position: u64, count: usize) -> Result<u64> {
        if offset_after(position, count)? > self.len {
            return Err(Error::end_of_stream(format!(
                "{count} bytes at offset {position} do not fit in a {} byte view",
                self.len
            )));
        }

        Ok(self.start + position)
    }
}

impl<P: ReadAt> Read for SubRangeView<P> {
    fn read_some(&mut self, into: &mut ByteRegion) -> Result<Progress> {
        let progress = self.read_at(self.position, into)?;
        self.position += to_u64(progress.bytes());
        Ok(progress)
    }

    fn read_fully(&mut self, into: &mut ByteRegion) -> Result<()> {
        let count = into.remaining();
        self.read_fully_at(self.position, into)?;
        self.position += to_u64(count);
        Ok(())
    }

    fn read_int(&mut self, width: usize, order: ByteOrder, signedness: Signedness) -> Result<i64> {
        let value = self.read_int_at(self.position, width, order, signedness)?;
        self.position += to_u64(width);
        Ok(value)
    }

    fn skip_up_to(&mut self, count: u64) -> Result<u64> {
        ensure_open(self.closed)?;

        let skipped = count.min(self.len - self.position);
        self.position += skipped;
        Ok(skipped)
    }
}

impl<P: WriteAt> Write for SubRangeView<P> {
    fn write_some(&mut self, from: &mut ByteRegion) -> Result<Progress> {
        let progress = self.write_at(self.position, from)?;
        self.position += to_u64(progress.bytes());
        Ok(progress)
    }

    fn write_fully(&mut self, from: &mut ByteRegion) -> Result<()> {
        let count = from.remaining();
        self.write_fully_at(self.position, from)?;
        self.position += to_u64(count);
        Ok(())
    }

    fn write_int(&mut self, width: usize, value: i64, order: ByteOrder, signedness: Signedness) -> Result<()> {
        self.write_int_at(self.position, width, value, order, signedness)?;
        self.position += to_u64(width);
        Ok(())
    }
}

impl<P> Seek for SubRangeView<P> {
    fn position(&self) -> Result<u64> {
        ensure_open(self.closed)?;
        Ok(self.position)
    }

    fn seek(&mut self, origin: SeekOrigin, offset: i64) -> Result<u64> {
        ensure_open(self.closed)?;

        self.position = resolve_seek(origin, offset, self.position, self.len)?;
        Ok(self.position)
    }
}

impl<P> HasSize for SubRangeView<P> {
    fn size(&self) -> Result<u64> {
        ensure_open(self.closed)?;
        Ok(self.len)
    }
}

impl<P: ReadAt> ReadAt for SubRangeView<P> {
    fn read_at(&mut self, position: u64, into: &mut ByteRegion) -> Result<Progress> {
        ensure_open(self.closed)?;

        let Some((parent_offset, available)) = self.translate(position) else {
            return Ok(Progress::End);
        };

        if !into.has_remaining() {
            return Ok(Progress::Bytes(0));
        }

        if available == 0 {
            return Ok(Progress::End);
        }

        into.limited(saturating_usize(available), |clipped| self.parent.read_at(parent_offset, clipped))
    }

    fn read_fully_at(&mut self, position: u64, into: &mut ByteRegion) -> Result<()> {
        ensure_open(self.closed)?;

        let parent_offset = self.translate_exact(position, into.remaining())?;
        self.parent.read_fully_at(parent_offset, into)
    }

    fn read_int_at(&mut self, position: u64, width: usize, order: ByteOrder, signedness: Signedness) -> Result<i64> {
        ensure_open(self.closed)?;
        codec::validate_width(width, signedness)?;

        let parent_offset = self.translate_exact(position, width)?;
        self.parent.read_int_at(parent_offset, width, order, signedness)
    }
}

impl<P: WriteAt> WriteAt for SubRangeView<P> {
    fn write_at(&mut self, position: u64, from: &mut ByteRegion) -> Result<Progress> {
        ensure_open(self.closed)?;

        let Some((parent_offset, available)) = self.translate(position) else {
            return Ok(Progress::End);
        };

        if !from.has_remaining() {
            return Ok(Progress::Bytes(0));
        }

        if available == 0 {
            return Ok(Progress::End);
        }

        from.limited(saturating_usize(available), |clipped| self.parent.write_at(parent_offset, clipped))
    }

    fn write_fully_at(&mut self, position: u64, from: &mut ByteRegion) -> Result<()> {
        ensure_open(self.closed)?;

        let parent_offset = self.translate_exact(position, from.remaining())?;
        self.parent.write_fully_at(parent_offset, from)
    }

    fn write_int_at(&mut self, position: u64, width: usize, value: i64, order: ByteOrder, signedness: Signedness) -> Result<()> {
        ensure_open(self.closed)?;
        codec::validate_width(width, signedness)?;

        let parent_offset = self.translate_exact(position, width)?;
        self.parent.write_int_at(parent_offset, width, value, order, signedness)
    }
}

impl<P: Close> Close for SubRangeView<P> {
    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        self.closed = true;

        if self.close_parent { self.parent.close() } else { Ok(()) }
    }
}

impl<P> ByteOrdered for SubRangeView<P> {
    fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    fn set_byte_order(&mut self, order: ByteOrder) {
        self.byte_order = order;
    }
}
