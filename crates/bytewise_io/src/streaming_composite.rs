// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::VecDeque;

use bytewise::{ByteOrder, ByteRegion, Result};
use tracing::{Level, event};

use crate::util::{ensure_open, to_u64};
use crate::{ByteOrdered, Close, CompositeStream, Progress, Read, Write};

/// Reads from or writes to an ordered list of streams one after another, in a single pass.
///
/// Unlike [`CompositeStream`], the children do not need a known size: a child is used until it
/// reports [`Progress::End`], at which point it is released (and closed, if so configured) and
/// the next child takes over. Because released children are gone, the type offers neither
/// seeking nor positional access.
///
/// # Example
///
/// ```
/// use bytewise_io::{MemoryStream, Read, StreamingComposite};
///
/// let mut stream = StreamingComposite::new([MemoryStream::from_vec(vec![1]), MemoryStream::from_vec(vec![2])]);
///
/// assert_eq!(stream.read_byte().unwrap(), 1);
/// assert_eq!(stream.read_byte().unwrap(), 2);
/// assert_eq!(stream.released(), 1);
/// ```
#[derive(Debug)]
pub struct StreamingComposite<S> {
    current: Option<S>,
    upcoming: VecDeque<S>,
    transferred: u64,
    released: usize,
    byte_order: ByteOrder,
    close_children: bool,
    closed: bool,
}

impl<S> StreamingComposite<S> {
    /// Creates a streaming composite over `children` with the default configuration.
    ///
    /// Use [`CompositeStream::builder()`] to configure it.
    #[must_use]
    pub fn new(children: impl IntoIterator<Item = S>) -> Self {
        CompositeStream::builder().build_streaming(children)
    }

    pub(crate) fn from_parts(upcoming: VecDeque<S>, byte_order: ByteOrder, close_children: bool) -> Self {
        Self {
            current: None,
            upcoming,
            transferred: 0,
            released: 0,
            byte_order,
            close_children,
            closed: false,
        }
    }

    /// The total number of bytes transferred so far.
    #[must_use]
    pub fn transferred(&self) -> u64 {
        self.transferred
    }

    /// The number of children that have ended and been released.
    #[must_use]
    pub fn released(&self) -> usize {
        self.released
    }

    /// The number of children not yet released, including the one in use.
    #[must_use]
    pub fn remaining_children(&self) -> usize {
        usize::from(self.current.is_some()) + self.upcoming.len()
    }
}

impl<S: Close> StreamingComposite<S> {
    /// Releases the child in use and moves on to the next one. Returns `false` if none is left.
    fn next_child(&mut self) -> Result<bool> {
        if let Some(mut finished) = self.current.take() {
            self.released += 1;
            event!(Level::TRACE, message = "segment released", released = self.released);

            if self.close_children {
                finished.close()?;
            }
        }

        self.current = self.upcoming.pop_front();
        Ok(self.current.is_some())
    }
}

impl<S: Read + Close> Read for StreamingComposite<S> {
    fn read_some(&mut self, into: &mut ByteRegion) -> Result<Progress> {
        ensure_open(self.closed)?;

        if !into.has_remaining() {
            return Ok(Progress::Bytes(0));
        }

        loop {
            if let Some(current) = self.current.as_mut() {
                let progress = current.read_some(into)?;
                if !progress.is_stalled() {
                    self.transferred += to_u64(progress.bytes());
                    return Ok(progress);
                }
            }

            if !self.next_child()? {
                return Ok(Progress::End);
            }
        }
    }
}

impl<S: Write + Close> Write for StreamingComposite<S> {
    fn write_some(&mut self, from: &mut ByteRegion) -> Result<Progress> {
        ensure_open(self.closed)?;

        if !from.has_remaining() {
            return Ok(Progress::Bytes(0));
        }

        loop {
            if let Some(current) = self.current.as_mut() {
                let progress = current.write_some(from)?;
                if !progress.is_stalled() {
                    self.transferred += to_u64(progress.bytes());
                    return Ok(progress);
                }
            }

            if !self.next_child()? {
                return Ok(Progress::End);
            }
        }
    }

    fn flush(&mut self) -> Result<()> {
        ensure_open(self.closed)?;
        self.current.as_mut().map_or(Ok(()), Write::flush)
    }
}

impl<S: Close> Close for StreamingComposite<S> {
    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        self.closed = true;
        let children = self.current.take().into_iter().chain(self.upcoming.drain(..));

        if self.close_children {
            children.map(|mut child| child.close()).fold(Ok(()), Result::and)
        } else {
            children.for_each(drop);
            Ok(())
        }
    }
}

impl<S> ByteOrdered for StreamingComposite<S> {
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
    use static_assertions::assert_not_impl_any;

    use super::*;
    use crate::testing::{FakeRead, FakeWrite};
    use crate::{HasSize, MemoryStream, ReadAt, ReadExt, Seek, WriteAt};

    assert_not_impl_any!(StreamingComposite<MemoryStream>: ReadAt, WriteAt, Seek, HasSize);

    #[test]
    fn reads_unsized_children_in_order() {
        let mut stream = StreamingComposite::new([
            FakeRead::builder().contents(vec![1, 2, 3]).max_read_size(nz!(2)).build(),
            FakeRead::new(vec![]),
            FakeRead::new(vec![4]),
        ]);

        let mut into = ByteRegion::with_capacity(8);
        while stream.read_some(&mut into).unwrap() != Progress::End {}
        into.flip();

        assert_eq!(into.as_slice(), &[1, 2, 3, 4]);
        assert_eq!(stream.transferred(), 4);
        assert_eq!(stream.released(), 3);
        assert_eq!(stream.remaining_children(), 0);
    }

    #[test]
    fn int_spans_children() {
        let mut stream = CompositeStream::builder()
            .byte_order(ByteOrder::BigEndian)
            .build_streaming([FakeRead::new(vec![0x12]), FakeRead::new(vec![0x34, 0x56])]);

        assert_eq!(stream.read_u16().unwrap(), 0x1234);
        assert_eq!(stream.read_u8().unwrap(), 0x56);
        assert_eq!(stream.read_u8().unwrap_err().kind(), ErrorKind::EndOfStream);
    }

    #[test]
    fn children_are_released_lazily() {
        let mut stream = StreamingComposite::new([FakeRead::new(vec![1]), FakeRead::new(vec![2])]);

        stream.read_byte().unwrap();
        stream.read_byte().unwrap();

        // The first child reported its end while the second byte was being read.
        assert_eq!(stream.released(), 1);
        assert_eq!(stream.remaining_children(), 1);
    }

    #[test]
    fn writes_move_on_when_a_child_fills_up() {
        let mut stream = StreamingComposite::new([
            FakeWrite::builder().capacity(2).build(),
            FakeWrite::builder().capacity(3).build(),
        ]);

        stream.write_slice(&[1, 2, 3, 4]).unwrap();
        assert_eq!(stream.released(), 1);

        assert_eq!(stream.write_slice(&[5, 6]).unwrap_err().kind(), ErrorKind::EndOfStream);
        assert_eq!(stream.transferred(), 5);
    }

    #[test]
    fn close_closes_remaining_children() {
        let mut stream = StreamingComposite::new([FakeRead::new(vec![1]), FakeRead::new(vec![2])]);

        stream.close().unwrap();
        stream.close().unwrap();

        assert_eq!(stream.remaining_children(), 0);
        assert_eq!(stream.read_byte().unwrap_err().kind(), ErrorKind::ClosedResource);
    }
}
