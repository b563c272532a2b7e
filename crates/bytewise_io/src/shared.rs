// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::cell::{Ref, RefCell};
use std::fmt;
use std::rc::Rc;

use bytewise::{ByteOrder, ByteRegion, Error, Result, Signedness};
use tracing::{Level, event};

use crate::{ByteOrdered, Close, HasSize, Progress, Read, ReadAt, Seek, SeekOrigin, Write, WriteAt};

/// A cloneable handle to a stream, letting several owners address the same stream.
///
/// Every clone forwards to the one underlying stream. This is how several
/// [`SubRangeView`][crate::SubRangeView]s carve windows out of one parent: positional access does
/// not depend on any shared position, so the views do not interfere with each other.
///
/// The handle is single-threaded. An operation that reaches the stream while another operation on
/// the same stream is still running fails with [`ErrorKind::Underlying`][bytewise::ErrorKind::Underlying].
///
/// # Example
///
/// ```
/// use bytewise_io::{MemoryStream, ReadExt, SharedStream, SubRangeView};
///
/// let parent = SharedStream::new(MemoryStream::from_vec(vec![1, 2, 3, 4]));
/// let mut head = SubRangeView::new(parent.clone(), 0..2).unwrap();
/// let mut tail = SubRangeView::new(parent, 2..4).unwrap();
///
/// assert_eq!(tail.read_u8().unwrap(), 3);
/// assert_eq!(head.read_u8().unwrap(), 1);
/// ```
pub struct SharedStream<S> {
    inner: Rc<RefCell<S>>,
}

impl<S> SharedStream<S> {
    /// Wraps `stream` in a shareable handle.
    #[must_use]
    pub fn new(stream: S) -> Self {
        Self {
            inner: Rc::new(RefCell::new(stream)),
        }
    }

    /// Borrows the underlying stream.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::Underlying`][bytewise::ErrorKind::Underlying] if the stream is
    /// currently in use.
    pub fn borrow(&self) -> Result<Ref<'_, S>> {
        self.inner.try_borrow().map_err(Error::underlying)
    }

    /// Returns the underlying stream if this is the last handle, or the handle itself otherwise.
    ///
    /// # Errors
    ///
    /// Returns `self` if other handles to the stream still exist.
    pub fn try_into_inner(self) -> std::result::Result<S, Self> {
        Rc::try_unwrap(self.inner)
            .map(RefCell::into_inner)
            .map_err(|inner| Self { inner })
    }

    /// The number of handles to the underlying stream.
    #[must_use]
    pub fn handle_count(&self) -> usize {
        Rc::strong_count(&self.inner)
    }

    fn with<T>(&self, f: impl FnOnce(&S) -> Result<T>) -> Result<T> {
        f(&*self.borrow()?)
    }

    fn with_mut<T>(&self, f: impl FnOnce(&mut S) -> Result<T>) -> Result<T> {
        let mut stream = self.inner.try_borrow_mut().map_err(Error::underlying)?;
        f(&mut *stream)
    }
}

impl<S> Clone for SharedStream<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<S: fmt::Debug> fmt::Debug for SharedStream<S> {
    #[cfg_attr(test, mutants::skip)] // We have no API contract here.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.inner.try_borrow() {
            Ok(stream) => f.debug_tuple("SharedStream").field(&*stream).finish(),
            Err(_) => f.write_str("SharedStream(<in use>)"),
        }
    }
}

impl<S: Read> Read for SharedStream<S> {
    fn read_some(&mut self, into: &mut ByteRegion) -> Result<Progress> {
        self.with_mut(|stream| stream.read_some(into))
    }

    fn read_fully(&mut self, into: &mut ByteRegion) -> Result<()> {
        self.with_mut(|stream| stream.read_fully(into))
    }

    fn read_int(&mut self, width: usize, order: ByteOrder, signedness: Signedness) -> Result<i64> {
        self.with_mut(|stream| stream.read_int(width, order, signedness))
    }

    fn skip_up_to(&mut self, count: u64) -> Result<u64> {
        self.with_mut(|stream| stream.skip_up_to(count))
    }
}

impl<S: Write> Write for SharedStream<S> {
    fn write_some(&mut self, from: &mut ByteRegion) -> Result<Progress> {
        self.with_mut(|stream| stream.write_some(from))
    }

    fn flush(&mut self) -> Result<()> {
        self.with_mut(Write::flush)
    }

    fn write_fully(&mut self, from: &mut ByteRegion) -> Result<()> {
        self.with_mut(|stream| stream.write_fully(from))
    }

    fn write_int(&mut self, width: usize, value: i64, order: ByteOrder, signedness: Signedness) -> Result<()> {
        self.with_mut(|stream| stream.write_int(width, value, order, signedness))
    }
}

impl<S: Seek> Seek for SharedStream<S> {
    fn position(&self) -> Result<u64> {
        self.with(Seek::position)
    }

    fn seek(&mut self, origin: SeekOrigin, offset: i64) -> Result<u64> {
        self.with_mut(|stream| stream.seek(origin, offset))
    }
}

impl<S: HasSize> HasSize for SharedStream<S> {
    fn size(&self) -> Result<u64> {
        self.with(HasSize::size)
    }
}

impl<S: ReadAt> ReadAt for SharedStream<S> {
    fn read_at(&mut self, position: u64, into: &mut ByteRegion) -> Result<Progress> {
        self.with_mut(|stream| stream.read_at(position, into))
    }

    fn read_fully_at(&mut self, position: u64, into: &mut ByteRegion) -> Result<()> {
        self.with_mut(|stream| stream.read_fully_at(position, into))
    }

    fn read_int_at(&mut self, position: u64, width: usize, order: ByteOrder, signedness: Signedness) -> Result<i64> {
        self.with_mut(|stream| stream.read_int_at(position, width, order, signedness))
    }
}

impl<S: WriteAt> WriteAt for SharedStream<S> {
    fn write_at(&mut self, position: u64, from: &mut ByteRegion) -> Result<Progress> {
        self.with_mut(|stream| stream.write_at(position, from))
    }

    fn write_fully_at(&mut self, position: u64, from: &mut ByteRegion) -> Result<()> {
        self.with_mut(|stream| stream.write_fully_at(position, from))
    }

    fn write_int_at(&mut self, position: u64, width: usize, value: i64, order: ByteOrder, signedness: Signedness) -> Result<()> {
        self.with_mut(|stream| stream.write_int_at(position, width, value, order, signedness))
    }
}

impl<S: Close> Close for SharedStream<S> {
    fn close(&mut self) -> Result<()> {
        self.with_mut(Close::close)
    }
}

/// The byte order lives in the underlying stream, so every clone sees the same order.
///
/// These methods cannot fail. While a [`Ref`] obtained from [`borrow()`][SharedStream::borrow] is
/// alive, [`set_byte_order()`][ByteOrdered::set_byte_order] leaves the order unchanged. While an
/// operation on another handle is still running, [`byte_order()`][ByteOrdered::byte_order] reports
/// [`ByteOrder::default()`].
impl<S: ByteOrdered> ByteOrdered for SharedStream<S> {
    fn byte_order(&self) -> ByteOrder {
        self.inner.try_borrow().map_or_else(|_| ByteOrder::default(), |stream| stream.byte_order())
    }

    fn set_byte_order(&mut self, order: ByteOrder) {
        match self.inner.try_borrow_mut() {
            Ok(mut stream) => stream.set_byte_order(order),
            Err(_) => event!(Level::DEBUG, message = "byte order update ignored while stream is borrowed", order = ?order),
        }
    }
}
