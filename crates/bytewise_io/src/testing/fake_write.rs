// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::num::NonZero;

use bytewise::{ByteOrder, ByteRegion, Error, Result};

use crate::util::ensure_open;
use crate::{ByteOrdered, Close, Progress, Write};

/// A [`Write`] that collects all written data into itself.
///
/// The sink can be configured to accept data in small pieces, to fill up after a number of
/// bytes and to fail after a number of writes, which makes it suitable for exercising the
/// error paths of buffering layers.
///
/// This is for test and example purposes only and is not optimized for performance.
#[derive(Debug)]
pub struct FakeWrite {
    contents: Vec<u8>,

    // Every accepted write, in order. Lets tests assert how data was split across calls.
    chunks: Vec<Vec<u8>>,

    max_write_size: Option<NonZero<usize>>,
    capacity: Option<usize>,
    fail_after_writes: Option<usize>,

    byte_order: ByteOrder,
    write_calls: usize,
    flush_calls: usize,
    closed: bool,
}

impl FakeWrite {
    /// Starts building a new `FakeWrite`.
    #[must_use]
    pub fn builder() -> FakeWriteBuilder {
        FakeWriteBuilder {
            max_write_size: None,
            capacity: None,
            fail_after_writes: None,
            byte_order: ByteOrder::default(),
        }
    }

    /// Creates a new `FakeWrite` with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::builder().build()
    }

    /// References the contents written into the sink so far.
    #[must_use]
    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    /// Consumes the sink and returns the contents that were written to it.
    #[must_use]
    pub fn into_contents(self) -> Vec<u8> {
        self.contents
    }

    /// Every accepted write, in the order it was accepted.
    #[must_use]
    pub fn chunks(&self) -> &[Vec<u8>] {
        &self.chunks
    }

    /// The number of times [`Write::write_some()`] has been called.
    #[must_use]
    pub fn write_calls(&self) -> usize {
        self.write_calls
    }

    /// The number of times [`Write::flush()`] has been called.
    #[must_use]
    pub fn flush_calls(&self) -> usize {
        self.flush_calls
    }

    /// Whether [`Close::close()`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Lifts the configured capacity limit, letting a full sink accept data again.
    pub fn remove_capacity_limit(&mut self) {
        self.capacity = None;
    }

    /// Lifts the configured failure, letting a failing sink accept data again.
    pub fn stop_failing(&mut self) {
        self.fail_after_writes = None;
    }
}

impl Default for FakeWrite {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for [`FakeWrite`].
#[derive(Debug)]
pub struct FakeWriteBuilder {
    max_write_size: Option<NonZero<usize>>,
    capacity: Option<usize>,
    fail_after_writes: Option<usize>,
    byte_order: ByteOrder,
}

impl FakeWriteBuilder {
    /// Caps how many bytes a single write accepts.
    #[must_use]
    pub fn max_write_size(mut self, max_write_size: NonZero<usize>) -> Self {
        self.max_write_size = Some(max_write_size);
        self
    }

    /// Makes the sink report [`Progress::End`] once it holds `capacity` bytes.
    #[must_use]
    pub fn capacity(mut self, capacity: usize) -> Self {
        self.capacity = Some(capacity);
        self
    }

    /// Makes every write after the first `writes` ones fail with
    /// [`ErrorKind::Underlying`][bytewise::ErrorKind::Underlying].
    #[must_use]
    pub fn fail_after_writes(mut self, writes: usize) -> Self {
        self.fail_after_writes = Some(writes);
        self
    }

    /// Sets the byte order reported through [`ByteOrdered`].
    #[must_use]
    pub fn byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = order;
        self
    }

    /// Builds the `FakeWrite`.
    #[must_use]
    pub fn build(self) -> FakeWrite {
        FakeWrite {
            contents: Vec::new(),
            chunks: Vec::new(),
            max_write_size: self.max_write_size,
            capacity: self.capacity,
            fail_after_writes: self.fail_after_writes,
            byte_order: self.byte_order,
            write_calls: 0,
            flush_calls: 0,
            closed: false,
        }
    }
}

impl Write for FakeWrite {
    #[cfg_attr(test, mutants::skip)] // Mutations easily lead to infinite loops, not worth the effort.
    fn write_some(&mut self, from: &mut ByteRegion) -> Result<Progress> {
        ensure_open(self.closed)?;
        self.write_calls += 1;

        if self.fail_after_writes.is_some_and(|allowed| self.write_calls > allowed) {
            return Err(Error::underlying(format!("injected failure on write {}", self.write_calls)));
        }

        if !from.has_remaining() {
            return Ok(Progress::Bytes(0));
        }

        let room = self.capacity.map_or(usize::MAX, |capacity| capacity.saturating_sub(self.contents.len()));
        if room == 0 {
            return Ok(Progress::End);
        }

        let count = from
            .remaining()
            .min(room)
            .min(self.max_write_size.map_or(usize::MAX, NonZero::get));

        let chunk = from.as_slice()[..count].to_vec();
        from.advance(count)?;

        self.contents.extend_from_slice(&chunk);
        self.chunks.push(chunk);

        Ok(Progress::Bytes(count))
    }

    fn flush(&mut self) -> Result<()> {
        ensure_open(self.closed)?;
        self.flush_calls += 1;
        Ok(())
    }
}

impl Close for FakeWrite {
    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

impl ByteOrdered for FakeWrite {
    fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    fn set_byte_order(&mut self, order: ByteOrder) {
        self.byte_order = order;
    }
}
