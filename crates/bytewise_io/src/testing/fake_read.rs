// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::num::NonZero;

use bytewise::{ByteOrder, ByteRegion, Result};

use crate::util::ensure_open;
use crate::{ByteOrdered, Close, Progress, Read};

/// A [`Read`] that reads from an owned byte vector.
///
/// This is for test and example purposes only and is not optimized for performance.
#[derive(Debug)]
pub struct FakeRead {
    contents: Vec<u8>,
    position: usize,

    // For testing purposes, we may choose to limit the read size and
    // thereby force the caller to do multiple read operations.
    max_read_size: Option<NonZero<usize>>,

    byte_order: ByteOrder,
    read_calls: usize,
    closed: bool,
}

impl FakeRead {
    /// Starts building a new `FakeRead`.
    #[must_use]
    pub fn builder() -> FakeReadBuilder {
        FakeReadBuilder {
            contents: Vec::new(),
            max_read_size: None,
            byte_order: ByteOrder::default(),
        }
    }

    /// Creates a new `FakeRead` with the given contents and the default configuration.
    #[must_use]
    pub fn new(contents: Vec<u8>) -> Self {
        Self::builder().contents(contents).build()
    }

    /// The number of bytes not yet read.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.contents.len() - self.position
    }

    /// The number of times [`Read::read_some()`] has been called.
    #[must_use]
    pub fn read_calls(&self) -> usize {
        self.read_calls
    }

    /// Whether [`Close::close()`] has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.closed
    }
}

/// Builder for [`FakeRead`].
#[derive(Debug)]
pub struct FakeReadBuilder {
    contents: Vec<u8>,
    max_read_size: Option<NonZero<usize>>,
    byte_order: ByteOrder,
}

impl FakeReadBuilder {
    /// Sets the bytes the source produces.
    #[must_use]
    pub fn contents(mut self, contents: Vec<u8>) -> Self {
        self.contents = contents;
        self
    }

    /// Caps how many bytes a single read returns.
    #[must_use]
    pub fn max_read_size(mut self, max_read_size: NonZero<usize>) -> Self {
        self.max_read_size = Some(max_read_size);
        self
    }

    /// Sets the byte order reported through [`ByteOrdered`].
    #[must_use]
    pub fn byte_order(mut self, order: ByteOrder) -> Self {
        self.byte_order = order;
        self
    }

    /// Builds the `FakeRead`.
    #[must_use]
    pub fn build(self) -> FakeRead {
        FakeRead {
            contents: self.contents,
            position: 0,
            max_read_size: self.max_read_size,
            byte_order: self.byte_order,
            read_calls: 0,
            closed: false,
        }
    }
}

impl Read for FakeRead {
    #[cfg_attr(test, mutants::skip)] // Mutations easily lead to infinite loops, not worth the effort.
    fn read_some(&mut self, into: &mut ByteRegion) -> Result<Progress> {
        ensure_open(self.closed)?;
        self.read_calls += 1;

        if !into.has_remaining() {
            return Ok(Progress::Bytes(0));
        }

        if self.remaining() == 0 {
            return Ok(Progress::End);
        }

        let limit = self.max_read_size.map_or(usize::MAX, NonZero::get);
        let available = &self.contents[self.position..];
        let count = into.put_slice(&available[..available.len().min(limit)]);
        self.position += count;

        Ok(Progress::Bytes(count))
    }
}

impl Close for FakeRead {
    fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}

impl ByteOrdered for FakeRead {
    fn byte_order(&self) -> ByteOrder {
        self.byte_order
    }

    fn set_byte_order(&mut self, order: ByteOrder) {
        self.byte_order = order;
    }
}

#[cfg(test)]
mod tests {
    use new_zealand::nz;

    use super::*;

    #[test]
    fn honors_max_read_size() {
        let mut source = FakeRead::builder().contents(vec![1, 2, 3]).max_read_size(nz!(2)).build();
        let mut into = ByteRegion::with_capacity(8);

        assert_eq!(source.read_some(&mut into).unwrap(), Progress::Bytes(2));
        assert_eq!(source.read_some(&mut into).unwrap(), Progress::Bytes(1));
        assert_eq!(source.read_some(&mut into).unwrap(), Progress::End);
        assert_eq!(source.read_calls(), 3);
    }

    #[test]
    fn closed_source_fails() {
        let mut source = FakeRead::new(vec![1]);
        source.close().unwrap();

        assert!(source.is_closed());
        assert!(source.read_byte().is_err());
    }
}
