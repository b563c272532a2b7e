// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::collections::VecDeque;
use std::num::NonZero;

use bytewise::{ByteOrder, ByteRegion, Error, Result, Signedness, codec};
use tracing::{Level, event};

use crate::util::{effective_buffer_size, ensure_open};
use crate::{ByteOrdered, Close, DEFAULT_BUFFER_SIZE, Progress, Write};

/// Adds write-behind buffering to a [`Write`].
///
/// Small writes are copied into an active region. Full regions join a queue of pending
/// regions that is drained into the sink whenever the sink accepts data. A sink that accepts
/// only part of a region leaves the rest at the front of the queue, so no byte is ever written
/// twice or skipped.
///
/// Writes of at least the buffer size bypass the copy: if nothing is pending they go straight
/// to the sink, otherwise the caller's region itself is queued.
///
/// Integers are never split across regions. If the active region cannot hold all bytes of an
/// integer, the region is queued and the integer is encoded into a fresh one.
///
/// Bytes reach the sink only when a region is queued and drained, or on
/// [`flush()`][Write::flush] and [`close()`][Close::close]. Dropping the writer discards
/// whatever has not been flushed.
///
/// Once the writer has accepted bytes it keeps them until the sink takes them. A sink failure
/// met while draining the queue during a write is not reported by that write, because its bytes
/// were already accepted. The bytes stay queued and the failure surfaces from the next
/// [`flush()`][Write::flush].
///
/// # Example
///
/// ```
/// use bytewise_io::{BufferedWriter, MemoryStream, Write, WriteExt};
///
/// let mut writer = BufferedWriter::new(MemoryStream::new());
/// writer.write_u32(7).unwrap();
/// writer.write_slice(b"payload").unwrap();
/// writer.flush().unwrap();
///
/// assert_eq!(writer.get_ref().as_slice()[..4], [7, 0, 0, 0]);
/// ```
#[derive(Debug)]
pub struct BufferedWriter<W> {
    sink: W,

    // Region currently being filled. Its processed bytes are the data not yet queued.
    active: Option<ByteRegion>,

    // Regions waiting for the sink, each flipped so that its remaining bytes are the bytes still to write.
    pending: VecDeque<ByteRegion>,

    buffer_size: usize,
    byte_order: ByteOrder,
    close_sink: bool,
    closed: bool,
}

impl<W: Write> BufferedWriter<W> {
    /// Starts building a writer over `sink`.
    #[must_use]
    pub fn builder(sink: W) -> BufferedWriterBuilder<W> {
        BufferedWriterBuilder {
            sink,
            buffer_size: DEFAULT_BUFFER_SIZE,
            byte_order: ByteOrder::default(),
            close_sink: true,
        }
    }

    /// Creates a writer over `sink` with the default configuration.
    #[must_use]
    pub fn new(sink: W) -> Self {
        Self::builder(sink).build()
    }

    /// The number of bytes accepted by the writer but not yet by the sink.
    #[must_use]
    pub fn pending_len(&self) -> usize {
        let active = self.active.as_ref().map_or(0, |region| region.processed().len());
        active + self.pending.iter().map(ByteRegion::remaining).sum::<usize>()
    }

    /// The number of regions queued for the sink, not counting the active region.
    #[must_use]
    pub fn queued_regions(&self) -> usize {
        self.pending.len()
    }

    /// The size of the active region.
    #[must_use]
    pub fn buffer_size(&self) -> usize {
        self.buffer_size
    }

    /// References the underlying sink.
    #[must_use]
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Mutably references the underlying sink.
    ///
    /// Writing to the sink directly places the data ahead of anything still buffered.
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    /// Consumes the writer and returns the underlying sink. Unflushed bytes are lost.
    #[must_use]
    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Writes an owned region, queueing it without a copy when it is large.
    ///
    /// The whole region is accepted. Whatever the sink does not take right away stays queued,
    /// and sink failures surface from the next [`flush()`][Write::flush].
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::ClosedResource`][bytewise::ErrorKind::ClosedResource] after the
    /// writer has been closed, in which case nothing is accepted.
    pub fn write_region(&mut self, data: ByteRegion) -> Result<()> {
        ensure_open(self.closed)?;
        self.accept_region(data);
        Ok(())
    }

    /// Writes queued regions to the sink until the queue is empty or the sink accepts only part
    /// of a region. Returns `true` if the queue was drained.
    ///
    /// # Errors
    ///
    /// Fails with [`ErrorKind::EndOfStream`][bytewise::ErrorKind::EndOfStream] if the sink makes
    /// no progress and with [`ErrorKind::Underlying`][bytewise::ErrorKind::Underlying] if it fails.
    /// The region being written stays at the front of the queue.
    pub fn flush_pending(&mut self) -> Result<bool> {
        ensure_open(self.closed)?;

        while let Some(mut region) = self.pending.pop_front() {
            if !region.has_remaining() {
                continue;
            }

            let before = region.remaining();
            let progress = match self.sink.write_some(&mut region) {
                Ok(progress) => progress,
                Err(error) => {
                    self.pending.push_front(region);
                    return Err(error);
                }
            };

            if region.has_remaining() {
                let accepted = before - region.remaining();
                let left = region.remaining();
                self.pending.push_front(region);

                if accepted == 0 || progress.is_end() {
                    return Err(Error::end_of_stream(format!("sink stopped accepting data with {left} bytes pending")));
                }

                event!(Level::TRACE, message = "partial sink write", accepted, left);
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Drains the queue as far as the sink allows, returning `true` if it is empty afterwards.
    ///
    /// A sink failure leaves the bytes queued and is reported again by the next flush.
    fn drain_pending(&mut self) -> bool {
        match self.flush_pending() {
            Ok(drained) => drained,
            Err(error) => {
                event!(Level::DEBUG, message = "sink error deferred to next flush", error = %error, pending = self.pending_len());
                false
            }
        }
    }

    fn active_region(&mut self) -> &mut ByteRegion {
        let buffer_size = self.buffer_size;
        self.active.get_or_insert_with(|| ByteRegion::with_capacity(buffer_size))
    }

    /// Moves the active region to the back of the queue if it holds any data.
    fn queue_active(&mut self) {
        if let Some(mut region) = self.active.take_if(|region| !region.processed().is_empty()) {
            region.flip();
            self.pending.push_back(region);
            event!(Level::TRACE, message = "region queued", queued = self.pending.len());
        }
    }

    /// Takes ownership of all bytes of `data`, writing straight to the sink when nothing is queued.
    fn accept_region(&mut self, mut data: ByteRegion) {
        if !data.has_remaining() {
            return;
        }

        if data.remaining() < self.buffer_size {
            self.buffer_slice(data.as_slice());
            return;
        }

        // Top up a partially filled active region so that it does not sit behind the large write.
        if let Some(active) = self.active.as_mut().filter(|region| !region.processed().is_empty()) {
            active.transfer_from(&mut data);
            self.queue_active();
        }

        if !self.pending.is_empty() && !self.drain_pending() {
            event!(Level::TRACE, message = "large write queued without copy", bytes = data.remaining());
            self.pending.push_back(data);
            return;
        }

        if data.has_remaining() {
            if let Err(error) = self.sink.write_some(&mut data) {
                event!(Level::DEBUG, message = "sink error deferred to next flush", error = %error, pending = data.remaining());
            }

            if data.has_remaining() {
                self.pending.push_back(data);
            }
        }
    }

    /// Copies `data` into active regions, queueing each one as it fills.
    fn buffer_slice(&mut self, mut data: &[u8]) {
        while !data.is_empty() {
            let active = self.active_region();
            let copied = active.put_slice(data);
            let full = !active.has_remaining();
            data = &data[copied..];

            if full {
                self.queue_active();
            }
        }

        if !self.pending.is_empty() {
            self.drain_pending();
        }
    }
}

/// Builder for [`BufferedWriter`].
#[derive(Debug)]
pub struct BufferedWriterBuilder<W> {
    sink: W,
    buffer_size: usize,
    byte_order: ByteOrder,
    close_sink: bool,
}

impl<W: Write> BufferedWriterBuilder<W> {
    /// Sets the size of the regions small writes are collected in.
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

    /// Sets whether closing the writer also closes the sink. Defaults to `true`.
    #[must_use]
    pub fn close_sink(mut self, close_sink: bool) -> Self {
        self.close_sink = close_sink;
        self
    }

    /// Builds the `BufferedWriter`. No memory is reserved until the first write.
    #[must_use]
    pub fn build(self) -> BufferedWriter<W> {
        BufferedWriter {
            sink: self.sink,
            active: None,
            pending: VecDeque::new(),
            buffer_size: self.buffer_size,
            byte_order: self.byte_order,
            close_sink: self.close_sink,
            closed: false,
        }
    }
}

impl<W: Write> Write for BufferedWriter<W> {
    fn write_some(&mut self, from: &mut ByteRegion) -> Result<Progress> {
        ensure_open(self.closed)?;

        let count = from.remaining();
        if count == 0 {
            return Ok(Progress::Bytes(0));
        }

        if count >= self.buffer_size && self.pending_len() == 0 {
            return self.sink.write_some(from);
        }

        if count < self.buffer_size {
            self.buffer_slice(from.as_slice());
        } else {
            self.accept_region(ByteRegion::copied_from_slice(from.as_slice()));
        }

        from.advance(count)?;
        Ok(Progress::Bytes(count))
    }

    fn flush(&mut self) -> Result<()> {
        ensure_open(self.closed)?;

        self.queue_active();
        while !self.flush_pending()? {}

        self.sink.flush()
    }

    fn write_slice(&mut self, data: &[u8]) -> Result<()> {
        ensure_open(self.closed)?;

        if data.len() < self.buffer_size {
            self.buffer_slice(data);
        } else {
            self.accept_region(ByteRegion::copied_from_slice(data));
        }

        Ok(())
    }

    fn write_byte(&mut self, value: u8) -> Result<()> {
        ensure_open(self.closed)?;
        self.buffer_slice(&[value]);
        Ok(())
    }

    fn write_int(&mut self, width: usize, value: i64, order: ByteOrder, signedness: Signedness) -> Result<()> {
        ensure_open(self.closed)?;
        codec::validate_width(width, signedness)?;

        if self.active.as_ref().is_some_and(|region| region.remaining() < width) {
            self.queue_active();
            self.flush_pending()?;
        }

        let active = self.active_region();
        active.put_int(width, value, order, signedness)?;

        if !active.has_remaining() {
            self.queue_active();
        }

        Ok(())
    }
}

impl<W: Write + Close> Close for BufferedWriter<W> {
    fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }

        let flushed = self.flush();

        self.closed = true;
        self.active = None;
        self.pending.clear();

        let sink_closed = if self.close_sink { self.sink.close() } else { Ok(()) };
        flushed.and(sink_closed)
    }
}

impl<W> ByteOrdered for BufferedWriter<W> {
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
    use tracing_test::traced_test;

    use super::*;
    use crate::WriteExt;
    use crate::testing::FakeWrite;

    fn small_writer(sink: FakeWrite) -> BufferedWriter<FakeWrite> {
        BufferedWriter::builder(sink).buffer_size(nz!(16)).build()
    }

    #[test]
    fn small_writes_stay_buffered_until_flush() {
        let mut writer = small_writer(FakeWrite::new());

        writer.write_slice(&[1, 2, 3]).unwrap();
        writer.write_byte(4).unwrap();

        assert_eq!(writer.pending_len(), 4);
        assert!(writer.get_ref().contents().is_empty());

        writer.flush().unwrap();

        assert_eq!(writer.pending_len(), 0);
        assert_eq!(writer.get_ref().contents(), &[1, 2, 3, 4]);
        assert_eq!(writer.get_ref().flush_calls(), 1);
    }

    #[test]
    fn full_region_is_drained() {
        let mut writer = small_writer(FakeWrite::new());

        writer.write_slice(&[7; 10]).unwrap();
        writer.write_slice(&[8; 10]).unwrap();

        assert_eq!(writer.get_ref().contents().len(), 16);
        assert_eq!(writer.pending_len(), 4);
    }

    #[test]
    fn integer_never_splits() {
        let mut writer = small_writer(FakeWrite::new());

        writer.write_slice(&[0; 12]).unwrap();
        writer.write_i64(-1).unwrap();

        // The first region was queued with 12 bytes, the integer went into a fresh region.
        assert_eq!(writer.get_ref().chunks(), &[vec![0; 12]]);
        assert_eq!(writer.pending_len(), 8);

        writer.flush().unwrap();
        assert_eq!(writer.get_ref().chunks()[1], vec![0xFF; 8]);
    }

    #[test]
    fn partial_sink_writes_preserve_order() {
        let sink = FakeWrite::builder().max_write_size(nz!(5)).build();
        let mut writer = small_writer(sink);

        let data: Vec<u8> = (0..100).collect();
        for chunk in data.chunks(3) {
            writer.write_slice(chunk).unwrap();
        }
        writer.flush().unwrap();

        assert_eq!(writer.get_ref().contents(), data.as_slice());
        assert!(writer.get_ref().chunks().iter().all(|chunk| chunk.len() <= 5));
    }

    #[test]
    #[traced_test]
    fn partial_sink_write_is_traced() {
        let sink = FakeWrite::builder().max_write_size(nz!(4)).build();
        let mut writer = small_writer(sink);

        writer.write_slice(&[1; 10]).unwrap();
        writer.write_slice(&[1; 6]).unwrap();

        assert!(logs_contain("partial sink write"));
        assert_eq!(writer.queued_regions(), 1);
        assert_eq!(writer.pending_len(), 12);
    }

    #[test]
    fn large_write_goes_straight_to_sink() {
        let mut writer = small_writer(FakeWrite::new());

        writer.write_slice(&[3; 64]).unwrap();

        assert_eq!(writer.get_ref().chunks(), &[vec![3; 64]]);
        assert_eq!(writer.pending_len(), 0);
    }

    #[test]
    fn large_write_tops_up_active_region_first() {
        let mut writer = small_writer(FakeWrite::new());

        writer.write_slice(&[1; 4]).unwrap();
        writer.write_region(ByteRegion::from_vec(vec![2; 32])).unwrap();

        let mut expected = vec![1; 4];
        expected.extend_from_slice(&[2; 32]);
        assert_eq!(writer.get_ref().contents(), expected.as_slice());
        assert_eq!(writer.get_ref().chunks()[0].len(), 16);
    }

    #[test]
    fn large_write_is_queued_behind_stuck_data() {
        let sink = FakeWrite::builder().max_write_size(nz!(2)).build();
        let mut writer = small_writer(sink);

        // Goes straight to the sink, which takes 2 bytes and leaves the rest queued.
        writer.write_slice(&[1; 16]).unwrap();
        assert_eq!(writer.queued_regions(), 1);

        writer.write_region(ByteRegion::from_vec(vec![2; 20])).unwrap();
        assert_eq!(writer.queued_regions(), 2);

        writer.flush().unwrap();

        let mut expected = vec![1; 16];
        expected.extend_from_slice(&[2; 20]);
        assert_eq!(writer.get_ref().contents(), expected.as_slice());
    }

    #[test]
    fn full_sink_is_end_of_stream() {
        let sink = FakeWrite::builder().capacity(10).build();
        let mut writer = small_writer(sink);

        writer.write_slice(&[5; 12]).unwrap();
        let error = writer.flush().unwrap_err();

        assert_eq!(error.kind(), ErrorKind::EndOfStream);
        assert_eq!(writer.pending_len(), 2);

        writer.get_mut().remove_capacity_limit();
        writer.flush().unwrap();
        assert_eq!(writer.get_ref().contents(), &[5; 12]);
    }

    #[test]
    fn sink_failure_keeps_data_queued() {
        let sink = FakeWrite::builder().fail_after_writes(0).build();
        let mut writer = small_writer(sink);

        writer.write_slice(&[9; 8]).unwrap();
        let error = writer.flush().unwrap_err();

        assert_eq!(error.kind(), ErrorKind::Underlying);
        assert_eq!(writer.pending_len(), 8);

        writer.get_mut().stop_failing();
        writer.flush().unwrap();
        assert_eq!(writer.get_ref().contents(), &[9; 8]);
    }

    #[test]
    #[traced_test]
    fn accepted_bytes_are_not_rejected_when_sink_fails() {
        let sink = FakeWrite::builder().fail_after_writes(0).build();
        let mut writer = small_writer(sink);

        writer.write_slice(&[1; 10]).unwrap();

        // Fills and queues the first region, which the failing sink then refuses.
        let mut from = ByteRegion::from_vec(vec![2; 10]);
        assert_eq!(writer.write_some(&mut from).unwrap(), Progress::Bytes(10));
        assert_eq!(from.remaining(), 0);
        assert_eq!(writer.pending_len(), 20);
        assert!(logs_contain("sink error deferred to next flush"));

        assert_eq!(writer.flush().unwrap_err().kind(), ErrorKind::Underlying);

        // Retrying whatever the caller still sees as unwritten must not duplicate anything.
        writer.get_mut().stop_failing();
        writer.write_fully(&mut from).unwrap();
        writer.flush().unwrap();

        let mut expected = vec![1; 10];
        expected.extend_from_slice(&[2; 10]);
        assert_eq!(writer.get_ref().contents(), expected.as_slice());
    }

    #[test]
    fn large_write_is_kept_when_sink_fails() {
        let sink = FakeWrite::builder().fail_after_writes(0).build();
        let mut writer = small_writer(sink);

        writer.write_slice(&[3; 32]).unwrap();
        assert_eq!(writer.pending_len(), 32);
        assert_eq!(writer.flush().unwrap_err().kind(), ErrorKind::Underlying);

        writer.get_mut().stop_failing();
        writer.flush().unwrap();
        assert_eq!(writer.get_ref().contents(), &[3; 32]);
    }

    #[test]
    fn large_write_into_full_sink_is_reported_on_flush() {
        let sink = FakeWrite::builder().capacity(0).build();
        let mut writer = small_writer(sink);

        writer.write_region(ByteRegion::from_vec(vec![4; 20])).unwrap();
        assert_eq!(writer.pending_len(), 20);
        assert_eq!(writer.flush().unwrap_err().kind(), ErrorKind::EndOfStream);

        writer.get_mut().remove_capacity_limit();
        writer.flush().unwrap();
        assert_eq!(writer.get_ref().contents(), &[4; 20]);
    }

    #[test]
    fn write_some_accepts_everything_when_buffering() {
        let mut writer = small_writer(FakeWrite::new());
        let mut from = ByteRegion::from_vec(vec![1, 2, 3]);

        assert_eq!(writer.write_some(&mut from).unwrap(), Progress::Bytes(3));
        assert!(!from.has_remaining());
    }

    #[test]
    fn invalid_int_width_writes_nothing() {
        let mut writer = small_writer(FakeWrite::new());

        let error = writer.write_int(8, 1, ByteOrder::LittleEndian, Signedness::Unsigned).unwrap_err();

        assert_eq!(error.kind(), ErrorKind::InvalidArgument);
        assert_eq!(writer.pending_len(), 0);
    }

    #[test]
    fn close_flushes_and_is_idempotent() {
        let mut writer = small_writer(FakeWrite::new());
        writer.write_u16(0x0102).unwrap();

        writer.close().unwrap();
        writer.close().unwrap();

        assert_eq!(writer.get_ref().contents(), &[0x02, 0x01]);
        assert!(writer.get_ref().is_closed());
        assert_eq!(writer.write_byte(0).unwrap_err().kind(), ErrorKind::ClosedResource);
    }

    #[test]
    fn close_reports_flush_failure() {
        let sink = FakeWrite::builder().capacity(0).build();
        let mut writer = BufferedWriter::builder(sink).close_sink(false).build();
        writer.write_byte(1).unwrap();

        assert_eq!(writer.close().unwrap_err().kind(), ErrorKind::EndOfStream);
        assert!(!writer.get_ref().is_closed());
    }
}
