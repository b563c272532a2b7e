// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Composable synchronous byte streams over [`bytewise`] regions.
//!
//! Streams are described by small capability traits. A type implements only the capabilities it
//! can honor:
//!
//! * [`Read`] and [`Write`] for sequential transfers,
//! * [`Seek`] and [`HasSize`] for streams with a movable position and a known size,
//! * [`ReadAt`] and [`WriteAt`] for positional transfers that leave the position alone,
//! * [`Close`] for streams that release resources,
//! * [`ByteOrdered`] for streams with a configured byte order, which unlocks the typed helpers of
//!   [`ReadExt`], [`WriteExt`], [`ReadAtExt`] and [`WriteAtExt`].
//!
//! Raw transfers report how far they got as [`Progress`], signaling the end of a stream as
//! [`Progress::End`]. Exact ("fully") transfers fail with
//! [`ErrorKind::EndOfStream`][bytewise::ErrorKind::EndOfStream] instead.
//!
//! The building blocks compose freely:
//!
//! * [`BufferedReader`] and [`BufferedWriter`] batch small transfers and keep integer transfers
//!   atomic no matter how the underlying endpoint splits its data.
//! * [`CompositeStream`] concatenates sized streams into one seekable stream;
//!   [`StreamingComposite`] concatenates streams of unknown size for a single pass.
//! * [`SubRangeView`] restricts a positional stream to a window.
//! * [`MemoryStream`] is an in-memory endpoint and [`SharedStream`] lets several views share one
//!   stream.
//!
//! # Example
//!
//! ```
//! use bytewise::ByteOrder;
//! use bytewise_io::{CompositeStream, MemoryStream, ReadAtExt, SharedStream, SubRangeView};
//!
//! let file = SharedStream::new(MemoryStream::from_vec(vec![0xAA, 0x00, 0x01, 0xBB, 0x02, 0x03]));
//!
//! // Stitch two windows of one stream together and read an integer spanning both.
//! let mut stitched = CompositeStream::builder()
//!     .byte_order(ByteOrder::BigEndian)
//!     .build([
//!         SubRangeView::new(file.clone(), 1..3).unwrap(),
//!         SubRangeView::new(file, 4..6).unwrap(),
//!     ])
//!     .unwrap();
//!
//! assert_eq!(stitched.read_i32_at(0).unwrap(), 0x0001_0203);
//! ```
//!
//! The `test-util` feature enables fake endpoints for testing code that consumes or produces
//! byte streams. These are in the `testing` module.

mod buffered_reader;
mod buffered_writer;
mod byte_ordered;
mod close;
mod composite;
mod memory_stream;
mod progress;
mod read;
mod read_at;
mod read_ext;
mod seek;
mod shared;
mod streaming_composite;
mod sub_range;
mod util;
mod write;
mod write_at;
mod write_ext;

pub use buffered_reader::{BufferedReader, BufferedReaderBuilder};
pub use buffered_writer::{BufferedWriter, BufferedWriterBuilder};
pub use byte_ordered::ByteOrdered;
pub use close::Close;
pub use composite::{CompositeStream, CompositeStreamBuilder};
pub use memory_stream::{MemoryStream, MemoryStreamBuilder};
pub use progress::Progress;
pub use read::Read;
pub use read_at::ReadAt;
pub use read_ext::{ReadAtExt, ReadExt};
pub use seek::{HasSize, Seek, SeekOrigin};
pub use shared::SharedStream;
pub use streaming_composite::StreamingComposite;
pub use sub_range::SubRangeView;
pub use write::Write;
pub use write_at::WriteAt;
pub use write_ext::{WriteAtExt, WriteExt};

#[cfg(any(test, feature = "test-util"))]
pub mod testing;

/// The buffer size [`BufferedReader`] and [`BufferedWriter`] use unless configured otherwise.
pub const DEFAULT_BUFFER_SIZE: usize = 8 * 1024;

/// The smallest buffer [`BufferedReader`] and [`BufferedWriter`] accept. Smaller configured sizes
/// are raised to it, so that any integer fits in one buffer.
pub const MIN_BUFFER_SIZE: usize = 16;
