// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

#![cfg_attr(coverage_nightly, feature(coverage_attribute))]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]

//! Owned byte regions and fixed-width integer codecs.
//!
//! This crate holds the leaf building blocks of the `bytewise_io` stream engine:
//!
//! * [`ByteRegion`] is an owned byte buffer with a `start <= position <= end` cursor. Streams
//!   read into and write from regions, advancing the position by however many bytes they
//!   transferred.
//! * [`codec`] encodes and decodes integers of 1 to 8 bytes in either [`ByteOrder`], signed or
//!   unsigned, in place inside caller-owned buffers.
//! * [`GrowthStrategy`] decides how far a growable byte array expands when it runs out of room.
//! * [`Error`] is the error type shared by this crate and `bytewise_io`, classified by
//!   [`ErrorKind`].
//!
//! # Integers
//!
//! Integers travel in an `i64` regardless of their encoded width. Signed integers may be 1 to 8
//! bytes wide, unsigned integers 1 to 7 bytes wide. An 8-byte unsigned integer is rejected with
//! [`ErrorKind::InvalidArgument`]; use the signed 8-byte form and reinterpret the bits instead.
//!
//! ```
//! use bytewise::{ByteOrder, ByteRegion, Signedness};
//!
//! let mut region = ByteRegion::with_capacity(8);
//! region.put_int(3, 0x01_02_03, ByteOrder::LittleEndian, Signedness::Unsigned).unwrap();
//! region.flip();
//!
//! assert_eq!(region.as_slice(), &[0x03, 0x02, 0x01]);
//! ```

pub mod codec;
mod error;
mod growth;
mod order;
mod region;

pub use error::{Error, ErrorKind, Result};
pub use growth::GrowthStrategy;
pub use order::{ByteOrder, Signedness};
pub use region::ByteRegion;
