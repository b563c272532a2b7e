// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

//! Encoding and decoding of fixed-width integers of 1 to 8 bytes.
//!
//! All functions are pure and operate on caller-owned byte slices. Values travel in an `i64`
//! container regardless of width or signedness.
//!
//! Signed integers may be 1 to 8 bytes wide. Unsigned integers may only be 1 to 7 bytes wide,
//! because an 8-byte unsigned value does not fit into the `i64` container without changing its
//! meaning. Callers that need a full 64-bit unsigned value use the signed 8-byte path and
//! reinterpret the bits themselves (e.g. via `u64::from_ne_bytes(value.to_ne_bytes())`).
//!
//! Every function validates the width first, then the offset and buffer bounds, and only then
//! touches any byte. A failed call never mutates the destination.
//!
//! ```
//! use bytewise::codec;
//! use bytewise::{ByteOrder, Signedness};
//!
//! let bytes = codec::encode(3, -2, ByteOrder::BigEndian, Signedness::Signed).unwrap();
//! assert_eq!(bytes.as_slice(), &[0xFF, 0xFF, 0xFE]);
//!
//! let value = codec::decode(&bytes, 0, 3, ByteOrder::BigEndian, Signedness::Signed).unwrap();
//! assert_eq!(value, -2);
//! ```

use std::ops::{Range, RangeInclusive};

use smallvec::SmallVec;

use crate::{ByteOrder, Error, Result, Signedness};

/// The widest integer the codec handles, in bytes.
pub const MAX_WIDTH: usize = 8;

/// The widest unsigned integer the codec handles, in bytes.
pub const MAX_UNSIGNED_WIDTH: usize = MAX_WIDTH - 1;

/// The encoded bytes of a single integer, stored inline.
pub type Encoded = SmallVec<[u8; MAX_WIDTH]>;

/// Checks that `width` is supported for the given signedness.
///
/// # Errors
///
/// Returns [`ErrorKind::InvalidArgument`][crate::ErrorKind::InvalidArgument] if `width` is zero,
/// larger than [`MAX_WIDTH`], or larger than [`MAX_UNSIGNED_WIDTH`] for unsigned integers.
pub fn validate_width(width: usize, signedness: Signedness) -> Result<()> {
    let max = match signedness {
        Signedness::Signed => MAX_WIDTH,
        Signedness::Unsigned => MAX_UNSIGNED_WIDTH,
    };

    if width == 0 || width > max {
        return Err(Error::invalid_argument(format!(
            "{signedness:?} integer width must be between 1 and {max} bytes, got {width}"
        )));
    }

    Ok(())
}

/// The values representable in `width` bytes with the given signedness.
///
/// # Errors
///
/// Returns [`ErrorKind::InvalidArgument`][crate::ErrorKind::InvalidArgument] for unsupported widths.
pub fn value_range(width: usize, signedness: Signedness) -> Result<RangeInclusive<i64>> {
    validate_width(width, signedness)?;

    let range = match signedness {
        Signedness::Signed if width == MAX_WIDTH => i64::MIN..=i64::MAX,
        Signedness::Signed => {
            let half = 1_i64 << (width * 8 - 1);
            -half..=half - 1
        }
        Signedness::Unsigned => 0..=(1_i64 << (width * 8)) - 1,
    };

    Ok(range)
}

/// Encodes the low `width` bytes of `value` into a new inline buffer.
///
/// Bits of `value` above `width` bytes are discarded, as with a two's complement truncation.
///
/// # Errors
///
/// Returns [`ErrorKind::InvalidArgument`][crate::ErrorKind::InvalidArgument] for unsupported widths.
pub fn encode(width: usize, value: i64, order: ByteOrder, signedness: Signedness) -> Result<Encoded> {
    validate_width(width, signedness)?;

    let mut encoded = Encoded::from_elem(0, width);
    encode_into(&mut encoded, 0, width, value, order, signedness)?;
    Ok(encoded)
}

/// Encodes the low `width` bytes of `value` into `dst` starting at `offset`.
///
/// # Errors
///
/// Returns [`ErrorKind::InvalidArgument`][crate::ErrorKind::InvalidArgument] for unsupported widths
/// and [`ErrorKind::EndOfStream`][crate::ErrorKind::EndOfStream] if `dst` does not have `width`
/// bytes starting at `offset`. `dst` is left untouched on error.
pub fn encode_into(dst: &mut [u8], offset: usize, width: usize, value: i64, order: ByteOrder, signedness: Signedness) -> Result<()> {
    validate_width(width, signedness)?;
    let window = window(dst.len(), offset, width)?;
    let target = &mut dst[window];

    match order {
        ByteOrder::LittleEndian => target.copy_from_slice(&value.to_le_bytes()[..width]),
        ByteOrder::BigEndian => target.copy_from_slice(&value.to_be_bytes()[MAX_WIDTH - width..]),
    }

    Ok(())
}

/// Decodes a `width`-byte integer from `src` starting at `offset`.
///
/// Signed values are sign-extended from the top bit of their most significant byte, unsigned
/// values are zero-extended.
///
/// # Errors
///
/// Returns [`ErrorKind::InvalidArgument`][crate::ErrorKind::InvalidArgument] for unsupported widths
/// and [`ErrorKind::EndOfStream`][crate::ErrorKind::EndOfStream] if `src` does not have `width`
/// bytes starting at `offset`.
pub fn decode(src: &[u8], offset: usize, width: usize, order: ByteOrder, signedness: Signedness) -> Result<i64> {
    validate_width(width, signedness)?;
    let window = window(src.len(), offset, width)?;
    let source = &src[window];

    let mut le_bytes = [0_u8; MAX_WIDTH];

    match order {
        ByteOrder::LittleEndian => le_bytes[..width].copy_from_slice(source),
        ByteOrder::BigEndian => {
            for (dst, src) in le_bytes.iter_mut().zip(source.iter().rev()) {
                *dst = *src;
            }
        }
    }

    if signedness == Signedness::Signed && le_bytes[width - 1] & 0x80 != 0 {
        le_bytes[width..].fill(0xFF);
    }

    Ok(i64::from_le_bytes(le_bytes))
}

fn window(len: usize, offset: usize, width: usize) -> Result<Range<usize>> {
    match offset.checked_add(width) {
        Some(end) if end <= len => Ok(offset..end),
        _ => Err(Error::end_of_stream(format!(
            "{width} bytes at offset {offset} do not fit in a buffer of {len} bytes"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ErrorKind;

    const ORDERS: [ByteOrder; 2] = [ByteOrder::LittleEndian, ByteOrder::BigEndian];

    fn interesting_values(width: usize, signedness: Signedness) -> Vec<i64> {
        let range = value_range(width, signedness).unwrap();
        let mut values = vec![0, *range.start(), *range.end()];

        if signedness == Signedness::Signed {
            values.push(-1);
        }

        for bit in 0..(width * 8) {
            let single = 1_i64 << bit;
            if range.contains(&single) {
                values.push(single);
            }
        }

        values
    }

    #[test]
    fn round_trip_every_supported_width() {
        for signedness in [Signedness::Signed, Signedness::Unsigned] {
            let max = match signedness {
                Signedness::Signed => MAX_WIDTH,
                Signedness::Unsigned => MAX_UNSIGNED_WIDTH,
            };

            for width in 1..=max {
                for order in ORDERS {
                    for value in interesting_values(width, signedness) {
                        let encoded = encode(width, value, order, signedness).unwrap();
                        assert_eq!(encoded.len(), width);

                        let decoded = decode(&encoded, 0, width, order, signedness).unwrap();
                        assert_eq!(decoded, value, "width {width}, {order:?}, {signedness:?}");
                    }
                }
            }
        }
    }

    #[test]
    fn byte_layout_follows_order() {
        let le = encode(4, 0x0102_0304, ByteOrder::LittleEndian, Signedness::Signed).unwrap();
        assert_eq!(le.as_slice(), &[4, 3, 2, 1]);

        let be = encode(4, 0x0102_0304, ByteOrder::BigEndian, Signedness::Signed).unwrap();
        assert_eq!(be.as_slice(), &[1, 2, 3, 4]);
    }

    #[test]
    fn signed_decode_sign_extends() {
        assert_eq!(decode(&[0xFF], 0, 1, ByteOrder::LittleEndian, Signedness::Signed).unwrap(), -1);
        assert_eq!(decode(&[0x80, 0x00], 0, 2, ByteOrder::BigEndian, Signedness::Signed).unwrap(), -32768);
        assert_eq!(decode(&[0x7F, 0xFF], 0, 2, ByteOrder::BigEndian, Signedness::Signed).unwrap(), 32767);
    }

    #[test]
    fn unsigned_decode_zero_extends() {
        assert_eq!(decode(&[0xFF], 0, 1, ByteOrder::LittleEndian, Signedness::Unsigned).unwrap(), 255);

        let seven = [0xFF; 7];
        assert_eq!(
            decode(&seven, 0, 7, ByteOrder::LittleEndian, Signedness::Unsigned).unwrap(),
            0x00FF_FFFF_FFFF_FFFF
        );
    }

    #[test]
    fn signed_width_eight_covers_full_container() {
        for order in ORDERS {
            for value in [i64::MIN, i64::MAX, -1, 0] {
                let encoded = encode(8, value, order, Signedness::Signed).unwrap();
                assert_eq!(decode(&encoded, 0, 8, order, Signedness::Signed).unwrap(), value);
            }
        }
    }

    #[test]
    fn decode_at_offset() {
        let data = [0xAA, 0x34, 0x12, 0xBB];
        assert_eq!(
            decode(&data, 1, 2, ByteOrder::LittleEndian, Signedness::Unsigned).unwrap(),
            0x1234
        );
    }

    #[test]
    fn encode_truncates_to_width() {
        let encoded = encode(1, 0x1FF, ByteOrder::LittleEndian, Signedness::Unsigned).unwrap();
        assert_eq!(encoded.as_slice(), &[0xFF]);
    }

    #[test]
    fn invalid_widths_rejected_without_mutation() {
        let cases = [
            (0, Signedness::Signed),
            (9, Signedness::Signed),
            (0, Signedness::Unsigned),
            (8, Signedness::Unsigned),
            (9, Signedness::Unsigned),
        ];

        for (width, signedness) in cases {
            let mut buffer = [0x5A_u8; 16];

            let error = encode_into(&mut buffer, 0, width, -1, ByteOrder::LittleEndian, signedness).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::InvalidArgument);
            assert_eq!(buffer, [0x5A; 16]);

            let error = encode(width, 1, ByteOrder::BigEndian, signedness).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::InvalidArgument);

            let error = decode(&buffer, 0, width, ByteOrder::LittleEndian, signedness).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::InvalidArgument);
        }
    }

    #[test]
    fn insufficient_bytes_is_end_of_stream() {
        let mut buffer = [0_u8; 3];

        let error = encode_into(&mut buffer, 1, 4, 7, ByteOrder::LittleEndian, Signedness::Signed).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::EndOfStream);
        assert_eq!(buffer, [0; 3]);

        let error = decode(&buffer, 0, 4, ByteOrder::LittleEndian, Signedness::Signed).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::EndOfStream);

        let error = decode(&buffer, usize::MAX, 2, ByteOrder::LittleEndian, Signedness::Signed).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::EndOfStream);
    }

    #[test]
    fn width_checked_before_bounds() {
        let error = decode(&[], 0, 9, ByteOrder::LittleEndian, Signedness::Signed).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn value_range_bounds() {
        assert_eq!(value_range(1, Signedness::Signed).unwrap(), -128..=127);
        assert_eq!(value_range(1, Signedness::Unsigned).unwrap(), 0..=255);
        assert_eq!(value_range(8, Signedness::Signed).unwrap(), i64::MIN..=i64::MAX);
        assert_eq!(value_range(7, Signedness::Unsigned).unwrap(), 0..=0x00FF_FFFF_FFFF_FFFF);
        assert!(value_range(8, Signedness::Unsigned).is_err());
    }
}
