// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// The order in which the bytes of a multi-byte integer are laid out.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq)]
pub enum ByteOrder {
    /// The least significant byte comes first.
    #[default]
    LittleEndian,

    /// The most significant byte comes first.
    BigEndian,
}

impl ByteOrder {
    /// The byte order of the target platform.
    #[must_use]
    pub const fn native() -> Self {
        if cfg!(target_endian = "big") {
            Self::BigEndian
        } else {
            Self::LittleEndian
        }
    }
}

/// Whether an integer is interpreted as signed (two's complement) or unsigned.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Signedness {
    /// Two's complement; decoding sign-extends from the most significant bit.
    Signed,

    /// Decoding zero-extends.
    Unsigned,
}
