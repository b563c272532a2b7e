// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use bytewise::ByteOrder;

/// A stream with a configured byte order, used by the typed helpers of
/// [`ReadExt`][crate::ReadExt], [`WriteExt`][crate::WriteExt] and their positional counterparts.
pub trait ByteOrdered {
    /// The byte order typed helpers use.
    fn byte_order(&self) -> ByteOrder;

    /// Changes the byte order typed helpers use.
    fn set_byte_order(&mut self, order: ByteOrder);
}
