// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use bytewise::Result;

/// A stream that holds resources until it is explicitly closed.
///
/// Closing is idempotent. Once closed, every other operation on the stream fails with
/// [`ErrorKind::ClosedResource`][bytewise::ErrorKind::ClosedResource].
pub trait Close {
    /// Releases the resources held by the stream.
    ///
    /// Wrappers configured to own their underlying streams close those as well.
    ///
    /// # Errors
    ///
    /// Fails if pending data cannot be written or an underlying stream fails to close. The
    /// stream counts as closed either way.
    fn close(&mut self) -> Result<()>;
}
