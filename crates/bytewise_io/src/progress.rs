// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

/// The outcome of a raw sequential or positional transfer.
///
/// Raw transfers ([`Read::read_some()`][crate::Read::read_some],
/// [`Write::write_some()`][crate::Write::write_some] and their positional counterparts) never
/// signal the end of a stream as an error. They report [`Progress::End`] instead, leaving
/// [`ErrorKind::EndOfStream`][bytewise::ErrorKind::EndOfStream] to the exact ("fully") operations.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Progress {
    /// This many bytes were transferred.
    ///
    /// Zero is only reported when the caller's region had no remaining bytes to transfer.
    Bytes(usize),

    /// No bytes can be transferred because the stream has ended or its capacity is exhausted.
    End,
}

impl Progress {
    /// The number of bytes transferred, treating [`Progress::End`] as zero.
    #[must_use]
    pub fn bytes(self) -> usize {
        match self {
            Self::Bytes(count) => count,
            Self::End => 0,
        }
    }

    /// Whether the transfer hit the end of the stream.
    #[must_use]
    pub fn is_end(self) -> bool {
        matches!(self, Self::End)
    }

    /// Whether the transfer moved no bytes, either because it hit the end or because there was nothing to move.
    pub(crate) fn is_stalled(self) -> bool {
        self.bytes() == 0
    }
}
