//! Error types for page decoding and encoding

use thiserror::Error;

/// Errors that can occur while decoding or encoding pages
#[derive(Debug, Error)]
pub enum PageError {
    /// The source was exhausted before any byte of the requested read
    #[error("End of stream")]
    EndOfStream,

    /// The source ended partway through a header, segment table or payload
    #[error("Unexpected end of stream: expected {expected} bytes, got {actual}")]
    UnexpectedEof {
        /// The number of bytes requested.
        expected: usize,
        /// The number of bytes actually read.
        actual: usize,
    },

    /// The page declares an empty segment table
    #[error("invalid segment table size")]
    BadSegmentTable,

    /// The stored CRC does not match the one computed over the page
    #[error("invalid crc in page: got {found:x}, expected {expected:x}")]
    ChecksumMismatch {
        /// The checksum stored in the page header.
        found: u32,
        /// The checksum calculated by the decoder.
        expected: u32,
    },

    /// The encoder was handed a batch without packets
    #[error("Cannot encode an empty packet batch")]
    EmptyBatch,

    /// IO error from the underlying reader or writer
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl PageError {
    /// True for a clean end of stream, the normal end of a decode loop
    pub fn is_end_of_stream(&self) -> bool {
        matches!(self, PageError::EndOfStream)
    }

    /// True when the decoder has already skipped the offending page and the
    /// caller can simply decode again
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            PageError::BadSegmentTable | PageError::ChecksumMismatch { .. }
        )
    }
}

/// Errors from estimating a packet's playback duration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DurationError {
    /// No control byte to read
    #[error("empty opus packet")]
    EmptyPacket,

    /// Frame count code 3 without the frame count byte
    #[error("invalid opus packet: frame count code 3 but packet is too short")]
    TruncatedFrameCount,

    /// Frame count code 3 decoding to fewer than one frame. Not produced by
    /// [`packet_duration`](crate::duration::packet_duration), whose count
    /// byte always yields at least one frame.
    #[error("invalid opus packet: frame count code 3 but frame count is less than 1")]
    InvalidFrameCount,
}
