//! Constants and limits for the Ogg page format

use serde::{Deserialize, Serialize};

/// Capture pattern - 4 bytes at the start of every page
pub const CAPTURE_PATTERN: &[u8; 4] = b"OggS";

/// Stream structure version; always 0
pub const STREAM_VERSION: u8 = 0;

/// Fixed page header size, up to and including the segment count byte
///
/// 4 (capture) + 1 (version) + 1 (type) + 8 (granule) + 4 (serial)
/// + 4 (sequence) + 4 (crc) + 1 (nsegs) = 27 bytes
pub const HEADER_SIZE: usize = 27;

/// Largest value a single segment can hold. A segment of this size means the
/// packet continues in the next segment.
pub const MAX_SEGMENT_SIZE: usize = 255;

/// Largest number of entries in a segment table
pub const MAX_SEGMENTS: usize = 255;

/// Largest payload a single page can carry (255 segments of 255 bytes)
pub const MAX_PAYLOAD_SIZE: usize = MAX_SEGMENTS * MAX_SEGMENT_SIZE;

/// Largest possible encoded page: header + full segment table + full payload
pub const MAX_PAGE_SIZE: usize = HEADER_SIZE + MAX_SEGMENTS + MAX_PAYLOAD_SIZE;

/// Byte offset of the CRC field inside the header
pub const CHECKSUM_OFFSET: usize = 22;

/// Byte range of the CRC field inside the header
pub const CHECKSUM_RANGE: core::ops::Range<usize> = CHECKSUM_OFFSET..CHECKSUM_OFFSET + 4;

/// Byte offset of the segment count inside the header
pub const SEGMENT_COUNT_OFFSET: usize = 26;

/// Header type bitmask (stored as a single byte)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct PageType(u8);

impl PageType {
    /// No flags set: a fresh page that starts with a new packet
    pub const NONE: u8 = 0b0000_0000;

    /// Continuation of packet: the first packet continues the previous page's last packet
    pub const COP: u8 = 0b0000_0001;

    /// Beginning of stream: first page of a logical bitstream
    pub const BOS: u8 = 0b0000_0010;

    /// End of stream: last page of a logical bitstream
    pub const EOS: u8 = 0b0000_0100;

    /// Create a page type from the raw header byte
    pub const fn new(bits: u8) -> Self {
        Self(bits)
    }

    /// Get the raw header byte
    pub const fn as_u8(&self) -> u8 {
        self.0
    }

    /// Check if every bit of `flag` is set
    pub const fn contains(&self, flag: u8) -> bool {
        (self.0 & flag) == flag
    }

    /// Check if the first packet is a continuation
    pub const fn is_continuation(&self) -> bool {
        (self.0 & Self::COP) != 0
    }

    /// Check if this is the first page of the stream
    pub const fn is_bos(&self) -> bool {
        (self.0 & Self::BOS) != 0
    }

    /// Check if this is the last page of the stream
    pub const fn is_eos(&self) -> bool {
        (self.0 & Self::EOS) != 0
    }
}

impl From<u8> for PageType {
    fn from(bits: u8) -> Self {
        Self(bits)
    }
}

impl From<PageType> for u8 {
    fn from(page_type: PageType) -> Self {
        page_type.0
    }
}
