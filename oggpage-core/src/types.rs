//! Core types for Ogg pages

use crate::constants::{PageType, CAPTURE_PATTERN, HEADER_SIZE, MAX_SEGMENT_SIZE, STREAM_VERSION};
use bytes::{BufMut, Bytes};
use serde::{Deserialize, Serialize};

/// Fixed 27-byte page header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageHeader {
    /// Stream structure version
    pub version: u8,

    /// COP/BOS/EOS bitmask
    pub page_type: PageType,

    /// Codec-defined position
    pub granule: i64,

    /// Logical bitstream serial number
    pub serial: u32,

    /// Page sequence number
    pub sequence: u32,

    /// CRC as stored in the header
    pub checksum: u32,

    /// Number of segment table entries
    pub segment_count: u8,
}

impl PageHeader {
    /// Parse the header fields from a window that starts with the capture pattern
    pub fn parse(buf: &[u8; HEADER_SIZE]) -> Self {
        let le32 = |at: usize| u32::from_le_bytes([buf[at], buf[at + 1], buf[at + 2], buf[at + 3]]);
        let mut granule = [0u8; 8];
        granule.copy_from_slice(&buf[6..14]);

        Self {
            version: buf[4],
            page_type: PageType::new(buf[5]),
            granule: i64::from_le_bytes(granule),
            serial: le32(14),
            sequence: le32(18),
            checksum: le32(22),
            segment_count: buf[26],
        }
    }

    /// Write the header, capture pattern included, in wire order
    pub fn put<B: BufMut>(&self, buf: &mut B) {
        buf.put_slice(CAPTURE_PATTERN);
        buf.put_u8(self.version);
        buf.put_u8(self.page_type.as_u8());
        buf.put_i64_le(self.granule);
        buf.put_u32_le(self.serial);
        buf.put_u32_le(self.sequence);
        buf.put_u32_le(self.checksum);
        buf.put_u8(self.segment_count);
    }

    /// Header for a page about to be checksummed
    pub(crate) fn with_zero_checksum(
        page_type: u8,
        granule: i64,
        serial: u32,
        sequence: u32,
        segment_count: u8,
    ) -> Self {
        Self {
            version: STREAM_VERSION,
            page_type: PageType::new(page_type),
            granule,
            serial,
            sequence,
            checksum: 0,
            segment_count,
        }
    }
}

/// A decoded page borrowing the decoder's buffers
///
/// The packet views are only valid until the next call to
/// [`Decoder::decode`](crate::decoder::Decoder::decode); use
/// [`Page::to_owned_page`] to keep one around.
#[derive(Debug, Clone, Copy)]
pub struct Page<'a> {
    /// Page header, checksum field as stored
    pub header: PageHeader,
    payload: &'a [u8],
    lens: &'a [usize],
    continued: bool,
}

impl<'a> Page<'a> {
    pub(crate) fn new(
        header: PageHeader,
        payload: &'a [u8],
        lens: &'a [usize],
        continued: bool,
    ) -> Self {
        Self {
            header,
            payload,
            lens,
            continued,
        }
    }

    /// COP/BOS/EOS bitmask
    pub fn page_type(&self) -> PageType {
        self.header.page_type
    }

    /// Logical bitstream serial number
    pub fn serial(&self) -> u32 {
        self.header.serial
    }

    /// Codec-defined granule position
    pub fn granule(&self) -> i64 {
        self.header.granule
    }

    /// Page sequence number. Not checked for ordering.
    pub fn sequence(&self) -> u32 {
        self.header.sequence
    }

    /// Whole payload, all packets back to back
    pub fn payload(&self) -> &'a [u8] {
        self.payload
    }

    /// Number of packets (or fragments) on this page
    pub fn packet_count(&self) -> usize {
        self.lens.len()
    }

    /// The `index`th packet on this page
    pub fn packet(&self, index: usize) -> Option<&'a [u8]> {
        let len = *self.lens.get(index)?;
        let start: usize = self.lens[..index].iter().sum();
        Some(&self.payload[start..start + len])
    }

    /// Packets in stream order. If the page type has COP set, the first one
    /// continues the previous page's last packet.
    pub fn packets(&self) -> Packets<'a> {
        Packets {
            payload: self.payload,
            lens: self.lens.iter(),
        }
    }

    /// True if the last packet continues on the next page
    pub fn is_continued(&self) -> bool {
        self.continued
    }

    /// Size of the page on the wire
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.header.segment_count as usize + self.payload.len()
    }

    /// Copy the page out of the decoder's buffers
    pub fn to_owned_page(&self) -> OwnedPage {
        let payload = Bytes::copy_from_slice(self.payload);
        let mut packets = Vec::with_capacity(self.lens.len());
        let mut start = 0;
        for &len in self.lens {
            packets.push(payload.slice(start..start + len));
            start += len;
        }

        OwnedPage {
            header: self.header,
            packets,
            continued: self.continued,
        }
    }
}

/// Iterator over the packets of a [`Page`]
#[derive(Debug, Clone)]
pub struct Packets<'a> {
    payload: &'a [u8],
    lens: core::slice::Iter<'a, usize>,
}

impl<'a> Iterator for Packets<'a> {
    type Item = &'a [u8];

    fn next(&mut self) -> Option<Self::Item> {
        let len = *self.lens.next()?;
        let (packet, rest) = self.payload.split_at(len);
        self.payload = rest;
        Some(packet)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.lens.size_hint()
    }
}

impl ExactSizeIterator for Packets<'_> {}

/// A page that owns its packets
///
/// All packets share one reference-counted payload buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct OwnedPage {
    /// Page header, checksum field as stored
    pub header: PageHeader,

    /// Packets (or fragments) in stream order
    pub packets: Vec<Bytes>,

    /// True if the last packet continues on the next page
    pub continued: bool,
}

impl OwnedPage {
    /// COP/BOS/EOS bitmask
    pub fn page_type(&self) -> PageType {
        self.header.page_type
    }

    /// Payload length summed over all packets
    pub fn payload_len(&self) -> usize {
        self.packets.iter().map(Bytes::len).sum()
    }

    /// Size of the page on the wire
    pub fn encoded_len(&self) -> usize {
        HEADER_SIZE + self.header.segment_count as usize + self.payload_len()
    }
}

/// Split a segment table into packet lengths
///
/// Appends one length per packet to `lens` and returns the total payload
/// length plus whether the last packet runs on past the end of the table.
pub fn packet_lengths(segments: &[u8], lens: &mut Vec<usize>) -> (usize, bool) {
    let mut total = 0;
    let mut more = false;
    for &seg in segments {
        let seg = seg as usize;
        if more {
            if let Some(last) = lens.last_mut() {
                *last += seg;
            }
        } else {
            lens.push(seg);
        }
        more = seg == MAX_SEGMENT_SIZE;
        total += seg;
    }
    (total, more)
}
