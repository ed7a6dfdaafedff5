//! Page encoding

use crate::constants::{
    PageType, CHECKSUM_RANGE, MAX_PAGE_SIZE, MAX_PAYLOAD_SIZE, MAX_SEGMENTS, MAX_SEGMENT_SIZE,
};
use crate::crc;
use crate::error::PageError;
use crate::types::PageHeader;
use crate::Result;
use bytes::{BufMut, BytesMut};
use std::io::Write;

#[cfg(feature = "logging")]
use tracing::trace;

/// Frames packets into pages for one logical bitstream
///
/// Each `encode*` call writes its packets, in order, as one or more pages
/// sharing the call's granule position. A packet that does not fit on the
/// current page is split, and the pages holding the rest of it are marked
/// [`PageType::COP`].
///
/// Every page is written to the sink as soon as it is complete. If the sink
/// fails, pages already written stay written and the page under
/// construction is dropped.
pub struct Encoder<W> {
    serial: u32,
    sequence: u32,
    sink: W,
    segments: Vec<u8>,
    body: BytesMut,
    page: BytesMut,
}

impl<W: Write> Encoder<W> {
    /// Create an encoder for the bitstream `serial`, writing to `sink`
    pub fn new(serial: u32, sink: W) -> Self {
        Self {
            serial,
            sequence: 0,
            sink,
            segments: Vec::with_capacity(MAX_SEGMENTS),
            body: BytesMut::with_capacity(MAX_PAYLOAD_SIZE),
            page: BytesMut::with_capacity(MAX_PAGE_SIZE),
        }
    }

    /// Number the next page `sequence` instead of 0
    pub fn starting_sequence(mut self, sequence: u32) -> Self {
        self.sequence = sequence;
        self
    }

    /// Encode `packets` with the first page marked beginning of stream
    pub fn encode_bos<P: AsRef<[u8]>>(&mut self, granule: i64, packets: &[P]) -> Result<usize> {
        self.encode_with(PageType::new(PageType::BOS), granule, packets)
    }

    /// Encode `packets` with no stream markers
    pub fn encode<P: AsRef<[u8]>>(&mut self, granule: i64, packets: &[P]) -> Result<usize> {
        self.encode_with(PageType::new(PageType::NONE), granule, packets)
    }

    /// Encode `packets` with the last page marked end of stream
    pub fn encode_eos<P: AsRef<[u8]>>(&mut self, granule: i64, packets: &[P]) -> Result<usize> {
        self.encode_with(PageType::new(PageType::EOS), granule, packets)
    }

    /// Encode `packets` with the stream markers set in `markers`
    ///
    /// BOS goes on the first page written and EOS on the last, so a single
    /// page can carry both. COP is set by the encoder itself and ignored
    /// here.
    pub fn encode_with<P: AsRef<[u8]>>(
        &mut self,
        markers: PageType,
        granule: i64,
        packets: &[P],
    ) -> Result<usize> {
        self.write_packets(markers.as_u8(), granule, packets)
    }

    /// Bitstream serial number
    pub fn serial(&self) -> u32 {
        self.serial
    }

    /// Sequence number the next page will carry
    pub fn next_sequence(&self) -> u32 {
        self.sequence
    }

    /// Get a reference to the underlying sink
    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    /// Get a mutable reference to the underlying sink
    pub fn get_mut(&mut self) -> &mut W {
        &mut self.sink
    }

    /// Unwrap the underlying sink
    pub fn into_inner(self) -> W {
        self.sink
    }

    /// Pack packets into pages and write them, returning the page count
    fn write_packets<P: AsRef<[u8]>>(
        &mut self,
        kind: u8,
        granule: i64,
        packets: &[P],
    ) -> Result<usize> {
        if packets.is_empty() {
            return Err(PageError::EmptyBatch);
        }

        self.segments.clear();
        self.body.clear();

        let mut page_type = kind & PageType::BOS;
        let mut pages = 0;

        for packet in packets {
            let mut rest = packet.as_ref();

            loop {
                let free = MAX_SEGMENTS - self.segments.len();
                // Whole segments plus the terminating short (possibly empty) one
                let needed = rest.len() / MAX_SEGMENT_SIZE + 1;

                if needed <= free {
                    self.push_segments(rest.len() / MAX_SEGMENT_SIZE);
                    self.segments.push((rest.len() % MAX_SEGMENT_SIZE) as u8);
                    self.body.put_slice(rest);
                    break;
                }

                if free == 0 {
                    // The previous packet ended exactly at the end of the table
                    self.flush(page_type, granule)?;
                    page_type = PageType::NONE;
                    pages += 1;
                    continue;
                }

                let (head, tail) = rest.split_at(free * MAX_SEGMENT_SIZE);
                self.push_segments(free);
                self.body.put_slice(head);
                self.flush(page_type, granule)?;
                page_type = PageType::COP;
                pages += 1;
                rest = tail;
            }
        }

        self.flush(page_type | (kind & PageType::EOS), granule)?;
        Ok(pages + 1)
    }

    fn push_segments(&mut self, count: usize) {
        self.segments
            .extend(core::iter::repeat(MAX_SEGMENT_SIZE as u8).take(count));
    }

    /// Write the page under construction and start a new one
    fn flush(&mut self, page_type: u8, granule: i64) -> Result<()> {
        let header = PageHeader::with_zero_checksum(
            page_type,
            granule,
            self.serial,
            self.sequence,
            self.segments.len() as u8,
        );

        self.page.clear();
        header.put(&mut self.page);
        self.page.put_slice(&self.segments);
        self.page.put_slice(&self.body);

        let checksum = crc::checksum(&self.page);
        self.page[CHECKSUM_RANGE].copy_from_slice(&checksum.to_le_bytes());

        self.segments.clear();
        self.body.clear();

        #[cfg(feature = "logging")]
        trace!(
            "Writing page {} of stream {:08x}: type {:#04x}, {} bytes",
            self.sequence,
            self.serial,
            page_type,
            self.page.len()
        );

        self.sink.write_all(&self.page)?;
        self.sequence = self.sequence.wrapping_add(1);
        Ok(())
    }
}
