//! Packet reassembly across pages
//!
//! The decoder hands out pages with fragments; this module stitches the
//! fragments of packets that span pages back together using the COP flag and
//! the trailing 255 segment of the previous page. A continuation is only
//! accepted from the page numbered right after the one holding the start.

use crate::decoder::Decoder;
use crate::error::PageError;
use crate::types::{OwnedPage, Page, PageHeader};
use crate::Result;
use bytes::{Bytes, BytesMut};
use std::io::Read;

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// A whole packet, rebuilt from one or more pages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    /// Packet bytes
    pub data: Bytes,

    /// Serial number of the bitstream the packet belongs to
    pub serial: u32,

    /// Granule position of the page the packet ended on
    pub granule: i64,

    /// Packet started on a beginning-of-stream page, as its first packet
    pub first_in_stream: bool,

    /// Packet ended an end-of-stream page, as its last packet
    pub last_in_stream: bool,
}

#[derive(Debug)]
struct Pending {
    data: BytesMut,
    serial: u32,
    sequence: u32,
    first_in_stream: bool,
}

/// Stitches page fragments into whole packets
///
/// Feed pages in stream order. Fragments that cannot be joined (a COP page
/// with nothing pending, or a pending packet followed by a non-COP page, a
/// page of another stream or a gap in the sequence numbers) are dropped and counted in
/// [`PacketAssembler::orphaned`].
#[derive(Debug, Default)]
pub struct PacketAssembler {
    pending: Option<Pending>,
    orphaned: usize,
}

impl PacketAssembler {
    /// Create an empty assembler
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a decoded page, returning the packets it completes
    pub fn push(&mut self, page: &Page<'_>) -> Vec<Packet> {
        self.push_fragments(&page.header, page.packets(), page.is_continued())
    }

    /// Feed an owned page, returning the packets it completes
    pub fn push_owned(&mut self, page: &OwnedPage) -> Vec<Packet> {
        let fragments = page.packets.iter().map(|p| &p[..]);
        self.push_fragments(&page.header, fragments, page.continued)
    }

    /// Bytes held for a packet that continues on a page not seen yet
    pub fn pending_len(&self) -> usize {
        self.pending.as_ref().map_or(0, |p| p.data.len())
    }

    /// Number of fragments dropped because they could not be joined
    pub fn orphaned(&self) -> usize {
        self.orphaned
    }

    /// Give up on the stream, returning the unfinished packet if there is one
    pub fn finish(self) -> Option<Bytes> {
        self.pending.map(|p| p.data.freeze())
    }

    fn push_fragments<'a, I>(
        &mut self,
        header: &PageHeader,
        fragments: I,
        continued: bool,
    ) -> Vec<Packet>
    where
        I: ExactSizeIterator<Item = &'a [u8]>,
    {
        let page_type = header.page_type;
        let cop = page_type.is_continuation();

        if let Some(pending) = &self.pending {
            let next = pending.sequence.wrapping_add(1);
            if !cop || pending.serial != header.serial || header.sequence != next {
                #[cfg(feature = "logging")]
                warn!(
                    "Dropping {} byte partial packet of stream {:08x}: page {} does not continue",
                    pending.data.len(),
                    pending.serial,
                    header.sequence
                );
                self.pending = None;
                self.orphaned += 1;
            }
        }

        let count = fragments.len();
        let mut packets = Vec::with_capacity(count);

        for (i, fragment) in fragments.enumerate() {
            let last = i + 1 == count;
            let open = last && continued;

            let (data, first_in_stream) = if i == 0 && cop {
                let Some(mut pending) = self.pending.take() else {
                    #[cfg(feature = "logging")]
                    debug!(
                        "Dropping {} byte continuation fragment on page {} with no packet start",
                        fragment.len(),
                        header.sequence
                    );
                    self.orphaned += 1;
                    continue;
                };
                pending.data.extend_from_slice(fragment);
                pending.sequence = header.sequence;
                if open {
                    self.pending = Some(pending);
                    continue;
                }
                (pending.data.freeze(), pending.first_in_stream)
            } else {
                let first_in_stream = i == 0 && page_type.is_bos();
                if open {
                    self.pending = Some(Pending {
                        data: BytesMut::from(fragment),
                        serial: header.serial,
                        sequence: header.sequence,
                        first_in_stream,
                    });
                    continue;
                }
                (Bytes::copy_from_slice(fragment), first_in_stream)
            };

            packets.push(Packet {
                data,
                serial: header.serial,
                granule: header.granule,
                first_in_stream,
                last_in_stream: last && page_type.is_eos(),
            });
        }

        packets
    }
}

/// Decode every page from `reader` and return the whole packets
///
/// Stops at a clean end of stream. Any other decode error is returned; use
/// the [`scanner`](crate::scanner) for damaged input.
pub fn read_packets<R: Read>(reader: R) -> Result<Vec<Packet>> {
    let mut decoder = Decoder::new(reader);
    let mut assembler = PacketAssembler::new();
    let mut packets = Vec::new();

    loop {
        match decoder.decode() {
            Ok((page, _)) => packets.extend(assembler.push(&page)),
            Err(PageError::EndOfStream) => break,
            Err(e) => return Err(e),
        }
    }

    #[cfg(feature = "logging")]
    debug!(
        "Reassembled {} packets from {} bytes ({} orphaned fragments, {} bytes unfinished)",
        packets.len(),
        decoder.position(),
        assembler.orphaned(),
        assembler.pending_len()
    );

    Ok(packets)
}
