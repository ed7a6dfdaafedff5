//! Page decoding with stream resynchronization

use crate::constants::{CAPTURE_PATTERN, CHECKSUM_RANGE, HEADER_SIZE, MAX_PAGE_SIZE, MAX_SEGMENTS};
use crate::crc;
use crate::error::PageError;
use crate::types::{packet_lengths, Page, PageHeader};
use crate::Result;
use core::ops::Range;
use std::io::{ErrorKind, Read};

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// Decodes a byte stream page by page
///
/// The decoder owns a buffer large enough for the biggest possible page and
/// reuses it on every call, so a returned [`Page`] borrows the decoder and
/// must be dropped (or copied with [`Page::to_owned_page`]) before the next
/// call to [`Decoder::decode`].
///
/// Decoding does not stitch continued packets across pages; see
/// [`PacketAssembler`](crate::reassembler::PacketAssembler) for that.
pub struct Decoder<R> {
    reader: R,
    buf: Box<[u8]>,
    lens: Vec<usize>,
    last_consumed: usize,
    position: u64,
}

impl<R: Read> Decoder<R> {
    /// Create a decoder reading from `reader`
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            buf: vec![0u8; MAX_PAGE_SIZE].into_boxed_slice(),
            lens: Vec::with_capacity(MAX_SEGMENTS),
            last_consumed: 0,
            position: 0,
        }
    }

    /// Read up to and including the next page
    ///
    /// Any bytes in front of the capture pattern are skipped. On success the
    /// page is returned together with the number of bytes consumed by this
    /// call, skipped bytes included.
    ///
    /// Errors:
    /// - [`PageError::EndOfStream`] if a read found no bytes at all
    /// - [`PageError::UnexpectedEof`] if a read stopped partway
    /// - [`PageError::BadSegmentTable`] if the page declares zero segments
    /// - [`PageError::ChecksumMismatch`] if the CRC does not match
    ///
    /// The decoder stays usable after every error. After a bad segment table
    /// or checksum the offending bytes have been consumed, so calling
    /// `decode` again moves on to the next page.
    pub fn decode(&mut self) -> Result<(Page<'_>, usize)> {
        self.last_consumed = 0;
        let result = self.read_page();
        self.position += self.last_consumed as u64;
        let (header, payload_len, continued) = result?;

        let payload_start = HEADER_SIZE + header.segment_count as usize;
        let payload = &self.buf[payload_start..payload_start + payload_len];
        Ok((
            Page::new(header, payload, &self.lens, continued),
            self.last_consumed,
        ))
    }

    /// Bytes consumed by the most recent call to [`Decoder::decode`],
    /// whether it succeeded or not
    pub fn last_consumed(&self) -> usize {
        self.last_consumed
    }

    /// Total bytes consumed from the reader so far
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Get a reference to the underlying reader
    pub fn get_ref(&self) -> &R {
        &self.reader
    }

    /// Get a mutable reference to the underlying reader
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Unwrap the underlying reader
    pub fn into_inner(self) -> R {
        self.reader
    }

    fn read_page(&mut self) -> Result<(PageHeader, usize, bool)> {
        self.sync()?;

        let mut window = [0u8; HEADER_SIZE];
        window.copy_from_slice(&self.buf[..HEADER_SIZE]);
        let header = PageHeader::parse(&window);

        if header.segment_count == 0 {
            #[cfg(feature = "logging")]
            warn!(
                "Empty segment table in page at offset {}",
                self.page_offset()
            );
            return Err(PageError::BadSegmentTable);
        }

        // Segment table first, so the payload can be read in one go
        let table_end = HEADER_SIZE + header.segment_count as usize;
        self.fill(HEADER_SIZE..table_end)?;

        self.lens.clear();
        let (payload_len, continued) =
            packet_lengths(&self.buf[HEADER_SIZE..table_end], &mut self.lens);

        let page_end = table_end + payload_len;
        self.fill(table_end..page_end)?;

        let page = &mut self.buf[..page_end];
        page[CHECKSUM_RANGE].fill(0);
        let expected = crc::checksum(page);
        if expected != header.checksum {
            #[cfg(feature = "logging")]
            warn!(
                "Checksum mismatch in page {} at offset {}: got {:x}, expected {:x}",
                header.sequence,
                self.page_offset(),
                header.checksum,
                expected
            );
            return Err(PageError::ChecksumMismatch {
                found: header.checksum,
                expected,
            });
        }

        Ok((header, payload_len, continued))
    }

    /// Slide a header-sized window over the stream until it starts with the
    /// capture pattern
    fn sync(&mut self) -> Result<()> {
        let mut filled = 0;
        let mut skipped = 0usize;

        loop {
            self.fill(filled..HEADER_SIZE)?;

            let window = &self.buf[..HEADER_SIZE];
            let start = memchr::memmem::find(window, CAPTURE_PATTERN)
                .or_else(|| partial_pattern_start(window));

            match start {
                Some(0) => break,
                Some(at) => {
                    self.buf.copy_within(at..HEADER_SIZE, 0);
                    filled = HEADER_SIZE - at;
                    skipped += at;
                }
                None => {
                    filled = 0;
                    skipped += HEADER_SIZE;
                }
            }
        }

        #[cfg(feature = "logging")]
        {
            if skipped > 0 {
                debug!(
                    "Skipped {} bytes before capture pattern at offset {}",
                    skipped,
                    self.page_offset()
                );
            }
        }
        #[cfg(not(feature = "logging"))]
        let _ = skipped;

        Ok(())
    }

    /// Fill `self.buf[range]` from the reader
    fn fill(&mut self, range: Range<usize>) -> Result<()> {
        let expected = range.len();
        let buf = &mut self.buf[range];
        let mut read = 0;

        while read < expected {
            match self.reader.read(&mut buf[read..]) {
                Ok(0) => break,
                Ok(n) => read += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    self.last_consumed += read;
                    return Err(e.into());
                }
            }
        }

        self.last_consumed += read;
        match read {
            n if n == expected => Ok(()),
            0 => Err(PageError::EndOfStream),
            actual => Err(PageError::UnexpectedEof { expected, actual }),
        }
    }

    /// Stream offset of the capture pattern of the page being read
    #[cfg(feature = "logging")]
    fn page_offset(&self) -> u64 {
        (self.position + self.last_consumed as u64).saturating_sub(HEADER_SIZE as u64)
    }
}

/// Start of a proper prefix of the capture pattern ("O", "Og", "Ogg") that
/// runs up to the end of `window`
fn partial_pattern_start(window: &[u8]) -> Option<usize> {
    (1..CAPTURE_PATTERN.len())
        .rev()
        .find(|&len| window.ends_with(&CAPTURE_PATTERN[..len]))
        .map(|len| window.len() - len)
}
