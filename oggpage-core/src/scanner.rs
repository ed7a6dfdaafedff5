//! Stream scanner for damaged or noisy input

use crate::constants::CAPTURE_PATTERN;
use crate::decoder::Decoder;
use crate::error::PageError;
use crate::types::OwnedPage;

#[cfg(feature = "logging")]
use tracing::{debug, warn};

/// A page found at a specific offset in the stream
#[derive(Debug, Clone)]
pub struct LocatedPage {
    /// Byte offset of the page's capture pattern
    pub offset: usize,

    /// The decoded page
    pub page: OwnedPage,

    /// Total size of the page in bytes
    pub size: usize,
}

/// Scan statistics
#[derive(Debug, Clone, Default)]
pub struct ScanStats {
    /// Total bytes scanned
    pub bytes_scanned: usize,

    /// Number of valid pages found
    pub pages_found: usize,

    /// Number of pages rejected for a bad checksum
    pub checksum_failures: usize,

    /// Number of pages rejected for an empty segment table
    pub bad_segment_tables: usize,

    /// Number of pages cut short by the end of the data or by a bad length
    pub truncated_pages: usize,

    /// Bytes skipped while looking for a capture pattern in front of valid pages
    pub bytes_skipped: usize,

    /// Total bytes recovered (sum of all valid page sizes)
    pub bytes_recovered: usize,
}

impl ScanStats {
    /// Calculate recovery rate as a percentage
    pub fn recovery_rate(&self) -> f64 {
        if self.bytes_scanned == 0 {
            0.0
        } else {
            (self.bytes_recovered as f64 / self.bytes_scanned as f64) * 100.0
        }
    }
}

/// Scan a byte stream for valid pages, even if the stream is damaged
///
/// Pages with an empty segment table are skipped and decoding resumes right
/// behind their header. A page that fails its checksum or runs past the end
/// of the data may hide the start of a real page, so the search restarts one
/// byte past its capture pattern. The scan ends when no capture pattern is
/// left.
pub fn scan_stream(data: &[u8]) -> Vec<LocatedPage> {
    scan_stream_with_stats(data).0
}

/// Scan stream with statistics
pub fn scan_stream_with_stats(data: &[u8]) -> (Vec<LocatedPage>, ScanStats) {
    let mut stats = ScanStats {
        bytes_scanned: data.len(),
        ..Default::default()
    };

    let mut results = Vec::new();
    // Offset in `data` the current decoder started reading from
    let mut base = 0usize;
    let mut decoder = Decoder::new(data);

    #[cfg(feature = "logging")]
    debug!("Starting stream scan of {} bytes", data.len());

    loop {
        let start = base + decoder.position() as usize;

        let result = decoder
            .decode()
            .map(|(page, consumed)| (page.to_owned_page(), page.encoded_len(), consumed));

        let truncated = match result {
            Ok((page, size, consumed)) => {
                let located = LocatedPage {
                    offset: start + consumed - size,
                    page,
                    size,
                };

                #[cfg(feature = "logging")]
                debug!(
                    "Decoded page {} at offset {} (size: {} bytes)",
                    located.page.header.sequence,
                    located.offset,
                    located.size
                );

                stats.bytes_skipped += consumed - size;
                stats.bytes_recovered += size;
                results.push(located);
                continue;
            }
            Err(PageError::EndOfStream) => break,
            Err(PageError::BadSegmentTable) => {
                // Only the header was consumed, so the next page is read
                // from right behind it
                stats.bad_segment_tables += 1;
                continue;
            }
            Err(PageError::ChecksumMismatch { .. }) => {
                stats.checksum_failures += 1;
                false
            }
            Err(PageError::UnexpectedEof { .. }) => true,
            Err(e) => {
                #[cfg(feature = "logging")]
                warn!("Scan stopped in page starting after offset {}: {}", start, e);
                #[cfg(not(feature = "logging"))]
                let _ = e;
                break;
            }
        };

        // The rejected page may have swallowed the start of a real one, so
        // search again from one byte past its capture pattern
        let Some(at) = memchr::memmem::find(&data[start..], CAPTURE_PATTERN) else {
            break;
        };
        if truncated {
            stats.truncated_pages += 1;
        }
        base = start + at + 1;

        #[cfg(feature = "logging")]
        debug!("Restarting scan at offset {}", base);

        decoder = Decoder::new(&data[base..]);
    }

    stats.pages_found = results.len();

    #[cfg(feature = "logging")]
    debug!(
        "Scan complete: found {} valid pages out of {} bytes scanned",
        results.len(),
        data.len()
    );

    (results, stats)
}
