use super::read_input;
use anyhow::{Context, Result};
use oggpage_core::scanner::scan_stream_with_stats;
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::info;

/// Metadata of one recovered page, as written to the JSON report
#[derive(Debug, Serialize, Deserialize)]
pub struct RecoveredPage {
    /// Byte offset of the capture pattern
    pub offset: usize,
    /// Bitstream serial number
    pub serial: u32,
    /// Page sequence number
    pub sequence: u32,
    /// Granule position
    pub granule: i64,
    /// Raw header type byte
    pub page_type: u8,
    /// Encoded page size in bytes
    pub size: usize,
    /// Number of packet fragments on the page
    pub packets: usize,
    /// Last fragment continues on the next page
    pub continued: bool,
    /// First bytes of the first fragment, hex encoded
    pub head: String,
}

pub fn execute(input: &str, output: Option<&str>, stats_only: bool) -> Result<()> {
    info!("Scanning file: {}", input);

    let data = read_input(input)?;

    info!("File size: {} bytes", data.len());

    let (located_pages, stats) = scan_stream_with_stats(&data);

    println!("\n=== Scan Results ===");
    println!("Bytes scanned:      {} bytes", stats.bytes_scanned);
    println!("Valid pages:        {}", stats.pages_found);
    println!("Checksum failures:  {}", stats.checksum_failures);
    println!("Bad segment tables: {}", stats.bad_segment_tables);
    println!("Truncated pages:    {}", stats.truncated_pages);
    println!("Bytes skipped:      {} bytes", stats.bytes_skipped);
    println!("Bytes recovered:    {} bytes", stats.bytes_recovered);
    println!("Recovery rate:      {:.2}%", stats.recovery_rate());
    println!();

    if stats_only {
        return Ok(());
    }

    let recovered: Vec<RecoveredPage> = located_pages
        .iter()
        .map(|lp| {
            let head = lp
                .page
                .packets
                .first()
                .map(|p| hex::encode(&p[..p.len().min(8)]))
                .unwrap_or_default();
            RecoveredPage {
                offset: lp.offset,
                serial: lp.page.header.serial,
                sequence: lp.page.header.sequence,
                granule: lp.page.header.granule,
                page_type: lp.page.page_type().as_u8(),
                size: lp.size,
                packets: lp.page.packets.len(),
                continued: lp.page.continued,
                head,
            }
        })
        .collect();

    if let Some(output_path) = output {
        let json = serde_json::to_string_pretty(&recovered)
            .with_context(|| "Failed to serialize recovered pages")?;

        fs::write(output_path, json)
            .with_context(|| format!("Failed to write output file: {}", output_path))?;

        info!("Recovered pages written to: {}", output_path);
    } else {
        println!("=== Recovered Pages ===");
        for page in &recovered {
            println!(
                "Page {} of stream {:08x} @ offset {}: {} bytes, {} packet(s), granule {}",
                page.sequence, page.serial, page.offset, page.size, page.packets, page.granule
            );
        }
    }

    Ok(())
}
