use super::read_input;
use anyhow::{Context, Result};
use colored::*;
use oggpage_core::{duration::packet_duration, reassembler::read_packets};
use std::io::Cursor;
use std::time::Duration;
use tracing::{info, warn};

/// Result of summing packet durations
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DurationReport {
    /// Packets read from the input
    pub packets: usize,
    /// Leading packets left out of the sum
    pub skipped: usize,
    /// Packets whose duration could not be determined
    pub invalid: usize,
    /// Summed playback duration
    pub total: Duration,
}

pub fn execute(input: &str, skip: usize) -> Result<()> {
    info!("Measuring duration of: {}", input);

    let data = read_input(input)?;
    let report = measure(&data, skip)?;

    println!("\n=== Duration ===");
    println!("Packets:            {}", report.packets);
    println!("Header packets:     {}", report.skipped);
    if report.invalid > 0 {
        println!("Invalid packets:    {}", report.invalid.to_string().red());
    } else {
        println!("Invalid packets:    {}", report.invalid);
    }
    println!(
        "{} Total duration:   {:.3}s",
        "✓".green(),
        report.total.as_secs_f64()
    );

    Ok(())
}

/// Reassemble the packets of `data` and sum their durations, leaving out
/// the first `skip` packets
pub fn measure(data: &[u8], skip: usize) -> Result<DurationReport> {
    let packets = read_packets(Cursor::new(data)).context("Failed to read packets")?;

    let mut report = DurationReport {
        packets: packets.len(),
        skipped: skip.min(packets.len()),
        ..Default::default()
    };

    for (i, packet) in packets.iter().enumerate().skip(skip) {
        match packet_duration(&packet.data) {
            Ok(d) => report.total += d,
            Err(e) => {
                warn!("Packet {} (granule {}): {}", i, packet.granule, e);
                report.invalid += 1;
            }
        }
    }

    Ok(report)
}
