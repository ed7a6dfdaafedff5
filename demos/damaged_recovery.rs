//! Example demonstrating recovery from damaged data

use oggpage_core::{reassembler::PacketAssembler, scanner::scan_stream_with_stats, Encoder};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("oggpage Damaged Data Recovery Example\n");

    // Step 1: Create a clean stream with 10 pages
    println!("Step 1: Creating 10 pages...");
    let mut encoder = Encoder::new(42, Vec::new());
    for i in 1..=10i64 {
        let payload = format!("Important data from sensor {}", i).repeat(8);
        if i == 1 {
            encoder.encode_bos(i, &[payload])?;
        } else if i == 10 {
            encoder.encode_eos(i, &[payload])?;
        } else {
            encoder.encode(i, &[payload])?;
        }
    }
    let mut stream = encoder.into_inner();
    println!("Created clean stream: {} bytes\n", stream.len());

    // Step 2: Simulate damage
    println!("Step 2: Simulating damage...");

    if stream.len() > 700 {
        stream[500..700].fill(0xFF);
        println!("Corrupted bytes 500-700");
    }

    if stream.len() > 1300 {
        stream[1200..1300].fill(0x00);
        println!("Corrupted bytes 1200-1300");
    }

    if stream.len() > 2200 {
        stream.drain(2000..2200);
        println!("Deleted bytes 2000-2200");
    }

    println!("Damaged stream: {} bytes\n", stream.len());

    // Step 3: Scan and recover
    println!("Step 3: Scanning damaged stream...");
    let (located, stats) = scan_stream_with_stats(&stream);

    println!("Scan Results:");
    println!("  Bytes scanned:       {}", stats.bytes_scanned);
    println!("  Valid pages:         {}", stats.pages_found);
    println!("  Checksum failures:   {}", stats.checksum_failures);
    println!("  Bad segment tables:  {}", stats.bad_segment_tables);
    println!("  Truncated pages:     {}", stats.truncated_pages);
    println!("  Bytes skipped:       {}", stats.bytes_skipped);
    println!("  Recovery rate:       {:.1}%\n", stats.recovery_rate());

    // Step 4: Rebuild packets
    println!("Step 4: Reassembling packets...");
    let mut assembler = PacketAssembler::new();
    let packets: Vec<_> = located
        .iter()
        .flat_map(|l| assembler.push_owned(&l.page))
        .collect();

    println!("  Orphaned fragments:  {}", assembler.orphaned());

    println!("\nRecovered packets:");
    for packet in &packets {
        let text = String::from_utf8_lossy(&packet.data[..27.min(packet.data.len())]);
        println!("  Granule {}: {}...", packet.granule, text);
    }

    println!("\nRecovered {}/{} packets despite damage", packets.len(), 10);

    Ok(())
}
