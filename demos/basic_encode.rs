//! Basic encoding example

use oggpage_core::Encoder;
use std::fs::File;
use std::io::BufWriter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("oggpage Basic Encoding Example\n");

    let file = BufWriter::new(File::create("example_output.ogg")?);
    let mut encoder = Encoder::new(0x0BAD_CAFE, file);

    // Identification and comment headers each get their own page
    encoder.encode_bos(0, &[b"OpusHead\x01\x02\x38\x01\x80\xbb\x00\x00\x00\x00\x00"])?;
    encoder.encode(0, &[b"OpusTags\x07\x00\x00\x00oggpage\x00\x00\x00\x00"])?;

    // Fifty 20 ms packets, five per page
    for (i, chunk) in (0..50u8).collect::<Vec<_>>().chunks(5).enumerate() {
        let packets: Vec<Vec<u8>> = chunk.iter().map(|&n| vec![0x20, n, n, n]).collect();
        let granule = 960 * 5 * (i as i64 + 1);

        let pages = if i == 9 {
            encoder.encode_eos(granule, &packets)?
        } else {
            encoder.encode(granule, &packets)?
        };
        println!(
            "Batch {}: {} packets on {} page(s), granule {}",
            i,
            packets.len(),
            pages,
            granule
        );
    }

    let written = encoder.next_sequence();
    encoder.into_inner().into_inner()?;

    println!("\nWrote {} pages to example_output.ogg", written);
    println!("Use 'oggpage scan --input example_output.ogg' to read it back");

    Ok(())
}
