use anyhow::{Context, Result};
use colored::*;
use oggpage_core::{reassembler::PacketAssembler, Decoder, Encoder, PageError, PageType};
use std::collections::HashMap;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Read, Write};
use tracing::{debug, info};

/// Counters for one copy run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CopyStats {
    /// Pages decoded from the input
    pub pages_in: usize,
    /// Pages written to the output
    pub pages_out: usize,
    /// Whole packets carried over
    pub packets: usize,
    /// Distinct logical bitstreams seen
    pub streams: usize,
}

/// Copy `input` to `output`, re-framing every logical bitstream
///
/// `-` stands for stdin or stdout.
pub fn execute(input: &str, output: &str) -> Result<()> {
    info!("Copying {} to {}", input, output);

    let reader: Box<dyn Read> = if input == "-" {
        Box::new(io::stdin().lock())
    } else {
        let file =
            File::open(input).with_context(|| format!("Failed to open input file: {}", input))?;
        Box::new(BufReader::new(file))
    };

    let mut writer: Box<dyn Write> = if output == "-" {
        Box::new(io::stdout().lock())
    } else {
        let file = File::create(output)
            .with_context(|| format!("Failed to create output file: {}", output))?;
        Box::new(BufWriter::new(file))
    };

    let stats = copy_stream(reader, &mut writer)?;
    writer.flush().context("Failed to flush output")?;

    info!(
        "Copied {} packets of {} stream(s): {} pages in, {} pages out",
        stats.packets, stats.streams, stats.pages_in, stats.pages_out
    );
    if output != "-" {
        println!("{} Copied {} pages to {}", "✓".green(), stats.pages_out, output);
    }

    Ok(())
}

struct StreamCopy {
    assembler: PacketAssembler,
    encoder: Encoder<Vec<u8>>,
}

/// Decode every page from `reader` and write its completed packets back out
///
/// Packets are rebuilt per bitstream and re-encoded with the granule of the
/// page they completed on. A page starting a stream starts it again in the
/// output, and a page ending one ends it.
pub fn copy_stream<R: Read, W: Write>(reader: R, mut writer: W) -> Result<CopyStats> {
    let mut decoder = Decoder::new(reader);
    let mut streams: HashMap<u32, StreamCopy> = HashMap::new();
    let mut stats = CopyStats::default();

    loop {
        let start = decoder.position();
        let page = match decoder.decode() {
            Ok((page, _)) => page,
            Err(PageError::EndOfStream) => break,
            Err(e) => {
                return Err(e)
                    .with_context(|| format!("Failed to decode page after offset {}", start))
            }
        };
        stats.pages_in += 1;

        let serial = page.serial();
        let stream = streams.entry(serial).or_insert_with(|| StreamCopy {
            assembler: PacketAssembler::new(),
            encoder: Encoder::new(serial, Vec::new()).starting_sequence(page.sequence()),
        });

        let packets = stream.assembler.push(&page);
        if packets.is_empty() {
            debug!("Page {} of stream {:08x} completes no packet", page.sequence(), serial);
            continue;
        }

        let granule = page.granule();
        let data: Vec<_> = packets.iter().map(|p| p.data.clone()).collect();
        let mut markers = PageType::NONE;
        if packets[0].first_in_stream {
            markers |= PageType::BOS;
        }
        if page.page_type().is_eos() {
            markers |= PageType::EOS;
        }
        let pages = stream
            .encoder
            .encode_with(PageType::new(markers), granule, &data)
            .with_context(|| format!("Failed to encode packets of stream {:08x}", serial))?;

        writer
            .write_all(stream.encoder.get_ref())
            .context("Failed to write output")?;
        stream.encoder.get_mut().clear();

        stats.pages_out += pages;
        stats.packets += packets.len();
    }

    stats.streams = streams.len();
    Ok(stats)
}
