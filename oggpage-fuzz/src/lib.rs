//! Fuzzing entry points for oggpage-core
//!
//! To use with cargo-fuzz:
//! 1. Install cargo-fuzz: cargo install cargo-fuzz
//! 2. Run fuzzer: cargo fuzz run fuzz_decode

use oggpage_core::{reassembler::PacketAssembler, scanner::scan_stream, Decoder};

pub fn fuzz_decode(data: &[u8]) {
    let mut decoder = Decoder::new(data);
    let mut assembler = PacketAssembler::new();

    // Decode until the first unrecoverable error - should never panic
    loop {
        match decoder.decode() {
            Ok((page, _)) => {
                let _ = assembler.push(&page);
            }
            Err(e) if e.is_recoverable() => continue,
            Err(_) => break,
        }
    }

    assert!(decoder.position() <= data.len() as u64);
}

pub fn fuzz_scan(data: &[u8]) {
    // Try to scan - should never panic
    let pages = scan_stream(data);

    for located in &pages {
        assert!(located.offset + located.size <= data.len());
    }
}
