//! Page checksum
//!
//! CRC-32 with polynomial 0x04C11DB7, computed MSB-first with no reflection,
//! a zero initial register and no final XOR. This is not the reflected
//! CRC-32 used by zip or Ethernet.

const POLYNOMIAL: u32 = 0x04C1_1DB7;

static TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut i = 0;
    while i < 256 {
        let mut r = (i as u32) << 24;
        let mut bit = 0;
        while bit < 8 {
            r = if r & 0x8000_0000 != 0 {
                (r << 1) ^ POLYNOMIAL
            } else {
                r << 1
            };
            bit += 1;
        }
        table[i] = r;
        i += 1;
    }
    table
}

/// Feed `data` into a running checksum
pub fn update(mut crc: u32, data: &[u8]) -> u32 {
    for &b in data {
        crc = (crc << 8) ^ TABLE[((crc >> 24) as u8 ^ b) as usize];
    }
    crc
}

/// Compute the checksum of `data`
///
/// For a page, the caller must zero the CRC field (header bytes 22..26)
/// before calling this.
pub fn checksum(data: &[u8]) -> u32 {
    update(0, data)
}
