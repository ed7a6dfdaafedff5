//! Playback duration of an Opus packet, estimated from its TOC byte

use crate::error::DurationError;
use core::time::Duration;

/// Estimate how long `packet` plays
///
/// The upper five bits of the first byte select the frame size, the lower
/// two bits the frame count. Count code 3 reads the count from the second
/// byte.
pub fn packet_duration(packet: &[u8]) -> Result<Duration, DurationError> {
    let toc = *packet.first().ok_or(DurationError::EmptyPacket)?;

    let frame_ms: u64 = match toc >> 3 {
        0..=3 => 10,
        4..=7 => 20,
        8..=11 => 40,
        12..=15 => 60,
        _ => 20,
    };

    let frames: u64 = match toc & 0x03 {
        0 => 1,
        1 | 2 => 2,
        // The count byte stores frames minus one, so it is never below one
        _ => u64::from(*packet.get(1).ok_or(DurationError::TruncatedFrameCount)?) + 1,
    };

    Ok(Duration::from_millis(frame_ms * frames))
}
