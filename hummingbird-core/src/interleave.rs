//! Payload unpacking — the player's view of a macro-frame.
//!
//! The player decodes each video frame back to raw YUV420 and
//! re-interleaves it into one RGB triplet per mirror before sending it
//! to the projector. These helpers perform the same unpacking on a raw
//! payload, which makes it possible to check a stream sub-frame by
//! sub-frame without a projector.

use crate::accumulator::slot_target;
use crate::error::HummingbirdError;
use crate::geometry::ProjectorGeometry;
use crate::stream::payload_len;

/// Convert one payload into row-major RGB triplets
/// (`physical_rows × physical_columns × 3` bytes).
///
/// Red, green and blue carry planes 0, 1 and 2.
pub fn interleave(payload: &[u8], geometry: &ProjectorGeometry) -> Result<Vec<u8>, HummingbirdError> {
    if payload.len() != payload_len(geometry) {
        return Err(HummingbirdError::InvalidFrame(format!(
            "payload is {} bytes, expected {}",
            payload.len(),
            payload_len(geometry)
        )));
    }
    let columns = geometry.physical_columns as usize;
    let mirrors = geometry.physical_len();
    let (red_green, blue) = payload.split_at(mirrors * 2);
    let (even, odd) = blue.split_at(geometry.physical_rows.div_ceil(2) as usize * columns);

    let mut rgb = Vec::with_capacity(mirrors * 3);
    for (row, pairs) in red_green.chunks_exact(columns * 2).enumerate() {
        let source = if row % 2 == 0 { even } else { odd };
        let blue_row = &source[(row / 2) * columns..(row / 2 + 1) * columns];
        for (pair, &b) in pairs.chunks_exact(2).zip(blue_row) {
            rgb.extend_from_slice(&[pair[0], pair[1], b]);
        }
    }
    Ok(rgb)
}

/// The binary image (one byte, 0 or 1, per mirror) shown at `slot`.
pub fn subframe(rgb: &[u8], slot: usize) -> Vec<u8> {
    let (channel, mask) = slot_target(slot);
    rgb.chunks_exact(3)
        .map(|pixel| (pixel[channel] & mask != 0) as u8)
        .collect()
}

// ── Tests ────────────────────────────────────────────────────────
