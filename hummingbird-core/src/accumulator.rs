//! Bit-plane packing over the 24-slot cycle.
//!
//! The projector shows 24 one-bit sub-frames per video frame: 8 bits of
//! each of the three colour channels, in the order blue, red, green
//! (channel `(slot / 8 + 2) % 3`), least significant bit first. Slot `s`
//! therefore lands in bit `s % 8` of that channel plane.
//!
//! ```text
//! slot     0 ..  7 |  8 .. 15 | 16 .. 23
//! plane        2   |     0    |     1
//! ```

use crate::frame::BinaryFrame;

/// Sub-frames packed into one macro-frame.
pub const SLOTS_PER_MACRO_FRAME: usize = 24;

/// Bits per channel plane.
const BITS_PER_CHANNEL: usize = 8;

/// Plane and bit mask receiving the sub-frame at `slot`.
pub const fn slot_target(slot: usize) -> (usize, u8) {
    let channel = (slot / BITS_PER_CHANNEL + 2) % 3;
    let mask = 1 << (slot % BITS_PER_CHANNEL);
    (channel, mask)
}

// ── ChannelPlanes ────────────────────────────────────────────────

/// Three logical-resolution byte planes of a completed cycle.
///
/// Owned by the caller once emitted; later deposits never touch it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelPlanes {
    pub width: u32,
    pub height: u32,
    pub planes: [Vec<u8>; 3],
}

impl ChannelPlanes {
    /// Bit deposited at `slot` for logical cell `(x, y)`.
    pub fn bit(&self, slot: usize, x: u32, y: u32) -> bool {
        let (channel, mask) = slot_target(slot);
        self.planes[channel][(x + y * self.width) as usize] & mask != 0
    }
}

// ── BitPlaneAccumulator ──────────────────────────────────────────

/// Stateful packer that deposits one binary sub-frame per slot.
///
/// The three plane buffers are allocated once and reused for every
/// cycle; each slot rewrites its own bit in every cell, so an emitted
/// set of planes only ever holds the 24 most recent sub-frames.
pub struct BitPlaneAccumulator {
    width: u32,
    height: u32,
    planes: [Vec<u8>; 3],
    slot: usize,
}

impl BitPlaneAccumulator {
    /// Create an accumulator for a `width × height` logical grid.
    pub fn new(width: u32, height: u32) -> Self {
        let len = width as usize * height as usize;
        Self {
            width,
            height,
            planes: [vec![0; len], vec![0; len], vec![0; len]],
            slot: 0,
        }
    }

    /// Slot the next deposit will fill.
    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Deposits made since the last emitted macro-frame.
    pub fn pending(&self) -> usize {
        self.slot
    }

    /// Forget the partial cycle and start again at slot 0.
    pub fn reset(&mut self) {
        self.slot = 0;
        for plane in &mut self.planes {
            plane.fill(0);
        }
    }

    /// Deposit `frame` into the current slot.
    ///
    /// Returns the completed planes when this deposit fills slot 23.
    ///
    /// `frame` must match the accumulator's grid; the generator checks
    /// sizes before thresholding.
    pub fn deposit(&mut self, frame: &BinaryFrame) -> Option<ChannelPlanes> {
        debug_assert_eq!((frame.width, frame.height), (self.width, self.height));
        let (channel, mask) = slot_target(self.slot);
        for (cell, &bit) in self.planes[channel].iter_mut().zip(&frame.bits) {
            *cell = (*cell & !mask) | if bit != 0 { mask } else { 0 };
        }

        if self.slot == SLOTS_PER_MACRO_FRAME - 1 {
            self.slot = 0;
            Some(ChannelPlanes {
                width: self.width,
                height: self.height,
                planes: self.planes.clone(),
            })
        } else {
            self.slot += 1;
            None
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
