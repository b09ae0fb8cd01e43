//! Photodiode synchronization codes.
//!
//! Each emitted macro-frame may carry one byte of a caller-supplied
//! sequence, stamped into a staircase in the top-right corner of the
//! mirror array. A photodiode taped over that corner reads the code and
//! lets recordings be aligned to macro-frames after the fact.
//!
//! Staircase for `corner_size = 2` (`#` = stamped):
//!
//! ```text
//! row 0   ..###
//! row 1   ...##
//! row 2   ...##
//! row 3   ....#
//! ```

use serde::{Deserialize, Serialize};

use crate::error::HummingbirdError;
use crate::geometry::ProjectorGeometry;

/// Default staircase size in mirrors.
pub const DEFAULT_CORNER_SIZE: u32 = 10;

// ── SyncMode ─────────────────────────────────────────────────────

/// How many sequence values a macro-frame consumes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SyncMode {
    /// One value per macro-frame, stamped into all three planes.
    #[default]
    PerMacroFrame,
    /// One value per plane, consumed in plane order (up to three per
    /// macro-frame). Each value then drives the 8 sub-frames of a channel.
    PerChannel,
}

// ── Stamping ─────────────────────────────────────────────────────

/// Overwrite the corner staircase of one physical plane with `value`.
///
/// Rows `y` in `[0, 2 * corner_size)` are filled from column
/// `columns - (corner_size + 1 - (y + 1) / 2)` to the right edge.
pub fn stamp(plane: &mut [u8], geometry: &ProjectorGeometry, corner_size: u32, value: u8) {
    let columns = geometry.physical_columns as usize;
    for y in 0..(corner_size as usize * 2) {
        let width = corner_size as usize + 1 - (y + 1) / 2;
        let row = y * columns;
        plane[row + columns - width..row + columns].fill(value);
    }
}

/// Check that a staircase of `corner_size` fits on the mirror array.
pub fn validate_corner(geometry: &ProjectorGeometry, corner_size: u32) -> Result<(), HummingbirdError> {
    if corner_size as u64 * 2 > geometry.physical_rows as u64
        || corner_size as u64 + 1 > geometry.physical_columns as u64
    {
        return Err(HummingbirdError::Configuration(format!(
            "corner size {corner_size} does not fit a {}x{} mirror array",
            geometry.physical_columns, geometry.physical_rows
        )));
    }
    Ok(())
}

// ── SyncPattern ──────────────────────────────────────────────────

/// Synchronization sequence with a forward-only cursor.
#[derive(Debug, Clone)]
pub struct SyncPattern {
    values: Vec<u8>,
    cursor: usize,
    corner_size: u32,
    mode: SyncMode,
}

impl SyncPattern {
    pub fn new(values: Vec<u8>, corner_size: u32, mode: SyncMode) -> Self {
        Self {
            values,
            cursor: 0,
            corner_size,
            mode,
        }
    }

    /// Values not yet stamped.
    pub fn remaining(&self) -> usize {
        self.values.len() - self.cursor
    }

    /// Index of the next value to be stamped.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Stamp the physical planes of one macro-frame without moving the
    /// cursor. Returns how many values were used; pass that to
    /// [`advance`](Self::advance) once the frame has been emitted.
    pub fn stamp_planes(&self, planes: &mut [Vec<u8>; 3], geometry: &ProjectorGeometry) -> usize {
        match self.mode {
            SyncMode::PerMacroFrame => match self.values.get(self.cursor) {
                Some(&value) => {
                    for plane in planes.iter_mut() {
                        stamp(plane, geometry, self.corner_size, value);
                    }
                    1
                }
                None => 0,
            },
            SyncMode::PerChannel => {
                let pending = &self.values[self.cursor..];
                for (plane, &value) in planes.iter_mut().zip(pending) {
                    stamp(plane, geometry, self.corner_size, value);
                }
                pending.len().min(planes.len())
            }
        }
    }

    /// Commit `used` stamped values.
    pub fn advance(&mut self, used: usize) {
        self.cursor = (self.cursor + used).min(self.values.len());
    }

    /// Stamp one macro-frame and advance the cursor past the values used.
    /// Once the sequence is exhausted the planes are untouched.
    pub fn apply(&mut self, planes: &mut [Vec<u8>; 3], geometry: &ProjectorGeometry) {
        let used = self.stamp_planes(planes, geometry);
        self.advance(used);
    }
}

// ── Tests ────────────────────────────────────────────────────────
