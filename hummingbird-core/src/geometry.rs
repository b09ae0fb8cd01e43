//! Projector geometry and the diamond remap.
//!
//! The DLP mirror array is physically rotated by 45°, so a rectangular
//! stimulus grid lands on it as a diamond. [`PixelRemapper`] maps each
//! logical `(x, y)` cell to its physical `(row, col)` mirror:
//!
//! ```text
//! row = (logical_width - 1) - x + y
//! col = horizontal_offset + (x + y) / 2
//! ```
//!
//! Mirrors outside the diamond stay dark (zero).

use serde::{Deserialize, Serialize};

use crate::error::HummingbirdError;

// ── ProjectorGeometry ────────────────────────────────────────────

/// Logical grid and physical mirror array dimensions.
///
/// The defaults describe the reference projector (343 × 342 stimulus
/// grid on a 608 × 684 mirror array) and must not change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectorGeometry {
    /// Stimulus grid width in pixels.
    pub logical_width: u32,
    /// Stimulus grid height in pixels.
    pub logical_height: u32,
    /// Mirror columns per physical row.
    pub physical_columns: u32,
    /// Mirror rows.
    pub physical_rows: u32,
    /// Column of the diamond's left-most mirror.
    pub horizontal_offset: u32,
}

impl Default for ProjectorGeometry {
    fn default() -> Self {
        Self {
            logical_width: 343,
            logical_height: 342,
            physical_columns: 608,
            physical_rows: 684,
            horizontal_offset: 133,
        }
    }
}

impl ProjectorGeometry {
    /// Number of cells in the logical grid.
    pub const fn logical_len(&self) -> usize {
        self.logical_width as usize * self.logical_height as usize
    }

    /// Number of mirrors in one physical plane.
    pub const fn physical_len(&self) -> usize {
        self.physical_columns as usize * self.physical_rows as usize
    }

    /// Check that every logical cell maps inside the physical plane.
    pub fn validate(&self) -> Result<(), HummingbirdError> {
        if self.logical_width == 0 || self.logical_height == 0 {
            return Err(HummingbirdError::Configuration(
                "the logical grid must not be empty".into(),
            ));
        }
        // Corners of the diamond: row peaks at (0, h-1), col peaks at (w-1, h-1).
        let max_row = (self.logical_width - 1) as u64 + (self.logical_height - 1) as u64;
        let max_col = self.horizontal_offset as u64
            + ((self.logical_width - 1) as u64 + (self.logical_height - 1) as u64) / 2;
        if max_row >= self.physical_rows as u64 {
            return Err(HummingbirdError::Configuration(format!(
                "a {}x{} grid needs {} mirror rows, the projector has {}",
                self.logical_width,
                self.logical_height,
                max_row + 1,
                self.physical_rows
            )));
        }
        if max_col >= self.physical_columns as u64 {
            return Err(HummingbirdError::Configuration(format!(
                "a {}x{} grid at offset {} needs {} mirror columns, the projector has {}",
                self.logical_width,
                self.logical_height,
                self.horizontal_offset,
                max_col + 1,
                self.physical_columns
            )));
        }
        Ok(())
    }
}

// ── PixelRemapper ────────────────────────────────────────────────

/// Logical-to-physical coordinate transform.
///
/// Construction precomputes the physical index of every logical cell,
/// so [`remap`](Self::remap) is a single gather pass per plane.
#[derive(Debug, Clone)]
pub struct PixelRemapper {
    geometry: ProjectorGeometry,
    /// `targets[x + y * logical_width]` = row-major physical index.
    targets: Vec<usize>,
}

impl PixelRemapper {
    /// Build the remap table for a validated geometry.
    pub fn new(geometry: ProjectorGeometry) -> Result<Self, HummingbirdError> {
        geometry.validate()?;
        let mut targets = Vec::with_capacity(geometry.logical_len());
        for y in 0..geometry.logical_height {
            for x in 0..geometry.logical_width {
                let (row, col) = Self::map_unchecked(&geometry, x, y);
                targets.push(row as usize * geometry.physical_columns as usize + col as usize);
            }
        }
        Ok(Self { geometry, targets })
    }

    pub fn geometry(&self) -> &ProjectorGeometry {
        &self.geometry
    }

    /// Physical `(row, col)` of logical cell `(x, y)`.
    ///
    /// Returns `None` outside the logical grid.
    pub fn map(&self, x: u32, y: u32) -> Option<(u32, u32)> {
        if x >= self.geometry.logical_width || y >= self.geometry.logical_height {
            return None;
        }
        Some(Self::map_unchecked(&self.geometry, x, y))
    }

    /// Scatter a logical plane onto a fresh, zeroed physical plane.
    ///
    /// `logical` must hold `logical_width * logical_height` bytes.
    pub fn remap(&self, logical: &[u8]) -> Vec<u8> {
        debug_assert_eq!(logical.len(), self.targets.len());
        let mut physical = vec![0u8; self.geometry.physical_len()];
        for (&target, &value) in self.targets.iter().zip(logical) {
            physical[target] = value;
        }
        physical
    }

    /// Inverse of [`remap`](Self::remap): read the logical plane back out
    /// of a physical one.
    pub fn gather(&self, physical: &[u8]) -> Vec<u8> {
        self.targets.iter().map(|&target| physical[target]).collect()
    }

    fn map_unchecked(geometry: &ProjectorGeometry, x: u32, y: u32) -> (u32, u32) {
        let row = (geometry.logical_width - 1) - x + y;
        let col = geometry.horizontal_offset + (x + y) / 2;
        (row, col)
    }
}

// ── Tests ────────────────────────────────────────────────────────
