//! Generator configuration.
//!
//! Everything the generator needs is fixed at construction and never
//! changes afterwards; there is no global state.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::encoder::EncoderCommand;
use crate::error::HummingbirdError;
use crate::geometry::ProjectorGeometry;
use crate::sync::{DEFAULT_CORNER_SIZE, SyncMode, validate_corner};

/// Sub-frames per second the projector can show.
pub const MAXIMUM_FRAMERATE: u32 = 1440;

// ── PartialCycle ─────────────────────────────────────────────────

/// What happens to an incomplete 24-slot cycle when the generator closes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PartialCycle {
    /// Discard the trailing sub-frames (logged as a warning).
    #[default]
    Drop,
    /// Fill the remaining slots with dark sub-frames and emit the frame.
    PadDark,
}

// ── GeneratorConfig ──────────────────────────────────────────────

/// Immutable generator settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Video file the encoder writes.
    pub output: PathBuf,
    /// Bytes stamped in the sync corner, in order.
    pub synchronization_pattern: Vec<u8>,
    /// Staircase size of the sync corner, in mirrors.
    pub corner_size: u32,
    /// Logical frames per second; must divide [`MAXIMUM_FRAMERATE`].
    pub framerate: u32,
    pub sync_mode: SyncMode,
    pub partial_cycle: PartialCycle,
    pub encoder: EncoderCommand,
    pub geometry: ProjectorGeometry,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            output: PathBuf::from("hummingbird.mp4"),
            synchronization_pattern: Vec::new(),
            corner_size: DEFAULT_CORNER_SIZE,
            framerate: MAXIMUM_FRAMERATE,
            sync_mode: SyncMode::default(),
            partial_cycle: PartialCycle::default(),
            encoder: EncoderCommand::default(),
            geometry: ProjectorGeometry::default(),
        }
    }
}

impl GeneratorConfig {
    /// Configuration writing to `output` with every other field defaulted.
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            ..Self::default()
        }
    }

    /// Number of consecutive slots each logical frame occupies.
    pub fn replicates(&self) -> Result<u32, HummingbirdError> {
        if self.framerate == 0 || MAXIMUM_FRAMERATE % self.framerate != 0 {
            return Err(HummingbirdError::Configuration(format!(
                "the framerate must divide the maximum framerate ({MAXIMUM_FRAMERATE} fps), got {}",
                self.framerate
            )));
        }
        Ok(MAXIMUM_FRAMERATE / self.framerate)
    }

    /// Check every constraint that can be checked without side effects.
    pub fn validate(&self) -> Result<(), HummingbirdError> {
        self.replicates()?;
        self.geometry.validate()?;
        validate_corner(&self.geometry, self.corner_size)
    }
}

// ── Tests ────────────────────────────────────────────────────────
