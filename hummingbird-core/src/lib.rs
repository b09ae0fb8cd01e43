//! # hummingbird-core
//!
//! Turns binary stimulus frames into videos for a DLP projector running
//! at 1440 Hz: 24 one-bit sub-frames are packed into the bit-planes of
//! each 60 Hz video frame and streamed, as YUV4MPEG2, to a lossless
//! encoder subprocess.
//!
//! ```text
//! Frame ─► BinaryFrame ─► BitPlaneAccumulator ─► PixelRemapper ─► SyncPattern ─► StreamWriter ─► encoder
//!          (threshold)    (24 slots)              (diamond)       (corner code)  (YUV4MPEG2)     (stdin)
//! ```
//!
//! This crate contains:
//! - **Geometry**: `ProjectorGeometry`, `PixelRemapper`
//! - **Frames**: `Frame`, `PixelFormat`, `BinaryFrame`
//! - **Packing**: `BitPlaneAccumulator`, `ChannelPlanes`
//! - **Sync**: `SyncPattern`, corner staircase stamping
//! - **Stream**: `StreamWriter`, `MacroFrame`, payload layout
//! - **Sinks**: `EncoderSink`, `EncoderProcess`, `MemorySink`
//! - **Generator**: `FrameGenerator`, `GeneratorConfig`
//! - **Inspection**: `interleave`, `subframe`
//! - **Error**: `HummingbirdError`, a `thiserror` enum

pub mod accumulator;
pub mod config;
pub mod encoder;
pub mod error;
pub mod frame;
pub mod generator;
pub mod geometry;
pub mod interleave;
pub mod sink;
pub mod stream;
pub mod sync;

// ── Re-exports for ergonomic usage ───────────────────────────────

pub use accumulator::{BitPlaneAccumulator, ChannelPlanes, SLOTS_PER_MACRO_FRAME};
pub use config::{GeneratorConfig, MAXIMUM_FRAMERATE, PartialCycle};
pub use encoder::{EncoderCommand, EncoderProcess};
pub use error::{EncoderExit, HummingbirdError};
pub use frame::{BinaryFrame, Frame, PixelFormat};
pub use generator::FrameGenerator;
pub use geometry::{PixelRemapper, ProjectorGeometry};
pub use interleave::{interleave, subframe};
pub use sink::{EncoderSink, MemorySink};
pub use stream::{MacroFrame, StreamWriter, VIDEO_FRAMERATE};
pub use sync::{SyncMode, SyncPattern};
