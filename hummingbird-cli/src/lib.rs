//! # hummingbird-cli — raw frames in, projector video out
//!
//! Reads a stream of binary logical frames (bit-packed or one byte per
//! pixel), packs them with [`hummingbird_core::FrameGenerator`] and hands
//! the result to the configured encoder.

pub mod config;
pub mod input;
