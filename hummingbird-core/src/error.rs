//! Domain-specific error types for the Hummingbird pipeline.
//!
//! All fallible operations return `Result<T, HummingbirdError>`.
//! No panics on invalid input. Every error is typed and surfaced to the
//! caller of the operation that detected it.

use std::fmt;

use thiserror::Error;

/// The canonical error type for Hummingbird.
#[derive(Debug, Error)]
pub enum HummingbirdError {
    // ── Construction Errors ──────────────────────────────────────
    /// The configuration is inconsistent (framerate, geometry, corner size).
    #[error("invalid configuration: {0}")]
    Configuration(String),

    /// The external encoder process could not be spawned.
    #[error("failed to spawn encoder `{program}`: {source}")]
    EncoderUnavailable {
        program: String,
        #[source]
        source: std::io::Error,
    },

    // ── Frame Errors ─────────────────────────────────────────────
    /// The pushed frame is neither the target size nor exactly twice it.
    #[error(
        "frame size mismatch: got {width}x{height}, expected {expected_width}x{expected_height} or {}x{}",
        expected_width * 2,
        expected_height * 2
    )]
    SizeMismatch {
        width: u32,
        height: u32,
        expected_width: u32,
        expected_height: u32,
    },

    /// A pixel buffer is inconsistent with its declared layout.
    #[error("invalid frame: {0}")]
    InvalidFrame(String),

    // ── Stream Errors ────────────────────────────────────────────
    /// The encoder exited while frames were still being pushed.
    #[error("encoder terminated: {0}")]
    EncoderTerminated(EncoderExit),

    /// A write, flush or close on the sink failed.
    #[error("stream I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A frame was pushed after the generator was closed.
    #[error("generator is closed")]
    Closed,
}

// ── EncoderExit ──────────────────────────────────────────────────

/// Termination report of the external encoder.
///
/// `code` is `None` when the process was killed by a signal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncoderExit {
    pub code: Option<i32>,
    /// Everything the encoder wrote to its standard output.
    pub stdout: String,
    /// Everything the encoder wrote to its standard error.
    pub stderr: String,
}

impl fmt::Display for EncoderExit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.code {
            Some(code) => write!(f, "exit code {code}")?,
            None => write!(f, "killed by signal")?,
        }
        write!(f, "\nstdout: {}\nstderr: {}", self.stdout, self.stderr)
    }
}
