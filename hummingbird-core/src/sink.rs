//! Byte sinks the generator streams into.
//!
//! A sink is anything that accepts bytes ([`Write`]), can report whether
//! the consumer behind it has gone away, and can be closed to signal
//! end-of-stream. [`EncoderProcess`](crate::encoder::EncoderProcess) is
//! the production sink; [`MemorySink`] keeps everything in memory for
//! tests and dry runs.

use std::io::{self, Write};

use crate::error::EncoderExit;

// ── EncoderSink ──────────────────────────────────────────────────

/// Destination of the YUV4MPEG2 stream.
pub trait EncoderSink: Write {
    /// Non-blocking liveness check.
    ///
    /// Returns `Some` once the consumer has exited, with whatever it
    /// reported on the way out.
    fn try_exit(&mut self) -> io::Result<Option<EncoderExit>>;

    /// Flush and close the write end. Must be idempotent.
    fn close(&mut self) -> io::Result<()>;
}

// ── MemorySink ───────────────────────────────────────────────────

/// In-memory sink recording every byte written.
///
/// [`terminate`](Self::terminate) simulates a consumer that exits; from
/// then on [`try_exit`](EncoderSink::try_exit) reports it and writes fail
/// with `BrokenPipe`.
#[derive(Debug, Default)]
pub struct MemorySink {
    bytes: Vec<u8>,
    flushes: usize,
    closed: bool,
    exit: Option<EncoderExit>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Number of `flush` calls received.
    pub fn flushes(&self) -> usize {
        self.flushes
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Pretend the consumer exited with `exit`.
    pub fn terminate(&mut self, exit: EncoderExit) {
        self.exit = Some(exit);
    }

    fn check_open(&self) -> io::Result<()> {
        if self.closed || self.exit.is_some() {
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "sink is closed"));
        }
        Ok(())
    }
}

impl Write for MemorySink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.check_open()?;
        self.bytes.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.check_open()?;
        self.flushes += 1;
        Ok(())
    }
}

impl EncoderSink for MemorySink {
    fn try_exit(&mut self) -> io::Result<Option<EncoderExit>> {
        Ok(self.exit.clone())
    }

    fn close(&mut self) -> io::Result<()> {
        self.closed = true;
        Ok(())
    }
}

// ── Tests ────────────────────────────────────────────────────────
