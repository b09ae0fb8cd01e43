//! YUV4MPEG2 serialization of macro-frames.
//!
//! The projector's video input is 4:2:0 YUV at 1216 × 684. Hummingbird
//! abuses that layout to carry three full-resolution 608 × 684 planes:
//!
//! ```text
//! Y  (1216 × 684)      planes 0 and 1 interleaved byte by byte
//! U  ( 608 × 342)      plane 2, even rows
//! V  ( 608 × 342)      plane 2, odd rows
//! ```
//!
//! A lossless encoder round-trips this untouched and the player on the
//! other end re-interleaves it (see [`crate::interleave`]).

use std::io::{self, Write};

use bytes::{BufMut, BytesMut};
use tracing::debug;

use crate::accumulator::SLOTS_PER_MACRO_FRAME;
use crate::config::MAXIMUM_FRAMERATE;
use crate::geometry::ProjectorGeometry;
use crate::sink::EncoderSink;

/// Frame marker preceding every payload.
pub const FRAME_MARKER: &[u8] = b"FRAME\n";

/// Rate of the packed video.
pub const VIDEO_FRAMERATE: u32 = MAXIMUM_FRAMERATE / SLOTS_PER_MACRO_FRAME as u32;

// ── MacroFrame ───────────────────────────────────────────────────

/// Three physical planes (row-major, `physical_rows × physical_columns`)
/// making up one video frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MacroFrame {
    pub planes: [Vec<u8>; 3],
}

/// Stream header for `geometry`.
pub fn header(geometry: &ProjectorGeometry) -> String {
    format!(
        "YUV4MPEG2 W{} H{} F{VIDEO_FRAMERATE}:1 Ip C420\n",
        geometry.physical_columns * 2,
        geometry.physical_rows
    )
}

/// Payload size of one macro-frame in bytes.
pub fn payload_len(geometry: &ProjectorGeometry) -> usize {
    geometry.physical_len() * 3
}

/// Append the payload of `frame` (without marker) to `out`.
pub fn encode_payload(frame: &MacroFrame, geometry: &ProjectorGeometry, out: &mut BytesMut) {
    let columns = geometry.physical_columns as usize;
    let [p0, p1, p2] = &frame.planes;
    out.reserve(payload_len(geometry));

    for (&a, &b) in p0.iter().zip(p1) {
        out.put_u8(a);
        out.put_u8(b);
    }
    for row in p2.chunks_exact(columns).step_by(2) {
        out.put_slice(row);
    }
    for row in p2.chunks_exact(columns).skip(1).step_by(2) {
        out.put_slice(row);
    }
}

// ── StreamWriter ─────────────────────────────────────────────────

/// Writes the header once and one payload per macro-frame to a sink.
///
/// The payload is assembled in a reusable buffer and written with a
/// single call, then the sink is flushed so the encoder sees whole frames
/// without delay.
pub struct StreamWriter<S> {
    sink: S,
    geometry: ProjectorGeometry,
    buffer: BytesMut,
    header_written: bool,
    closed: bool,
    frames_written: u64,
    bytes_written: u64,
}

impl<S: EncoderSink> StreamWriter<S> {
    pub fn new(sink: S, geometry: ProjectorGeometry) -> Self {
        Self {
            sink,
            geometry,
            buffer: BytesMut::with_capacity(FRAME_MARKER.len() + payload_len(&geometry)),
            header_written: false,
            closed: false,
            frames_written: 0,
            bytes_written: 0,
        }
    }

    /// Write the stream header. Subsequent calls do nothing.
    pub fn write_header(&mut self) -> io::Result<()> {
        if self.header_written {
            return Ok(());
        }
        let header = header(&self.geometry);
        self.sink.write_all(header.as_bytes())?;
        self.header_written = true;
        self.bytes_written += header.len() as u64;
        Ok(())
    }

    /// Write one marker + payload and flush.
    pub fn write_macro_frame(&mut self, frame: &MacroFrame) -> io::Result<()> {
        self.write_header()?;
        self.buffer.clear();
        self.buffer.put_slice(FRAME_MARKER);
        encode_payload(frame, &self.geometry, &mut self.buffer);

        self.sink.write_all(&self.buffer)?;
        self.sink.flush()?;
        self.frames_written += 1;
        self.bytes_written += self.buffer.len() as u64;
        debug!(frame = self.frames_written, bytes = self.buffer.len(), "macro-frame written");
        Ok(())
    }

    /// Close the sink once; later calls are no-ops.
    pub fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.sink.close()
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Macro-frames written so far.
    pub fn frames_written(&self) -> u64 {
        self.frames_written
    }

    /// Header and frame bytes written so far.
    pub fn bytes_written(&self) -> u64 {
        self.bytes_written
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    pub fn into_sink(self) -> S {
        self.sink
    }
}

// ── Tests ────────────────────────────────────────────────────────
