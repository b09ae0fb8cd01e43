//! Frame generator — the pipeline orchestrator.
//!
//! For every pushed frame:
//!
//! 1. Check that the encoder is still alive.
//! 2. Threshold the frame (box-downsampling 2× captures first).
//! 3. Deposit it `replicates` times into the [`BitPlaneAccumulator`].
//! 4. For each completed cycle, remap the planes onto the mirror array,
//!    stamp the sync corner and write the macro-frame.
//!
//! Everything happens synchronously inside [`push`](FrameGenerator::push);
//! a slow encoder simply blocks the write.

use tracing::{debug, info, warn};

use crate::accumulator::{BitPlaneAccumulator, ChannelPlanes, SLOTS_PER_MACRO_FRAME};
use crate::config::{GeneratorConfig, PartialCycle};
use crate::encoder::EncoderProcess;
use crate::error::{EncoderExit, HummingbirdError};
use crate::frame::{BinaryFrame, Frame};
use crate::geometry::PixelRemapper;
use crate::sink::EncoderSink;
use crate::stream::{MacroFrame, StreamWriter};
use crate::sync::SyncPattern;

// ── FrameGenerator ───────────────────────────────────────────────

/// Packs pushed frames into a projector video.
///
/// # Lifetime
///
/// The sink is closed by [`close`](Self::close), by
/// [`finish`](Self::finish), or when the generator is dropped, whichever
/// comes first, including after a failed push.
pub struct FrameGenerator<S: EncoderSink = EncoderProcess> {
    config: GeneratorConfig,
    replicates: u32,
    remapper: PixelRemapper,
    accumulator: BitPlaneAccumulator,
    sync: SyncPattern,
    /// `None` only after [`finish`](Self::finish) moved the sink out.
    writer: Option<StreamWriter<S>>,
    frames_pushed: u64,
}

impl FrameGenerator<EncoderProcess> {
    /// Validate `config`, launch the encoder and write the stream header.
    ///
    /// Configuration errors are reported before anything is spawned.
    pub fn spawn(config: GeneratorConfig) -> Result<Self, HummingbirdError> {
        config.validate()?;
        let process = EncoderProcess::spawn(&config.encoder, &config.output)?;
        Self::with_sink(config, process)
    }
}

impl<S: EncoderSink> FrameGenerator<S> {
    /// Validate `config` and stream into `sink`.
    pub fn with_sink(config: GeneratorConfig, sink: S) -> Result<Self, HummingbirdError> {
        config.validate()?;
        let replicates = config.replicates()?;
        let remapper = PixelRemapper::new(config.geometry)?;

        let geometry = config.geometry;
        let sync = SyncPattern::new(
            config.synchronization_pattern.clone(),
            config.corner_size,
            config.sync_mode,
        );
        let mut writer = StreamWriter::new(sink, geometry);
        writer.write_header()?;

        info!(
            output = %config.output.display(),
            framerate = config.framerate,
            replicates,
            sync_values = config.synchronization_pattern.len(),
            "generator ready"
        );

        Ok(Self {
            accumulator: BitPlaneAccumulator::new(geometry.logical_width, geometry.logical_height),
            config,
            replicates,
            remapper,
            sync,
            writer: Some(writer),
            frames_pushed: 0,
        })
    }

    /// Add one logical frame to the video.
    ///
    /// Must be called right after the corresponding display refresh;
    /// nothing checks the timing, but late pushes skew the sync codes.
    pub fn push(&mut self, frame: &Frame) -> Result<(), HummingbirdError> {
        if self.is_closed() {
            return Err(HummingbirdError::Closed);
        }
        if let Some(exit) = self.encoder_exit()? {
            return Err(HummingbirdError::EncoderTerminated(exit));
        }

        let geometry = self.config.geometry;
        let binary = BinaryFrame::from_frame(frame, geometry.logical_width, geometry.logical_height)?;
        self.frames_pushed += 1;
        self.deposit(&binary)
    }

    /// Non-blocking check of the encoder; `Some` once it has exited.
    pub fn encoder_exit(&mut self) -> Result<Option<EncoderExit>, HummingbirdError> {
        let writer = self.writer.as_mut().ok_or(HummingbirdError::Closed)?;
        Ok(writer.sink_mut().try_exit()?)
    }

    /// Push the binary frame `replicates` times.
    fn deposit(&mut self, binary: &BinaryFrame) -> Result<(), HummingbirdError> {
        for _ in 0..self.replicates {
            if let Some(planes) = self.accumulator.deposit(binary) {
                self.emit(planes)?;
            }
        }
        Ok(())
    }

    fn emit(&mut self, planes: ChannelPlanes) -> Result<(), HummingbirdError> {
        let geometry = self.config.geometry;
        let mut physical = planes.planes.map(|plane| self.remapper.remap(&plane));
        let used = self.sync.stamp_planes(&mut physical, &geometry);

        let writer = self.writer.as_mut().ok_or(HummingbirdError::Closed)?;
        writer.write_macro_frame(&MacroFrame { planes: physical })?;
        // Sync values belong to frames that reached the sink.
        self.sync.advance(used);
        debug!(
            macro_frame = writer.frames_written(),
            sync_cursor = self.sync.cursor(),
            "macro-frame emitted"
        );
        Ok(())
    }

    /// Close the sink, signalling end-of-stream to the encoder.
    ///
    /// Idempotent. Does not wait for the encoder to exit.
    pub fn close(&mut self) -> Result<(), HummingbirdError> {
        let Some(writer) = self.writer.as_ref() else {
            return Ok(());
        };
        if writer.is_closed() {
            return Ok(());
        }

        let flushed = self.flush_partial_cycle();
        let writer = self.writer.as_mut().ok_or(HummingbirdError::Closed)?;
        let closed = writer.close();
        info!(
            frames_pushed = self.frames_pushed,
            macro_frames = writer.frames_written(),
            bytes = writer.bytes_written(),
            "generator closed"
        );
        flushed?;
        closed?;
        Ok(())
    }

    /// Close and hand back the sink, e.g. to wait for the encoder.
    pub fn finish(mut self) -> Result<S, HummingbirdError> {
        self.close()?;
        let writer = self.writer.take().ok_or(HummingbirdError::Closed)?;
        Ok(writer.into_sink())
    }

    fn flush_partial_cycle(&mut self) -> Result<(), HummingbirdError> {
        let pending = self.accumulator.pending();
        if pending == 0 {
            return Ok(());
        }
        match self.config.partial_cycle {
            PartialCycle::Drop => {
                warn!(
                    pending,
                    "closing mid-cycle; the last {pending} sub-frames are not in the video"
                );
                Ok(())
            }
            PartialCycle::PadDark => {
                let geometry = self.config.geometry;
                let dark = BinaryFrame::dark(geometry.logical_width, geometry.logical_height);
                debug!(padding = SLOTS_PER_MACRO_FRAME - pending, "padding final cycle");
                while self.accumulator.pending() != 0 {
                    if let Some(planes) = self.accumulator.deposit(&dark) {
                        self.emit(planes)?;
                    }
                }
                Ok(())
            }
        }
    }

    // ── Accessors ────────────────────────────────────────────────

    pub fn config(&self) -> &GeneratorConfig {
        &self.config
    }

    /// Slots each logical frame occupies (`1440 / framerate`).
    pub fn replicates(&self) -> u32 {
        self.replicates
    }

    /// Logical frames accepted so far.
    pub fn frames_pushed(&self) -> u64 {
        self.frames_pushed
    }

    /// Macro-frames written so far.
    pub fn macro_frames(&self) -> u64 {
        self.writer.as_ref().map_or(0, StreamWriter::frames_written)
    }

    /// Slot the next sub-frame will fill.
    pub fn slot(&self) -> usize {
        self.accumulator.slot()
    }

    /// Sync values not yet stamped.
    pub fn sync_remaining(&self) -> usize {
        self.sync.remaining()
    }

    pub fn is_closed(&self) -> bool {
        self.writer.as_ref().is_none_or(StreamWriter::is_closed)
    }

    /// The sink, until [`finish`](Self::finish) takes it.
    pub fn sink(&self) -> Option<&S> {
        self.writer.as_ref().map(StreamWriter::sink)
    }
}

impl<S: EncoderSink> Drop for FrameGenerator<S> {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("failed to close generator sink: {e}");
        }
    }
}

// ── Tests ────────────────────────────────────────────────────────
