//! Raw frame stream reader.
//!
//! Frames are row-major logical images, back to back, with no header:
//!
//! - **bits** (default): `ceil(width * height / 8)` bytes per frame; pixel
//!   `i = x + y * width` is bit `i % 8` (LSB first) of byte `i / 8`. The
//!   unused trailing bits of the last byte are ignored.
//! - **grey**: `width * height` bytes per frame; a value above 127 is on.

use std::io::{self, Read};

use hummingbird_core::{Frame, HummingbirdError, PixelFormat};

/// Encoding of the incoming frames.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Bits,
    Grey,
}

/// Reads fixed-size frames from a byte stream.
pub struct FrameReader<R> {
    reader: R,
    mode: InputMode,
    width: u32,
    height: u32,
    buffer: Vec<u8>,
}

impl<R: Read> FrameReader<R> {
    pub fn new(reader: R, mode: InputMode, width: u32, height: u32) -> Self {
        let pixels = width as usize * height as usize;
        let frame_len = match mode {
            InputMode::Bits => pixels.div_ceil(8),
            InputMode::Grey => pixels,
        };
        Self {
            reader,
            mode,
            width,
            height,
            buffer: vec![0; frame_len],
        }
    }

    /// Bytes per input frame.
    pub fn frame_len(&self) -> usize {
        self.buffer.len()
    }

    /// Next frame, or `None` at a clean end of stream.
    ///
    /// A stream ending in the middle of a frame is an error.
    pub fn next_frame(&mut self) -> Result<Option<Frame>, HummingbirdError> {
        let filled = self.fill()?;
        if filled == 0 {
            return Ok(None);
        }
        if filled < self.buffer.len() {
            return Err(HummingbirdError::InvalidFrame(format!(
                "input ended after {filled} of {} bytes of a frame",
                self.buffer.len()
            )));
        }

        let pixels = self.width as usize * self.height as usize;
        let data = match self.mode {
            InputMode::Grey => self.buffer.clone(),
            InputMode::Bits => (0..pixels)
                .map(|i| if self.buffer[i / 8] & (1 << (i % 8)) != 0 { 255 } else { 0 })
                .collect(),
        };
        Frame::new(self.width, self.height, PixelFormat::Gray8, data).map(Some)
    }

    /// Read until the buffer is full or the stream ends.
    fn fill(&mut self) -> io::Result<usize> {
        let mut filled = 0;
        while filled < self.buffer.len() {
            match self.reader.read(&mut self.buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }
}

impl<R: Read> Iterator for FrameReader<R> {
    type Item = Result<Frame, HummingbirdError>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_frame().transpose()
    }
}

// ── Tests ────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reference_bit_frame_length() {
        let reader = FrameReader::new(io::empty(), InputMode::Bits, 343, 342);
        assert_eq!(reader.frame_len(), 14664);
        let reader = FrameReader::new(io::empty(), InputMode::Grey, 343, 342);
        assert_eq!(reader.frame_len(), 343 * 342);
    }

    #[test]
    fn bits_are_lsb_first() {
        // 3x3 = 9 pixels → 2 bytes; pixels 0, 3 and 8 are on.
        let input: &[u8] = &[0b0000_1001, 0b0000_0001];
        let mut reader = FrameReader::new(input, InputMode::Bits, 3, 3);
        let frame = reader.next_frame().unwrap().unwrap();
        assert_eq!(frame.data, [255, 0, 0, 255, 0, 0, 0, 0, 255]);
        assert!(reader.next_frame().unwrap().is_none());
    }

    #[test]
    fn grey_frames_pass_through() {
        let input: &[u8] = &[0, 200, 128, 127, 1, 2, 3, 4];
        let frames: Vec<Frame> = FrameReader::new(input, InputMode::Grey, 2, 2)
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(frames.len(), 2);
        assert_eq!(frames[0].data, [0, 200, 128, 127]);
        assert_eq!(frames[1].data, [1, 2, 3, 4]);
    }

    #[test]
    fn truncated_frame_is_an_error() {
        let input: &[u8] = &[1, 2, 3, 4, 5];
        let mut reader = FrameReader::new(input, InputMode::Grey, 2, 2);
        assert!(reader.next_frame().unwrap().is_some());
        assert!(matches!(
            reader.next_frame(),
            Err(HummingbirdError::InvalidFrame(_))
        ));
    }
}
