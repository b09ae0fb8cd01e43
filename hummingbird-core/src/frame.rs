//! Stimulus frames and their binary form.
//!
//! A [`Frame`] is whatever the stimulus library captured after a flip:
//! grey or colour pixels, possibly with padded rows. The generator turns
//! it into a [`BinaryFrame`] by (optionally) box-filtering an oversampled
//! capture down to the logical grid and thresholding its luminance.

use crate::error::HummingbirdError;

/// Luminance strictly above this value is "on".
pub const THRESHOLD: u8 = 127;

// ── PixelFormat ──────────────────────────────────────────────────

/// Pixel layout of a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PixelFormat {
    /// 1 byte per pixel: luminance.
    Gray8,
    /// 3 bytes per pixel: Red, Green, Blue.
    Rgb8,
    /// 4 bytes per pixel: Red, Green, Blue, Alpha.
    Rgba8,
    /// 4 bytes per pixel: Blue, Green, Red, Alpha.
    Bgra8,
}

impl PixelFormat {
    /// Bytes consumed by a single pixel in this format.
    pub const fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Gray8 => 1,
            PixelFormat::Rgb8 => 3,
            PixelFormat::Rgba8 | PixelFormat::Bgra8 => 4,
        }
    }

    /// Offsets of red, green and blue inside a pixel.
    const fn rgb_offsets(self) -> [usize; 3] {
        match self {
            PixelFormat::Gray8 => [0, 0, 0],
            PixelFormat::Rgb8 | PixelFormat::Rgba8 => [0, 1, 2],
            PixelFormat::Bgra8 => [2, 1, 0],
        }
    }
}

/// ITU-R 601-2 luma in 16-bit fixed point, rounded.
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((r as u32 * 19595 + g as u32 * 38470 + b as u32 * 7471 + 0x8000) >> 16) as u8
}

// ── Frame ────────────────────────────────────────────────────────

/// A captured stimulus frame.
///
/// The `data` buffer holds `height` rows of `stride` bytes each; `stride`
/// may exceed `width * bytes_per_pixel` when the capture pads rows.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Row pitch in **bytes**.
    pub stride: u32,
    /// Pixel layout.
    pub format: PixelFormat,
    /// Raw pixel data, at least `stride * height` bytes.
    pub data: Vec<u8>,
}

impl Frame {
    /// Wrap a tightly packed buffer.
    pub fn new(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, HummingbirdError> {
        let stride = width
            .checked_mul(format.bytes_per_pixel() as u32)
            .ok_or_else(|| {
                HummingbirdError::InvalidFrame(format!(
                    "a {width}-pixel {format:?} row does not fit in a u32 stride"
                ))
            })?;
        Self::with_stride(width, height, stride, format, data)
    }

    /// Wrap a buffer whose rows are `stride` bytes apart.
    pub fn with_stride(
        width: u32,
        height: u32,
        stride: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, HummingbirdError> {
        let frame = Self {
            width,
            height,
            stride,
            format,
            data,
        };
        frame.validate()?;
        Ok(frame)
    }

    /// A uniform grey frame.
    pub fn filled(width: u32, height: u32, value: u8) -> Result<Self, HummingbirdError> {
        let len = (width as usize).checked_mul(height as usize).ok_or_else(|| {
            HummingbirdError::InvalidFrame(format!("a {width}×{height} frame is too large"))
        })?;
        Self::new(width, height, PixelFormat::Gray8, vec![value; len])
    }

    /// Verify that `stride` and `data` agree with the declared size.
    pub fn validate(&self) -> Result<(), HummingbirdError> {
        let row_len = (self.width as usize)
            .checked_mul(self.format.bytes_per_pixel())
            .unwrap_or(usize::MAX);
        if (self.stride as usize) < row_len {
            return Err(HummingbirdError::InvalidFrame(format!(
                "stride {} is shorter than a {}-pixel row ({row_len} bytes)",
                self.stride, self.width
            )));
        }
        if self.data.len() < self.byte_len() {
            return Err(HummingbirdError::InvalidFrame(format!(
                "{} bytes cannot hold {} rows of {} bytes",
                self.data.len(),
                self.height,
                self.stride
            )));
        }
        Ok(())
    }

    /// Total byte size the bitmap occupies, saturating at `usize::MAX`.
    pub fn byte_len(&self) -> usize {
        (self.stride as usize).saturating_mul(self.height as usize)
    }

    /// Returns the pixel bytes at `(x, y)`.
    ///
    /// # Panics
    ///
    /// Panics if `(x, y)` is out of bounds.
    pub fn pixel(&self, x: u32, y: u32) -> &[u8] {
        let bpp = self.format.bytes_per_pixel();
        let offset = y as usize * self.stride as usize + x as usize * bpp;
        &self.data[offset..offset + bpp]
    }

    /// Colour channels of `(x, y)` as `[r, g, b]`.
    fn rgb(&self, x: u32, y: u32) -> [u8; 3] {
        let pixel = self.pixel(x, y);
        let [r, g, b] = self.format.rgb_offsets();
        [pixel[r], pixel[g], pixel[b]]
    }

    /// Luminance of `(x, y)`.
    fn luminance(&self, x: u32, y: u32) -> u8 {
        match self.format {
            PixelFormat::Gray8 => self.pixel(x, y)[0],
            _ => {
                let [r, g, b] = self.rgb(x, y);
                luma(r, g, b)
            }
        }
    }

    /// Luminance of the 2×2 block whose top-left corner is `(2x, 2y)`.
    ///
    /// Each colour channel is box-averaged (rounded) before the luma
    /// conversion, the same order an image library resizes then converts.
    fn block_luminance(&self, x: u32, y: u32) -> u8 {
        let mut sums = [0u32; 3];
        for (dx, dy) in [(0, 0), (1, 0), (0, 1), (1, 1)] {
            let rgb = self.rgb(2 * x + dx, 2 * y + dy);
            for (sum, value) in sums.iter_mut().zip(rgb) {
                *sum += value as u32;
            }
        }
        let [r, g, b] = sums.map(|sum| ((sum + 2) / 4) as u8);
        match self.format {
            PixelFormat::Gray8 => r,
            _ => luma(r, g, b),
        }
    }
}

// ── BinaryFrame ──────────────────────────────────────────────────

/// A thresholded frame on the logical grid, one byte (0 or 1) per cell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryFrame {
    pub width: u32,
    pub height: u32,
    /// Row-major cells, each 0 or 1.
    pub bits: Vec<u8>,
}

impl BinaryFrame {
    /// All cells off.
    pub fn dark(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            bits: vec![0; width as usize * height as usize],
        }
    }

    /// Threshold `frame` onto a `width × height` grid.
    ///
    /// Frames at exactly twice the grid size in both dimensions are
    /// box-downsampled first; any other size is a [`SizeMismatch`].
    ///
    /// [`SizeMismatch`]: HummingbirdError::SizeMismatch
    pub fn from_frame(frame: &Frame, width: u32, height: u32) -> Result<Self, HummingbirdError> {
        let luminance: fn(&Frame, u32, u32) -> u8 = if frame.width == width && frame.height == height {
            Frame::luminance
        } else if frame.width as u64 == width as u64 * 2 && frame.height as u64 == height as u64 * 2 {
            Frame::block_luminance
        } else {
            return Err(HummingbirdError::SizeMismatch {
                width: frame.width,
                height: frame.height,
                expected_width: width,
                expected_height: height,
            });
        };
        frame.validate()?;

        let mut bits = Vec::with_capacity(width as usize * height as usize);
        for y in 0..height {
            for x in 0..width {
                bits.push((luminance(frame, x, y) > THRESHOLD) as u8);
            }
        }
        Ok(Self {
            width,
            height,
            bits,
        })
    }

    /// Number of cells that are on.
    pub fn count_on(&self) -> usize {
        self.bits.iter().filter(|&&b| b != 0).count()
    }
}

// ── Tests ────────────────────────────────────────────────────────
