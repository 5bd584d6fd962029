//! Offscreen RGBA8 raster the sampler reads from.
//!
//! A `Raster` stores `width * height` pixels as row-major RGBA bytes,
//! which is the layout both browser `ImageData` and `image::RgbaImage`
//! hand over, so hosts can pass their buffers through unchanged.

use crate::error::PortraitError;

/// Alpha above which a pixel counts as visible.
pub const VISIBLE_ALPHA: u8 = 128;

/// A row-major RGBA8 pixel buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct Raster {
    width: usize,
    height: usize,
    data: Vec<u8>,
}

/// Checks dimensions and returns the byte length `width * height * 4`.
fn byte_len(width: usize, height: usize) -> Result<usize, PortraitError> {
    if width == 0 || height == 0 {
        return Err(PortraitError::InvalidDimensions);
    }
    width
        .checked_mul(height)
        .and_then(|n| n.checked_mul(4))
        .ok_or(PortraitError::InvalidDimensions)
}

impl Raster {
    /// Creates a raster filled with one RGBA color.
    pub fn filled(width: usize, height: usize, rgba: [u8; 4]) -> Result<Self, PortraitError> {
        let len = byte_len(width, height)?;
        let data = rgba.iter().copied().cycle().take(len).collect();
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Wraps an existing RGBA buffer, checking its length against the dimensions.
    pub fn from_rgba(width: usize, height: usize, data: Vec<u8>) -> Result<Self, PortraitError> {
        let expected = byte_len(width, height)?;
        if data.len() != expected {
            return Err(PortraitError::DimensionMismatch {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Raw RGBA bytes.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// RGBA of the pixel at `(x, y)`, or `None` outside the raster.
    pub fn pixel(&self, x: usize, y: usize) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = (y * self.width + x) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Overwrites the pixel at `(x, y)`; out-of-range writes are ignored.
    pub fn set_pixel(&mut self, x: usize, y: usize, rgba: [u8; 4]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let i = (y * self.width + x) * 4;
        self.data[i..i + 4].copy_from_slice(&rgba);
    }

    /// Iterates `(x, y, rgba)` in row-major order.
    pub fn pixels(&self) -> impl Iterator<Item = (usize, usize, [u8; 4])> + '_ {
        let w = self.width;
        self.data.chunks_exact(4).enumerate().map(move |(i, px)| {
            (i % w, i / w, [px[0], px[1], px[2], px[3]])
        })
    }

    /// Number of pixels whose alpha exceeds [`VISIBLE_ALPHA`].
    pub fn visible_count(&self) -> usize {
        self.data
            .chunks_exact(4)
            .filter(|px| px[3] > VISIBLE_ALPHA)
            .count()
    }
}
