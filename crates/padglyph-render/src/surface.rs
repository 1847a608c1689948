//! RGBA pixel buffers

use padglyph_core::ArtError;

/// Straight-alpha RGBA, 4 bytes per pixel, rows packed top to bottom
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Surface {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Surface {
    pub const BYTES_PER_PIXEL: usize = 4;

    /// Create a fully transparent surface
    pub fn new(width: u32, height: u32) -> Result<Self, ArtError> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .and_then(|n| n.checked_mul(Self::BYTES_PER_PIXEL))
            .ok_or_else(|| {
                ArtError::InvalidArgument(format!("surface {}x{} is too large", width, height))
            })?;
        let mut pixels = Vec::new();
        pixels.try_reserve_exact(len)?;
        pixels.resize(len, 0);
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Bytes per row
    pub fn stride(&self) -> usize {
        self.width as usize * Self::BYTES_PER_PIXEL
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    fn offset(&self, x: u32, y: u32) -> Option<usize> {
        (x < self.width && y < self.height)
            .then(|| y as usize * self.stride() + x as usize * Self::BYTES_PER_PIXEL)
    }

    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        let at = self.offset(x, y)?;
        let mut rgba = [0u8; 4];
        rgba.copy_from_slice(self.pixels.get(at..at + Self::BYTES_PER_PIXEL)?);
        Some(rgba)
    }

    /// True if every pixel is fully transparent
    pub fn is_blank(&self) -> bool {
        self.pixels.chunks_exact(Self::BYTES_PER_PIXEL).all(|px| px[3] == 0)
    }

    /// Composite `color` over the pixel at `(x, y)`, scaled by `coverage` in `[0, 1]`
    pub fn blend(&mut self, x: u32, y: u32, color: [u8; 4], coverage: f32) {
        let Some(at) = self.offset(x, y) else { return };
        let src_a = f32::from(color[3]) / 255.0 * coverage.clamp(0.0, 1.0);
        if src_a <= 0.0 {
            return;
        }
        let Some(dst) = self.pixels.get_mut(at..at + Self::BYTES_PER_PIXEL) else {
            return;
        };
        let dst_a = f32::from(dst[3]) / 255.0;
        let out_a = src_a + dst_a * (1.0 - src_a);
        for i in 0..3 {
            let src_c = f32::from(color[i]);
            let dst_c = f32::from(dst[i]);
            let c = (src_c * src_a + dst_c * dst_a * (1.0 - src_a)) / out_a;
            dst[i] = c.round().clamp(0.0, 255.0) as u8;
        }
        dst[3] = (out_a * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}
