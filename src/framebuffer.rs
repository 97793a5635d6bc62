//! Double-buffered framebuffer.
//!
//! All drawing goes into an off-screen back buffer in the mode's native
//! pixel encoding. [`FrameBuffer::commit_frame`] is the only place a frame
//! reaches video memory, so the display never sees a half-drawn frame.

use tracing::{debug, info};

use crate::error::{AllocationError, DeviceError, Result};
use crate::video::{ModeId, VideoDevice, VideoMemory, VideoMode};

/// Sprite background colours. Pixels of these exact RGB values are never
/// written.
pub const DEFAULT_COLOR_KEY: [u32; 8] = [
    0xAFFFFF, 0xB1FFFF, 0xB9FBFB, 0x9ADDDD, 0x080707, 0x282727, 0xA6F1F1, 0xA3ECEC,
];

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColorKey(Vec<u32>);

impl ColorKey {
    pub fn new(colors: impl IntoIterator<Item = u32>) -> Self {
        ColorKey(colors.into_iter().map(|c| c & 0xFF_FFFF).collect())
    }

    pub fn contains(&self, rgb: u32) -> bool {
        self.0.contains(&(rgb & 0xFF_FFFF))
    }
}

impl Default for ColorKey {
    fn default() -> Self {
        ColorKey::new(DEFAULT_COLOR_KEY)
    }
}

// ── Pixel encoding ───────────────────────────────────────────────────────────

/// RGB888 to the native value for `bits_per_pixel`.
pub fn encode(bits_per_pixel: u8, rgb: u32) -> u32 {
    let red = (rgb >> 16) & 0xFF;
    let green = (rgb >> 8) & 0xFF;
    let blue = rgb & 0xFF;

    match bits_per_pixel {
        15 => ((red >> 3) << 10) | ((green >> 3) << 5) | (blue >> 3),
        16 => ((red >> 3) << 11) | ((green >> 2) << 5) | (blue >> 3),
        24 | 32 => (red << 16) | (green << 8) | blue,
        _ => 0,
    }
}

/// Native value back to RGB888, replicating high bits into the truncated
/// low bits.
pub fn decode(bits_per_pixel: u8, native: u32) -> u32 {
    fn widen(value: u32, bits: u32) -> u32 {
        (value << (8 - bits)) | (value >> (2 * bits - 8))
    }

    let (red, green, blue) = match bits_per_pixel {
        15 => (
            widen((native >> 10) & 0x1F, 5),
            widen((native >> 5) & 0x1F, 5),
            widen(native & 0x1F, 5),
        ),
        16 => (
            widen((native >> 11) & 0x1F, 5),
            widen((native >> 5) & 0x3F, 6),
            widen(native & 0x1F, 5),
        ),
        24 | 32 => ((native >> 16) & 0xFF, (native >> 8) & 0xFF, native & 0xFF),
        _ => (0, 0, 0),
    };
    (red << 16) | (green << 8) | blue
}

// ── Frame buffer ─────────────────────────────────────────────────────────────

pub struct FrameBuffer {
    mode: VideoMode,
    memory: Option<Box<dyn VideoMemory>>,
    back: Vec<u8>,
    color_key: ColorKey,
}

impl FrameBuffer {
    /// Query the mode, map its video memory, allocate a zeroed back buffer
    /// of the same size and switch the device into the mode.
    ///
    /// Any refusal is fatal: video memory is a single system resource and
    /// there is nothing sensible to retry.
    pub fn initialize(device: &mut dyn VideoDevice, id: ModeId, color_key: ColorKey) -> Result<Self> {
        let mode = device.mode_info(id)?;
        let size = mode.frame_len();

        let memory = device.map_memory(mode.phys_base, size)?;
        if memory.len() != size {
            return Err(DeviceError::MappingSize {
                expected: size,
                mapped: memory.len(),
            }
            .into());
        }

        let mut back = Vec::new();
        back.try_reserve_exact(size)
            .map_err(|_| AllocationError { size })?;
        back.resize(size, 0);

        device.set_mode(id)?;
        info!(
            mode = %id,
            width = mode.x_resolution,
            height = mode.y_resolution,
            bpp = mode.bits_per_pixel,
            "framebuffer ready"
        );

        Ok(FrameBuffer {
            mode,
            memory: Some(memory),
            back,
            color_key,
        })
    }

    pub fn mode(&self) -> &VideoMode {
        &self.mode
    }

    pub fn color_key(&self) -> &ColorKey {
        &self.color_key
    }

    pub fn is_live(&self) -> bool {
        self.memory.is_some()
    }

    fn offset(&self, x: i32, y: i32) -> Option<usize> {
        if !self.is_live() || x < 0 || y < 0 || x >= self.mode.width() || y >= self.mode.height() {
            return None;
        }
        let index = self.mode.x_resolution as usize * y as usize + x as usize;
        Some(index * self.mode.bytes_per_pixel())
    }

    /// Off-screen coordinates and colour-key colours are silently skipped.
    pub fn write_pixel(&mut self, x: i32, y: i32, rgb: u32) {
        if self.color_key.contains(rgb) {
            return;
        }
        let Some(at) = self.offset(x, y) else {
            return;
        };
        let bpp = self.mode.bytes_per_pixel();
        let native = encode(self.mode.bits_per_pixel, rgb & 0xFF_FFFF).to_le_bytes();
        self.back[at..at + bpp].copy_from_slice(&native[..bpp]);
    }

    /// Fill a rectangle, clipped to the screen.
    pub fn fill_rect(&mut self, x: i32, y: i32, width: i32, height: i32, rgb: u32) {
        if !self.is_live() || self.color_key.contains(rgb) {
            return;
        }
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = (x + width).min(self.mode.width());
        let y1 = (y + height).min(self.mode.height());
        if x0 >= x1 || y0 >= y1 {
            return;
        }

        let bpp = self.mode.bytes_per_pixel();
        let native = encode(self.mode.bits_per_pixel, rgb & 0xFF_FFFF).to_le_bytes();
        let stride = self.mode.x_resolution as usize * bpp;
        for row in y0 as usize..y1 as usize {
            let start = row * stride + x0 as usize * bpp;
            let end = row * stride + x1 as usize * bpp;
            for px in self.back[start..end].chunks_exact_mut(bpp) {
                px.copy_from_slice(&native[..bpp]);
            }
        }
    }

    pub fn fill(&mut self, rgb: u32) {
        self.fill_rect(0, 0, self.mode.width(), self.mode.height(), rgb);
    }

    /// Native pixel value in the back buffer.
    pub fn pixel_at(&self, x: i32, y: i32) -> Option<u32> {
        let at = self.offset(x, y)?;
        let mut raw = [0u8; 4];
        let bpp = self.mode.bytes_per_pixel();
        raw[..bpp].copy_from_slice(&self.back[at..at + bpp]);
        Some(u32::from_le_bytes(raw))
    }

    pub fn back_buffer(&self) -> &[u8] {
        &self.back
    }

    pub fn video_memory(&self) -> Option<&[u8]> {
        self.memory.as_deref().map(|m| m.as_bytes())
    }

    /// Copy the whole back buffer into video memory in one operation.
    pub fn commit_frame(&mut self) -> std::result::Result<(), DeviceError> {
        if let Some(memory) = self.memory.as_mut() {
            memory.as_bytes_mut().copy_from_slice(&self.back);
            memory.flush()?;
        }
        Ok(())
    }

    /// Release the back buffer and unmap video memory. Safe to call twice.
    pub fn teardown(&mut self) {
        if self.memory.take().is_some() {
            debug!(mode = %self.mode.id, "framebuffer released");
        }
        self.back = Vec::new();
    }
}

impl Drop for FrameBuffer {
    fn drop(&mut self) {
        self.teardown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_inverts_full_intensity_channels() {
        for bpp in [15, 16, 24, 32] {
            assert_eq!(decode(bpp, encode(bpp, 0xFFFFFF)), 0xFFFFFF);
            assert_eq!(decode(bpp, encode(bpp, 0x000000)), 0x000000);
        }
    }

    #[test]
    fn color_key_ignores_alpha_byte() {
        let key = ColorKey::default();
        assert!(key.contains(0xFF_AFFFFF));
        assert!(!key.contains(0x00_AFFFFE));
    }
}
