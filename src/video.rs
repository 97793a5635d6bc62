//! Video device collaborator: mode metadata, physical mapping, mode set.
//!
//! The real firmware/mapping services live outside this crate; everything
//! here talks to them through [`VideoDevice`] and [`VideoMemory`].

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use crate::error::DeviceError;

/// Reference resolution all default positions and sprite sizes are
/// expressed in (mode 0x14C).
pub const REFERENCE_WIDTH: i32 = 1152;
pub const REFERENCE_HEIGHT: i32 = 864;

const PHYS_BASE: u32 = 0xE000_0000;

/// A VBE mode number.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Deserialize)]
#[serde(try_from = "u16")]
pub struct ModeId(u16);

impl ModeId {
    pub const M640X480: ModeId = ModeId(0x110);
    pub const M800X600: ModeId = ModeId(0x115);
    pub const M1280X1024: ModeId = ModeId(0x11A);
    pub const M1152X864: ModeId = ModeId(0x14C);

    /// Every mode the resolution screen offers, in on-screen order.
    pub const SUPPORTED: [ModeId; 4] = [
        ModeId::M640X480,
        ModeId::M800X600,
        ModeId::M1280X1024,
        ModeId::M1152X864,
    ];

    pub fn raw(self) -> u16 {
        self.0
    }
}

impl TryFrom<u16> for ModeId {
    type Error = String;

    fn try_from(raw: u16) -> Result<Self, Self::Error> {
        ModeId::SUPPORTED
            .into_iter()
            .find(|m| m.0 == raw)
            .ok_or_else(|| format!("unsupported video mode {raw:#x}"))
    }
}

impl fmt::Display for ModeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#05x}", self.0)
    }
}

/// Mode metadata as reported by the firmware. Immutable once queried.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct VideoMode {
    pub id: ModeId,
    pub x_resolution: u32,
    pub y_resolution: u32,
    pub bits_per_pixel: u8,
    pub phys_base: u32,
}

impl VideoMode {
    /// Static description of a supported mode.
    pub fn describe(id: ModeId) -> VideoMode {
        let (x_resolution, y_resolution, bits_per_pixel) = match id.0 {
            0x110 => (640, 480, 15),
            0x115 => (800, 600, 24),
            0x11A => (1280, 1024, 16),
            _ => (1152, 864, 32),
        };
        VideoMode {
            id,
            x_resolution,
            y_resolution,
            bits_per_pixel,
            phys_base: PHYS_BASE,
        }
    }

    pub fn bytes_per_pixel(&self) -> usize {
        (self.bits_per_pixel as usize + 7) / 8
    }

    pub fn frame_len(&self) -> usize {
        self.x_resolution as usize * self.y_resolution as usize * self.bytes_per_pixel()
    }

    pub fn width(&self) -> i32 {
        self.x_resolution as i32
    }

    pub fn height(&self) -> i32 {
        self.y_resolution as i32
    }

    /// Convert a horizontal length from the reference resolution.
    pub fn scale_x(&self, v: i32) -> i32 {
        v * self.width() / REFERENCE_WIDTH
    }

    /// Convert a vertical length from the reference resolution.
    pub fn scale_y(&self, v: i32) -> i32 {
        v * self.height() / REFERENCE_HEIGHT
    }
}

/// A mapped region of physical video memory.
pub trait VideoMemory {
    fn as_bytes(&self) -> &[u8];
    fn as_bytes_mut(&mut self) -> &mut [u8];

    /// Called after a complete frame has been copied in.
    fn flush(&mut self) -> Result<(), DeviceError> {
        Ok(())
    }

    fn len(&self) -> usize {
        self.as_bytes().len()
    }
}

pub trait VideoDevice {
    fn mode_info(&mut self, mode: ModeId) -> Result<VideoMode, DeviceError>;

    /// Grant and map `size` bytes of physical memory at `base`.
    fn map_memory(&mut self, base: u32, size: usize) -> Result<Box<dyn VideoMemory>, DeviceError>;

    fn set_mode(&mut self, mode: ModeId) -> Result<(), DeviceError>;

    /// Leave graphics mode.
    fn exit(&mut self) -> Result<(), DeviceError>;
}

// ── Headless device ──────────────────────────────────────────────────────────

/// Counts live headless mappings, and the most ever live at once.
#[derive(Clone, Debug, Default)]
pub struct MappingTracker {
    live: Arc<AtomicUsize>,
    peak: Arc<AtomicUsize>,
}

impl MappingTracker {
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    pub fn peak(&self) -> usize {
        self.peak.load(Ordering::SeqCst)
    }

    fn acquire(&self) {
        let now = self.live.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
    }

    fn release(&self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Plain RAM standing in for video memory. Unmapped on drop.
#[derive(Debug)]
pub struct RamMemory {
    bytes: Vec<u8>,
    tracker: MappingTracker,
}

impl RamMemory {
    fn new(size: usize, tracker: MappingTracker) -> Self {
        tracker.acquire();
        RamMemory {
            bytes: vec![0; size],
            tracker,
        }
    }
}

impl Drop for RamMemory {
    fn drop(&mut self) {
        self.tracker.release();
    }
}

impl VideoMemory for RamMemory {
    fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    fn as_bytes_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

/// In-memory video device. Frames land in RAM and are never shown.
#[derive(Debug, Default)]
pub struct HeadlessDevice {
    pub current: Option<ModeId>,
    /// Refuse every memory grant, like a process without the privilege.
    pub refuse_grants: bool,
    /// Grants handed out so far.
    pub mappings: usize,
    pub exits: usize,
    pub tracker: MappingTracker,
}

impl HeadlessDevice {
    pub fn new() -> Self {
        Self::default()
    }
}

impl VideoDevice for HeadlessDevice {
    fn mode_info(&mut self, mode: ModeId) -> Result<VideoMode, DeviceError> {
        Ok(VideoMode::describe(mode))
    }

    fn map_memory(&mut self, base: u32, size: usize) -> Result<Box<dyn VideoMemory>, DeviceError> {
        if self.refuse_grants {
            return Err(DeviceError::GrantRefused { base, size });
        }
        self.mappings += 1;
        debug!(base, size, live = self.tracker.live() + 1, "mapped headless video memory");
        Ok(Box::new(RamMemory::new(size, self.tracker.clone())))
    }

    fn set_mode(&mut self, mode: ModeId) -> Result<(), DeviceError> {
        self.current = Some(mode);
        Ok(())
    }

    fn exit(&mut self) -> Result<(), DeviceError> {
        self.current = None;
        self.exits += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn frame_len_rounds_bits_up_to_bytes() {
        assert_eq!(VideoMode::describe(ModeId::M640X480).frame_len(), 640 * 480 * 2);
        assert_eq!(VideoMode::describe(ModeId::M800X600).frame_len(), 800 * 600 * 3);
        assert_eq!(VideoMode::describe(ModeId::M1152X864).frame_len(), 1152 * 864 * 4);
    }

    #[test]
    fn mode_id_rejects_unknown_numbers() {
        assert!(ModeId::try_from(0x105).is_err());
        assert_eq!(ModeId::try_from(0x11A).unwrap(), ModeId::M1280X1024);
    }

    #[test]
    fn dropping_headless_memory_unmaps_it() {
        let mut device = HeadlessDevice::new();
        let first = device.map_memory(PHYS_BASE, 16).unwrap();
        let second = device.map_memory(PHYS_BASE, 16).unwrap();
        assert_eq!(device.tracker.live(), 2);
        drop(first);
        drop(second);
        assert_eq!(device.tracker.live(), 0);
        assert_eq!(device.tracker.peak(), 2);
        assert_eq!(device.mappings, 2);
    }
}
