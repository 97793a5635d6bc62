//! Sprite compositor and the decoded pixmaps it draws.

use std::collections::HashMap;

use crate::error::AssetError;
use crate::framebuffer::FrameBuffer;
use crate::video::VideoMode;

/// Background colour the procedural sprites are painted on. It is part
/// of the default colour key, so it never reaches the screen.
pub const SPRITE_BACKGROUND: u32 = 0xAFFFFF;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpriteId {
    Player,
    GroundEnemy,
    FlyingEnemy,
    Bullet,
    Cursor,
    Heart,
}

impl SpriteId {
    pub const ALL: [SpriteId; 6] = [
        SpriteId::Player,
        SpriteId::GroundEnemy,
        SpriteId::FlyingEnemy,
        SpriteId::Bullet,
        SpriteId::Cursor,
        SpriteId::Heart,
    ];

    pub fn name(self) -> &'static str {
        match self {
            SpriteId::Player => "player",
            SpriteId::GroundEnemy => "ground_enemy",
            SpriteId::FlyingEnemy => "flying_enemy",
            SpriteId::Bullet => "bullet",
            SpriteId::Cursor => "cursor",
            SpriteId::Heart => "heart",
        }
    }

    /// Size at the 1152x864 reference resolution.
    fn reference_size(self) -> (i32, i32) {
        match self {
            SpriteId::Player => (150, 100),
            SpriteId::GroundEnemy => (90, 90),
            SpriteId::FlyingEnemy => (100, 60),
            SpriteId::Bullet => (16, 16),
            SpriteId::Cursor => (14, 20),
            SpriteId::Heart => (28, 24),
        }
    }
}

/// A decoded image, one ARGB value per pixel, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Pixmap {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl Pixmap {
    pub fn new(
        name: &'static str,
        width: usize,
        height: usize,
        pixels: Vec<u32>,
    ) -> Result<Self, AssetError> {
        if pixels.len() != width * height {
            return Err(AssetError::Malformed {
                name,
                width,
                height,
                len: pixels.len(),
            });
        }
        Ok(Pixmap {
            width,
            height,
            pixels,
        })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }
}

/// Blit `pixmap` with its top-left corner at (`x`, `y`).
///
/// Clipping and colour-key transparency are both left to
/// [`FrameBuffer::write_pixel`], so a sprite straddling the screen edge is
/// simply cut off.
pub fn draw_sprite(fb: &mut FrameBuffer, pixmap: &Pixmap, x: i32, y: i32) {
    for (row, line) in pixmap.pixels.chunks_exact(pixmap.width.max(1)).enumerate() {
        for (col, &argb) in line.iter().enumerate() {
            fb.write_pixel(x + col as i32, y + row as i32, argb & 0xFF_FFFF);
        }
    }
}

/// Asset collaborator producing decoded pixmaps for a mode.
pub trait PixmapSource {
    fn decode(&mut self, id: SpriteId, mode: &VideoMode) -> Result<Pixmap, AssetError>;
}

/// Every sprite decoded for the current mode.
#[derive(Debug, Default)]
pub struct SpriteBank {
    pixmaps: HashMap<SpriteId, Pixmap>,
}

impl SpriteBank {
    pub fn load(source: &mut dyn PixmapSource, mode: &VideoMode) -> Result<Self, AssetError> {
        let mut pixmaps = HashMap::new();
        for id in SpriteId::ALL {
            pixmaps.insert(id, source.decode(id, mode)?);
        }
        Ok(SpriteBank { pixmaps })
    }

    pub fn get(&self, id: SpriteId) -> Option<&Pixmap> {
        self.pixmaps.get(&id)
    }

    pub fn size(&self, id: SpriteId) -> (i32, i32) {
        self.get(id)
            .map(|p| (p.width as i32, p.height as i32))
            .unwrap_or((0, 0))
    }

    pub fn draw(&self, fb: &mut FrameBuffer, id: SpriteId, x: i32, y: i32) {
        if let Some(pixmap) = self.get(id) {
            draw_sprite(fb, pixmap, x, y);
        }
    }
}

// ── Procedural sprites ───────────────────────────────────────────────────────

/// Draws every sprite from simple shapes, scaled to the mode.
#[derive(Debug, Default)]
pub struct ProceduralSprites;

fn inside_ellipse(x: f32, y: f32, cx: f32, cy: f32, rx: f32, ry: f32) -> bool {
    if rx <= 0.0 || ry <= 0.0 {
        return false;
    }
    let dx = (x - cx) / rx;
    let dy = (y - cy) / ry;
    dx * dx + dy * dy <= 1.0
}

fn paint(width: usize, height: usize, shade: impl Fn(f32, f32) -> Option<u32>) -> Vec<u32> {
    let mut pixels = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            // Normalised pixel centre in [0, 1).
            let u = (col as f32 + 0.5) / width as f32;
            let v = (row as f32 + 0.5) / height as f32;
            pixels.push(0xFF00_0000 | shade(u, v).unwrap_or(SPRITE_BACKGROUND));
        }
    }
    pixels
}

impl PixmapSource for ProceduralSprites {
    fn decode(&mut self, id: SpriteId, mode: &VideoMode) -> Result<Pixmap, AssetError> {
        let (w, h) = id.reference_size();
        let width = mode.scale_x(w).max(2) as usize;
        let height = mode.scale_y(h).max(2) as usize;

        let pixels = match id {
            SpriteId::Player => paint(width, height, |u, v| {
                if inside_ellipse(u, v, 0.5, 0.22, 0.16, 0.2) {
                    Some(0xF4CCCC)
                } else if inside_ellipse(u, v, 0.5, 0.68, 0.3, 0.3) {
                    Some(0x3C78D8)
                } else {
                    None
                }
            }),
            SpriteId::GroundEnemy => paint(width, height, |u, v| {
                let eye = inside_ellipse(u, v, 0.35, 0.4, 0.08, 0.08)
                    || inside_ellipse(u, v, 0.65, 0.4, 0.08, 0.08);
                if eye {
                    Some(0xFFFFFF)
                } else if inside_ellipse(u, v, 0.5, 0.55, 0.48, 0.44) {
                    Some(0x6AA84F)
                } else {
                    None
                }
            }),
            SpriteId::FlyingEnemy => paint(width, height, |u, v| {
                if inside_ellipse(u, v, 0.5, 0.5, 0.18, 0.4) {
                    Some(0x674EA7)
                } else if inside_ellipse(u, v, 0.5, 0.45, 0.5, 0.18) {
                    Some(0x8E7CC3)
                } else {
                    None
                }
            }),
            SpriteId::Bullet => paint(width, height, |u, v| {
                inside_ellipse(u, v, 0.5, 0.5, 0.5, 0.5).then_some(0xFFD966)
            }),
            SpriteId::Cursor => paint(width, height, |u, v| {
                // Arrow pointing up-left with its tip at (0, 0).
                (u <= v * 0.8 && v <= 0.9).then_some(if u > v * 0.6 { 0x000000 } else { 0xFFFFFF })
            }),
            SpriteId::Heart => paint(width, height, |u, v| {
                let lobes = inside_ellipse(u, v, 0.3, 0.3, 0.25, 0.25)
                    || inside_ellipse(u, v, 0.7, 0.3, 0.25, 0.25);
                let point = v >= 0.3 && (u - 0.5).abs() <= (1.0 - v) * 0.7;
                (lobes || point).then_some(0xE06666)
            }),
        };

        Pixmap::new(id.name(), width, height, pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::video::ModeId;

    #[test]
    fn procedural_sprites_scale_with_resolution() {
        let small = VideoMode::describe(ModeId::M640X480);
        let reference = VideoMode::describe(ModeId::M1152X864);
        let mut source = ProceduralSprites;
        let a = source.decode(SpriteId::Player, &small).unwrap();
        let b = source.decode(SpriteId::Player, &reference).unwrap();
        assert_eq!((b.width(), b.height()), (150, 100));
        assert!(a.width() < b.width());
    }

    #[test]
    fn malformed_pixmap_is_rejected() {
        assert!(Pixmap::new("x", 2, 2, vec![0; 3]).is_err());
    }
}
