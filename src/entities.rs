//! Game entity types.

use crate::bullets::BulletList;
use crate::pool::EnemyPool;
use crate::sprite::SpriteId;

// ── Geometry ─────────────────────────────────────────────────────────────────

/// Axis-aligned box in screen pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Rect {
            x,
            y,
            width,
            height,
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    pub fn overlaps(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && other.x < self.x + self.width
            && self.y < other.y + other.height
            && other.y < self.y + self.height
    }

    pub fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }
}

// ── Player & enemies ─────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    pub health: i32,
    pub damage: i32,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub sprite: SpriteId,
    /// Vertical velocity in pixels per tick, positive is downward.
    pub vertical_speed: i32,
    /// Ticks left before enemy contact can hurt again.
    pub invulnerable_ticks: u32,
}

impl Player {
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EnemyKind {
    /// Walks along the ground line.
    Ground,
    /// Homes in on the player from above.
    Flying,
}

impl EnemyKind {
    pub fn sprite(self) -> SpriteId {
        match self {
            EnemyKind::Ground => SpriteId::GroundEnemy,
            EnemyKind::Flying => SpriteId::FlyingEnemy,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Enemy {
    pub kind: EnemyKind,
    pub health: i32,
    pub damage: i32,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub sprite: SpriteId,
    pub alive: bool,
}

impl Enemy {
    /// A dead enemy carrying the stats every spawn starts from.
    pub fn template(kind: EnemyKind, health: i32, damage: i32, size: (i32, i32)) -> Self {
        Enemy {
            kind,
            health,
            damage,
            x: 0,
            y: 0,
            width: size.0,
            height: size.1,
            sprite: kind.sprite(),
            alive: false,
        }
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }
}

// ── Projectiles ──────────────────────────────────────────────────────────────

/// A shot travelling in a straight line toward where the cursor was when
/// it was fired.
#[derive(Clone, Debug, PartialEq)]
pub struct Bullet {
    pub x: f32,
    pub y: f32,
    pub vx: f32,
    pub vy: f32,
    pub damage: i32,
    pub sprite: SpriteId,
}

impl Bullet {
    pub fn position(&self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }

    /// Box of a `size` sprite centred on the bullet.
    pub fn bounds(&self, size: (i32, i32)) -> Rect {
        let (x, y) = self.position();
        Rect::new(x - size.0 / 2, y - size.1 / 2, size.0, size.1)
    }
}

// ── Pointer ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub struct PointerCursor {
    pub x: i32,
    pub y: i32,
    pub sprite: SpriteId,
    /// Left button state from the previous packet.
    pub left_down: bool,
}

impl PointerCursor {
    pub fn new(x: i32, y: i32) -> Self {
        PointerCursor {
            x,
            y,
            sprite: SpriteId::Cursor,
            left_down: false,
        }
    }
}

// ── Score ────────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Score {
    pub points: u32,
    /// Never below 1.0.
    pub multiplier: f64,
}

impl Score {
    pub fn new() -> Self {
        Score {
            points: 0,
            multiplier: 1.0,
        }
    }
}

impl Default for Score {
    fn default() -> Self {
        Score::new()
    }
}

// ── Round state ──────────────────────────────────────────────────────────────

/// Per-tick speeds, already scaled to the current resolution.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Speeds {
    pub player: i32,
    pub jump: i32,
    pub gravity: i32,
    pub enemy: i32,
    pub bullet: f32,
}

/// Everything that lives for one round of gameplay.
#[derive(Clone, Debug)]
pub struct GameRound {
    pub player: Player,
    pub ground: EnemyPool,
    pub flying: EnemyPool,
    pub bullets: BulletList,
    pub score: Score,
    pub speeds: Speeds,
    /// Bullet sprite size at this resolution; hits use the whole box.
    pub bullet_size: (i32, i32),
    /// Playfield size in pixels.
    pub width: i32,
    pub height: i32,
    /// The player's resting y.
    pub ground_y: i32,
    /// Simulated ticks since the round started.
    pub ticks: u64,
    pub fire_cooldown: u32,
    pub respawn_credit: u32,
    /// Spawn requested by the spawn cadence this tick.
    pub spawn_pending: bool,
    pub spawns: u32,
    /// Ticks the instructions screen still has before play starts.
    pub splash_ticks: u32,
    pub over: bool,
}

impl GameRound {
    pub fn playfield(&self) -> Rect {
        Rect::new(0, 0, self.width, self.height)
    }
}
