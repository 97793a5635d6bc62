//! Per-tick game logic for the GAME screen.
//!
//! Everything here mutates the round in place and finishes within the
//! tick it was called for. Randomness only comes from the injected RNG,
//! so tests can seed it.

use rand::Rng;
use tracing::{debug, info};

use crate::bullets::BulletList;
use crate::config::Config;
use crate::entities::{Enemy, EnemyKind, GameRound, Player, Rect, Score, Speeds};
use crate::input::HeldKeys;
use crate::pool::EnemyPool;
use crate::sprite::{SpriteBank, SpriteId};
use crate::video::VideoMode;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepOutcome {
    /// Instructions are still up; nothing moved.
    Splash,
    Running,
    /// The player's health reached zero on this tick.
    PlayerDown,
    /// The round already ended on an earlier tick.
    Over,
}

// ── Constructors ─────────────────────────────────────────────────────────────

/// Build a fresh round scaled to `mode`.
pub fn new_round(config: &Config, mode: &VideoMode, sprites: &SpriteBank) -> GameRound {
    let (pw, ph) = sprites.size(SpriteId::Player);
    let player = Player {
        health: config.player_health,
        damage: config.player_damage,
        x: mode.scale_x(config.player_start.0),
        y: mode.scale_y(config.player_start.1),
        width: pw,
        height: ph,
        sprite: SpriteId::Player,
        vertical_speed: 0,
        invulnerable_ticks: 0,
    };

    let ground = EnemyPool::new(
        Enemy::template(
            EnemyKind::Ground,
            config.enemy_health,
            config.enemy_damage,
            sprites.size(SpriteId::GroundEnemy),
        ),
        config.ground_pool,
    );
    let flying = EnemyPool::new(
        Enemy::template(
            EnemyKind::Flying,
            config.enemy_health,
            config.enemy_damage,
            sprites.size(SpriteId::FlyingEnemy),
        ),
        config.flying_pool,
    );

    let scale = mode.height() as f32 / crate::video::REFERENCE_HEIGHT as f32;
    let speeds = Speeds {
        player: mode.scale_x(config.player_speed).max(1),
        jump: mode.scale_y(config.jump_speed).max(1),
        gravity: mode.scale_y(config.gravity).max(1),
        enemy: mode.scale_x(config.enemy_speed).max(1),
        bullet: (config.bullet_speed * scale).max(1.0),
    };

    GameRound {
        ground_y: player.y,
        player,
        ground,
        flying,
        bullets: BulletList::new(),
        score: Score::new(),
        speeds,
        bullet_size: sprites.size(SpriteId::Bullet),
        width: mode.width(),
        height: mode.height(),
        ticks: 0,
        fire_cooldown: 0,
        respawn_credit: 0,
        spawn_pending: false,
        spawns: 0,
        splash_ticks: config.instructions_ticks,
        over: false,
    }
}

// ── Input-driven actions ─────────────────────────────────────────────────────

/// Shoot from the player's centre toward (`x`, `y`) unless the gun is
/// cooling down. Returns whether a bullet left.
pub fn fire(round: &mut GameRound, config: &Config, x: i32, y: i32) -> bool {
    if round.over || round.splash_ticks > 0 || round.fire_cooldown > 0 {
        return false;
    }
    round.bullets.fire(
        round.player.bounds().center(),
        (x, y),
        round.speeds.bullet,
        round.player.damage,
        SpriteId::Bullet,
    );
    round.fire_cooldown = config.fire_cooldown_ticks;
    true
}

pub fn move_player(round: &mut GameRound, keys: HeldKeys) {
    let speeds = round.speeds;
    let player = &mut round.player;

    let direction = keys.right as i32 - keys.left as i32;
    player.x = (player.x + direction * speeds.player).clamp(0, (round.width - player.width).max(0));

    let grounded = player.y >= round.ground_y && player.vertical_speed == 0;
    if keys.jump && grounded {
        player.vertical_speed = -speeds.jump;
    }
    if !grounded || player.vertical_speed != 0 {
        player.y += player.vertical_speed;
        player.vertical_speed += speeds.gravity;
    }
    if player.y >= round.ground_y {
        player.y = round.ground_y;
        player.vertical_speed = 0;
    }
    player.y = player.y.max(0);
}

// ── Per-tick pieces ──────────────────────────────────────────────────────────

fn strike(pool: &mut EnemyPool, shot: &Rect, damage: i32) -> bool {
    let hit = pool
        .iter_alive()
        .find(|(_, e)| e.bounds().overlaps(shot))
        .map(|(i, _)| i);
    match hit {
        Some(index) => {
            if pool.hurt(index, damage) {
                debug!(index, kind = ?pool.get(index).map(|e| e.kind), "enemy destroyed");
            }
            true
        }
        None => false,
    }
}

/// Move bullets, drop the ones that left the screen, then let the rest hit
/// enemies. Returns how many bullets struck something.
pub fn advance_bullets(round: &mut GameRound) -> usize {
    let playfield = round.playfield();
    let GameRound {
        bullets,
        bullet_size,
        ground,
        flying,
        ..
    } = round;

    bullets.advance(playfield);
    bullets.retain(|b| {
        let shot = b.bounds(*bullet_size);
        !(strike(ground, &shot, b.damage) || strike(flying, &shot, b.damage))
    })
}

fn edge_spawn_point(rng: &mut impl Rng, width: i32, floor: i32, template: &Enemy) -> (i32, i32) {
    let x = if rng.gen_bool(0.5) {
        0
    } else {
        (width - template.width).max(0)
    };
    (x, floor - template.height)
}

fn sky_spawn_point(rng: &mut impl Rng, width: i32, template: &Enemy) -> (i32, i32) {
    let x = rng.gen_range(0..(width - template.width).max(1));
    (x, 0)
}

/// Spawn, respawn, multiplier and score cadences.
pub fn apply_cadences(round: &mut GameRound, config: &Config, rng: &mut impl Rng) {
    let t = round.ticks;

    if t % config.spawn_every == 0 {
        round.spawn_pending = true;
    }
    if t % config.respawn_credit_every == 0 {
        round.respawn_credit += 1;
    }
    if round.respawn_credit >= config.respawn_threshold {
        let floor = round.ground_y + round.player.height;
        let width = round.width;
        let revived = round
            .ground
            .revive_dead(config.respawn_batch, |e| edge_spawn_point(&mut *rng, width, floor, e));
        debug!(revived, tick = t, "respawned dead enemies");
        round.respawn_credit = 0;
    }

    if t % config.multiplier_every == 0 {
        round.score.multiplier += config.multiplier_step;
    }
    if t % config.score_every == 0 {
        // Fractional points are dropped.
        let gained = (config.score_points as f64 * round.score.multiplier) as u32;
        round.score.points += gained;
    }
}

fn approach(from: i32, to: i32, speed: i32) -> i32 {
    from + (to - from).clamp(-speed, speed)
}

/// Consume a pending spawn, walk every live enemy toward the player and
/// apply contact damage.
pub fn update_enemies(round: &mut GameRound, config: &Config, rng: &mut impl Rng) {
    if round.spawn_pending {
        round.spawn_pending = false;
        round.spawns += 1;

        let floor = round.ground_y + round.player.height;
        let width = round.width;
        let spawned = round
            .ground
            .revive_dead(1, |e| edge_spawn_point(&mut *rng, width, floor, e));
        if spawned == 0 {
            debug!(tick = round.ticks, "ground pool full, spawn dropped");
        }
        if config.flying_every > 0 && round.spawns % config.flying_every == 0 {
            round.flying.revive_dead(1, |e| sky_spawn_point(&mut *rng, width, e));
        }
    }

    let (px, py) = round.player.bounds().center();
    let speed = round.speeds.enemy;
    for (_, enemy) in round.ground.iter_alive_mut() {
        let (ex, _) = enemy.bounds().center();
        enemy.x = approach(ex, px, speed) - enemy.width / 2;
    }
    for (_, enemy) in round.flying.iter_alive_mut() {
        let (ex, ey) = enemy.bounds().center();
        enemy.x = approach(ex, px, speed) - enemy.width / 2;
        enemy.y = approach(ey, py, speed) - enemy.height / 2;
    }

    let body = round.player.bounds();
    let contact = round
        .ground
        .iter_alive()
        .chain(round.flying.iter_alive())
        .find(|(_, e)| e.bounds().overlaps(&body))
        .map(|(_, e)| e.damage);

    if let Some(damage) = contact {
        let player = &mut round.player;
        if player.invulnerable_ticks == 0 {
            player.health -= damage;
            player.invulnerable_ticks = config.invulnerability_ticks;
            debug!(health = player.health, "player hit");
        }
    }
}

// ── Per-tick step ────────────────────────────────────────────────────────────

/// Advance the round by one timer tick.
pub fn step(round: &mut GameRound, keys: HeldKeys, config: &Config, rng: &mut impl Rng) -> StepOutcome {
    if round.over {
        return StepOutcome::Over;
    }

    round.player.invulnerable_ticks = round.player.invulnerable_ticks.saturating_sub(1);
    round.fire_cooldown = round.fire_cooldown.saturating_sub(1);

    if round.splash_ticks > 0 {
        round.splash_ticks -= 1;
        return StepOutcome::Splash;
    }
    round.ticks += 1;

    advance_bullets(round);
    move_player(round, keys);
    apply_cadences(round, config, rng);
    update_enemies(round, config, rng);

    if round.player.is_dead() {
        round.over = true;
        info!(score = round.score.points, ticks = round.ticks, "player down");
        return StepOutcome::PlayerDown;
    }
    StepOutcome::Running
}
