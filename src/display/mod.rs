//! Rendering layer: every screen is painted into the back buffer here.
//!
//! Each function receives the framebuffer and an immutable view of the
//! state it draws. No game logic happens in this module; it only turns
//! state into pixels. Committing the frame is left to the caller.

mod font;

use crate::entities::{GameRound, PointerCursor, Rect, Score};
use crate::framebuffer::FrameBuffer;
use crate::scores::ScoreEntry;
use crate::sprite::{SpriteBank, SpriteId};
use crate::state::{back_button, resolution_options, MenuButton};
use crate::video::VideoMode;

pub use font::{draw_text, text_width};

// ── Colour palette ────────────────────────────────────────────────────────────

const C_BACKDROP: u32 = 0x101830;
const C_SKY: u32 = 0x1C2541;
const C_GROUND: u32 = 0x4E342E;
const C_GRASS: u32 = 0x558B2F;
const C_BUTTON: u32 = 0x3A506B;
const C_BUTTON_EDGE: u32 = 0x5BC0BE;
const C_TITLE: u32 = 0xFFD966;
const C_TEXT: u32 = 0xFFFFFF;
const C_HINT: u32 = 0x9E9E9E;
const C_SCORE: u32 = 0xFFD966;
const C_GAME_OVER: u32 = 0xE06666;

// ── Helpers ──────────────────────────────────────────────────────────────────

/// Glyph scale that keeps text readable at every supported resolution.
fn text_scale(mode: &VideoMode) -> i32 {
    (mode.height() / 120).max(1)
}

fn centered_text(fb: &mut FrameBuffer, text: &str, y: i32, scale: i32, rgb: u32) {
    let x = (fb.mode().width() - text_width(text, scale)) / 2;
    draw_text(fb, text, x, y, scale, rgb);
}

/// Filled box with a two-pixel outline and a centred label.
fn draw_button(fb: &mut FrameBuffer, area: Rect, label: &str, scale: i32) {
    fb.fill_rect(area.x, area.y, area.width, area.height, C_BUTTON_EDGE);
    fb.fill_rect(area.x + 2, area.y + 2, area.width - 4, area.height - 4, C_BUTTON);

    let label_x = area.x + (area.width - text_width(label, scale)) / 2;
    let label_y = area.y + (area.height - font::GLYPH_HEIGHT * scale) / 2;
    draw_text(fb, label, label_x, label_y, scale, C_TEXT);
}

fn draw_back_button(fb: &mut FrameBuffer) {
    let mode = *fb.mode();
    draw_button(fb, back_button(&mode), "BACK", text_scale(&mode));
}

// ── Menus ────────────────────────────────────────────────────────────────────

pub fn render_resolution_select(fb: &mut FrameBuffer) {
    let mode = *fb.mode();
    let scale = text_scale(&mode);
    fb.fill(C_BACKDROP);

    centered_text(fb, "CHOOSE RESOLUTION", mode.height() / 10, scale * 2, C_TITLE);
    for (id, area) in resolution_options(&mode) {
        let option = VideoMode::describe(id);
        let label = format!("{}X{}", option.x_resolution, option.y_resolution);
        draw_button(fb, area, &label, scale);
    }
}

pub fn render_menu(fb: &mut FrameBuffer) {
    let mode = *fb.mode();
    let scale = text_scale(&mode);
    fb.fill(C_BACKDROP);

    centered_text(fb, "SHOOTER", mode.height() / 10, scale * 3, C_TITLE);
    for button in MenuButton::ALL {
        let label = match button {
            MenuButton::Play => "PLAY",
            MenuButton::Leaderboard => "LEADERBOARD",
            MenuButton::Exit => "EXIT",
        };
        draw_button(fb, button.region(&mode), label, scale);
    }
}

/// Controls shown for the first seconds of a round.
pub fn render_instructions(fb: &mut FrameBuffer) {
    let mode = *fb.mode();
    let scale = text_scale(&mode);
    fb.fill(C_BACKDROP);

    centered_text(fb, "HOW TO PLAY", mode.height() / 6, scale * 2, C_TITLE);
    let lines = ["A D - MOVE", "W - JUMP", "CLICK - SHOOT", "ESC - QUIT"];
    let step = font::GLYPH_HEIGHT * scale * 2;
    for (i, line) in lines.iter().enumerate() {
        centered_text(fb, line, mode.height() / 3 + i as i32 * step, scale, C_TEXT);
    }
}

// ── Gameplay ─────────────────────────────────────────────────────────────────

fn draw_hud(fb: &mut FrameBuffer, sprites: &SpriteBank, round: &GameRound) {
    let mode = *fb.mode();
    let scale = text_scale(&mode);
    let margin = mode.width() / 80;

    let (heart_w, _) = sprites.size(SpriteId::Heart);
    for pip in 0..round.player.health.max(0) {
        sprites.draw(fb, SpriteId::Heart, margin + pip * (heart_w + margin / 2), margin);
    }

    let points = round.score.points.to_string();
    let x = mode.width() - margin - text_width(&points, scale * 2);
    draw_text(fb, &points, x, margin, scale * 2, C_SCORE);

    let multiplier = format!("X{:.1}", round.score.multiplier);
    let x = mode.width() - margin - text_width(&multiplier, scale);
    let y = margin + font::GLYPH_HEIGHT * scale * 2 + margin / 2;
    draw_text(fb, &multiplier, x, y, scale, C_TEXT);
}

/// Background, ground, enemies, bullets, player, then the HUD on top.
pub fn render_game(fb: &mut FrameBuffer, sprites: &SpriteBank, round: &GameRound) {
    if round.splash_ticks > 0 {
        render_instructions(fb);
        return;
    }

    let floor = round.ground_y + round.player.height;
    fb.fill(C_SKY);
    fb.fill_rect(0, floor, round.width, round.height - floor, C_GROUND);
    fb.fill_rect(0, floor, round.width, (round.height / 100).max(2), C_GRASS);

    for (_, enemy) in round.ground.iter_alive().chain(round.flying.iter_alive()) {
        sprites.draw(fb, enemy.sprite, enemy.x, enemy.y);
    }

    let (bullet_w, bullet_h) = sprites.size(SpriteId::Bullet);
    for bullet in round.bullets.iter() {
        let (x, y) = bullet.position();
        sprites.draw(fb, bullet.sprite, x - bullet_w / 2, y - bullet_h / 2);
    }

    // Blink while invulnerable.
    let player = &round.player;
    if player.invulnerable_ticks / 3 % 2 == 0 {
        sprites.draw(fb, player.sprite, player.x, player.y);
    }

    draw_hud(fb, sprites, round);
}

// ── Score screens ────────────────────────────────────────────────────────────

pub fn render_leaderboard(fb: &mut FrameBuffer, entries: &[ScoreEntry]) {
    let mode = *fb.mode();
    let scale = text_scale(&mode);
    fb.fill(C_BACKDROP);

    centered_text(fb, "LEADERBOARD", mode.height() / 10, scale * 2, C_TITLE);

    let row_height = font::GLYPH_HEIGHT * scale * 2;
    let top = mode.height() / 4;
    if entries.is_empty() {
        centered_text(fb, "NO SCORES YET", top, scale, C_HINT);
    }
    for (rank, entry) in entries.iter().enumerate() {
        let line = format!("{}. {:<8} {:>6}", rank + 1, entry.name, entry.points);
        centered_text(fb, &line, top + rank as i32 * row_height, scale, C_TEXT);
    }

    draw_back_button(fb);
}

/// Game over screen with the name being typed for the leaderboard.
pub fn render_scoreboard(fb: &mut FrameBuffer, score: &Score, name: &str, saved: bool) {
    let mode = *fb.mode();
    let scale = text_scale(&mode);
    fb.fill(C_BACKDROP);

    centered_text(fb, "GAME OVER", mode.height() / 10, scale * 3, C_GAME_OVER);

    let row_height = font::GLYPH_HEIGHT * scale * 3;
    let top = mode.height() / 3;
    centered_text(fb, &format!("SCORE {}", score.points), top, scale * 2, C_SCORE);
    centered_text(fb, &format!("NAME {name}_"), top + row_height, scale, C_TEXT);

    let hint = if saved { "SAVED" } else { "TYPE NAME - ENTER TO SAVE" };
    centered_text(fb, hint, top + row_height * 2, scale, C_HINT);

    draw_back_button(fb);
}

// ── Pointer ──────────────────────────────────────────────────────────────────

/// Drawn last so it stays above everything else.
pub fn draw_cursor(fb: &mut FrameBuffer, sprites: &SpriteBank, cursor: &PointerCursor) {
    sprites.draw(fb, cursor.sprite, cursor.x, cursor.y);
}
