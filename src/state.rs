//! Screens, their clickable regions, and which handlers run for each
//! kind of notification on each screen.

use std::fmt;

use crate::entities::Rect;
use crate::video::{ModeId, VideoMode};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GameState {
    ResolutionSelect,
    Menu,
    Game,
    Leaderboard,
    Scoreboard,
    Exit,
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            GameState::ResolutionSelect => "resolution-select",
            GameState::Menu => "menu",
            GameState::Game => "game",
            GameState::Leaderboard => "leaderboard",
            GameState::Scoreboard => "scoreboard",
            GameState::Exit => "exit",
        };
        f.write_str(name)
    }
}

/// Which interrupt a handler is reacting to. Serviced in this order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Source {
    Timer,
    Keyboard,
    Pointer,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    RenderResolutionSelect,
    RenderMenu,
    StepGame,
    RenderLeaderboard,
    RenderScoreboard,
    Shutdown,
    TrackKeys,
    EditName,
    PickResolution,
    PickMenu,
    BackToMenu,
    Fire,
}

/// The dispatch table.
pub fn actions(source: Source, state: GameState) -> &'static [Action] {
    use Action::*;

    match (source, state) {
        (Source::Timer, GameState::ResolutionSelect) => &[RenderResolutionSelect],
        (Source::Timer, GameState::Menu) => &[RenderMenu],
        (Source::Timer, GameState::Game) => &[StepGame],
        (Source::Timer, GameState::Leaderboard) => &[RenderLeaderboard],
        (Source::Timer, GameState::Scoreboard) => &[RenderScoreboard],
        (Source::Timer, GameState::Exit) => &[Shutdown],

        (Source::Keyboard, GameState::Exit) => &[],
        (Source::Keyboard, GameState::Scoreboard) => &[EditName, TrackKeys],
        (Source::Keyboard, _) => &[TrackKeys],

        (Source::Pointer, GameState::ResolutionSelect) => &[PickResolution],
        (Source::Pointer, GameState::Menu) => &[PickMenu],
        (Source::Pointer, GameState::Game) => &[Fire],
        (Source::Pointer, GameState::Leaderboard | GameState::Scoreboard) => &[BackToMenu],
        (Source::Pointer, GameState::Exit) => &[],
    }
}

// ── Layout ───────────────────────────────────────────────────────────────────

/// Rectangle given in fractions of the screen.
fn region(mode: &VideoMode, fx: f32, fy: f32, fw: f32, fh: f32) -> Rect {
    let w = mode.width() as f32;
    let h = mode.height() as f32;
    Rect::new(
        (fx * w) as i32,
        (fy * h) as i32,
        (fw * w) as i32,
        (fh * h) as i32,
    )
}

/// The four resolution choices in a 2x2 grid, in [`ModeId::SUPPORTED`] order.
pub fn resolution_options(mode: &VideoMode) -> [(ModeId, Rect); 4] {
    let cell = |i: usize| {
        let fx = if i % 2 == 0 { 0.15 } else { 0.55 };
        let fy = if i < 2 { 0.25 } else { 0.55 };
        (ModeId::SUPPORTED[i], region(mode, fx, fy, 0.3, 0.2))
    };
    [cell(0), cell(1), cell(2), cell(3)]
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuButton {
    Play,
    Leaderboard,
    Exit,
}

impl MenuButton {
    pub const ALL: [MenuButton; 3] = [MenuButton::Play, MenuButton::Leaderboard, MenuButton::Exit];

    pub fn target(self) -> GameState {
        match self {
            MenuButton::Play => GameState::Game,
            MenuButton::Leaderboard => GameState::Leaderboard,
            MenuButton::Exit => GameState::Exit,
        }
    }

    pub fn region(self, mode: &VideoMode) -> Rect {
        let fy = match self {
            MenuButton::Play => 0.30,
            MenuButton::Leaderboard => 0.48,
            MenuButton::Exit => 0.66,
        };
        region(mode, 0.35, fy, 0.3, 0.12)
    }
}

/// "Back" on the leaderboard and scoreboard screens.
pub fn back_button(mode: &VideoMode) -> Rect {
    region(mode, 0.05, 0.85, 0.2, 0.1)
}

pub fn pick_resolution(mode: &VideoMode, x: i32, y: i32) -> Option<ModeId> {
    resolution_options(mode)
        .into_iter()
        .find(|(_, r)| r.contains(x, y))
        .map(|(id, _)| id)
}

pub fn pick_menu(mode: &VideoMode, x: i32, y: i32) -> Option<MenuButton> {
    MenuButton::ALL
        .into_iter()
        .find(|b| b.region(mode).contains(x, y))
}
