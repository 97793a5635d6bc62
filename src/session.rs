//! The context object every handler works on.
//!
//! A [`Session`] owns the screen state, the framebuffer for the current
//! mode, the decoded sprites, the cursor, the held keys, the current round
//! and the score screens' data. Only the dispatch loop mutates it, one
//! notification at a time.

use rand::rngs::StdRng;
use tracing::{debug, info, warn};

use crate::compute::{self, StepOutcome};
use crate::config::Config;
use crate::display;
use crate::entities::{GameRound, PointerCursor, Score};
use crate::error::{DeviceError, Result};
use crate::framebuffer::FrameBuffer;
use crate::input::{self, HeldKeys, PointerPacket, SCAN_BACKSPACE, SCAN_ENTER};
use crate::scores::{ScoreEntry, ScoreStore, NAME_LEN};
use crate::sprite::{PixmapSource, SpriteBank};
use crate::state::{self, GameState};
use crate::video::{ModeId, VideoDevice, VideoMode};

pub struct Session {
    state: GameState,
    config: Config,
    device: Box<dyn VideoDevice>,
    pixmaps: Box<dyn PixmapSource>,
    store: Box<dyn ScoreStore>,
    framebuffer: FrameBuffer,
    sprites: SpriteBank,
    cursor: PointerCursor,
    keys: HeldKeys,
    round: Option<GameRound>,
    /// Score carried from the last round to the scoreboard.
    final_score: Score,
    name: String,
    saved: bool,
    leaderboard: Vec<ScoreEntry>,
    rng: StdRng,
}

fn scaled_cursor(config: &Config, mode: &VideoMode) -> PointerCursor {
    PointerCursor::new(
        mode.scale_x(config.cursor_start.0),
        mode.scale_y(config.cursor_start.1),
    )
}

impl Session {
    /// Bring the device up in the configured start mode and show the
    /// resolution screen.
    pub fn new(
        config: Config,
        mut device: Box<dyn VideoDevice>,
        mut pixmaps: Box<dyn PixmapSource>,
        store: Box<dyn ScoreStore>,
        rng: StdRng,
    ) -> Result<Self> {
        let framebuffer = FrameBuffer::initialize(device.as_mut(), config.start_mode, config.color_key())?;
        let sprites = SpriteBank::load(pixmaps.as_mut(), framebuffer.mode())?;
        let cursor = scaled_cursor(&config, framebuffer.mode());

        Ok(Session {
            state: GameState::ResolutionSelect,
            config,
            device,
            pixmaps,
            store,
            framebuffer,
            sprites,
            cursor,
            keys: HeldKeys::default(),
            round: None,
            final_score: Score::new(),
            name: String::new(),
            saved: false,
            leaderboard: Vec::new(),
            rng,
        })
    }

    // ── Accessors ────────────────────────────────────────────────────────────

    pub fn state(&self) -> GameState {
        self.state
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn mode(&self) -> &VideoMode {
        self.framebuffer.mode()
    }

    pub fn framebuffer(&self) -> &FrameBuffer {
        &self.framebuffer
    }

    pub fn cursor(&self) -> &PointerCursor {
        &self.cursor
    }

    pub fn keys(&self) -> HeldKeys {
        self.keys
    }

    pub fn round(&self) -> Option<&GameRound> {
        self.round.as_ref()
    }

    pub fn round_mut(&mut self) -> Option<&mut GameRound> {
        self.round.as_mut()
    }

    pub fn final_score(&self) -> &Score {
        &self.final_score
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn leaderboard(&self) -> &[ScoreEntry] {
        &self.leaderboard
    }

    // ── Transitions ──────────────────────────────────────────────────────────

    /// Switch screens and run the entry work of the new one.
    pub fn transition(&mut self, next: GameState) {
        if next == self.state {
            return;
        }
        info!(from = %self.state, to = %next, "state transition");
        self.state = next;

        match next {
            GameState::Game => self.start_round(),
            GameState::Leaderboard => self.load_leaderboard(),
            GameState::Scoreboard => {
                self.name.clear();
                self.saved = false;
            }
            GameState::ResolutionSelect | GameState::Menu | GameState::Exit => {}
        }
    }

    fn start_round(&mut self) {
        self.keys = HeldKeys::default();
        self.round = Some(compute::new_round(&self.config, self.framebuffer.mode(), &self.sprites));
    }

    fn load_leaderboard(&mut self) {
        self.leaderboard = match self.store.top(self.config.leaderboard_size) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "could not read leaderboard");
                Vec::new()
            }
        };
    }

    /// Drop the current mode's buffers and bring up `id`, rescaling every
    /// sprite and the cursor. The round is discarded.
    pub fn change_mode(&mut self, id: ModeId) -> Result<()> {
        info!(from = %self.framebuffer.mode().id, to = %id, "changing video mode");
        self.framebuffer.teardown();
        self.device.exit()?;

        self.framebuffer = FrameBuffer::initialize(self.device.as_mut(), id, self.config.color_key())?;
        self.sprites = SpriteBank::load(self.pixmaps.as_mut(), self.framebuffer.mode())?;
        self.cursor = scaled_cursor(&self.config, self.framebuffer.mode());
        self.round = None;
        Ok(())
    }

    /// Release the framebuffer and leave graphics mode.
    pub fn shutdown(&mut self) -> std::result::Result<(), DeviceError> {
        if !self.framebuffer.is_live() {
            return Ok(());
        }
        self.framebuffer.teardown();
        self.device.exit()
    }

    // ── Timer work ───────────────────────────────────────────────────────────

    pub fn render_resolution_select(&mut self) {
        display::render_resolution_select(&mut self.framebuffer);
    }

    pub fn render_menu(&mut self) {
        display::render_menu(&mut self.framebuffer);
    }

    pub fn render_leaderboard(&mut self) {
        display::render_leaderboard(&mut self.framebuffer, &self.leaderboard);
    }

    pub fn render_scoreboard(&mut self) {
        display::render_scoreboard(&mut self.framebuffer, &self.final_score, &self.name, self.saved);
    }

    /// Advance the round one tick and paint it. A player going down moves
    /// the session to the scoreboard.
    pub fn step_game(&mut self) -> StepOutcome {
        let Some(round) = self.round.as_mut() else {
            return StepOutcome::Over;
        };

        let outcome = compute::step(round, self.keys, &self.config, &mut self.rng);
        display::render_game(&mut self.framebuffer, &self.sprites, round);

        if outcome == StepOutcome::PlayerDown {
            self.final_score = round.score;
            self.transition(GameState::Scoreboard);
        }
        outcome
    }

    /// Cursor on top, then make the frame visible.
    pub fn present(&mut self) -> std::result::Result<(), DeviceError> {
        display::draw_cursor(&mut self.framebuffer, &self.sprites, &self.cursor);
        self.framebuffer.commit_frame()
    }

    // ── Keyboard work ────────────────────────────────────────────────────────

    pub fn track_keys(&mut self, scancode: u8) {
        self.keys.apply(scancode);
    }

    /// Letters append, backspace deletes, Enter saves once.
    pub fn edit_name(&mut self, scancode: u8) {
        match scancode {
            SCAN_BACKSPACE => {
                self.name.pop();
            }
            SCAN_ENTER => self.save_score(),
            code => {
                if let Some(ch) = input::letter(code) {
                    if self.name.chars().count() < NAME_LEN {
                        self.name.push(ch);
                    }
                }
            }
        }
    }

    fn save_score(&mut self) {
        if self.saved {
            return;
        }
        let entry = ScoreEntry::new(&self.name, self.final_score.points);
        let name = entry.name.clone();
        match self.store.append(entry) {
            Ok(()) => {
                info!(name = %name, points = self.final_score.points, "score saved");
                self.saved = true;
            }
            Err(e) => warn!(error = %e, "could not save score"),
        }
    }

    // ── Pointer work ─────────────────────────────────────────────────────────

    /// Move the cursor by one packet, clamped to the screen. Returns whether
    /// the left button went down with this packet.
    pub fn move_pointer(&mut self, packet: PointerPacket) -> bool {
        let mode = *self.framebuffer.mode();
        let cursor = &mut self.cursor;
        cursor.x = (cursor.x + packet.dx as i32).clamp(0, mode.width() - 1);
        cursor.y = (cursor.y - packet.dy as i32).clamp(0, mode.height() - 1);

        let pressed = packet.left && !cursor.left_down;
        cursor.left_down = packet.left;
        pressed
    }

    pub fn pick_resolution(&mut self) -> Result<()> {
        let mode = *self.framebuffer.mode();
        if let Some(id) = state::pick_resolution(&mode, self.cursor.x, self.cursor.y) {
            self.change_mode(id)?;
            self.transition(GameState::Game);
        }
        Ok(())
    }

    pub fn pick_menu(&mut self) {
        let mode = *self.framebuffer.mode();
        if let Some(button) = state::pick_menu(&mode, self.cursor.x, self.cursor.y) {
            debug!(?button, "menu click");
            self.transition(button.target());
        }
    }

    pub fn back_to_menu(&mut self) {
        let mode = *self.framebuffer.mode();
        if !state::back_button(&mode).contains(self.cursor.x, self.cursor.y) {
            return;
        }
        if self.state == GameState::Scoreboard {
            self.final_score = Score::new();
            self.round = None;
        }
        self.transition(GameState::Menu);
    }

    /// Shoot toward the cursor while the left button is held.
    pub fn fire(&mut self) -> bool {
        if !self.cursor.left_down {
            return false;
        }
        let (x, y) = (self.cursor.x, self.cursor.y);
        match self.round.as_mut() {
            Some(round) => compute::fire(round, &self.config, x, y),
            None => false,
        }
    }
}
