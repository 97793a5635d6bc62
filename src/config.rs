//! Tunables. Every field has a default reproducing the arcade's original
//! constants; a TOML file may override any subset.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::framebuffer::{ColorKey, DEFAULT_COLOR_KEY};
use crate::video::ModeId;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Timer interrupts per second. One tick is one frame.
    pub tick_hz: u32,
    /// Mode the resolution screen is shown in.
    pub start_mode: ModeId,
    pub color_key: Vec<u32>,

    pub player_health: i32,
    pub player_damage: i32,
    pub player_speed: i32,
    pub jump_speed: i32,
    pub gravity: i32,
    /// Default player position at the 1152x864 reference resolution.
    pub player_start: (i32, i32),
    pub cursor_start: (i32, i32),

    pub enemy_health: i32,
    pub enemy_damage: i32,
    pub enemy_speed: i32,
    pub ground_pool: usize,
    pub flying_pool: usize,
    /// Every n-th spawn also launches a flyer.
    pub flying_every: u32,

    pub bullet_speed: f32,
    pub fire_cooldown_ticks: u32,
    pub invulnerability_ticks: u32,

    pub spawn_every: u64,
    pub respawn_credit_every: u64,
    pub respawn_threshold: u32,
    pub respawn_batch: usize,
    pub score_every: u64,
    pub score_points: u32,
    pub multiplier_every: u64,
    pub multiplier_step: f64,

    /// Ticks the instructions stay up after picking a resolution.
    pub instructions_ticks: u32,
    pub leaderboard_size: usize,
}

/// Ticks per second of the original timer.
pub const ONE_SEC: u64 = 30;

impl Default for Config {
    fn default() -> Self {
        Config {
            tick_hz: ONE_SEC as u32,
            start_mode: ModeId::M640X480,
            color_key: DEFAULT_COLOR_KEY.to_vec(),

            player_health: 5,
            player_damage: 5,
            player_speed: 8,
            jump_speed: 22,
            gravity: 2,
            player_start: (400, 571),
            cursor_start: (400, 350),

            enemy_health: 5,
            enemy_damage: 1,
            enemy_speed: 2,
            ground_pool: 10,
            flying_pool: 2,
            flying_every: 3,

            bullet_speed: 12.0,
            fire_cooldown_ticks: 30,
            invulnerability_ticks: 30,

            spawn_every: ONE_SEC * 2,
            respawn_credit_every: ONE_SEC,
            respawn_threshold: 5,
            respawn_batch: 3,
            score_every: 20,
            score_points: 10,
            multiplier_every: ONE_SEC * 2,
            multiplier_step: 0.1,

            instructions_ticks: ONE_SEC as u32 * 3,
            leaderboard_size: 5,
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let cadences = [
            ("spawn_every", self.spawn_every),
            ("respawn_credit_every", self.respawn_credit_every),
            ("score_every", self.score_every),
            ("multiplier_every", self.multiplier_every),
        ];
        if let Some((name, _)) = cadences.iter().find(|(_, every)| *every == 0) {
            return Err(ConfigError::Invalid(format!("{name} must be at least 1")));
        }
        if self.tick_hz == 0 {
            return Err(ConfigError::Invalid("tick_hz must be at least 1".into()));
        }
        if self.multiplier_step < 0.0 {
            return Err(ConfigError::Invalid("multiplier_step must not be negative".into()));
        }
        Ok(())
    }

    pub fn color_key(&self) -> ColorKey {
        ColorKey::new(self.color_key.iter().copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_other_defaults() {
        let config: Config = toml::from_str("score_every = 15\nstart_mode = 0x14C\n").unwrap();
        assert_eq!(config.score_every, 15);
        assert_eq!(config.start_mode, ModeId::M1152X864);
        assert_eq!(config.ground_pool, 10);
    }

    #[test]
    fn zero_cadence_is_rejected() {
        let config = Config {
            score_every: 0,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }
}
