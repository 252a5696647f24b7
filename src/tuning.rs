//! Data-driven game balance
//!
//! Every knob has a default; a JSON document only needs the fields it changes.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::*;

/// Errors raised while loading tuning data
#[derive(Debug, Error)]
pub enum TuningError {
    #[error("invalid tuning json: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid tuning value `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Enemy fire parameters
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FireTuning {
    /// Frames between taking aim and the bullet leaving the brick
    pub delay_frames: i32,
    /// Run-wide cooldown at fire level 1; divided by the level
    pub cooldown_frames: f32,
    /// Per-brick, per-frame chance once the cooldown elapsed
    pub chance: f64,
    /// Bullet speed in design pixels per frame
    pub bullet_speed: f32,
}

impl Default for FireTuning {
    fn default() -> Self {
        Self {
            delay_frames: 60,
            cooldown_frames: 180.0,
            chance: 0.001,
            bullet_speed: 7.0,
        }
    }
}

/// Wind cycle distributions, in seconds and design pixels per frame
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindTuning {
    pub calm_mean: f32,
    pub calm_sigma: f32,
    pub gust_mean: f32,
    pub gust_sigma: f32,
    pub ramp_mean: f32,
    pub ramp_sigma: f32,
    pub speed_mean: f32,
    pub speed_sigma: f32,
    /// Wind streak particles per frame at speed 1
    pub particle_rate: f32,
}

impl Default for WindTuning {
    fn default() -> Self {
        Self {
            calm_mean: 20.0,
            calm_sigma: 3.0,
            gust_mean: 6.0,
            gust_sigma: 1.0,
            ramp_mean: 3.0,
            ramp_sigma: 0.5,
            speed_mean: 3.0,
            speed_sigma: 0.2,
            particle_rate: 1.0 / 30.0,
        }
    }
}

/// Game balance knobs
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    pub fps: u32,
    pub start_lives: i32,

    // === Ball ===
    pub ball_radius: f32,
    pub ball_start_speed: f32,
    pub ball_speed_gain: f32,

    // === Paddle ===
    pub paddle_size: Vec2,
    pub paddle_speed: f32,
    /// Bounce quantization levels per half-width (0 = continuous)
    pub paddle_angle_steps: u32,
    /// Largest usable hit offset, in half-widths
    pub paddle_max_offset: f32,

    // === Bricks ===
    pub grid_rows: usize,
    pub grid_cols: usize,
    pub grid_height_fraction: f32,
    pub bomb_damage: i32,
    /// Level-up once fewer live bricks than this remain
    pub level_clear_threshold: usize,

    pub fire: FireTuning,
    pub wind: WindTuning,

    /// Auto-spawn period at spawn level 0; divided by (1 + level)
    pub auto_spawn_frames: u64,
    /// Powerups offered per pick
    pub powerup_choices: usize,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            fps: FPS,
            start_lives: START_LIVES,

            ball_radius: BALL_RADIUS,
            ball_start_speed: BALL_START_SPEED,
            ball_speed_gain: BALL_SPEED_GAIN,

            paddle_size: PADDLE_SIZE,
            paddle_speed: PADDLE_SPEED,
            paddle_angle_steps: 8,
            paddle_max_offset: 0.8,

            grid_rows: GRID_ROWS,
            grid_cols: GRID_COLS,
            grid_height_fraction: GRID_HEIGHT_FRACTION,
            bomb_damage: 3,
            level_clear_threshold: 3,

            fire: FireTuning::default(),
            wind: WindTuning::default(),

            auto_spawn_frames: 60 * 60,
            powerup_choices: 3,
        }
    }
}

impl Tuning {
    /// Parse and validate tuning from JSON
    pub fn from_json(json: &str) -> Result<Self, TuningError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    pub fn to_json(&self) -> Result<String, TuningError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Reject values the simulation cannot run with
    pub fn validate(&self) -> Result<(), TuningError> {
        fn invalid(field: &'static str, reason: &str) -> Result<(), TuningError> {
            Err(TuningError::Invalid {
                field,
                reason: reason.to_string(),
            })
        }

        if self.fps == 0 {
            return invalid("fps", "must be positive");
        }
        if self.ball_radius <= 0.0 {
            return invalid("ball_radius", "must be positive");
        }
        if self.paddle_size.x <= 0.0 || self.paddle_size.y <= 0.0 {
            return invalid("paddle_size", "must be positive");
        }
        if !(0.0..=1.0).contains(&self.paddle_max_offset) {
            return invalid("paddle_max_offset", "must be within [0, 1]");
        }
        if self.grid_rows == 0 || self.grid_cols == 0 {
            return invalid("grid_rows/grid_cols", "grid must not be empty");
        }
        if !(0.0..=1.0).contains(&self.fire.chance) {
            return invalid("fire.chance", "must be a probability");
        }
        if self.fire.cooldown_frames < 0.0 {
            return invalid("fire.cooldown_frames", "must not be negative");
        }
        if self.powerup_choices == 0 {
            return invalid("powerup_choices", "must offer at least one powerup");
        }
        Ok(())
    }

    /// Convert a duration in seconds to whole frames, never below one
    pub fn frames(&self, seconds: f32) -> u64 {
        (seconds * self.fps as f32).round().max(1.0) as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(Tuning::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let tuning = Tuning::from_json(r#"{ "start_lives": 5, "wind": { "gust_mean": 4.0 } }"#)
            .unwrap();
        assert_eq!(tuning.start_lives, 5);
        assert_eq!(tuning.wind.gust_mean, 4.0);
        assert_eq!(tuning.wind.calm_mean, 20.0);
        assert_eq!(tuning.paddle_angle_steps, 8);
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let err = Tuning::from_json(r#"{ "fps": 0 }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "fps", .. }));

        let err = Tuning::from_json(r#"{ "fire": { "chance": 2.0 } }"#).unwrap_err();
        assert!(matches!(err, TuningError::Invalid { field: "fire.chance", .. }));
    }

    #[test]
    fn test_malformed_json_is_a_parse_error() {
        assert!(matches!(
            Tuning::from_json("{ not json"),
            Err(TuningError::Parse(_))
        ));
    }

    #[test]
    fn test_round_trip_through_json() {
        let tuning = Tuning::default();
        let json = tuning.to_json().unwrap();
        assert_eq!(Tuning::from_json(&json).unwrap(), tuning);
    }

    #[test]
    fn test_frames() {
        let tuning = Tuning::default();
        assert_eq!(tuning.frames(6.0), 360);
        assert_eq!(tuning.frames(0.0), 1);
        assert_eq!(tuning.frames(-2.0), 1);
    }
}
