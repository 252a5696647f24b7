//! Wind, enemy fire and ball auto-spawn
//!
//! Pure per-frame state transitions driven by an injected RNG. Wind cycles
//! through calm, a ramp up to a random goal, a windy hold and a ramp back down:
//!
//! ```text
//! Const(goal = 0) -> RampUp -> Const(goal != 0) -> RampDown -> Const(goal = 0) ...
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;
use crate::{ease, gauss};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindPhase {
    Const,
    RampUp,
    RampDown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalState {
    pub frame: u64,

    pub wind_enabled: bool,
    /// Current horizontal push, design pixels per frame
    pub wind_speed: f32,
    pub wind_speed_goal: f32,
    pub wind_phase: WindPhase,
    pub phase_start_frame: u64,
    pub phase_end_frame: u64,

    /// 0 disables enemy fire; higher levels shorten the cooldown
    pub brick_fire_level: u32,
    pub last_fire_frame: u64,

    /// 0 disables auto-spawn; higher levels spawn more often
    pub ball_spawn_level: u32,
    pub last_spawn_frame: u64,
}

impl Default for EnvironmentalState {
    fn default() -> Self {
        Self {
            frame: 0,
            wind_enabled: false,
            wind_speed: 0.0,
            wind_speed_goal: 0.0,
            wind_phase: WindPhase::Const,
            phase_start_frame: 0,
            phase_end_frame: 0,
            brick_fire_level: 0,
            last_fire_frame: 0,
            ball_spawn_level: 0,
            last_spawn_frame: 0,
        }
    }
}

impl EnvironmentalState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn wind on; the first gust starts building next frame
    pub fn enable_wind(&mut self) {
        if self.wind_enabled {
            return;
        }
        self.wind_enabled = true;
        self.wind_phase = WindPhase::Const;
        self.wind_speed = 0.0;
        self.wind_speed_goal = 0.0;
        self.phase_start_frame = self.frame;
        self.phase_end_frame = self.frame + 1;
    }

    pub fn increase_fire(&mut self) {
        self.brick_fire_level += 1;
        log::info!("enemy fire level {}", self.brick_fire_level);
    }

    pub fn increase_auto_spawn(&mut self) {
        if self.ball_spawn_level == 0 {
            self.last_spawn_frame = self.frame;
        }
        self.ball_spawn_level += 1;
        log::info!("ball auto-spawn level {}", self.ball_spawn_level);
    }

    /// Advance one frame
    pub fn advance(&mut self, rng: &mut impl Rng, tuning: &Tuning) {
        self.frame += 1;
        if !self.wind_enabled {
            return;
        }

        let span = self.phase_end_frame.saturating_sub(self.phase_start_frame).max(1);
        let t = self.frame.saturating_sub(self.phase_start_frame) as f32 / span as f32;
        match self.wind_phase {
            WindPhase::RampUp => self.wind_speed = self.wind_speed_goal * ease(t),
            WindPhase::RampDown => self.wind_speed = self.wind_speed_goal * (1.0 - ease(t)),
            WindPhase::Const => {}
        }

        if self.frame >= self.phase_end_frame {
            self.next_wind_phase(rng, tuning);
        }
    }

    fn next_wind_phase(&mut self, rng: &mut impl Rng, tuning: &Tuning) {
        let wind = &tuning.wind;
        match self.wind_phase {
            WindPhase::Const if self.wind_speed_goal == 0.0 => {
                let magnitude = gauss(rng, wind.speed_mean, wind.speed_sigma).abs();
                let sign = if rng.random_bool(0.5) { 1.0 } else { -1.0 };
                self.wind_speed_goal = magnitude * sign;
                log::debug!("wind picking up toward {:.2}", self.wind_speed_goal);
                let ramp = gauss(rng, wind.ramp_mean, wind.ramp_sigma);
                self.begin(WindPhase::RampUp, tuning.frames(ramp));
            }
            WindPhase::RampUp => {
                self.wind_speed = self.wind_speed_goal;
                let hold = gauss(rng, wind.gust_mean, wind.gust_sigma);
                self.begin(WindPhase::Const, tuning.frames(hold));
            }
            WindPhase::Const => {
                let ramp = gauss(rng, wind.ramp_mean, wind.ramp_sigma);
                self.begin(WindPhase::RampDown, tuning.frames(ramp));
            }
            WindPhase::RampDown => {
                self.wind_speed = 0.0;
                self.wind_speed_goal = 0.0;
                log::debug!("wind calmed down");
                let calm = gauss(rng, wind.calm_mean, wind.calm_sigma);
                self.begin(WindPhase::Const, tuning.frames(calm));
            }
        }
    }

    fn begin(&mut self, phase: WindPhase, frames: u64) {
        self.wind_phase = phase;
        self.phase_start_frame = self.frame;
        self.phase_end_frame = self.frame + frames.max(1);
    }

    /// Whether a brick fires this frame
    ///
    /// The cooldown is shared by every brick of the run; once it elapsed each
    /// call is an independent trial.
    pub fn fire_check(&mut self, rng: &mut impl Rng, tuning: &Tuning) -> bool {
        if self.brick_fire_level == 0 {
            return false;
        }
        let cooldown = (tuning.fire.cooldown_frames / self.brick_fire_level as f32) as u64;
        if self.frame.saturating_sub(self.last_fire_frame) < cooldown {
            return false;
        }
        if rng.random_bool(tuning.fire.chance) {
            self.last_fire_frame = self.frame;
            true
        } else {
            false
        }
    }

    /// Whether a ball should auto-spawn this frame; resets the timer when it does
    pub fn auto_spawn_due(&mut self, tuning: &Tuning) -> bool {
        if self.ball_spawn_level == 0 {
            return false;
        }
        let period = tuning.auto_spawn_frames / (1 + self.ball_spawn_level as u64);
        if self.frame.saturating_sub(self.last_spawn_frame) >= period {
            self.last_spawn_frame = self.frame;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    #[test]
    fn test_calm_without_wind() {
        let mut env = EnvironmentalState::new();
        let mut rng = Pcg32::seed_from_u64(1);
        let tuning = Tuning::default();
        for _ in 0..10_000 {
            env.advance(&mut rng, &tuning);
        }
        assert_eq!(env.frame, 10_000);
        assert_eq!(env.wind_speed, 0.0);
    }

    #[test]
    fn test_enable_wind_starts_ramp_next_frame() {
        let mut env = EnvironmentalState::new();
        let mut rng = Pcg32::seed_from_u64(2);
        let tuning = Tuning::default();
        env.enable_wind();
        env.advance(&mut rng, &tuning);
        assert_eq!(env.wind_phase, WindPhase::RampUp);
        assert!(env.wind_speed_goal.abs() > 2.0 && env.wind_speed_goal.abs() < 4.0);
        assert_eq!(env.wind_speed, 0.0);
    }

    #[test]
    fn test_wind_cycles_through_every_phase() {
        let mut env = EnvironmentalState::new();
        let mut rng = Pcg32::seed_from_u64(3);
        let tuning = Tuning::default();
        env.enable_wind();

        let mut seen = vec![env.wind_phase];
        // Two full cycles fit comfortably in five minutes
        for _ in 0..60 * 300 {
            env.advance(&mut rng, &tuning);
            if seen.last() != Some(&env.wind_phase) {
                seen.push(env.wind_phase);
            }
        }
        let expected = [
            WindPhase::Const,
            WindPhase::RampUp,
            WindPhase::Const,
            WindPhase::RampDown,
            WindPhase::Const,
            WindPhase::RampUp,
        ];
        assert!(seen.len() >= expected.len());
        assert_eq!(&seen[..expected.len()], &expected);
    }

    #[test]
    fn test_wind_speed_never_exceeds_goal() {
        let tuning = Tuning::default();
        for seed in 0..8 {
            let mut env = EnvironmentalState::new();
            let mut rng = Pcg32::seed_from_u64(seed);
            env.enable_wind();
            for _ in 0..60 * 120 {
                env.advance(&mut rng, &tuning);
                assert!(
                    env.wind_speed.abs() <= env.wind_speed_goal.abs() + 1e-6,
                    "seed {seed}: speed {} goal {}",
                    env.wind_speed,
                    env.wind_speed_goal
                );
                if env.wind_speed != 0.0 {
                    assert_eq!(env.wind_speed.signum(), env.wind_speed_goal.signum());
                }
            }
        }
    }

    #[test]
    fn test_same_seed_same_weather() {
        let tuning = Tuning::default();
        let run = |seed| {
            let mut env = EnvironmentalState::new();
            let mut rng = Pcg32::seed_from_u64(seed);
            env.enable_wind();
            (0..3000)
                .map(|_| {
                    env.advance(&mut rng, &tuning);
                    env.wind_speed
                })
                .collect::<Vec<f32>>()
        };
        assert_eq!(run(9), run(9));
    }

    #[test]
    fn test_fire_disabled_at_level_zero() {
        let mut env = EnvironmentalState::new();
        let mut rng = Pcg32::seed_from_u64(4);
        let mut tuning = Tuning::default();
        tuning.fire.chance = 1.0;
        env.frame = 100_000;
        assert!(!env.fire_check(&mut rng, &tuning));
    }

    #[test]
    fn test_fire_cooldown_shrinks_with_level() {
        let mut env = EnvironmentalState::new();
        let mut rng = Pcg32::seed_from_u64(5);
        let mut tuning = Tuning::default();
        tuning.fire.chance = 1.0;

        env.increase_fire();
        env.frame = 179;
        assert!(!env.fire_check(&mut rng, &tuning));
        env.frame = 180;
        assert!(env.fire_check(&mut rng, &tuning));
        assert_eq!(env.last_fire_frame, 180);

        env.increase_fire();
        env.frame = 269;
        assert!(!env.fire_check(&mut rng, &tuning));
        env.frame = 270;
        assert!(env.fire_check(&mut rng, &tuning));
    }

    #[test]
    fn test_fire_never_triggers_with_zero_chance() {
        let mut env = EnvironmentalState::new();
        let mut rng = Pcg32::seed_from_u64(6);
        let mut tuning = Tuning::default();
        tuning.fire.chance = 0.0;
        env.increase_fire();
        for frame in 0..5000 {
            env.frame = frame;
            assert!(!env.fire_check(&mut rng, &tuning));
        }
    }

    #[test]
    fn test_auto_spawn_period() {
        let mut env = EnvironmentalState::new();
        let tuning = Tuning::default();
        assert!(!env.auto_spawn_due(&tuning));

        env.frame = 50;
        env.increase_auto_spawn();
        // 3600 / (1 + 1) frames
        env.frame = 50 + 1799;
        assert!(!env.auto_spawn_due(&tuning));
        env.frame = 50 + 1800;
        assert!(env.auto_spawn_due(&tuning));
        assert!(!env.auto_spawn_due(&tuning));

        env.increase_auto_spawn();
        env.frame += 1200;
        assert!(env.auto_spawn_due(&tuning));
    }
}
