//! Per-run state threaded through the simulation
//!
//! Nothing here is global: a [`RunContext`] is built at the start of a run and
//! handed by reference to everything that needs it.

use std::collections::BTreeMap;

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::bricks::BrickVariant;
use super::environment::EnvironmentalState;
use super::world::World;
use crate::audio::Sound;
use crate::powerups::Category;
use crate::stats::RunStatistics;
use crate::tuning::Tuning;

/// Screen shake applied when a life is lost
const LIFE_LOST_SHAKE: u32 = 12;

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Waiting for the player to start
    Menu,
    Playing,
    Paused,
    /// Choosing one of the offered powerups
    PickPowerup,
    /// Run ended
    GameOver,
}

/// A powerup taken during the run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedPowerup {
    pub name: String,
    pub category: Category,
}

impl AppliedPowerup {
    pub fn value(&self) -> i64 {
        self.category.value()
    }
}

/// Score, lives and progress of one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameplayState {
    pub score: i64,
    pub lives: i32,
    pub level: u32,
    /// Score-triggered powerups taken so far
    pub score_level: u32,
    pub powerups: Vec<AppliedPowerup>,
}

impl GameplayState {
    pub fn new(lives: i32) -> Self {
        Self {
            score: 0,
            lives,
            level: 0,
            score_level: 0,
            powerups: Vec::new(),
        }
    }

    /// Score a brick hit (`hit`) or destruction; returns the points added
    ///
    /// Destruction is worth 10, less when the run holds good powerups and more
    /// when it holds bad ones. Anything above 10 counts twice.
    pub fn increase_score(&mut self, hit: bool) -> i64 {
        let ds = if hit {
            1
        } else {
            let bonus: i64 = self.powerups.iter().map(AppliedPowerup::value).sum();
            let bonus = if bonus > 0 { (-bonus).div_euclid(2) } else { -bonus };
            let mut ds = (10 + bonus).max(2);
            if ds > 10 {
                ds += ds - 10;
            }
            ds
        };
        self.score += ds;
        ds
    }

    /// Score above which the next powerup is offered
    pub fn score_for_next_powerup(&self) -> i64 {
        match self.score_level {
            0 => 100,
            1 => 250,
            2 => 500,
            k => {
                let k = k as i64;
                500 * k * (1 + k / 10)
            }
        }
    }
}

/// Rules that powerups change during a run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRules {
    /// Hits needed to break a plain brick
    pub brick_life: i32,
    /// Ball speed in design pixels per frame
    pub ball_speed: f32,
    pub mouse_control: bool,
    pub flip_controls: bool,
    /// Variant bricks sprinkled into every new level
    pub extra_bricks: BTreeMap<BrickVariant, u32>,
}

impl RunRules {
    pub fn new(tuning: &Tuning) -> Self {
        Self {
            brick_life: 1,
            ball_speed: tuning.ball_start_speed,
            mouse_control: false,
            flip_controls: false,
            extra_bricks: BTreeMap::new(),
        }
    }
}

/// Everything a run needs besides its entities
#[derive(Debug, Clone)]
pub struct RunContext {
    pub tuning: Tuning,
    pub rules: RunRules,
    pub env: EnvironmentalState,
    pub gameplay: GameplayState,
    /// Carried over from run to run
    pub stats: RunStatistics,
    pub rng: Pcg32,
    sounds: Vec<Sound>,
}

impl RunContext {
    pub fn new(tuning: Tuning, seed: u64) -> Self {
        Self::with_stats(tuning, seed, RunStatistics::default())
    }

    pub fn with_stats(tuning: Tuning, seed: u64, stats: RunStatistics) -> Self {
        Self {
            rules: RunRules::new(&tuning),
            env: EnvironmentalState::new(),
            gameplay: GameplayState::new(tuning.start_lives),
            stats,
            rng: Pcg32::seed_from_u64(seed),
            sounds: Vec::new(),
            tuning,
        }
    }

    /// Queue a sound cue for the platform
    pub fn play(&mut self, sound: Sound) {
        self.sounds.push(sound);
    }

    /// Sound cues queued since the last drain
    pub fn drain_sounds(&mut self) -> std::vec::Drain<'_, Sound> {
        self.sounds.drain(..)
    }

    /// Score a brick hit or destruction, in the run and the statistics
    pub fn award(&mut self, hit: bool) -> i64 {
        let ds = self.gameplay.increase_score(hit);
        self.stats.total_score += ds;
        ds
    }

    pub fn lose_life(&mut self, world: &mut World) {
        self.gameplay.lives -= 1;
        world.shake(LIFE_LOST_SHAKE);
        log::debug!("life lost, {} left", self.gameplay.lives);
    }
}
