//! Sound cues emitted by the simulation
//!
//! The simulation only queues cues; playback is fire-and-forget through an
//! [`AudioSink`] supplied by the platform.

use serde::{Deserialize, Serialize};

/// Sound effect types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sound {
    /// Ball hits a brick
    Hit,
    /// Bomb brick explodes
    Bomb,
    /// Ball bounces off the paddle
    Bong,
    /// A brick takes aim at the paddle
    PreShot,
    /// Enemy bullet leaves its brick
    Shot,
}

impl Sound {
    /// Asset name of the cue
    pub fn name(self) -> &'static str {
        match self {
            Sound::Hit => "hit",
            Sound::Bomb => "bomb",
            Sound::Bong => "bong",
            Sound::PreShot => "pre-shot",
            Sound::Shot => "shot",
        }
    }
}

/// Plays sounds by name
pub trait AudioSink {
    fn play(&mut self, name: &str);
}

/// Sink that only logs the cues, for headless runs
#[derive(Debug, Default)]
pub struct LogSink {
    pub played: u64,
}

impl AudioSink for LogSink {
    fn play(&mut self, name: &str) {
        self.played += 1;
        log::trace!("sound: {}", name);
    }
}
