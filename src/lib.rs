//! Violet - a brick-breaker with powerups, wind and enemy fire
//!
//! Core modules:
//! - `sim`: Frame simulation (entities, collisions, bricks, wind, game phases)
//! - `powerups`: Powerup registry and weighted selection
//! - `tuning`: Data-driven game balance
//! - `stats`: Run statistics handed off to storage
//! - `platform` / `audio`: Interfaces to the renderer, input and sound collaborators

pub mod audio;
pub mod platform;
pub mod powerups;
pub mod sim;
pub mod stats;
pub mod tuning;

pub use stats::RunStatistics;
pub use tuning::Tuning;

use glam::Vec2;
use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

/// Game configuration constants
pub mod consts {
    use glam::Vec2;

    /// Fixed simulation rate (one logic tick per frame)
    pub const FPS: u32 = 60;

    /// Design resolution; every size below is expressed in it and scaled by zoom
    pub const DESIGN_SIZE: Vec2 = Vec2::new(800.0, 500.0);

    /// Paddle defaults
    pub const PADDLE_SIZE: Vec2 = Vec2::new(75.0, 12.0);
    pub const PADDLE_SPEED: f32 = 10.0;
    /// Distance between the paddle top and the bottom of the screen
    pub const PADDLE_BOTTOM_OFFSET: f32 = 30.0;

    /// Ball defaults
    pub const BALL_RADIUS: f32 = 10.0;
    pub const BALL_START_SPEED: f32 = 6.0;
    /// Ball speed added on every level-up
    pub const BALL_SPEED_GAIN: f32 = 0.2;

    /// Brick grid defaults
    pub const GRID_ROWS: usize = 15;
    pub const GRID_COLS: usize = 15;
    /// Fraction of the screen height covered by the brick grid
    pub const GRID_HEIGHT_FRACTION: f32 = 0.8;

    pub const START_LIVES: i32 = 3;
}

/// Smoothstep easing on [0, 1], clamping the input first
#[inline]
pub fn ease(x: f32) -> f32 {
    let x = x.clamp(0.0, 1.0);
    x * x * (3.0 - 2.0 * x)
}

/// Vector of length `r` at `degrees` (screen space, y down)
#[inline]
pub fn polar(r: f32, degrees: f32) -> Vec2 {
    let phi = degrees.to_radians();
    Vec2::new(r * phi.cos(), r * phi.sin())
}

/// Gaussian sample with the given mean and standard deviation
pub fn gauss(rng: &mut impl Rng, mean: f32, sigma: f32) -> f32 {
    let z: f32 = StandardNormal.sample(rng);
    mean + sigma * z
}
