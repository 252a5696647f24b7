//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed frame step only
//! - Seeded RNG only, threaded through [`RunContext`]
//! - Stable iteration order (by entity ID)
//! - No window, audio device or pixel dependencies

pub mod bricks;
pub mod collision;
pub mod entity;
pub mod environment;
pub mod levels;
pub mod particles;
pub mod rect;
pub mod schedule;
pub mod state;
pub mod tick;
pub mod world;

pub use bricks::{Brick, BrickGrid, BrickVariant};
pub use collision::{Edge, bounce, bounce_angle, circle_rect_normal, paddle_bounce, reflect_velocity};
pub use entity::{Ball, Body, Bullet, Entity, EntityId, EntityKind, Kind, Paddle};
pub use environment::{EnvironmentalState, WindPhase};
pub use levels::LevelError;
pub use particles::{Particle, ParticleStyle};
pub use rect::Rect;
pub use schedule::{Deferred, ScheduledAction};
pub use state::{AppliedPowerup, GamePhase, GameplayState, RunContext, RunRules};
pub use tick::{Game, GameError};
pub use world::{Spawn, Spawner, World};
