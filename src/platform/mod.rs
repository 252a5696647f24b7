//! Platform abstraction layer
//!
//! The simulation never touches a window, a GPU or an input device. It
//! consumes [`InputEvent`]s and emits [`DrawItem`]s to a [`Renderer`];
//! sprite lookup and pixel work stay behind that trait.

use glam::Vec2;

use crate::sim::{BrickVariant, ParticleStyle};

/// Logical keys the game reacts to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    /// Space: start, confirm a choice, pause
    Confirm,
    /// P: pause
    Pause,
    Escape,
    /// Any key without a game binding
    Other(u32),
}

/// Discrete input delivered by the platform once per frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputEvent {
    KeyDown(Key),
    KeyUp(Key),
    MouseMove(Vec2),
    MouseClick(Vec2),
    /// New drawable size in pixels
    Resize(Vec2),
    Quit,
}

/// What an entity looks like, without any pixel data
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Visual {
    Ball,
    Paddle,
    Brick { variant: BrickVariant, life: i32 },
    Bullet { direction: Vec2 },
    Particle { style: ParticleStyle, age: u32, lifespan: u32 },
}

/// One thing to draw this frame
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub pos: Vec2,
    pub size: Vec2,
    pub z: i32,
    pub visual: Visual,
}

/// Drawing surface provided by the platform
pub trait Renderer {
    /// Draw one item; items arrive grouped by ascending `z`
    fn draw(&mut self, item: &DrawItem);

    /// Offset the whole frame (screen shake)
    fn scroll(&mut self, dx: i32, dy: i32);
}
