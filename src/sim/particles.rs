//! Short-lived cosmetic particles

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::{Body, Entity, EntityKind};
use super::world::Spawn;
use crate::{gauss, polar};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParticleStyle {
    /// Brick hit debris
    Spark,
    /// Ball death and bullet explosions
    Ember,
    /// Horizontal wind line
    Streak,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    /// Screen pixels per frame
    pub velocity: Vec2,
    pub lifespan: u32,
    pub age: u32,
    /// Velocity multiplier applied every frame
    pub decay: f32,
    pub style: ParticleStyle,
}

impl Particle {
    fn entity(center: Vec2, size: f32, particle: Particle) -> Entity {
        Entity::new(
            Body::centered(center, Vec2::splat(size)),
            EntityKind::Particle(particle),
        )
    }

    pub fn spark(center: Vec2, zoom: f32, rng: &mut impl Rng) -> Entity {
        let velocity = polar(gauss(rng, 13.0, 3.0), rng.random_range(0.0..360.0)) * zoom;
        Self::entity(
            center,
            2.0 * zoom,
            Particle {
                velocity,
                lifespan: 15,
                age: 0,
                decay: 0.95,
                style: ParticleStyle::Spark,
            },
        )
    }

    pub fn ember(center: Vec2, zoom: f32, rng: &mut impl Rng) -> Entity {
        let velocity = polar(gauss(rng, 15.0, 3.0), rng.random_range(0.0..360.0)) * zoom;
        Self::entity(
            center,
            2.0 * zoom,
            Particle {
                velocity,
                lifespan: 20,
                age: 0,
                decay: 0.95,
                style: ParticleStyle::Ember,
            },
        )
    }

    /// Line blown across the screen from the upwind edge
    ///
    /// Lives exactly long enough to cross the screen.
    pub fn wind_streak(wind_speed: f32, screen: Vec2, zoom: f32, rng: &mut impl Rng) -> Entity {
        let (speed, x) = if wind_speed > 0.0 {
            (wind_speed.max(1.0), 0.0)
        } else {
            (wind_speed.min(-1.0), screen.x)
        };
        let y = rng.random_range(0.0..screen.y.max(1.0));
        let velocity = Vec2::new(speed * 5.0 * zoom, 0.0);
        let lifespan = (screen.x / velocity.x.abs()).ceil() as u32 + 1;
        let thickness = rng.random_range(1..5) as f32 * zoom;

        Self::entity(
            Vec2::new(x, y),
            thickness,
            Particle {
                velocity,
                lifespan,
                age: 0,
                decay: 1.0,
                style: ParticleStyle::Streak,
            },
        )
    }

    pub(crate) fn logic(&mut self, body: &mut Body) {
        self.age += 1;
        if self.age > self.lifespan {
            body.alive = false;
        }
        body.pos += self.velocity;
        self.velocity *= self.decay;
    }
}

/// Spawn `count` particles of `style` at `center`
pub fn burst<S: Spawn + ?Sized>(
    spawn: &mut S,
    center: Vec2,
    count: usize,
    style: ParticleStyle,
    rng: &mut impl Rng,
) {
    let zoom = spawn.zoom();
    for _ in 0..count {
        let particle = match style {
            ParticleStyle::Ember => Particle::ember(center, zoom, rng),
            _ => Particle::spark(center, zoom, rng),
        };
        spawn.spawn(particle);
    }
}
