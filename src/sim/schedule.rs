//! One-shot actions that run a fixed number of frames later

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::entity::{Body, Bullet, Entity, EntityKind};
use super::state::RunContext;
use super::world::World;
use crate::audio::Sound;

/// What a scheduled action does when it fires
///
/// Plain data, captured when the action is scheduled.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum Deferred {
    /// Enemy bullet leaving a brick along `direction`
    SpawnBullet { origin: Vec2, direction: Vec2 },
}

impl Deferred {
    pub fn run(&self, world: &mut World, ctx: &mut RunContext) {
        match *self {
            Deferred::SpawnBullet { origin, direction } => {
                ctx.play(Sound::Shot);
                let bullet = Bullet::entity(origin, direction, ctx.tuning.fire.bullet_speed, world.zoom());
                world.add(bullet);
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScheduledAction {
    pub frames_remaining: i32,
    pub action: Deferred,
}

impl ScheduledAction {
    /// Entity running `action` after `delay` frames
    pub fn entity(delay: i32, action: Deferred) -> Entity {
        Entity::new(
            Body::new(Vec2::ZERO, Vec2::ZERO),
            EntityKind::Scheduled(ScheduledAction {
                frames_remaining: delay,
                action,
            }),
        )
    }

    pub(crate) fn logic(&mut self, body: &mut Body, world: &mut World, ctx: &mut RunContext) {
        self.frames_remaining -= 1;
        if self.frames_remaining <= 0 {
            self.action.run(world, ctx);
            body.alive = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::DESIGN_SIZE;
    use crate::sim::entity::Kind;
    use crate::tuning::Tuning;

    fn shot() -> Deferred {
        Deferred::SpawnBullet {
            origin: Vec2::new(100.0, 100.0),
            direction: Vec2::new(3.0, 4.0),
        }
    }

    #[test]
    fn test_fires_after_delay_exactly_once() {
        let mut world = World::new(DESIGN_SIZE);
        let mut ctx = RunContext::new(Tuning::default(), 1);
        let id = world.add(ScheduledAction::entity(3, shot()));

        for _ in 0..2 {
            world.tick(&mut ctx);
            assert_eq!(world.count_with_pending(Kind::Bullet), 0);
            assert!(world.get(id).is_some());
        }

        world.tick(&mut ctx);
        assert_eq!(world.count_with_pending(Kind::Bullet), 1);
        assert!(world.get(id).is_none());
        assert_eq!(ctx.drain_sounds().collect::<Vec<_>>(), vec![Sound::Shot]);

        for _ in 0..5 {
            world.tick(&mut ctx);
        }
        assert!(world.count_with_pending(Kind::Bullet) <= 1);
        assert!(ctx.drain_sounds().next().is_none());
    }

    #[test]
    fn test_non_positive_delay_fires_on_first_tick() {
        let mut world = World::new(DESIGN_SIZE);
        let mut ctx = RunContext::new(Tuning::default(), 1);
        world.add(ScheduledAction::entity(0, shot()));
        world.tick(&mut ctx);
        assert_eq!(world.count(Kind::Scheduled), 0);
        assert_eq!(world.count_with_pending(Kind::Bullet), 1);
    }

    #[test]
    fn test_bullet_heads_along_captured_direction() {
        let mut world = World::new(DESIGN_SIZE);
        let mut ctx = RunContext::new(Tuning::default(), 1);
        shot().run(&mut world, &mut ctx);
        let bullet = world.get_all(Kind::Bullet).next().unwrap();
        match bullet.kind {
            EntityKind::Bullet(b) => {
                assert!((b.velocity - Vec2::new(0.6, 0.8) * 7.0).length() < 1e-5)
            }
            _ => unreachable!(),
        }
    }
}
