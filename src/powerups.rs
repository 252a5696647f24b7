//! Powerup registry and weighted selection
//!
//! Powerups are plain records registered explicitly at startup. Each has an
//! effect on the running game and a predicate telling whether it can still be
//! offered.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::sim::{AppliedPowerup, BrickVariant, Kind, RunContext, World};

/// Powerup family: how often it is offered and how it shifts brick scores
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    Bad,
    VeryBad,
    Good,
    GodLike,
    Brick,
}

impl Category {
    pub const ALL: [Category; 5] = [
        Category::Bad,
        Category::VeryBad,
        Category::Good,
        Category::GodLike,
        Category::Brick,
    ];

    /// Relative selection weight
    pub fn weight(self) -> u32 {
        match self {
            Category::Bad => 5,
            Category::VeryBad => 1,
            Category::Good => 4,
            Category::GodLike => 1,
            Category::Brick => 1,
        }
    }

    /// Signed contribution to the destroy-score adjustment
    pub fn value(self) -> i64 {
        match self {
            Category::Bad => -1,
            Category::VeryBad => -2,
            Category::Good => 1,
            Category::GodLike => 2,
            Category::Brick => 0,
        }
    }
}

pub type Effect = fn(&mut World, &mut RunContext);
pub type Availability = fn(&World, &RunContext) -> bool;

#[derive(Debug, Clone, Copy)]
pub struct Powerup {
    pub name: &'static str,
    pub description: &'static str,
    pub category: Category,
    pub effect: Effect,
    pub available: Availability,
}

impl Powerup {
    /// Apply the effect and record it in the run
    pub fn apply(&self, world: &mut World, ctx: &mut RunContext) {
        log::info!("powerup: {} ({:?})", self.name, self.category);
        (self.effect)(world, ctx);
        ctx.gameplay.powerups.push(AppliedPowerup {
            name: self.name.to_string(),
            category: self.category,
        });
        ctx.stats.powerups += 1;
    }
}

fn always(_: &World, _: &RunContext) -> bool {
    true
}

#[derive(Debug, Clone, Default)]
pub struct PowerupRegistry {
    powerups: Vec<Powerup>,
}

impl PowerupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, powerup: Powerup) {
        self.powerups.push(powerup);
    }

    /// Registry holding every powerup of the game
    pub fn standard() -> Self {
        let mut registry = Self::new();
        for powerup in effects::ALL {
            registry.register(powerup);
        }
        registry
    }

    pub fn get(&self, index: usize) -> Option<&Powerup> {
        self.powerups.get(index)
    }

    pub fn find(&self, name: &str) -> Option<&Powerup> {
        self.powerups.iter().find(|p| p.name == name)
    }

    pub fn len(&self) -> usize {
        self.powerups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.powerups.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Powerup> {
        self.powerups.iter()
    }

    /// Draw up to `max` distinct powerups, weighted by category
    ///
    /// Only powerups in `categories` (every category when empty) that are
    /// currently available take part. Returns registry indices.
    pub fn choose(
        &self,
        max: usize,
        categories: &[Category],
        world: &World,
        ctx: &mut RunContext,
    ) -> Vec<usize> {
        let view: &RunContext = ctx;
        let mut candidates: Vec<usize> = self
            .powerups
            .iter()
            .enumerate()
            .filter(|(_, p)| categories.is_empty() || categories.contains(&p.category))
            .filter(|(_, p)| (p.available)(world, view))
            .map(|(i, _)| i)
            .collect();

        let mut chosen = Vec::with_capacity(max.min(candidates.len()));
        while chosen.len() < max && !candidates.is_empty() {
            let total: u32 = candidates
                .iter()
                .map(|&i| self.powerups[i].category.weight())
                .sum();
            let mut roll = ctx.rng.random_range(0..total);
            let mut pick = candidates.len() - 1;
            for (slot, &i) in candidates.iter().enumerate() {
                let weight = self.powerups[i].category.weight();
                if roll < weight {
                    pick = slot;
                    break;
                }
                roll -= weight;
            }
            chosen.push(candidates.remove(pick));
        }
        chosen
    }
}

mod effects {
    use super::*;

    pub const ALL: [Powerup; 13] = [
        Powerup {
            name: "Life up",
            description: "Soon even cats will be jealous!",
            category: Category::Good,
            effect: life_up,
            available: always,
        },
        Powerup {
            name: "Bigger paddle",
            description: "Size does matter sometimes...",
            category: Category::Good,
            effect: bigger_paddle,
            available: always,
        },
        Powerup {
            name: "Smaller paddle",
            description: "A small paddle teaches you to be more precise...",
            category: Category::Bad,
            effect: smaller_paddle,
            available: paddle_can_shrink,
        },
        Powerup {
            name: "Speed up",
            description: "Turn into a wasp on steroids.",
            category: Category::Good,
            effect: speed_up,
            available: always,
        },
        Powerup {
            name: "Speed down",
            description: "Good luck catching up with the balls!",
            category: Category::Bad,
            effect: speed_down,
            available: paddle_can_slow_down,
        },
        Powerup {
            name: "Stronger bricks",
            description: "Every brick needs one more hit to pop.",
            category: Category::VeryBad,
            effect: stronger_bricks,
            available: always,
        },
        Powerup {
            name: "Wind",
            description: "Wooooosh",
            category: Category::VeryBad,
            effect: wind,
            available: wind_is_calm,
        },
        Powerup {
            name: "Armed bricks",
            description: "Bricks shoot back. Take cover!",
            category: Category::VeryBad,
            effect: enemy_fire,
            available: always,
        },
        Powerup {
            name: "Ball spawn",
            description: "Get a new ball every so often.",
            category: Category::GodLike,
            effect: auto_ball_spawn,
            available: always,
        },
        Powerup {
            name: "Mouse control",
            description: "A good cat plays with the mouse.",
            category: Category::GodLike,
            effect: mouse_control,
            available: mouse_is_locked,
        },
        Powerup {
            name: "Clone bricks",
            description: "Some bricks release a ball when broken.",
            category: Category::Brick,
            effect: clone_bricks,
            available: always,
        },
        Powerup {
            name: "Explosive bricks",
            description: "BOOOOOM",
            category: Category::Brick,
            effect: explosive_bricks,
            available: always,
        },
        Powerup {
            name: "Mirror",
            description: "Left is right and right is left.",
            category: Category::VeryBad,
            effect: flip_controls,
            available: always,
        },
    ];

    /// Extra variant bricks added to each new level per pick
    const EXTRA_BRICKS_PER_PICK: u32 = 2;
    const MIN_PADDLE_WIDTH: f32 = 20.0;
    const MIN_PADDLE_SPEED: f32 = 2.0;

    fn life_up(_: &mut World, ctx: &mut RunContext) {
        ctx.gameplay.lives += 1;
    }

    fn bigger_paddle(world: &mut World, ctx: &mut RunContext) {
        let grow = ctx.tuning.paddle_size.x / 2.0 * world.zoom();
        for paddle in world.get_all_mut(Kind::Paddle) {
            paddle.body.size.x += grow;
        }
    }

    fn smaller_paddle(world: &mut World, _: &mut RunContext) {
        for paddle in world.get_all_mut(Kind::Paddle) {
            paddle.body.size.x *= 0.8;
        }
    }

    fn paddle_can_shrink(world: &World, _: &RunContext) -> bool {
        let min = MIN_PADDLE_WIDTH * world.zoom();
        world.get_all(Kind::Paddle).all(|p| p.body.size.x * 0.8 >= min)
    }

    fn speed_up(world: &mut World, _: &mut RunContext) {
        for paddle in world.get_all_mut(Kind::Paddle).filter_map(|e| e.paddle_mut()) {
            paddle.move_speed += 2.0;
        }
    }

    fn speed_down(world: &mut World, _: &mut RunContext) {
        for paddle in world.get_all_mut(Kind::Paddle).filter_map(|e| e.paddle_mut()) {
            paddle.move_speed -= 0.5;
        }
    }

    fn paddle_can_slow_down(world: &World, _: &RunContext) -> bool {
        world
            .get_all(Kind::Paddle)
            .filter_map(|e| e.paddle())
            .all(|p| p.move_speed - 0.5 >= MIN_PADDLE_SPEED)
    }

    fn stronger_bricks(_: &mut World, ctx: &mut RunContext) {
        ctx.rules.brick_life += 1;
    }

    fn wind(_: &mut World, ctx: &mut RunContext) {
        ctx.env.enable_wind();
    }

    fn wind_is_calm(_: &World, ctx: &RunContext) -> bool {
        !ctx.env.wind_enabled
    }

    fn enemy_fire(_: &mut World, ctx: &mut RunContext) {
        ctx.env.increase_fire();
    }

    fn auto_ball_spawn(_: &mut World, ctx: &mut RunContext) {
        ctx.env.increase_auto_spawn();
    }

    fn mouse_control(_: &mut World, ctx: &mut RunContext) {
        ctx.rules.mouse_control = true;
    }

    fn mouse_is_locked(_: &World, ctx: &RunContext) -> bool {
        !ctx.rules.mouse_control
    }

    fn clone_bricks(_: &mut World, ctx: &mut RunContext) {
        *ctx.rules.extra_bricks.entry(BrickVariant::Double).or_default() += EXTRA_BRICKS_PER_PICK;
    }

    fn explosive_bricks(_: &mut World, ctx: &mut RunContext) {
        *ctx.rules.extra_bricks.entry(BrickVariant::Bomb).or_default() += EXTRA_BRICKS_PER_PICK;
    }

    fn flip_controls(_: &mut World, ctx: &mut RunContext) {
        ctx.rules.flip_controls = !ctx.rules.flip_controls;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consts::DESIGN_SIZE;
    use crate::sim::Paddle;
    use crate::tuning::Tuning;
    use glam::Vec2;
    use std::collections::HashSet;

    fn setup() -> (World, RunContext, PowerupRegistry) {
        let mut world = World::new(DESIGN_SIZE);
        world.add(Paddle::entity(DESIGN_SIZE, Vec2::new(75.0, 12.0), 10.0, 1.0));
        (world, RunContext::new(Tuning::default(), 17), PowerupRegistry::standard())
    }

    fn apply(name: &str, world: &mut World, ctx: &mut RunContext, registry: &PowerupRegistry) {
        registry.find(name).unwrap().apply(world, ctx);
    }

    #[test]
    fn test_standard_registry() {
        let registry = PowerupRegistry::standard();
        assert_eq!(registry.len(), 13);
        let names: HashSet<&str> = registry.iter().map(|p| p.name).collect();
        assert_eq!(names.len(), 13);
        assert_eq!(registry.iter().filter(|p| p.category == Category::Brick).count(), 2);
    }

    #[test]
    fn test_choose_returns_distinct_powerups() {
        let (world, mut ctx, registry) = setup();
        for _ in 0..50 {
            let chosen = registry.choose(3, &[], &world, &mut ctx);
            assert_eq!(chosen.len(), 3);
            let unique: HashSet<usize> = chosen.iter().copied().collect();
            assert_eq!(unique.len(), 3);
        }
    }

    #[test]
    fn test_choose_respects_categories() {
        let (world, mut ctx, registry) = setup();
        let chosen = registry.choose(3, &[Category::Brick], &world, &mut ctx);
        // Only two brick powerups exist
        assert_eq!(chosen.len(), 2);
        for i in chosen {
            assert_eq!(registry.get(i).unwrap().category, Category::Brick);
        }
    }

    #[test]
    fn test_choose_skips_unavailable() {
        let (world, mut ctx, registry) = setup();
        ctx.rules.mouse_control = true;
        for _ in 0..20 {
            let chosen = registry.choose(3, &[Category::GodLike], &world, &mut ctx);
            let names: Vec<&str> = chosen.iter().map(|&i| registry.get(i).unwrap().name).collect();
            assert_eq!(names, vec!["Ball spawn"]);
        }
    }

    #[test]
    fn test_choose_favours_heavy_categories() {
        let (world, mut ctx, registry) = setup();
        let mut bad = 0;
        let mut god_like = 0;
        for _ in 0..2000 {
            let first = registry.choose(1, &[], &world, &mut ctx)[0];
            match registry.get(first).unwrap().category {
                Category::Bad => bad += 1,
                Category::GodLike => god_like += 1,
                _ => {}
            }
        }
        assert!(bad > god_like * 2, "bad {bad} god-like {god_like}");
    }

    #[test]
    fn test_apply_records_powerup() {
        let (mut world, mut ctx, registry) = setup();
        apply("Life up", &mut world, &mut ctx, &registry);
        assert_eq!(ctx.gameplay.lives, 4);
        assert_eq!(ctx.gameplay.powerups.len(), 1);
        assert_eq!(ctx.gameplay.powerups[0].category, Category::Good);
        assert_eq!(ctx.stats.powerups, 1);
    }

    #[test]
    fn test_paddle_effects() {
        let (mut world, mut ctx, registry) = setup();
        apply("Bigger paddle", &mut world, &mut ctx, &registry);
        apply("Speed up", &mut world, &mut ctx, &registry);
        let paddle = world.get_all(Kind::Paddle).next().unwrap();
        assert_eq!(paddle.body.size.x, 75.0 + 37.5);
        assert_eq!(paddle.paddle().unwrap().move_speed, 12.0);

        apply("Smaller paddle", &mut world, &mut ctx, &registry);
        apply("Speed down", &mut world, &mut ctx, &registry);
        let paddle = world.get_all(Kind::Paddle).next().unwrap();
        assert!((paddle.body.size.x - 90.0).abs() < 1e-4);
        assert_eq!(paddle.paddle().unwrap().move_speed, 11.5);
    }

    #[test]
    fn test_rule_effects() {
        let (mut world, mut ctx, registry) = setup();
        apply("Stronger bricks", &mut world, &mut ctx, &registry);
        apply("Wind", &mut world, &mut ctx, &registry);
        apply("Armed bricks", &mut world, &mut ctx, &registry);
        apply("Ball spawn", &mut world, &mut ctx, &registry);
        apply("Mouse control", &mut world, &mut ctx, &registry);
        apply("Explosive bricks", &mut world, &mut ctx, &registry);
        apply("Explosive bricks", &mut world, &mut ctx, &registry);
        apply("Mirror", &mut world, &mut ctx, &registry);

        assert_eq!(ctx.rules.brick_life, 2);
        assert!(ctx.env.wind_enabled);
        assert_eq!(ctx.env.brick_fire_level, 1);
        assert_eq!(ctx.env.ball_spawn_level, 1);
        assert!(ctx.rules.mouse_control);
        assert_eq!(ctx.rules.extra_bricks.get(&BrickVariant::Bomb), Some(&4));
        assert!(ctx.rules.flip_controls);

        apply("Mirror", &mut world, &mut ctx, &registry);
        assert!(!ctx.rules.flip_controls);
    }

    #[test]
    fn test_custom_registration() {
        fn nothing(_: &mut World, _: &mut RunContext) {}
        let mut registry = PowerupRegistry::new();
        assert!(registry.is_empty());
        registry.register(Powerup {
            name: "Nothing",
            description: "",
            category: Category::Good,
            effect: nothing,
            available: always,
        });
        let (world, mut ctx, _) = setup();
        assert_eq!(registry.choose(3, &[], &world, &mut ctx), vec![0]);
    }
}
