//! Entities living in the [`World`]
//!
//! Every entity is a [`Body`] plus one variant of [`EntityKind`]. Behaviour is
//! dispatched through a fixed match on the variant; [`Kind`] is the plain tag
//! used to query the world.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::bricks::BrickGrid;
use super::collision::{bounce, circle_rect_normal, paddle_bounce};
use super::particles::{Particle, ParticleStyle, burst};
use super::rect::Rect;
use super::schedule::ScheduledAction;
use super::state::{RunContext, RunRules};
use super::world::World;
use crate::audio::Sound;
use crate::consts::PADDLE_BOTTOM_OFFSET;
use crate::platform::{DrawItem, InputEvent, Key, Renderer, Visual};
use crate::{gauss, polar};

/// Identifier assigned by the world on `add`; iteration follows it
pub type EntityId = u64;

/// Position, bounding box and liveness shared by every entity
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Body {
    /// Top-left corner
    pub pos: Vec2,
    pub size: Vec2,
    pub alive: bool,
}

impl Body {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            pos,
            size,
            alive: true,
        }
    }

    pub fn centered(center: Vec2, size: Vec2) -> Self {
        Self::new(center - size / 2.0, size)
    }

    pub fn rect(&self) -> Rect {
        Rect::from_pos_size(self.pos, self.size)
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    /// Scale position and size by `ratio`
    pub fn rescale(&mut self, ratio: f32) {
        self.pos *= ratio;
        self.size *= ratio;
    }
}

/// Tag used by [`World::get_all`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Ball,
    Paddle,
    Bricks,
    Bullet,
    Particle,
    Scheduled,
}

#[derive(Debug, Clone)]
pub enum EntityKind {
    Ball(Ball),
    Paddle(Paddle),
    Bricks(BrickGrid),
    Bullet(Bullet),
    Particle(Particle),
    Scheduled(ScheduledAction),
}

#[derive(Debug, Clone)]
pub struct Entity {
    pub id: EntityId,
    pub body: Body,
    pub kind: EntityKind,
}

impl Entity {
    /// New entity; the id is assigned when it is added to a world
    pub fn new(body: Body, kind: EntityKind) -> Self {
        Self { id: 0, body, kind }
    }

    pub fn kind(&self) -> Kind {
        match self.kind {
            EntityKind::Ball(_) => Kind::Ball,
            EntityKind::Paddle(_) => Kind::Paddle,
            EntityKind::Bricks(_) => Kind::Bricks,
            EntityKind::Bullet(_) => Kind::Bullet,
            EntityKind::Particle(_) => Kind::Particle,
            EntityKind::Scheduled(_) => Kind::Scheduled,
        }
    }

    /// Draw layer; lower layers are drawn first
    pub fn z_order(&self) -> i32 {
        match self.kind {
            EntityKind::Particle(_) => 1,
            _ => 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.body.alive
    }

    pub fn ball(&self) -> Option<&Ball> {
        match &self.kind {
            EntityKind::Ball(ball) => Some(ball),
            _ => None,
        }
    }

    pub fn paddle(&self) -> Option<&Paddle> {
        match &self.kind {
            EntityKind::Paddle(paddle) => Some(paddle),
            _ => None,
        }
    }

    pub fn paddle_mut(&mut self) -> Option<&mut Paddle> {
        match &mut self.kind {
            EntityKind::Paddle(paddle) => Some(paddle),
            _ => None,
        }
    }

    pub fn grid(&self) -> Option<&BrickGrid> {
        match &self.kind {
            EntityKind::Bricks(grid) => Some(grid),
            _ => None,
        }
    }

    pub fn grid_mut(&mut self) -> Option<&mut BrickGrid> {
        match &mut self.kind {
            EntityKind::Bricks(grid) => Some(grid),
            _ => None,
        }
    }

    /// Advance one frame. The entity is not in `world` while this runs.
    pub fn logic(&mut self, world: &mut World, ctx: &mut RunContext) {
        let body = &mut self.body;
        match &mut self.kind {
            EntityKind::Ball(ball) => ball.logic(body, world, ctx),
            EntityKind::Paddle(paddle) => paddle.logic(body, world, ctx),
            EntityKind::Bricks(grid) => grid.logic(world, ctx),
            EntityKind::Bullet(bullet) => bullet.logic(body, world, ctx),
            EntityKind::Particle(particle) => particle.logic(body),
            EntityKind::Scheduled(action) => action.logic(body, world, ctx),
        }
    }

    /// Called exactly once, before the entity is removed. Only this entity is
    /// out of `world` while it runs; others that died this frame are still there.
    pub fn on_death(&mut self, world: &mut World, ctx: &mut RunContext) {
        if let EntityKind::Ball(_) = self.kind {
            ctx.stats.balls_lost += 1;
            world.shake(5);
            // This ball included
            let balls = world.get_all(Kind::Ball).count() + 1;
            let count = if balls > 1 { 10 } else { 45 };
            burst(world, self.body.center(), count, ParticleStyle::Ember, &mut ctx.rng);
        }
    }

    pub fn handle_event(&mut self, event: &InputEvent, screen: Vec2, rules: &RunRules) {
        if let EntityKind::Paddle(paddle) = &mut self.kind {
            paddle.handle_event(event, &self.body, screen, rules);
        }
    }

    pub fn draw(&self, renderer: &mut dyn Renderer) {
        let z = self.z_order();
        let visual = match &self.kind {
            EntityKind::Ball(_) => Visual::Ball,
            EntityKind::Paddle(_) => Visual::Paddle,
            EntityKind::Bricks(grid) => {
                grid.draw(renderer, z);
                return;
            }
            EntityKind::Bullet(bullet) => Visual::Bullet {
                direction: bullet.velocity.normalize_or_zero(),
            },
            EntityKind::Particle(particle) => Visual::Particle {
                style: particle.style,
                age: particle.age,
                lifespan: particle.lifespan,
            },
            EntityKind::Scheduled(_) => return,
        };
        renderer.draw(&DrawItem {
            pos: self.body.pos,
            size: self.body.size,
            z,
            visual,
        });
    }

    /// Follow a change of screen size from `old` to `new`
    pub fn resize(&mut self, old: Vec2, new: Vec2) {
        let ratio = new.x / old.x;
        match &mut self.kind {
            EntityKind::Paddle(_) => {
                // Keep the distance to the bottom of the screen
                let y = self.body.pos.y + new.y - old.y;
                self.body.rescale(ratio);
                self.body.pos.y = y;
            }
            EntityKind::Bricks(grid) => {
                self.body.size = Vec2::new(new.x, new.y * grid.height_fraction());
                grid.relayout(self.body.size);
            }
            EntityKind::Particle(particle) => {
                self.body.rescale(ratio);
                particle.velocity *= ratio;
            }
            _ => self.body.rescale(ratio),
        }
    }
}

// ===== Ball =====

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Ball {
    /// Unit heading
    pub direction: Vec2,
}

impl Ball {
    /// Ball of design `radius` centered on `center`, heading at `angle` degrees
    pub fn entity(center: Vec2, angle: f32, radius: f32, zoom: f32) -> Entity {
        let size = Vec2::splat(radius * 2.0 * zoom);
        Entity::new(
            Body::centered(center, size),
            EntityKind::Ball(Ball {
                direction: polar(1.0, angle),
            }),
        )
    }

    /// Ball with a slightly random upward heading
    pub fn random(center: Vec2, radius: f32, zoom: f32, rng: &mut impl rand::Rng) -> Entity {
        Self::entity(center, gauss(rng, -90.0, 10.0), radius, zoom)
    }

    pub fn radius(body: &Body) -> f32 {
        body.size.x / 2.0
    }

    fn logic(&mut self, body: &mut Body, world: &mut World, ctx: &mut RunContext) {
        let zoom = world.zoom();
        let screen = world.size();

        let mut step = self.direction * ctx.rules.ball_speed * zoom;
        // Never let the ball crawl horizontally forever
        if step.y.abs() < 1.0 {
            step.y = if step.y > 0.0 { 1.0 } else { -1.0 };
        }
        body.pos += step;
        body.pos.x += ctx.env.wind_speed * zoom;

        if body.pos.x < 0.0 {
            body.pos.x = 0.0;
            self.direction.x = self.direction.x.abs();
        }
        if body.pos.x > screen.x - body.size.x {
            body.pos.x = screen.x - body.size.x;
            self.direction.x = -self.direction.x.abs();
        }
        if body.pos.y < 0.0 {
            body.pos.y = 0.0;
            self.direction.y = self.direction.y.abs();
        }
        if body.pos.y > screen.y {
            body.alive = false;
            return;
        }

        let center = body.center();
        let radius = Self::radius(body);

        if self.direction.y > 0.0 {
            let paddles: Vec<Rect> = world.get_all(Kind::Paddle).map(|e| e.body.rect()).collect();
            for paddle in &paddles {
                if circle_rect_normal(center, radius, paddle).is_some() {
                    self.direction = paddle_bounce(
                        center.x,
                        paddle,
                        ctx.tuning.paddle_angle_steps,
                        ctx.tuning.paddle_max_offset,
                    );
                    ctx.play(Sound::Bong);
                    break;
                }
            }
        }

        let Some((grid, mut spawner)) = world.bricks_and_spawner() else {
            return;
        };
        let contacts: Vec<(usize, usize, Vec2, bool)> = grid
            .all_bricks()
            .filter(|(_, _, brick)| brick.body.alive)
            .filter_map(|(row, col, brick)| {
                circle_rect_normal(center, radius, &brick.body.rect())
                    .map(|normal| (row, col, normal, brick.solid()))
            })
            .collect();
        for (row, col, normal, solid) in contacts {
            if let Some(direction) = bounce(self.direction, normal, solid) {
                self.direction = direction;
                grid.hit(row, col, 1, true, &mut spawner, ctx);
            }
        }
    }
}

// ===== Paddle =====

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Paddle {
    /// Design pixels per frame
    pub move_speed: f32,
    /// Screen x the paddle's left edge is heading to, when mouse control is on
    pub mouse_goal: Option<f32>,
    pub left_held: bool,
    pub right_held: bool,
}

impl Paddle {
    /// Paddle centered horizontally, `PADDLE_BOTTOM_OFFSET` above the bottom
    pub fn entity(screen: Vec2, size: Vec2, move_speed: f32, zoom: f32) -> Entity {
        let size = size * zoom;
        let pos = Vec2::new(
            screen.x / 2.0 - size.x / 2.0,
            screen.y - PADDLE_BOTTOM_OFFSET * zoom,
        );
        Entity::new(
            Body::new(pos, size),
            EntityKind::Paddle(Paddle {
                move_speed,
                ..Default::default()
            }),
        )
    }

    /// Where a ball served by this paddle appears
    pub fn serve_point(body: &Body, zoom: f32) -> Vec2 {
        body.center() + Vec2::new(0.0, -30.0 * zoom)
    }

    fn logic(&mut self, body: &mut Body, world: &mut World, ctx: &mut RunContext) {
        let zoom = world.zoom();
        let screen = world.size();
        let flip = if ctx.rules.flip_controls { -1.0 } else { 1.0 };
        let step = self.move_speed * zoom;

        if self.left_held {
            self.mouse_goal = None;
            body.pos.x -= step * flip;
        }
        if self.right_held {
            self.mouse_goal = None;
            body.pos.x += step * flip;
        }
        if let Some(goal) = self.mouse_goal {
            body.pos.x += (goal - body.pos.x).clamp(-step, step);
        }

        body.pos.x += ctx.env.wind_speed * zoom;
        body.pos.x = body.pos.x.clamp(0.0, (screen.x - body.size.x).max(0.0));
    }

    fn handle_event(&mut self, event: &InputEvent, body: &Body, screen: Vec2, rules: &RunRules) {
        match *event {
            InputEvent::KeyDown(Key::Left) => self.left_held = true,
            InputEvent::KeyUp(Key::Left) => self.left_held = false,
            InputEvent::KeyDown(Key::Right) => self.right_held = true,
            InputEvent::KeyUp(Key::Right) => self.right_held = false,
            InputEvent::MouseMove(pos) if rules.mouse_control => {
                let x = if rules.flip_controls { screen.x - pos.x } else { pos.x };
                self.mouse_goal = Some((x - body.size.x / 2.0).clamp(0.0, (screen.x - body.size.x).max(0.0)));
            }
            _ => {}
        }
    }
}

// ===== Enemy bullet =====

/// Design size of an enemy bullet
const BULLET_SIZE: Vec2 = Vec2::new(6.0, 2.0);
const BULLET_EXPLOSION_PARTICLES: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bullet {
    /// Design pixels per frame
    pub velocity: Vec2,
}

impl Bullet {
    pub fn entity(center: Vec2, direction: Vec2, speed: f32, zoom: f32) -> Entity {
        let direction = direction.try_normalize().unwrap_or(Vec2::Y);
        Entity::new(
            Body::centered(center, BULLET_SIZE * zoom),
            EntityKind::Bullet(Bullet {
                velocity: direction * speed,
            }),
        )
    }

    fn logic(&mut self, body: &mut Body, world: &mut World, ctx: &mut RunContext) {
        body.pos += self.velocity * world.zoom();

        let rect = body.rect();
        let hit_paddle = world.get_all(Kind::Paddle).any(|e| rect.intersects(&e.body.rect()));
        if hit_paddle {
            log::debug!("enemy bullet hit the paddle");
            ctx.stats.bullet_hit += 1;
            ctx.lose_life(world);
            body.alive = false;
            burst(
                world,
                body.center(),
                BULLET_EXPLOSION_PARTICLES,
                ParticleStyle::Ember,
                &mut ctx.rng,
            );
        }

        let screen = Rect::from_pos_size(Vec2::ZERO, world.size());
        if !rect.intersects(&screen) {
            body.alive = false;
        }
    }
}
