//! Brick grid: layout, damage and propagation
//!
//! Bricks are not entities. The whole grid is one entity and owns its cells;
//! dead bricks stay in place until the grid's next logic pass sweeps them.

use std::collections::BTreeMap;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::entity::{Ball, Body, Entity, EntityKind};
use super::levels::{self, LevelError};
use super::particles::{ParticleStyle, burst};
use super::schedule::{Deferred, ScheduledAction};
use super::state::RunContext;
use super::world::{Spawn, World};
use crate::audio::Sound;
use crate::platform::{DrawItem, Renderer, Visual};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum BrickVariant {
    Plain,
    /// Never deflects the ball
    Glass,
    /// Damages its 3×3 neighbourhood when hit
    Bomb,
    /// Releases a ball when destroyed
    Double,
}

impl BrickVariant {
    /// Variant of a level tile code; `None` is an empty cell
    pub fn from_tile(code: u8) -> Option<Self> {
        match code {
            3 => Some(BrickVariant::Glass),
            5 => Some(BrickVariant::Plain),
            10 => Some(BrickVariant::Double),
            12 => Some(BrickVariant::Bomb),
            _ => None,
        }
    }

    pub fn solid(self) -> bool {
        self != BrickVariant::Glass
    }

    /// Single-hit bricks ignore the run's brick life
    pub fn single_hit(self) -> bool {
        self != BrickVariant::Plain
    }

    /// Particles spawned on destruction; half as many on a plain hit
    pub fn particles(self) -> usize {
        match self {
            BrickVariant::Plain | BrickVariant::Glass => 6,
            BrickVariant::Bomb => 35,
            BrickVariant::Double => 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brick {
    pub body: Body,
    pub life: i32,
    pub variant: BrickVariant,
}

impl Brick {
    pub fn new(variant: BrickVariant, body: Body, brick_life: i32) -> Self {
        let life = if variant.single_hit() { 1 } else { brick_life.max(1) };
        Self {
            body,
            life,
            variant,
        }
    }

    pub fn solid(&self) -> bool {
        self.variant.solid()
    }
}

#[derive(Debug, Clone)]
pub struct BrickGrid {
    rows: usize,
    cols: usize,
    cells: Vec<Option<Brick>>,
    area: Vec2,
    cell_size: Vec2,
    height_fraction: f32,
}

impl BrickGrid {
    /// Empty grid covering `area` from the top-left corner of the screen
    pub fn new(rows: usize, cols: usize, area: Vec2, height_fraction: f32) -> Self {
        Self {
            rows,
            cols,
            cells: vec![None; rows * cols],
            area,
            cell_size: area / Vec2::new(cols as f32, rows as f32),
            height_fraction,
        }
    }

    /// Grid built from a tile matrix; unknown codes are empty cells
    pub fn from_tiles(
        tiles: &[Vec<u8>],
        area: Vec2,
        height_fraction: f32,
        brick_life: i32,
    ) -> Self {
        let rows = tiles.len();
        let cols = tiles.iter().map(Vec::len).max().unwrap_or(0);
        let mut grid = Self::new(rows, cols, area, height_fraction);
        for (row, line) in tiles.iter().enumerate() {
            for (col, &code) in line.iter().enumerate() {
                grid.set(row, col, BrickVariant::from_tile(code), brick_life);
            }
        }
        grid
    }

    /// Grid entity for embedded level `index`
    pub fn load(index: usize, screen: Vec2, ctx: &mut RunContext) -> Result<Entity, LevelError> {
        let text = levels::layout(index)?;
        log::info!("loading level layout {}", index);
        Ok(Self::from_layout(text, screen, ctx))
    }

    /// Grid entity for a random embedded level
    pub fn random(screen: Vec2, ctx: &mut RunContext) -> Entity {
        let index = levels::random_index(&mut ctx.rng);
        match Self::load(index, screen, ctx) {
            Ok(entity) => entity,
            Err(err) => {
                log::warn!("{}, using an empty grid", err);
                Self::from_layout("", screen, ctx)
            }
        }
    }

    fn from_layout(text: &str, screen: Vec2, ctx: &mut RunContext) -> Entity {
        let fraction = ctx.tuning.grid_height_fraction;
        let area = Vec2::new(screen.x, screen.y * fraction);
        let tiles = levels::tiles_from_text(text, ctx.tuning.grid_rows, ctx.tuning.grid_cols);
        let mut grid = Self::from_tiles(&tiles, area, fraction, ctx.rules.brick_life);
        grid.sprinkle(&ctx.rules.extra_bricks, ctx.rules.brick_life, &mut ctx.rng);
        grid.into_entity()
    }

    pub fn into_entity(self) -> Entity {
        Entity::new(Body::new(Vec2::ZERO, self.area), EntityKind::Bricks(self))
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn height_fraction(&self) -> f32 {
        self.height_fraction
    }

    fn index(&self, row: usize, col: usize) -> Option<usize> {
        (row < self.rows && col < self.cols).then(|| row * self.cols + col)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Brick> {
        self.index(row, col).and_then(|i| self.cells[i].as_ref())
    }

    pub fn cell_mut(&mut self, row: usize, col: usize) -> Option<&mut Brick> {
        self.index(row, col).and_then(|i| self.cells[i].as_mut())
    }

    /// Screen position of a cell's top-left corner
    pub fn to_screen(&self, row: usize, col: usize) -> Vec2 {
        Vec2::new(col as f32, row as f32) * self.cell_size
    }

    /// Put a brick of `variant` in a cell, or clear it with `None`
    pub fn set(&mut self, row: usize, col: usize, variant: Option<BrickVariant>, brick_life: i32) {
        let body = Body::new(self.to_screen(row, col), self.cell_size);
        if let Some(i) = self.index(row, col) {
            self.cells[i] = variant.map(|v| Brick::new(v, body, brick_life));
        }
    }

    /// Every occupied cell as `(row, col, brick)`, dead bricks included
    pub fn all_bricks(&self) -> impl Iterator<Item = (usize, usize, &Brick)> + '_ {
        let cols = self.cols;
        self.cells
            .iter()
            .enumerate()
            .filter_map(move |(i, cell)| cell.as_ref().map(|b| (i / cols, i % cols, b)))
    }

    /// Bricks in columns `x..x+w` and rows `y..y+h`
    ///
    /// Parts of the range outside the grid yield nothing.
    pub fn brick_range(
        &self,
        x: i64,
        y: i64,
        w: i64,
        h: i64,
    ) -> impl Iterator<Item = (usize, usize, &Brick)> + '_ {
        self.all_bricks().filter(move |&(row, col, _)| {
            let (row, col) = (row as i64, col as i64);
            x <= col && col < x + w && y <= row && row < y + h
        })
    }

    /// Number of bricks still standing
    pub fn live_count(&self) -> usize {
        self.all_bricks().filter(|(_, _, b)| b.body.alive).count()
    }

    /// Hit the brick at `(row, col)`
    ///
    /// Does nothing for an empty cell or a brick that is already dead, which is
    /// what bounds bomb chains: every bomb goes off at most once.
    pub fn hit<S: Spawn + ?Sized>(
        &mut self,
        row: usize,
        col: usize,
        damage: i32,
        sound: bool,
        spawn: &mut S,
        ctx: &mut RunContext,
    ) {
        let Some(brick) = self.cell(row, col) else {
            return;
        };
        if !brick.body.alive {
            return;
        }
        let center = brick.body.center();
        let variant = brick.variant;

        match variant {
            BrickVariant::Bomb => {
                ctx.stats.explosions += 1;
                ctx.play(Sound::Bomb);
                self.damage(row, col, damage, false, spawn, ctx);

                let neighbours: Vec<(usize, usize)> = self
                    .brick_range(col as i64 - 1, row as i64 - 1, 3, 3)
                    .filter(|&(r, c, _)| (r, c) != (row, col))
                    .map(|(r, c, _)| (r, c))
                    .collect();
                let bomb_damage = ctx.tuning.bomb_damage;
                for (r, c) in neighbours {
                    self.hit(r, c, bomb_damage, false, spawn, ctx);
                }
            }
            BrickVariant::Double => {
                if self.damage(row, col, damage, sound, spawn, ctx) {
                    let ball = Ball::random(center, ctx.tuning.ball_radius, spawn.zoom(), &mut ctx.rng);
                    spawn.spawn(ball);
                }
            }
            BrickVariant::Plain | BrickVariant::Glass => {
                self.damage(row, col, damage, sound, spawn, ctx);
            }
        }
    }

    /// Damage shared by every variant; returns whether the brick died
    fn damage<S: Spawn + ?Sized>(
        &mut self,
        row: usize,
        col: usize,
        damage: i32,
        sound: bool,
        spawn: &mut S,
        ctx: &mut RunContext,
    ) -> bool {
        let Some(brick) = self.cell_mut(row, col) else {
            return false;
        };
        if sound {
            ctx.play(Sound::Hit);
        }

        brick.life -= damage;
        let destroyed = brick.life <= 0;
        let particles = if destroyed {
            brick.body.alive = false;
            ctx.stats.bricks_destroyed += 1;
            brick.variant.particles()
        } else {
            brick.variant.particles() / 2
        };
        let center = brick.body.center();

        let score = ctx.award(!destroyed);
        log::trace!("brick ({}, {}) hit for {} points", row, col, score);
        burst(spawn, center, particles, ParticleStyle::Spark, &mut ctx.rng);
        destroyed
    }

    /// Replace random occupied cells with extra variant bricks
    pub fn sprinkle(
        &mut self,
        extra: &BTreeMap<BrickVariant, u32>,
        brick_life: i32,
        rng: &mut impl Rng,
    ) {
        for (&variant, &amount) in extra {
            for _ in 0..amount {
                let occupied: Vec<(usize, usize)> =
                    self.all_bricks().map(|(r, c, _)| (r, c)).collect();
                if occupied.is_empty() {
                    return;
                }
                let (row, col) = occupied[rng.random_range(0..occupied.len())];
                self.set(row, col, Some(variant), brick_life);
            }
        }
    }

    /// Lay the cells out over a new area
    pub fn relayout(&mut self, area: Vec2) {
        self.area = area;
        self.cell_size = area / Vec2::new(self.cols as f32, self.rows as f32);
        let cols = self.cols;
        let cell_size = self.cell_size;
        for (i, cell) in self.cells.iter_mut().enumerate() {
            if let Some(brick) = cell {
                brick.body.pos = Vec2::new((i % cols) as f32, (i / cols) as f32) * cell_size;
                brick.body.size = cell_size;
            }
        }
    }

    pub(crate) fn logic(&mut self, world: &mut World, ctx: &mut RunContext) {
        for cell in &mut self.cells {
            if cell.as_ref().is_some_and(|b| !b.body.alive) {
                *cell = None;
            }
        }

        if ctx.env.brick_fire_level == 0 {
            return;
        }
        let Some(target) = world.paddle_center() else {
            return;
        };
        for brick in self.cells.iter().flatten() {
            if ctx.env.fire_check(&mut ctx.rng, &ctx.tuning) {
                let origin = brick.body.center();
                log::debug!("brick at {:?} takes aim at {:?}", origin, target);
                ctx.play(Sound::PreShot);
                // Aimed now, not when the bullet leaves
                world.add(ScheduledAction::entity(
                    ctx.tuning.fire.delay_frames,
                    Deferred::SpawnBullet {
                        origin,
                        direction: target - origin,
                    },
                ));
            }
        }
    }

    pub(crate) fn draw(&self, renderer: &mut dyn Renderer, z: i32) {
        for (_, _, brick) in self.all_bricks() {
            renderer.draw(&DrawItem {
                pos: brick.body.pos,
                size: brick.body.size,
                z,
                visual: Visual::Brick {
                    variant: brick.variant,
                    life: brick.life,
                },
            });
        }
    }
}
