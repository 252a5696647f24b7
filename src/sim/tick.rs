//! Game loop driver
//!
//! [`Game`] owns the world and the run context and advances them one fixed
//! frame at a time. It routes platform input by phase:
//!
//! ```text
//! Menu -> Playing <-> Paused
//!         Playing  -> PickPowerup -> Playing
//!         Playing  -> GameOver    -> Playing
//! ```

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use thiserror::Error;

use super::bricks::BrickGrid;
use super::entity::{Ball, Kind, Paddle};
use super::levels::{self, LevelError};
use super::particles::Particle;
use super::state::{GamePhase, RunContext};
use super::world::World;
use crate::audio::AudioSink;
use crate::consts::DESIGN_SIZE;
use crate::platform::{InputEvent, Key, Renderer};
use crate::powerups::{Category, Powerup, PowerupRegistry};
use crate::stats::RunStatistics;
use crate::tuning::{Tuning, TuningError};

#[derive(Debug, Error)]
pub enum GameError {
    #[error(transparent)]
    Tuning(#[from] TuningError),
    #[error(transparent)]
    Level(#[from] LevelError),
}

/// Powerup family offered when reaching `level`
fn level_categories(level: u32) -> &'static [Category] {
    match level {
        1 => &[Category::Brick],
        2 => &[Category::VeryBad],
        3 => &[Category::GodLike],
        _ => &[],
    }
}

#[derive(Debug)]
pub struct Game {
    phase: GamePhase,
    world: World,
    ctx: RunContext,
    registry: PowerupRegistry,
    /// Registry indices on offer while picking
    offered: Vec<usize>,
    selected: usize,
    first_level: usize,
    running: bool,
    /// Cosmetic randomness (screen shake), kept apart from the simulation
    fx_rng: Pcg32,
}

impl Game {
    /// New game waiting in the menu, with `first_level` laid out
    pub fn new(tuning: Tuning, seed: u64, first_level: usize) -> Result<Self, GameError> {
        tuning.validate()?;
        levels::layout(first_level)?;

        let mut game = Self {
            phase: GamePhase::Menu,
            world: World::new(DESIGN_SIZE),
            ctx: RunContext::new(tuning, seed),
            registry: PowerupRegistry::standard(),
            offered: Vec::new(),
            selected: 0,
            first_level,
            running: true,
            fx_rng: Pcg32::seed_from_u64(seed.wrapping_add(1)),
        };
        game.populate();
        Ok(game)
    }

    /// Like [`Game::new`], carrying statistics from earlier sessions
    pub fn with_stats(
        tuning: Tuning,
        seed: u64,
        first_level: usize,
        stats: RunStatistics,
    ) -> Result<Self, GameError> {
        let mut game = Self::new(tuning, seed, first_level)?;
        game.ctx.stats = stats;
        Ok(game)
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn world(&self) -> &World {
        &self.world
    }

    pub fn context(&self) -> &RunContext {
        &self.ctx
    }

    pub fn stats(&self) -> &RunStatistics {
        &self.ctx.stats
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Powerups on offer, in display order
    pub fn offered(&self) -> impl Iterator<Item = &Powerup> + '_ {
        self.offered.iter().filter_map(|&i| self.registry.get(i))
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    /// Throw the current run away and start a fresh one
    pub fn start_run(&mut self) {
        let seed: u64 = self.ctx.rng.random();
        let stats = std::mem::take(&mut self.ctx.stats);
        let tuning = self.ctx.tuning.clone();
        self.ctx = RunContext::with_stats(tuning, seed, stats);
        self.world = World::new(self.world.size());
        self.offered.clear();
        self.populate();
        self.begin();
    }

    fn begin(&mut self) {
        self.ctx.stats.games += 1;
        self.phase = GamePhase::Playing;
        log::info!("run {} started", self.ctx.stats.games);
    }

    fn populate(&mut self) {
        let size = self.world.size();
        let zoom = self.world.zoom();
        let tuning = &self.ctx.tuning;
        let paddle = Paddle::entity(size, tuning.paddle_size, tuning.paddle_speed, zoom);
        self.world.add(paddle);

        let grid = match BrickGrid::load(self.first_level, size, &mut self.ctx) {
            Ok(grid) => grid,
            Err(err) => {
                log::warn!("{}, using a random layout", err);
                BrickGrid::random(size, &mut self.ctx)
            }
        };
        self.world.add(grid);
        self.serve_ball();
    }

    fn serve_ball(&mut self) {
        let zoom = self.world.zoom();
        let origin = self
            .world
            .get_all(Kind::Paddle)
            .next()
            .map(|e| Paddle::serve_point(&e.body, zoom))
            .unwrap_or(self.world.size() / 2.0);
        let ball = Ball::random(origin, self.ctx.tuning.ball_radius, zoom, &mut self.ctx.rng);
        self.world.add(ball);
    }

    /// Offer a choice of powerups; stays in play when none is available
    fn offer(&mut self, categories: &[Category]) {
        let max = self.ctx.tuning.powerup_choices;
        self.offered = self.registry.choose(max, categories, &self.world, &mut self.ctx);
        self.selected = 0;
        if self.offered.is_empty() {
            log::debug!("no powerup available in {:?}", categories);
        } else {
            self.phase = GamePhase::PickPowerup;
        }
    }

    fn apply_selected(&mut self) {
        let picked = self
            .offered
            .get(self.selected)
            .and_then(|&i| self.registry.get(i))
            .copied();
        if let Some(powerup) = picked {
            powerup.apply(&mut self.world, &mut self.ctx);
        }
        self.offered.clear();
        self.phase = GamePhase::Playing;
    }

    pub fn handle_event(&mut self, event: &InputEvent) {
        match *event {
            InputEvent::Quit | InputEvent::KeyDown(Key::Escape) => {
                log::info!("quit requested");
                self.running = false;
                return;
            }
            InputEvent::Resize(size) => {
                let old = self.world.size();
                self.world.resize(old, size);
                return;
            }
            // Releases always reach the paddle so no key stays held
            InputEvent::KeyUp(_) => {
                self.world.handle_event(event, &self.ctx.rules);
                return;
            }
            _ => {}
        }

        let confirm = matches!(
            event,
            InputEvent::KeyDown(Key::Confirm) | InputEvent::MouseClick(_)
        );
        match self.phase {
            GamePhase::Menu if confirm => self.begin(),
            GamePhase::Playing => match event {
                InputEvent::KeyDown(Key::Pause | Key::Confirm) => {
                    self.phase = GamePhase::Paused;
                }
                _ => self.world.handle_event(event, &self.ctx.rules),
            },
            GamePhase::Paused => {
                if let InputEvent::KeyDown(Key::Pause | Key::Confirm) = event {
                    self.phase = GamePhase::Playing;
                }
            }
            GamePhase::PickPowerup => match event {
                InputEvent::KeyDown(Key::Left) => {
                    self.selected = self.selected.saturating_sub(1);
                }
                InputEvent::KeyDown(Key::Right) => {
                    self.selected = (self.selected + 1).min(self.offered.len().saturating_sub(1));
                }
                _ if confirm => self.apply_selected(),
                _ => {}
            },
            GamePhase::GameOver if confirm => {
                self.start_run();
                self.offer(&[]);
            }
            _ => {}
        }
    }

    /// Advance one frame
    pub fn tick(&mut self) {
        if !self.running || self.phase != GamePhase::Playing {
            return;
        }

        if self.world.bricks().is_none() {
            let grid = BrickGrid::random(self.world.size(), &mut self.ctx);
            self.world.add(grid);
        }

        self.world.tick(&mut self.ctx);
        self.ctx.env.advance(&mut self.ctx.rng, &self.ctx.tuning);
        self.ctx.stats.frames_played += 1;

        if self.world.count_with_pending(Kind::Ball) == 0 {
            self.serve_ball();
            self.ctx.lose_life(&mut self.world);
        }

        if self.ctx.gameplay.score > self.ctx.gameplay.score_for_next_powerup() {
            self.ctx.gameplay.score_level += 1;
            self.offer(&[]);
        }

        self.blow_wind();

        if self.ctx.env.auto_spawn_due(&self.ctx.tuning) {
            log::debug!("auto-spawning a ball");
            self.serve_ball();
        }

        // A pick already on screen postpones the level change to a later frame
        let cleared = self
            .world
            .bricks()
            .is_some_and(|grid| grid.live_count() < self.ctx.tuning.level_clear_threshold);
        if cleared && self.phase == GamePhase::Playing {
            self.level_up();
        }

        if self.ctx.gameplay.lives <= 0 {
            self.game_over();
        }
    }

    fn blow_wind(&mut self) {
        let wind = self.ctx.env.wind_speed;
        if wind == 0.0 {
            return;
        }
        let chance = (wind.abs() * self.ctx.tuning.wind.particle_rate).clamp(0.0, 1.0);
        if self.ctx.rng.random_bool(chance as f64) {
            let streak = Particle::wind_streak(
                wind,
                self.world.size(),
                self.world.zoom(),
                &mut self.ctx.rng,
            );
            self.world.add(streak);
        }
    }

    fn level_up(&mut self) {
        self.ctx.gameplay.level += 1;
        self.ctx.rules.ball_speed += self.ctx.tuning.ball_speed_gain;
        log::info!(
            "level {} cleared, ball speed now {:.1}",
            self.ctx.gameplay.level,
            self.ctx.rules.ball_speed
        );
        if let Some(grid) = self.world.bricks_entity_mut() {
            grid.body.alive = false;
        }
        self.offer(level_categories(self.ctx.gameplay.level));
    }

    fn game_over(&mut self) {
        let gameplay = &self.ctx.gameplay;
        let names = gameplay.powerups.iter().map(|p| p.name.clone()).collect();
        let rank = self
            .ctx
            .stats
            .record_game_over(gameplay.score, gameplay.level, names);
        log::info!(
            "game over: score {} at level {}{}",
            gameplay.score,
            gameplay.level,
            rank.map(|r| format!(", rank {r}")).unwrap_or_default()
        );
        self.offered.clear();
        self.phase = GamePhase::GameOver;
    }

    /// Input a simple player would give this frame
    ///
    /// Steers toward the lowest descending ball and takes the first powerup.
    pub fn autopilot_input(&self) -> Vec<InputEvent> {
        let press = |key| vec![InputEvent::KeyDown(key), InputEvent::KeyUp(key)];
        match self.phase {
            GamePhase::Menu | GamePhase::PickPowerup | GamePhase::GameOver => press(Key::Confirm),
            GamePhase::Paused => press(Key::Pause),
            GamePhase::Playing => self.steer(),
        }
    }

    fn steer(&self) -> Vec<InputEvent> {
        let release = vec![InputEvent::KeyUp(Key::Left), InputEvent::KeyUp(Key::Right)];
        let Some(paddle) = self.world.get_all(Kind::Paddle).next() else {
            return release;
        };
        let balls = || self.world.get_all(Kind::Ball).filter(|e| e.is_alive());
        let lowest = |a: &Vec2, b: &Vec2| a.y.total_cmp(&b.y);
        let target = balls()
            .filter(|e| e.ball().is_some_and(|b| b.direction.y > 0.0))
            .map(|e| e.body.center())
            .max_by(lowest)
            .or_else(|| balls().map(|e| e.body.center()).max_by(lowest));
        let Some(target) = target else {
            return release;
        };

        let center = paddle.body.center().x;
        let tolerance = paddle.body.size.x / 4.0;
        let (toward, away) = if target.x < center - tolerance {
            (Key::Left, Key::Right)
        } else if target.x > center + tolerance {
            (Key::Right, Key::Left)
        } else {
            return release;
        };
        let (toward, away) = if self.ctx.rules.flip_controls {
            (away, toward)
        } else {
            (toward, away)
        };
        vec![InputEvent::KeyUp(away), InputEvent::KeyDown(toward)]
    }

    /// Hand queued sound cues to the platform
    pub fn flush_audio(&mut self, sink: &mut dyn AudioSink) {
        for sound in self.ctx.drain_sounds() {
            sink.play(sound.name());
        }
    }

    pub fn draw(&mut self, renderer: &mut dyn Renderer) {
        self.world.draw(renderer, &mut self.fx_rng);
    }
}
