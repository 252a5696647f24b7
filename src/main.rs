//! Violet headless runner
//!
//! Plays a seeded run on autopilot, without a window or sound device, and
//! prints the resulting statistics as JSON.
//!
//! ```text
//! violet [--seed N] [--frames N] [--level N] [--tuning FILE]
//! ```

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::Parser;
use violet::audio::LogSink;
use violet::platform::{DrawItem, Renderer};
use violet::sim::Game;
use violet::Tuning;

/// Ten minutes of play
const DEFAULT_FRAMES: u64 = 60 * 60 * 10;

/// Renderer that only counts what it is asked to draw
#[derive(Debug, Default)]
struct CountingRenderer {
    items: u64,
    shaken_frames: u64,
}

impl Renderer for CountingRenderer {
    fn draw(&mut self, _item: &DrawItem) {
        self.items += 1;
    }

    fn scroll(&mut self, _dx: i32, _dy: i32) {
        self.shaken_frames += 1;
    }
}

/// Play a seeded Violet run on autopilot
#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Seed for the run's random number generator
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Number of frames to simulate
    #[arg(long, default_value_t = DEFAULT_FRAMES)]
    frames: u64,
    /// Index of the first level layout
    #[arg(long, default_value_t = 0)]
    level: usize,
    /// JSON file with balance tuning
    #[arg(long, value_name = "FILE")]
    tuning: Option<PathBuf>,
}

fn load_tuning(path: Option<&Path>) -> Tuning {
    let Some(path) = path else {
        return Tuning::default();
    };
    let loaded = std::fs::read_to_string(path)
        .map_err(|e| e.to_string())
        .and_then(|json| Tuning::from_json(&json).map_err(|e| e.to_string()));
    match loaded {
        Ok(tuning) => {
            log::info!("tuning loaded from {}", path.display());
            tuning
        }
        Err(err) => {
            log::warn!(
                "could not load tuning from {}: {}, using defaults",
                path.display(),
                err
            );
            Tuning::default()
        }
    }
}

fn main() -> ExitCode {
    #[cfg(not(target_arch = "wasm32"))]
    env_logger::init();

    let args = Args::parse();
    log::info!("Violet starting: seed {}, {} frames", args.seed, args.frames);

    let tuning = load_tuning(args.tuning.as_deref());
    let fps = tuning.fps;
    let mut game = match Game::new(tuning, args.seed, args.level) {
        Ok(game) => game,
        Err(err) => {
            log::error!("cannot start: {}", err);
            return ExitCode::FAILURE;
        }
    };

    let mut renderer = CountingRenderer::default();
    let mut sink = LogSink::default();
    for _ in 0..args.frames {
        if !game.is_running() {
            break;
        }
        for event in game.autopilot_input() {
            game.handle_event(&event);
        }
        game.tick();
        game.draw(&mut renderer);
        game.flush_audio(&mut sink);
    }

    let stats = game.stats();
    log::info!(
        "{} runs, highscore {}, {} bricks destroyed, {} balls lost, {:.1} minutes played",
        stats.games,
        stats.highscore,
        stats.bricks_destroyed,
        stats.balls_lost,
        stats.minutes_played(fps)
    );
    log::debug!(
        "{} draw items, {} shaken frames, {} sounds",
        renderer.items,
        renderer.shaken_frames,
        sink.played
    );

    match stats.to_json() {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            log::error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
