//! Run statistics and best-runs leaderboard
//!
//! Counters are updated by the simulation and handed to the platform as JSON;
//! the core never touches storage itself.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of best runs to keep
pub const MAX_BEST_RUNS: usize = 10;

#[derive(Debug, Error)]
pub enum StatsError {
    #[error("invalid statistics json: {0}")]
    Parse(#[from] serde_json::Error),
}

/// A finished run on the leaderboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    pub score: i64,
    /// Level reached
    pub level: u32,
    /// Names of the powerups taken, in order
    pub powerups: Vec<String>,
}

/// Counters accumulated across runs
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RunStatistics {
    pub games: u32,
    pub highscore: i64,
    pub total_score: i64,
    pub explosions: u64,
    pub bricks_destroyed: u64,
    pub balls_lost: u64,
    pub bullet_hit: u64,
    pub frames_played: u64,
    pub powerups: u64,
    /// Sorted by descending score
    pub best_runs: Vec<RunRecord>,
}

impl RunStatistics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, StatsError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> Result<String, StatsError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn minutes_played(&self, fps: u32) -> f64 {
        self.frames_played as f64 / fps.max(1) as f64 / 60.0
    }

    /// Check if a score makes it onto the leaderboard
    pub fn qualifies(&self, score: i64) -> bool {
        if score <= 0 {
            return false;
        }
        if self.best_runs.len() < MAX_BEST_RUNS {
            return true;
        }
        self.best_runs.last().is_none_or(|r| score > r.score)
    }

    /// Record a finished run
    ///
    /// Returns the leaderboard rank (1-indexed) when the run made it.
    pub fn record_game_over(&mut self, score: i64, level: u32, powerups: Vec<String>) -> Option<usize> {
        if score > self.highscore {
            log::info!("new highscore {} (was {})", score, self.highscore);
            self.highscore = score;
        }

        if !self.qualifies(score) {
            return None;
        }

        let record = RunRecord {
            score,
            level,
            powerups,
        };
        let pos = self
            .best_runs
            .iter()
            .position(|r| score > r.score)
            .unwrap_or(self.best_runs.len());
        self.best_runs.insert(pos, record);
        self.best_runs.truncate(MAX_BEST_RUNS);
        Some(pos + 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_statistics_are_zero() {
        let stats = RunStatistics::new();
        assert_eq!(stats.games, 0);
        assert!(stats.best_runs.is_empty());
        assert_eq!(stats.minutes_played(60), 0.0);
    }

    #[test]
    fn test_record_updates_highscore_and_ranks() {
        let mut stats = RunStatistics::new();
        assert_eq!(stats.record_game_over(100, 2, vec![]), Some(1));
        assert_eq!(stats.record_game_over(300, 4, vec!["Wind".into()]), Some(1));
        assert_eq!(stats.record_game_over(200, 3, vec![]), Some(2));
        assert_eq!(stats.highscore, 300);
        let scores: Vec<i64> = stats.best_runs.iter().map(|r| r.score).collect();
        assert_eq!(scores, vec![300, 200, 100]);
        assert_eq!(stats.best_runs[0].powerups, vec!["Wind".to_string()]);
    }

    #[test]
    fn test_zero_score_never_qualifies() {
        let mut stats = RunStatistics::new();
        assert_eq!(stats.record_game_over(0, 0, vec![]), None);
        assert!(stats.best_runs.is_empty());
    }

    #[test]
    fn test_leaderboard_is_capped() {
        let mut stats = RunStatistics::new();
        for score in 1..=MAX_BEST_RUNS as i64 {
            stats.record_game_over(score * 10, 1, vec![]);
        }
        assert!(!stats.qualifies(5));
        assert_eq!(stats.record_game_over(5, 1, vec![]), None);
        assert_eq!(stats.record_game_over(55, 1, vec![]), Some(6));
        assert_eq!(stats.best_runs.len(), MAX_BEST_RUNS);
        assert_eq!(stats.best_runs.last().unwrap().score, 20);
    }

    #[test]
    fn test_json_hand_off() {
        let mut stats = RunStatistics::new();
        stats.games = 3;
        stats.explosions = 7;
        stats.record_game_over(42, 1, vec!["Mirror".into()]);
        let json = stats.to_json().unwrap();
        assert_eq!(RunStatistics::from_json(&json).unwrap(), stats);
    }

    #[test]
    fn test_missing_fields_default() {
        let stats = RunStatistics::from_json(r#"{ "games": 2 }"#).unwrap();
        assert_eq!(stats.games, 2);
        assert_eq!(stats.highscore, 0);
        assert!(matches!(
            RunStatistics::from_json("[1, 2]"),
            Err(StatsError::Parse(_))
        ));
    }

    #[test]
    fn test_minutes_played() {
        let stats = RunStatistics {
            frames_played: 60 * 60 * 3,
            ..Default::default()
        };
        assert!((stats.minutes_played(60) - 3.0).abs() < 1e-9);
    }
}
