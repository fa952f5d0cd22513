//! Batch match runner for balance testing.
//!
//! Runs many seeds in parallel using rayon. Matches share nothing, so the
//! result of each seed is independent of scheduling.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use linewars_core::data::MatchConfig;
use linewars_core::error::Result as GameResult;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::controllers::ControllerKind;
use crate::game_runner::{run_game, GameConfig, DEFAULT_MAX_TICKS};
use crate::metrics::{BatchSummary, GameMetrics};

/// Configuration for a batch run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Match configuration shared by every game
    pub match_config: MatchConfig,
    /// Number of games to run
    pub game_count: u32,
    /// Maximum parallel games (0 = use rayon default)
    pub parallel_games: u32,
    /// Seed of the first game; game `i` uses `seed_start + i`
    pub seed_start: u64,
    /// Tick cap per game
    pub max_ticks: u64,
    /// Controller for player one, then player two
    pub controllers: [ControllerKind; 2],
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            match_config: MatchConfig::default(),
            game_count: 100,
            parallel_games: 0,
            seed_start: 0,
            max_ticks: DEFAULT_MAX_TICKS,
            controllers: [ControllerKind::Greedy; 2],
        }
    }
}

impl BatchConfig {
    /// Create config for `game_count` games
    pub fn new(match_config: MatchConfig, game_count: u32) -> Self {
        Self {
            match_config,
            game_count,
            ..Default::default()
        }
    }

    /// Set seed start
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set controllers
    pub fn with_controllers(mut self, one: ControllerKind, two: ControllerKind) -> Self {
        self.controllers = [one, two];
        self
    }

    /// Set tick cap
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    fn game_config(&self, seed: u64) -> GameConfig {
        GameConfig::new(self.match_config.clone(), seed)
            .with_controllers(self.controllers[0], self.controllers[1])
            .with_max_ticks(self.max_ticks)
    }
}

/// Results from a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used
    pub config: BatchConfig,
    /// Individual game metrics, in seed order
    pub games: Vec<GameMetrics>,
    /// Aggregate summary
    pub summary: BatchSummary,
    /// Total runtime
    pub duration_seconds: f64,
    /// Errors encountered
    pub errors: Vec<BatchError>,
}

impl BatchResults {
    /// Save results to JSON file
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from JSON file
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }

    /// Default file name inside an output directory
    pub fn default_path(dir: &Path) -> PathBuf {
        dir.join("batch_results.json")
    }
}

/// Error during batch run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchError {
    /// Game index
    pub game_index: u32,
    /// Seed used
    pub seed: u64,
    /// Error message
    pub message: String,
}

fn run_all(config: &BatchConfig) -> Vec<Result<GameMetrics, BatchError>> {
    let completed = AtomicU32::new(0);

    (0..config.game_count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(u64::from(i));
            let result = match run_game(config.game_config(seed)) {
                Ok(result) => Ok(result.metrics),
                Err(e) => {
                    warn!("Game {} (seed {}) failed: {}", i, seed, e);
                    Err(BatchError {
                        game_index: i,
                        seed,
                        message: e.to_string(),
                    })
                }
            };

            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if done % 10 == 0 {
                debug!("Progress: {}/{}", done, config.game_count);
            }
            result
        })
        .collect()
}

/// Run a batch of games
pub fn run_batch(config: BatchConfig) -> BatchResults {
    let start = Instant::now();

    info!(
        games = config.game_count,
        one = %config.controllers[0],
        two = %config.controllers[1],
        seed_start = config.seed_start,
        "Starting batch run"
    );

    let results = if config.parallel_games > 0 {
        match rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_games as usize)
            .build()
        {
            Ok(pool) => pool.install(|| run_all(&config)),
            Err(e) => {
                warn!("Failed to build thread pool: {}, using the global pool", e);
                run_all(&config)
            }
        }
    } else {
        run_all(&config)
    };

    let (games, errors): (Vec<_>, Vec<_>) = results.into_iter().partition(Result::is_ok);
    let games: Vec<GameMetrics> = games.into_iter().filter_map(Result::ok).collect();
    let errors: Vec<BatchError> = errors.into_iter().filter_map(Result::err).collect();

    let summary = BatchSummary::from_games(&games);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} games in {:.1}s ({:.1} games/sec)",
        games.len(),
        duration_seconds,
        games.len() as f64 / duration_seconds.max(0.001)
    );

    BatchResults {
        config,
        games,
        summary,
        duration_seconds,
        errors,
    }
}

/// Verify determinism by running the same seed multiple times.
///
/// Returns the distinct final hashes; a deterministic match yields one.
///
/// # Errors
///
/// Returns an error if the match configuration is invalid.
pub fn verify_determinism(config: &BatchConfig, seed: u64, runs: u32) -> GameResult<Vec<u64>> {
    let mut hashes = (0..runs)
        .into_par_iter()
        .map(|_| run_game(config.game_config(seed)).map(|r| r.final_state_hash))
        .collect::<GameResult<Vec<u64>>>()?;

    hashes.sort_unstable();
    hashes.dedup();
    if hashes.len() > 1 {
        warn!(seed, distinct = hashes.len(), "Non-determinism detected");
    }
    Ok(hashes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_batch(count: u32) -> BatchConfig {
        BatchConfig::new(MatchConfig::default(), count)
            .with_seed(100)
            .with_controllers(ControllerKind::Random, ControllerKind::Greedy)
            .with_max_ticks(400)
    }

    #[test]
    fn test_batch_runs_every_seed() {
        let results = run_batch(small_batch(6));
        assert!(results.errors.is_empty());
        assert_eq!(results.games.len(), 6);
        assert_eq!(results.summary.total_games, 6);

        let seeds: Vec<u64> = results.games.iter().map(|g| g.seed).collect();
        assert_eq!(seeds, (100..106).collect::<Vec<_>>());
    }

    #[test]
    fn test_batch_independent_of_thread_count() {
        let mut config = small_batch(4);
        config.parallel_games = 1;
        let serial = run_batch(config.clone());
        config.parallel_games = 4;
        let parallel = run_batch(config);

        let hashes = |r: &BatchResults| -> Vec<u64> {
            r.games.iter().map(|g| g.final_state_hash).collect()
        };
        assert_eq!(hashes(&serial), hashes(&parallel));
    }

    #[test]
    fn test_invalid_config_reports_errors() {
        let mut config = small_batch(3);
        config.match_config.units.clear();
        let results = run_batch(config);
        assert!(results.games.is_empty());
        assert_eq!(results.errors.len(), 3);
    }

    #[test]
    fn test_verify_determinism() {
        let hashes = verify_determinism(&small_batch(1), 5, 3).unwrap();
        assert_eq!(hashes.len(), 1);
    }

    #[test]
    fn test_results_save_load() {
        let results = run_batch(small_batch(2));
        let dir = tempfile::tempdir().unwrap();
        let path = BatchResults::default_path(dir.path());
        results.save(&path).unwrap();

        let loaded = BatchResults::load(&path).unwrap();
        assert_eq!(loaded.games, results.games);
        assert_eq!(loaded.config, results.config);
    }
}
