//! Replay system for recording and re-verifying matches.
//!
//! A replay stores the configuration, the seed and every controller input
//! with the tick it was applied on. Since the simulation is deterministic
//! that is enough to recreate the whole match and check its final hash.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::action::PlayerInput;
use crate::components::PlayerId;
use crate::data::MatchConfig;
use crate::error::{GameError, Result};
use crate::simulation::Match;

/// A single recorded input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayInput {
    /// Tick count at the moment the input was applied (before ticking).
    pub tick: u64,
    /// Acting player.
    pub player: PlayerId,
    /// The input.
    pub input: PlayerInput,
}

/// Replay file format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// Complete replay data structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replay {
    /// Replay format version.
    pub version: u32,
    /// Seed the match started from.
    pub seed: u64,
    /// Match configuration.
    pub config: MatchConfig,
    /// Inputs in application order.
    pub inputs: Vec<ReplayInput>,
    /// Tick count when recording stopped.
    pub final_tick: u64,
    /// State hash when recording stopped.
    pub final_hash: u64,
}

impl Replay {
    /// Start recording a match.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidState`] if the match has already ticked.
    pub fn new(game: &Match) -> Result<Self> {
        if game.tick_count() != 0 {
            return Err(GameError::InvalidState(format!(
                "Replay must start at tick 0, match is at tick {}",
                game.tick_count()
            )));
        }
        Ok(Self {
            version: REPLAY_VERSION,
            seed: game.seed(),
            config: game.config().clone(),
            inputs: Vec::new(),
            final_tick: 0,
            final_hash: 0,
        })
    }

    /// Record an input applied at `tick`.
    pub fn record(&mut self, tick: u64, player: PlayerId, input: PlayerInput) {
        self.inputs.push(ReplayInput {
            tick,
            player,
            input,
        });
    }

    /// Finalize the replay with the end state of the recorded match.
    pub fn finalize(&mut self, game: &Match) {
        self.final_tick = game.tick_count();
        self.final_hash = game.state_hash();
    }

    /// Save the replay to a file.
    ///
    /// # Errors
    /// Returns an error if serialization or file writing fails.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let bytes = bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize replay: {e}")))?;
        std::fs::write(path.as_ref(), bytes)
            .map_err(|e| GameError::InvalidState(format!("Failed to write replay file: {e}")))?;
        Ok(())
    }

    /// Load a replay from a file.
    ///
    /// # Errors
    /// Returns an error if file reading or deserialization fails, or the
    /// file was written by a different format version.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())
            .map_err(|e| GameError::InvalidState(format!("Failed to read replay file: {e}")))?;
        let replay: Self = bincode::deserialize(&bytes)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize replay: {e}")))?;

        if replay.version != REPLAY_VERSION {
            return Err(GameError::InvalidState(format!(
                "Replay version mismatch: expected {REPLAY_VERSION}, got {}",
                replay.version
            )));
        }

        Ok(replay)
    }

    /// Build the match the replay starts from.
    ///
    /// # Errors
    /// Returns an error if the stored configuration is invalid.
    pub fn restore_initial_state(&self) -> Result<Match> {
        Match::new(self.config.clone(), self.seed)
    }

    /// Inputs applied at a specific tick.
    #[must_use]
    pub fn inputs_at_tick(&self, tick: u64) -> Vec<&ReplayInput> {
        self.inputs.iter().filter(|i| i.tick == tick).collect()
    }

    /// Total duration in ticks.
    #[must_use]
    pub const fn duration(&self) -> u64 {
        self.final_tick
    }

    /// Re-simulate the whole replay and compare the final hash.
    ///
    /// # Errors
    /// Returns [`GameError::ReplayDiverged`] on a hash mismatch.
    pub fn verify(&self) -> Result<()> {
        let mut player = ReplayPlayer::new(self.clone())?;
        player.verify()
    }
}

/// Replay playback controller.
#[derive(Debug)]
pub struct ReplayPlayer {
    replay: Replay,
    game: Match,
    input_index: usize,
}

impl ReplayPlayer {
    /// Create a playback controller at tick 0.
    ///
    /// # Errors
    /// Returns an error if the initial state cannot be restored.
    pub fn new(replay: Replay) -> Result<Self> {
        let game = replay.restore_initial_state()?;
        Ok(Self {
            replay,
            game,
            input_index: 0,
        })
    }

    /// Apply this tick's inputs and advance one tick.
    ///
    /// Returns true if there are more ticks to play.
    pub fn advance(&mut self) -> bool {
        if self.is_finished() {
            return false;
        }

        let tick = self.game.tick_count();
        while let Some(record) = self.replay.inputs.get(self.input_index) {
            if record.tick > tick {
                break;
            }
            if let Err(e) = self.game.apply_input(record.player, record.input) {
                tracing::debug!(tick, player = %record.player, error = %e, "Replayed input failed");
            }
            self.input_index += 1;
        }

        self.game.tick();
        !self.is_finished()
    }

    /// Seek to a specific tick by replaying from the start.
    ///
    /// # Errors
    /// Returns an error if state restoration fails.
    pub fn seek(&mut self, target_tick: u64) -> Result<()> {
        if target_tick < self.game.tick_count() {
            self.game = self.replay.restore_initial_state()?;
            self.input_index = 0;
        }
        while self.game.tick_count() < target_tick && self.advance() {}
        Ok(())
    }

    /// Current tick.
    #[must_use]
    pub const fn current_tick(&self) -> u64 {
        self.game.tick_count()
    }

    /// The match being played back.
    #[must_use]
    pub const fn game(&self) -> &Match {
        &self.game
    }

    /// The replay being played.
    #[must_use]
    pub const fn replay(&self) -> &Replay {
        &self.replay
    }

    /// Whether playback reached the recorded end or the match ended early.
    #[must_use]
    pub const fn is_finished(&self) -> bool {
        self.game.tick_count() >= self.replay.final_tick || self.game.is_over()
    }

    /// Play to the end and compare against the recorded hash.
    ///
    /// # Errors
    /// Returns [`GameError::ReplayDiverged`] on a hash mismatch.
    pub fn verify(&mut self) -> Result<()> {
        self.seek(self.replay.final_tick)?;
        let actual = self.game.state_hash();
        if actual != self.replay.final_hash {
            return Err(GameError::ReplayDiverged {
                tick: self.game.tick_count(),
                expected: self.replay.final_hash,
                actual,
            });
        }
        Ok(())
    }
}
