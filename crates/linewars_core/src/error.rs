//! Error types for the line wars simulation.
//!
//! Expected domain conditions (insufficient gold, occupied tile, reloading
//! weapon) are not errors. They surface as `false` or as an
//! [`ActionOutcome`](crate::action::ActionOutcome). This enum covers invalid
//! requests from controllers and construction/configuration bugs.

use thiserror::Error;

/// Result type alias using [`GameError`].
pub type Result<T> = std::result::Result<T, GameError>;

/// Top-level error type for all simulation errors.
#[derive(Debug, Error)]
pub enum GameError {
    /// Action index outside the discrete action space.
    #[error("Action {0} is not part of the action space")]
    InvalidAction(u32),

    /// Match configuration failed validation.
    #[error("Invalid match configuration: {0}")]
    InvalidConfig(String),

    /// Configuration text could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(String),

    /// Level-up attempted after the last entry of the level-up table.
    #[error("Level-up table exhausted at level {level}")]
    LevelTableExhausted {
        /// Level the player is currently at.
        level: u32,
    },

    /// Template index does not exist in the template table.
    #[error("Unknown {kind} template index {index}")]
    UnknownTemplate {
        /// "unit" or "building".
        kind: &'static str,
        /// Requested index.
        index: usize,
    },

    /// Invalid game state (serialization, replay or snapshot failures).
    #[error("Invalid game state: {0}")]
    InvalidState(String),

    /// Replay re-simulation ended in a different state.
    #[error("Replay diverged at tick {tick}: expected hash {expected}, got {actual}")]
    ReplayDiverged {
        /// Tick where the comparison happened.
        tick: u64,
        /// Hash stored in the replay.
        expected: u64,
        /// Hash produced by re-simulation.
        actual: u64,
    },
}
