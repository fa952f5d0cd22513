//! JSON protocol for headless match control.
//!
//! The runner communicates via JSON lines (one JSON object per line):
//!
//! **Input (stdin):** Commands from the agent
//! **Output (stdout):** Responses, exactly one per command
//!
//! # Protocol Flow
//!
//! 1. Runner starts, outputs a `ready` response describing the match
//! 2. The agent sends commands as JSON lines
//! 3. `step` applies one action for one player and advances one tick
//! 4. `quit` ends the session with `bye`
//!
//! # Example Session
//!
//! ```text
//! <- {"type":"ready","version":"1.0","tick":0,"seed":7,"width":30,"height":11,"action_count":4}
//! -> {"cmd":"step","player":"One","action":2,"intensity":0.0}
//! <- {"type":"step","player":"One","result":{"state":{...},"reward":0.0,"terminal":false,"info":{...}}}
//! -> {"cmd":"tick","count":60}
//! <- {"type":"ticked","tick":61,"winner":null}
//! -> {"cmd":"hash"}
//! <- {"type":"hash","tick":61,"hash":1234567890}
//! ```

use linewars_core::action::ACTION_COUNT;
use linewars_core::components::PlayerId;
use linewars_core::error::GameError;
use linewars_core::observation::{Observation, Representation, StepResult};
use linewars_core::player::Player;
use linewars_core::simulation::Match;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Protocol version reported in `ready`.
pub const PROTOCOL_VERSION: &str = "1.0";

// ============================================================================
// Input Commands (Agent -> Runner)
// ============================================================================

/// Commands that can be sent to the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Command {
    /// Start a new episode, optionally with a new seed.
    Reset {
        /// New seed; keeps the current one when absent.
        #[serde(default)]
        seed: Option<u64>,
    },

    /// Observe the match from one player's side without advancing time.
    Observe {
        /// Observing player.
        player: PlayerId,
        /// Encoding of the observation.
        #[serde(default)]
        representation: Representation,
    },

    /// Apply one action for a player and advance one tick.
    Step {
        /// Acting player.
        player: PlayerId,
        /// Action index in `0..action_count`.
        action: u32,
        /// Continuous parameter, clamped to `[0, 1]`.
        intensity: f64,
        /// Encoding of the returned observation.
        #[serde(default)]
        representation: Representation,
    },

    /// Advance the match by N ticks without actions (default: 1).
    Tick {
        /// Ticks to run; stops early if the match ends.
        #[serde(default = "default_tick_count")]
        count: u32,
    },

    /// Report the current state hash (for determinism verification).
    Hash,

    /// Report both players' economy and the winner.
    Status,

    /// End the session.
    Quit,
}

fn default_tick_count() -> u32 {
    1
}

// ============================================================================
// Output Responses (Runner -> Agent)
// ============================================================================

/// Responses sent from the headless runner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    /// Runner is ready; sent at startup and after every reset.
    Ready {
        /// Protocol version.
        version: String,
        /// Current tick.
        tick: u64,
        /// Seed of the episode.
        seed: u64,
        /// Lane width in cells.
        width: u32,
        /// Lane height in cells.
        height: u32,
        /// Size of the discrete action space.
        action_count: u32,
    },

    /// Observation for one player.
    Observation {
        /// Current tick.
        tick: u64,
        /// Observing player.
        player: PlayerId,
        /// The observation.
        observation: Observation,
    },

    /// Result of a step.
    Step {
        /// Acting player.
        player: PlayerId,
        /// Step result.
        result: StepResult,
    },

    /// Ticks were run.
    Ticked {
        /// Tick after the last run tick.
        tick: u64,
        /// Winner, if decided.
        winner: Option<PlayerId>,
    },

    /// State hash for determinism verification.
    Hash {
        /// Current tick.
        tick: u64,
        /// State hash.
        hash: u64,
    },

    /// Match status.
    Status {
        /// Current tick.
        tick: u64,
        /// Winner, if decided.
        winner: Option<PlayerId>,
        /// Player one, then player two.
        players: Vec<PlayerStatus>,
    },

    /// Error processing a command.
    Error {
        /// What went wrong.
        message: String,
        /// Command that failed, if it parsed.
        cmd: Option<String>,
    },

    /// Goodbye message before shutdown.
    Bye,
}

/// Economy summary of one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStatus {
    /// Which player.
    pub player: PlayerId,
    /// Base health.
    pub health: i32,
    /// Gold, truncated.
    pub gold: i64,
    /// Lumber, truncated.
    pub lumber: i64,
    /// Income per period, truncated.
    pub income: i64,
    /// Level.
    pub level: u32,
    /// Live units.
    pub units: usize,
    /// Live buildings.
    pub buildings: usize,
    /// Deferred spawns.
    pub backlog: usize,
    /// Score.
    pub score: i64,
    /// Display color (RGB).
    pub color: [u8; 3],
    /// Cursor highlight color (RGB).
    pub cursor_color: [u8; 3],
}

impl PlayerStatus {
    /// Summarize a player.
    #[must_use]
    pub fn from_player(player: &Player) -> Self {
        Self {
            player: player.id(),
            health: player.health,
            gold: player.gold.to_num::<i64>(),
            lumber: player.lumber.to_num::<i64>(),
            income: player.income.to_num::<i64>(),
            level: player.level,
            units: player.units.len(),
            buildings: player.buildings.len(),
            backlog: player.backlog.len(),
            score: player.score().to_num::<i64>(),
            color: player.id().color(),
            cursor_color: player.id().cursor_color(),
        }
    }
}

/// Failures of a protocol session.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// A line was not a valid command.
    #[error("Malformed command: {0}")]
    Parse(#[from] serde_json::Error),

    /// The simulation refused a request.
    #[error(transparent)]
    Game(#[from] GameError),

    /// Reading stdin or writing stdout failed.
    #[error("Protocol I/O failed: {0}")]
    Io(#[from] std::io::Error),
}

// ============================================================================
// Helpers
// ============================================================================

impl Response {
    /// Create a ready response for the current episode.
    #[must_use]
    pub fn ready(game: &Match) -> Self {
        Self::Ready {
            version: PROTOCOL_VERSION.to_string(),
            tick: game.tick_count(),
            seed: game.seed(),
            width: game.grid().width(),
            height: game.grid().height(),
            action_count: ACTION_COUNT,
        }
    }

    /// Create a status response.
    #[must_use]
    pub fn status(game: &Match) -> Self {
        Self::Status {
            tick: game.tick_count(),
            winner: game.winner(),
            players: PlayerId::BOTH
                .iter()
                .map(|&p| PlayerStatus::from_player(game.player(p)))
                .collect(),
        }
    }

    /// Create an error response.
    pub fn error(message: impl Into<String>, cmd: Option<&str>) -> Self {
        Self::Error {
            message: message.into(),
            cmd: cmd.map(String::from),
        }
    }

    /// Serialize to JSON line (with newline).
    #[must_use]
    pub fn to_json_line(&self) -> String {
        let mut json = serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"type":"error","message":"Serialization failed: {e}","cmd":null}}"#)
        });
        json.push('\n');
        json
    }
}

impl Command {
    /// Parse from a JSON line.
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Command name for error reports.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Reset { .. } => "reset",
            Self::Observe { .. } => "observe",
            Self::Step { .. } => "step",
            Self::Tick { .. } => "tick",
            Self::Hash => "hash",
            Self::Status => "status",
            Self::Quit => "quit",
        }
    }
}
