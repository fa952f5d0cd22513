//! Headless line wars runner for agent training and CI verification.
//!
//! This crate drives [`linewars_core`] matches without any rendering. It
//! provides:
//!
//! - **Agent control**: A JSON-lines session where an external agent
//!   observes and steps a match
//! - **Scripted play**: Built-in controllers playing full matches with a
//!   tick cap
//! - **Batch runs**: Many seeds in parallel with a win-rate summary
//! - **Replay verification**: Check that recorded matches re-simulate to
//!   the same hash
//!
//! # Protocol
//!
//! Communication uses JSON lines (one JSON object per line):
//!
//! - **stdin**: Commands from the controller (reset, observe, step, ...)
//! - **stdout**: Responses (JSON)
//! - **stderr**: Logs (human-readable)
//!
//! See the [`protocol`] module for the full command/response set.
//!
//! # Example
//!
//! ```bash
//! # Drive a match interactively
//! echo '{"cmd":"tick","count":60}' | cargo run -p linewars_headless -- run
//!
//! # Play a greedy controller against a random one
//! cargo run -p linewars_headless -- play --one greedy --two random --seed 7
//!
//! # Re-verify a replay
//! cargo run -p linewars_headless -- replay match.replay --verify
//! ```

pub mod batch;
pub mod config_loader;
pub mod controllers;
pub mod game_runner;
pub mod metrics;
pub mod protocol;
pub mod runner;

pub use batch::{run_batch, BatchConfig, BatchResults};
pub use config_loader::{load_config, ConfigError};
pub use controllers::{Controller, ControllerKind};
pub use game_runner::{run_game, GameConfig, GameResult};
pub use metrics::{BatchSummary, GameMetrics, PlayerMetrics};
pub use protocol::{Command, ProtocolError, Response};
pub use runner::{HeadlessConfig, HeadlessRunner};
