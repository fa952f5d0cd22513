//! # Line Wars Core
//!
//! Deterministic simulation core for a two-player line wars match.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO beyond replay files
//! - No system randomness (one seeded `ChaCha8Rng` per match)
//! - No floating-point math in the simulation state (uses fixed-point)
//!
//! This separation enables:
//! - Headless agent training and scripted matches
//! - Replays and determinism testing
//! - Parallel batch runs of independent matches
//!
//! ## Crate Structure
//!
//! - [`grid`] - Layered occupancy grid
//! - [`data`] - Configuration and entity templates
//! - [`unit`] / [`building`] - Live entities
//! - [`player`] - Economy and per-tick orchestration for one side
//! - [`simulation`] - The match and its tick loop
//! - [`action`] / [`observation`] - Controller interface
//! - [`replay`] - Recording and verification
//! - [`math`] - Fixed-point math utilities

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod action;
pub mod building;
pub mod combat;
pub mod components;
pub mod data;
pub mod error;
pub mod grid;
pub mod math;
pub mod observation;
pub mod player;
pub mod replay;
pub mod simulation;
pub mod unit;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::action::{Action, ActionOutcome, GenericAction, PlayerInput, ACTION_COUNT};
    pub use crate::building::{Building, ShotOutcome};
    pub use crate::components::{EntityId, PlayerId};
    pub use crate::data::{EntityTemplate, MatchConfig, TemplateKind};
    pub use crate::error::{GameError, Result};
    pub use crate::grid::{GridMap, Layer};
    pub use crate::math::{Fixed, GridPos};
    pub use crate::observation::{
        Observation, OutcomeReward, Representation, RewardPolicy, StepResult,
    };
    pub use crate::player::Player;
    pub use crate::replay::{Replay, ReplayPlayer};
    pub use crate::simulation::{Match, TickEvents};
    pub use crate::unit::Unit;
}
