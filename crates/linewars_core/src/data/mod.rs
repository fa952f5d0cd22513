//! Data structures for match configuration.
//!
//! This module contains pure data structures that define the rules,
//! the lane and the unit/building template tables. All structs are
//! designed to be deserialized from RON files.
//!
//! **Note:** This module contains no file IO - it only parses text.
//! File loading is handled by `linewars_headless`.

mod config;
mod template;

pub use config::{LevelCost, MapConfig, MatchConfig, Mechanics};
pub use template::{EntityTemplate, TemplateKind};
