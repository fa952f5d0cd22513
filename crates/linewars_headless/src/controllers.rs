//! Built-in controllers for scripted matches.
//!
//! A controller looks at the match once per tick and may hand back one
//! input for its player. Returning `None` means "no action this tick", which
//! is also how a controller that ran out of time is treated.

use clap::ValueEnum;
use linewars_core::action::{Action, GenericAction, PlayerInput, ACTION_COUNT};
use linewars_core::components::PlayerId;
use linewars_core::simulation::Match;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Decides one player's input each tick.
pub trait Controller: Send {
    /// Short name used in logs and metrics.
    fn name(&self) -> &'static str;

    /// Input for `player` this tick, if any.
    fn decide(&mut self, game: &Match, player: PlayerId) -> Option<PlayerInput>;
}

/// Selectable controller kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum ControllerKind {
    /// Never acts.
    Idle,
    /// Uniform random action index and intensity.
    Random,
    /// Spends everything on levels, towers and units.
    #[default]
    Greedy,
}

impl ControllerKind {
    /// Build a controller; `seed` feeds controllers that draw randomness.
    #[must_use]
    pub fn build(self, seed: u64) -> Box<dyn Controller> {
        match self {
            Self::Idle => Box::new(IdleController),
            Self::Random => Box::new(RandomController::new(seed)),
            Self::Greedy => Box::new(GreedyController::default()),
        }
    }

    /// Name as accepted on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Random => "random",
            Self::Greedy => "greedy",
        }
    }
}

impl std::fmt::Display for ControllerKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Does nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdleController;

impl Controller for IdleController {
    fn name(&self) -> &'static str {
        "idle"
    }

    fn decide(&mut self, _game: &Match, _player: PlayerId) -> Option<PlayerInput> {
        None
    }
}

/// Picks a uniform action index and intensity every tick.
///
/// Has its own RNG so it never perturbs the match's random stream.
#[derive(Debug, Clone)]
pub struct RandomController {
    rng: ChaCha8Rng,
}

impl RandomController {
    /// Create a controller with a fixed seed.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }
}

impl Controller for RandomController {
    fn name(&self) -> &'static str {
        "random"
    }

    fn decide(&mut self, game: &Match, _player: PlayerId) -> Option<PlayerInput> {
        let index = self.rng.gen_range(0..ACTION_COUNT);
        let intensity: f64 = self.rng.gen();
        Action::from_raw(index, intensity, game.config())
            .ok()
            .map(PlayerInput::Action)
    }
}

/// Levels up whenever affordable, otherwise builds a tower every few ticks
/// and spends the rest on units.
#[derive(Debug, Clone)]
pub struct GreedyController {
    /// Ticks between build attempts.
    pub build_interval: u64,
    /// Stop building once this many buildings stand.
    pub max_buildings: usize,
}

impl Default for GreedyController {
    fn default() -> Self {
        Self {
            build_interval: 50,
            max_buildings: 8,
        }
    }
}

impl Controller for GreedyController {
    fn name(&self) -> &'static str {
        "greedy"
    }

    fn decide(&mut self, game: &Match, player: PlayerId) -> Option<PlayerInput> {
        let config = game.config();
        let me = game.player(player);

        if me.can_afford_levelup(config) {
            return Some(PlayerInput::LevelUp);
        }

        let wants_building = game.tick_count() % self.build_interval.max(1) == 0
            && me.buildings.len() < self.max_buildings;
        if wants_building
            && me
                .available_buildings(config)
                .into_iter()
                .any(|i| me.can_afford_building(config, i))
        {
            return Some(GenericAction::BuildRandom.into());
        }

        me.available_units(config)
            .into_iter()
            .any(|i| me.can_afford_unit(config, i))
            .then_some(GenericAction::SpawnRandom.into())
    }
}
