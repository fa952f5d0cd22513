//! Observations and rewards handed to external controllers.
//!
//! Every observation is taken from one player's point of view. The `Layers`
//! representation is mirrored for player two so both sides always see
//! themselves on the left walking toward +x, and owner codes are rewritten
//! to `1 = self, 2 = opponent`.

use serde::{Deserialize, Serialize};

use crate::action::ActionOutcome;
use crate::components::PlayerId;
use crate::grid::{GridMap, Layer, Terrain, LAYER_COUNT};
use crate::player::Player;
use crate::simulation::Match;
use crate::unit::Unit;

/// Which encoding of the match state to produce.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Representation {
    /// All five grid layers, mirrored and owner-remapped.
    #[default]
    Layers,
    /// Integer economy/roster summary.
    Features,
}

/// Names of the entries of a [`Representation::Features`] vector, in order.
pub const FEATURE_NAMES: [&str; 19] = [
    "tick",
    "health",
    "gold",
    "lumber",
    "income",
    "level",
    "units",
    "buildings",
    "backlog",
    "cursor_x",
    "cursor_y",
    "opponent_health",
    "opponent_gold",
    "opponent_income",
    "opponent_level",
    "opponent_units",
    "opponent_buildings",
    "unit_health_pct",
    "opponent_unit_health_pct",
];

/// Match state as seen by one player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Observation {
    /// Grid layers, each `width * height` cells, row-major.
    Layers {
        /// Columns.
        width: u32,
        /// Rows.
        height: u32,
        /// One vector per layer, in [`Layer`] order.
        layers: Vec<Vec<u32>>,
    },
    /// Summary vector; see [`FEATURE_NAMES`].
    Features {
        /// Feature values.
        values: Vec<i64>,
    },
}

impl Observation {
    /// Build the layer view for `viewer`.
    #[must_use]
    pub fn layers(grid: &GridMap, viewer: PlayerId) -> Self {
        let (width, height) = (grid.width(), grid.height());
        let mut layers = vec![vec![0; width as usize * height as usize]; LAYER_COUNT];

        for layer in Layer::ALL {
            let out = &mut layers[layer.index()];
            for y in 0..height {
                for x in 0..width {
                    let view_x = match viewer {
                        PlayerId::One => x,
                        PlayerId::Two => width - 1 - x,
                    };
                    let value = grid.get(layer, x, y);
                    out[y as usize * width as usize + view_x as usize] = match layer {
                        Layer::Terrain => view_terrain(value, viewer),
                        Layer::UnitOwner | Layer::BuildingOwner => view_owner(value, viewer),
                        Layer::UnitId | Layer::BuildingId => value,
                    };
                }
            }
        }

        Self::Layers {
            width,
            height,
            layers,
        }
    }

    /// Build the feature view for `viewer`.
    #[must_use]
    pub fn features(tick: u64, me: &Player, opponent: &Player, height: u32) -> Self {
        let cursor_x = match me.id() {
            PlayerId::One => me.cursor.x,
            PlayerId::Two => me.spawn_x() - me.cursor.x,
        };
        let values = vec![
            i64::try_from(tick).unwrap_or(i64::MAX),
            i64::from(me.health),
            me.gold.to_num::<i64>(),
            me.lumber.to_num::<i64>(),
            me.income.to_num::<i64>(),
            i64::from(me.level),
            me.units.len() as i64,
            me.buildings.len() as i64,
            me.backlog.len() as i64,
            i64::from(cursor_x),
            i64::from(me.cursor.y.min(height.saturating_sub(1))),
            i64::from(opponent.health),
            opponent.gold.to_num::<i64>(),
            opponent.income.to_num::<i64>(),
            i64::from(opponent.level),
            opponent.units.len() as i64,
            opponent.buildings.len() as i64,
            unit_health_percent(&me.units),
            unit_health_percent(&opponent.units),
        ];
        Self::Features { values }
    }
}

/// Remaining roster health as a percentage of spawn health; 0 when empty.
fn unit_health_percent(units: &[Unit]) -> i64 {
    let (health, max) = units.iter().fold((0i64, 0i64), |(h, m), unit| {
        (h + i64::from(unit.health.max(0)), m + i64::from(unit.max_health))
    });
    if max <= 0 {
        return 0;
    }
    health * 100 / max
}

fn view_owner(code: u32, viewer: PlayerId) -> u32 {
    match code {
        0 => 0,
        c if c == viewer.code() => 1,
        _ => 2,
    }
}

fn view_terrain(code: u32, viewer: PlayerId) -> u32 {
    match (viewer, Terrain::from_code(code)) {
        (PlayerId::Two, Some(Terrain::BaseOne)) => Terrain::BaseTwo as u32,
        (PlayerId::Two, Some(Terrain::BaseTwo)) => Terrain::BaseOne as u32,
        _ => code,
    }
}

/// Extra detail returned by a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepInfo {
    /// Tick count after the step.
    pub tick: u64,
    /// What happened to the submitted action.
    pub outcome: ActionOutcome,
    /// Winner, if decided.
    pub winner: Option<PlayerId>,
    /// Acting player's score after the step.
    pub score: i64,
}

/// Result of one `step` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepResult {
    /// Observation after the step.
    pub state: Observation,
    /// Reward for the acting player.
    pub reward: f64,
    /// Whether the match is over.
    pub terminal: bool,
    /// Extra detail.
    pub info: StepInfo,
}

/// Reward signal for a player after a step.
pub trait RewardPolicy {
    /// Reward for `player` after `outcome` was applied and the match ticked.
    fn reward(&self, game: &Match, player: PlayerId, outcome: ActionOutcome) -> f64;
}

/// +1 on a win, -1 on a loss, 0 otherwise.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutcomeReward;

impl RewardPolicy for OutcomeReward {
    fn reward(&self, game: &Match, player: PlayerId, _outcome: ActionOutcome) -> f64 {
        match game.winner() {
            Some(winner) if winner == player => 1.0,
            Some(_) => -1.0,
            None => 0.0,
        }
    }
}
