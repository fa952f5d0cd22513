//! Full match execution between two controllers.
//!
//! Every loop is bounded by `max_ticks`. A match still undecided at the
//! cap ends as a draw.

use linewars_core::components::PlayerId;
use linewars_core::data::MatchConfig;
use linewars_core::error::Result;
use linewars_core::replay::Replay;
use linewars_core::simulation::Match;
use tracing::{debug, info, trace};

use crate::controllers::{Controller, ControllerKind};
use crate::metrics::GameMetrics;

/// Default tick cap: ten minutes at ten ticks per second.
pub const DEFAULT_MAX_TICKS: u64 = 6_000;

/// Configuration for a single match run.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Match configuration.
    pub match_config: MatchConfig,
    /// Match seed.
    pub seed: u64,
    /// Tick cap; reaching it is a draw.
    pub max_ticks: u64,
    /// Controller for player one, then player two.
    pub controllers: [ControllerKind; 2],
    /// Record every applied input into a [`Replay`].
    pub record_replay: bool,
    /// Identifier used in metrics and logs.
    pub game_id: String,
}

impl GameConfig {
    /// A greedy-vs-greedy match on `match_config`.
    #[must_use]
    pub fn new(match_config: MatchConfig, seed: u64) -> Self {
        Self {
            match_config,
            seed,
            max_ticks: DEFAULT_MAX_TICKS,
            controllers: [ControllerKind::Greedy; 2],
            record_replay: false,
            game_id: format!("game_{seed}"),
        }
    }

    /// Set the controllers.
    pub fn with_controllers(mut self, one: ControllerKind, two: ControllerKind) -> Self {
        self.controllers = [one, two];
        self
    }

    /// Set the tick cap.
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = max_ticks;
        self
    }

    /// Enable replay recording.
    pub fn recording(mut self) -> Self {
        self.record_replay = true;
        self
    }
}

/// Result of a finished match.
#[derive(Debug, Clone)]
pub struct GameResult {
    /// Collected metrics.
    pub metrics: GameMetrics,
    /// The recorded replay, if requested.
    pub replay: Option<Replay>,
    /// Final simulation state hash.
    pub final_state_hash: u64,
}

/// Seed for a controller, derived from the match seed and the seat.
fn controller_seed(match_seed: u64, player: PlayerId) -> u64 {
    match_seed
        .wrapping_mul(0x9E37_79B9_7F4A_7C15)
        .wrapping_add(player.index() as u64 + 1)
}

/// Play one match to completion or to the tick cap.
///
/// # Errors
///
/// Returns an error if the match configuration is invalid.
pub fn run_game(config: GameConfig) -> Result<GameResult> {
    let mut game = Match::new(config.match_config, config.seed)?;
    let mut controllers: [Box<dyn Controller>; 2] = [
        config.controllers[0].build(controller_seed(config.seed, PlayerId::One)),
        config.controllers[1].build(controller_seed(config.seed, PlayerId::Two)),
    ];
    let mut replay = if config.record_replay {
        Some(Replay::new(&game)?)
    } else {
        None
    };
    let mut metrics = GameMetrics::new(
        config.game_id.clone(),
        config.seed,
        [controllers[0].name(), controllers[1].name()],
    );

    debug!(
        game_id = %config.game_id,
        seed = config.seed,
        one = controllers[0].name(),
        two = controllers[1].name(),
        max_ticks = config.max_ticks,
        "Starting match"
    );

    while !game.is_over() && game.tick_count() < config.max_ticks {
        for player in PlayerId::BOTH {
            let Some(input) = controllers[player.index()].decide(&game, player) else {
                continue;
            };
            if let Some(replay) = replay.as_mut() {
                replay.record(game.tick_count(), player, input);
            }
            match game.apply_input(player, input) {
                Ok(outcome) => {
                    trace!(tick = game.tick_count(), %player, ?input, ?outcome, "Input applied");
                    metrics.record_outcome(player, outcome);
                }
                Err(e) => {
                    debug!(tick = game.tick_count(), %player, error = %e, "Input failed");
                    metrics.player_mut(player).actions_rejected += 1;
                }
            }
        }

        let events = game.tick();
        metrics.record_tick(&events);
    }

    let final_state_hash = game.state_hash();
    metrics.finalize(
        game.tick_count(),
        game.winner(),
        [game.player(PlayerId::One), game.player(PlayerId::Two)],
        final_state_hash,
    );
    if let Some(replay) = replay.as_mut() {
        replay.finalize(&game);
    }

    info!(
        game_id = %config.game_id,
        ticks = game.tick_count(),
        winner = ?game.winner(),
        condition = ?metrics.end_condition,
        "Match finished"
    );

    Ok(GameResult {
        metrics,
        replay,
        final_state_hash,
    })
}
