//! Core simulation loop.
//!
//! A [`Match`] owns both players, the occupancy grid, the configuration and
//! the seeded RNG. An external clock calls [`Match::tick`] at
//! `ticks_per_second`; controllers act between ticks through
//! [`Match::do_action`] or the combined [`Match::step`].
//!
//! # Determinism
//!
//! - No floating-point math in the simulation state (uses [`Fixed`](crate::math::Fixed))
//! - All randomness comes from one seeded `ChaCha8Rng`
//! - Players update in a fixed order: player one, then player two
//! - Same config, seed and inputs always produce the same state hash
//!
//! # Tick order
//!
//! 1. Player one update (income, backlog, building fire, unit movement)
//! 2. Player two update
//! 3. Sweep of units flagged for removal on either side
//! 4. Win check
//!
//! # Example
//!
//! ```
//! use linewars_core::data::MatchConfig;
//! use linewars_core::components::PlayerId;
//! use linewars_core::simulation::Match;
//!
//! let mut game = Match::new(MatchConfig::default(), 42).unwrap();
//! assert!(game.spawn(PlayerId::One, 0));
//! game.tick();
//! assert_eq!(game.tick_count(), 1);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use crate::action::{Action, ActionOutcome, GenericAction, PlayerInput};
use crate::components::{IdAllocator, PlayerId};
use crate::data::MatchConfig;
use crate::error::{GameError, Result};
use crate::grid::GridMap;
use crate::observation::{
    Observation, OutcomeReward, Representation, RewardPolicy, StepInfo, StepResult,
};
use crate::player::{Player, PlayerTickReport, TickContext};

/// Events generated during a single tick.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickEvents {
    /// Tick number after this tick completed.
    pub tick: u64,
    /// Per-player update reports, indexed by [`PlayerId::index`].
    pub reports: [PlayerTickReport; 2],
    /// Units removed by the end-of-tick sweep (killed by the second mover).
    pub swept: u32,
    /// Winner decided on this tick.
    pub winner: Option<PlayerId>,
}

/// One line wars match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Match {
    config: MatchConfig,
    seed: u64,
    tick: u64,
    grid: GridMap,
    players: [Player; 2],
    rng: ChaCha8Rng,
    ids: IdAllocator,
    winner: Option<PlayerId>,
}

impl Match {
    /// Create a match from a configuration and RNG seed.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] if the configuration fails
    /// validation.
    pub fn new(config: MatchConfig, seed: u64) -> Result<Self> {
        config.validate()?;
        let grid = GridMap::new(
            config.map.width,
            config.map.height,
            config.map.center_band_width,
        );
        let players = [
            Player::new(PlayerId::One, &config),
            Player::new(PlayerId::Two, &config),
        ];
        tracing::debug!(
            seed,
            width = config.map.width,
            height = config.map.height,
            "Match created"
        );
        Ok(Self {
            config,
            seed,
            tick: 0,
            grid,
            players,
            rng: ChaCha8Rng::seed_from_u64(seed),
            ids: IdAllocator::new(),
            winner: None,
        })
    }

    /// Start a new episode with the same seed.
    pub fn reset(&mut self) {
        self.reseed(self.seed);
    }

    /// Start a new episode with a new seed.
    pub fn reseed(&mut self, seed: u64) {
        self.seed = seed;
        self.tick = 0;
        self.grid.clear_occupants();
        for player in &mut self.players {
            player.reset(&self.config);
        }
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self.ids = IdAllocator::new();
        self.winner = None;
    }

    /// Match configuration.
    #[must_use]
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Seed the current episode started from.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of completed ticks.
    #[must_use]
    pub const fn tick_count(&self) -> u64 {
        self.tick
    }

    /// The occupancy grid.
    #[must_use]
    pub fn grid(&self) -> &GridMap {
        &self.grid
    }

    /// A player's state.
    #[must_use]
    pub fn player(&self, id: PlayerId) -> &Player {
        &self.players[id.index()]
    }

    /// Winner, or `None` while undecided.
    #[must_use]
    pub const fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    /// Whether the match has a winner.
    #[must_use]
    pub const fn is_over(&self) -> bool {
        self.winner.is_some()
    }

    /// Lend `player` and its opponent the shared state for one call.
    fn with_player<T>(
        &mut self,
        id: PlayerId,
        f: impl FnOnce(&mut Player, &mut Player, &mut TickContext<'_>) -> T,
    ) -> T {
        let Self {
            config,
            grid,
            players,
            rng,
            ids,
            ..
        } = self;
        let (first, second) = players.split_at_mut(1);
        let (me, opponent) = match id {
            PlayerId::One => (&mut first[0], &mut second[0]),
            PlayerId::Two => (&mut second[0], &mut first[0]),
        };
        let mut ctx = TickContext {
            grid,
            config,
            rng,
            ids,
        };
        f(me, opponent, &mut ctx)
    }

    /// Advance the match by one tick.
    ///
    /// Does nothing once the match has a winner.
    pub fn tick(&mut self) -> TickEvents {
        let mut events = TickEvents {
            tick: self.tick,
            winner: self.winner,
            ..TickEvents::default()
        };
        if self.is_over() {
            return events;
        }

        for id in PlayerId::BOTH {
            events.reports[id.index()] =
                self.with_player(id, |me, opponent, ctx| me.update(opponent, ctx));
        }

        for player in &mut self.players {
            events.swept += player.sweep_despawned(&mut self.grid);
        }

        self.tick += 1;
        events.tick = self.tick;

        self.winner = self.check_winner();
        if let Some(winner) = self.winner {
            tracing::info!(
                tick = self.tick,
                winner = %winner,
                health_one = self.players[0].health,
                health_two = self.players[1].health,
                "Match over"
            );
        }
        events.winner = self.winner;

        #[cfg(feature = "debug-validation")]
        {
            let inconsistency = self.grid.find_inconsistency();
            if let Some((x, y)) = inconsistency {
                tracing::error!(tick = self.tick, x, y, "Grid layers out of sync");
            }
            debug_assert!(inconsistency.is_none(), "grid layers out of sync");
        }

        #[cfg(debug_assertions)]
        {
            let hash = self.state_hash();
            tracing::trace!(tick = self.tick, state_hash = hash, "Match state hash");
        }

        events
    }

    /// Decide the winner from base health.
    ///
    /// If both bases fall on the same tick the healthier one wins; an exact
    /// tie goes to player one.
    fn check_winner(&self) -> Option<PlayerId> {
        let [one, two] = &self.players;
        match (one.is_defeated(), two.is_defeated()) {
            (false, false) => None,
            (true, false) => Some(PlayerId::Two),
            (false, true) => Some(PlayerId::One),
            (true, true) if two.health > one.health => Some(PlayerId::Two),
            (true, true) => Some(PlayerId::One),
        }
    }

    /// Decode and apply an `(action_index, intensity)` pair.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidAction`] for an index outside the action
    /// space, even after the match is over.
    pub fn do_action(&mut self, player: PlayerId, index: u32, intensity: f64) -> Result<ActionOutcome> {
        let action = Action::from_raw(index, intensity, &self.config)?;
        Ok(self.apply_action(player, action))
    }

    /// Apply a decoded action.
    pub fn apply_action(&mut self, player: PlayerId, action: Action) -> ActionOutcome {
        if self.is_over() {
            return ActionOutcome::MatchOver;
        }
        self.with_player(player, |me, _, ctx| me.apply_action(action, ctx))
    }

    /// Apply any controller input.
    ///
    /// # Errors
    ///
    /// Level-up past the end of the table returns
    /// [`GameError::LevelTableExhausted`].
    pub fn apply_input(&mut self, player: PlayerId, input: PlayerInput) -> Result<ActionOutcome> {
        if self.is_over() {
            return Ok(ActionOutcome::MatchOver);
        }
        match input {
            PlayerInput::Action(action) => Ok(self.apply_action(player, action)),
            PlayerInput::Generic(action) => Ok(ActionOutcome::from_success(
                self.do_generic_action(player, action),
            )),
            PlayerInput::LevelUp => self.levelup(player).map(ActionOutcome::from_success),
        }
    }

    /// Request a unit spawn for `player`. See [`Player::spawn`].
    pub fn spawn(&mut self, player: PlayerId, template_index: usize) -> bool {
        if self.is_over() {
            return false;
        }
        self.with_player(player, |me, _, ctx| me.spawn(template_index, ctx))
    }

    /// Place a building for `player`. See [`Player::build`].
    pub fn build(&mut self, player: PlayerId, x: u32, y: u32, template_index: usize) -> bool {
        if self.is_over() {
            return false;
        }
        self.with_player(player, |me, _, ctx| me.build(x, y, template_index, ctx))
    }

    /// Buy the next level for `player`.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::LevelTableExhausted`] when no further level exists.
    pub fn levelup(&mut self, player: PlayerId) -> Result<bool> {
        if self.is_over() {
            return Ok(false);
        }
        let Self {
            config, players, ..
        } = self;
        players[player.index()].levelup(config)
    }

    /// Run a coarse scripted action for `player`.
    pub fn do_generic_action(&mut self, player: PlayerId, action: GenericAction) -> bool {
        if self.is_over() {
            return false;
        }
        self.with_player(player, |me, _, ctx| me.do_generic_action(action, ctx))
    }

    /// Observe the match from `player`'s side.
    #[must_use]
    pub fn get_state(&self, player: PlayerId, representation: Representation) -> Observation {
        match representation {
            Representation::Layers => Observation::layers(&self.grid, player),
            Representation::Features => Observation::features(
                self.tick,
                self.player(player),
                self.player(player.opponent()),
                self.grid.height(),
            ),
        }
    }

    /// Apply an action, advance one tick and report the result with the
    /// default win/loss reward.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidAction`] for an index outside the action
    /// space; nothing is ticked in that case.
    pub fn step(
        &mut self,
        player: PlayerId,
        index: u32,
        intensity: f64,
        representation: Representation,
    ) -> Result<StepResult> {
        self.step_with(player, index, intensity, representation, &OutcomeReward)
    }

    /// [`step`](Self::step) with a custom reward policy.
    pub fn step_with(
        &mut self,
        player: PlayerId,
        index: u32,
        intensity: f64,
        representation: Representation,
        policy: &dyn RewardPolicy,
    ) -> Result<StepResult> {
        let outcome = self.do_action(player, index, intensity)?;
        self.tick();

        let reward = policy.reward(self, player, outcome);
        Ok(StepResult {
            state: self.get_state(player, representation),
            reward,
            terminal: self.is_over(),
            info: StepInfo {
                tick: self.tick,
                outcome,
                winner: self.winner,
                score: self.player(player).score().to_num::<i64>(),
            },
        })
    }

    /// Calculate a hash of the current match state.
    ///
    /// Two matches with identical state produce identical hashes.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        self.tick.hash(&mut hasher);
        self.grid.hash(&mut hasher);
        self.players.hash(&mut hasher);
        self.ids.hash(&mut hasher);
        self.winner.hash(&mut hasher);
        self.rng.get_word_pos().hash(&mut hasher);
        hasher.finish()
    }

    /// Serialize the match for snapshots.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn serialize(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize match: {e}")))
    }

    /// Restore a match from a snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the bytes are not a valid snapshot or the grid
    /// layers are inconsistent.
    pub fn deserialize(data: &[u8]) -> Result<Self> {
        let game: Self = bincode::deserialize(data)
            .map_err(|e| GameError::InvalidState(format!("Failed to deserialize match: {e}")))?;
        if let Some((x, y)) = game.grid.find_inconsistency() {
            return Err(GameError::InvalidState(format!(
                "Snapshot grid inconsistent at ({x}, {y})"
            )));
        }
        Ok(game)
    }
}
