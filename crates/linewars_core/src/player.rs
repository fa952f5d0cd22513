//! Player state: economy, level progression, rosters and per-tick orchestration.
//!
//! A [`Player`] never owns the grid, the RNG or the id allocator. The match
//! lends them through a [`TickContext`] for the duration of a single call,
//! which keeps every mutation of shared state inside one borrow.
//!
//! # Transactions
//!
//! `spawn`, `build` and `levelup` are all-or-nothing: a rejected request
//! leaves gold, lumber, income, the rosters and the grid untouched. The one
//! exception is a spawn into a saturated column, which is deferred onto the
//! spawn backlog without debiting anything.

use std::collections::VecDeque;

use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::action::{Action, ActionOutcome, GenericAction};
use crate::building::{Building, ShotOutcome};
use crate::components::{EntityId, IdAllocator, PlayerId};
use crate::data::{MatchConfig, TemplateKind};
use crate::error::{GameError, Result};
use crate::grid::{CenterBand, GridMap};
use crate::math::{fixed_serde, Fixed, GridPos};
use crate::unit::{MoveOutcome, Unit};

/// Shared match state lent to a player for one call.
pub struct TickContext<'a> {
    /// Occupancy grid.
    pub grid: &'a mut GridMap,
    /// Match configuration.
    pub config: &'a MatchConfig,
    /// Match RNG (spawn rows, damage rolls, generic actions).
    pub rng: &'a mut ChaCha8Rng,
    /// Entity id source.
    pub ids: &'a mut IdAllocator,
}

/// What one [`Player::update`] call did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerTickReport {
    /// Income was credited this tick.
    pub income_paid: bool,
    /// Unit created from the spawn backlog.
    pub backlog_spawned: Option<EntityId>,
    /// Hits landed by this player's buildings.
    pub hits: u32,
    /// Opponent units killed by this player's buildings.
    pub kills: Vec<EntityId>,
    /// Own units that reached the opponent's base.
    pub base_hits: u32,
    /// Own units removed from the roster at the end of the update.
    pub removed: u32,
}

enum SpawnAttempt {
    Spawned(EntityId),
    Saturated,
    Rejected,
}

/// One side of a match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Player {
    id: PlayerId,
    spawn_x: u32,
    goal_x: u32,
    territory_min_x: u32,
    territory_max_x: u32,

    /// Base health; the player loses at `<= 0`.
    pub health: i32,
    /// Gold stockpile.
    #[serde(with = "fixed_serde")]
    pub gold: Fixed,
    /// Lumber stockpile.
    #[serde(with = "fixed_serde")]
    pub lumber: Fixed,
    /// Gold credited every income period.
    #[serde(with = "fixed_serde")]
    pub income: Fixed,
    /// Current level (number of level-ups bought).
    pub level: u32,
    /// Live units in spawn order.
    pub units: Vec<Unit>,
    /// Live buildings in build order.
    pub buildings: Vec<Building>,
    /// Deferred spawn requests (unit template indices).
    pub backlog: VecDeque<usize>,
    /// Ticks until the next income payout.
    pub income_counter: u32,
    /// Units spawned this match.
    pub spawn_count: u32,
    /// Opponent units killed this match.
    pub kill_count: u32,
    /// Virtual cursor used by the build action.
    pub cursor: GridPos,
}

impl Player {
    /// Create a player with starting resources for `config`.
    #[must_use]
    pub fn new(id: PlayerId, config: &MatchConfig) -> Self {
        let width = config.map.width;
        let center = CenterBand::for_width(width, config.map.center_band_width);
        let (spawn_x, goal_x, territory_min_x, territory_max_x) = match id {
            PlayerId::One => (0, width - 1, 1, center.start.saturating_sub(1)),
            PlayerId::Two => (width - 1, 0, center.end + 1, width - 2),
        };

        let mut player = Self {
            id,
            spawn_x,
            goal_x,
            territory_min_x,
            territory_max_x,
            health: 0,
            gold: Fixed::ZERO,
            lumber: Fixed::ZERO,
            income: Fixed::ZERO,
            level: 0,
            units: Vec::new(),
            buildings: Vec::new(),
            backlog: VecDeque::new(),
            income_counter: 0,
            spawn_count: 0,
            kill_count: 0,
            cursor: GridPos::default(),
        };
        player.reset(config);
        player
    }

    /// Restore episodic state. Rosters are cleared; the caller owns the grid.
    pub fn reset(&mut self, config: &MatchConfig) {
        let mechanics = &config.mechanics;
        self.health = mechanics.start_health;
        self.gold = Fixed::saturating_from_num(mechanics.start_gold);
        self.lumber = Fixed::saturating_from_num(mechanics.start_lumber);
        self.income = Fixed::saturating_from_num(mechanics.start_income);
        self.level = 0;
        self.units.clear();
        self.buildings.clear();
        self.backlog.clear();
        self.income_counter = mechanics.income_period_ticks();
        self.spawn_count = 0;
        self.kill_count = 0;
        self.cursor = GridPos::new(self.spawn_x, config.map.height / 2);
    }

    /// Which side this is.
    #[must_use]
    pub const fn id(&self) -> PlayerId {
        self.id
    }

    /// Column units spawn on.
    #[must_use]
    pub const fn spawn_x(&self) -> u32 {
        self.spawn_x
    }

    /// Column units walk toward.
    #[must_use]
    pub const fn goal_x(&self) -> u32 {
        self.goal_x
    }

    /// Whether `x` is on this player's side of the center band.
    #[must_use]
    pub const fn in_territory(&self, x: u32) -> bool {
        x >= self.territory_min_x && x <= self.territory_max_x
    }

    /// Whether the player has lost.
    #[must_use]
    pub const fn is_defeated(&self) -> bool {
        self.health <= 0
    }

    /// Indices of unit templates unlocked at the current level.
    #[must_use]
    pub fn available_units(&self, config: &MatchConfig) -> Vec<usize> {
        self.available(config, TemplateKind::Unit)
    }

    /// Indices of building templates unlocked at the current level.
    #[must_use]
    pub fn available_buildings(&self, config: &MatchConfig) -> Vec<usize> {
        self.available(config, TemplateKind::Building)
    }

    fn available(&self, config: &MatchConfig, kind: TemplateKind) -> Vec<usize> {
        config
            .templates(kind)
            .iter()
            .enumerate()
            .filter(|(_, t)| t.is_unlocked_at(self.level))
            .map(|(i, _)| i)
            .collect()
    }

    /// Whether the unit template at `index` exists and is affordable.
    #[must_use]
    pub fn can_afford_unit(&self, config: &MatchConfig, index: usize) -> bool {
        config
            .template(TemplateKind::Unit, index)
            .is_ok_and(|t| self.gold >= coins(t.gold_cost))
    }

    /// Whether the building template at `index` exists and is affordable.
    #[must_use]
    pub fn can_afford_building(&self, config: &MatchConfig, index: usize) -> bool {
        config
            .template(TemplateKind::Building, index)
            .is_ok_and(|t| self.gold >= coins(t.gold_cost))
    }

    /// Whether the next level-up exists and is affordable.
    #[must_use]
    pub fn can_afford_levelup(&self, config: &MatchConfig) -> bool {
        config
            .level_up
            .get(self.level as usize)
            .is_some_and(|cost| self.gold >= coins(cost.gold) && self.lumber >= coins(cost.lumber))
    }

    /// `(spawn_count + income) * 100 * (level + 1)`.
    #[must_use]
    pub fn score(&self) -> Fixed {
        (Fixed::saturating_from_num(self.spawn_count).saturating_add(self.income))
            .saturating_mul_int(100)
            .saturating_mul_int(i64::from(self.level) + 1)
    }

    /// Buy the next level if affordable.
    ///
    /// Returns `Ok(false)` when the player cannot pay.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::LevelTableExhausted`] when no further level exists.
    pub fn levelup(&mut self, config: &MatchConfig) -> Result<bool> {
        let Some(cost) = config.level_up.get(self.level as usize) else {
            return Err(GameError::LevelTableExhausted { level: self.level });
        };

        let (gold, lumber) = (coins(cost.gold), coins(cost.lumber));
        if self.gold < gold || self.lumber < lumber {
            debug!(player = %self.id, level = self.level, "Cannot afford level-up");
            return Ok(false);
        }

        self.gold -= gold;
        self.lumber -= lumber;
        self.level += 1;
        debug!(player = %self.id, level = self.level, "Level up");
        Ok(true)
    }

    /// Request a unit spawn.
    ///
    /// Returns `true` only if a unit was created. A saturated spawn column
    /// queues the request on the backlog and returns `false`.
    pub fn spawn(&mut self, template_index: usize, ctx: &mut TickContext<'_>) -> bool {
        match self.try_spawn(template_index, ctx) {
            SpawnAttempt::Spawned(_) => true,
            SpawnAttempt::Saturated => {
                self.backlog.push_back(template_index);
                debug!(
                    player = %self.id,
                    template_index,
                    backlog = self.backlog.len(),
                    "Spawn column full, request deferred"
                );
                false
            }
            SpawnAttempt::Rejected => false,
        }
    }

    fn try_spawn(&mut self, template_index: usize, ctx: &mut TickContext<'_>) -> SpawnAttempt {
        let template = match ctx.config.template(TemplateKind::Unit, template_index) {
            Ok(template) => template,
            Err(err) => {
                debug!(player = %self.id, %err, "Spawn rejected");
                return SpawnAttempt::Rejected;
            }
        };
        if !template.is_unlocked_at(self.level) {
            debug!(player = %self.id, template = %template.id, "Spawn rejected: locked");
            return SpawnAttempt::Rejected;
        }
        let cost = coins(template.gold_cost);
        if self.gold < cost {
            debug!(player = %self.id, template = %template.id, "Spawn rejected: insufficient gold");
            return SpawnAttempt::Rejected;
        }

        let open_rows = ctx.grid.open_unit_rows(self.spawn_x);
        if open_rows.is_empty() {
            return SpawnAttempt::Saturated;
        }
        let y = open_rows[ctx.rng.gen_range(0..open_rows.len())];

        self.gold -= cost;
        self.income = self
            .income
            .saturating_add(cost.saturating_mul(ctx.config.mechanics.income_ratio));

        let id = ctx.ids.allocate();
        let unit = Unit::from_template(
            template,
            template_index,
            id,
            self.id,
            GridPos::new(self.spawn_x, y),
            ctx.config.mechanics.ticks_per_second,
        );
        ctx.grid.place_unit(self.spawn_x, y, id, self.id);
        self.units.push(unit);
        self.spawn_count += 1;

        SpawnAttempt::Spawned(id)
    }

    /// Place a building at `(x, y)`.
    ///
    /// Returns `true` on success.
    pub fn build(&mut self, x: u32, y: u32, template_index: usize, ctx: &mut TickContext<'_>) -> bool {
        let width = ctx.grid.width();
        if !ctx.grid.in_bounds(x, y) || x == 0 || x == width - 1 {
            debug!(player = %self.id, x, y, "Build rejected: outside buildable lane");
            return false;
        }
        if !ctx.config.mechanics.build_anywhere && !self.in_territory(x) {
            debug!(player = %self.id, x, y, "Build rejected: outside territory");
            return false;
        }
        if ctx.grid.has_building(x, y) {
            debug!(player = %self.id, x, y, "Build rejected: cell occupied");
            return false;
        }
        let template = match ctx.config.template(TemplateKind::Building, template_index) {
            Ok(template) => template,
            Err(err) => {
                debug!(player = %self.id, %err, "Build rejected");
                return false;
            }
        };
        if !template.is_unlocked_at(self.level) {
            debug!(player = %self.id, template = %template.id, "Build rejected: locked");
            return false;
        }
        let cost = coins(template.gold_cost);
        if self.gold < cost {
            debug!(player = %self.id, template = %template.id, "Build rejected: insufficient gold");
            return false;
        }

        self.gold -= cost;
        let id = ctx.ids.allocate();
        let building = Building::from_template(
            template,
            template_index,
            id,
            self.id,
            GridPos::new(x, y),
            ctx.config.mechanics.ticks_per_second,
        );
        ctx.grid.place_building(x, y, id, self.id);
        self.buildings.push(building);
        true
    }

    /// Apply a decoded action.
    pub fn apply_action(&mut self, action: Action, ctx: &mut TickContext<'_>) -> ActionOutcome {
        match action {
            Action::MoveCursorX(x) => {
                self.cursor.x = x.min(ctx.grid.width() - 1);
                ActionOutcome::Applied
            }
            Action::MoveCursorY(y) => {
                self.cursor.y = y.min(ctx.grid.height() - 1);
                ActionOutcome::Applied
            }
            Action::SpawnUnit(index) => ActionOutcome::from_success(self.spawn(index, ctx)),
            Action::Build(index) => {
                let GridPos { x, y } = self.cursor;
                ActionOutcome::from_success(self.build(x, y, index, ctx))
            }
        }
    }

    /// Coarse scripted action.
    ///
    /// Returns whether anything was attempted, i.e. whether an affordable
    /// unlocked template existed.
    pub fn do_generic_action(&mut self, action: GenericAction, ctx: &mut TickContext<'_>) -> bool {
        match action {
            GenericAction::SpawnRandom => {
                let choices: Vec<usize> = self
                    .available_units(ctx.config)
                    .into_iter()
                    .filter(|&i| self.can_afford_unit(ctx.config, i))
                    .collect();
                if choices.is_empty() {
                    return false;
                }
                let index = choices[ctx.rng.gen_range(0..choices.len())];
                self.spawn(index, ctx);
                true
            }
            GenericAction::BuildRandom => {
                let choices: Vec<usize> = self
                    .available_buildings(ctx.config)
                    .into_iter()
                    .filter(|&i| self.can_afford_building(ctx.config, i))
                    .collect();
                if choices.is_empty() {
                    return false;
                }
                let index = choices[ctx.rng.gen_range(0..choices.len())];
                let half = (ctx.grid.width() / 2).max(1);
                let rel_x = ctx.rng.gen_range(0..half);
                let y = ctx.rng.gen_range(0..ctx.grid.height());
                let x = match self.id {
                    PlayerId::One => rel_x,
                    PlayerId::Two => ctx.grid.width() - rel_x - 1,
                };
                self.build(x, y, index, ctx);
                true
            }
        }
    }

    /// Run this player's part of one tick.
    ///
    /// Order: income, one backlog retry, building fire against the
    /// opponent's live units, own unit movement, then removal of own units
    /// flagged for despawn.
    pub fn update(&mut self, opponent: &mut Player, ctx: &mut TickContext<'_>) -> PlayerTickReport {
        let mut report = PlayerTickReport::default();

        self.income_counter = self.income_counter.saturating_sub(1);
        if self.income_counter == 0 {
            self.gold = self.gold.saturating_add(self.income);
            self.income_counter = ctx.config.mechanics.income_period_ticks();
            report.income_paid = true;
        }

        if let Some(template_index) = self.backlog.pop_front() {
            match self.try_spawn(template_index, ctx) {
                SpawnAttempt::Spawned(id) => report.backlog_spawned = Some(id),
                SpawnAttempt::Saturated => self.backlog.push_front(template_index),
                SpawnAttempt::Rejected => {
                    debug!(player = %self.id, template_index, "Dropped backlog entry");
                }
            }
        }

        let has_targets = opponent.units.iter().any(Unit::is_alive);
        for building in &mut self.buildings {
            if !has_targets || !building.reload() {
                continue;
            }
            for unit in opponent.units.iter_mut().filter(|u| u.is_alive()) {
                let outcome = building.shoot(unit, &mut *ctx.rng);
                if let ShotOutcome::Hit { killed, .. } = outcome {
                    report.hits += 1;
                    if killed {
                        report.kills.push(unit.id);
                    }
                }
                if outcome.is_handled() {
                    break;
                }
            }
        }
        self.kill_count += report.kills.len() as u32;

        for unit in &mut self.units {
            if unit.advance(ctx.grid, self.goal_x) == MoveOutcome::ReachedBase {
                opponent.health -= ctx.config.mechanics.base_damage;
                report.base_hits += 1;
                debug!(player = %self.id, unit = unit.id, opponent_health = opponent.health, "Unit reached base");
            }
        }

        report.removed = self.sweep_despawned(ctx.grid);
        report
    }

    /// Remove units flagged for despawn from the grid and the roster.
    ///
    /// Returns how many were removed.
    pub fn sweep_despawned(&mut self, grid: &mut GridMap) -> u32 {
        let before = self.units.len();
        self.units.retain(|unit| {
            if unit.despawn {
                unit.remove(grid);
                false
            } else {
                true
            }
        });
        (before - self.units.len()) as u32
    }
}

fn coins(amount: u32) -> Fixed {
    Fixed::saturating_from_num(amount)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::EntityTemplate;
    use rand::SeedableRng;

    struct World {
        grid: GridMap,
        config: MatchConfig,
        rng: ChaCha8Rng,
        ids: IdAllocator,
    }

    impl World {
        fn new(config: MatchConfig) -> Self {
            let grid = GridMap::new(
                config.map.width,
                config.map.height,
                config.map.center_band_width,
            );
            Self {
                grid,
                config,
                rng: ChaCha8Rng::seed_from_u64(11),
                ids: IdAllocator::new(),
            }
        }

        fn ctx(&mut self) -> TickContext<'_> {
            TickContext {
                grid: &mut self.grid,
                config: &self.config,
                rng: &mut self.rng,
                ids: &mut self.ids,
            }
        }
    }

    fn grunt(cost: u32) -> EntityTemplate {
        EntityTemplate {
            id: "grunt".to_string(),
            name: "Grunt".to_string(),
            icon: String::new(),
            health: 10,
            armor: 0,
            speed: Fixed::ONE,
            attack_min: 0,
            attack_max: 0,
            attack_pen: 0,
            attack_speed: Fixed::ZERO,
            attack_range: Fixed::ZERO,
            level: 0,
            gold_cost: cost,
        }
    }

    fn small_config() -> MatchConfig {
        let mut config = MatchConfig::default();
        config.map.width = 10;
        config.map.height = 3;
        config.mechanics.start_gold = 50;
        config.mechanics.start_income = 0;
        config.units = vec![grunt(30)];
        config
    }

    #[test]
    fn test_spawn_debits_gold_and_raises_income() {
        let mut world = World::new(small_config());
        let mut player = Player::new(PlayerId::One, &world.config);

        assert!(player.spawn(0, &mut world.ctx()));
        assert_eq!(player.gold, Fixed::from_num(20));
        assert_eq!(player.income, Fixed::from_num(30) * Fixed::from_num(0.2));
        assert_eq!(player.units.len(), 1);
        assert_eq!(player.spawn_count, 1);

        assert!(!player.spawn(0, &mut world.ctx()));
        assert_eq!(player.gold, Fixed::from_num(20));
        assert_eq!(player.units.len(), 1);
        assert!(player.backlog.is_empty());
    }

    #[test]
    fn test_spawn_places_unit_on_spawn_column() {
        let mut world = World::new(small_config());
        let mut player = Player::new(PlayerId::Two, &world.config);

        assert!(player.spawn(0, &mut world.ctx()));
        let unit = &player.units[0];
        assert_eq!(unit.position.x, 9);
        assert!(world.grid.has_unit(9, unit.position.y));
        assert!(world.grid.is_consistent());
    }

    #[test]
    fn test_saturated_spawn_goes_to_backlog() {
        let mut config = small_config();
        config.mechanics.start_gold = 500;
        let mut world = World::new(config);
        let mut player = Player::new(PlayerId::One, &world.config);
        for y in 0..3 {
            world.grid.place_unit(0, y, 100 + y, PlayerId::Two);
        }

        assert!(!player.spawn(0, &mut world.ctx()));
        assert_eq!(player.backlog, VecDeque::from(vec![0]));
        assert_eq!(player.gold, Fixed::from_num(500));
        assert_eq!(player.income, Fixed::ZERO);
    }

    #[test]
    fn test_locked_template_rejected() {
        let mut config = small_config();
        config.units[0].level = 1;
        let mut world = World::new(config);
        let mut player = Player::new(PlayerId::One, &world.config);

        assert!(!player.spawn(0, &mut world.ctx()));
        assert!(player.backlog.is_empty());
        assert_eq!(player.gold, Fixed::from_num(50));
    }

    #[test]
    fn test_build_rejects_border_columns() {
        let mut config = small_config();
        config.mechanics.build_anywhere = true;
        let mut world = World::new(config);
        let mut player = Player::new(PlayerId::One, &world.config);
        let before = world.grid.clone();

        assert!(!player.build(0, 1, 0, &mut world.ctx()));
        assert!(!player.build(9, 1, 0, &mut world.ctx()));
        assert_eq!(player.gold, Fixed::from_num(50));
        assert_eq!(world.grid, before);
    }

    #[test]
    fn test_build_respects_territory() {
        let mut world = World::new(small_config());
        let mut one = Player::new(PlayerId::One, &world.config);
        let mut two = Player::new(PlayerId::Two, &world.config);
        let center = world.grid.center();

        assert!(!one.build(center.start, 0, 0, &mut world.ctx()));
        assert!(!one.build(center.end + 1, 0, 0, &mut world.ctx()));
        assert!(one.build(center.start - 1, 0, 0, &mut world.ctx()));

        assert!(!two.build(center.end, 0, 0, &mut world.ctx()));
        assert!(two.build(center.end + 1, 0, 0, &mut world.ctx()));
        assert!(world.grid.is_consistent());
    }

    #[test]
    fn test_build_rejects_occupied_and_unaffordable() {
        let mut world = World::new(small_config());
        let mut player = Player::new(PlayerId::One, &world.config);

        assert!(player.build(1, 1, 0, &mut world.ctx()));
        assert_eq!(player.gold, Fixed::from_num(30));
        assert!(!player.build(1, 1, 0, &mut world.ctx()));

        player.gold = Fixed::from_num(5);
        assert!(!player.build(2, 1, 0, &mut world.ctx()));
        assert_eq!(player.buildings.len(), 1);
    }

    #[test]
    fn test_income_paid_every_period() {
        let mut config = small_config();
        config.mechanics.income_frequency = 1;
        config.mechanics.ticks_per_second = 2;
        config.mechanics.start_income = 7;
        let mut world = World::new(config);
        let mut one = Player::new(PlayerId::One, &world.config);
        let mut two = Player::new(PlayerId::Two, &world.config);

        assert!(!one.update(&mut two, &mut world.ctx()).income_paid);
        assert!(one.update(&mut two, &mut world.ctx()).income_paid);
        assert_eq!(one.gold, Fixed::from_num(57));
    }

    #[test]
    fn test_backlog_drains_one_entry_per_tick() {
        let mut config = small_config();
        config.mechanics.start_gold = 500;
        let mut world = World::new(config);
        let mut one = Player::new(PlayerId::One, &world.config);
        let mut two = Player::new(PlayerId::Two, &world.config);
        for y in 0..3 {
            world.grid.place_unit(0, y, 100 + y, PlayerId::Two);
        }
        assert!(!one.spawn(0, &mut world.ctx()));
        assert!(!one.spawn(0, &mut world.ctx()));
        assert_eq!(one.backlog.len(), 2);

        one.update(&mut two, &mut world.ctx());
        assert_eq!(one.backlog.len(), 2);
        assert!(one.units.is_empty());

        world.grid.clear_unit(0, 1);
        world.grid.clear_unit(0, 2);
        let report = one.update(&mut two, &mut world.ctx());
        assert!(report.backlog_spawned.is_some());
        assert_eq!(one.units.len(), 1);
        assert_eq!(one.backlog.len(), 1);
    }

    #[test]
    fn test_unaffordable_backlog_entry_dropped() {
        let mut world = World::new(small_config());
        let mut one = Player::new(PlayerId::One, &world.config);
        let mut two = Player::new(PlayerId::Two, &world.config);
        one.backlog.push_back(0);
        one.gold = Fixed::from_num(10);

        let report = one.update(&mut two, &mut world.ctx());
        assert!(report.backlog_spawned.is_none());
        assert!(one.backlog.is_empty());
        assert_eq!(one.gold, Fixed::from_num(10));
    }

    #[test]
    fn test_levelup_consumes_table() {
        let mut config = small_config();
        config.level_up = vec![crate::data::LevelCost {
            gold: 40,
            lumber: 0,
        }];
        let mut player = Player::new(PlayerId::One, &config);

        assert!(player.can_afford_levelup(&config));
        assert!(player.levelup(&config).unwrap());
        assert_eq!(player.level, 1);
        assert_eq!(player.gold, Fixed::from_num(10));
        assert!(matches!(
            player.levelup(&config),
            Err(GameError::LevelTableExhausted { level: 1 })
        ));
    }

    #[test]
    fn test_levelup_unaffordable_is_not_error() {
        let config = MatchConfig::default();
        let mut player = Player::new(PlayerId::One, &config);
        assert!(!player.levelup(&config).unwrap());
        assert_eq!(player.level, 0);
        assert_eq!(player.gold, Fixed::from_num(100));
    }

    #[test]
    fn test_score_formula() {
        let config = small_config();
        let mut player = Player::new(PlayerId::One, &config);
        player.spawn_count = 3;
        player.income = Fixed::from_num(2);
        player.level = 1;
        assert_eq!(player.score(), Fixed::from_num(1000));
    }

    #[test]
    fn test_available_templates_follow_level() {
        let config = MatchConfig::default();
        let mut player = Player::new(PlayerId::One, &config);
        assert_eq!(player.available_units(&config), vec![0, 1]);
        assert_eq!(player.available_buildings(&config), vec![0]);
        player.level = 2;
        assert_eq!(player.available_units(&config), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_cursor_actions() {
        let mut world = World::new(small_config());
        let mut player = Player::new(PlayerId::One, &world.config);
        assert_eq!(player.cursor, GridPos::new(0, 1));

        let outcome = player.apply_action(Action::MoveCursorX(3), &mut world.ctx());
        assert_eq!(outcome, ActionOutcome::Applied);
        player.apply_action(Action::MoveCursorY(2), &mut world.ctx());
        assert_eq!(player.cursor, GridPos::new(3, 2));

        assert_eq!(
            player.apply_action(Action::Build(0), &mut world.ctx()),
            ActionOutcome::Applied
        );
        assert!(world.grid.has_building(3, 2));
    }

    #[test]
    fn test_unit_reaching_base_damages_opponent() {
        let mut config = small_config();
        config.units[0].speed = Fixed::from_num(10);
        let mut world = World::new(config);
        let mut one = Player::new(PlayerId::One, &world.config);
        let mut two = Player::new(PlayerId::Two, &world.config);
        let start = two.health;

        assert!(one.spawn(0, &mut world.ctx()));
        let mut reached = 0;
        for _ in 0..20 {
            reached += one.update(&mut two, &mut world.ctx()).base_hits;
        }
        assert_eq!(reached, 1);
        assert_eq!(two.health, start - 1);
        assert!(one.units.is_empty());
        assert!(world.grid.is_consistent());
    }

    #[test]
    fn test_generic_spawn_without_gold_is_not_attempted() {
        let mut world = World::new(small_config());
        let mut player = Player::new(PlayerId::One, &world.config);
        player.gold = Fixed::ZERO;
        assert!(!player.do_generic_action(GenericAction::SpawnRandom, &mut world.ctx()));
        assert!(!player.do_generic_action(GenericAction::BuildRandom, &mut world.ctx()));
    }

    #[test]
    fn test_reset_restores_start_state() {
        let mut world = World::new(small_config());
        let mut player = Player::new(PlayerId::One, &world.config);
        player.spawn(0, &mut world.ctx());
        player.level = 2;
        player.reset(&world.config);
        assert_eq!(player, Player::new(PlayerId::One, &world.config));
    }
}
