//! Test fixtures and helpers.
//!
//! Pre-built configurations, templates and matches for consistent testing.

use fixed::types::I32F32;
use linewars_core::action::GenericAction;
use linewars_core::components::PlayerId;
use linewars_core::data::{EntityTemplate, LevelCost, MapConfig, MatchConfig, Mechanics};
use linewars_core::simulation::Match;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> I32F32 {
    I32F32::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Note: In real simulation code, never use floats.
/// This is only for convenient test setup.
#[must_use]
pub fn fixed_f(n: f64) -> I32F32 {
    I32F32::from_num(n)
}

/// A unit template with no attack.
#[must_use]
pub fn unit_template(id: &str, health: i32, armor: i32, speed: f64, cost: u32) -> EntityTemplate {
    EntityTemplate {
        id: id.to_string(),
        name: id.to_string(),
        icon: String::new(),
        health,
        armor,
        speed: fixed_f(speed),
        attack_min: 0,
        attack_max: 0,
        attack_pen: 0,
        attack_speed: I32F32::ZERO,
        attack_range: I32F32::ZERO,
        level: 0,
        gold_cost: cost,
    }
}

/// A tower template.
#[must_use]
pub fn tower_template(
    id: &str,
    attack: (u32, u32),
    attack_pen: i32,
    attack_speed: f64,
    attack_range: f64,
    cost: u32,
) -> EntityTemplate {
    EntityTemplate {
        id: id.to_string(),
        name: id.to_string(),
        icon: String::new(),
        health: 100,
        armor: 0,
        speed: I32F32::ZERO,
        attack_min: attack.0,
        attack_max: attack.1,
        attack_pen,
        attack_speed: fixed_f(attack_speed),
        attack_range: fixed_f(attack_range),
        level: 0,
        gold_cost: cost,
    }
}

/// A 12x3 lane with plenty of gold, one cheap unit and one tower.
///
/// Units step every tick and towers fire every other tick, so scenarios
/// resolve in a few dozen ticks.
#[must_use]
pub fn small_config() -> MatchConfig {
    MatchConfig {
        mechanics: Mechanics {
            ticks_per_second: 10,
            start_health: 5,
            start_gold: 500,
            start_lumber: 0,
            start_income: 0,
            income_frequency: 10,
            income_ratio: fixed_f(0.2),
            base_damage: 1,
            build_anywhere: false,
        },
        map: MapConfig {
            width: 12,
            height: 3,
            center_band_width: 2,
        },
        level_up: vec![LevelCost {
            gold: 100,
            lumber: 0,
        }],
        units: vec![
            unit_template("runner", 20, 0, 10.0, 10),
            unit_template("brute", 80, 4, 5.0, 30),
        ],
        buildings: vec![tower_template("tower", (5, 5), 0, 5.0, 2.0, 20)],
    }
}

/// The configuration shipped in `data/linewars.ron`.
///
/// # Panics
///
/// Panics if the shipped file does not parse.
#[must_use]
pub fn shipped_config() -> MatchConfig {
    MatchConfig::from_ron_str(include_str!("../../../data/linewars.ron"))
        .expect("shipped config parses")
}

/// Create a match, panicking on an invalid configuration.
///
/// # Panics
///
/// Panics if `config` fails validation.
#[must_use]
pub fn new_match(config: MatchConfig, seed: u64) -> Match {
    Match::new(config, seed).expect("fixture config is valid")
}

/// Drive a match with both players using the generic actions on a fixed
/// cadence: spawn every 10 ticks, build every 25.
pub fn scripted_tick(game: &mut Match, tick: u64) {
    for player in PlayerId::BOTH {
        if tick % 10 == 0 {
            game.do_generic_action(player, GenericAction::SpawnRandom);
        }
        if tick % 25 == 0 {
            game.do_generic_action(player, GenericAction::BuildRandom);
        }
    }
    game.tick();
}
