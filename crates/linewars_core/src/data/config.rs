//! Match configuration: mechanics, map, level-up table and template tables.
//!
//! The configuration is loaded once when a match is constructed and shared
//! read-only for the rest of the match. File loading lives in the runner;
//! this module only parses text and validates.

use serde::{Deserialize, Serialize};

use super::template::{EntityTemplate, TemplateKind};
use crate::error::{GameError, Result};
use crate::math::{fixed_decimal_serde, Fixed};

/// Largest accepted lane, in cells.
pub const MAX_MAP_CELLS: u64 = 1 << 20;

/// Economy and timing rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mechanics {
    /// Simulation ticks per second of game time.
    pub ticks_per_second: u32,

    /// Base health each player starts with.
    pub start_health: i32,

    /// Gold each player starts with.
    pub start_gold: u32,

    /// Lumber each player starts with.
    #[serde(default)]
    pub start_lumber: u32,

    /// Gold credited every income period before any spawns.
    pub start_income: u32,

    /// Seconds between income payouts.
    pub income_frequency: u32,

    /// Fraction of a spawned unit's cost added to income.
    #[serde(with = "fixed_decimal_serde")]
    pub income_ratio: Fixed,

    /// Base health a player loses when an enemy unit reaches their base.
    #[serde(default = "default_base_damage")]
    pub base_damage: i32,

    /// Allow building outside the player's own territory.
    #[serde(default)]
    pub build_anywhere: bool,
}

const fn default_base_damage() -> i32 {
    1
}

impl Mechanics {
    /// Ticks between income payouts.
    #[must_use]
    pub const fn income_period_ticks(&self) -> u32 {
        self.income_frequency.saturating_mul(self.ticks_per_second)
    }
}

impl Default for Mechanics {
    fn default() -> Self {
        Self {
            ticks_per_second: 10,
            start_health: 50,
            start_gold: 100,
            start_lumber: 0,
            start_income: 20,
            income_frequency: 10,
            income_ratio: Fixed::from_num(0.2),
            base_damage: default_base_damage(),
            build_anywhere: false,
        }
    }
}

/// Lane dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapConfig {
    /// Columns along the lane, including both base columns.
    pub width: u32,
    /// Rows across the lane.
    pub height: u32,
    /// Columns of the contested center band.
    #[serde(default = "default_center_band")]
    pub center_band_width: u32,
}

const fn default_center_band() -> u32 {
    2
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width: 30,
            height: 11,
            center_band_width: default_center_band(),
        }
    }
}

/// Price of one level-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LevelCost {
    /// Gold cost.
    pub gold: u32,
    /// Lumber cost.
    #[serde(default)]
    pub lumber: u32,
}

/// Complete match configuration.
///
/// # Example RON
///
/// ```ron
/// MatchConfig(
///     mechanics: Mechanics(
///         ticks_per_second: 10,
///         start_health: 50,
///         start_gold: 100,
///         start_income: 20,
///         income_frequency: 10,
///         income_ratio: 0.2,
///     ),
///     map: MapConfig(width: 30, height: 11),
///     level_up: [LevelCost(gold: 150)],
///     units: [...],
///     buildings: [...],
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Economy and timing rules.
    #[serde(default)]
    pub mechanics: Mechanics,

    /// Lane dimensions.
    #[serde(default)]
    pub map: MapConfig,

    /// Ordered level-up costs; entry `n` takes a player from level `n` to `n + 1`.
    #[serde(default)]
    pub level_up: Vec<LevelCost>,

    /// Unit templates, ordered by unlock level ascending.
    pub units: Vec<EntityTemplate>,

    /// Building templates, ordered by unlock level ascending.
    pub buildings: Vec<EntityTemplate>,
}

impl MatchConfig {
    /// Parse a configuration from RON text and validate it.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self =
            ron::from_str(text).map_err(|e| GameError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Render the configuration as pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .map_err(|e| GameError::InvalidState(format!("Failed to serialize config: {e}")))
    }

    /// Template table for a kind.
    #[must_use]
    pub fn templates(&self, kind: TemplateKind) -> &[EntityTemplate] {
        match kind {
            TemplateKind::Unit => &self.units,
            TemplateKind::Building => &self.buildings,
        }
    }

    /// Look up a template by table index.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::UnknownTemplate`] if `index` is past the table.
    pub fn template(&self, kind: TemplateKind, index: usize) -> Result<&EntityTemplate> {
        self.templates(kind)
            .get(index)
            .ok_or(GameError::UnknownTemplate {
                kind: kind.as_str(),
                index,
            })
    }

    /// Check construction invariants.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidConfig`] for empty template tables,
    /// templates out of unlock order, unusable template stats, zero rates,
    /// or a lane too small to hold two bases and a center band.
    pub fn validate(&self) -> Result<()> {
        let invalid = |msg: String| Err(GameError::InvalidConfig(msg));

        if self.mechanics.ticks_per_second == 0 {
            return invalid("ticks_per_second must be positive".to_string());
        }
        if self.mechanics.income_frequency == 0 {
            return invalid("income_frequency must be positive".to_string());
        }
        if self.mechanics.start_health <= 0 {
            return invalid("start_health must be positive".to_string());
        }
        if self.mechanics.income_ratio < Fixed::ZERO {
            return invalid("income_ratio must not be negative".to_string());
        }
        if self.map.height == 0 {
            return invalid("map height must be positive".to_string());
        }
        if self.map.center_band_width == 0 {
            return invalid("center_band_width must be positive".to_string());
        }
        let cells = u64::from(self.map.width) * u64::from(self.map.height);
        if cells > MAX_MAP_CELLS {
            return invalid(format!(
                "map {}x{} exceeds {MAX_MAP_CELLS} cells",
                self.map.width, self.map.height
            ));
        }
        // Two base columns, one buildable column per side, and the band.
        if self.map.width < self.map.center_band_width + 4 {
            return invalid(format!(
                "map width {} too small for center band of {}",
                self.map.width, self.map.center_band_width
            ));
        }

        for kind in [TemplateKind::Unit, TemplateKind::Building] {
            let templates = self.templates(kind);
            if templates.is_empty() {
                return invalid(format!("{} template list is empty", kind.as_str()));
            }
            for template in templates {
                template.check(kind).map_err(GameError::InvalidConfig)?;
            }
            if templates.windows(2).any(|w| w[0].level > w[1].level) {
                return invalid(format!(
                    "{} templates must be ordered by unlock level",
                    kind.as_str()
                ));
            }
        }

        Ok(())
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            mechanics: Mechanics::default(),
            map: MapConfig::default(),
            level_up: vec![
                LevelCost {
                    gold: 150,
                    lumber: 0,
                },
                LevelCost {
                    gold: 300,
                    lumber: 0,
                },
                LevelCost {
                    gold: 600,
                    lumber: 0,
                },
            ],
            units: default_units(),
            buildings: default_buildings(),
        }
    }
}

fn unit(
    id: &str,
    name: &str,
    health: i32,
    armor: i32,
    speed: f64,
    level: u32,
    cost: u32,
) -> EntityTemplate {
    EntityTemplate {
        id: id.to_string(),
        name: name.to_string(),
        icon: format!("{id}.png"),
        health,
        armor,
        speed: Fixed::from_num(speed),
        attack_min: 0,
        attack_max: 0,
        attack_pen: 0,
        attack_speed: Fixed::ZERO,
        attack_range: Fixed::ZERO,
        level,
        gold_cost: cost,
    }
}

fn default_units() -> Vec<EntityTemplate> {
    vec![
        unit("militia", "Militia", 30, 1, 1.0, 0, 10),
        unit("footman", "Footman", 60, 3, 1.0, 0, 25),
        unit("ranger", "Ranger", 45, 1, 1.5, 1, 40),
        unit("knight", "Knight", 120, 6, 1.25, 2, 80),
    ]
}

fn tower(
    id: &str,
    name: &str,
    attack: (u32, u32),
    pen: i32,
    speed: f64,
    range: f64,
    level: u32,
    cost: u32,
) -> EntityTemplate {
    EntityTemplate {
        id: id.to_string(),
        name: name.to_string(),
        icon: format!("{id}.png"),
        health: 100,
        armor: 0,
        speed: Fixed::ZERO,
        attack_min: attack.0,
        attack_max: attack.1,
        attack_pen: pen,
        attack_speed: Fixed::from_num(speed),
        attack_range: Fixed::from_num(range),
        level,
        gold_cost: cost,
    }
}

fn default_buildings() -> Vec<EntityTemplate> {
    vec![
        tower("arrow_tower", "Arrow Tower", (3, 6), 1, 2.0, 3.0, 0, 20),
        tower("cannon_tower", "Cannon Tower", (8, 14), 4, 0.5, 4.0, 1, 50),
        tower("mage_tower", "Mage Tower", (5, 9), 8, 1.0, 5.0, 2, 90),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = MatchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.mechanics.income_period_ticks(), 100);
    }

    #[test]
    fn test_empty_templates_rejected() {
        let mut config = MatchConfig::default();
        config.units.clear();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig(msg) if msg.contains("unit")));
    }

    #[test]
    fn test_unordered_templates_rejected() {
        let mut config = MatchConfig::default();
        config.buildings.reverse();
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_tiny_map_rejected() {
        let mut config = MatchConfig::default();
        config.map.width = 5;
        config.map.center_band_width = 2;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_oversized_map_rejected() {
        let mut config = MatchConfig::default();
        config.map.width = u32::MAX;
        config.map.height = 3;
        let err = config.validate().unwrap_err();
        assert!(matches!(err, GameError::InvalidConfig(msg) if msg.contains("exceeds")));

        config.map.width = 1024;
        config.map.height = 1024;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_tick_rate_rejected() {
        let mut config = MatchConfig::default();
        config.mechanics.ticks_per_second = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_ron_roundtrip_keeps_config() {
        let config = MatchConfig::default();
        let text = config.to_ron_string().unwrap();
        let parsed = MatchConfig::from_ron_str(&text).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_shipped_data_file_parses() {
        let text = include_str!("../../../../data/linewars.ron");
        let config = MatchConfig::from_ron_str(text).unwrap();
        assert_eq!(config.map.width, 30);
        assert_eq!(config.units.len(), 4);
        assert_eq!(config.buildings.len(), 3);
    }

    #[test]
    fn test_parse_error_is_reported() {
        let err = MatchConfig::from_ron_str("MatchConfig(").unwrap_err();
        assert!(matches!(err, GameError::ConfigParse(_)));
    }

    #[test]
    fn test_template_lookup() {
        let config = MatchConfig::default();
        assert_eq!(config.template(TemplateKind::Unit, 0).unwrap().id, "militia");
        assert!(matches!(
            config.template(TemplateKind::Building, 9),
            Err(GameError::UnknownTemplate { kind: "building", index: 9 })
        ));
    }
}
