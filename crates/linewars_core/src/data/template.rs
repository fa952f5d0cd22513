//! Entity templates: immutable stat blueprints for units and buildings.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_decimal_serde, Fixed};

/// Which template table an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateKind {
    /// Mobile unit.
    Unit,
    /// Stationary building.
    Building,
}

impl TemplateKind {
    /// Lowercase name used in errors and logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unit => "unit",
            Self::Building => "building",
        }
    }
}

/// Data-driven unit or building definition.
///
/// Loaded once with the match configuration and never mutated. Live
/// entities copy the stats they need when they are created.
///
/// # Example RON
///
/// ```ron
/// EntityTemplate(
///     id: "arrow_tower",
///     name: "Arrow Tower",
///     icon: "arrow_tower.png",
///     health: 100,
///     attack_min: 3,
///     attack_max: 6,
///     attack_pen: 1,
///     attack_speed: 2.0,
///     attack_range: 3.0,
///     level: 0,
///     gold_cost: 20,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTemplate {
    /// Stable identifier.
    pub id: String,

    /// Display name.
    pub name: String,

    /// Sprite reference for renderers.
    #[serde(default)]
    pub icon: String,

    /// Starting health.
    pub health: i32,

    /// Flat armor, compared against attacker penetration.
    #[serde(default)]
    pub armor: i32,

    /// Movement speed in cells per second (units only).
    #[serde(default = "zero_fixed", with = "fixed_decimal_serde")]
    pub speed: Fixed,

    /// Minimum damage roll.
    #[serde(default)]
    pub attack_min: u32,

    /// Maximum damage roll.
    #[serde(default)]
    pub attack_max: u32,

    /// Armor penetration.
    #[serde(default)]
    pub attack_pen: i32,

    /// Attacks per second.
    #[serde(default = "zero_fixed", with = "fixed_decimal_serde")]
    pub attack_speed: Fixed,

    /// Attack range in cells (Euclidean).
    #[serde(default = "zero_fixed", with = "fixed_decimal_serde")]
    pub attack_range: Fixed,

    /// Player level required before this template can be used.
    #[serde(default)]
    pub level: u32,

    /// Gold cost.
    pub gold_cost: u32,
}

fn zero_fixed() -> Fixed {
    Fixed::ZERO
}

impl EntityTemplate {
    /// Whether a player at `player_level` may use this template.
    #[must_use]
    pub const fn is_unlocked_at(&self, player_level: u32) -> bool {
        self.level <= player_level
    }

    /// Check the stats a template of `kind` needs to be usable.
    ///
    /// Returns a human-readable reason on failure.
    pub fn check(&self, kind: TemplateKind) -> std::result::Result<(), String> {
        if self.health <= 0 {
            return Err(format!("{} '{}' has non-positive health", kind.as_str(), self.id));
        }
        if self.attack_min > self.attack_max {
            return Err(format!(
                "{} '{}' has attack_min {} > attack_max {}",
                kind.as_str(),
                self.id,
                self.attack_min,
                self.attack_max
            ));
        }
        match kind {
            TemplateKind::Unit if self.speed <= Fixed::ZERO => {
                Err(format!("unit '{}' has non-positive speed", self.id))
            }
            TemplateKind::Building if self.attack_speed <= Fixed::ZERO => {
                Err(format!("building '{}' has non-positive attack_speed", self.id))
            }
            TemplateKind::Building if self.attack_range < Fixed::ZERO => {
                Err(format!("building '{}' has negative attack_range", self.id))
            }
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tower() -> EntityTemplate {
        EntityTemplate {
            id: "tower".to_string(),
            name: "Tower".to_string(),
            icon: String::new(),
            health: 100,
            armor: 0,
            speed: Fixed::ZERO,
            attack_min: 2,
            attack_max: 4,
            attack_pen: 1,
            attack_speed: Fixed::from_num(2),
            attack_range: Fixed::from_num(3),
            level: 1,
            gold_cost: 20,
        }
    }

    #[test]
    fn test_unlock_level() {
        let t = tower();
        assert!(!t.is_unlocked_at(0));
        assert!(t.is_unlocked_at(1));
        assert!(t.is_unlocked_at(2));
    }

    #[test]
    fn test_check_building() {
        assert!(tower().check(TemplateKind::Building).is_ok());

        let mut slow = tower();
        slow.attack_speed = Fixed::ZERO;
        assert!(slow.check(TemplateKind::Building).is_err());
    }

    #[test]
    fn test_check_rejects_inverted_attack_range() {
        let mut t = tower();
        t.attack_min = 9;
        let err = t.check(TemplateKind::Building).unwrap_err();
        assert!(err.contains("attack_min"));
    }

    #[test]
    fn test_unit_needs_speed() {
        let t = tower();
        assert!(t.check(TemplateKind::Unit).is_err());
    }

    #[test]
    fn test_ron_defaults() {
        let text = r#"EntityTemplate(id: "m", name: "Militia", health: 30, speed: 1.5, gold_cost: 10)"#;
        let t: EntityTemplate = ron::from_str(text).unwrap();
        assert_eq!(t.speed, Fixed::from_num(1.5));
        assert_eq!(t.armor, 0);
        assert_eq!(t.level, 0);
        assert!(t.check(TemplateKind::Unit).is_ok());
    }
}
