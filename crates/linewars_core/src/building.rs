//! Live buildings: stationary towers that shoot enemy units in range.
//!
//! # Reload state machine
//!
//! [`Building::reload`] runs once per building per tick while the opponent
//! has live units. It ticks the counter down by one; when the counter
//! reaches zero it resets to `ceil(ticks_per_second / attack_speed)` and the
//! building fires this tick. A firing building is then presented candidates
//! through [`Building::shoot`] until one is in range. If none is, the shot
//! is lost and the reload stays consumed.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combat::{effective_damage, roll_damage};
use crate::components::{EntityId, PlayerId};
use crate::data::EntityTemplate;
use crate::math::{ticks_per_event, Fixed, GridPos};
use crate::unit::Unit;

/// Result of presenting one candidate to [`Building::shoot`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ShotOutcome {
    /// Target in range and damaged.
    Hit {
        /// Damage applied after penetration.
        damage: u32,
        /// Whether the hit killed the target.
        killed: bool,
    },
    /// Target out of range; the caller may present the next candidate.
    OutOfRange,
}

impl ShotOutcome {
    /// Whether the caller should stop scanning candidates this tick.
    #[must_use]
    pub const fn is_handled(self) -> bool {
        matches!(self, Self::Hit { .. })
    }
}

/// A live building cloned from a template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Building {
    /// Instance id, also written into the grid.
    pub id: EntityId,
    /// Owning player.
    pub owner: PlayerId,
    /// Index of the template in the building table.
    pub template_index: usize,
    /// Stable template identifier.
    pub template_id: String,
    /// Cell the building occupies.
    pub position: GridPos,
    /// Current health.
    pub health: i32,
    /// Minimum damage roll.
    pub attack_min: u32,
    /// Maximum damage roll.
    pub attack_max: u32,
    /// Armor penetration.
    pub attack_pen: i32,
    /// Attack range in cells.
    #[serde(with = "crate::math::fixed_serde")]
    pub attack_range: Fixed,
    /// Ticks between shots.
    pub reload_ticks: u32,
    /// Reload countdown, in `1..=reload_ticks`.
    pub reload_counter: u32,
}

impl Building {
    /// Create a live building from a template.
    ///
    /// The reload counter starts full, so the first shot lands on the
    /// `reload_ticks`-th reload after construction.
    #[must_use]
    pub fn from_template(
        template: &EntityTemplate,
        template_index: usize,
        id: EntityId,
        owner: PlayerId,
        position: GridPos,
        ticks_per_second: u32,
    ) -> Self {
        let reload_ticks = ticks_per_event(ticks_per_second, template.attack_speed);
        Self {
            id,
            owner,
            template_index,
            template_id: template.id.clone(),
            position,
            health: template.health,
            attack_min: template.attack_min,
            attack_max: template.attack_max,
            attack_pen: template.attack_pen,
            attack_range: template.attack_range,
            reload_ticks,
            reload_counter: reload_ticks,
        }
    }

    /// Whether `unit` is within attack range.
    #[must_use]
    pub fn in_range(&self, unit: &Unit) -> bool {
        self.position.within_range(unit.position, self.attack_range)
    }

    /// Advance the reload counter by one tick.
    ///
    /// Returns `true` when the building fires this tick.
    pub fn reload(&mut self) -> bool {
        self.reload_counter = self.reload_counter.saturating_sub(1);
        if self.reload_counter > 0 {
            return false;
        }
        self.reload_counter = self.reload_ticks;
        true
    }

    /// Fire at one candidate. Only called on ticks where [`reload`] fired.
    ///
    /// [`reload`]: Building::reload
    pub fn shoot<R: Rng + ?Sized>(&mut self, unit: &mut Unit, rng: &mut R) -> ShotOutcome {
        if !self.in_range(unit) {
            return ShotOutcome::OutOfRange;
        }

        let raw = roll_damage(rng, self.attack_min, self.attack_max);
        let damage = effective_damage(raw, unit.armor, self.attack_pen);
        let killed = unit.damage(damage);
        tracing::trace!(
            building = self.id,
            unit = unit.id,
            raw,
            damage,
            killed,
            "Building hit unit"
        );

        ShotOutcome::Hit { damage, killed }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn tower(attack_speed: f64, range: f64, attack: (u32, u32), pen: i32) -> EntityTemplate {
        EntityTemplate {
            id: "tower".to_string(),
            name: "Tower".to_string(),
            icon: String::new(),
            health: 100,
            armor: 0,
            speed: Fixed::ZERO,
            attack_min: attack.0,
            attack_max: attack.1,
            attack_pen: pen,
            attack_speed: Fixed::from_num(attack_speed),
            attack_range: Fixed::from_num(range),
            level: 0,
            gold_cost: 20,
        }
    }

    fn target(x: u32, y: u32, armor: i32) -> Unit {
        let template = EntityTemplate {
            id: "dummy".to_string(),
            name: "Dummy".to_string(),
            icon: String::new(),
            health: 1000,
            armor,
            speed: Fixed::ONE,
            attack_min: 0,
            attack_max: 0,
            attack_pen: 0,
            attack_speed: Fixed::ZERO,
            attack_range: Fixed::ZERO,
            level: 0,
            gold_cost: 0,
        };
        Unit::from_template(&template, 0, 99, PlayerId::Two, GridPos::new(x, y), 10)
    }

    fn building(template: &EntityTemplate) -> Building {
        Building::from_template(template, 0, 1, PlayerId::One, GridPos::new(5, 5), 10)
    }

    #[test]
    fn test_reload_ticks_from_attack_speed() {
        let b = building(&tower(2.0, 3.0, (1, 1), 0));
        assert_eq!(b.reload_ticks, 5);
        assert_eq!(b.reload_counter, 5);
    }

    #[test]
    fn test_fires_every_reload_interval() {
        let mut b = building(&tower(2.0, 3.0, (1, 1), 0));

        let fired_on: Vec<u32> = (1..=15).filter(|_| b.reload()).collect();
        assert_eq!(fired_on, vec![5, 10, 15]);
        assert_eq!(b.reload_counter, 5);
    }

    #[test]
    fn test_only_hits_are_handled() {
        assert!(ShotOutcome::Hit {
            damage: 1,
            killed: false
        }
        .is_handled());
        assert!(!ShotOutcome::OutOfRange.is_handled());
    }

    #[test]
    fn test_miss_leaves_target_and_reload_untouched() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut b = building(&tower(10.0, 1.0, (1, 1), 0));
        let mut far = target(9, 9, 0);

        assert!(b.reload());
        assert_eq!(b.shoot(&mut far, &mut rng), ShotOutcome::OutOfRange);
        assert_eq!(b.reload_counter, 1);
        assert_eq!(far.health, 1000);
    }

    #[test]
    fn test_out_of_range_does_not_spend_the_shot() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let mut b = building(&tower(10.0, 2.0, (3, 3), 0));
        let mut far = target(20, 5, 0);
        let mut near = target(5, 6, 0);

        assert_eq!(b.shoot(&mut far, &mut rng), ShotOutcome::OutOfRange);
        assert_eq!(
            b.shoot(&mut near, &mut rng),
            ShotOutcome::Hit {
                damage: 3,
                killed: false
            }
        );
        assert_eq!(near.health, 997);
    }

    #[test]
    fn test_damage_with_armor_equal_pen() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut b = building(&tower(10.0, 3.0, (4, 4), 5));
        let mut unit = target(5, 6, 5);

        assert_eq!(
            b.shoot(&mut unit, &mut rng),
            ShotOutcome::Hit {
                damage: 4,
                killed: false
            }
        );
        assert_eq!(unit.health, 996);
    }

    #[test]
    fn test_damage_with_pen_above_armor() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut b = building(&tower(10.0, 3.0, (4, 4), 5));
        let mut unit = target(5, 6, 2);

        assert_eq!(
            b.shoot(&mut unit, &mut rng),
            ShotOutcome::Hit {
                damage: 7,
                killed: false
            }
        );
    }

    #[test]
    fn test_range_is_euclidean() {
        let b = building(&tower(1.0, 2.0, (1, 1), 0));
        assert!(b.in_range(&target(6, 6, 0)));
        assert!(b.in_range(&target(7, 5, 0)));
        assert!(!b.in_range(&target(7, 7, 0)));
    }
}
