//! Damage model for building attacks.
//!
//! A hit rolls raw damage uniformly from `[attack_min, attack_max]` and then
//! applies the penetration term:
//!
//! ```text
//! effective = raw - min(0, armor - attack_pen)
//! ```
//!
//! The subtracted term is never positive. Armor at or above penetration
//! leaves the roll unchanged; penetration above armor adds the difference.

use rand::Rng;

/// Penetration bonus added to a raw roll.
///
/// Always `>= 0`.
#[must_use]
pub fn penetration_bonus(armor: i32, attack_pen: i32) -> u32 {
    let term = armor.saturating_sub(attack_pen).min(0);
    term.unsigned_abs()
}

/// Effective damage for a given raw roll.
#[must_use]
pub fn effective_damage(raw: u32, armor: i32, attack_pen: i32) -> u32 {
    raw.saturating_add(penetration_bonus(armor, attack_pen))
}

/// Roll raw damage uniformly from `[min, max]`.
///
/// An inverted range rolls `min`; configuration validation rejects such
/// templates before a match starts.
pub fn roll_damage<R: Rng + ?Sized>(rng: &mut R, min: u32, max: u32) -> u32 {
    if min >= max {
        return min;
    }
    rng.gen_range(min..=max)
}
