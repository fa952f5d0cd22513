//! Fixed-point math utilities for deterministic simulation.
//!
//! Gold, income and rate conversions use fixed-point arithmetic so the
//! simulation produces identical results on every platform. Floating-point
//! values only appear at the controller boundary and are converted here.

use fixed::types::I32F32;
use serde::{Deserialize, Serialize};

/// Fixed-point number type for all simulation math.
///
/// Uses 32 bits for integer part and 32 bits for fractional part.
pub type Fixed = I32F32;

/// Serde support for fixed-point numbers.
///
/// Serializes fixed-point numbers as their raw bit representation (i64)
/// to preserve exact precision across serialization boundaries.
pub mod fixed_serde {
    use super::Fixed;
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as its raw bit representation.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_bits().serialize(serializer)
    }

    /// Deserialize a fixed-point number from its raw bit representation.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let bits = i64::deserialize(deserializer)?;
        Ok(Fixed::from_bits(bits))
    }
}

/// Serde support for human-edited fixed-point values.
///
/// Configuration files write `0.2` rather than raw bits, so these fields go
/// through `f64` once at load time.
pub mod fixed_decimal_serde {
    use super::Fixed;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    /// Serialize a fixed-point number as a decimal.
    pub fn serialize<S>(value: &Fixed, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        value.to_num::<f64>().serialize(serializer)
    }

    /// Deserialize a fixed-point number from a decimal.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<Fixed, D::Error>
    where
        D: Deserializer<'de>,
    {
        let value = f64::deserialize(deserializer)?;
        Fixed::checked_from_num(value)
            .ok_or_else(|| de::Error::custom(format!("{value} is out of fixed-point range")))
    }
}

/// A cell coordinate on the lane grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct GridPos {
    /// Column (along the lane).
    pub x: u32,
    /// Row (across the lane).
    pub y: u32,
}

impl GridPos {
    /// Create a new grid position.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// Squared Euclidean distance between two cell centers.
    #[must_use]
    pub fn distance_squared(self, other: Self) -> i64 {
        let dx = i64::from(self.x) - i64::from(other.x);
        let dy = i64::from(self.y) - i64::from(other.y);
        dx * dx + dy * dy
    }

    /// Whether `other` lies within `range` cells (Euclidean, inclusive).
    ///
    /// Compares squared values so no square root is needed.
    #[must_use]
    pub fn within_range(self, other: Self, range: Fixed) -> bool {
        if range < Fixed::ZERO {
            return false;
        }
        let dist_sq = Fixed::saturating_from_num(self.distance_squared(other));
        dist_sq <= range.saturating_mul(range)
    }
}

/// Number of whole ticks between events happening `rate` times per second.
///
/// Rounds up and never returns less than one tick.
#[must_use]
pub fn ticks_per_event(ticks_per_second: u32, rate: Fixed) -> u32 {
    if rate <= Fixed::ZERO {
        return u32::MAX;
    }
    let ticks = (Fixed::from_num(ticks_per_second) / rate).ceil();
    ticks.to_num::<i64>().clamp(1, i64::from(u32::MAX)) as u32
}

/// Clamp a controller intensity into `[0, 1]` as fixed-point.
///
/// NaN maps to zero.
#[must_use]
pub fn clamp_intensity(intensity: f64) -> Fixed {
    if intensity.is_nan() {
        return Fixed::ZERO;
    }
    Fixed::from_num(intensity.clamp(0.0, 1.0))
}
