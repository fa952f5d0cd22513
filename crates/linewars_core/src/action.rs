//! Discrete action space consumed by external controllers.
//!
//! Controllers speak in `(action_index, intensity)` pairs. [`Action::from_raw`]
//! decodes them into a closed enum once, at the boundary, so the rest of the
//! simulation never sees a float or an unchecked index.
//!
//! | index | action            | intensity mapping                       |
//! |-------|-------------------|-----------------------------------------|
//! | 0     | move cursor x     | `round(i * (width - 1))`                |
//! | 1     | move cursor y     | `round(i * (height - 1))`               |
//! | 2     | spawn unit        | `floor(i * 3)`, clamped to the unit list |
//! | 3     | build at cursor   | `floor(i * 2)`, clamped to the building list |

use serde::{Deserialize, Serialize};

use crate::data::MatchConfig;
use crate::error::{GameError, Result};
use crate::math::{clamp_intensity, Fixed};

/// Number of entries in the discrete action space.
pub const ACTION_COUNT: u32 = 4;

/// A decoded controller action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Action {
    /// Move the virtual cursor to column `x`.
    MoveCursorX(u32),
    /// Move the virtual cursor to row `y`.
    MoveCursorY(u32),
    /// Spawn the unit template at this index.
    SpawnUnit(usize),
    /// Build the building template at this index under the cursor.
    Build(usize),
}

impl Action {
    /// Decode an `(action_index, intensity)` pair.
    ///
    /// Intensity is clamped to `[0, 1]`; NaN counts as zero.
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidAction`] if `index` is not in `0..4`.
    pub fn from_raw(index: u32, intensity: f64, config: &MatchConfig) -> Result<Self> {
        let intensity = clamp_intensity(intensity);
        let scaled = |span: u32| intensity.saturating_mul(Fixed::from_num(span));

        match index {
            0 => Ok(Self::MoveCursorX(
                scaled(config.map.width.saturating_sub(1)).round().to_num(),
            )),
            1 => Ok(Self::MoveCursorY(
                scaled(config.map.height.saturating_sub(1)).round().to_num(),
            )),
            2 => Ok(Self::SpawnUnit(clamp_choice(
                scaled(3).floor().to_num(),
                config.units.len(),
            ))),
            3 => Ok(Self::Build(clamp_choice(
                scaled(2).floor().to_num(),
                config.buildings.len(),
            ))),
            other => Err(GameError::InvalidAction(other)),
        }
    }

    /// Action-space index of this action.
    #[must_use]
    pub const fn index(self) -> u32 {
        match self {
            Self::MoveCursorX(_) => 0,
            Self::MoveCursorY(_) => 1,
            Self::SpawnUnit(_) => 2,
            Self::Build(_) => 3,
        }
    }
}

fn clamp_choice(choice: usize, len: usize) -> usize {
    choice.min(len.saturating_sub(1))
}

/// Coarse two-entry action space used by scripted controllers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GenericAction {
    /// Spawn a random affordable unlocked unit.
    SpawnRandom,
    /// Build a random affordable unlocked building on a random cell of the
    /// player's own half.
    BuildRandom,
}

impl GenericAction {
    /// Decode a generic action index (0 = spawn, 1 = build).
    ///
    /// # Errors
    ///
    /// Returns [`GameError::InvalidAction`] for any other index.
    pub fn from_index(index: u32) -> Result<Self> {
        match index {
            0 => Ok(Self::SpawnRandom),
            1 => Ok(Self::BuildRandom),
            other => Err(GameError::InvalidAction(other)),
        }
    }
}

/// Everything a controller can ask of its player in one tick.
///
/// This is the unit recorded in replays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerInput {
    /// A decoded action from the discrete action space.
    Action(Action),
    /// A coarse scripted action.
    Generic(GenericAction),
    /// Buy the next level.
    LevelUp,
}

impl From<Action> for PlayerInput {
    fn from(action: Action) -> Self {
        Self::Action(action)
    }
}

impl From<GenericAction> for PlayerInput {
    fn from(action: GenericAction) -> Self {
        Self::Generic(action)
    }
}

/// What happened to a submitted action.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionOutcome {
    /// The action changed the match state.
    Applied,
    /// The request was refused (unaffordable, illegal cell, locked, deferred).
    Rejected,
    /// The match already has a winner; nothing was changed.
    MatchOver,
}

impl ActionOutcome {
    /// Map a transaction result onto an outcome.
    #[must_use]
    pub const fn from_success(success: bool) -> Self {
        if success {
            Self::Applied
        } else {
            Self::Rejected
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> MatchConfig {
        MatchConfig::default()
    }

    #[test]
    fn test_cursor_x_rounds_over_width() {
        let config = config();
        assert_eq!(
            Action::from_raw(0, 0.5, &config).unwrap(),
            Action::MoveCursorX(15)
        );
        assert_eq!(
            Action::from_raw(0, 1.0, &config).unwrap(),
            Action::MoveCursorX(29)
        );
        assert_eq!(
            Action::from_raw(0, 0.0, &config).unwrap(),
            Action::MoveCursorX(0)
        );
    }

    #[test]
    fn test_cursor_y_rounds_over_height() {
        let config = config();
        assert_eq!(
            Action::from_raw(1, 0.5, &config).unwrap(),
            Action::MoveCursorY(5)
        );
        assert_eq!(
            Action::from_raw(1, 0.96, &config).unwrap(),
            Action::MoveCursorY(10)
        );
    }

    #[test]
    fn test_intensity_is_clamped() {
        let config = config();
        assert_eq!(
            Action::from_raw(0, 7.5, &config).unwrap(),
            Action::MoveCursorX(29)
        );
        assert_eq!(
            Action::from_raw(0, -3.0, &config).unwrap(),
            Action::MoveCursorX(0)
        );
        assert_eq!(
            Action::from_raw(2, f64::NAN, &config).unwrap(),
            Action::SpawnUnit(0)
        );
    }

    #[test]
    fn test_spawn_and_build_choices() {
        let config = config();
        assert_eq!(
            Action::from_raw(2, 0.5, &config).unwrap(),
            Action::SpawnUnit(1)
        );
        assert_eq!(
            Action::from_raw(2, 1.0, &config).unwrap(),
            Action::SpawnUnit(3)
        );
        assert_eq!(Action::from_raw(3, 0.49, &config).unwrap(), Action::Build(0));
        assert_eq!(Action::from_raw(3, 1.0, &config).unwrap(), Action::Build(2));
    }

    #[test]
    fn test_choice_clamped_to_short_template_list() {
        let mut config = config();
        config.units.truncate(2);
        config.buildings.truncate(1);
        assert_eq!(
            Action::from_raw(2, 1.0, &config).unwrap(),
            Action::SpawnUnit(1)
        );
        assert_eq!(Action::from_raw(3, 1.0, &config).unwrap(), Action::Build(0));
    }

    #[test]
    fn test_invalid_index_is_error() {
        let err = Action::from_raw(4, 0.5, &config()).unwrap_err();
        assert!(matches!(err, GameError::InvalidAction(4)));
    }

    #[test]
    fn test_index_roundtrip() {
        let config = config();
        for index in 0..ACTION_COUNT {
            assert_eq!(Action::from_raw(index, 0.3, &config).unwrap().index(), index);
        }
    }

    #[test]
    fn test_generic_action_indices() {
        assert_eq!(GenericAction::from_index(0).unwrap(), GenericAction::SpawnRandom);
        assert_eq!(GenericAction::from_index(1).unwrap(), GenericAction::BuildRandom);
        assert!(GenericAction::from_index(2).is_err());
    }
}
