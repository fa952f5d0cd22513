//! Shared identifiers and small value types.

use serde::{Deserialize, Serialize};

/// Unique identifier for live units and buildings.
///
/// Ids are written into the grid, so `0` is reserved for "empty".
pub type EntityId = u32;

/// One of the two sides of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum PlayerId {
    /// Left side, spawns at column 0 and walks toward +x.
    One,
    /// Right side, spawns at the last column and walks toward -x.
    Two,
}

impl PlayerId {
    /// Both players in update order.
    pub const BOTH: [PlayerId; 2] = [PlayerId::One, PlayerId::Two];

    /// Value written into owner layers of the grid.
    #[must_use]
    pub const fn code(self) -> u32 {
        match self {
            Self::One => 1,
            Self::Two => 2,
        }
    }

    /// Index into per-player arrays.
    #[must_use]
    pub const fn index(self) -> usize {
        match self {
            Self::One => 0,
            Self::Two => 1,
        }
    }

    /// Look up a player from an array index (0 or 1).
    #[must_use]
    pub const fn from_index(index: usize) -> Option<Self> {
        match index {
            0 => Some(Self::One),
            1 => Some(Self::Two),
            _ => None,
        }
    }

    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::One => Self::Two,
            Self::Two => Self::One,
        }
    }

    /// Lane direction units of this player walk in (+1 or -1).
    #[must_use]
    pub const fn direction(self) -> i32 {
        match self {
            Self::One => 1,
            Self::Two => -1,
        }
    }

    /// Player color (RGB).
    #[must_use]
    pub const fn color(self) -> [u8; 3] {
        match self {
            Self::One => [255, 0, 0],
            Self::Two => [0, 0, 255],
        }
    }

    /// Cursor highlight color (RGB).
    #[must_use]
    pub const fn cursor_color(self) -> [u8; 3] {
        match self {
            Self::One => [95, 252, 242],
            Self::Two => [212, 247, 86],
        }
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::One => write!(f, "player_one"),
            Self::Two => write!(f, "player_two"),
        }
    }
}

/// Hands out entity ids for one match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct IdAllocator {
    next_id: EntityId,
}

impl IdAllocator {
    /// Create an allocator whose first id is 1.
    #[must_use]
    pub const fn new() -> Self {
        Self { next_id: 1 }
    }

    /// Take the next id.
    pub fn allocate(&mut self) -> EntityId {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }
}

impl Default for IdAllocator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_player_id_roundtrip() {
        for player in PlayerId::BOTH {
            assert_eq!(PlayerId::from_index(player.index()), Some(player));
            assert_eq!(player.opponent().opponent(), player);
        }
        assert_eq!(PlayerId::from_index(2), None);
    }

    #[test]
    fn test_player_codes_are_nonzero() {
        assert_eq!(PlayerId::One.code(), 1);
        assert_eq!(PlayerId::Two.code(), 2);
    }

    #[test]
    fn test_id_allocator_starts_at_one() {
        let mut ids = IdAllocator::new();
        assert_eq!(ids.allocate(), 1);
        assert_eq!(ids.allocate(), 2);
    }
}
