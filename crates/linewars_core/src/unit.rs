//! Live units: mobile entities walking the lane toward the enemy base.

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, PlayerId};
use crate::data::EntityTemplate;
use crate::grid::{GridMap, Layer};
use crate::math::{ticks_per_event, GridPos};

/// Result of one [`Unit::advance`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveOutcome {
    /// Movement countdown still running.
    Waiting,
    /// Stepped to a new cell.
    Moved(GridPos),
    /// All forward cells hold units; retry next tick.
    Blocked,
    /// The next step lands on the enemy base column.
    ReachedBase,
    /// Unit is flagged for removal and does not move.
    Despawned,
}

/// A live unit cloned from a template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Unit {
    /// Instance id, also written into the grid.
    pub id: EntityId,
    /// Owning player.
    pub owner: PlayerId,
    /// Index of the template in the unit table.
    pub template_index: usize,
    /// Stable template identifier.
    pub template_id: String,
    /// Current cell.
    pub position: GridPos,
    /// Current health.
    pub health: i32,
    /// Health at spawn.
    pub max_health: i32,
    /// Flat armor.
    pub armor: i32,
    /// Ticks between steps.
    pub move_interval: u32,
    /// Ticks until the next step attempt.
    pub move_counter: u32,
    /// Flagged for removal at the end of movement resolution.
    pub despawn: bool,
    /// Reached the enemy base column.
    pub reached_base: bool,
}

impl Unit {
    /// Create a live unit from a template.
    ///
    /// The unit waits one full movement interval before its first step.
    #[must_use]
    pub fn from_template(
        template: &EntityTemplate,
        template_index: usize,
        id: EntityId,
        owner: PlayerId,
        position: GridPos,
        ticks_per_second: u32,
    ) -> Self {
        let move_interval = ticks_per_event(ticks_per_second, template.speed);
        Self {
            id,
            owner,
            template_index,
            template_id: template.id.clone(),
            position,
            health: template.health,
            max_health: template.health,
            armor: template.armor,
            move_interval,
            move_counter: move_interval,
            despawn: false,
            reached_base: false,
        }
    }

    /// Whether the unit is still in play.
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        !self.despawn
    }

    /// Apply damage. Returns `true` if this hit killed the unit.
    pub fn damage(&mut self, amount: u32) -> bool {
        let amount = i32::try_from(amount).unwrap_or(i32::MAX);
        let was_alive = self.health > 0;
        self.health = self.health.saturating_sub(amount);
        if self.health <= 0 {
            self.despawn = true;
        }
        was_alive && self.health <= 0
    }

    /// Advance one tick toward `goal_x`.
    ///
    /// Steps straight ahead when the cell is free, otherwise tries the two
    /// diagonal-forward cells (lower row first). Stepping onto the goal
    /// column does not occupy it: the unit is flagged `reached_base` and
    /// `despawn` instead.
    pub fn advance(&mut self, grid: &mut GridMap, goal_x: u32) -> MoveOutcome {
        if self.despawn {
            return MoveOutcome::Despawned;
        }

        self.move_counter = self.move_counter.saturating_sub(1);
        if self.move_counter > 0 {
            return MoveOutcome::Waiting;
        }

        let next_x = i64::from(self.position.x) + i64::from(self.owner.direction());
        let Ok(next_x) = u32::try_from(next_x) else {
            self.reach_base();
            return MoveOutcome::ReachedBase;
        };
        if next_x == goal_x || next_x >= grid.width() {
            self.reach_base();
            return MoveOutcome::ReachedBase;
        }

        let y = self.position.y;
        let mut candidates = vec![y];
        if y > 0 {
            candidates.push(y - 1);
        }
        if y + 1 < grid.height() {
            candidates.push(y + 1);
        }

        let Some(next_y) = candidates.into_iter().find(|&cy| !grid.has_unit(next_x, cy)) else {
            return MoveOutcome::Blocked;
        };

        self.remove(grid);
        let next = GridPos::new(next_x, next_y);
        grid.place_unit(next.x, next.y, self.id, self.owner);
        self.position = next;
        self.move_counter = self.move_interval;
        MoveOutcome::Moved(next)
    }

    fn reach_base(&mut self) {
        self.reached_base = true;
        self.despawn = true;
    }

    /// Clear this unit from the grid.
    ///
    /// Only touches the cell if it still holds this unit's id.
    pub fn remove(&self, grid: &mut GridMap) {
        let GridPos { x, y } = self.position;
        if grid.get(Layer::UnitId, x, y) == self.id {
            grid.clear_unit(x, y);
        }
    }
}
