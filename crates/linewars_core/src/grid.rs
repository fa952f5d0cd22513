//! Layered occupancy grid for the lane.
//!
//! The grid is ground truth for who stands where. It has five same-shaped
//! layers; see [`Layer`]. Unit and building occupancy are each stored as an
//! (id, owner) pair of layers, and every write goes through a helper that
//! sets or clears both halves together.
//!
//! The grid performs no locking. The [`Match`](crate::simulation::Match)
//! owns it and lends it to one player at a time.
//!
//! Out-of-bounds access panics: callers validate coordinates that come from
//! outside the simulation before touching the grid.

use serde::{Deserialize, Serialize};

use crate::components::{EntityId, PlayerId};

/// Grid layer indices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Layer {
    /// Static terrain codes, see [`Terrain`].
    Terrain = 0,
    /// Unit instance id (0 = empty).
    UnitId = 1,
    /// Unit owner player id (0 = empty).
    UnitOwner = 2,
    /// Building owner player id (0 = empty).
    BuildingOwner = 3,
    /// Building instance id (0 = empty).
    BuildingId = 4,
}

impl Layer {
    /// All layers in index order.
    pub const ALL: [Layer; LAYER_COUNT] = [
        Layer::Terrain,
        Layer::UnitId,
        Layer::UnitOwner,
        Layer::BuildingOwner,
        Layer::BuildingId,
    ];

    /// Index of this layer.
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// Number of grid layers.
pub const LAYER_COUNT: usize = 5;

/// Terrain codes stored in [`Layer::Terrain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    /// Ordinary lane cell.
    Lane = 0,
    /// Base column of player one (column 0).
    BaseOne = 1,
    /// Base column of player two (last column).
    BaseTwo = 2,
    /// Contested center band; nobody may build here by default.
    Center = 3,
}

impl Terrain {
    /// Decode a terrain layer value.
    #[must_use]
    pub const fn from_code(code: u32) -> Option<Self> {
        match code {
            0 => Some(Self::Lane),
            1 => Some(Self::BaseOne),
            2 => Some(Self::BaseTwo),
            3 => Some(Self::Center),
            _ => None,
        }
    }
}

/// Inclusive column range of the contested center band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CenterBand {
    /// First center column.
    pub start: u32,
    /// Last center column.
    pub end: u32,
}

impl CenterBand {
    /// Compute the band for a lane of `width` columns and `band_width`
    /// center columns, centered on the lane.
    #[must_use]
    pub fn for_width(width: u32, band_width: u32) -> Self {
        let band_width = band_width.max(1).min(width);
        let start = (width - band_width) / 2;
        Self {
            start,
            end: start + band_width - 1,
        }
    }

    /// Whether `x` lies inside the band.
    #[must_use]
    pub const fn contains(&self, x: u32) -> bool {
        x >= self.start && x <= self.end
    }
}

/// Fixed-size layered 2-D occupancy grid.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GridMap {
    width: u32,
    height: u32,
    center: CenterBand,
    layers: Vec<Vec<u32>>,
}

impl GridMap {
    /// Create an empty grid with its terrain layer filled in.
    ///
    /// # Panics
    ///
    /// Panics if the lane is narrower than three columns or has no rows.
    /// Configuration validation rejects such maps before this is reached.
    #[must_use]
    pub fn new(width: u32, height: u32, center_band_width: u32) -> Self {
        assert!(width >= 3 && height >= 1, "grid must be at least 3x1");
        let cells = width as usize * height as usize;
        let center = CenterBand::for_width(width, center_band_width);
        let mut grid = Self {
            width,
            height,
            center,
            layers: vec![vec![0; cells]; LAYER_COUNT],
        };

        for x in 0..width {
            let terrain = if x == 0 {
                Terrain::BaseOne
            } else if x == width - 1 {
                Terrain::BaseTwo
            } else if center.contains(x) {
                Terrain::Center
            } else {
                Terrain::Lane
            };
            for y in 0..height {
                grid.set(Layer::Terrain, x, y, terrain as u32);
            }
        }

        grid
    }

    /// Lane length in columns.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.width
    }

    /// Lane breadth in rows.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.height
    }

    /// The contested center band.
    #[must_use]
    pub const fn center(&self) -> CenterBand {
        self.center
    }

    /// Whether `(x, y)` lies on the grid.
    #[must_use]
    pub const fn in_bounds(&self, x: u32, y: u32) -> bool {
        x < self.width && y < self.height
    }

    fn cell_index(&self, x: u32, y: u32) -> usize {
        assert!(
            self.in_bounds(x, y),
            "grid access out of bounds: ({x}, {y}) on {}x{}",
            self.width,
            self.height
        );
        y as usize * self.width as usize + x as usize
    }

    /// Read a cell of a layer.
    #[must_use]
    pub fn get(&self, layer: Layer, x: u32, y: u32) -> u32 {
        self.layers[layer.index()][self.cell_index(x, y)]
    }

    /// Whether a cell of a layer is non-zero.
    #[must_use]
    pub fn occupied(&self, layer: Layer, x: u32, y: u32) -> bool {
        self.get(layer, x, y) != 0
    }

    /// Write a cell of a layer.
    pub fn set(&mut self, layer: Layer, x: u32, y: u32, value: u32) {
        let idx = self.cell_index(x, y);
        self.layers[layer.index()][idx] = value;
    }

    /// Zero a cell of a layer.
    pub fn clear(&mut self, layer: Layer, x: u32, y: u32) {
        self.set(layer, x, y, 0);
    }

    /// Terrain at a cell.
    #[must_use]
    pub fn terrain(&self, x: u32, y: u32) -> Option<Terrain> {
        Terrain::from_code(self.get(Layer::Terrain, x, y))
    }

    /// Whether a unit stands on the cell.
    #[must_use]
    pub fn has_unit(&self, x: u32, y: u32) -> bool {
        self.occupied(Layer::UnitId, x, y)
    }

    /// Whether a building stands on the cell.
    #[must_use]
    pub fn has_building(&self, x: u32, y: u32) -> bool {
        self.occupied(Layer::BuildingId, x, y)
    }

    /// Write both unit layers of a cell.
    pub fn place_unit(&mut self, x: u32, y: u32, id: EntityId, owner: PlayerId) {
        debug_assert!(id != 0, "entity ids start at 1");
        self.set(Layer::UnitId, x, y, id);
        self.set(Layer::UnitOwner, x, y, owner.code());
    }

    /// Clear both unit layers of a cell.
    pub fn clear_unit(&mut self, x: u32, y: u32) {
        self.clear(Layer::UnitId, x, y);
        self.clear(Layer::UnitOwner, x, y);
    }

    /// Write both building layers of a cell.
    pub fn place_building(&mut self, x: u32, y: u32, id: EntityId, owner: PlayerId) {
        debug_assert!(id != 0, "entity ids start at 1");
        self.set(Layer::BuildingId, x, y, id);
        self.set(Layer::BuildingOwner, x, y, owner.code());
    }

    /// Clear both building layers of a cell.
    pub fn clear_building(&mut self, x: u32, y: u32) {
        self.clear(Layer::BuildingId, x, y);
        self.clear(Layer::BuildingOwner, x, y);
    }

    /// Rows of column `x` with no unit on them, ascending.
    #[must_use]
    pub fn open_unit_rows(&self, x: u32) -> Vec<u32> {
        (0..self.height).filter(|&y| !self.has_unit(x, y)).collect()
    }

    /// Raw cells of a layer, row-major (`y * width + x`).
    #[must_use]
    pub fn layer(&self, layer: Layer) -> &[u32] {
        &self.layers[layer.index()]
    }

    /// Check the pairwise layer invariant on every cell.
    ///
    /// A cell has a unit id iff it has a unit owner, and likewise for
    /// buildings. Returns the first offending cell, if any.
    #[must_use]
    pub fn find_inconsistency(&self) -> Option<(u32, u32)> {
        for y in 0..self.height {
            for x in 0..self.width {
                let unit_pair_ok =
                    self.occupied(Layer::UnitId, x, y) == self.occupied(Layer::UnitOwner, x, y);
                let building_pair_ok = self.occupied(Layer::BuildingId, x, y)
                    == self.occupied(Layer::BuildingOwner, x, y);
                if !unit_pair_ok || !building_pair_ok {
                    return Some((x, y));
                }
            }
        }
        None
    }

    /// Whether every cell satisfies the pairwise layer invariant.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.find_inconsistency().is_none()
    }

    /// Remove all units and buildings, keeping terrain.
    pub fn clear_occupants(&mut self) {
        for layer in &Layer::ALL[1..] {
            self.layers[layer.index()].iter_mut().for_each(|cell| *cell = 0);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_grid_terrain() {
        let grid = GridMap::new(10, 3, 2);
        assert_eq!(grid.terrain(0, 1), Some(Terrain::BaseOne));
        assert_eq!(grid.terrain(9, 2), Some(Terrain::BaseTwo));
        assert_eq!(grid.center(), CenterBand { start: 4, end: 5 });
        assert_eq!(grid.terrain(4, 0), Some(Terrain::Center));
        assert_eq!(grid.terrain(5, 0), Some(Terrain::Center));
        assert_eq!(grid.terrain(3, 0), Some(Terrain::Lane));
        assert!(!grid.has_unit(3, 0));
    }

    #[test]
    fn test_grid_hash_tracks_contents() {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let hash = |grid: &GridMap| {
            let mut hasher = DefaultHasher::new();
            grid.hash(&mut hasher);
            hasher.finish()
        };

        let mut grid = GridMap::new(10, 3, 2);
        assert_eq!(hash(&grid), hash(&GridMap::new(10, 3, 2)));
        assert_ne!(hash(&grid), hash(&GridMap::new(10, 3, 4)));

        grid.place_unit(2, 1, 7, PlayerId::Two);
        assert_ne!(hash(&grid), hash(&GridMap::new(10, 3, 2)));
    }

    #[test]
    fn test_center_band_odd_width() {
        let band = CenterBand::for_width(31, 3);
        assert_eq!(band, CenterBand { start: 14, end: 16 });
        assert!(band.contains(15));
        assert!(!band.contains(13));
    }

    #[test]
    fn test_place_and_clear_unit_keeps_pairs() {
        let mut grid = GridMap::new(10, 3, 2);
        grid.place_unit(2, 1, 7, PlayerId::Two);
        assert_eq!(grid.get(Layer::UnitId, 2, 1), 7);
        assert_eq!(grid.get(Layer::UnitOwner, 2, 1), 2);
        assert!(grid.is_consistent());

        grid.clear_unit(2, 1);
        assert!(!grid.has_unit(2, 1));
        assert!(grid.is_consistent());
    }

    #[test]
    fn test_unit_and_building_share_cell() {
        let mut grid = GridMap::new(10, 3, 2);
        grid.place_building(2, 1, 3, PlayerId::One);
        grid.place_unit(2, 1, 4, PlayerId::Two);
        assert!(grid.has_building(2, 1));
        assert!(grid.has_unit(2, 1));
        assert!(grid.is_consistent());
    }

    #[test]
    fn test_detects_inconsistency() {
        let mut grid = GridMap::new(10, 3, 2);
        grid.set(Layer::UnitId, 1, 1, 5);
        assert_eq!(grid.find_inconsistency(), Some((1, 1)));
    }

    #[test]
    fn test_open_unit_rows() {
        let mut grid = GridMap::new(10, 3, 2);
        grid.place_unit(0, 1, 1, PlayerId::One);
        assert_eq!(grid.open_unit_rows(0), vec![0, 2]);
    }

    #[test]
    #[should_panic(expected = "out of bounds")]
    fn test_out_of_bounds_panics() {
        let grid = GridMap::new(10, 3, 2);
        let _ = grid.get(Layer::UnitId, 10, 0);
    }

    #[test]
    fn test_clear_occupants_keeps_terrain() {
        let mut grid = GridMap::new(10, 3, 2);
        grid.place_unit(3, 0, 1, PlayerId::One);
        grid.place_building(4, 1, 2, PlayerId::Two);
        grid.clear_occupants();
        assert!(!grid.has_unit(3, 0));
        assert!(!grid.has_building(4, 1));
        assert_eq!(grid.terrain(0, 0), Some(Terrain::BaseOne));
    }
}
