//! Floor registry and tile occupancy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::components::Tile;
use crate::config::GridConfig;
use crate::error::GridError;

/// The lobby is always floor 0
pub const LOBBY_FLOOR: i32 = 0;

/// One floor row of the building
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Floor {
    pub number: i32,
    pub is_lobby: bool,
    tiles: Vec<Tile>,
}

impl Floor {
    fn new(number: i32, is_lobby: bool, width: i32) -> Self {
        Self {
            number,
            is_lobby,
            tiles: vec![Tile::Empty; width.max(0) as usize],
        }
    }

    pub fn tiles(&self) -> &[Tile] {
        &self.tiles
    }

    pub fn tile(&self, x: i32) -> Option<Tile> {
        usize::try_from(x).ok().and_then(|i| self.tiles.get(i).copied())
    }

    pub fn occupied_count(&self) -> usize {
        self.tiles.iter().filter(|t| !t.is_empty()).count()
    }
}

/// All floors, keyed by floor number
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FloorGrid {
    floors: BTreeMap<i32, Floor>,
    width: i32,
    max_floor: i32,
    min_floor: i32,
    tile_px: f32,
    floor_height_px: f32,
}

impl FloorGrid {
    pub fn new(config: &GridConfig) -> Self {
        Self {
            floors: BTreeMap::new(),
            width: config.width,
            max_floor: config.max_floor,
            min_floor: -config.basement_floors,
            tile_px: config.tile_px,
            floor_height_px: config.floor_height_px,
        }
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn has_floor(&self, number: i32) -> bool {
        self.floors.contains_key(&number)
    }

    pub fn floor(&self, number: i32) -> Option<&Floor> {
        self.floors.get(&number)
    }

    /// Floors in ascending order
    pub fn floors(&self) -> impl Iterator<Item = &Floor> {
        self.floors.values()
    }

    pub fn floor_count(&self) -> usize {
        self.floors.len()
    }

    pub fn lowest_floor(&self) -> Option<i32> {
        self.floors.keys().next().copied()
    }

    pub fn highest_floor(&self) -> Option<i32> {
        self.floors.keys().next_back().copied()
    }

    /// Check whether `add_floor(number, is_lobby)` would succeed
    pub fn can_add_floor(&self, number: i32, is_lobby: bool) -> Result<(), GridError> {
        if self.floors.contains_key(&number) {
            return Err(GridError::FloorExists(number));
        }
        if number < self.min_floor || number > self.max_floor {
            return Err(GridError::OutOfRange(number));
        }
        let lobby = is_lobby && number == LOBBY_FLOOR;
        if !lobby && !self.has_floor(number - 1) && !self.has_floor(number + 1) {
            return Err(GridError::NotAdjacent(number));
        }
        Ok(())
    }

    /// Add an empty floor. Non-lobby floors must touch an existing floor.
    pub fn add_floor(&mut self, number: i32, is_lobby: bool) -> Result<(), GridError> {
        if let Err(err) = self.can_add_floor(number, is_lobby) {
            log::debug!("add_floor({}) rejected: {}", number, err);
            return Err(err);
        }
        let is_lobby = is_lobby && number == LOBBY_FLOOR;
        self.floors
            .insert(number, Floor::new(number, is_lobby, self.width));
        Ok(())
    }

    pub fn tile(&self, floor: i32, x: i32) -> Option<Tile> {
        self.floors.get(&floor).and_then(|f| f.tile(x))
    }

    /// Validate that `[x_start, x_start + width)` on `floor` exists and is empty
    pub fn can_occupy(&self, floor: i32, x_start: i32, width: i32) -> Result<(), GridError> {
        let row = self.floors.get(&floor).ok_or(GridError::NoSuchFloor(floor))?;
        let end = x_start.saturating_add(width);
        if width < 1 || x_start < 0 || end > self.width {
            return Err(GridError::OutOfBounds {
                floor,
                start: x_start,
                end,
            });
        }
        for x in x_start..end {
            if !row.tiles[x as usize].is_empty() {
                return Err(GridError::SpaceOccupied { floor, x });
            }
        }
        Ok(())
    }

    /// Mark a tile span. Fails without mutation unless every tile is empty.
    pub fn occupy_tiles(
        &mut self,
        floor: i32,
        x_start: i32,
        width: i32,
        tile: Tile,
    ) -> Result<(), GridError> {
        self.can_occupy(floor, x_start, width)?;
        if let Some(row) = self.floors.get_mut(&floor) {
            for x in x_start..x_start + width {
                row.tiles[x as usize] = tile;
            }
        }
        Ok(())
    }

    /// Reset a tile span to empty. Out-of-range tiles are ignored.
    pub fn clear_tiles(&mut self, floor: i32, x_start: i32, width: i32) {
        if let Some(row) = self.floors.get_mut(&floor) {
            for x in x_start.max(0)..x_start.saturating_add(width).min(self.width) {
                row.tiles[x as usize] = Tile::Empty;
            }
        }
    }

    /// Left edge of a grid column in pixels
    pub fn tile_left_px(&self, x: i32) -> f32 {
        x as f32 * self.tile_px
    }

    /// Horizontal center of a tile span in pixels
    pub fn span_center_px(&self, x_start: i32, width: i32) -> f32 {
        (x_start as f32 + width as f32 / 2.0) * self.tile_px
    }

    /// Vertical pixel position of a floor
    pub fn floor_y(&self, floor: i32) -> f32 {
        floor as f32 * self.floor_height_px
    }

    pub fn tile_px(&self) -> f32 {
        self.tile_px
    }

    pub fn floor_height_px(&self) -> f32 {
        self.floor_height_px
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::TenantKind;

    fn grid() -> FloorGrid {
        let mut grid = FloorGrid::new(&GridConfig {
            width: 10,
            max_floor: 3,
            basement_floors: 1,
            ..Default::default()
        });
        grid.add_floor(LOBBY_FLOOR, true).unwrap();
        grid
    }

    #[test]
    fn test_lobby_exempt_from_adjacency() {
        let g = grid();
        assert!(g.floor(0).unwrap().is_lobby);
        assert_eq!(g.floor(0).unwrap().tiles().len(), 10);
    }

    #[test]
    fn test_add_floor_requires_neighbour() {
        let mut g = grid();
        assert_eq!(g.add_floor(2, false), Err(GridError::NotAdjacent(2)));
        assert!(g.add_floor(1, false).is_ok());
        assert!(g.add_floor(2, false).is_ok());
        assert!(g.add_floor(-1, false).is_ok());
    }

    #[test]
    fn test_add_existing_floor_is_noop() {
        let mut g = grid();
        g.add_floor(1, false).unwrap();
        g.occupy_tiles(1, 0, 2, Tile::Tenant(TenantKind::Office)).unwrap();
        assert_eq!(g.add_floor(1, false), Err(GridError::FloorExists(1)));
        assert_eq!(g.add_floor(0, true), Err(GridError::FloorExists(0)));
        assert_eq!(g.floor(1).unwrap().occupied_count(), 2);
    }

    #[test]
    fn test_floor_range_bounds() {
        let mut g = grid();
        g.add_floor(-1, false).unwrap();
        assert_eq!(g.add_floor(-2, false), Err(GridError::OutOfRange(-2)));
        for f in 1..=3 {
            g.add_floor(f, false).unwrap();
        }
        assert_eq!(g.add_floor(4, false), Err(GridError::OutOfRange(4)));
    }

    #[test]
    fn test_occupy_rejects_without_mutation() {
        let mut g = grid();
        let office = Tile::Tenant(TenantKind::Office);
        g.occupy_tiles(0, 2, 3, office).unwrap();

        assert_eq!(
            g.occupy_tiles(0, 4, 3, office),
            Err(GridError::SpaceOccupied { floor: 0, x: 4 })
        );
        assert_eq!(g.tile(0, 5), Some(Tile::Empty));

        assert!(matches!(
            g.occupy_tiles(0, 8, 3, office),
            Err(GridError::OutOfBounds { .. })
        ));
        assert_eq!(g.tile(0, 8), Some(Tile::Empty));

        assert_eq!(
            g.occupy_tiles(5, 0, 1, office),
            Err(GridError::NoSuchFloor(5))
        );
    }

    #[test]
    fn test_extreme_spans_are_out_of_bounds() {
        let mut g = grid();
        let office = Tile::Tenant(TenantKind::Office);
        assert_eq!(
            g.can_occupy(0, i32::MAX, 4),
            Err(GridError::OutOfBounds {
                floor: 0,
                start: i32::MAX,
                end: i32::MAX,
            })
        );
        assert!(matches!(
            g.occupy_tiles(0, i32::MIN, 4, office),
            Err(GridError::OutOfBounds { .. })
        ));
        g.clear_tiles(0, i32::MAX, 4);
        g.clear_tiles(0, i32::MIN, 4);
        assert_eq!(g.floor(0).unwrap().occupied_count(), 0);
    }

    #[test]
    fn test_clear_tiles() {
        let mut g = grid();
        g.occupy_tiles(0, 0, 4, Tile::Tenant(TenantKind::Apartment))
            .unwrap();
        g.clear_tiles(0, 0, 4);
        assert_eq!(g.floor(0).unwrap().occupied_count(), 0);
    }

    #[test]
    fn test_pixel_helpers() {
        let g = grid();
        assert_eq!(g.tile_left_px(2), 32.0);
        assert_eq!(g.span_center_px(2, 2), 48.0);
        assert_eq!(g.floor_y(2), 96.0);
    }
}
