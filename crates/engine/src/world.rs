use std::collections::BTreeSet;

use thiserror::Error;
use tracing::warn;

// Screen convention: +x right, +y down.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPos {
    pub x: i32,
    pub y: i32,
}

impl GridPos {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    // Saturates so probing next to a cell pinned at the i32 edge by
    // `cell_at` cannot overflow.
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TileSize {
    pub width: f32,
    pub height: f32,
}

impl TileSize {
    pub fn square(side: f32) -> Self {
        Self {
            width: side,
            height: side,
        }
    }

    /// Maps a world position to its grid cell by floor division, so positions
    /// just left of x = 0 land in cell -1, not cell 0.
    pub fn cell_at(self, point: Vec2) -> GridPos {
        GridPos {
            x: (point.x / self.width).floor() as i32,
            y: (point.y / self.height).floor() as i32,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TileKind {
    Solid,
    Empty,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TileDef {
    pub tag: String,
    pub src_frame: (u32, u32),
    pub colour: [u8; 3],
    pub id: u16,
    pub kind: TileKind,
}

#[derive(Debug, Clone)]
pub struct Tileset {
    pub tag: String,
    tiles: Vec<TileDef>,
}

impl Tileset {
    pub fn new(tag: impl Into<String>, mut tiles: Vec<TileDef>) -> Self {
        tiles.sort_by_key(|tile| tile.id);
        Self {
            tag: tag.into(),
            tiles,
        }
    }

    pub fn tile(&self, id: u16) -> Option<&TileDef> {
        self.tiles
            .binary_search_by_key(&id, |tile| tile.id)
            .ok()
            .map(|index| &self.tiles[index])
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    pub fn default_set() -> Self {
        fn def(
            tag: &str,
            src_frame: (u32, u32),
            colour: [u8; 3],
            id: u16,
            kind: TileKind,
        ) -> TileDef {
            TileDef {
                tag: tag.to_string(),
                src_frame,
                colour,
                id,
                kind,
            }
        }

        Self::new(
            "builtin",
            vec![
                def("void", (0, 0), [0, 0, 0], 0, TileKind::Empty),
                def("grass", (1, 0), [58, 121, 39], 1, TileKind::Solid),
                def("dirt", (2, 0), [121, 85, 58], 2, TileKind::Solid),
                def("stone", (3, 0), [128, 128, 128], 3, TileKind::Solid),
                def("water", (4, 0), [52, 107, 194], 4, TileKind::Empty),
            ],
        )
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TileGridError {
    #[error("tile count {actual} does not match {width}x{height} = {expected}")]
    CellCountMismatch {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },
}

// Row-major tile ids, row 0 at the top.
#[derive(Debug, Clone, PartialEq)]
pub struct TileGrid {
    width: u32,
    height: u32,
    tiles: Vec<u16>,
}

impl TileGrid {
    pub fn new(width: u32, height: u32, tiles: Vec<u16>) -> Result<Self, TileGridError> {
        let expected = width as usize * height as usize;
        if tiles.len() != expected {
            return Err(TileGridError::CellCountMismatch {
                width,
                height,
                expected,
                actual: tiles.len(),
            });
        }
        Ok(Self {
            width,
            height,
            tiles,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn tile_at(&self, x: u32, y: u32) -> Option<u16> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let index = y as usize * self.width as usize + x as usize;
        Some(self.tiles[index])
    }

    pub fn tiles(&self) -> &[u16] {
        &self.tiles
    }
}

pub trait CollisionGrid {
    fn tile_size(&self) -> TileSize;

    // Out-of-bounds cells report solid; queries are total, never an error.
    fn is_solid(&self, cell: GridPos) -> bool;
}

#[derive(Debug, Clone)]
pub struct Level {
    name: String,
    grid: TileGrid,
    solid: Vec<bool>,
    tile_size: TileSize,
}

impl Level {
    pub fn from_grid(
        name: impl Into<String>,
        grid: TileGrid,
        tileset: &Tileset,
        tile_size: TileSize,
    ) -> Self {
        let name = name.into();
        let mut unknown_ids = BTreeSet::new();
        let solid = grid
            .tiles()
            .iter()
            .map(|&id| match tileset.tile(id) {
                Some(def) => def.kind == TileKind::Solid,
                None => {
                    unknown_ids.insert(id);
                    false
                }
            })
            .collect();
        if !unknown_ids.is_empty() {
            warn!(
                level = %name,
                unknown_ids = ?unknown_ids,
                "level_contains_unknown_tile_ids"
            );
        }
        Self {
            name,
            grid,
            solid,
            tile_size,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn grid(&self) -> &TileGrid {
        &self.grid
    }

    pub fn tile_size(&self) -> TileSize {
        self.tile_size
    }

    pub fn pixel_size(&self) -> Vec2 {
        Vec2 {
            x: self.grid.width() as f32 * self.tile_size.width,
            y: self.grid.height() as f32 * self.tile_size.height,
        }
    }

    pub fn cell_at(&self, point: Vec2) -> GridPos {
        self.tile_size.cell_at(point)
    }

    pub fn is_solid(&self, cell: GridPos) -> bool {
        if cell.x < 0 || cell.y < 0 {
            return true;
        }
        let (x, y) = (cell.x as u32, cell.y as u32);
        if x >= self.grid.width() || y >= self.grid.height() {
            return true;
        }
        self.solid[y as usize * self.grid.width() as usize + x as usize]
    }
}

impl CollisionGrid for Level {
    fn tile_size(&self) -> TileSize {
        Level::tile_size(self)
    }

    fn is_solid(&self, cell: GridPos) -> bool {
        Level::is_solid(self, cell)
    }
}

// `position` is the world position of the view's top-left corner.
#[derive(Debug, Clone)]
pub struct Camera {
    pub tag: String,
    pub position: Vec2,
}

impl Camera {
    pub fn new(tag: impl Into<String>, position: Vec2) -> Self {
        Self {
            tag: tag.into(),
            position,
        }
    }

    pub fn follow_clamped(&mut self, focus: Vec2, view_size: Vec2, level_size: Vec2) {
        let max_x = (level_size.x - view_size.x).max(0.0);
        let max_y = (level_size.y - view_size.y).max(0.0);
        self.position.x = (focus.x - view_size.x * 0.5).clamp(0.0, max_x);
        self.position.y = (focus.y - view_size.y * 0.5).clamp(0.0, max_y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn grid_from_rows(rows: &[&[u16]]) -> TileGrid {
        let height = rows.len() as u32;
        let width = rows[0].len() as u32;
        let tiles = rows.iter().flat_map(|row| row.iter().copied()).collect();
        TileGrid::new(width, height, tiles).expect("grid")
    }

    fn level_from_rows(rows: &[&[u16]]) -> Level {
        Level::from_grid(
            "test",
            grid_from_rows(rows),
            &Tileset::default_set(),
            TileSize::square(16.0),
        )
    }

    #[test]
    fn tile_grid_rejects_wrong_cell_count() {
        let error = TileGrid::new(3, 2, vec![0; 5]).expect_err("must fail");
        assert_eq!(
            error,
            TileGridError::CellCountMismatch {
                width: 3,
                height: 2,
                expected: 6,
                actual: 5,
            }
        );
    }

    #[test]
    fn tile_at_is_row_major_and_bounds_checked() {
        let grid = grid_from_rows(&[&[1, 2, 3], &[4, 5, 6]]);
        assert_eq!(grid.tile_at(0, 0), Some(1));
        assert_eq!(grid.tile_at(2, 1), Some(6));
        assert_eq!(grid.tile_at(3, 0), None);
        assert_eq!(grid.tile_at(0, 2), None);
    }

    #[test]
    fn cell_at_floor_divides_including_negatives() {
        let tile = TileSize::square(16.0);
        assert_eq!(tile.cell_at(Vec2::new(0.0, 0.0)), GridPos::new(0, 0));
        assert_eq!(tile.cell_at(Vec2::new(15.9, 15.9)), GridPos::new(0, 0));
        assert_eq!(tile.cell_at(Vec2::new(16.0, 31.9)), GridPos::new(1, 1));
        assert_eq!(tile.cell_at(Vec2::new(-0.1, -16.1)), GridPos::new(-1, -2));
    }

    #[test]
    fn offsets_from_far_away_cells_saturate_instead_of_overflowing() {
        let far = TileSize::square(16.0).cell_at(Vec2::new(3.5e10, -3.5e10));
        assert_eq!(far, GridPos::new(i32::MAX, i32::MIN));
        assert_eq!(far.offset(1, -1), GridPos::new(i32::MAX, i32::MIN));
        assert_eq!(far.offset(-1, 1), GridPos::new(i32::MAX - 1, i32::MIN + 1));
    }

    #[test]
    fn tileset_lookup_finds_tiles_by_id() {
        let set = Tileset::default_set();
        assert_eq!(set.tile(1).expect("grass").tag, "grass");
        assert_eq!(set.tile(4).expect("water").kind, TileKind::Empty);
        assert!(set.tile(999).is_none());
    }

    #[test]
    fn level_solidity_comes_from_tileset_kinds() {
        let level = level_from_rows(&[&[1, 4], &[0, 3]]);
        assert!(level.is_solid(GridPos::new(0, 0)));
        assert!(!level.is_solid(GridPos::new(1, 0)));
        assert!(!level.is_solid(GridPos::new(0, 1)));
        assert!(level.is_solid(GridPos::new(1, 1)));
    }

    #[test]
    fn unknown_tile_ids_block_movement() {
        let level = level_from_rows(&[&[1, 777]]);
        assert!(level.is_solid(GridPos::new(0, 0)));
        assert!(!level.is_solid(GridPos::new(1, 0)));
    }

    #[test]
    fn out_of_bounds_cells_are_solid_on_every_edge() {
        let level = level_from_rows(&[&[4, 4], &[4, 4]]);
        assert!(level.is_solid(GridPos::new(-1, 0)));
        assert!(level.is_solid(GridPos::new(0, -1)));
        assert!(level.is_solid(GridPos::new(2, 0)));
        assert!(level.is_solid(GridPos::new(0, 2)));
        assert!(level.is_solid(GridPos::new(-5, -5)));
        assert!(!level.is_solid(GridPos::new(1, 1)));
    }

    #[test]
    fn level_pixel_size_scales_by_tile_size() {
        let level = level_from_rows(&[&[1, 1, 1], &[1, 1, 1]]);
        let size = level.pixel_size();
        assert!((size.x - 48.0).abs() < 0.0001);
        assert!((size.y - 32.0).abs() < 0.0001);
    }

    #[test]
    fn camera_centers_on_focus_when_there_is_room() {
        let mut camera = Camera::new("main", Vec2::ZERO);
        camera.follow_clamped(
            Vec2::new(100.0, 80.0),
            Vec2::new(64.0, 48.0),
            Vec2::new(320.0, 320.0),
        );
        assert!((camera.position.x - 68.0).abs() < 0.0001);
        assert!((camera.position.y - 56.0).abs() < 0.0001);
    }

    #[test]
    fn camera_clamps_to_level_edges() {
        let mut camera = Camera::new("main", Vec2::ZERO);
        camera.follow_clamped(
            Vec2::new(310.0, 5.0),
            Vec2::new(64.0, 48.0),
            Vec2::new(320.0, 320.0),
        );
        assert!((camera.position.x - 256.0).abs() < 0.0001);
        assert!((camera.position.y - 0.0).abs() < 0.0001);
    }

    #[test]
    fn camera_pins_to_origin_when_level_smaller_than_view() {
        let mut camera = Camera::new("main", Vec2::new(9.0, 9.0));
        camera.follow_clamped(
            Vec2::new(20.0, 20.0),
            Vec2::new(64.0, 48.0),
            Vec2::new(32.0, 32.0),
        );
        assert!((camera.position.x - 0.0).abs() < 0.0001);
        assert!((camera.position.y - 0.0).abs() < 0.0001);
    }
}
