use std::cmp::Ordering;

use crate::world::{CollisionGrid, GridPos, TileSize, Vec2};

use super::collision::{resolve, MoveOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Down,
    Up,
    Left,
    Right,
    UpLeft,
    UpRight,
    DownLeft,
    DownRight,
}

impl Direction {
    pub const ALL: [Direction; 8] = [
        Direction::Down,
        Direction::Up,
        Direction::Left,
        Direction::Right,
        Direction::UpLeft,
        Direction::UpRight,
        Direction::DownLeft,
        Direction::DownRight,
    ];

    pub fn axis_signs(self) -> (i32, i32) {
        match self {
            Direction::Down => (0, 1),
            Direction::Up => (0, -1),
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::UpLeft => (-1, -1),
            Direction::UpRight => (1, -1),
            Direction::DownLeft => (-1, 1),
            Direction::DownRight => (1, 1),
        }
    }

    pub fn is_diagonal(self) -> bool {
        let (sx, sy) = self.axis_signs();
        sx != 0 && sy != 0
    }

    // Each moving axis carries the full speed; diagonals are unnormalized.
    pub fn velocity(self, speed: f32) -> Vec2 {
        let (sx, sy) = self.axis_signs();
        Vec2::new(sx as f32 * speed, sy as f32 * speed)
    }

    pub fn from_axis_signs(sx: i32, sy: i32) -> Option<Self> {
        match (sx.cmp(&0), sy.cmp(&0)) {
            (Ordering::Equal, Ordering::Equal) => None,
            (Ordering::Equal, Ordering::Greater) => Some(Direction::Down),
            (Ordering::Equal, Ordering::Less) => Some(Direction::Up),
            (Ordering::Less, Ordering::Equal) => Some(Direction::Left),
            (Ordering::Greater, Ordering::Equal) => Some(Direction::Right),
            (Ordering::Less, Ordering::Less) => Some(Direction::UpLeft),
            (Ordering::Greater, Ordering::Less) => Some(Direction::UpRight),
            (Ordering::Less, Ordering::Greater) => Some(Direction::DownLeft),
            (Ordering::Greater, Ordering::Greater) => Some(Direction::DownRight),
        }
    }
}

// Set while classifying a blocked diagonal and consumed by the slide retry;
// always `None` again by the time resolution returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WallSlide {
    #[default]
    None,
    Left,
    Right,
    Up,
    Down,
}

impl WallSlide {
    pub fn cardinal(self) -> Option<Direction> {
        match self {
            WallSlide::None => None,
            WallSlide::Left => Some(Direction::Left),
            WallSlide::Right => Some(Direction::Right),
            WallSlide::Up => Some(Direction::Up),
            WallSlide::Down => Some(Direction::Down),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub offset: Vec2,
    pub size: Vec2,
}

impl BoundingBox {
    pub fn new(offset: Vec2, size: Vec2) -> Self {
        Self { offset, size }
    }

    pub fn centered_in_frame(frame_size: Vec2, size: Vec2) -> Self {
        Self {
            offset: Vec2::new(
                (frame_size.x - size.x) * 0.5,
                (frame_size.y - size.y) * 0.5,
            ),
            size,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CornerCells {
    pub top_left: GridPos,
    pub top_right: GridPos,
    pub bottom_left: GridPos,
    pub bottom_right: GridPos,
}

impl CornerCells {
    pub fn spans_columns(&self) -> bool {
        self.top_left.x != self.top_right.x
    }

    pub fn spans_rows(&self) -> bool {
        self.top_left.y != self.bottom_left.y
    }

    pub fn leading(&self, direction: Direction) -> GridPos {
        match direction {
            Direction::Up | Direction::Left | Direction::UpLeft => self.top_left,
            Direction::Right | Direction::UpRight => self.top_right,
            Direction::Down | Direction::DownLeft => self.bottom_left,
            Direction::DownRight => self.bottom_right,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Agent {
    pub tag: String,
    pub position: Vec2,
    // Nonzero only while a movement is being resolved; cleared at frame end.
    pub velocity: Vec2,
    pub movement_speed: f32,
    pub direction: Direction,
    pub wall_slide: WallSlide,
    pub bounding_box: BoundingBox,
}

impl Agent {
    pub fn new(
        tag: impl Into<String>,
        position: Vec2,
        movement_speed: f32,
        bounding_box: BoundingBox,
    ) -> Self {
        Self {
            tag: tag.into(),
            position,
            velocity: Vec2::ZERO,
            movement_speed,
            direction: Direction::Down,
            wall_slide: WallSlide::None,
            bounding_box,
        }
    }

    pub fn aabb_min(&self) -> Vec2 {
        Vec2::new(
            self.position.x + self.bounding_box.offset.x,
            self.position.y + self.bounding_box.offset.y,
        )
    }

    pub fn aabb_max(&self) -> Vec2 {
        let min = self.aabb_min();
        Vec2::new(
            min.x + self.bounding_box.size.x,
            min.y + self.bounding_box.size.y,
        )
    }

    pub fn aabb_center(&self) -> Vec2 {
        let min = self.aabb_min();
        Vec2::new(
            min.x + self.bounding_box.size.x * 0.5,
            min.y + self.bounding_box.size.y * 0.5,
        )
    }

    pub fn corner_cells(&self, tile: TileSize) -> CornerCells {
        let min = self.aabb_min();
        let max = self.aabb_max();
        CornerCells {
            top_left: tile.cell_at(min),
            top_right: tile.cell_at(Vec2::new(max.x, min.y)),
            bottom_left: tile.cell_at(Vec2::new(min.x, max.y)),
            bottom_right: tile.cell_at(max),
        }
    }

    pub fn leading_corner(&self, direction: Direction) -> Vec2 {
        let min = self.aabb_min();
        let max = self.aabb_max();
        let (sx, sy) = direction.axis_signs();
        Vec2::new(
            if sx > 0 { max.x } else { min.x },
            if sy > 0 { max.y } else { min.y },
        )
    }

    pub fn step(
        &mut self,
        intent: Option<Direction>,
        grid: &impl CollisionGrid,
        dt_seconds: f32,
    ) -> MoveOutcome {
        let outcome = match intent {
            Some(direction) => {
                self.direction = direction;
                self.velocity = direction.velocity(self.movement_speed);
                let corner = self.leading_corner(direction);
                let candidate = Vec2::new(
                    corner.x + self.velocity.x * dt_seconds,
                    corner.y + self.velocity.y * dt_seconds,
                );
                resolve(self, candidate, grid, dt_seconds)
            }
            None => MoveOutcome::stationary(),
        };
        self.velocity = Vec2::ZERO;
        outcome
    }
}
