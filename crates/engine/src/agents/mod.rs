mod agent;
mod collision;

pub use agent::{Agent, BoundingBox, CornerCells, Direction, WallSlide};
pub use collision::{resolve, MoveOutcome};
