use tracing::warn;

use crate::world::{CollisionGrid, GridPos, Vec2};

use super::agent::{Agent, CornerCells, Direction, WallSlide};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveOutcome {
    pub committed: bool,
    pub deflected: WallSlide,
}

impl MoveOutcome {
    pub fn stationary() -> Self {
        Self {
            committed: false,
            deflected: WallSlide::None,
        }
    }
}

// Cells whose solidity gates one movement pass; unused entries collapse onto the candidate cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct ProbeSet {
    cells: [GridPos; 3],
    slide: WallSlide,
}

fn classify(
    direction: Direction,
    corners: CornerCells,
    candidate_cell: GridPos,
    grid: &impl CollisionGrid,
) -> ProbeSet {
    let (cell_offset, diagonal_offset, slide) = if direction.is_diagonal() {
        diagonal_probe(direction, corners, candidate_cell, grid)
    } else {
        (cardinal_offset(direction, corners), (0, 0), WallSlide::None)
    };

    ProbeSet {
        cells: [
            candidate_cell,
            candidate_cell.offset(cell_offset.0, cell_offset.1),
            candidate_cell.offset(diagonal_offset.0, diagonal_offset.1),
        ],
        slide,
    }
}

// A straddling AABB drags the neighboring row or column into the leading edge.
fn cardinal_offset(direction: Direction, corners: CornerCells) -> (i32, i32) {
    match direction {
        Direction::Left | Direction::Right if corners.spans_rows() => (0, 1),
        Direction::Up | Direction::Down if corners.spans_columns() => (1, 0),
        _ => (0, 0),
    }
}

// Keyed on the AABB straddle pattern and the candidate cell's step from the
// leading corner; one sign-parameterized table covers all four diagonals.
// Returns (cell offset, diagonal cell offset, wall slide).
fn diagonal_probe(
    direction: Direction,
    corners: CornerCells,
    candidate_cell: GridPos,
    grid: &impl CollisionGrid,
) -> ((i32, i32), (i32, i32), WallSlide) {
    let (sx, sy) = direction.axis_signs();
    let leading = corners.leading(direction);
    let step = (candidate_cell.x - leading.x, candidate_cell.y - leading.y);
    let straddle = (corners.spans_columns(), corners.spans_rows());

    let vertical = if sy < 0 { WallSlide::Up } else { WallSlide::Down };
    let horizontal = if sx < 0 { WallSlide::Left } else { WallSlide::Right };

    match (straddle, step) {
        ((false, false), s) if s == (0, sy) => {
            let slide = if grid.is_solid(candidate_cell) {
                vertical
            } else {
                horizontal
            };
            ((sx, 0), (sx, -sy), slide)
        }
        // Horizontal is the default slide by contract.
        ((false, false), s) if s == (sx, sy) => {
            let ahead_vertical = candidate_cell.offset(-sx, 0);
            let ahead_horizontal = candidate_cell.offset(0, -sy);
            let slide = if grid.is_solid(ahead_vertical) && !grid.is_solid(ahead_horizontal) {
                vertical
            } else {
                horizontal
            };
            ((-sx, 0), (0, -sy), slide)
        }
        ((false, false), s) if s == (sx, 0) => {
            if grid.is_solid(candidate_cell) {
                ((0, 0), (0, 0), WallSlide::None)
            } else {
                ((0, sy), (-sx, sy), vertical)
            }
        }
        ((true, false), s) if s == (0, sy) => ((-sx, 0), (0, -sy), horizontal),
        ((false, true), s) if s == (sx, 0) => ((-sx, 0), (0, -sy), vertical),
        // Straddling both axes, or no boundary crossed: the bare candidate cell decides.
        _ => ((0, 0), (0, 0), WallSlide::None),
    }
}

/// Resolves one candidate movement for `agent` against `grid`.
///
/// The commit rule reads backwards at first sight and must not be inverted:
/// solid means walkable support, so the move commits only when ALL probed
/// cells are solid. A blocked diagonal retries once along the wall.
pub fn resolve(
    agent: &mut Agent,
    candidate: Vec2,
    grid: &impl CollisionGrid,
    dt_seconds: f32,
) -> MoveOutcome {
    let mut candidate = candidate;
    let mut committed = false;
    let mut deflected = WallSlide::None;

    // First pass plus at most one slide retry; the retry is cardinal and cannot deflect again.
    for _pass in 0..2 {
        if !candidate.x.is_finite() || !candidate.y.is_finite() {
            warn!(
                agent = %agent.tag,
                candidate_x = candidate.x,
                candidate_y = candidate.y,
                "collision_candidate_not_finite"
            );
            break;
        }

        let tile = grid.tile_size();
        let candidate_cell = tile.cell_at(candidate);
        let corners = agent.corner_cells(tile);
        let probes = classify(agent.direction, corners, candidate_cell, grid);
        agent.wall_slide = probes.slide;

        if probes.cells.iter().all(|cell| grid.is_solid(*cell)) {
            agent.position.x += agent.velocity.x;
            agent.position.y += agent.velocity.y;
            committed = true;
            break;
        }

        let Some(slide_direction) = agent.wall_slide.cardinal() else {
            break;
        };

        deflected = agent.wall_slide;
        agent.wall_slide = WallSlide::None;
        agent.direction = slide_direction;
        agent.velocity = slide_direction.velocity(agent.movement_speed);
        let corner = agent.leading_corner(slide_direction);
        candidate = Vec2::new(
            corner.x + agent.velocity.x * dt_seconds,
            corner.y + agent.velocity.y * dt_seconds,
        );
    }

    agent.wall_slide = WallSlide::None;
    MoveOutcome { committed, deflected }
}
