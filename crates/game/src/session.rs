use engine::{
    Agent, BoundingBox, Camera, Direction, EngineConfig, InputAction, InputSnapshot, Level, Vec2,
    WallSlide,
};
use tracing::debug;

use crate::save::{SaveGame, SavedVec2, SAVE_VERSION};

// One shared footprint for all agents: a 10x10 box centered in the 48x48
// sprite frame, so sprites overlap walls a little before the box does.
const SPRITE_FRAME_SIZE: f32 = 48.0;
const AGENT_BOX_SIZE: f32 = 10.0;

const PLAYER_MOVE_SPEED: f32 = 1.0;
const NPC_MOVE_SPEED: f32 = 1.0;

const CAMERA_TAG: &str = "main";

#[derive(Debug, Clone)]
pub struct PlayerState {
    pub agent: Agent,
    pub hp: f32,
    pub gold: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatrolLeg {
    pub direction: Direction,
    pub frames: u32,
}

impl PatrolLeg {
    pub fn new(direction: Direction, frames: u32) -> Self {
        Self { direction, frames }
    }
}

#[derive(Debug, Clone)]
pub struct PatrolRoute {
    legs: Vec<PatrolLeg>,
    leg_index: usize,
    frames_into_leg: u32,
}

impl PatrolRoute {
    pub fn new(legs: Vec<PatrolLeg>) -> Self {
        Self {
            legs,
            leg_index: 0,
            frames_into_leg: 0,
        }
    }

    fn next_direction(&mut self) -> Option<Direction> {
        if self.legs.iter().all(|leg| leg.frames == 0) {
            return None;
        }
        loop {
            let leg = self.legs[self.leg_index];
            if self.frames_into_leg < leg.frames {
                self.frames_into_leg += 1;
                return Some(leg.direction);
            }
            self.frames_into_leg = 0;
            self.leg_index = (self.leg_index + 1) % self.legs.len();
        }
    }
}

#[derive(Debug, Clone)]
struct NpcState {
    agent: Agent,
    route: PatrolRoute,
}

pub fn movement_intent(input: &InputSnapshot) -> Option<Direction> {
    let mut sx = 0i32;
    let mut sy = 0i32;
    if input.is_down(InputAction::MoveRight) {
        sx += 1;
    }
    if input.is_down(InputAction::MoveLeft) {
        sx -= 1;
    }
    if input.is_down(InputAction::MoveDown) {
        sy += 1;
    }
    if input.is_down(InputAction::MoveUp) {
        sy -= 1;
    }
    Direction::from_axis_signs(sx, sy)
}

// Owns the level registry and active index; one `advance` is one frame.
#[derive(Debug)]
pub struct GameSession {
    levels: Vec<Level>,
    active_level: usize,
    player: PlayerState,
    npcs: Vec<NpcState>,
    camera: Camera,
    view_size: Vec2,
}

impl GameSession {
    pub fn new(levels: Vec<Level>, save: &SaveGame, config: &EngineConfig) -> Result<Self, String> {
        if levels.is_empty() {
            return Err("a game session needs at least one level".to_string());
        }

        let player = PlayerState {
            agent: Agent::new(
                save.tag.clone(),
                save.position.to_vec2(),
                PLAYER_MOVE_SPEED,
                agent_bounding_box(),
            ),
            hp: save.hp,
            gold: save.gold,
        };

        Ok(Self {
            levels,
            active_level: 0,
            player,
            npcs: Vec::new(),
            camera: Camera::new(CAMERA_TAG, Vec2::ZERO),
            view_size: config.view_size_pixels(),
        })
    }

    pub fn spawn_npc(&mut self, tag: impl Into<String>, position: Vec2, route: PatrolRoute) {
        self.npcs.push(NpcState {
            agent: Agent::new(tag, position, NPC_MOVE_SPEED, agent_bounding_box()),
            route,
        });
    }

    pub fn active_level(&self) -> &Level {
        &self.levels[self.active_level]
    }

    pub fn set_active_level(&mut self, index: usize) -> bool {
        if index < self.levels.len() {
            self.active_level = index;
            true
        } else {
            false
        }
    }

    pub fn level_count(&self) -> usize {
        self.levels.len()
    }

    pub fn player(&self) -> &PlayerState {
        &self.player
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn npc_positions(&self) -> Vec<(String, Vec2)> {
        self.npcs
            .iter()
            .map(|npc| (npc.agent.tag.clone(), npc.agent.position))
            .collect()
    }

    pub fn advance(&mut self, input: &InputSnapshot, dt_seconds: f32) {
        let level = &self.levels[self.active_level];

        let intent = movement_intent(input);
        let outcome = self.player.agent.step(intent, level, dt_seconds);
        if outcome.deflected != WallSlide::None {
            debug!(
                agent = %self.player.agent.tag,
                slide = ?outcome.deflected,
                committed = outcome.committed,
                "wall_slide_deflection"
            );
        }

        for npc in &mut self.npcs {
            let npc_intent = npc.route.next_direction();
            npc.agent.step(npc_intent, level, dt_seconds);
        }

        self.camera.follow_clamped(
            self.player.agent.aabb_center(),
            self.view_size,
            level.pixel_size(),
        );
    }

    pub fn to_save(&self) -> SaveGame {
        SaveGame {
            save_version: SAVE_VERSION,
            tag: self.player.agent.tag.clone(),
            position: SavedVec2::from_vec2(self.player.agent.position),
            hp: self.player.hp,
            gold: self.player.gold,
        }
    }
}

fn agent_bounding_box() -> BoundingBox {
    BoundingBox::centered_in_frame(
        Vec2::new(SPRITE_FRAME_SIZE, SPRITE_FRAME_SIZE),
        Vec2::new(AGENT_BOX_SIZE, AGENT_BOX_SIZE),
    )
}
