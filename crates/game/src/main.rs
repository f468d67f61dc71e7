mod save;
mod session;

use engine::{
    load_engine_config, load_levels_dir, load_tileset, resolve_app_paths, Direction, InputAction,
    InputSnapshot, Level, TileGrid, TileSize, Tileset, Vec2, ENGINE_CONFIG_FILE_NAME,
    TILESET_FILE_NAME,
};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use save::{load_or_blank, write_save};
use session::{GameSession, PatrolLeg, PatrolRoute};

const PLAYER_TAG: &str = "player";
const FRAME_BUDGET_ENV_VAR: &str = "TILEBOUND_DEMO_FRAMES";
const DEFAULT_FRAME_BUDGET: u64 = 240;
const PROGRESS_LOG_INTERVAL: u64 = 30;

// One full lap of the scripted walk; longer budgets repeat it.
const SCRIPT_CYCLE_FRAMES: u64 = 240;

fn main() {
    init_tracing();
    info!("=== Tilebound Startup ===");

    if let Err(err) = run() {
        error!(error = %err, "startup_failed");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let paths = resolve_app_paths().map_err(|error| format!("resolve app paths: {error}"))?;
    info!(
        root = %paths.root.display(),
        config_dir = %paths.config_dir.display(),
        levels_dir = %paths.levels_dir.display(),
        saves_dir = %paths.saves_dir.display(),
        "app_paths_resolved"
    );

    let config = load_engine_config(&paths.config_dir.join(ENGINE_CONFIG_FILE_NAME))
        .map_err(|error| format!("load engine config: {error}"))?;
    info!(
        engine = %config.engine_name,
        version = %config.engine_version,
        tile_width = config.tile_size.width,
        tile_height = config.tile_size.height,
        max_frame_rate = config.max_frame_rate,
        "engine_config_loaded"
    );

    let tileset = load_tileset(&paths.config_dir.join(TILESET_FILE_NAME))
        .map_err(|error| format!("load tileset: {error}"))?;
    info!(tileset = %tileset.tag, tile_count = tileset.len(), "tileset_loaded");

    let mut levels = load_levels_dir(&paths.levels_dir, &tileset, config.tile_size);
    if levels.is_empty() {
        info!("no_level_files_found_using_demo_arena");
        levels.push(demo_arena(&tileset, config.tile_size)?);
    }

    let save = load_or_blank(&paths.saves_dir, PLAYER_TAG);
    info!(
        tag = %save.tag,
        x = save.position.x,
        y = save.position.y,
        hp = save.hp,
        gold = save.gold,
        "save_restored"
    );

    let mut session = GameSession::new(levels, &save, &config)?;
    info!(
        level_count = session.level_count(),
        active = %session.active_level().name(),
        "levels_ready"
    );
    session.spawn_npc(
        "npc_patrol",
        Vec2::new(64.0, 96.0),
        PatrolRoute::new(vec![
            PatrolLeg::new(Direction::Right, 40),
            PatrolLeg::new(Direction::Down, 40),
            PatrolLeg::new(Direction::Left, 40),
            PatrolLeg::new(Direction::Up, 40),
        ]),
    );

    let frame_budget = resolve_frame_budget(DEFAULT_FRAME_BUDGET);
    let dt_seconds = 1.0 / config.max_frame_rate.max(1) as f32;
    info!(frame_budget, dt_seconds, "demo_loop_start");

    for frame in 0..frame_budget {
        let input = scripted_input(frame);
        if input.quit_requested() {
            info!(frame, "demo_quit_requested");
            break;
        }
        session.advance(&input, dt_seconds);

        if frame % PROGRESS_LOG_INTERVAL == 0 {
            let player = session.player();
            info!(
                frame,
                x = player.agent.position.x,
                y = player.agent.position.y,
                direction = ?player.agent.direction,
                "demo_progress"
            );
        }
    }

    let final_save = session.to_save();
    let save_path =
        write_save(&paths.saves_dir, &final_save).map_err(|error| format!("write save: {error}"))?;
    info!(
        path = %save_path.display(),
        x = final_save.position.x,
        y = final_save.position.y,
        "save_written"
    );
    info!("shutdown");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn demo_arena(tileset: &Tileset, tile_size: TileSize) -> Result<Level, String> {
    const WIDTH: u32 = 16;
    const HEIGHT: u32 = 12;

    let mut tiles = vec![1u16; (WIDTH * HEIGHT) as usize];
    for x in 0..WIDTH {
        tiles[x as usize] = 0;
        tiles[((HEIGHT - 1) * WIDTH + x) as usize] = 0;
    }
    for y in 0..HEIGHT {
        tiles[(y * WIDTH) as usize] = 0;
        tiles[(y * WIDTH + WIDTH - 1) as usize] = 0;
    }
    // Water pool in the east half.
    for y in 4..7 {
        for x in 10..13 {
            tiles[(y * WIDTH + x) as usize] = 4;
        }
    }

    let grid = TileGrid::new(WIDTH, HEIGHT, tiles)
        .map_err(|error| format!("demo arena grid: {error}"))?;
    Ok(Level::from_grid("demo_arena", grid, tileset, tile_size))
}

fn scripted_input(frame: u64) -> InputSnapshot {
    let phase = frame % SCRIPT_CYCLE_FRAMES;
    match phase {
        0..=59 => InputSnapshot::empty().with_action_down(InputAction::MoveRight),
        60..=89 => InputSnapshot::empty()
            .with_action_down(InputAction::MoveDown)
            .with_action_down(InputAction::MoveRight),
        90..=119 => InputSnapshot::empty().with_action_down(InputAction::MoveDown),
        120..=149 => InputSnapshot::empty()
            .with_action_down(InputAction::MoveDown)
            .with_action_down(InputAction::MoveLeft),
        150..=179 => InputSnapshot::empty().with_action_down(InputAction::MoveLeft),
        180..=209 => InputSnapshot::empty()
            .with_action_down(InputAction::MoveUp)
            .with_action_down(InputAction::MoveLeft),
        _ => InputSnapshot::empty().with_action_down(InputAction::MoveUp),
    }
}

fn resolve_frame_budget(default_frames: u64) -> u64 {
    match std::env::var(FRAME_BUDGET_ENV_VAR) {
        Ok(value) => match parse_frame_budget(&value) {
            Some(frames) => frames,
            None => {
                warn!(
                    env_var = FRAME_BUDGET_ENV_VAR,
                    value = value.as_str(),
                    "invalid frame budget env var value; falling back to default"
                );
                default_frames
            }
        },
        Err(std::env::VarError::NotPresent) => default_frames,
        Err(err) => {
            warn!(
                env_var = FRAME_BUDGET_ENV_VAR,
                error = %err,
                "unable to read frame budget env var; falling back to default"
            );
            default_frames
        }
    }
}

fn parse_frame_budget(raw: &str) -> Option<u64> {
    raw.trim().parse::<u64>().ok().filter(|frames| *frames > 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    use engine::GridPos;

    #[test]
    fn parse_frame_budget_accepts_positive_integers_only() {
        assert_eq!(parse_frame_budget("240"), Some(240));
        assert_eq!(parse_frame_budget("  12 "), Some(12));
        assert_eq!(parse_frame_budget("0"), None);
        assert_eq!(parse_frame_budget("-3"), None);
        assert_eq!(parse_frame_budget("many"), None);
    }

    #[test]
    fn demo_arena_is_walled_with_a_water_pool() {
        let level = demo_arena(&Tileset::default_set(), TileSize::square(16.0)).expect("arena");

        assert!(!level.is_solid(GridPos::new(0, 0)));
        assert!(!level.is_solid(GridPos::new(15, 11)));
        assert!(!level.is_solid(GridPos::new(11, 5)));
        assert!(level.is_solid(GridPos::new(4, 5)));
        assert!(level.is_solid(GridPos::new(9, 4)));
    }

    #[test]
    fn scripted_input_is_deterministic_and_cycles() {
        for frame in 0..SCRIPT_CYCLE_FRAMES {
            assert_eq!(scripted_input(frame), scripted_input(frame + SCRIPT_CYCLE_FRAMES));
        }

        let diagonal = scripted_input(75);
        assert!(diagonal.is_down(InputAction::MoveDown));
        assert!(diagonal.is_down(InputAction::MoveRight));
        assert!(!diagonal.is_down(InputAction::MoveLeft));

        let closing = scripted_input(230);
        assert!(closing.is_down(InputAction::MoveUp));
        assert!(!closing.quit_requested());
    }
}
