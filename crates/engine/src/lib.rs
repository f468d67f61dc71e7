use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod agents;
pub mod content;
pub mod input;
pub mod world;

pub use agents::{resolve, Agent, BoundingBox, CornerCells, Direction, MoveOutcome, WallSlide};
pub use content::{
    load_engine_config, load_level_file, load_levels_dir, load_tileset, ConfigError,
    ConfigErrorCode, EngineConfig, LevelFile, LevelFileError, SourceLocation,
    ENGINE_CONFIG_FILE_NAME, TILESET_FILE_NAME,
};
pub use input::{InputAction, InputSnapshot};
pub use world::{
    Camera, CollisionGrid, GridPos, Level, TileDef, TileGrid, TileGridError, TileKind, TileSize,
    Tileset, Vec2,
};

pub const ROOT_ENV_VAR: &str = "TILEBOUND_ROOT";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub config_dir: PathBuf,
    pub levels_dir: PathBuf,
    pub saves_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "TILEBOUND_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or config/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or config/.\n\
Set {env_var} explicitly, for example:\n\
PowerShell: $env:{env_var}=\"C:\\path\\to\\Tilebound\"\n\
Bash/zsh: export {env_var}=\"/path/to/Tilebound\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    let config_dir = root.join("config");
    let levels_dir = root.join("content").join("levels");
    let saves_dir = root.join("content").join("data");

    Ok(AppPaths {
        root,
        config_dir,
        levels_dir,
        saves_dir,
    })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let raw = PathBuf::from(value);
            let normalized = normalize_path(&raw);
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;

            for candidate in exe_dir.ancestors() {
                if is_repo_marker(candidate) {
                    return Ok(normalize_path(candidate));
                }
            }

            Err(StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_config = path.join("config").is_dir();

    cargo_toml && (has_crates || has_config)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}
