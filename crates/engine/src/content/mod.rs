mod engine_config;
mod level_file;
mod tileset;

pub use engine_config::{
    load_engine_config, ConfigError, ConfigErrorCode, EngineConfig, SourceLocation,
    ENGINE_CONFIG_FILE_NAME,
};
pub use level_file::{load_level_file, load_levels_dir, LevelFile, LevelFileError};
pub use tileset::{load_tileset, TILESET_FILE_NAME};
