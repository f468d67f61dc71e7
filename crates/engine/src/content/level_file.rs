use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::world::{Level, TileGrid, TileGridError, TileSize, Tileset};

// Solidity is not stored; it is derived from the tileset when the level is built.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelFile {
    #[serde(default)]
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub tiles: Vec<u16>,
}

#[derive(Debug, Error)]
pub enum LevelFileError {
    #[error("failed to read level file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse level file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("level file {path} has an invalid grid: {source}")]
    Grid {
        path: PathBuf,
        #[source]
        source: TileGridError,
    },
}

impl LevelFile {
    pub fn into_level(
        self,
        tileset: &Tileset,
        tile_size: TileSize,
    ) -> Result<Level, TileGridError> {
        let grid = TileGrid::new(self.width, self.height, self.tiles)?;
        Ok(Level::from_grid(self.name, grid, tileset, tile_size))
    }
}

pub fn load_level_file(path: &Path) -> Result<LevelFile, LevelFileError> {
    let raw = fs::read_to_string(path).map_err(|source| LevelFileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&raw).map_err(|source| LevelFileError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

// Malformed files are skipped with a warning; a missing directory yields no levels.
pub fn load_levels_dir(dir: &Path, tileset: &Tileset, tile_size: TileSize) -> Vec<Level> {
    let mut levels = Vec::new();
    for path in collect_level_paths(dir) {
        let mut file = match load_level_file(&path) {
            Ok(file) => file,
            Err(error) => {
                warn!(path = %path.display(), error = %error, "level_file_skipped");
                continue;
            }
        };
        if file.name.is_empty() {
            file.name = path
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or("level")
                .to_string();
        }
        match file.into_level(tileset, tile_size) {
            Ok(level) => {
                info!(
                    level = %level.name(),
                    width = level.grid().width(),
                    height = level.grid().height(),
                    "level_loaded"
                );
                levels.push(level);
            }
            Err(error) => {
                warn!(path = %path.display(), error = %error, "level_file_skipped");
            }
        }
    }
    levels
}

fn collect_level_paths(dir: &Path) -> Vec<PathBuf> {
    if !dir.exists() {
        return Vec::new();
    }
    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(error) => {
            warn!(dir = %dir.display(), error = %error, "levels_dir_unreadable");
            return Vec::new();
        }
    };

    let mut paths = Vec::new();
    for entry in entries.flatten() {
        let path = entry.path();
        let is_json = path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if path.is_file() && is_json {
            paths.push(path);
        }
    }
    paths.sort();
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    use crate::world::GridPos;

    fn write_level(dir: &Path, file_name: &str, contents: &str) {
        fs::write(dir.join(file_name), contents).expect("write level file");
    }

    fn valid_level_json(name: &str) -> String {
        format!(r#"{{"name": "{name}", "width": 3, "height": 2, "tiles": [1, 1, 1, 1, 0, 1]}}"#)
    }

    #[test]
    fn level_file_round_trips_into_a_level() {
        let dir = TempDir::new().expect("temp dir");
        write_level(dir.path(), "meadow.json", &valid_level_json("meadow"));

        let file = load_level_file(&dir.path().join("meadow.json")).expect("level file");
        assert_eq!(file.name, "meadow");
        assert_eq!((file.width, file.height), (3, 2));

        let level = file
            .into_level(&Tileset::default_set(), TileSize::square(16.0))
            .expect("level");
        assert!(level.is_solid(GridPos::new(0, 0)));
        assert!(!level.is_solid(GridPos::new(1, 1)));
    }

    #[test]
    fn wrong_tile_count_is_a_grid_error() {
        let dir = TempDir::new().expect("temp dir");
        write_level(
            dir.path(),
            "short.json",
            r#"{"name": "short", "width": 3, "height": 2, "tiles": [1, 1]}"#,
        );

        let file = load_level_file(&dir.path().join("short.json")).expect("parses fine");
        let error = file
            .into_level(&Tileset::default_set(), TileSize::square(16.0))
            .expect_err("grid must reject");
        assert!(matches!(error, TileGridError::CellCountMismatch { .. }));
    }

    #[test]
    fn dir_loads_in_name_order_and_skips_malformed_files() {
        let dir = TempDir::new().expect("temp dir");
        write_level(dir.path(), "02_cave.json", &valid_level_json("cave"));
        write_level(dir.path(), "01_meadow.json", &valid_level_json("meadow"));
        write_level(dir.path(), "03_broken.json", "{not valid json");
        write_level(
            dir.path(),
            "04_short.json",
            r#"{"name": "short", "width": 9, "height": 9, "tiles": [1]}"#,
        );
        write_level(dir.path(), "notes.txt", "not a level");

        let levels = load_levels_dir(dir.path(), &Tileset::default_set(), TileSize::square(16.0));

        let names: Vec<&str> = levels.iter().map(|level| level.name()).collect();
        assert_eq!(names, vec!["meadow", "cave"]);
    }

    #[test]
    fn missing_name_falls_back_to_the_file_stem() {
        let dir = TempDir::new().expect("temp dir");
        write_level(
            dir.path(),
            "05_ruins.json",
            r#"{"width": 1, "height": 1, "tiles": [1]}"#,
        );

        let levels = load_levels_dir(dir.path(), &Tileset::default_set(), TileSize::square(16.0));
        assert_eq!(levels.len(), 1);
        assert_eq!(levels[0].name(), "05_ruins");
    }

    #[test]
    fn missing_dir_yields_no_levels() {
        let dir = TempDir::new().expect("temp dir");
        let levels = load_levels_dir(
            &dir.path().join("does_not_exist"),
            &Tileset::default_set(),
            TileSize::square(16.0),
        );
        assert!(levels.is_empty());
    }
}
