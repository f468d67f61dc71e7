use std::fmt::Display;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::warn;

use engine::Vec2;

pub const SAVE_VERSION: u32 = 1;

pub type SaveLoadResult<T> = Result<T, String>;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SavedVec2 {
    pub x: f32,
    pub y: f32,
}

impl SavedVec2 {
    pub fn from_vec2(value: Vec2) -> Self {
        Self {
            x: value.x,
            y: value.y,
        }
    }

    pub fn to_vec2(self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveGame {
    pub save_version: u32,
    pub tag: String,
    pub position: SavedVec2,
    pub hp: f32,
    pub gold: i32,
}

impl SaveGame {
    pub fn blank(tag: &str) -> Self {
        Self {
            save_version: SAVE_VERSION,
            tag: tag.to_string(),
            position: SavedVec2 { x: 48.0, y: 68.0 },
            hp: 10.0,
            gold: 0,
        }
    }
}

pub fn save_file_path(saves_dir: &Path, tag: &str) -> PathBuf {
    saves_dir.join(format!("{tag}.json"))
}

pub fn write_save(saves_dir: &Path, save: &SaveGame) -> SaveLoadResult<PathBuf> {
    fs::create_dir_all(saves_dir)
        .map_err(|error| format!("create saves dir '{}': {error}", saves_dir.display()))?;
    let path = save_file_path(saves_dir, &save.tag);
    let json = serde_json::to_string_pretty(save)
        .map_err(|error| format!("encode save json: {error}"))?;
    fs::write(&path, json).map_err(|error| format!("write save '{}': {error}", path.display()))?;
    Ok(path)
}

pub fn load_save(saves_dir: &Path, tag: &str) -> SaveLoadResult<SaveGame> {
    let path = save_file_path(saves_dir, tag);
    let raw = fs::read_to_string(&path)
        .map_err(|error| format!("read save '{}': {error}", path.display()))?;
    let save = parse_save_json(&raw)?;
    validate_save(&save, tag)?;
    Ok(save)
}

// Any load failure falls back to a blank save with a warning.
pub fn load_or_blank(saves_dir: &Path, tag: &str) -> SaveGame {
    match load_save(saves_dir, tag) {
        Ok(save) => save,
        Err(error) => {
            warn!(tag, error = %error, "save_load_failed_using_blank");
            SaveGame::blank(tag)
        }
    }
}

fn parse_save_json(raw: &str) -> SaveLoadResult<SaveGame> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    match serde_path_to_error::deserialize::<_, SaveGame>(&mut deserializer) {
        Ok(save) => Ok(save),
        Err(error) => {
            let path = error.path().to_string();
            let source = error.into_inner();
            if path.is_empty() || path == "." {
                Err(format!("parse save json: {source}"))
            } else {
                Err(format!("parse save json at {path}: {source}"))
            }
        }
    }
}

fn validation_err(path: &str, message: impl Into<String>) -> String {
    format!("validation failed at {path}: {}", message.into())
}

fn expected_actual(path: &str, expected: impl Display, actual: impl Display) -> String {
    validation_err(path, format!("expected {expected}, got {actual}"))
}

fn validate_save(save: &SaveGame, expected_tag: &str) -> SaveLoadResult<()> {
    if save.save_version != SAVE_VERSION {
        return Err(expected_actual(
            "save_version",
            SAVE_VERSION,
            save.save_version,
        ));
    }
    if save.tag != expected_tag {
        return Err(expected_actual("tag", expected_tag, &save.tag));
    }
    if !save.position.x.is_finite() {
        return Err(validation_err("position.x", "value must be finite"));
    }
    if !save.position.y.is_finite() {
        return Err(validation_err("position.y", "value must be finite"));
    }
    if !save.hp.is_finite() || save.hp < 0.0 {
        return Err(validation_err("hp", "value must be finite and >= 0"));
    }
    Ok(())
}
