use std::collections::HashSet;
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use roxmltree::{Document, Node};

use crate::world::{TileSize, Vec2};

pub const ENGINE_CONFIG_FILE_NAME: &str = "engine.xml";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigErrorCode {
    ReadFile,
    XmlMalformed,
    InvalidRoot,
    UnknownElement,
    DuplicateElement,
    MissingAttribute,
    InvalidValue,
    DuplicateTileId,
}

#[derive(Debug, Clone)]
pub struct ConfigError {
    pub code: ConfigErrorCode,
    pub message: String,
    pub file_path: PathBuf,
    pub location: Option<SourceLocation>,
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.location {
            Some(loc) => write!(
                f,
                "{:?}: {} (file={}, line={}, column={})",
                self.code,
                self.message,
                self.file_path.display(),
                loc.line,
                loc.column
            ),
            None => write!(
                f,
                "{:?}: {} (file={})",
                self.code,
                self.message,
                self.file_path.display()
            ),
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub engine_name: String,
    pub engine_version: String,
    pub window_title: String,
    // Window size in tiles (columns, rows), HUD rows included.
    pub window_grid_tiles: (u32, u32),
    pub max_frame_rate: u32,
    pub window_scaler: f32,
    pub hud_rows: u32,
    pub tile_size: TileSize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            engine_name: "tilebound".to_string(),
            engine_version: "dev".to_string(),
            window_title: "Tilebound".to_string(),
            window_grid_tiles: (10, 10),
            max_frame_rate: 30,
            window_scaler: 1.0,
            hud_rows: 0,
            tile_size: TileSize::square(16.0),
        }
    }
}

impl EngineConfig {
    pub fn view_size_pixels(&self) -> Vec2 {
        let rows = self.window_grid_tiles.1.saturating_sub(self.hud_rows);
        Vec2::new(
            self.window_grid_tiles.0 as f32 * self.tile_size.width,
            rows as f32 * self.tile_size.height,
        )
    }
}

// A missing file falls back to the defaults; parse failures are errors.
pub fn load_engine_config(path: &Path) -> Result<EngineConfig, ConfigError> {
    if !path.exists() {
        return Ok(EngineConfig::default());
    }
    let raw = fs::read_to_string(path).map_err(|error| ConfigError {
        code: ConfigErrorCode::ReadFile,
        message: format!("failed to read config file: {error}"),
        file_path: path.to_path_buf(),
        location: None,
    })?;
    parse_engine_config(path, &raw)
}

fn parse_engine_config(file_path: &Path, raw: &str) -> Result<EngineConfig, ConfigError> {
    let doc = parse_document(file_path, raw)?;
    let root = doc.root_element();
    if root.tag_name().name() != "engine_config" {
        return Err(error_at_node(
            ConfigErrorCode::InvalidRoot,
            "root element must be <engine_config>".to_string(),
            file_path,
            &doc,
            root,
        ));
    }

    let mut config = EngineConfig::default();
    let mut seen = HashSet::<String>::new();

    for child in root.children().filter(|node| node.is_element()) {
        let element_name = child.tag_name().name().to_string();
        if !seen.insert(element_name.clone()) {
            return Err(error_at_node(
                ConfigErrorCode::DuplicateElement,
                format!("duplicate element <{}> in <engine_config>", element_name),
                file_path,
                &doc,
                child,
            ));
        }

        match element_name.as_str() {
            "engine_settings" => {
                config.engine_name = required_attr(file_path, &doc, child, "name")?;
                config.engine_version = required_attr(file_path, &doc, child, "version")?;
            }
            "window_settings" => {
                config.window_title = required_attr(file_path, &doc, child, "title")?;
                let width = positive_u32(file_path, &doc, child, "width")?;
                let height = positive_u32(file_path, &doc, child, "height")?;
                config.window_grid_tiles = (width, height);
                config.max_frame_rate = positive_u32(file_path, &doc, child, "max_frame_rate")?;
                config.window_scaler = positive_f32(file_path, &doc, child, "scaler")?;
                config.hud_rows = match child.attribute("hud_rows") {
                    Some(_) => parse_attr_u32(file_path, &doc, child, "hud_rows")?,
                    None => 0,
                };
            }
            "tile_settings" => {
                let width = positive_f32(file_path, &doc, child, "width")?;
                let height = positive_f32(file_path, &doc, child, "height")?;
                config.tile_size = TileSize { width, height };
            }
            _ => {
                return Err(error_at_node(
                    ConfigErrorCode::UnknownElement,
                    format!("unknown element <{}> in <engine_config>", element_name),
                    file_path,
                    &doc,
                    child,
                ))
            }
        }
    }

    Ok(config)
}

pub(super) fn parse_document<'input>(
    file_path: &Path,
    raw: &'input str,
) -> Result<Document<'input>, ConfigError> {
    Document::parse(raw).map_err(|error| ConfigError {
        code: ConfigErrorCode::XmlMalformed,
        message: format!("malformed XML: {error}"),
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: error.pos().row as usize,
            column: error.pos().col as usize,
        }),
    })
}

pub(super) fn required_attr(
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
    name: &str,
) -> Result<String, ConfigError> {
    let value = node.attribute(name).map(str::trim).unwrap_or_default();
    if value.is_empty() {
        return Err(error_at_node(
            ConfigErrorCode::MissingAttribute,
            format!(
                "attribute '{}' on <{}> must be present and non-empty",
                name,
                node.tag_name().name()
            ),
            file_path,
            doc,
            node,
        ));
    }
    Ok(value.to_string())
}

pub(super) fn parse_attr_u32(
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
    name: &str,
) -> Result<u32, ConfigError> {
    let value = required_attr(file_path, doc, node, name)?;
    value.parse::<u32>().map_err(|_| {
        error_at_node(
            ConfigErrorCode::InvalidValue,
            format!("attribute '{}' value '{}' is not a valid integer", name, value),
            file_path,
            doc,
            node,
        )
    })
}

fn positive_u32(
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
    name: &str,
) -> Result<u32, ConfigError> {
    let value = parse_attr_u32(file_path, doc, node, name)?;
    if value == 0 {
        return Err(error_at_node(
            ConfigErrorCode::InvalidValue,
            format!("attribute '{}' must be >= 1", name),
            file_path,
            doc,
            node,
        ));
    }
    Ok(value)
}

fn positive_f32(
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
    name: &str,
) -> Result<f32, ConfigError> {
    let value = required_attr(file_path, doc, node, name)?;
    let parsed = value.parse::<f32>().map_err(|_| {
        error_at_node(
            ConfigErrorCode::InvalidValue,
            format!("attribute '{}' value '{}' is not a valid number", name, value),
            file_path,
            doc,
            node,
        )
    })?;
    if !parsed.is_finite() || parsed <= 0.0 {
        return Err(error_at_node(
            ConfigErrorCode::InvalidValue,
            format!("attribute '{}' must be finite and > 0", name),
            file_path,
            doc,
            node,
        ));
    }
    Ok(parsed)
}

pub(super) fn error_at_node(
    code: ConfigErrorCode,
    message: String,
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
) -> ConfigError {
    let pos = doc.text_pos_at(node.range().start);
    ConfigError {
        code,
        message,
        file_path: file_path.to_path_buf(),
        location: Some(SourceLocation {
            line: pos.row as usize,
            column: pos.col as usize,
        }),
    }
}
