use std::collections::HashSet;
use std::fs;
use std::path::Path;

use roxmltree::{Document, Node};

use crate::world::{TileDef, TileKind, Tileset};

use super::engine_config::{
    error_at_node, parse_attr_u32, parse_document, required_attr, ConfigError, ConfigErrorCode,
};

pub const TILESET_FILE_NAME: &str = "tileset.xml";

const PALETTE: &[(&str, [u8; 3])] = &[
    ("black", [0, 0, 0]),
    ("white", [255, 255, 255]),
    ("green", [58, 121, 39]),
    ("brown", [121, 85, 58]),
    ("grey", [128, 128, 128]),
    ("blue", [52, 107, 194]),
    ("red", [172, 50, 50]),
    ("yellow", [211, 191, 88]),
];

fn colour_by_name(name: &str) -> Option<[u8; 3]> {
    PALETTE
        .iter()
        .find(|(palette_name, _)| *palette_name == name)
        .map(|(_, colour)| *colour)
}

fn palette_names() -> String {
    PALETTE
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(", ")
}

// A missing file falls back to the built-in set; parse failures are errors.
pub fn load_tileset(path: &Path) -> Result<Tileset, ConfigError> {
    if !path.exists() {
        return Ok(Tileset::default_set());
    }
    let raw = fs::read_to_string(path).map_err(|error| ConfigError {
        code: ConfigErrorCode::ReadFile,
        message: format!("failed to read tileset file: {error}"),
        file_path: path.to_path_buf(),
        location: None,
    })?;
    parse_tileset(path, &raw)
}

fn parse_tileset(file_path: &Path, raw: &str) -> Result<Tileset, ConfigError> {
    let doc = parse_document(file_path, raw)?;
    let root = doc.root_element();
    if root.tag_name().name() != "tileset" {
        return Err(error_at_node(
            ConfigErrorCode::InvalidRoot,
            "root element must be <tileset>".to_string(),
            file_path,
            &doc,
            root,
        ));
    }

    let tag = required_attr(file_path, &doc, root, "tag")?;
    let mut tiles = Vec::<TileDef>::new();
    let mut seen_ids = HashSet::<u16>::new();

    for child in root.children().filter(|node| node.is_element()) {
        if child.tag_name().name() != "tile" {
            return Err(error_at_node(
                ConfigErrorCode::UnknownElement,
                format!(
                    "unknown element <{}> in <tileset>; expected <tile>",
                    child.tag_name().name()
                ),
                file_path,
                &doc,
                child,
            ));
        }

        let tile = parse_tile(file_path, &doc, child)?;
        if !seen_ids.insert(tile.id) {
            return Err(error_at_node(
                ConfigErrorCode::DuplicateTileId,
                format!("duplicate tile id {}; ids must be unique", tile.id),
                file_path,
                &doc,
                child,
            ));
        }
        tiles.push(tile);
    }

    Ok(Tileset::new(tag, tiles))
}

fn parse_tile(
    file_path: &Path,
    doc: &Document<'_>,
    node: Node<'_, '_>,
) -> Result<TileDef, ConfigError> {
    let tag = required_attr(file_path, doc, node, "tag")?;
    let src_frame_x = parse_attr_u32(file_path, doc, node, "src_frame_x")?;
    let src_frame_y = parse_attr_u32(file_path, doc, node, "src_frame_y")?;

    let colour_name = required_attr(file_path, doc, node, "colour")?;
    let colour = colour_by_name(&colour_name).ok_or_else(|| {
        error_at_node(
            ConfigErrorCode::InvalidValue,
            format!(
                "unknown colour '{}'; allowed values: {}",
                colour_name,
                palette_names()
            ),
            file_path,
            doc,
            node,
        )
    })?;

    let raw_id = parse_attr_u32(file_path, doc, node, "id")?;
    let id = u16::try_from(raw_id).map_err(|_| {
        error_at_node(
            ConfigErrorCode::InvalidValue,
            format!("tile id {} is out of range (max {})", raw_id, u16::MAX),
            file_path,
            doc,
            node,
        )
    })?;

    let kind_name = required_attr(file_path, doc, node, "type")?;
    let kind = match kind_name.as_str() {
        "solid" => TileKind::Solid,
        "empty" => TileKind::Empty,
        _ => {
            return Err(error_at_node(
                ConfigErrorCode::InvalidValue,
                format!(
                    "invalid tile type '{}'; allowed values: solid, empty",
                    kind_name
                ),
                file_path,
                doc,
                node,
            ))
        }
    };

    Ok(TileDef {
        tag,
        src_frame: (src_frame_x, src_frame_y),
        colour,
        id,
        kind,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    use tempfile::TempDir;

    fn parse(raw: &str) -> Result<Tileset, ConfigError> {
        parse_tileset(Path::new("tileset.xml"), raw)
    }

    #[test]
    fn missing_file_falls_back_to_the_builtin_set() {
        let dir = TempDir::new().expect("temp dir");
        let tileset = load_tileset(&dir.path().join(TILESET_FILE_NAME)).expect("default");

        assert_eq!(tileset.tag, "builtin");
        assert!(tileset.tile(1).is_some());
    }

    #[test]
    fn valid_tileset_parses_and_indexes_by_id() {
        let tileset = parse(
            r#"<tileset tag="meadow">
                <tile tag="water" src_frame_x="4" src_frame_y="0" colour="blue" id="4" type="empty"/>
                <tile tag="grass" src_frame_x="1" src_frame_y="0" colour="green" id="1" type="solid"/>
            </tileset>"#,
        )
        .expect("tileset");

        assert_eq!(tileset.tag, "meadow");
        assert_eq!(tileset.len(), 2);

        let grass = tileset.tile(1).expect("grass");
        assert_eq!(grass.tag, "grass");
        assert_eq!(grass.kind, TileKind::Solid);
        assert_eq!(grass.colour, [58, 121, 39]);

        let water = tileset.tile(4).expect("water");
        assert_eq!(water.kind, TileKind::Empty);
        assert_eq!(water.src_frame, (4, 0));
    }

    #[test]
    fn duplicate_tile_ids_are_rejected() {
        let error = parse(
            r#"<tileset tag="broken">
                <tile tag="a" src_frame_x="0" src_frame_y="0" colour="green" id="1" type="solid"/>
                <tile tag="b" src_frame_x="1" src_frame_y="0" colour="brown" id="1" type="solid"/>
            </tileset>"#,
        )
        .expect_err("should fail");

        assert_eq!(error.code, ConfigErrorCode::DuplicateTileId);
        assert!(error.location.is_some());
    }

    #[test]
    fn unknown_colour_is_rejected_with_the_palette_listed() {
        let error = parse(
            r#"<tileset tag="broken">
                <tile tag="a" src_frame_x="0" src_frame_y="0" colour="mauve" id="1" type="solid"/>
            </tileset>"#,
        )
        .expect_err("should fail");

        assert_eq!(error.code, ConfigErrorCode::InvalidValue);
        assert!(error.message.contains("mauve"));
        assert!(error.message.contains("green"));
    }

    #[test]
    fn invalid_tile_type_is_rejected() {
        let error = parse(
            r#"<tileset tag="broken">
                <tile tag="a" src_frame_x="0" src_frame_y="0" colour="green" id="1" type="liquid"/>
            </tileset>"#,
        )
        .expect_err("should fail");

        assert_eq!(error.code, ConfigErrorCode::InvalidValue);
        assert!(error.message.contains("liquid"));
    }

    #[test]
    fn out_of_range_tile_id_is_rejected() {
        let error = parse(
            r#"<tileset tag="broken">
                <tile tag="a" src_frame_x="0" src_frame_y="0" colour="green" id="70000" type="solid"/>
            </tileset>"#,
        )
        .expect_err("should fail");

        assert_eq!(error.code, ConfigErrorCode::InvalidValue);
    }

    #[test]
    fn non_tile_children_are_rejected() {
        let error = parse(
            r#"<tileset tag="broken">
                <sprite tag="a"/>
            </tileset>"#,
        )
        .expect_err("should fail");

        assert_eq!(error.code, ConfigErrorCode::UnknownElement);
    }
}
