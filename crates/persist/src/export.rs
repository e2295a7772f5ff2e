//! Runtime export consumed by the game.
//!
//! Layout below the export root:
//! ```text
//! layouts/<area>_<x>_<y>/geometry.bin   - packed tiles per map
//! layouts/<area>_<x>_<y>/collision.bin  - one collision byte per cell
//! tilesets/<type>/<tileset>.bin         - render blocks only
//! ```

use std::path::{Path, PathBuf};

use tilespace_common::{CollisionType, MapCoord, Tileset};
use tilespace_kernel::Area;

use crate::codec::{PersistError, Writer, check_limit, pack_tile};
use crate::tileset::{TILESET_MAGIC, TILESET_VERSION, write_render_block};

/// "GBMG" on disk.
pub const GEOMETRY_MAGIC: u32 = 0x474D_4247;
/// "GBMC" on disk.
pub const COLLISION_MAGIC: u32 = 0x434D_4247;
pub const EXPORT_VERSION: u16 = 1;

/// Lowercase file-name stem: every character other than a letter, digit or
/// underscore becomes `_`, so separators and dots cannot escape the export root.
pub fn slug(name: &str) -> String {
    let slug: String = name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if slug.is_empty() { "unnamed".to_owned() } else { slug }
}

/// What an export wrote.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportReport {
    pub layouts: usize,
    pub tilesets: usize,
    pub files: Vec<PathBuf>,
}

/// Encode a runtime tileset: header, tile count, then one render block per tile.
pub fn encode_runtime_tileset(tileset: &Tileset) -> Result<Vec<u8>, PersistError> {
    check_limit("tile count", tileset.tiles.len(), u16::MAX as usize)?;
    let mut w = Writer::new();
    w.u32(TILESET_MAGIC);
    w.u16(TILESET_VERSION);
    w.u16(tileset.tiles.len() as u16);
    for tile in &tileset.tiles {
        write_render_block(&mut w, tile.primitive.as_ref())?;
    }
    Ok(w.into_bytes())
}

/// Geometry and collision payloads for the map at `(x, y)`. An unpopulated
/// cell yields header-only files.
pub fn encode_layout(area: &Area, x: usize, y: usize) -> Result<(Vec<u8>, Vec<u8>), PersistError> {
    let mut geometry = Writer::new();
    geometry.u32(GEOMETRY_MAGIC);
    geometry.u16(EXPORT_VERSION);
    let mut collision = Writer::new();
    collision.u32(COLLISION_MAGIC);
    collision.u16(EXPORT_VERSION);

    if let Some(map) = area.map_at(MapCoord::new(x, y)) {
        for &tile in map.tiles() {
            geometry.u16(pack_tile(tile)?);
            let class = area
                .resolve(tile)
                .map_or(CollisionType::None, |def| def.collision);
            collision.u8(class as u8);
        }
    }
    Ok((geometry.into_bytes(), collision.into_bytes()))
}

/// Write every layout and runtime tileset of `area` below `root`.
///
/// All payloads are encoded before any file is created.
pub fn export_area(area: &Area, root: &Path) -> Result<ExportReport, PersistError> {
    let _span = tracing::info_span!("export_area", area = area.name()).entered();
    check_limit("area width", area.width(), u8::MAX as usize)?;
    check_limit("area height", area.height(), u8::MAX as usize)?;

    let area_slug = slug(area.name());
    let mut outputs: Vec<(PathBuf, Vec<u8>)> = Vec::new();

    for tileset in area.tilesets() {
        let path = root
            .join("tilesets")
            .join(tileset.kind.dir_name())
            .join(format!("{}.bin", slug(&tileset.name)));
        outputs.push((path, encode_runtime_tileset(tileset)?));
    }

    for y in 0..area.height() {
        for x in 0..area.width() {
            let dir = root.join("layouts").join(format!("{area_slug}_{x}_{y}"));
            let (geometry, collision) = encode_layout(area, x, y)?;
            outputs.push((dir.join("geometry.bin"), geometry));
            outputs.push((dir.join("collision.bin"), collision));
        }
    }

    let mut report = ExportReport {
        layouts: area.width() * area.height(),
        tilesets: area.tilesets().len(),
        files: Vec::with_capacity(outputs.len()),
    };
    for (path, bytes) in outputs {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&path, bytes)?;
        report.files.push(path);
    }

    tracing::info!(
        layouts = report.layouts,
        tilesets = report.tilesets,
        files = report.files.len(),
        "area exported"
    );
    Ok(report)
}
