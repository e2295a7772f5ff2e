use std::collections::HashMap;
use std::path::PathBuf;

use tilespace_common::{MAP_CELLS, Tileset};
use tilespace_kernel::{Area, Map};

use crate::codec::{PersistError, Reader, Writer, check_limit, pack_tile, unpack_tile};
use crate::tileset::decode_tileset;

/// "GBM " on disk.
pub const AREA_MAGIC: u32 = 0x204D_4247;
pub const AREA_VERSION: u16 = 1;

/// Path of a tileset relative to the tileset root: `<type>/<name>.gbts`.
pub fn tileset_path(tileset: &Tileset) -> String {
    format!("{}/{}.gbts", tileset.kind.dir_name(), tileset.name)
}

/// Resolves tileset paths named by an area file.
pub trait TilesetSource {
    fn load_tileset(&self, path: &str) -> Result<Tileset, PersistError>;
}

/// Reads tileset files below a root directory.
#[derive(Debug, Clone)]
pub struct DirTilesetSource {
    root: PathBuf,
}

impl DirTilesetSource {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl TilesetSource for DirTilesetSource {
    fn load_tileset(&self, path: &str) -> Result<Tileset, PersistError> {
        let bytes = std::fs::read(self.root.join(path)).map_err(|e| match e.kind() {
            std::io::ErrorKind::NotFound => PersistError::MissingTileset(path.to_owned()),
            _ => PersistError::Io(e),
        })?;
        let tileset = decode_tileset(&bytes)?;
        tracing::debug!(path, tiles = tileset.len(), "tileset loaded");
        Ok(tileset)
    }
}

/// Tilesets held in memory, keyed by their relative path.
#[derive(Debug, Clone, Default)]
pub struct MemoryTilesetSource {
    tilesets: HashMap<String, Tileset>,
}

impl MemoryTilesetSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, tileset: Tileset) {
        self.tilesets.insert(tileset_path(&tileset), tileset);
    }
}

impl TilesetSource for MemoryTilesetSource {
    fn load_tileset(&self, path: &str) -> Result<Tileset, PersistError> {
        self.tilesets
            .get(path)
            .cloned()
            .ok_or_else(|| PersistError::MissingTileset(path.to_owned()))
    }
}

/// Encode an area. Every limit is checked before the first byte is produced,
/// and unpopulated cells are written as all-empty maps.
pub fn encode_area(area: &Area) -> Result<Vec<u8>, PersistError> {
    check_limit("area width", area.width(), u8::MAX as usize)?;
    check_limit("area height", area.height(), u8::MAX as usize)?;
    check_limit("tileset count", area.tilesets().len(), u8::MAX as usize)?;

    let mut w = Writer::new();
    w.u32(AREA_MAGIC);
    w.u16(AREA_VERSION);
    w.str16("area name", area.name())?;
    w.u8(area.width() as u8);
    w.u8(area.height() as u8);
    w.u8(area.tilesets().len() as u8);
    for tileset in area.tilesets() {
        w.str16("tileset path", &tileset_path(tileset))?;
    }

    for y in 0..area.height() as i32 {
        for x in 0..area.width() as i32 {
            match area.get_map(x, y) {
                Some(map) => write_map(&mut w, map)?,
                None => {
                    for _ in 0..MAP_CELLS {
                        w.u16(0);
                    }
                }
            }
        }
    }
    Ok(w.into_bytes())
}

/// Decode an area, loading its tilesets through `source`. Every cell comes
/// back populated and every map clean.
pub fn decode_area(bytes: &[u8], source: &dyn TilesetSource) -> Result<Area, PersistError> {
    let mut r = Reader::new(bytes);
    r.header(AREA_MAGIC, AREA_VERSION)?;
    let name = r.str16()?;
    let width = r.u8()? as usize;
    let height = r.u8()? as usize;

    let tileset_count = r.u8()?;
    let mut tilesets = Vec::with_capacity(tileset_count as usize);
    for _ in 0..tileset_count {
        let path = r.str16()?;
        tilesets.push(source.load_tileset(&path)?);
    }

    let mut maps = Vec::with_capacity(width * height);
    for _ in 0..width * height {
        maps.push(Some(read_map(&mut r)?));
    }

    Ok(Area::from_parts(name, width, height, maps, tilesets)?)
}

/// Packed cells of one map in layer, row, column order.
pub fn write_map(w: &mut Writer, map: &Map) -> Result<(), PersistError> {
    for &tile in map.tiles() {
        w.u16(pack_tile(tile)?);
    }
    Ok(())
}

/// Inverse of `write_map`. The map comes back with empty history and clean.
pub fn read_map(r: &mut Reader<'_>) -> Result<Map, PersistError> {
    let mut tiles = Vec::with_capacity(MAP_CELLS);
    for _ in 0..MAP_CELLS {
        tiles.push(unpack_tile(r.u16()?));
    }
    Ok(Map::from_tiles(tiles)?)
}
