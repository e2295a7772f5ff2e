//! Persistence: binary area and tileset formats, the project store and runtime export.
//!
//! # Invariants
//! - All multi-byte values are little-endian; every file starts with magic and version.
//! - Unknown versions, unknown enum tags and truncated input fail the whole load.
//! - Limits are checked while encoding into memory, before any file is written.

pub mod area;
pub mod codec;
pub mod export;
pub mod store;
pub mod tileset;

pub use area::{
    AREA_MAGIC, AREA_VERSION, DirTilesetSource, MemoryTilesetSource, TilesetSource, decode_area,
    encode_area, read_map, tileset_path, write_map,
};
pub use codec::{PersistError, pack_tile, unpack_tile};
pub use export::{ExportReport, encode_layout, encode_runtime_tileset, export_area, slug};
pub use store::ProjectStore;
pub use tileset::{TILESET_MAGIC, TILESET_VERSION, decode_tileset, encode_tileset};

pub fn crate_info() -> &'static str {
    "tilespace-persist v0.1.0"
}
