//! Shared types: tile references, grid constants, tilesets, meshes and textures.
//!
//! # Invariants
//! - `TileRef` identity is bitwise; `tile_id == 0` is always empty.
//! - A `Texture` always holds exactly `width * height` pixels.

pub mod tileset;
pub mod types;

pub use tileset::{
    CollisionType, Mesh, RenderPrimitive, Texture, TextureSizeError, TileDefinition, Tileset,
    TilesetType, Vertex,
};
pub use types::{MAP_CELLS, MAP_HEIGHT, MAP_LAYERS, MAP_WIDTH, MapCoord, MapId, TileRef, UnknownTag};

pub fn crate_info() -> &'static str {
    "tilespace-common v0.1.0"
}
