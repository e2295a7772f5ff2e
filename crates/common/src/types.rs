use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Columns per map.
pub const MAP_WIDTH: usize = 32;
/// Rows per map.
pub const MAP_HEIGHT: usize = 32;
/// Stacked layers per map.
pub const MAP_LAYERS: usize = 32;
/// Total tile cells in one map.
pub const MAP_CELLS: usize = MAP_LAYERS * MAP_HEIGHT * MAP_WIDTH;

/// Reference from a grid cell to a tile definition.
///
/// Identity is the `(tileset, tile_id)` pair, compared bit-for-bit.
/// `tile_id == 0` is the empty/air sentinel regardless of the tileset index.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub struct TileRef {
    /// Index into the owning area's tileset list.
    pub tileset: u8,
    /// Position of the definition inside that tileset.
    pub tile_id: u16,
}

impl TileRef {
    /// The empty cell value.
    pub const EMPTY: Self = Self {
        tileset: 0,
        tile_id: 0,
    };

    pub const fn new(tileset: u8, tile_id: u16) -> Self {
        Self { tileset, tile_id }
    }

    /// Whether this cell holds no tile.
    pub const fn is_empty(self) -> bool {
        self.tile_id == 0
    }
}

/// Stable identity of a map, unaffected by area re-indexing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MapId(pub Uuid);

impl MapId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for MapId {
    fn default() -> Self {
        Self::new()
    }
}

/// Position of a map cell inside an area.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MapCoord {
    pub x: usize,
    pub y: usize,
}

impl MapCoord {
    pub const fn new(x: usize, y: usize) -> Self {
        Self { x, y }
    }
}

/// A byte tag that does not name any variant of the target enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} tag {value:#04x}")]
pub struct UnknownTag {
    pub kind: &'static str,
    pub value: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn map_id_uniqueness() {
        let a = MapId::new();
        let b = MapId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn default_tile_ref_is_empty() {
        assert_eq!(TileRef::default(), TileRef::EMPTY);
        assert!(TileRef::default().is_empty());
    }

    #[test]
    fn zero_tile_id_is_empty_in_any_tileset() {
        assert!(TileRef::new(3, 0).is_empty());
        assert!(!TileRef::new(0, 1).is_empty());
    }

    #[test]
    fn equality_is_bitwise() {
        assert_ne!(TileRef::new(0, 5), TileRef::new(1, 5));
        assert_eq!(TileRef::new(2, 7), TileRef::new(2, 7));
    }

    #[test]
    fn cell_count_matches_dimensions() {
        assert_eq!(MAP_CELLS, 32 * 32 * 32);
    }
}
