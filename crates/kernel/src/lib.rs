//! Tile Kernel: authoritative tile grids and areas, the edit log, undo/redo and flood fill.
//!
//! # Invariants
//! - Grid cells change only through `Map::set_tile`, `flood_fill`, `undo` and `redo`.
//! - After any recorded edit the undo top is the inverse of that edit; new edits clear redo.
//! - Area growth preserves every map at its relative position.

pub mod area;
pub mod command;
pub mod map;

pub use area::{Area, AreaEvent, GrowthEdge, MapSlot};
pub use command::{EditCommand, History, TileEdit};
pub use map::{GridError, MAX_PENDING_EVENTS, Map, MapEvent};

pub fn crate_info() -> &'static str {
    "tilespace-kernel v0.1.0"
}
