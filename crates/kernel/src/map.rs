use serde::{Deserialize, Serialize};
use tilespace_common::{MAP_CELLS, MAP_HEIGHT, MAP_LAYERS, MAP_WIDTH, MapId, TileRef};

use crate::command::{EditCommand, History, TileEdit};

/// Errors from grid operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GridError {
    #[error("cell (layer {layer}, x {x}, y {y}) is outside the map")]
    OutOfBounds { layer: usize, x: usize, y: usize },
    #[error("grid needs {expected} cells, got {actual}")]
    SizeMismatch { expected: usize, actual: usize },
}

/// Notification produced by every visible change to a map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MapEvent {
    /// A cell was edited through `set_tile`.
    TileChanged {
        layer: usize,
        x: usize,
        y: usize,
        old: TileRef,
        new: TileRef,
    },
    /// A batch was closed and became one undo entry.
    BatchCommitted { edits: usize },
    /// An undo entry was reverted.
    Undone { edits: usize },
    /// A reverted entry was re-applied.
    Redone { edits: usize },
}

/// Undrained notifications kept per map; older ones are dropped first.
pub const MAX_PENDING_EVENTS: usize = 4096;

/// One fixed-size layered tile grid with its own edit history.
///
/// Cells are mutated only through `set_tile`, `flood_fill`, `undo` and
/// `redo`. The grid is not `Clone`: a map's identity is unique within an area.
pub struct Map {
    id: MapId,
    tiles: Vec<TileRef>,
    history: History,
    dirty: bool,
    preview_dirty: bool,
    events: Vec<MapEvent>,
}

impl Map {
    /// Create an empty map: every cell holds `TileRef::EMPTY`.
    pub fn new() -> Self {
        Self {
            id: MapId::new(),
            tiles: vec![TileRef::EMPTY; MAP_CELLS],
            history: History::new(),
            dirty: false,
            preview_dirty: true,
            events: Vec::new(),
        }
    }

    /// Build a clean map from a full layer-major cell array (used by loaders).
    pub fn from_tiles(tiles: Vec<TileRef>) -> Result<Self, GridError> {
        if tiles.len() != MAP_CELLS {
            return Err(GridError::SizeMismatch {
                expected: MAP_CELLS,
                actual: tiles.len(),
            });
        }
        Ok(Self {
            tiles,
            ..Self::new()
        })
    }

    pub fn id(&self) -> MapId {
        self.id
    }

    /// Flat index of a cell, or `None` when outside the grid.
    pub fn index(layer: usize, x: usize, y: usize) -> Option<usize> {
        (layer < MAP_LAYERS && x < MAP_WIDTH && y < MAP_HEIGHT)
            .then(|| (layer * MAP_HEIGHT + y) * MAP_WIDTH + x)
    }

    pub fn tile(&self, layer: usize, x: usize, y: usize) -> Option<TileRef> {
        Self::index(layer, x, y).map(|i| self.tiles[i])
    }

    /// All cells, layer-major then row-major.
    pub fn tiles(&self) -> &[TileRef] {
        &self.tiles
    }

    /// Cells of one layer, row-major.
    pub fn layer(&self, layer: usize) -> Option<&[TileRef]> {
        let plane = MAP_WIDTH * MAP_HEIGHT;
        (layer < MAP_LAYERS).then(|| &self.tiles[layer * plane..(layer + 1) * plane])
    }

    /// Non-empty cells as `(layer, x, y, tile)`.
    pub fn placed(&self) -> impl Iterator<Item = (usize, usize, usize, TileRef)> + '_ {
        self.tiles
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.is_empty())
            .map(|(i, t)| {
                let x = i % MAP_WIDTH;
                let y = (i / MAP_WIDTH) % MAP_HEIGHT;
                let layer = i / (MAP_WIDTH * MAP_HEIGHT);
                (layer, x, y, *t)
            })
    }

    pub fn placed_count(&self) -> usize {
        self.tiles.iter().filter(|t| !t.is_empty()).count()
    }

    /// Highest non-empty cell in a column, as `(layer, tile)`.
    pub fn topmost(&self, x: usize, y: usize) -> Option<(usize, TileRef)> {
        (0..MAP_LAYERS)
            .rev()
            .filter_map(|layer| self.tile(layer, x, y).map(|t| (layer, t)))
            .find(|(_, t)| !t.is_empty())
    }

    /// Place a tile and record it for undo.
    ///
    /// Returns `Ok(false)` when the cell already holds `tile`; nothing is
    /// recorded in that case.
    pub fn set_tile(
        &mut self,
        layer: usize,
        x: usize,
        y: usize,
        tile: TileRef,
    ) -> Result<bool, GridError> {
        let index = Self::index(layer, x, y).ok_or(GridError::OutOfBounds { layer, x, y })?;
        let old = self.tiles[index];
        if old == tile {
            return Ok(false);
        }

        self.history.record(TileEdit {
            layer,
            x,
            y,
            old,
            new: tile,
        });
        self.tiles[index] = tile;
        self.touch();
        self.emit(MapEvent::TileChanged {
            layer,
            x,
            y,
            old,
            new: tile,
        });
        Ok(true)
    }

    /// Group subsequent edits into one undo entry. Batches do not nest: a
    /// pending batch is replaced and its edits stay applied but leave history.
    pub fn begin_batch(&mut self) {
        if let Some(discarded) = self.history.begin_batch() {
            tracing::warn!(
                map = ?self.id,
                edits = discarded.len(),
                "pending batch replaced; its edits are no longer undoable"
            );
        }
    }

    /// Close the pending batch. Returns true if it produced an undo entry.
    pub fn end_batch(&mut self) -> bool {
        let edits = self.history.end_batch();
        if edits == 0 {
            return false;
        }
        tracing::debug!(map = ?self.id, edits, "batch committed");
        self.emit(MapEvent::BatchCommitted { edits });
        true
    }

    pub fn is_batching(&self) -> bool {
        self.history.is_batching()
    }

    /// Revert the last edit. Returns true if an operation was undone.
    ///
    /// A batch still open is committed first so it is what gets reverted.
    pub fn undo(&mut self) -> bool {
        self.end_batch();
        let Some(cmd) = self.history.undo() else {
            return false;
        };
        let inverse = cmd.inverse();
        apply_command(&mut self.tiles, &inverse);
        self.touch();
        self.emit(MapEvent::Undone {
            edits: inverse.len(),
        });
        true
    }

    /// Re-apply the last undone edit. Returns true if an operation was redone.
    pub fn redo(&mut self) -> bool {
        self.end_batch();
        let Some(cmd) = self.history.redo() else {
            return false;
        };
        apply_command(&mut self.tiles, cmd);
        let edits = cmd.len();
        self.touch();
        self.emit(MapEvent::Redone { edits });
        true
    }

    /// 4-connected fill of the region sharing the start cell's value.
    ///
    /// Each filled cell goes through `set_tile`, so without an enclosing batch
    /// the fill is undoable cell by cell. Returns the number of cells changed.
    pub fn flood_fill(
        &mut self,
        layer: usize,
        x: usize,
        y: usize,
        fill: TileRef,
    ) -> Result<usize, GridError> {
        let target = self
            .tile(layer, x, y)
            .ok_or(GridError::OutOfBounds { layer, x, y })?;
        if target == fill {
            return Ok(0);
        }

        let mut visited = vec![false; MAP_WIDTH * MAP_HEIGHT];
        let mut stack = vec![(x, y)];
        let mut filled = 0;

        while let Some((cx, cy)) = stack.pop() {
            let seen = &mut visited[cy * MAP_WIDTH + cx];
            if *seen {
                continue;
            }
            *seen = true;

            if self.tile(layer, cx, cy) != Some(target) {
                continue;
            }
            if self.set_tile(layer, cx, cy, fill)? {
                filled += 1;
            }

            if cx > 0 {
                stack.push((cx - 1, cy));
            }
            if cx + 1 < MAP_WIDTH {
                stack.push((cx + 1, cy));
            }
            if cy > 0 {
                stack.push((cx, cy - 1));
            }
            if cy + 1 < MAP_HEIGHT {
                stack.push((cx, cy + 1));
            }
        }

        tracing::trace!(map = ?self.id, layer, filled, "flood fill complete");
        Ok(filled)
    }

    /// Unsaved changes since the last `mark_clean`.
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn mark_clean(&mut self) {
        self.dirty = false;
    }

    /// Whether a cached preview of this map is stale.
    pub fn preview_dirty(&self) -> bool {
        self.preview_dirty
    }

    pub fn clear_preview_dirty(&mut self) {
        self.preview_dirty = false;
    }

    pub fn undo_count(&self) -> usize {
        self.history.undo_count()
    }

    pub fn redo_count(&self) -> usize {
        self.history.redo_count()
    }

    pub fn can_undo(&self) -> bool {
        self.history.undo_count() > 0
    }

    pub fn can_redo(&self) -> bool {
        self.history.redo_count() > 0
    }

    /// Read-only access to pending notifications.
    pub fn events(&self) -> &[MapEvent] {
        &self.events
    }

    /// Drain and return pending notifications.
    pub fn drain_events(&mut self) -> Vec<MapEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: MapEvent) {
        if self.events.len() >= MAX_PENDING_EVENTS {
            let dropped = MAX_PENDING_EVENTS / 2;
            self.events.drain(..dropped);
            tracing::trace!(map = ?self.id, dropped, "undrained map events dropped");
        }
        self.events.push(event);
    }

    fn touch(&mut self) {
        self.dirty = true;
        self.preview_dirty = true;
    }
}

impl Default for Map {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Map {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Map")
            .field("id", &self.id)
            .field("placed", &self.placed_count())
            .field("dirty", &self.dirty)
            .field("undo", &self.history.undo_count())
            .field("redo", &self.history.redo_count())
            .finish()
    }
}

/// Write each edit's new value straight into the backing array.
fn apply_command(tiles: &mut [TileRef], cmd: &EditCommand) {
    for edit in cmd.edits() {
        if let Some(i) = Map::index(edit.layer, edit.x, edit.y) {
            tiles[i] = edit.new;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: TileRef = TileRef::new(0, 1);
    const B: TileRef = TileRef::new(0, 2);
    const C: TileRef = TileRef::new(1, 3);

    #[test]
    fn new_map_is_empty_and_clean() {
        let map = Map::new();
        assert_eq!(map.placed_count(), 0);
        assert!(!map.is_dirty());
        assert!(!map.can_undo());
        assert_eq!(map.tile(31, 31, 31), Some(TileRef::EMPTY));
        assert_eq!(map.tile(32, 0, 0), None);
    }

    #[test]
    fn set_tile_records_and_marks_dirty() {
        let mut map = Map::new();
        assert!(map.set_tile(2, 3, 4, A).unwrap());
        assert_eq!(map.tile(2, 3, 4), Some(A));
        assert!(map.is_dirty());
        assert_eq!(map.undo_count(), 1);
        assert_eq!(
            map.events(),
            &[MapEvent::TileChanged {
                layer: 2,
                x: 3,
                y: 4,
                old: TileRef::EMPTY,
                new: A
            }]
        );
    }

    #[test]
    fn set_same_tile_is_noop() {
        let mut map = Map::new();
        map.set_tile(0, 0, 0, A).unwrap();
        map.drain_events();
        assert!(!map.set_tile(0, 0, 0, A).unwrap());
        assert_eq!(map.undo_count(), 1);
        assert!(map.events().is_empty());
    }

    #[test]
    fn set_tile_out_of_bounds_errors() {
        let mut map = Map::new();
        let err = map.set_tile(0, MAP_WIDTH, 0, A).unwrap_err();
        assert_eq!(
            err,
            GridError::OutOfBounds {
                layer: 0,
                x: MAP_WIDTH,
                y: 0
            }
        );
    }

    #[test]
    fn undo_redo_single_edit() {
        let mut map = Map::new();
        map.set_tile(0, 1, 1, A).unwrap();
        assert!(map.undo());
        assert_eq!(map.tile(0, 1, 1), Some(TileRef::EMPTY));
        assert!(map.redo());
        assert_eq!(map.tile(0, 1, 1), Some(A));
    }

    #[test]
    fn undo_redo_empty_returns_false() {
        let mut map = Map::new();
        assert!(!map.undo());
        assert!(!map.redo());
    }

    #[test]
    fn undo_sequence_restores_initial_content() {
        let mut map = Map::new();
        map.set_tile(0, 0, 0, C).unwrap();
        map.mark_clean();
        let before = map.tiles().to_vec();

        let mut applied = 0;
        for i in 0..200usize {
            let tile = TileRef::new((i % 4) as u8, (i % 7) as u16);
            let changed = map
                .set_tile(i % 3, (i * 7) % MAP_WIDTH, (i * 13) % MAP_HEIGHT, tile)
                .unwrap();
            if changed {
                applied += 1;
            }
        }
        for _ in 0..applied {
            assert!(map.undo());
        }
        assert_eq!(map.tiles(), before.as_slice());

        for _ in 0..applied {
            assert!(map.redo());
        }
        assert!(!map.redo());
    }

    #[test]
    fn new_edit_clears_redo() {
        let mut map = Map::new();
        map.set_tile(0, 0, 0, A).unwrap();
        map.undo();
        assert!(map.can_redo());
        map.set_tile(0, 1, 0, B).unwrap();
        assert!(!map.can_redo());
    }

    #[test]
    fn batch_is_one_undo_unit() {
        let mut map = Map::new();
        map.begin_batch();
        for x in 0..5 {
            map.set_tile(1, x, 2, A).unwrap();
        }
        assert!(map.end_batch());
        assert_eq!(map.undo_count(), 1);

        assert!(map.undo());
        assert_eq!(map.placed_count(), 0);
        assert!(map.redo());
        assert_eq!(map.placed_count(), 5);
    }

    #[test]
    fn batch_with_repeated_cell_undoes_to_original() {
        let mut map = Map::new();
        map.begin_batch();
        map.set_tile(0, 0, 0, A).unwrap();
        map.set_tile(0, 0, 0, B).unwrap();
        map.end_batch();
        map.undo();
        assert_eq!(map.tile(0, 0, 0), Some(TileRef::EMPTY));
    }

    #[test]
    fn empty_batch_produces_no_entry() {
        let mut map = Map::new();
        map.begin_batch();
        map.set_tile(0, 0, 0, TileRef::EMPTY).unwrap();
        assert!(!map.end_batch());
        assert_eq!(map.undo_count(), 0);
        assert!(!map.is_batching());
    }

    #[test]
    fn undo_commits_open_batch_first() {
        let mut map = Map::new();
        map.begin_batch();
        map.set_tile(0, 0, 0, A).unwrap();
        map.set_tile(0, 1, 0, A).unwrap();
        assert!(map.undo());
        assert_eq!(map.placed_count(), 0);
        assert!(!map.is_batching());
    }

    #[test]
    fn undo_marks_dirty_and_emits_event() {
        let mut map = Map::new();
        map.set_tile(0, 0, 0, A).unwrap();
        map.mark_clean();
        map.drain_events();
        map.undo();
        assert!(map.is_dirty());
        assert_eq!(map.events(), &[MapEvent::Undone { edits: 1 }]);
    }

    #[test]
    fn flood_fill_stays_inside_boundary() {
        let mut map = Map::new();
        // 5x5 block of C with a 3x3 interior of A, at (10..15, 10..15).
        for y in 10..15 {
            for x in 10..15 {
                map.set_tile(0, x, y, C).unwrap();
            }
        }
        for y in 11..14 {
            for x in 11..14 {
                map.set_tile(0, x, y, A).unwrap();
            }
        }

        let filled = map.flood_fill(0, 12, 12, B).unwrap();
        assert_eq!(filled, 9);
        for y in 10..15 {
            for x in 10..15 {
                let inside = (11..14).contains(&x) && (11..14).contains(&y);
                let expected = if inside { B } else { C };
                assert_eq!(map.tile(0, x, y), Some(expected), "cell ({x}, {y})");
            }
        }
        // Outside the C ring nothing was touched.
        assert_eq!(map.tile(0, 0, 0), Some(TileRef::EMPTY));
    }

    #[test]
    fn flood_fill_only_touches_one_layer() {
        let mut map = Map::new();
        map.set_tile(1, 0, 0, A).unwrap();
        map.flood_fill(0, 0, 0, B).unwrap();
        assert_eq!(map.tile(1, 0, 0), Some(A));
        assert_eq!(map.layer(0).unwrap().iter().filter(|t| **t == B).count(), MAP_WIDTH * MAP_HEIGHT);
    }

    #[test]
    fn flood_fill_same_value_is_noop() {
        let mut map = Map::new();
        assert_eq!(map.flood_fill(0, 5, 5, TileRef::EMPTY).unwrap(), 0);
        assert_eq!(map.undo_count(), 0);
    }

    #[test]
    fn flood_fill_whole_layer_terminates_and_batches() {
        let mut map = Map::new();
        map.begin_batch();
        let filled = map.flood_fill(7, 31, 31, A).unwrap();
        map.end_batch();
        assert_eq!(filled, MAP_WIDTH * MAP_HEIGHT);
        assert_eq!(map.undo_count(), 1);
        map.undo();
        assert_eq!(map.placed_count(), 0);
    }

    #[test]
    fn flood_fill_without_batch_is_per_cell() {
        let mut map = Map::new();
        for x in 0..MAP_WIDTH {
            map.set_tile(0, x, 1, C).unwrap();
        }
        let before = map.undo_count();
        let filled = map.flood_fill(0, 0, 0, A).unwrap();
        assert_eq!(filled, MAP_WIDTH);
        assert_eq!(map.undo_count(), before + MAP_WIDTH);
    }

    #[test]
    fn flood_fill_out_of_bounds_errors() {
        let mut map = Map::new();
        assert!(map.flood_fill(0, MAP_WIDTH, 0, A).is_err());
        assert!(map.flood_fill(MAP_LAYERS, 0, 0, A).is_err());
    }

    #[test]
    fn from_tiles_checks_size() {
        assert!(Map::from_tiles(vec![TileRef::EMPTY; 10]).is_err());
        let map = Map::from_tiles(vec![A; MAP_CELLS]).unwrap();
        assert_eq!(map.placed_count(), MAP_CELLS);
        assert!(!map.is_dirty());
        assert!(!map.can_undo());
    }

    #[test]
    fn placed_reports_coordinates() {
        let mut map = Map::new();
        map.set_tile(3, 4, 5, B).unwrap();
        let placed: Vec<_> = map.placed().collect();
        assert_eq!(placed, vec![(3, 4, 5, B)]);
    }

    #[test]
    fn topmost_finds_highest_layer() {
        let mut map = Map::new();
        map.set_tile(1, 2, 2, A).unwrap();
        map.set_tile(6, 2, 2, B).unwrap();
        assert_eq!(map.topmost(2, 2), Some((6, B)));
        assert_eq!(map.topmost(0, 0), None);
    }

    #[test]
    fn undrained_events_stay_bounded() {
        let mut map = Map::new();
        for i in 0..3 * MAX_PENDING_EVENTS {
            let tile = if i % 2 == 0 { A } else { B };
            map.set_tile(0, 0, 0, tile).unwrap();
        }
        assert!(map.events().len() <= MAX_PENDING_EVENTS);
        assert_eq!(
            map.events().last(),
            Some(&MapEvent::TileChanged {
                layer: 0,
                x: 0,
                y: 0,
                old: A,
                new: B
            })
        );
        map.drain_events();
        assert!(map.events().is_empty());
    }
}
