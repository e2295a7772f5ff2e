use std::sync::mpsc;

use serde::{Deserialize, Serialize};
use tilespace_common::{MapCoord, MapId, TileDefinition, TileRef, Tileset};

use crate::map::{GridError, Map};

/// Side of an area that grows by one row or column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GrowthEdge {
    North,
    South,
    East,
    West,
}

/// Structural change notification. Delivered to every subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum AreaEvent {
    /// One row or column was added; existing maps kept their relative layout.
    Expanded {
        edge: GrowthEdge,
        width: usize,
        height: usize,
    },
    /// A fresh empty map was installed.
    MapCreated { coord: MapCoord, id: MapId },
    /// A map was installed over whatever occupied the cell.
    MapReplaced { coord: MapCoord, id: MapId },
    /// A tileset was appended at `index`.
    TilesetAdded { index: usize },
    Renamed { name: String },
}

/// Result of `get_or_create_map`: where the target ended up after growth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MapSlot {
    /// Final coordinate of the requested map.
    pub coord: MapCoord,
    /// Columns every pre-existing map moved east (west growth).
    pub shift_x: usize,
    /// Rows every pre-existing map moved south (north growth).
    pub shift_y: usize,
    /// Whether a new map was installed at `coord`.
    pub created: bool,
}

impl MapSlot {
    /// Re-derive a coordinate captured before this call.
    pub fn shifted(&self, coord: MapCoord) -> MapCoord {
        MapCoord::new(coord.x + self.shift_x, coord.y + self.shift_y)
    }
}

/// A named, growable 2D grid of optional maps sharing one tileset list.
#[derive(Debug)]
pub struct Area {
    name: String,
    width: usize,
    height: usize,
    /// Row-major, `width * height` entries.
    maps: Vec<Option<Map>>,
    tilesets: Vec<Tileset>,
    dirty: bool,
    subscribers: Vec<mpsc::Sender<AreaEvent>>,
}

impl Area {
    /// Create an area with every cell unpopulated.
    pub fn new(name: impl Into<String>, width: usize, height: usize) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            maps: std::iter::repeat_with(|| None).take(width * height).collect(),
            tilesets: Vec::new(),
            dirty: false,
            subscribers: Vec::new(),
        }
    }

    /// Assemble a clean area from loaded parts.
    pub fn from_parts(
        name: impl Into<String>,
        width: usize,
        height: usize,
        maps: Vec<Option<Map>>,
        tilesets: Vec<Tileset>,
    ) -> Result<Self, GridError> {
        if maps.len() != width * height {
            return Err(GridError::SizeMismatch {
                expected: width * height,
                actual: maps.len(),
            });
        }
        Ok(Self {
            maps,
            tilesets,
            ..Self::new(name, width, height)
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.dirty = true;
        self.notify(AreaEvent::Renamed {
            name: self.name.clone(),
        });
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        let x = usize::try_from(x).ok()?;
        let y = usize::try_from(y).ok()?;
        (x < self.width && y < self.height).then(|| y * self.width + x)
    }

    /// Map at `(x, y)`; `None` when out of range or unpopulated.
    pub fn get_map(&self, x: i32, y: i32) -> Option<&Map> {
        self.index(x, y).and_then(|i| self.maps[i].as_ref())
    }

    pub fn get_map_mut(&mut self, x: i32, y: i32) -> Option<&mut Map> {
        self.index(x, y).and_then(|i| self.maps[i].as_mut())
    }

    pub fn has_map(&self, x: i32, y: i32) -> bool {
        self.get_map(x, y).is_some()
    }

    /// Map at an unsigned coordinate.
    pub fn map_at(&self, coord: MapCoord) -> Option<&Map> {
        self.get_map(i32::try_from(coord.x).ok()?, i32::try_from(coord.y).ok()?)
    }

    pub fn map_at_mut(&mut self, coord: MapCoord) -> Option<&mut Map> {
        self.get_map_mut(i32::try_from(coord.x).ok()?, i32::try_from(coord.y).ok()?)
    }

    /// Populated maps with their coordinates, row-major.
    pub fn maps(&self) -> impl Iterator<Item = (MapCoord, &Map)> + '_ {
        let width = self.width.max(1);
        self.maps
            .iter()
            .enumerate()
            .filter_map(move |(i, m)| m.as_ref().map(|m| (MapCoord::new(i % width, i / width), m)))
    }

    pub fn maps_mut(&mut self) -> impl Iterator<Item = (MapCoord, &mut Map)> + '_ {
        let width = self.width.max(1);
        self.maps
            .iter_mut()
            .enumerate()
            .filter_map(move |(i, m)| m.as_mut().map(|m| (MapCoord::new(i % width, i / width), m)))
    }

    pub fn populated_count(&self) -> usize {
        self.maps.iter().flatten().count()
    }

    /// Current coordinate of the map with identity `id`.
    pub fn find_map(&self, id: MapId) -> Option<MapCoord> {
        self.maps().find(|(_, m)| m.id() == id).map(|(c, _)| c)
    }

    /// Return the map at `(x, y)`, growing the area and installing an empty
    /// map when needed.
    ///
    /// An axis outside the bounds grows by exactly one unit on that side.
    /// West or north growth shifts every existing map and puts the target at
    /// index 0 on that axis; east or south growth puts it at the old extent.
    pub fn get_or_create_map(&mut self, x: i32, y: i32) -> (MapSlot, &mut Map) {
        let (col, shift_x, grow_x) = if x < 0 {
            (0, 1, Some(GrowthEdge::West))
        } else if x as usize >= self.width {
            (self.width, 0, Some(GrowthEdge::East))
        } else {
            (x as usize, 0, None)
        };
        let (row, shift_y, grow_y) = if y < 0 {
            (0, 1, Some(GrowthEdge::North))
        } else if y as usize >= self.height {
            (self.height, 0, Some(GrowthEdge::South))
        } else {
            (y as usize, 0, None)
        };

        for edge in [grow_x, grow_y].into_iter().flatten() {
            self.expand(edge);
        }

        let coord = MapCoord::new(col, row);
        let index = row * self.width + col;
        let created = self.maps[index].is_none();
        if created {
            let map = Map::new();
            let id = map.id();
            self.maps[index] = Some(map);
            self.dirty = true;
            tracing::debug!(x = col, y = row, ?id, "map created");
            self.notify(AreaEvent::MapCreated { coord, id });
        }

        let slot = MapSlot {
            coord,
            shift_x,
            shift_y,
            created,
        };
        (slot, self.maps[index].get_or_insert_with(Map::new))
    }

    /// Install `map` at `coord`, returning the previous occupant.
    ///
    /// Fails with the map handed back when `coord` is outside the area.
    pub fn set_map(&mut self, coord: MapCoord, map: Map) -> Result<Option<Map>, Map> {
        if coord.x >= self.width || coord.y >= self.height {
            return Err(map);
        }
        let id = map.id();
        let previous = self.maps[coord.y * self.width + coord.x].replace(map);
        self.dirty = true;
        self.notify(AreaEvent::MapReplaced { coord, id });
        Ok(previous)
    }

    /// Add one row or column on `edge`. Existing maps are moved into a fresh
    /// backing vector at their shifted positions.
    pub fn expand(&mut self, edge: GrowthEdge) {
        let (new_width, new_height, dx, dy) = match edge {
            GrowthEdge::West => (self.width + 1, self.height, 1, 0),
            GrowthEdge::East => (self.width + 1, self.height, 0, 0),
            GrowthEdge::North => (self.width, self.height + 1, 0, 1),
            GrowthEdge::South => (self.width, self.height + 1, 0, 0),
        };

        let mut grown: Vec<Option<Map>> = std::iter::repeat_with(|| None)
            .take(new_width * new_height)
            .collect();
        for y in 0..self.height {
            for x in 0..self.width {
                grown[(y + dy) * new_width + (x + dx)] = self.maps[y * self.width + x].take();
            }
        }

        self.maps = grown;
        self.width = new_width;
        self.height = new_height;
        self.dirty = true;
        tracing::debug!(?edge, width = new_width, height = new_height, "area expanded");
        self.notify(AreaEvent::Expanded {
            edge,
            width: new_width,
            height: new_height,
        });
    }

    pub fn tilesets(&self) -> &[Tileset] {
        &self.tilesets
    }

    /// Append a tileset and return its index.
    pub fn add_tileset(&mut self, tileset: Tileset) -> usize {
        self.tilesets.push(tileset);
        let index = self.tilesets.len() - 1;
        self.dirty = true;
        self.notify(AreaEvent::TilesetAdded { index });
        index
    }

    pub fn tileset_mut(&mut self, index: usize) -> Option<&mut Tileset> {
        self.tilesets.get_mut(index)
    }

    /// Definition a cell refers to. Empty or dangling references yield `None`.
    pub fn resolve(&self, tile: TileRef) -> Option<&TileDefinition> {
        if tile.is_empty() {
            return None;
        }
        self.tilesets
            .get(tile.tileset as usize)?
            .tile(tile.tile_id)
    }

    /// Receive every future `AreaEvent`. Closed receivers are dropped lazily.
    pub fn subscribe(&mut self) -> mpsc::Receiver<AreaEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    fn notify(&mut self, event: AreaEvent) {
        self.subscribers.retain(|tx| tx.send(event.clone()).is_ok());
    }

    /// Structural changes or any map edits not yet saved.
    pub fn is_dirty(&self) -> bool {
        self.dirty || self.maps.iter().flatten().any(Map::is_dirty)
    }

    /// Mark the area and all of its maps as saved.
    pub fn mark_clean(&mut self) {
        self.dirty = false;
        for map in self.maps.iter_mut().flatten() {
            map.mark_clean();
        }
    }
}
