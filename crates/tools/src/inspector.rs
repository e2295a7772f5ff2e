use tilespace_common::{MAP_LAYERS, MapCoord, MapId};
use tilespace_kernel::Area;

/// Area inspector for developer tooling.
///
/// Read-only queries against an area for debugging and development UI.
pub struct AreaInspector;

impl AreaInspector {
    /// Produce a summary of the area state.
    pub fn summary(area: &Area) -> AreaSummary {
        let mut summary = AreaSummary {
            name: area.name().to_owned(),
            width: area.width(),
            height: area.height(),
            tilesets: area.tilesets().len(),
            populated_maps: 0,
            placed_tiles: 0,
            dirty_maps: 0,
            undo_depth: 0,
        };
        for (_, map) in area.maps() {
            summary.populated_maps += 1;
            summary.placed_tiles += map.placed_count();
            summary.undo_depth += map.undo_count();
            if map.is_dirty() {
                summary.dirty_maps += 1;
            }
        }
        summary
    }

    /// Per-layer occupancy and history of the map at `coord`.
    pub fn inspect_map(area: &Area, coord: MapCoord) -> Option<MapInfo> {
        let map = area.map_at(coord)?;
        let mut layers = [0usize; MAP_LAYERS];
        for (layer, _, _, _) in map.placed() {
            layers[layer] += 1;
        }
        Some(MapInfo {
            coord,
            id: map.id(),
            layers,
            undo: map.undo_count(),
            redo: map.redo_count(),
            dirty: map.is_dirty(),
        })
    }

    /// Coordinates of every populated map, row-major.
    pub fn list_maps(area: &Area) -> Vec<MapCoord> {
        area.maps().map(|(coord, _)| coord).collect()
    }
}

/// Summary of area state for the inspector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AreaSummary {
    pub name: String,
    pub width: usize,
    pub height: usize,
    pub tilesets: usize,
    pub populated_maps: usize,
    pub placed_tiles: usize,
    pub dirty_maps: usize,
    /// Undo entries summed over all maps.
    pub undo_depth: usize,
}

impl std::fmt::Display for AreaSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Area {:?}: {}x{} maps={} tiles={} dirty={} undo={} tilesets={}",
            self.name,
            self.width,
            self.height,
            self.populated_maps,
            self.placed_tiles,
            self.dirty_maps,
            self.undo_depth,
            self.tilesets,
        )
    }
}

/// Detailed info about a single map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MapInfo {
    pub coord: MapCoord,
    pub id: MapId,
    /// Placed tiles per layer.
    pub layers: [usize; MAP_LAYERS],
    pub undo: usize,
    pub redo: usize,
    pub dirty: bool,
}

impl MapInfo {
    pub fn placed(&self) -> usize {
        self.layers.iter().sum()
    }

    /// Layers holding at least one tile.
    pub fn occupied_layers(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.layers
            .iter()
            .copied()
            .enumerate()
            .filter(|(_, count)| *count > 0)
    }
}

impl std::fmt::Display for MapInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Map ({}, {}) [{:.8}] tiles={} undo={} redo={}{}",
            self.coord.x,
            self.coord.y,
            self.id.0.to_string(),
            self.placed(),
            self.undo,
            self.redo,
            if self.dirty { " dirty" } else { "" },
        )?;
        for (layer, count) in self.occupied_layers() {
            write!(f, " L{layer}:{count}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilespace_common::TileRef;

    fn area() -> Area {
        let mut area = Area::new("inspect", 2, 1);
        let (_, map) = area.get_or_create_map(0, 0);
        map.set_tile(0, 0, 0, TileRef::new(0, 1)).unwrap();
        map.set_tile(0, 1, 0, TileRef::new(0, 1)).unwrap();
        map.set_tile(3, 1, 0, TileRef::new(0, 2)).unwrap();
        area
    }

    #[test]
    fn summary_empty_area() {
        let summary = AreaInspector::summary(&Area::new("empty", 3, 2));
        assert_eq!((summary.width, summary.height), (3, 2));
        assert_eq!(summary.populated_maps, 0);
        assert_eq!(summary.placed_tiles, 0);
    }

    #[test]
    fn summary_counts_tiles_and_history() {
        let summary = AreaInspector::summary(&area());
        assert_eq!(summary.populated_maps, 1);
        assert_eq!(summary.placed_tiles, 3);
        assert_eq!(summary.dirty_maps, 1);
        assert_eq!(summary.undo_depth, 3);
    }

    #[test]
    fn map_layer_occupancy() {
        let area = area();
        let info = AreaInspector::inspect_map(&area, MapCoord::new(0, 0)).unwrap();
        assert_eq!(info.layers[0], 2);
        assert_eq!(info.layers[3], 1);
        assert_eq!(info.placed(), 3);
        assert_eq!(info.occupied_layers().collect::<Vec<_>>(), vec![(0, 2), (3, 1)]);
        assert!(AreaInspector::inspect_map(&area, MapCoord::new(1, 0)).is_none());
    }

    #[test]
    fn list_maps_skips_empty_cells() {
        let mut area = area();
        area.get_or_create_map(1, 0);
        assert_eq!(
            AreaInspector::list_maps(&area),
            vec![MapCoord::new(0, 0), MapCoord::new(1, 0)]
        );
    }

    #[test]
    fn display_formats() {
        let area = area();
        let s = format!("{}", AreaInspector::summary(&area));
        assert!(s.contains("2x1"));
        assert!(s.contains("tiles=3"));
        let info = AreaInspector::inspect_map(&area, MapCoord::new(0, 0)).unwrap();
        assert!(format!("{info}").contains("L3:1"));
    }
}
