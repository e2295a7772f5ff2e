use glam::Vec2;
use tilespace_common::{MapCoord, TileRef};

/// A cell addressed relative to a map.
///
/// `tile_x` and `tile_y` are signed so a drag can run past the map border;
/// the editor redirects such positions into the neighbouring map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GridPos {
    pub layer: usize,
    pub map_x: i32,
    pub map_y: i32,
    pub tile_x: i32,
    pub tile_y: i32,
}

impl GridPos {
    pub fn new(layer: usize, map: MapCoord, tile_x: i32, tile_y: i32) -> Self {
        Self {
            layer,
            map_x: map.x as i32,
            map_y: map.y as i32,
            tile_x,
            tile_y,
        }
    }
}

/// What a primary click does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Tool {
    #[default]
    Paint,
    Erase,
    Fill,
    /// Eyedropper: select the tile under the cursor.
    Pick,
}

/// A high-level editing action.
///
/// UI shells translate their own events into actions; the authoring layer
/// consumes only these.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Action {
    /// Apply the current tool at a position.
    Use(GridPos),
    /// Place the selected tile.
    Paint(GridPos),
    /// Place a specific tile.
    Place { at: GridPos, tile: TileRef },
    /// Clear a cell to empty.
    Erase(GridPos),
    /// Flood fill with the selected tile.
    Fill(GridPos),
    /// Select the tile under the cursor.
    Pick(GridPos),
    /// Start of a drag gesture; edits until `EndStroke` undo as one step per map.
    BeginStroke,
    EndStroke,
    Undo,
    Redo,
    SelectLayer(usize),
    SelectMap(MapCoord),
    SelectTile(TileRef),
    SelectTool(Tool),
    /// Rotate the camera by a drag delta.
    Orbit(Vec2),
    /// Positive zooms in.
    Zoom(f32),
    /// Slide the camera target by a drag delta.
    Pan(Vec2),
    ResetCamera,
    /// Unbound input.
    Noop,
}

impl Action {
    /// Build the action for a raw placement request from a UI shell.
    #[allow(clippy::too_many_arguments)]
    pub fn placement(
        layer: usize,
        map_x: i32,
        map_y: i32,
        tile_x: i32,
        tile_y: i32,
        tileset: u8,
        tile_id: u16,
        erase: bool,
    ) -> Self {
        let at = GridPos {
            layer,
            map_x,
            map_y,
            tile_x,
            tile_y,
        };
        if erase {
            Self::Erase(at)
        } else {
            Self::Place {
                at,
                tile: TileRef::new(tileset, tile_id),
            }
        }
    }

    /// Whether the action changes grid content.
    pub fn is_edit(&self) -> bool {
        matches!(
            self,
            Self::Use(_) | Self::Paint(_) | Self::Place { .. } | Self::Erase(_) | Self::Fill(_)
        )
    }

    /// Whether the action only moves the camera.
    pub fn is_camera(&self) -> bool {
        matches!(
            self,
            Self::Orbit(_) | Self::Zoom(_) | Self::Pan(_) | Self::ResetCamera
        )
    }
}
