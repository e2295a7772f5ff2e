use std::sync::mpsc;

use tilespace_common::{MAP_LAYERS, MapCoord, MapId, TileRef};
use tilespace_input::{Action, GridPos, Tool};
use tilespace_kernel::{Area, GridError, Map, MapEvent};
use tilespace_render::{CameraConfig, OrbitCamera};

use crate::edge::{MapEdge, redirect};

/// Errors from editing actions.
#[derive(Debug, thiserror::Error)]
pub enum EditError {
    #[error("no map at ({x}, {y})")]
    NoMap { x: i32, y: i32 },
    #[error("layer {0} is out of range")]
    LayerOutOfRange(usize),
    #[error(transparent)]
    Grid(#[from] GridError),
}

/// Selection state shared by the editing tools.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorState {
    pub layer: usize,
    pub active_map: MapCoord,
    pub selected: Option<TileRef>,
    pub tool: Tool,
}

impl Default for EditorState {
    fn default() -> Self {
        Self {
            layer: 0,
            active_map: MapCoord::new(0, 0),
            selected: None,
            tool: Tool::Paint,
        }
    }
}

/// Maps touched during one drag gesture.
#[derive(Debug, Default)]
struct Stroke {
    /// Maps with a batch opened by this stroke, by identity so growth cannot
    /// invalidate them.
    batched: Vec<MapId>,
    /// Whether this stroke already created a map across an edge.
    created_map: bool,
}

/// Editing session: owns the area, the tool state and the viewport camera.
///
/// Every mutation flows through `apply`.
#[derive(Debug)]
pub struct Editor {
    area: Area,
    state: EditorState,
    camera: OrbitCamera,
    stroke: Option<Stroke>,
    subscribers: Vec<mpsc::Sender<(MapId, MapEvent)>>,
}

impl Editor {
    pub fn new(area: Area, camera: CameraConfig) -> Self {
        let active_map = area
            .maps()
            .next()
            .map_or(MapCoord::new(0, 0), |(coord, _)| coord);
        Self {
            area,
            state: EditorState {
                active_map,
                ..EditorState::default()
            },
            camera: OrbitCamera::new(camera),
            stroke: None,
            subscribers: Vec::new(),
        }
    }

    pub fn area(&self) -> &Area {
        &self.area
    }

    /// Direct access for saving and tileset management.
    pub fn area_mut(&mut self) -> &mut Area {
        &mut self.area
    }

    pub fn into_area(self) -> Area {
        self.area
    }

    pub fn state(&self) -> &EditorState {
        &self.state
    }

    pub fn camera(&self) -> &OrbitCamera {
        &self.camera
    }

    pub fn active_map(&self) -> Option<&Map> {
        self.area.map_at(self.state.active_map)
    }

    pub fn in_stroke(&self) -> bool {
        self.stroke.is_some()
    }

    /// Receive every map notification produced by subsequent actions.
    pub fn subscribe(&mut self) -> mpsc::Receiver<(MapId, MapEvent)> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    /// Apply one action. Returns true if grid content changed.
    ///
    /// Map notifications are drained afterwards and forwarded to subscribers.
    pub fn apply(&mut self, action: Action) -> Result<bool, EditError> {
        let result = self.dispatch(action);
        self.flush_events();
        result
    }

    fn flush_events(&mut self) {
        let subscribers = &mut self.subscribers;
        for (_, map) in self.area.maps_mut() {
            let id = map.id();
            for event in map.drain_events() {
                subscribers.retain(|tx| tx.send((id, event)).is_ok());
            }
        }
    }

    fn dispatch(&mut self, action: Action) -> Result<bool, EditError> {
        match action {
            Action::Use(at) => match self.state.tool {
                Tool::Paint => self.paint(at),
                Tool::Erase => self.place(at, TileRef::EMPTY),
                Tool::Fill => self.fill(at),
                Tool::Pick => self.pick(at).map(|_| false),
            },
            Action::Paint(at) => self.paint(at),
            Action::Place { at, tile } => self.place(at, tile),
            Action::Erase(at) => self.place(at, TileRef::EMPTY),
            Action::Fill(at) => self.fill(at),
            Action::Pick(at) => self.pick(at).map(|_| false),
            Action::BeginStroke => {
                self.begin_stroke();
                Ok(false)
            }
            Action::EndStroke => {
                self.end_stroke();
                Ok(false)
            }
            Action::Undo => Ok(self.undo()),
            Action::Redo => Ok(self.redo()),
            Action::SelectLayer(layer) => {
                if layer >= MAP_LAYERS {
                    return Err(EditError::LayerOutOfRange(layer));
                }
                self.state.layer = layer;
                Ok(false)
            }
            Action::SelectMap(coord) => {
                if self.area.map_at(coord).is_none() {
                    return Err(EditError::NoMap {
                        x: coord.x as i32,
                        y: coord.y as i32,
                    });
                }
                self.end_stroke();
                self.state.active_map = coord;
                Ok(false)
            }
            Action::SelectTile(tile) => {
                self.state.selected = Some(tile);
                Ok(false)
            }
            Action::SelectTool(tool) => {
                self.state.tool = tool;
                Ok(false)
            }
            Action::Orbit(delta) => {
                self.camera.orbit(delta.x, delta.y);
                Ok(false)
            }
            Action::Zoom(delta) => {
                self.camera.zoom(delta);
                Ok(false)
            }
            Action::Pan(delta) => {
                self.camera.pan(delta.x, delta.y);
                Ok(false)
            }
            Action::ResetCamera => {
                self.camera.reset();
                Ok(false)
            }
            Action::Noop => Ok(false),
        }
    }

    /// Start a drag gesture. A stroke still open is closed first.
    pub fn begin_stroke(&mut self) {
        self.end_stroke();
        self.stroke = Some(Stroke::default());
    }

    /// Close the gesture, committing one undo entry on every map it touched.
    pub fn end_stroke(&mut self) {
        let Some(stroke) = self.stroke.take() else {
            return;
        };
        let mut committed = 0;
        for id in stroke.batched {
            let Some(coord) = self.area.find_map(id) else {
                continue;
            };
            if let Some(map) = self.area.map_at_mut(coord)
                && map.end_batch()
            {
                committed += 1;
            }
        }
        tracing::debug!(committed, "stroke ended");
    }

    /// Revert the last edit on the active map.
    pub fn undo(&mut self) -> bool {
        self.end_stroke();
        self.area
            .map_at_mut(self.state.active_map)
            .is_some_and(Map::undo)
    }

    /// Re-apply the last undone edit on the active map.
    pub fn redo(&mut self) -> bool {
        self.end_stroke();
        self.area
            .map_at_mut(self.state.active_map)
            .is_some_and(Map::redo)
    }

    fn paint(&mut self, at: GridPos) -> Result<bool, EditError> {
        let Some(tile) = self.state.selected else {
            tracing::debug!("paint ignored: no tile selected");
            return Ok(false);
        };
        self.place(at, tile)
    }

    fn place(&mut self, at: GridPos, tile: TileRef) -> Result<bool, EditError> {
        let Some((coord, x, y)) = self.target(at, true)? else {
            return Ok(false);
        };
        let map = self.batched_map(coord)?;
        Ok(map.set_tile(at.layer, x, y, tile)?)
    }

    fn fill(&mut self, at: GridPos) -> Result<bool, EditError> {
        let Some(tile) = self.state.selected else {
            return Ok(false);
        };
        let Some((coord, x, y)) = self.target(at, true)? else {
            return Ok(false);
        };

        let filled = if self.stroke.is_some() {
            self.batched_map(coord)?.flood_fill(at.layer, x, y, tile)?
        } else {
            let map = self.map_mut(coord)?;
            map.begin_batch();
            let result = map.flood_fill(at.layer, x, y, tile);
            map.end_batch();
            result?
        };
        tracing::debug!(filled, layer = at.layer, "fill applied");
        Ok(filled > 0)
    }

    /// Select the tile under the cursor. Empty cells leave the selection alone.
    fn pick(&mut self, at: GridPos) -> Result<Option<TileRef>, EditError> {
        let Some((coord, x, y)) = self.target(at, false)? else {
            return Ok(None);
        };
        let tile = self
            .area
            .map_at(coord)
            .and_then(|map| map.tile(at.layer, x, y))
            .ok_or(GridError::OutOfBounds {
                layer: at.layer,
                x,
                y,
            })?;
        if tile.is_empty() {
            return Ok(None);
        }
        self.state.selected = Some(tile);
        Ok(Some(tile))
    }

    /// Resolve a position to an existing map and in-range cell, creating the
    /// neighbour across an edge when allowed.
    ///
    /// Returns `None` when the neighbour is missing and may not be created.
    fn target(
        &mut self,
        at: GridPos,
        allow_create: bool,
    ) -> Result<Option<(MapCoord, usize, usize)>, EditError> {
        let r = redirect(at.map_x, at.map_y, at.tile_x, at.tile_y);

        if let (Ok(mx), Ok(my)) = (usize::try_from(r.map_x), usize::try_from(r.map_y)) {
            if self.area.has_map(r.map_x, r.map_y) {
                return Ok(Some((MapCoord::new(mx, my), r.x, r.y)));
            }
        }
        if r.edge == MapEdge::Inside {
            return Err(EditError::NoMap {
                x: r.map_x,
                y: r.map_y,
            });
        }

        let may_create = allow_create && !self.stroke.as_ref().is_some_and(|s| s.created_map);
        if !may_create {
            return Ok(None);
        }

        let (slot, _) = self.area.get_or_create_map(r.map_x, r.map_y);
        self.state.active_map = slot.shifted(self.state.active_map);
        if let Some(stroke) = &mut self.stroke {
            stroke.created_map = true;
        }
        tracing::debug!(
            edge = ?r.edge,
            x = slot.coord.x,
            y = slot.coord.y,
            "map created across edge"
        );
        Ok(Some((slot.coord, r.x, r.y)))
    }

    fn map_mut(&mut self, coord: MapCoord) -> Result<&mut Map, EditError> {
        self.area.map_at_mut(coord).ok_or(EditError::NoMap {
            x: coord.x as i32,
            y: coord.y as i32,
        })
    }

    /// The map at `coord`, with a batch opened if a stroke is running and
    /// has not touched it yet.
    fn batched_map(&mut self, coord: MapCoord) -> Result<&mut Map, EditError> {
        let stroke = self.stroke.as_mut();
        let map = self.area.map_at_mut(coord).ok_or(EditError::NoMap {
            x: coord.x as i32,
            y: coord.y as i32,
        })?;
        if let Some(stroke) = stroke
            && !stroke.batched.contains(&map.id())
        {
            map.begin_batch();
            stroke.batched.push(map.id());
        }
        Ok(map)
    }
}
