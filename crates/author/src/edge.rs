use tilespace_common::{MAP_HEIGHT, MAP_WIDTH};

const W: i32 = MAP_WIDTH as i32;
const H: i32 = MAP_HEIGHT as i32;

/// Where a tile position lies relative to its map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MapEdge {
    Inside,
    North,
    South,
    East,
    West,
    NorthEast,
    NorthWest,
    SouthEast,
    SouthWest,
}

impl MapEdge {
    /// Classify a possibly out-of-range tile position. North is `y < 0`.
    pub fn resolve(tile_x: i32, tile_y: i32) -> Self {
        let west = tile_x < 0;
        let east = tile_x >= W;
        let north = tile_y < 0;
        let south = tile_y >= H;
        match (north, south, west, east) {
            (true, _, true, _) => Self::NorthWest,
            (true, _, _, true) => Self::NorthEast,
            (_, true, true, _) => Self::SouthWest,
            (_, true, _, true) => Self::SouthEast,
            (true, ..) => Self::North,
            (_, true, ..) => Self::South,
            (.., true, _) => Self::West,
            (.., true) => Self::East,
            _ => Self::Inside,
        }
    }

    /// Map offset of the neighbour across this edge.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Self::Inside => (0, 0),
            Self::North => (0, -1),
            Self::South => (0, 1),
            Self::East => (1, 0),
            Self::West => (-1, 0),
            Self::NorthEast => (1, -1),
            Self::NorthWest => (-1, -1),
            Self::SouthEast => (1, 1),
            Self::SouthWest => (-1, 1),
        }
    }
}

/// A tile position resolved to a concrete map and an in-range cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Redirect {
    pub edge: MapEdge,
    pub map_x: i32,
    pub map_y: i32,
    pub x: usize,
    pub y: usize,
}

/// Send a position past the border of map `(map_x, map_y)` to the facing
/// border cell of the neighbouring map.
pub fn redirect(map_x: i32, map_y: i32, tile_x: i32, tile_y: i32) -> Redirect {
    let edge = MapEdge::resolve(tile_x, tile_y);
    let (dx, dy) = edge.offset();
    let x = match dx {
        -1 => W - 1,
        1 => 0,
        _ => tile_x.clamp(0, W - 1),
    };
    let y = match dy {
        -1 => H - 1,
        1 => 0,
        _ => tile_y.clamp(0, H - 1),
    };
    Redirect {
        edge,
        map_x: map_x + dx,
        map_y: map_y + dy,
        x: x as usize,
        y: y as usize,
    }
}
