use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::types::UnknownTag;

/// Gameplay collision class of a tile. Consumed by export, ignored by rendering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum CollisionType {
    /// Walkable.
    #[default]
    None = 0x00,
    /// Wall or cliff.
    Solid = 0x01,
    /// Surf / swim.
    Water = 0x02,
    /// One-way drop.
    Ledge = 0x03,
    /// Height transition.
    Stairs = 0x04,
    /// Encounter trigger.
    TallGrass = 0x05,
    /// Map transition.
    Door = 0x06,
    /// Event-controlled.
    Script = 0x07,
}

impl TryFrom<u8> for CollisionType {
    type Error = UnknownTag;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Ok(match value {
            0x00 => Self::None,
            0x01 => Self::Solid,
            0x02 => Self::Water,
            0x03 => Self::Ledge,
            0x04 => Self::Stairs,
            0x05 => Self::TallGrass,
            0x06 => Self::Door,
            0x07 => Self::Script,
            _ => {
                return Err(UnknownTag {
                    kind: "collision",
                    value,
                });
            }
        })
    }
}

/// Scope a tileset belongs to. Also selects its storage folder.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum TilesetType {
    #[default]
    Regional = 0,
    Local = 1,
    Interior = 2,
}

impl TilesetType {
    /// Lowercase folder name used on disk.
    pub fn dir_name(self) -> &'static str {
        match self {
            Self::Regional => "regional",
            Self::Local => "local",
            Self::Interior => "interior",
        }
    }
}

impl TryFrom<u8> for TilesetType {
    type Error = UnknownTag;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Regional),
            1 => Ok(Self::Local),
            2 => Ok(Self::Interior),
            _ => Err(UnknownTag {
                kind: "tileset type",
                value,
            }),
        }
    }
}

/// Mesh vertex: object-space position and texture coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    pub position: Vec3,
    pub uv: Vec2,
}

impl Vertex {
    pub fn new(position: Vec3, uv: Vec2) -> Self {
        Self { position, uv }
    }
}

/// Indexed triangle list.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Mesh {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u16>,
}

impl Mesh {
    pub fn new(vertices: Vec<Vertex>, indices: Vec<u16>) -> Self {
        Self { vertices, indices }
    }

    /// Triangles as vertex index triples. A trailing partial triangle is ignored.
    pub fn triangles(&self) -> impl Iterator<Item = [usize; 3]> + '_ {
        self.indices
            .chunks_exact(3)
            .map(|t| [t[0] as usize, t[1] as usize, t[2] as usize])
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.indices.len() < 3
    }

    /// Axis-aligned cube spanning `[0, 1]` on every axis, four vertices per face.
    pub fn unit_cube() -> Self {
        let faces: [[Vec3; 4]; 6] = [
            // -Z
            [
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
            ],
            // +Z
            [
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(0.0, 0.0, 1.0),
                Vec3::new(0.0, 1.0, 1.0),
                Vec3::new(1.0, 1.0, 1.0),
            ],
            // -X
            [
                Vec3::new(0.0, 0.0, 1.0),
                Vec3::new(0.0, 0.0, 0.0),
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(0.0, 1.0, 1.0),
            ],
            // +X
            [
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(1.0, 1.0, 1.0),
                Vec3::new(1.0, 1.0, 0.0),
            ],
            // +Y
            [
                Vec3::new(0.0, 1.0, 0.0),
                Vec3::new(1.0, 1.0, 0.0),
                Vec3::new(1.0, 1.0, 1.0),
                Vec3::new(0.0, 1.0, 1.0),
            ],
            // -Y
            [
                Vec3::new(0.0, 0.0, 1.0),
                Vec3::new(1.0, 0.0, 1.0),
                Vec3::new(1.0, 0.0, 0.0),
                Vec3::new(0.0, 0.0, 0.0),
            ],
        ];
        let uvs = [
            Vec2::new(0.0, 1.0),
            Vec2::new(1.0, 1.0),
            Vec2::new(1.0, 0.0),
            Vec2::new(0.0, 0.0),
        ];

        let mut vertices = Vec::with_capacity(24);
        let mut indices = Vec::with_capacity(36);
        for corners in faces {
            let base = vertices.len() as u16;
            for (corner, uv) in corners.into_iter().zip(uvs) {
                vertices.push(Vertex::new(corner, uv));
            }
            indices.extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
        }
        Self { vertices, indices }
    }
}

/// Pixel count does not match `width * height`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("texture {width}x{height} needs {expected} pixels, got {actual}")]
pub struct TextureSizeError {
    pub width: usize,
    pub height: usize,
    pub expected: usize,
    pub actual: usize,
}

/// Row-major 32-bit ARGB image.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Texture {
    width: usize,
    height: usize,
    pixels: Vec<u32>,
}

impl Texture {
    pub fn new(width: usize, height: usize, pixels: Vec<u32>) -> Result<Self, TextureSizeError> {
        let expected = width * height;
        if pixels.len() != expected {
            return Err(TextureSizeError {
                width,
                height,
                expected,
                actual: pixels.len(),
            });
        }
        Ok(Self {
            width,
            height,
            pixels,
        })
    }

    /// Texture filled with one colour.
    pub fn solid(width: usize, height: usize, argb: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![argb; width * height],
        }
    }

    /// Texture whose pixel at `(x, y)` is `f(x, y)`.
    pub fn from_fn(width: usize, height: usize, mut f: impl FnMut(usize, usize) -> u32) -> Self {
        let mut pixels = Vec::with_capacity(width * height);
        for y in 0..height {
            for x in 0..width {
                pixels.push(f(x, y));
            }
        }
        Self {
            width,
            height,
            pixels,
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    pub fn is_empty(&self) -> bool {
        self.pixels.is_empty()
    }

    pub fn pixel(&self, x: usize, y: usize) -> Option<u32> {
        if x >= self.width || y >= self.height {
            return None;
        }
        self.pixels.get(y * self.width + x).copied()
    }

    /// Nearest-neighbour lookup at normalized `(u, v)`, clamped to the image.
    ///
    /// Returns `None` only for a zero-sized texture.
    pub fn sample(&self, u: f32, v: f32) -> Option<u32> {
        if self.is_empty() {
            return None;
        }
        let max_x = self.width as i64 - 1;
        let max_y = self.height as i64 - 1;
        // `as` truncates toward zero and saturates on NaN/overflow.
        let x = ((u * max_x as f32) as i64).clamp(0, max_x) as usize;
        let y = ((v * max_y as f32) as i64).clamp(0, max_y) as usize;
        self.pixels.get(y * self.width + x).copied()
    }
}

/// Geometry plus surface for one renderable tile.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RenderPrimitive {
    pub mesh: Mesh,
    pub texture: Texture,
}

impl RenderPrimitive {
    pub fn new(mesh: Mesh, texture: Texture) -> Self {
        Self { mesh, texture }
    }
}

/// One entry of a tileset.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TileDefinition {
    pub id: u16,
    pub name: String,
    pub collision: CollisionType,
    /// `None` renders as empty (e.g. air).
    pub primitive: Option<RenderPrimitive>,
}

impl TileDefinition {
    pub fn new(id: u16, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            collision: CollisionType::None,
            primitive: None,
        }
    }

    pub fn with_collision(mut self, collision: CollisionType) -> Self {
        self.collision = collision;
        self
    }

    pub fn with_primitive(mut self, primitive: RenderPrimitive) -> Self {
        self.primitive = Some(primitive);
        self
    }
}

/// Named, typed, ordered lookup table of tile definitions.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Tileset {
    pub name: String,
    pub kind: TilesetType,
    pub tiles: Vec<TileDefinition>,
}

impl Tileset {
    pub fn new(name: impl Into<String>, kind: TilesetType) -> Self {
        Self {
            name: name.into(),
            kind,
            tiles: Vec::new(),
        }
    }

    /// Definition at position `tile_id`, if any.
    pub fn tile(&self, tile_id: u16) -> Option<&TileDefinition> {
        self.tiles.get(tile_id as usize)
    }

    /// Append a definition and return the tile id that addresses it.
    pub fn push(&mut self, tile: TileDefinition) -> u16 {
        let id = self.tiles.len() as u16;
        self.tiles.push(tile);
        id
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }
}
