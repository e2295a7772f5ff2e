use std::collections::HashMap;

use sha2::{Digest, Sha256};
use tilespace_common::{MAP_HEIGHT, MAP_WIDTH, MapCoord, MapId, Texture};
use tilespace_kernel::{Area, Map};

/// Colour of columns with nothing drawable.
pub const PREVIEW_BLANK: u32 = 0xFF00_0000;

/// Pixels per tile edge in a map preview.
pub const PREVIEW_SCALE: usize = 2;

/// SHA-256 over a texture's dimensions and pixels.
pub type ContentHash = [u8; 32];

pub fn content_hash(texture: &Texture) -> ContentHash {
    let mut hasher = Sha256::new();
    hasher.update((texture.width() as u64).to_le_bytes());
    hasher.update((texture.height() as u64).to_le_bytes());
    for pixel in texture.pixels() {
        hasher.update(pixel.to_le_bytes());
    }
    hasher.finalize().into()
}

/// Top-down image of a map: per column, the centre texel of its topmost
/// non-empty tile, scaled up by `PREVIEW_SCALE`.
pub fn map_preview(map: &Map, area: &Area) -> Texture {
    let mut colours = vec![PREVIEW_BLANK; MAP_WIDTH * MAP_HEIGHT];
    for y in 0..MAP_HEIGHT {
        for x in 0..MAP_WIDTH {
            let texel = map
                .topmost(x, y)
                .and_then(|(_, tile)| area.resolve(tile))
                .and_then(|def| def.primitive.as_ref())
                .and_then(|p| p.texture.pixel(p.texture.width() / 2, p.texture.height() / 2));
            if let Some(texel) = texel {
                colours[y * MAP_WIDTH + x] = texel;
            }
        }
    }
    Texture::from_fn(
        MAP_WIDTH * PREVIEW_SCALE,
        MAP_HEIGHT * PREVIEW_SCALE,
        |px, py| colours[(py / PREVIEW_SCALE) * MAP_WIDTH + px / PREVIEW_SCALE],
    )
}

/// Per-map previews, rebuilt only for maps whose preview flag is set.
#[derive(Debug, Default)]
pub struct MapPreviews {
    previews: HashMap<MapId, Texture>,
}

impl MapPreviews {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: MapId) -> Option<&Texture> {
        self.previews.get(&id)
    }

    /// Rebuild stale previews and forget maps that left the area. Returns
    /// the number rebuilt.
    pub fn update(&mut self, area: &mut Area) -> usize {
        let stale: Vec<MapCoord> = area
            .maps()
            .filter(|(_, m)| m.preview_dirty() || !self.previews.contains_key(&m.id()))
            .map(|(coord, _)| coord)
            .collect();

        for &coord in &stale {
            if let Some(map) = area.map_at(coord) {
                self.previews.insert(map.id(), map_preview(map, area));
            }
            if let Some(map) = area.map_at_mut(coord) {
                map.clear_preview_dirty();
            }
        }

        let live: Vec<MapId> = area.maps().map(|(_, m)| m.id()).collect();
        self.previews.retain(|id, _| live.contains(id));

        if !stale.is_empty() {
            tracing::debug!(rebuilt = stale.len(), "map previews refreshed");
        }
        stale.len()
    }
}

/// Square nearest-neighbour thumbnails keyed by texture content and size.
#[derive(Debug, Default)]
pub struct PreviewCache {
    entries: HashMap<(ContentHash, usize), Texture>,
}

impl PreviewCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Thumbnail of `texture` at `size x size`, built on first request.
    pub fn thumbnail(&mut self, texture: &Texture, size: usize) -> &Texture {
        self.entries
            .entry((content_hash(texture), size))
            .or_insert_with(|| scale_nearest(texture, size))
    }

    /// Drop every thumbnail of `texture`.
    pub fn invalidate(&mut self, texture: &Texture) {
        let hash = content_hash(texture);
        self.entries.retain(|(h, _), _| *h != hash);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn scale_nearest(src: &Texture, size: usize) -> Texture {
    if src.is_empty() {
        return Texture::solid(size, size, PREVIEW_BLANK);
    }
    Texture::from_fn(size, size, |x, y| {
        src.pixel(x * src.width() / size, y * src.height() / size)
            .unwrap_or(PREVIEW_BLANK)
    })
}
