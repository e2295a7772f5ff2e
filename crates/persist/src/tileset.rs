use glam::{Vec2, Vec3};
use tilespace_common::{
    CollisionType, Mesh, RenderPrimitive, Texture, TileDefinition, Tileset, TilesetType, Vertex,
};

use crate::codec::{PersistError, Reader, Writer, check_limit};

/// "GLTS" on disk.
pub const TILESET_MAGIC: u32 = 0x5354_4C47;
pub const TILESET_VERSION: u16 = 1;

/// Bytes per serialized vertex: position then uv, all `f32`.
const VERTEX_BYTES: usize = 5 * 4;

/// Encode a tileset in the editor format.
pub fn encode_tileset(tileset: &Tileset) -> Result<Vec<u8>, PersistError> {
    check_limit("tile count", tileset.tiles.len(), u16::MAX as usize)?;

    let mut w = Writer::new();
    w.u32(TILESET_MAGIC);
    w.u16(TILESET_VERSION);
    w.u16(tileset.tiles.len() as u16);
    w.fixed_str(&tileset.name);
    w.u8(tileset.kind as u8);

    for tile in &tileset.tiles {
        w.u16(tile.id);
        w.fixed_str(&tile.name);
        w.u8(tile.collision as u8);
        write_render_block(&mut w, tile.primitive.as_ref())?;
    }
    Ok(w.into_bytes())
}

pub fn decode_tileset(bytes: &[u8]) -> Result<Tileset, PersistError> {
    let mut r = Reader::new(bytes);
    r.header(TILESET_MAGIC, TILESET_VERSION)?;
    let count = r.u16()?;
    let name = r.fixed_str()?;
    let kind = TilesetType::try_from(r.u8()?)?;

    let mut tileset = Tileset::new(name, kind);
    for _ in 0..count {
        let id = r.u16()?;
        let name = r.fixed_str()?;
        let collision = CollisionType::try_from(r.u8()?)?;
        let mut def = TileDefinition::new(id, name).with_collision(collision);
        def.primitive = read_render_block(&mut r)?;
        tileset.tiles.push(def);
    }
    Ok(tileset)
}

/// Mesh and texture block. `None` writes the all-zero sentinel: vertex count,
/// index count, texture width and height.
pub fn write_render_block(
    w: &mut Writer,
    primitive: Option<&RenderPrimitive>,
) -> Result<(), PersistError> {
    let Some(primitive) = primitive.filter(|p| !p.mesh.vertices.is_empty()) else {
        w.u32(0);
        w.u32(0);
        w.u16(0);
        w.u16(0);
        return Ok(());
    };
    let mesh = &primitive.mesh;
    let texture = &primitive.texture;
    check_limit("vertex count", mesh.vertices.len(), u32::MAX as usize)?;
    check_limit("index count", mesh.indices.len(), u32::MAX as usize)?;
    check_limit("texture width", texture.width(), u16::MAX as usize)?;
    check_limit("texture height", texture.height(), u16::MAX as usize)?;

    w.u32(mesh.vertices.len() as u32);
    for v in &mesh.vertices {
        w.f32(v.position.x);
        w.f32(v.position.y);
        w.f32(v.position.z);
        w.f32(v.uv.x);
        w.f32(v.uv.y);
    }
    w.u32(mesh.indices.len() as u32);
    for &i in &mesh.indices {
        w.u16(i);
    }
    w.u16(texture.width() as u16);
    w.u16(texture.height() as u16);
    for &px in texture.pixels() {
        w.u32(px);
    }
    Ok(())
}

pub fn read_render_block(r: &mut Reader<'_>) -> Result<Option<RenderPrimitive>, PersistError> {
    let vertex_count = r.u32()? as usize;
    if vertex_count == 0 {
        r.u32()?;
        r.u16()?;
        r.u16()?;
        return Ok(None);
    }

    ensure_available(r, vertex_count, VERTEX_BYTES)?;
    let mut vertices = Vec::with_capacity(vertex_count);
    for _ in 0..vertex_count {
        let position = Vec3::new(r.f32()?, r.f32()?, r.f32()?);
        let uv = Vec2::new(r.f32()?, r.f32()?);
        vertices.push(Vertex::new(position, uv));
    }

    let index_count = r.u32()? as usize;
    ensure_available(r, index_count, 2)?;
    let mut indices = Vec::with_capacity(index_count);
    for _ in 0..index_count {
        indices.push(r.u16()?);
    }

    let width = r.u16()? as usize;
    let height = r.u16()? as usize;
    ensure_available(r, width * height, 4)?;
    let mut pixels = Vec::with_capacity(width * height);
    for _ in 0..width * height {
        pixels.push(r.u32()?);
    }

    Ok(Some(RenderPrimitive::new(
        Mesh::new(vertices, indices),
        Texture::new(width, height, pixels)?,
    )))
}

/// Reject counts the remaining input cannot hold before allocating for them.
fn ensure_available(r: &Reader<'_>, count: usize, size: usize) -> Result<(), PersistError> {
    let needed = count.saturating_mul(size);
    if needed > r.remaining() {
        return Err(PersistError::Truncated {
            needed,
            remaining: r.remaining(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tileset() -> Tileset {
        let mut ts = Tileset::new("Forest Edge", TilesetType::Local);
        ts.push(TileDefinition::new(0, "air"));
        ts.push(
            TileDefinition::new(1, "tree")
                .with_collision(CollisionType::Solid)
                .with_primitive(RenderPrimitive::new(
                    Mesh::unit_cube(),
                    Texture::new(2, 1, vec![0xFF00_FF00, 0xFF00_8000]).unwrap(),
                )),
        );
        ts.push(TileDefinition::new(2, "pond").with_collision(CollisionType::Water));
        ts
    }

    #[test]
    fn tileset_survives_encode_decode() {
        let ts = sample_tileset();
        let decoded = decode_tileset(&encode_tileset(&ts).unwrap()).unwrap();
        assert_eq!(decoded, ts);
    }

    #[test]
    fn empty_primitive_uses_zero_sentinel() {
        let mut w = Writer::new();
        write_render_block(&mut w, None).unwrap();
        assert_eq!(w.into_bytes(), vec![0u8; 12]);
    }

    #[test]
    fn header_layout() {
        let bytes = encode_tileset(&sample_tileset()).unwrap();
        assert_eq!(&bytes[..4], b"GLTS");
        assert_eq!(u16::from_le_bytes([bytes[4], bytes[5]]), 1);
        assert_eq!(u16::from_le_bytes([bytes[6], bytes[7]]), 3);
        assert_eq!(&bytes[8..19], b"Forest Edge");
        assert_eq!(bytes[8 + 64], TilesetType::Local as u8);
    }

    #[test]
    fn unknown_collision_tag_fails() {
        let mut bytes = encode_tileset(&sample_tileset()).unwrap();
        // First tile: header (4 + 2 + 2 + 64 + 1), id (2), name (64), collision.
        let collision_at = 73 + 2 + 64;
        bytes[collision_at] = 0x42;
        assert!(matches!(
            decode_tileset(&bytes),
            Err(PersistError::UnknownTag(tag)) if tag.value == 0x42
        ));
    }

    #[test]
    fn truncated_tileset_fails() {
        let bytes = encode_tileset(&sample_tileset()).unwrap();
        let cut = &bytes[..bytes.len() - 3];
        assert!(matches!(decode_tileset(cut), Err(PersistError::Truncated { .. })));
    }

    #[test]
    fn bad_magic_fails() {
        let mut bytes = encode_tileset(&sample_tileset()).unwrap();
        bytes[0] ^= 0xFF;
        assert!(matches!(decode_tileset(&bytes), Err(PersistError::BadMagic { .. })));
    }

    #[test]
    fn oversize_texture_rejected_before_output() {
        let mut ts = Tileset::new("huge", TilesetType::Regional);
        ts.push(TileDefinition::new(0, "wide").with_primitive(RenderPrimitive::new(
            Mesh::unit_cube(),
            Texture::solid(70_000, 1, 0),
        )));
        assert!(matches!(
            encode_tileset(&ts),
            Err(PersistError::LimitExceeded { what: "texture width", .. })
        ));
    }
}
