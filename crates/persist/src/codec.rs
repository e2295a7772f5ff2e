//! Little-endian primitives shared by every binary format, plus the error type.

use tilespace_common::{TextureSizeError, TileRef, UnknownTag};
use tilespace_kernel::GridError;

/// Fixed-width string fields hold at most this many bytes including the terminator.
pub const FIXED_NAME_LEN: usize = 64;

/// Highest tileset index representable in a packed cell.
pub const MAX_PACKED_TILESET: u8 = 0x3;
/// Highest tile id representable in a packed cell.
pub const MAX_PACKED_TILE_ID: u16 = 0x3FFF;

/// Errors from reading or writing persisted data.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("bad magic: expected {expected:#010x}, found {found:#010x}")]
    BadMagic { expected: u32, found: u32 },
    #[error("unsupported version {found} (supported: {supported})")]
    UnsupportedVersion { found: u16, supported: u16 },
    #[error("truncated input: needed {needed} bytes, {remaining} left")]
    Truncated { needed: usize, remaining: usize },
    #[error(transparent)]
    UnknownTag(#[from] UnknownTag),
    #[error("{what} is {value}, limit is {max}")]
    LimitExceeded {
        what: &'static str,
        value: usize,
        max: usize,
    },
    #[error("string field is not UTF-8")]
    InvalidUtf8,
    #[error(transparent)]
    TextureSize(#[from] TextureSizeError),
    #[error(transparent)]
    Grid(#[from] GridError),
    #[error("tileset not found: {0}")]
    MissingTileset(String),
    #[error("name {0:?} cannot be used as a file name")]
    InvalidName(String),
}

/// Fail with `LimitExceeded` when `value > max`.
pub fn check_limit(what: &'static str, value: usize, max: usize) -> Result<(), PersistError> {
    if value > max {
        return Err(PersistError::LimitExceeded { what, value, max });
    }
    Ok(())
}

/// Pack a cell into 2 tileset bits and 14 tile id bits.
pub fn pack_tile(tile: TileRef) -> Result<u16, PersistError> {
    check_limit("tileset index", tile.tileset as usize, MAX_PACKED_TILESET as usize)?;
    check_limit("tile id", tile.tile_id as usize, MAX_PACKED_TILE_ID as usize)?;
    Ok(((tile.tileset as u16) << 14) | tile.tile_id)
}

pub fn unpack_tile(packed: u16) -> TileRef {
    TileRef::new((packed >> 14) as u8 & MAX_PACKED_TILESET, packed & MAX_PACKED_TILE_ID)
}

/// Growable output buffer. Files are encoded fully before anything touches disk.
#[derive(Debug, Default)]
pub struct Writer {
    buf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn u8(&mut self, v: u8) {
        self.buf.push(v);
    }

    pub fn u16(&mut self, v: u16) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn u32(&mut self, v: u32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    pub fn f32(&mut self, v: f32) {
        self.buf.extend_from_slice(&v.to_le_bytes());
    }

    /// `u16` byte length followed by UTF-8.
    pub fn str16(&mut self, what: &'static str, s: &str) -> Result<(), PersistError> {
        check_limit(what, s.len(), u16::MAX as usize)?;
        self.u16(s.len() as u16);
        self.buf.extend_from_slice(s.as_bytes());
        Ok(())
    }

    /// Null-padded field of `FIXED_NAME_LEN` bytes. Longer strings are cut at
    /// a character boundary so the last byte stays a terminator.
    pub fn fixed_str(&mut self, s: &str) {
        let mut end = s.len().min(FIXED_NAME_LEN - 1);
        while !s.is_char_boundary(end) {
            end -= 1;
        }
        let mut field = [0u8; FIXED_NAME_LEN];
        field[..end].copy_from_slice(&s.as_bytes()[..end]);
        self.buf.extend_from_slice(&field);
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buf
    }
}

/// Cursor over an input buffer; every read is bounds-checked.
#[derive(Debug)]
pub struct Reader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    pub fn take(&mut self, n: usize) -> Result<&'a [u8], PersistError> {
        let remaining = self.data.len() - self.pos;
        if n > remaining {
            return Err(PersistError::Truncated {
                needed: n,
                remaining,
            });
        }
        let bytes = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    fn array<const N: usize>(&mut self) -> Result<[u8; N], PersistError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    pub fn u8(&mut self) -> Result<u8, PersistError> {
        Ok(self.array::<1>()?[0])
    }

    pub fn u16(&mut self) -> Result<u16, PersistError> {
        self.array().map(u16::from_le_bytes)
    }

    pub fn u32(&mut self) -> Result<u32, PersistError> {
        self.array().map(u32::from_le_bytes)
    }

    pub fn f32(&mut self) -> Result<f32, PersistError> {
        self.array().map(f32::from_le_bytes)
    }

    pub fn str16(&mut self) -> Result<String, PersistError> {
        let len = self.u16()? as usize;
        let bytes = self.take(len)?;
        String::from_utf8(bytes.to_vec()).map_err(|_| PersistError::InvalidUtf8)
    }

    /// Read a null-padded field; the text ends at the first zero byte.
    pub fn fixed_str(&mut self) -> Result<String, PersistError> {
        let field = self.take(FIXED_NAME_LEN)?;
        let end = field.iter().position(|b| *b == 0).unwrap_or(field.len());
        std::str::from_utf8(&field[..end])
            .map(str::to_owned)
            .map_err(|_| PersistError::InvalidUtf8)
    }

    /// Consume a header: magic then version.
    pub fn header(&mut self, magic: u32, version: u16) -> Result<(), PersistError> {
        let found = self.u32()?;
        if found != magic {
            return Err(PersistError::BadMagic {
                expected: magic,
                found,
            });
        }
        let found = self.u16()?;
        if found != version {
            return Err(PersistError::UnsupportedVersion {
                found,
                supported: version,
            });
        }
        Ok(())
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn primitives_are_little_endian() {
        let mut w = Writer::new();
        w.u16(0x0102);
        w.u32(0x0304_0506);
        assert_eq!(w.into_bytes(), vec![0x02, 0x01, 0x06, 0x05, 0x04, 0x03]);
    }

    #[test]
    fn fixed_str_truncates_on_char_boundary() {
        // 'é' is two bytes; 40 of them straddle the 63-byte cut.
        let long = "é".repeat(40);
        let mut w = Writer::new();
        w.fixed_str(&long);
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), FIXED_NAME_LEN);
        assert_eq!(bytes[62], 0);
        assert_eq!(bytes[63], 0);

        let mut r = Reader::new(&bytes);
        assert_eq!(r.fixed_str().unwrap(), "é".repeat(31));
    }

    #[test]
    fn truncated_read_fails() {
        let mut r = Reader::new(&[1, 2, 3]);
        assert!(matches!(
            r.u32(),
            Err(PersistError::Truncated {
                needed: 4,
                remaining: 3
            })
        ));
    }

    #[test]
    fn header_checks_magic_then_version() {
        let mut w = Writer::new();
        w.u32(0xAABB_CCDD);
        w.u16(2);
        let bytes = w.into_bytes();

        assert!(matches!(
            Reader::new(&bytes).header(0x1111_1111, 1),
            Err(PersistError::BadMagic { .. })
        ));
        assert!(matches!(
            Reader::new(&bytes).header(0xAABB_CCDD, 1),
            Err(PersistError::UnsupportedVersion { found: 2, .. })
        ));
        assert!(Reader::new(&bytes).header(0xAABB_CCDD, 2).is_ok());
    }

    #[test]
    fn packing_limits() {
        assert_eq!(pack_tile(TileRef::new(3, 0x3FFF)).unwrap(), 0xFFFF);
        assert_eq!(unpack_tile(0xFFFF), TileRef::new(3, 0x3FFF));
        assert_eq!(unpack_tile(0), TileRef::EMPTY);
        assert!(pack_tile(TileRef::new(4, 1)).is_err());
        assert!(pack_tile(TileRef::new(0, 0x4000)).is_err());
    }

    #[test]
    fn str16_rejects_oversize() {
        let mut w = Writer::new();
        let huge = "x".repeat(u16::MAX as usize + 1);
        assert!(matches!(
            w.str16("name", &huge),
            Err(PersistError::LimitExceeded { what: "name", .. })
        ));
        assert!(w.is_empty());
    }
}
