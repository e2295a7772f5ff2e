//! File-backed project persistence.
//!
//! Layout inside the project directory:
//! ```text
//! maps/
//!   <area>.gbm          - area files
//! tilesets/
//!   regional/<name>.gbts
//!   local/<name>.gbts
//!   interior/<name>.gbts
//! ```

use std::path::{Path, PathBuf};

use tilespace_common::{Tileset, TilesetType};
use tilespace_kernel::Area;

use crate::area::{DirTilesetSource, TilesetSource, decode_area, encode_area, tileset_path};
use crate::codec::PersistError;
use crate::tileset::encode_tileset;

const AREA_EXT: &str = "gbm";
const TILESET_EXT: &str = "gbts";

/// Project directory holding areas and editor tilesets.
#[derive(Debug, Clone)]
pub struct ProjectStore {
    root: PathBuf,
}

impl ProjectStore {
    /// Open or create a project at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, PersistError> {
        let root = path.as_ref().to_path_buf();
        std::fs::create_dir_all(root.join("maps"))?;
        for kind in [TilesetType::Regional, TilesetType::Local, TilesetType::Interior] {
            std::fs::create_dir_all(root.join("tilesets").join(kind.dir_name()))?;
        }
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn tileset_root(&self) -> PathBuf {
        self.root.join("tilesets")
    }

    /// Resolver for the paths stored in area files.
    pub fn tileset_source(&self) -> DirTilesetSource {
        DirTilesetSource::new(self.tileset_root())
    }

    pub fn area_path(&self, name: &str) -> Result<PathBuf, PersistError> {
        check_file_name(name)?;
        Ok(self.root.join("maps").join(format!("{name}.{AREA_EXT}")))
    }

    pub fn save_tileset(&self, tileset: &Tileset) -> Result<PathBuf, PersistError> {
        check_file_name(&tileset.name)?;
        let bytes = encode_tileset(tileset)?;
        let path = self.tileset_root().join(tileset_path(tileset));
        std::fs::write(&path, bytes)?;
        tracing::debug!(path = %path.display(), tiles = tileset.len(), "tileset saved");
        Ok(path)
    }

    /// Load a tileset by its `<type>/<name>.gbts` path.
    pub fn load_tileset(&self, relative: &str) -> Result<Tileset, PersistError> {
        self.tileset_source().load_tileset(relative)
    }

    /// Save an area together with its tilesets, then mark it clean.
    ///
    /// Everything is encoded first; a limit error leaves the directory untouched.
    pub fn save_area(&self, area: &mut Area) -> Result<PathBuf, PersistError> {
        let _span = tracing::info_span!("save_area", area = area.name()).entered();
        let path = self.area_path(area.name())?;
        let area_bytes = encode_area(area)?;
        let mut tilesets = Vec::with_capacity(area.tilesets().len());
        for tileset in area.tilesets() {
            check_file_name(&tileset.name)?;
            tilesets.push((self.tileset_root().join(tileset_path(tileset)), encode_tileset(tileset)?));
        }

        for (ts_path, bytes) in tilesets {
            std::fs::write(ts_path, bytes)?;
        }
        std::fs::write(&path, area_bytes)?;
        area.mark_clean();

        tracing::info!(
            path = %path.display(),
            width = area.width(),
            height = area.height(),
            tilesets = area.tilesets().len(),
            "area saved"
        );
        Ok(path)
    }

    pub fn load_area(&self, name: &str) -> Result<Area, PersistError> {
        let _span = tracing::info_span!("load_area", area = name).entered();
        let bytes = std::fs::read(self.area_path(name)?)?;
        let area = decode_area(&bytes, &self.tileset_source())?;
        tracing::info!(
            width = area.width(),
            height = area.height(),
            maps = area.populated_count(),
            "area loaded"
        );
        Ok(area)
    }

    /// Stored area names, sorted.
    pub fn list_areas(&self) -> Result<Vec<String>, PersistError> {
        list_stems(&self.root.join("maps"), AREA_EXT)
    }

    /// Stored tileset names of one type, sorted.
    pub fn list_tilesets(&self, kind: TilesetType) -> Result<Vec<String>, PersistError> {
        list_stems(&self.tileset_root().join(kind.dir_name()), TILESET_EXT)
    }
}

fn check_file_name(name: &str) -> Result<(), PersistError> {
    let bad = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if bad {
        return Err(PersistError::InvalidName(name.to_owned()));
    }
    Ok(())
}

fn list_stems(dir: &Path, ext: &str) -> Result<Vec<String>, PersistError> {
    let mut names = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().and_then(|e| e.to_str()) != Some(ext) {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            names.push(stem.to_owned());
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilespace_common::{TileDefinition, TileRef};

    fn sample_area() -> Area {
        let mut ts = Tileset::new("coast", TilesetType::Regional);
        ts.push(TileDefinition::new(0, "air"));
        ts.push(TileDefinition::new(1, "sand"));
        let mut area = Area::new("Beach", 1, 1);
        area.add_tileset(ts);
        area.get_or_create_map(0, 0)
            .1
            .set_tile(2, 3, 4, TileRef::new(0, 1))
            .unwrap();
        area
    }

    #[test]
    fn open_creates_layout() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::open(dir.path()).unwrap();
        assert!(store.root().join("maps").is_dir());
        assert!(store.root().join("tilesets/regional").is_dir());
        assert!(store.root().join("tilesets/local").is_dir());
        assert!(store.root().join("tilesets/interior").is_dir());
    }

    #[test]
    fn save_then_load_area() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::open(dir.path()).unwrap();
        let mut area = sample_area();
        assert!(area.is_dirty());

        store.save_area(&mut area).unwrap();
        assert!(!area.is_dirty());

        let loaded = store.load_area("Beach").unwrap();
        assert_eq!(loaded.get_map(0, 0).unwrap().tile(2, 3, 4), Some(TileRef::new(0, 1)));
        assert_eq!(loaded.tilesets()[0].name, "coast");
        assert_eq!(store.list_areas().unwrap(), vec!["Beach".to_owned()]);
        assert_eq!(
            store.list_tilesets(TilesetType::Regional).unwrap(),
            vec!["coast".to_owned()]
        );
    }

    #[test]
    fn failed_save_leaves_no_file() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::open(dir.path()).unwrap();
        let mut area = sample_area();
        area.get_map_mut(0, 0)
            .unwrap()
            .set_tile(0, 0, 0, TileRef::new(0, 0x7FFF))
            .unwrap();

        assert!(store.save_area(&mut area).is_err());
        assert!(area.is_dirty());
        assert!(store.list_areas().unwrap().is_empty());
        assert!(store.list_tilesets(TilesetType::Regional).unwrap().is_empty());
    }

    #[test]
    fn rejects_path_like_names() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::open(dir.path()).unwrap();
        assert!(matches!(store.area_path("../escape"), Err(PersistError::InvalidName(_))));
        assert!(matches!(store.area_path(""), Err(PersistError::InvalidName(_))));
    }

    #[test]
    fn load_missing_area_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::open(dir.path()).unwrap();
        assert!(matches!(store.load_area("nowhere"), Err(PersistError::Io(_))));
    }

    #[test]
    fn standalone_tileset_round_trips_through_store() {
        let dir = tempfile::tempdir().unwrap();
        let store = ProjectStore::open(dir.path()).unwrap();
        let mut ts = Tileset::new("house", TilesetType::Interior);
        ts.push(TileDefinition::new(0, "air"));
        store.save_tileset(&ts).unwrap();
        assert_eq!(store.load_tileset("interior/house.gbts").unwrap(), ts);
    }
}
