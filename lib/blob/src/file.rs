use std::fs;
use std::path::{Component, Path, PathBuf};

use crate::error::BlobError;
use crate::traits::BlobStore;

/// FileStore is a BlobStore implementation backed by the local filesystem.
///
/// Keys are mapped to paths under `base_dir`:
///   key "photos/ab12cd.jpg" maps to `{base_dir}/photos/ab12cd.jpg`
///
/// Parent directories are created automatically on `put`.
pub struct FileStore {
    base_dir: PathBuf,
}

impl FileStore {
    /// Create a new FileStore rooted at `base_dir`.
    /// The directory is created if it doesn't exist.
    pub fn open(base_dir: &Path) -> Result<Self, BlobError> {
        fs::create_dir_all(base_dir).map_err(|e| BlobError::Io(e.to_string()))?;
        Ok(Self {
            base_dir: base_dir.to_path_buf(),
        })
    }

    /// Resolve a key to a filesystem path. Rejects keys that escape base_dir.
    fn resolve(&self, key: &str) -> Result<PathBuf, BlobError> {
        if key.is_empty() {
            return Err(BlobError::InvalidKey(key.to_string()));
        }

        // Only plain relative components are allowed: no "..", no roots,
        // no drive prefixes.
        let rel = Path::new(key);
        for component in rel.components() {
            match component {
                Component::Normal(_) => {}
                _ => return Err(BlobError::InvalidKey(key.to_string())),
            }
        }

        Ok(self.base_dir.join(rel))
    }
}

impl BlobStore for FileStore {
    fn put(&self, key: &str, data: &[u8]) -> Result<(), BlobError> {
        let path = self.resolve(key)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| BlobError::Io(e.to_string()))?;
        }
        fs::write(&path, data).map_err(|e| BlobError::Io(e.to_string()))?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BlobError> {
        let path = self.resolve(key)?;
        if !path.is_file() {
            return Ok(None);
        }
        let data = fs::read(&path).map_err(|e| BlobError::Io(e.to_string()))?;
        Ok(Some(data))
    }

    fn delete(&self, key: &str) -> Result<(), BlobError> {
        let path = self.resolve(key)?;
        if path.is_file() {
            fs::remove_file(&path).map_err(|e| BlobError::Io(e.to_string()))?;
        }
        Ok(())
    }

    fn exists(&self, key: &str) -> Result<bool, BlobError> {
        let path = self.resolve(key)?;
        Ok(path.is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> (tempfile::TempDir, FileStore) {
        let dir = tempfile::tempdir().unwrap();
        let s = FileStore::open(dir.path()).unwrap();
        (dir, s)
    }

    #[test]
    fn put_get_roundtrip() {
        let (_dir, s) = store();
        s.put("photos/a.jpg", b"jpeg-bytes").unwrap();
        assert_eq!(s.get("photos/a.jpg").unwrap().as_deref(), Some(&b"jpeg-bytes"[..]));
        assert!(s.exists("photos/a.jpg").unwrap());
    }

    #[test]
    fn get_missing_is_none() {
        let (_dir, s) = store();
        assert_eq!(s.get("music/missing.mp3").unwrap(), None);
        assert!(!s.exists("music/missing.mp3").unwrap());
    }

    #[test]
    fn put_overwrites() {
        let (_dir, s) = store();
        s.put("photos/a.jpg", b"v1").unwrap();
        s.put("photos/a.jpg", b"v2").unwrap();
        assert_eq!(s.get("photos/a.jpg").unwrap().as_deref(), Some(&b"v2"[..]));
    }

    #[test]
    fn delete_is_idempotent() {
        let (_dir, s) = store();
        s.put("photos/a.jpg", b"x").unwrap();
        s.delete("photos/a.jpg").unwrap();
        assert!(!s.exists("photos/a.jpg").unwrap());
        s.delete("photos/a.jpg").unwrap();
    }

    #[test]
    fn rejects_traversal_keys() {
        let (_dir, s) = store();
        assert!(s.put("../escape.bin", b"x").is_err());
        assert!(s.put("/etc/passwd", b"x").is_err());
        assert!(s.put("a/../../b", b"x").is_err());
        assert!(s.put("", b"x").is_err());
    }
}
