use crate::error::BlobError;

/// BlobStore provides storage for uploaded binary content (profile photos,
/// audio attachments).
///
/// Keys are path-like strings: `photos/ab12cd.jpg`, `music/ef34gh.mp3`.
/// The default implementation (`FileStore`) maps keys to local filesystem
/// paths. Can be swapped for an object-storage backend by implementing
/// this trait.
pub trait BlobStore: Send + Sync {
    /// Store a blob. Overwrites if the key already exists.
    fn put(&self, key: &str, data: &[u8]) -> Result<(), BlobError>;

    /// Retrieve a blob. Returns None if the key does not exist.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, BlobError>;

    /// Delete a blob. No-op if the key does not exist.
    fn delete(&self, key: &str) -> Result<(), BlobError>;

    /// Check whether a blob exists.
    fn exists(&self, key: &str) -> Result<bool, BlobError>;
}
