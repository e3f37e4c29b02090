pub mod schema;
pub mod user;
pub mod session;
pub mod follow;
pub mod post;
pub mod engagement;
pub mod feed;
pub mod music;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;

use minstrel_blob::{BlobError, BlobStore};
use minstrel_sql::{SQLStore, Value};

/// Blog service error type.
#[derive(Debug, Error)]
pub enum BlogError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("validation: {0}")]
    Validation(String),

    #[error("unauthorized: {0}")]
    Unauthorized(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("invalid operation: {0}")]
    InvalidOperation(String),

    #[error("storage: {0}")]
    Storage(String),

    #[error("internal: {0}")]
    Internal(String),
}

impl From<BlogError> for minstrel_core::ServiceError {
    fn from(e: BlogError) -> Self {
        match e {
            BlogError::NotFound(m) => minstrel_core::ServiceError::NotFound(m),
            BlogError::Conflict(m) => minstrel_core::ServiceError::Conflict(m),
            BlogError::Validation(m) => minstrel_core::ServiceError::Validation(m),
            BlogError::Unauthorized(m) => minstrel_core::ServiceError::Unauthorized(m),
            BlogError::Forbidden(m) => minstrel_core::ServiceError::PermissionDenied(m),
            BlogError::InvalidOperation(m) => minstrel_core::ServiceError::InvalidOperation(m),
            BlogError::Storage(m) => minstrel_core::ServiceError::Storage(m),
            BlogError::Internal(m) => minstrel_core::ServiceError::Internal(m),
        }
    }
}

impl From<BlobError> for BlogError {
    fn from(e: BlobError) -> Self {
        match e {
            BlobError::Io(m) => BlogError::Storage(m),
            BlobError::InvalidKey(m) => BlogError::Internal(format!("bad blob key: {}", m)),
        }
    }
}

/// Configuration for the blog service.
#[derive(Debug, Clone)]
pub struct BlogConfig {
    /// JWT signing secret.
    pub jwt_secret: String,
    /// Access token lifetime in seconds (default: 24h).
    pub access_token_ttl: i64,
    /// Maximum post title length in characters.
    pub max_title_len: usize,
    /// Maximum post content length in characters.
    pub max_content_len: usize,
    /// Maximum comment length in characters.
    pub max_comment_len: usize,
    /// Maximum profile photo size in bytes.
    pub max_image_size: usize,
    /// Maximum audio upload size in bytes.
    pub max_music_size: usize,
}

impl Default for BlogConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "minstrel-dev-secret-change-me".to_string(),
            access_token_ttl: 86400,            // 24h
            max_title_len: 100,
            max_content_len: 10_000,
            max_comment_len: 1_000,
            max_image_size: 2 * 1024 * 1024,    // 2 MiB
            max_music_size: 10 * 1024 * 1024,   // 10 MiB
        }
    }
}

/// Declared MIME types accepted for profile photos.
pub(crate) const ACCEPTED_IMAGE_TYPES: &[&str] = &["image/jpeg", "image/png"];

/// Declared MIME types accepted for audio uploads.
pub(crate) const ACCEPTED_AUDIO_TYPES: &[&str] = &["audio/mp3", "audio/mpeg"];

/// The blog service. Holds storage backends and configuration.
pub struct BlogService {
    pub(crate) sql: Arc<dyn SQLStore>,
    pub(crate) blob: Arc<dyn BlobStore>,
    pub(crate) config: BlogConfig,
}

impl BlogService {
    /// Create a new BlogService, initializing the DB schema.
    pub fn new(
        sql: Arc<dyn SQLStore>,
        blob: Arc<dyn BlobStore>,
        config: BlogConfig,
    ) -> Result<Arc<Self>, BlogError> {
        schema::init_schema(sql.as_ref())?;
        Ok(Arc::new(Self { sql, blob, config }))
    }

    // ── Generic record helpers (users / music / sessions) ──
    //
    // These tables store the full record as a JSON `data` column plus
    // indexed scalar columns. Counter-bearing tables (posts, likes,
    // comments, follows) use plain columns instead, so their counters
    // can be incremented in place.

    /// Insert a record as JSON into a table with indexed columns.
    pub(crate) fn insert_record<T: Serialize>(
        &self,
        table: &str,
        id: &str,
        record: &T,
        indexes: &[(&str, Value)],
    ) -> Result<(), BlogError> {
        let json = serde_json::to_string(record)
            .map_err(|e| BlogError::Internal(e.to_string()))?;

        let mut cols = vec!["id", "data"];
        let mut placeholders = vec!["?1".to_string(), "?2".to_string()];
        let mut params = vec![Value::Text(id.to_string()), Value::Text(json)];

        for (i, (col, val)) in indexes.iter().enumerate() {
            let idx = i + 3;
            cols.push(col);
            placeholders.push(format!("?{}", idx));
            params.push(val.clone());
        }

        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            table,
            cols.join(", "),
            placeholders.join(", "),
        );

        self.sql.exec(&sql, &params).map_err(|e| {
            let msg = e.to_string();
            if msg.contains("UNIQUE constraint") {
                BlogError::Conflict(msg)
            } else {
                BlogError::Storage(msg)
            }
        })?;

        Ok(())
    }

    /// Get a record by id, deserializing the JSON `data` column.
    pub(crate) fn get_record<T: DeserializeOwned>(
        &self,
        table: &str,
        id: &str,
    ) -> Result<T, BlogError> {
        let sql = format!("SELECT data FROM {} WHERE id = ?1", table);
        let rows = self.sql
            .query(&sql, &[Value::Text(id.to_string())])
            .map_err(|e| BlogError::Storage(e.to_string()))?;
        let row = rows
            .first()
            .ok_or_else(|| BlogError::NotFound(format!("{}/{}", table, id)))?;
        let data = row
            .get_str("data")
            .ok_or_else(|| BlogError::Internal("missing data column".into()))?;
        serde_json::from_str(data).map_err(|e| BlogError::Internal(e.to_string()))
    }

    /// Update a record's JSON data and indexed columns.
    pub(crate) fn update_record<T: Serialize>(
        &self,
        table: &str,
        id: &str,
        record: &T,
        indexes: &[(&str, Value)],
    ) -> Result<(), BlogError> {
        let json = serde_json::to_string(record)
            .map_err(|e| BlogError::Internal(e.to_string()))?;

        let mut sets = vec!["data = ?1".to_string()];
        let mut params: Vec<Value> = vec![Value::Text(json)];

        for (i, (col, val)) in indexes.iter().enumerate() {
            let idx = i + 2;
            sets.push(format!("{} = ?{}", col, idx));
            params.push(val.clone());
        }

        let id_idx = params.len() + 1;
        params.push(Value::Text(id.to_string()));

        let sql = format!(
            "UPDATE {} SET {} WHERE id = ?{}",
            table,
            sets.join(", "),
            id_idx,
        );

        let affected = self.sql
            .exec(&sql, &params)
            .map_err(|e| BlogError::Storage(e.to_string()))?;

        if affected == 0 {
            return Err(BlogError::NotFound(format!("{}/{}", table, id)));
        }

        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::sync::Arc;

    use minstrel_blob::FileStore;
    use minstrel_sql::SqliteStore;

    use crate::model::{RegisterRequest, User};
    use super::{BlogConfig, BlogService};

    /// In-memory service for tests. Keep the TempDir alive for the
    /// duration of the test, it roots the blob store.
    pub(crate) fn test_service() -> (tempfile::TempDir, Arc<BlogService>) {
        let dir = tempfile::tempdir().unwrap();
        let sql: Arc<dyn minstrel_sql::SQLStore> =
            Arc::new(SqliteStore::open_in_memory().unwrap());
        let blob: Arc<dyn minstrel_blob::BlobStore> =
            Arc::new(FileStore::open(dir.path()).unwrap());
        let svc = BlogService::new(sql, blob, BlogConfig::default()).unwrap();
        (dir, svc)
    }

    pub(crate) fn register(svc: &BlogService, handle: &str) -> User {
        svc.register(RegisterRequest {
            handle: handle.to_string(),
            password: "hunter2-secret".to_string(),
            display_name: None,
            gender: Default::default(),
        })
        .unwrap()
    }
}
