use serde::{Deserialize, Serialize};

/// An uploaded audio asset.
///
/// Owned by no single post: forwards share the original's asset by
/// reference, so deleting a post never deletes its music.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Music {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub singer: Option<String>,

    pub song_name: String,

    /// Declared MIME type of the upload (audio/mp3 or audio/mpeg).
    pub content_type: String,

    /// Blob key of the stored bytes.
    pub blob_key: String,

    /// Size of the upload in bytes.
    pub size: u64,

    pub created_at: String,
}

/// Metadata accompanying an audio upload.
#[derive(Debug, Clone, Deserialize)]
pub struct UploadMusic {
    #[serde(default)]
    pub singer: Option<String>,
    pub song_name: String,
}
