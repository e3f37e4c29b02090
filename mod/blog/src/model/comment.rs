use serde::{Deserialize, Serialize};

/// A comment on a post.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Comment {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub content: String,

    /// Whether the post author has acknowledged the comment notification.
    #[serde(default)]
    pub viewed: bool,

    pub created_at: String,
}

/// Input for adding a comment.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateComment {
    pub content: String,
}
