use serde::{Deserialize, Serialize};

/// An authored post.
///
/// The counters are denormalized: `popularity` tracks
/// `like_count + comment_count + forward_count` by construction (comment
/// deletion is the one deliberate exception, see the engagement service).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Post {
    pub id: String,
    pub author_id: String,
    pub title: String,
    pub content: String,

    /// Private posts are visible only to their author.
    #[serde(default)]
    pub is_private: bool,

    /// Id of the forwarded post, if this post is a forward. Weak reference:
    /// the target may have been deleted since.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forward_of: Option<String>,

    /// Id of the attached audio asset. Forwards inherit the original's.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music_id: Option<String>,

    pub popularity: i64,
    pub like_count: i64,
    pub comment_count: i64,
    pub forward_count: i64,
    pub view_count: i64,

    /// Whether the forwarded-post notification has been acknowledged by the
    /// original's author. Meaningful only when `forward_of` is set.
    #[serde(default)]
    pub fwd_viewed: bool,

    pub created_at: String,
}

/// Input for publishing a new post.
#[derive(Debug, Clone, Deserialize)]
pub struct CreatePost {
    pub title: String,
    pub content: String,
    #[serde(default)]
    pub is_private: bool,
    #[serde(default)]
    pub music_id: Option<String>,
}

/// Input for forwarding an existing post with commentary.
#[derive(Debug, Clone, Deserialize)]
pub struct ForwardRequest {
    /// Title of the forward. Defaults to "Fwd: {original title}".
    #[serde(default)]
    pub title: Option<String>,
    pub content: String,
    #[serde(default)]
    pub is_private: bool,
}

/// A post plus the context needed to render its detail view.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: Post,
    pub author_handle: String,

    /// Resolved forward source. None when this post is not a forward, or
    /// when the source has been deleted or is not visible to the viewer.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub forward_source: Option<Post>,

    /// Whether the viewer has liked this post. Always false for anonymous.
    pub liked: bool,
}

/// Result of a like toggle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct LikeState {
    pub liked: bool,
}
