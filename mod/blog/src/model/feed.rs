use serde::Serialize;

/// Per-category unread notification counts for a user.
///
/// Computed from the unread flags on the underlying rows, never stored.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct NewsCounts {
    pub likes: usize,
    pub comments: usize,
    pub forwards: usize,
    pub follows: usize,
}

/// The four notification categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsCategory {
    Likes,
    Comments,
    Forwards,
    Follows,
}

impl NewsCategory {
    /// Parse a category from its URL slug.
    pub fn from_slug(slug: &str) -> Option<Self> {
        match slug {
            "likes" => Some(Self::Likes),
            "comments" => Some(Self::Comments),
            "forwards" => Some(Self::Forwards),
            "follows" => Some(Self::Follows),
            _ => None,
        }
    }
}

/// An unread like, as returned by opening the "likes" category.
#[derive(Debug, Clone, Serialize)]
pub struct LikeNotice {
    pub post_id: String,
    pub post_title: String,
    pub from_user: String,
    pub from_handle: String,
    pub created_at: String,
}

/// An unread comment on one of the user's posts.
#[derive(Debug, Clone, Serialize)]
pub struct CommentNotice {
    pub comment_id: String,
    pub post_id: String,
    pub post_title: String,
    pub from_user: String,
    pub from_handle: String,
    pub content: String,
    pub created_at: String,
}

/// An unread forward of one of the user's posts.
#[derive(Debug, Clone, Serialize)]
pub struct ForwardNotice {
    /// Id of the forwarding post.
    pub post_id: String,
    /// Id of the user's post that was forwarded.
    pub original_post_id: String,
    pub title: String,
    pub from_user: String,
    pub from_handle: String,
    pub created_at: String,
}

/// An unacknowledged new follower.
#[derive(Debug, Clone, Serialize)]
pub struct FollowNotice {
    pub from_user: String,
    pub from_handle: String,
    pub created_at: String,
}
