use serde::{Deserialize, Serialize};

/// Self-declared gender on a user profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unspecified,
}

/// A registered account.
///
/// The password hash is stored in a dedicated column and never appears in
/// this struct, so serialized users are safe to return from the API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier (UUIDv4, no dashes).
    pub id: String,

    /// Unique handle used for login and mentions.
    pub handle: String,

    /// Display name shown next to posts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,

    #[serde(default)]
    pub gender: Gender,

    /// Blob key of the profile photo, if one has been uploaded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,

    /// RFC 3339 creation timestamp.
    pub created_at: String,

    /// RFC 3339 last update timestamp.
    pub updated_at: String,
}

/// Input for registering a new account.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    pub handle: String,
    pub password: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub gender: Gender,
}

/// Follow-graph degree counts for a user.
#[derive(Debug, Clone, Serialize)]
pub struct FollowStats {
    pub following: usize,
    pub followers: usize,
}
