use serde::{Deserialize, Serialize};

/// A JWT session record, used for token revocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    /// Session id (UUIDv4, no dashes).
    pub id: String,

    /// User id that owns this session.
    pub user_id: String,

    /// RFC 3339 timestamp when the token was issued.
    pub issued_at: String,

    /// RFC 3339 timestamp when the token expires.
    pub expires_at: String,

    /// Whether this session has been revoked.
    #[serde(default)]
    pub revoked: bool,
}

/// JWT claims payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject: user id.
    pub sub: String,

    /// User handle.
    pub handle: String,

    /// Session id (for revocation).
    pub sid: String,

    /// Issued at (unix timestamp).
    pub iat: i64,

    /// Expiration (unix timestamp).
    pub exp: i64,
}

/// Request body for login.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub handle: String,
    pub password: String,
}

/// Token returned after login.
#[derive(Debug, Clone, Serialize)]
pub struct TokenPair {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}
