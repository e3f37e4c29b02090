use serde::Serialize;

/// Result of a follow toggle.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FollowState {
    pub following: bool,
}
