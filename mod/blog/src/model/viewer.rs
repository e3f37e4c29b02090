use crate::model::Claims;

/// The identity performing a request.
///
/// Read paths filter differently for anonymous and authenticated viewers,
/// so the distinction is an explicit type rather than an `Option` checked
/// ad hoc at each call site.
#[derive(Debug, Clone)]
pub enum Viewer {
    Anonymous,
    Authenticated(Claims),
}

impl Viewer {
    /// Claims of the authenticated viewer, if any.
    pub fn claims(&self) -> Option<&Claims> {
        match self {
            Viewer::Anonymous => None,
            Viewer::Authenticated(claims) => Some(claims),
        }
    }

    /// User id of the authenticated viewer, if any.
    pub fn user_id(&self) -> Option<&str> {
        self.claims().map(|c| c.sub.as_str())
    }

    /// Whether this viewer is the given user.
    pub fn is_user(&self, user_id: &str) -> bool {
        self.user_id() == Some(user_id)
    }
}
