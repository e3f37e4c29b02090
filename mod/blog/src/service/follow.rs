use minstrel_core::{now_rfc3339, ListParams};
use minstrel_sql::Value;

use crate::model::{FollowState, User};
use crate::service::{BlogError, BlogService};

impl BlogService {
    /// Toggle the follow edge from one account to another.
    ///
    /// Creates the edge (unreviewed) when absent, deletes it when present.
    /// Two toggles return to the original state. Self-follow is rejected.
    pub fn toggle_follow(&self, from: &str, to: &str) -> Result<FollowState, BlogError> {
        if from == to {
            return Err(BlogError::InvalidOperation(
                "cannot follow yourself".into(),
            ));
        }
        // Target must exist; a dangling edge would poison the listings.
        self.get_user(to)?;

        if self.is_following(from, to)? {
            self.sql
                .exec(
                    "DELETE FROM follows WHERE from_user = ?1 AND to_user = ?2",
                    &[Value::Text(from.to_string()), Value::Text(to.to_string())],
                )
                .map_err(|e| BlogError::Storage(e.to_string()))?;
            return Ok(FollowState { following: false });
        }

        self.sql
            .exec(
                "INSERT INTO follows (from_user, to_user, reviewed, created_at)
                 VALUES (?1, ?2, 0, ?3)",
                &[
                    Value::Text(from.to_string()),
                    Value::Text(to.to_string()),
                    Value::Text(now_rfc3339()),
                ],
            )
            .map_err(|e| {
                let msg = e.to_string();
                // A concurrent toggle already created the edge.
                if msg.contains("UNIQUE constraint") {
                    BlogError::Conflict("follow edge already exists".into())
                } else {
                    BlogError::Storage(msg)
                }
            })?;
        Ok(FollowState { following: true })
    }

    /// Whether `from` currently follows `to`.
    pub fn is_following(&self, from: &str, to: &str) -> Result<bool, BlogError> {
        let rows = self.sql
            .query(
                "SELECT 1 AS x FROM follows WHERE from_user = ?1 AND to_user = ?2",
                &[Value::Text(from.to_string()), Value::Text(to.to_string())],
            )
            .map_err(|e| BlogError::Storage(e.to_string()))?;
        Ok(!rows.is_empty())
    }

    /// Accounts this user follows, newest edge first.
    pub fn list_following(
        &self,
        user_id: &str,
        params: &ListParams,
    ) -> Result<Vec<User>, BlogError> {
        self.follow_endpoints(user_id, "from_user", "to_user", params)
    }

    /// Accounts following this user, newest edge first.
    pub fn list_followers(
        &self,
        user_id: &str,
        params: &ListParams,
    ) -> Result<Vec<User>, BlogError> {
        self.follow_endpoints(user_id, "to_user", "from_user", params)
    }

    fn follow_endpoints(
        &self,
        user_id: &str,
        match_col: &str,
        other_col: &str,
        params: &ListParams,
    ) -> Result<Vec<User>, BlogError> {
        let sql = format!(
            "SELECT u.data AS data FROM follows f
             JOIN users u ON u.id = f.{}
             WHERE f.{} = ?1
             ORDER BY f.created_at DESC
             LIMIT ?2 OFFSET ?3",
            other_col, match_col,
        );
        let rows = self.sql
            .query(
                &sql,
                &[
                    Value::Text(user_id.to_string()),
                    Value::Integer(params.limit as i64),
                    Value::Integer(params.offset as i64),
                ],
            )
            .map_err(|e| BlogError::Storage(e.to_string()))?;

        let mut users = Vec::new();
        for row in &rows {
            let data = row
                .get_str("data")
                .ok_or_else(|| BlogError::Internal("missing data column".into()))?;
            let user: User =
                serde_json::from_str(data).map_err(|e| BlogError::Internal(e.to_string()))?;
            users.push(user);
        }
        Ok(users)
    }
}

#[cfg(test)]
mod tests {
    use minstrel_core::ListParams;

    use crate::service::testutil::{register, test_service};
    use crate::service::BlogError;

    #[test]
    fn toggle_creates_then_removes_edge() {
        let (_tmp, svc) = test_service();
        let alice = register(&svc, "alice");
        let bob = register(&svc, "bob");

        let state = svc.toggle_follow(&alice.id, &bob.id).unwrap();
        assert!(state.following);
        assert!(svc.is_following(&alice.id, &bob.id).unwrap());

        // Exactly one edge, visible in bob's follower list.
        let followers = svc
            .list_followers(&bob.id, &ListParams::default())
            .unwrap();
        assert_eq!(followers.len(), 1);
        assert_eq!(followers[0].id, alice.id);

        let state = svc.toggle_follow(&alice.id, &bob.id).unwrap();
        assert!(!state.following);
        assert!(!svc.is_following(&alice.id, &bob.id).unwrap());
        assert!(svc
            .list_followers(&bob.id, &ListParams::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn self_follow_is_rejected() {
        let (_tmp, svc) = test_service();
        let alice = register(&svc, "alice");

        let err = svc.toggle_follow(&alice.id, &alice.id).unwrap_err();
        assert!(matches!(err, BlogError::InvalidOperation(_)));
        assert!(svc
            .list_followers(&alice.id, &ListParams::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn following_unknown_user_is_not_found() {
        let (_tmp, svc) = test_service();
        let alice = register(&svc, "alice");

        let err = svc.toggle_follow(&alice.id, "missing").unwrap_err();
        assert!(matches!(err, BlogError::NotFound(_)));
    }

    #[test]
    fn follow_is_directional() {
        let (_tmp, svc) = test_service();
        let alice = register(&svc, "alice");
        let bob = register(&svc, "bob");

        svc.toggle_follow(&alice.id, &bob.id).unwrap();
        assert!(svc.is_following(&alice.id, &bob.id).unwrap());
        assert!(!svc.is_following(&bob.id, &alice.id).unwrap());
    }

    #[test]
    fn listings_are_newest_first() {
        let (_tmp, svc) = test_service();
        let alice = register(&svc, "alice");
        let bob = register(&svc, "bob");
        let carol = register(&svc, "carol");

        // Distinct timestamps so ordering is deterministic.
        svc.sql
            .exec(
                "INSERT INTO follows (from_user, to_user, reviewed, created_at)
                 VALUES (?1, ?2, 0, '2026-01-01T00:00:00Z')",
                &[
                    minstrel_sql::Value::Text(alice.id.clone()),
                    minstrel_sql::Value::Text(bob.id.clone()),
                ],
            )
            .unwrap();
        svc.sql
            .exec(
                "INSERT INTO follows (from_user, to_user, reviewed, created_at)
                 VALUES (?1, ?2, 0, '2026-02-01T00:00:00Z')",
                &[
                    minstrel_sql::Value::Text(alice.id.clone()),
                    minstrel_sql::Value::Text(carol.id.clone()),
                ],
            )
            .unwrap();

        let following = svc
            .list_following(&alice.id, &ListParams::default())
            .unwrap();
        assert_eq!(following.len(), 2);
        assert_eq!(following[0].id, carol.id);
        assert_eq!(following[1].id, bob.id);
    }
}
