use minstrel_sql::Value;

use crate::model::{CommentNotice, FollowNotice, ForwardNotice, LikeNotice, NewsCounts};
use crate::service::{BlogError, BlogService};

fn placeholders(count: usize, start: usize) -> String {
    (0..count)
        .map(|i| format!("?{}", start + i))
        .collect::<Vec<_>>()
        .join(", ")
}

impl BlogService {
    /// Unread notification counts across all four categories.
    pub fn news_counts(&self, user_id: &str) -> Result<NewsCounts, BlogError> {
        Ok(NewsCounts {
            likes: self.count_unread(
                "SELECT COUNT(*) AS cnt FROM likes WHERE to_author = ?1 AND viewed = 0",
                user_id,
            )?,
            comments: self.count_unread(
                "SELECT COUNT(*) AS cnt FROM comments c
                 JOIN posts p ON p.id = c.post_id
                 WHERE p.author_id = ?1 AND c.viewed = 0",
                user_id,
            )?,
            forwards: self.count_unread(
                "SELECT COUNT(*) AS cnt FROM posts f
                 JOIN posts o ON o.id = f.forward_of
                 WHERE o.author_id = ?1 AND f.fwd_viewed = 0",
                user_id,
            )?,
            follows: self.count_unread(
                "SELECT COUNT(*) AS cnt FROM follows WHERE to_user = ?1 AND reviewed = 0",
                user_id,
            )?,
        })
    }

    fn count_unread(&self, sql: &str, user_id: &str) -> Result<usize, BlogError> {
        let rows = self.sql
            .query(sql, &[Value::Text(user_id.to_string())])
            .map_err(|e| BlogError::Storage(e.to_string()))?;
        Ok(rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0) as usize)
    }

    /// Open the "likes" category: return the unread likes on this user's
    /// posts and acknowledge exactly those. Once returned, the items stay
    /// read whether or not the caller renders them; an immediate second
    /// call returns an empty list.
    pub fn open_likes(&self, user_id: &str) -> Result<Vec<LikeNotice>, BlogError> {
        let rows = self.sql
            .query(
                "SELECT l.id AS like_id, l.post_id, p.title, l.user_id, u.handle, l.created_at
                 FROM likes l
                 JOIN posts p ON p.id = l.post_id
                 JOIN users u ON u.id = l.user_id
                 WHERE l.to_author = ?1 AND l.viewed = 0
                 ORDER BY l.created_at DESC, l.id DESC",
                &[Value::Text(user_id.to_string())],
            )
            .map_err(|e| BlogError::Storage(e.to_string()))?;

        let mut items = Vec::new();
        let mut ids = Vec::new();
        for row in &rows {
            let text = |name: &str| {
                row.get_str(name)
                    .map(str::to_string)
                    .ok_or_else(|| BlogError::Internal(format!("missing column '{}'", name)))
            };
            ids.push(text("like_id")?);
            items.push(LikeNotice {
                post_id: text("post_id")?,
                post_title: text("title")?,
                from_user: text("user_id")?,
                from_handle: text("handle")?,
                created_at: text("created_at")?,
            });
        }

        self.acknowledge("likes", "viewed", "id", &ids)?;
        Ok(items)
    }

    /// Open the "comments" category (unread comments on this user's posts).
    pub fn open_comments(&self, user_id: &str) -> Result<Vec<CommentNotice>, BlogError> {
        let rows = self.sql
            .query(
                "SELECT c.id AS comment_id, c.post_id, p.title, c.author_id, u.handle,
                        c.content, c.created_at
                 FROM comments c
                 JOIN posts p ON p.id = c.post_id
                 JOIN users u ON u.id = c.author_id
                 WHERE p.author_id = ?1 AND c.viewed = 0
                 ORDER BY c.created_at DESC, c.id DESC",
                &[Value::Text(user_id.to_string())],
            )
            .map_err(|e| BlogError::Storage(e.to_string()))?;

        let mut items = Vec::new();
        let mut ids = Vec::new();
        for row in &rows {
            let text = |name: &str| {
                row.get_str(name)
                    .map(str::to_string)
                    .ok_or_else(|| BlogError::Internal(format!("missing column '{}'", name)))
            };
            ids.push(text("comment_id")?);
            items.push(CommentNotice {
                comment_id: text("comment_id")?,
                post_id: text("post_id")?,
                post_title: text("title")?,
                from_user: text("author_id")?,
                from_handle: text("handle")?,
                content: text("content")?,
                created_at: text("created_at")?,
            });
        }

        self.acknowledge("comments", "viewed", "id", &ids)?;
        Ok(items)
    }

    /// Open the "forwards" category (unread forwards of this user's posts).
    pub fn open_forwards(&self, user_id: &str) -> Result<Vec<ForwardNotice>, BlogError> {
        let rows = self.sql
            .query(
                "SELECT f.id AS fwd_id, f.forward_of, f.title, f.author_id, u.handle,
                        f.created_at
                 FROM posts f
                 JOIN posts o ON o.id = f.forward_of
                 JOIN users u ON u.id = f.author_id
                 WHERE o.author_id = ?1 AND f.fwd_viewed = 0
                 ORDER BY f.created_at DESC, f.id DESC",
                &[Value::Text(user_id.to_string())],
            )
            .map_err(|e| BlogError::Storage(e.to_string()))?;

        let mut items = Vec::new();
        let mut ids = Vec::new();
        for row in &rows {
            let text = |name: &str| {
                row.get_str(name)
                    .map(str::to_string)
                    .ok_or_else(|| BlogError::Internal(format!("missing column '{}'", name)))
            };
            ids.push(text("fwd_id")?);
            items.push(ForwardNotice {
                post_id: text("fwd_id")?,
                original_post_id: text("forward_of")?,
                title: text("title")?,
                from_user: text("author_id")?,
                from_handle: text("handle")?,
                created_at: text("created_at")?,
            });
        }

        self.acknowledge("posts", "fwd_viewed", "id", &ids)?;
        Ok(items)
    }

    /// Open the "follows" category (unreviewed new followers).
    pub fn open_follows(&self, user_id: &str) -> Result<Vec<FollowNotice>, BlogError> {
        let rows = self.sql
            .query(
                "SELECT f.from_user, u.handle, f.created_at
                 FROM follows f
                 JOIN users u ON u.id = f.from_user
                 WHERE f.to_user = ?1 AND f.reviewed = 0
                 ORDER BY f.created_at DESC",
                &[Value::Text(user_id.to_string())],
            )
            .map_err(|e| BlogError::Storage(e.to_string()))?;

        let mut items = Vec::new();
        let mut from_ids = Vec::new();
        for row in &rows {
            let text = |name: &str| {
                row.get_str(name)
                    .map(str::to_string)
                    .ok_or_else(|| BlogError::Internal(format!("missing column '{}'", name)))
            };
            from_ids.push(text("from_user")?);
            items.push(FollowNotice {
                from_user: text("from_user")?,
                from_handle: text("handle")?,
                created_at: text("created_at")?,
            });
        }

        if !from_ids.is_empty() {
            let mut params = vec![Value::Text(user_id.to_string())];
            params.extend(from_ids.iter().map(|id| Value::Text(id.clone())));
            let sql = format!(
                "UPDATE follows SET reviewed = 1 WHERE to_user = ?1 AND from_user IN ({})",
                placeholders(from_ids.len(), 2),
            );
            self.sql
                .exec(&sql, &params)
                .map_err(|e| BlogError::Storage(e.to_string()))?;
        }
        Ok(items)
    }

    /// Mark the selected rows acknowledged, keyed by the ids just read.
    /// Only what was returned gets flagged; anything arriving between the
    /// read and this write stays unread for the next open.
    fn acknowledge(
        &self,
        table: &str,
        flag_col: &str,
        id_col: &str,
        ids: &[String],
    ) -> Result<(), BlogError> {
        if ids.is_empty() {
            return Ok(());
        }
        let sql = format!(
            "UPDATE {} SET {} = 1 WHERE {} IN ({})",
            table,
            flag_col,
            id_col,
            placeholders(ids.len(), 1),
        );
        let params: Vec<Value> = ids.iter().map(|id| Value::Text(id.clone())).collect();
        self.sql
            .exec(&sql, &params)
            .map_err(|e| BlogError::Storage(e.to_string()))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::model::{CreatePost, ForwardRequest};
    use crate::service::testutil::{register, test_service};

    fn publish(svc: &crate::service::BlogService, author: &str, title: &str) -> crate::model::Post {
        svc.publish(
            author,
            CreatePost {
                title: title.to_string(),
                content: "content".to_string(),
                is_private: false,
                music_id: None,
            },
        )
        .unwrap()
    }

    #[test]
    fn like_notification_flow() {
        let (_tmp, svc) = test_service();
        let alice = register(&svc, "alice");
        let bob = register(&svc, "bob");

        let p1 = publish(&svc, &alice.id, "Hello");
        svc.toggle_like(&p1.id, &bob.id).unwrap();

        let post = svc.load_post(&p1.id).unwrap();
        assert_eq!(post.like_count, 1);
        assert_eq!(post.popularity, 1);

        assert_eq!(svc.news_counts(&alice.id).unwrap().likes, 1);

        let notices = svc.open_likes(&alice.id).unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].from_handle, "bob");
        assert_eq!(notices[0].post_id, p1.id);

        assert_eq!(svc.news_counts(&alice.id).unwrap().likes, 0);
        assert!(svc.open_likes(&alice.id).unwrap().is_empty());
    }

    #[test]
    fn open_comments_is_read_once() {
        let (_tmp, svc) = test_service();
        let alice = register(&svc, "alice");
        let bob = register(&svc, "bob");

        let p = publish(&svc, &alice.id, "Hello");
        svc.add_comment(&p.id, &bob.id, "one").unwrap();
        svc.add_comment(&p.id, &bob.id, "two").unwrap();
        svc.add_comment(&p.id, &bob.id, "three").unwrap();

        assert_eq!(svc.news_counts(&alice.id).unwrap().comments, 3);

        let notices = svc.open_comments(&alice.id).unwrap();
        assert_eq!(notices.len(), 3);

        assert_eq!(svc.news_counts(&alice.id).unwrap().comments, 0);
        assert!(svc.open_comments(&alice.id).unwrap().is_empty());
    }

    #[test]
    fn forward_notification_flow() {
        let (_tmp, svc) = test_service();
        let alice = register(&svc, "alice");
        let bob = register(&svc, "bob");

        let p1 = publish(&svc, &alice.id, "Hello");
        let p2 = svc
            .forward(
                &p1.id,
                &bob.id,
                ForwardRequest {
                    title: None,
                    content: "nice post".to_string(),
                    is_private: false,
                },
            )
            .unwrap();

        assert_eq!(svc.news_counts(&alice.id).unwrap().forwards, 1);

        let notices = svc.open_forwards(&alice.id).unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].post_id, p2.id);
        assert_eq!(notices[0].original_post_id, p1.id);
        assert_eq!(notices[0].from_handle, "bob");

        assert_eq!(svc.news_counts(&alice.id).unwrap().forwards, 0);
        assert!(svc.open_forwards(&alice.id).unwrap().is_empty());
    }

    #[test]
    fn private_forward_never_notifies() {
        let (_tmp, svc) = test_service();
        let alice = register(&svc, "alice");
        let bob = register(&svc, "bob");

        let p1 = publish(&svc, &alice.id, "Hello");
        svc.forward(
            &p1.id,
            &bob.id,
            ForwardRequest {
                title: None,
                content: "hidden forward".to_string(),
                is_private: true,
            },
        )
        .unwrap();

        assert_eq!(svc.news_counts(&alice.id).unwrap().forwards, 0);
        assert!(svc.open_forwards(&alice.id).unwrap().is_empty());
    }

    #[test]
    fn follow_notification_flow() {
        let (_tmp, svc) = test_service();
        let alice = register(&svc, "alice");
        let bob = register(&svc, "bob");

        svc.toggle_follow(&bob.id, &alice.id).unwrap();
        assert_eq!(svc.news_counts(&alice.id).unwrap().follows, 1);

        let notices = svc.open_follows(&alice.id).unwrap();
        assert_eq!(notices.len(), 1);
        assert_eq!(notices[0].from_handle, "bob");

        assert_eq!(svc.news_counts(&alice.id).unwrap().follows, 0);
        assert!(svc.open_follows(&alice.id).unwrap().is_empty());

        // The edge survives acknowledgement.
        assert!(svc.is_following(&bob.id, &alice.id).unwrap());
    }

    #[test]
    fn unfollow_retracts_unread_notification() {
        let (_tmp, svc) = test_service();
        let alice = register(&svc, "alice");
        let bob = register(&svc, "bob");

        svc.toggle_follow(&bob.id, &alice.id).unwrap();
        svc.toggle_follow(&bob.id, &alice.id).unwrap();
        assert_eq!(svc.news_counts(&alice.id).unwrap().follows, 0);
    }

    #[test]
    fn unlike_retracts_unread_notification() {
        let (_tmp, svc) = test_service();
        let alice = register(&svc, "alice");
        let bob = register(&svc, "bob");

        let p = publish(&svc, &alice.id, "Hello");
        svc.toggle_like(&p.id, &bob.id).unwrap();
        svc.toggle_like(&p.id, &bob.id).unwrap();
        assert_eq!(svc.news_counts(&alice.id).unwrap().likes, 0);
    }

    #[test]
    fn deleting_a_post_clears_its_pending_notifications() {
        let (_tmp, svc) = test_service();
        let alice = register(&svc, "alice");
        let bob = register(&svc, "bob");

        let p = publish(&svc, &alice.id, "Hello");
        svc.toggle_like(&p.id, &bob.id).unwrap();
        svc.add_comment(&p.id, &bob.id, "hi").unwrap();

        svc.delete_post(&p.id, &alice.id).unwrap();

        let counts = svc.news_counts(&alice.id).unwrap();
        assert_eq!(counts.likes, 0);
        assert_eq!(counts.comments, 0);
    }
}
