use minstrel_core::{new_id, now_rfc3339, ListParams};
use minstrel_sql::{Row, Statement, Value};

use crate::model::{CreatePost, ForwardRequest, Post, PostDetail, Viewer};
use crate::service::{BlogError, BlogService};

const POST_COLUMNS: &str = "id, author_id, title, content, is_private, forward_of, music_id, \
     popularity, like_count, comment_count, forward_count, view_count, fwd_viewed, created_at";

/// Parse a posts row (plain columns, not the JSON record pattern).
pub(crate) fn post_from_row(row: &Row) -> Result<Post, BlogError> {
    let text = |name: &str| -> Result<String, BlogError> {
        row.get_str(name)
            .map(str::to_string)
            .ok_or_else(|| BlogError::Internal(format!("missing column '{}'", name)))
    };
    let int = |name: &str| -> Result<i64, BlogError> {
        row.get_i64(name)
            .ok_or_else(|| BlogError::Internal(format!("missing column '{}'", name)))
    };

    Ok(Post {
        id: text("id")?,
        author_id: text("author_id")?,
        title: text("title")?,
        content: text("content")?,
        is_private: int("is_private")? != 0,
        forward_of: row.get_str("forward_of").map(str::to_string),
        music_id: row.get_str("music_id").map(str::to_string),
        popularity: int("popularity")?,
        like_count: int("like_count")?,
        comment_count: int("comment_count")?,
        forward_count: int("forward_count")?,
        view_count: int("view_count")?,
        fwd_viewed: int("fwd_viewed")? != 0,
        created_at: text("created_at")?,
    })
}

impl BlogService {
    /// Publish a new post with all counters at zero.
    pub fn publish(&self, author_id: &str, input: CreatePost) -> Result<Post, BlogError> {
        let title = input.title.trim().to_string();
        if title.is_empty() || title.chars().count() > self.config.max_title_len {
            return Err(BlogError::Validation(format!(
                "title must be 1..={} characters",
                self.config.max_title_len
            )));
        }
        if input.content.is_empty()
            || input.content.chars().count() > self.config.max_content_len
        {
            return Err(BlogError::Validation(format!(
                "content must be 1..={} characters",
                self.config.max_content_len
            )));
        }
        if let Some(music_id) = &input.music_id {
            // The referenced audio asset must exist.
            self.get_music(music_id)?;
        }

        let post = Post {
            id: new_id(),
            author_id: author_id.to_string(),
            title,
            content: input.content,
            is_private: input.is_private,
            forward_of: None,
            music_id: input.music_id,
            popularity: 0,
            like_count: 0,
            comment_count: 0,
            forward_count: 0,
            view_count: 0,
            fwd_viewed: false,
            created_at: now_rfc3339(),
        };

        self.sql
            .exec(&insert_post_sql(), &insert_post_params(&post))
            .map_err(|e| BlogError::Storage(e.to_string()))?;

        tracing::info!(post_id = %post.id, author = %post.author_id, "published post");
        Ok(post)
    }

    /// Forward a post with commentary.
    ///
    /// The new post references the original and inherits its audio asset.
    /// The original's popularity and forward_count move together with the
    /// insert, in one transaction. A private forward is born acknowledged:
    /// nobody but its author can see it, so there is nothing to notify.
    pub fn forward(
        &self,
        original_id: &str,
        author_id: &str,
        input: ForwardRequest,
    ) -> Result<Post, BlogError> {
        let original = self.load_post(original_id)?;
        if original.is_private && original.author_id != author_id {
            return Err(BlogError::NotFound(format!("posts/{}", original_id)));
        }
        if input.content.is_empty()
            || input.content.chars().count() > self.config.max_content_len
        {
            return Err(BlogError::Validation(format!(
                "content must be 1..={} characters",
                self.config.max_content_len
            )));
        }

        let title = match input.title {
            Some(t) if !t.trim().is_empty() => t.trim().to_string(),
            _ => format!("Fwd: {}", original.title),
        };
        let title: String = title.chars().take(self.config.max_title_len).collect();

        let post = Post {
            id: new_id(),
            author_id: author_id.to_string(),
            title,
            content: input.content,
            is_private: input.is_private,
            forward_of: Some(original.id.clone()),
            music_id: original.music_id.clone(),
            popularity: 0,
            like_count: 0,
            comment_count: 0,
            forward_count: 0,
            view_count: 0,
            fwd_viewed: input.is_private,
            created_at: now_rfc3339(),
        };

        self.sql
            .exec_batch(&[
                Statement::new(insert_post_sql(), insert_post_params(&post)),
                Statement::new(
                    "UPDATE posts SET popularity = popularity + 1,
                                      forward_count = forward_count + 1
                     WHERE id = ?1",
                    vec![Value::Text(original.id.clone())],
                ),
            ])
            .map_err(|e| BlogError::Storage(e.to_string()))?;

        Ok(post)
    }

    /// Load a post without visibility filtering. Internal use only.
    pub(crate) fn load_post(&self, id: &str) -> Result<Post, BlogError> {
        let sql = format!("SELECT {} FROM posts WHERE id = ?1", POST_COLUMNS);
        let rows = self.sql
            .query(&sql, &[Value::Text(id.to_string())])
            .map_err(|e| BlogError::Storage(e.to_string()))?;
        let row = rows
            .first()
            .ok_or_else(|| BlogError::NotFound(format!("posts/{}", id)))?;
        post_from_row(row)
    }

    /// Get a post's detail view for a given viewer.
    ///
    /// Private posts are visible only to their author and are reported as
    /// not found to everyone else. A forward whose source is deleted or
    /// hidden resolves with `forward_source = None`.
    pub fn get_post(&self, viewer: &Viewer, id: &str) -> Result<PostDetail, BlogError> {
        let post = self.load_post(id)?;
        if post.is_private && !viewer.is_user(&post.author_id) {
            return Err(BlogError::NotFound(format!("posts/{}", id)));
        }

        let author_handle = self.get_user(&post.author_id)?.handle;

        let forward_source = match &post.forward_of {
            None => None,
            Some(source_id) => match self.load_post(source_id) {
                Ok(source) => {
                    if source.is_private && !viewer.is_user(&source.author_id) {
                        None
                    } else {
                        Some(source)
                    }
                }
                Err(BlogError::NotFound(_)) => None,
                Err(e) => return Err(e),
            },
        };

        let liked = match viewer.user_id() {
            Some(user_id) => self.has_liked(&post.id, user_id)?,
            None => false,
        };

        Ok(PostDetail {
            post,
            author_handle,
            forward_source,
            liked,
        })
    }

    /// Detail view that counts the read. Increments first, then re-reads,
    /// so the returned post already carries this view.
    pub fn view_post(&self, viewer: &Viewer, id: &str) -> Result<PostDetail, BlogError> {
        let mut detail = self.get_post(viewer, id)?;
        self.record_view(id)?;
        detail.post = self.load_post(id)?;
        Ok(detail)
    }

    /// Count a view. Every retrieval counts, the author's own included.
    pub fn record_view(&self, id: &str) -> Result<(), BlogError> {
        let affected = self.sql
            .exec(
                "UPDATE posts SET view_count = view_count + 1 WHERE id = ?1",
                &[Value::Text(id.to_string())],
            )
            .map_err(|e| BlogError::Storage(e.to_string()))?;
        if affected == 0 {
            return Err(BlogError::NotFound(format!("posts/{}", id)));
        }
        Ok(())
    }

    /// Delete a post and everything attached to it.
    ///
    /// Comments and likes are owned by the post and go with it. Posts that
    /// forwarded this one keep their `forward_of` reference pointing at
    /// nothing; lookups treat that as "source unavailable".
    pub fn delete_post(&self, id: &str, requester: &str) -> Result<(), BlogError> {
        let post = self.load_post(id)?;
        if post.author_id != requester {
            return Err(BlogError::Forbidden(
                "only the author may delete a post".into(),
            ));
        }

        self.sql
            .exec_batch(&[
                Statement::new(
                    "DELETE FROM comments WHERE post_id = ?1",
                    vec![Value::Text(id.to_string())],
                ),
                Statement::new(
                    "DELETE FROM likes WHERE post_id = ?1",
                    vec![Value::Text(id.to_string())],
                ),
                Statement::new(
                    "DELETE FROM posts WHERE id = ?1",
                    vec![Value::Text(id.to_string())],
                ),
            ])
            .map_err(|e| BlogError::Storage(e.to_string()))?;

        tracing::info!(post_id = %id, "deleted post");
        Ok(())
    }

    /// Public posts from accounts the viewer follows, newest first.
    pub fn home_feed(
        &self,
        viewer: &Viewer,
        params: &ListParams,
    ) -> Result<Vec<Post>, BlogError> {
        let user_id = viewer
            .user_id()
            .ok_or_else(|| BlogError::Unauthorized("login required".into()))?;

        let sql = format!(
            "SELECT {} FROM posts p
             JOIN follows f ON f.to_user = p.author_id
             WHERE f.from_user = ?1 AND p.is_private = 0
             ORDER BY p.created_at DESC, p.id DESC
             LIMIT ?2 OFFSET ?3",
            qualified_post_columns("p"),
        );
        self.query_posts(
            &sql,
            &[
                Value::Text(user_id.to_string()),
                Value::Integer(params.limit as i64),
                Value::Integer(params.offset as i64),
            ],
        )
    }

    /// A user's posts, newest first. Private posts appear only when the
    /// viewer is that user.
    pub fn user_posts(
        &self,
        viewer: &Viewer,
        user_id: &str,
        params: &ListParams,
    ) -> Result<Vec<Post>, BlogError> {
        self.get_user(user_id)?;

        let visibility = if viewer.is_user(user_id) {
            ""
        } else {
            " AND is_private = 0"
        };
        let sql = format!(
            "SELECT {} FROM posts WHERE author_id = ?1{}
             ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
            POST_COLUMNS, visibility,
        );
        self.query_posts(
            &sql,
            &[
                Value::Text(user_id.to_string()),
                Value::Integer(params.limit as i64),
                Value::Integer(params.offset as i64),
            ],
        )
    }

    /// The most popular public posts.
    pub fn top_posts(&self, limit: usize) -> Result<Vec<Post>, BlogError> {
        let sql = format!(
            "SELECT {} FROM posts WHERE is_private = 0
             ORDER BY popularity DESC, id DESC LIMIT ?1",
            POST_COLUMNS,
        );
        self.query_posts(&sql, &[Value::Integer(limit as i64)])
    }

    /// Public posts whose title contains the query, newest first.
    pub fn search_posts(&self, params: &ListParams) -> Result<Vec<Post>, BlogError> {
        let (filter, mut query_params) = match &params.q {
            Some(q) if !q.is_empty() => (
                " AND title LIKE ?1",
                vec![Value::Text(format!("%{}%", q))],
            ),
            _ => ("", Vec::new()),
        };

        let limit_idx = query_params.len() + 1;
        let offset_idx = query_params.len() + 2;
        query_params.push(Value::Integer(params.limit as i64));
        query_params.push(Value::Integer(params.offset as i64));

        let sql = format!(
            "SELECT {} FROM posts WHERE is_private = 0{}
             ORDER BY created_at DESC, id DESC LIMIT ?{} OFFSET ?{}",
            POST_COLUMNS, filter, limit_idx, offset_idx,
        );
        self.query_posts(&sql, &query_params)
    }

    fn query_posts(&self, sql: &str, params: &[Value]) -> Result<Vec<Post>, BlogError> {
        let rows = self.sql
            .query(sql, params)
            .map_err(|e| BlogError::Storage(e.to_string()))?;
        rows.iter().map(post_from_row).collect()
    }
}

fn qualified_post_columns(alias: &str) -> String {
    POST_COLUMNS
        .split(", ")
        .map(|c| format!("{}.{}", alias, c))
        .collect::<Vec<_>>()
        .join(", ")
}

fn insert_post_sql() -> String {
    format!(
        "INSERT INTO posts ({}) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
        POST_COLUMNS,
    )
}

fn insert_post_params(post: &Post) -> Vec<Value> {
    vec![
        Value::Text(post.id.clone()),
        Value::Text(post.author_id.clone()),
        Value::Text(post.title.clone()),
        Value::Text(post.content.clone()),
        Value::Integer(post.is_private as i64),
        post.forward_of
            .as_ref()
            .map(|v| Value::Text(v.clone()))
            .unwrap_or(Value::Null),
        post.music_id
            .as_ref()
            .map(|v| Value::Text(v.clone()))
            .unwrap_or(Value::Null),
        Value::Integer(post.popularity),
        Value::Integer(post.like_count),
        Value::Integer(post.comment_count),
        Value::Integer(post.forward_count),
        Value::Integer(post.view_count),
        Value::Integer(post.fwd_viewed as i64),
        Value::Text(post.created_at.clone()),
    ]
}

#[cfg(test)]
mod tests {
    use minstrel_core::ListParams;

    use crate::model::{CreatePost, ForwardRequest, Viewer};
    use crate::service::testutil::{register, test_service};
    use crate::service::BlogError;

    fn create(title: &str) -> CreatePost {
        CreatePost {
            title: title.to_string(),
            content: "some content".to_string(),
            is_private: false,
            music_id: None,
        }
    }

    fn viewer_for(user: &crate::model::User) -> Viewer {
        Viewer::Authenticated(crate::model::Claims {
            sub: user.id.clone(),
            handle: user.handle.clone(),
            sid: "test".to_string(),
            iat: 0,
            exp: i64::MAX,
        })
    }

    #[test]
    fn publish_starts_with_zero_counters() {
        let (_tmp, svc) = test_service();
        let alice = register(&svc, "alice");

        let post = svc.publish(&alice.id, create("Hello")).unwrap();
        assert_eq!(post.popularity, 0);
        assert_eq!(post.like_count, 0);
        assert_eq!(post.comment_count, 0);
        assert_eq!(post.forward_count, 0);
        assert_eq!(post.view_count, 0);
        assert!(post.forward_of.is_none());
    }

    #[test]
    fn publish_validates_bounds() {
        let (_tmp, svc) = test_service();
        let alice = register(&svc, "alice");

        let err = svc.publish(&alice.id, create("")).unwrap_err();
        assert!(matches!(err, BlogError::Validation(_)));

        let long_title: String = "x".repeat(101);
        let err = svc.publish(&alice.id, create(&long_title)).unwrap_err();
        assert!(matches!(err, BlogError::Validation(_)));

        let err = svc
            .publish(
                &alice.id,
                CreatePost {
                    title: "ok".to_string(),
                    content: String::new(),
                    is_private: false,
                    music_id: None,
                },
            )
            .unwrap_err();
        assert!(matches!(err, BlogError::Validation(_)));
    }

    #[test]
    fn publish_rejects_unknown_music() {
        let (_tmp, svc) = test_service();
        let alice = register(&svc, "alice");

        let err = svc
            .publish(
                &alice.id,
                CreatePost {
                    title: "song post".to_string(),
                    content: "listen".to_string(),
                    is_private: false,
                    music_id: Some("missing".to_string()),
                },
            )
            .unwrap_err();
        assert!(matches!(err, BlogError::NotFound(_)));
    }

    #[test]
    fn forward_updates_original_counters_atomically() {
        let (_tmp, svc) = test_service();
        let alice = register(&svc, "alice");
        let bob = register(&svc, "bob");

        let p1 = svc.publish(&alice.id, create("Hello")).unwrap();
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

        assert_eq!(p2.forward_of.as_deref(), Some(p1.id.as_str()));
        assert!(!p2.fwd_viewed);
        assert_eq!(p2.title, "Fwd: Hello");

        let original = svc.load_post(&p1.id).unwrap();
        assert_eq!(original.forward_count, 1);
        assert_eq!(original.popularity, 1);
    }

    #[test]
    fn private_forward_needs_no_notification() {
        let (_tmp, svc) = test_service();
        let alice = register(&svc, "alice");
        let bob = register(&svc, "bob");

        let p1 = svc.publish(&alice.id, create("Hello")).unwrap();
        let p2 = svc
            .forward(
                &p1.id,
                &bob.id,
                ForwardRequest {
                    title: None,
                    content: "for my eyes only".to_string(),
                    is_private: true,
                },
            )
            .unwrap();
        assert!(p2.fwd_viewed);
    }

    #[test]
    fn forward_inherits_music() {
        let (_tmp, svc) = test_service();
        let alice = register(&svc, "alice");
        let bob = register(&svc, "bob");

        let music = svc
            .upload_music(Some("Artist"), "Song", "audio/mpeg", b"mp3-bytes")
            .unwrap();
        let p1 = svc
            .publish(
                &alice.id,
                CreatePost {
                    title: "with music".to_string(),
                    content: "listen".to_string(),
                    is_private: false,
                    music_id: Some(music.id.clone()),
                },
            )
            .unwrap();

        let p2 = svc
            .forward(
                &p1.id,
                &bob.id,
                ForwardRequest {
                    title: None,
                    content: "great track".to_string(),
                    is_private: false,
                },
            )
            .unwrap();
        assert_eq!(p2.music_id.as_deref(), Some(music.id.as_str()));
    }

    #[test]
    fn private_posts_hidden_from_others() {
        let (_tmp, svc) = test_service();
        let alice = register(&svc, "alice");
        let bob = register(&svc, "bob");

        let p = svc
            .publish(
                &alice.id,
                CreatePost {
                    title: "secret".to_string(),
                    content: "mine".to_string(),
                    is_private: true,
                    music_id: None,
                },
            )
            .unwrap();

        assert!(svc.get_post(&viewer_for(&alice), &p.id).is_ok());
        let err = svc.get_post(&viewer_for(&bob), &p.id).unwrap_err();
        assert!(matches!(err, BlogError::NotFound(_)));
        let err = svc.get_post(&Viewer::Anonymous, &p.id).unwrap_err();
        assert!(matches!(err, BlogError::NotFound(_)));
    }

    #[test]
    fn record_view_counts_every_read() {
        let (_tmp, svc) = test_service();
        let alice = register(&svc, "alice");
        let p = svc.publish(&alice.id, create("Hello")).unwrap();

        svc.record_view(&p.id).unwrap();
        svc.record_view(&p.id).unwrap();
        let post = svc.load_post(&p.id).unwrap();
        assert_eq!(post.view_count, 2);
        // Views do not feed popularity.
        assert_eq!(post.popularity, 0);

        assert!(matches!(
            svc.record_view("missing").unwrap_err(),
            BlogError::NotFound(_)
        ));
    }

    #[test]
    fn view_post_returns_the_counted_view() {
        let (_tmp, svc) = test_service();
        let alice = register(&svc, "alice");
        let p = svc.publish(&alice.id, create("Hello")).unwrap();

        let detail = svc.view_post(&Viewer::Anonymous, &p.id).unwrap();
        assert_eq!(detail.post.view_count, 1);

        let detail = svc.view_post(&Viewer::Anonymous, &p.id).unwrap();
        assert_eq!(detail.post.view_count, 2);
    }

    #[test]
    fn delete_cascades_and_leaves_forward_dangling() {
        let (_tmp, svc) = test_service();
        let alice = register(&svc, "alice");
        let bob = register(&svc, "bob");

        let p1 = svc.publish(&alice.id, create("Hello")).unwrap();
        svc.toggle_like(&p1.id, &bob.id).unwrap();
        svc.add_comment(&p1.id, &bob.id, "first!").unwrap();
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

        // Only the author can delete.
        let err = svc.delete_post(&p1.id, &bob.id).unwrap_err();
        assert!(matches!(err, BlogError::Forbidden(_)));

        svc.delete_post(&p1.id, &alice.id).unwrap();
        assert!(matches!(
            svc.load_post(&p1.id).unwrap_err(),
            BlogError::NotFound(_)
        ));

        // Attached engagement rows went with the post.
        let comments = svc.list_comments(&p1.id, &ListParams::default()).unwrap();
        assert!(comments.is_empty());
        assert!(!svc.has_liked(&p1.id, &bob.id).unwrap());

        // The forward survives with a dangling reference, resolved as
        // "source unavailable" rather than an error.
        let detail = svc.get_post(&viewer_for(&bob), &p2.id).unwrap();
        assert_eq!(detail.post.forward_of.as_deref(), Some(p1.id.as_str()));
        assert!(detail.forward_source.is_none());
    }

    #[test]
    fn home_feed_shows_followed_public_posts() {
        let (_tmp, svc) = test_service();
        let alice = register(&svc, "alice");
        let bob = register(&svc, "bob");
        let carol = register(&svc, "carol");

        svc.toggle_follow(&alice.id, &bob.id).unwrap();

        svc.publish(&bob.id, create("from bob")).unwrap();
        svc.publish(
            &bob.id,
            CreatePost {
                title: "bob private".to_string(),
                content: "hidden".to_string(),
                is_private: true,
                music_id: None,
            },
        )
        .unwrap();
        svc.publish(&carol.id, create("from carol")).unwrap();

        let feed = svc
            .home_feed(&viewer_for(&alice), &ListParams::default())
            .unwrap();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].title, "from bob");

        assert!(matches!(
            svc.home_feed(&Viewer::Anonymous, &ListParams::default())
                .unwrap_err(),
            BlogError::Unauthorized(_)
        ));
    }

    #[test]
    fn user_posts_hides_private_from_others() {
        let (_tmp, svc) = test_service();
        let alice = register(&svc, "alice");
        let bob = register(&svc, "bob");

        svc.publish(&alice.id, create("public")).unwrap();
        svc.publish(
            &alice.id,
            CreatePost {
                title: "private".to_string(),
                content: "mine".to_string(),
                is_private: true,
                music_id: None,
            },
        )
        .unwrap();

        let own = svc
            .user_posts(&viewer_for(&alice), &alice.id, &ListParams::default())
            .unwrap();
        assert_eq!(own.len(), 2);

        let visible = svc
            .user_posts(&viewer_for(&bob), &alice.id, &ListParams::default())
            .unwrap();
        assert_eq!(visible.len(), 1);
        assert_eq!(visible[0].title, "public");
    }

    #[test]
    fn top_posts_orders_by_popularity() {
        let (_tmp, svc) = test_service();
        let alice = register(&svc, "alice");
        let bob = register(&svc, "bob");
        let carol = register(&svc, "carol");

        let quiet = svc.publish(&alice.id, create("quiet")).unwrap();
        let hot = svc.publish(&alice.id, create("hot")).unwrap();
        svc.toggle_like(&hot.id, &bob.id).unwrap();
        svc.toggle_like(&hot.id, &carol.id).unwrap();

        let top = svc.top_posts(5).unwrap();
        assert_eq!(top[0].id, hot.id);
        assert!(top.iter().any(|p| p.id == quiet.id));
    }

    #[test]
    fn search_posts_matches_title_substring() {
        let (_tmp, svc) = test_service();
        let alice = register(&svc, "alice");

        svc.publish(&alice.id, create("rust diaries")).unwrap();
        svc.publish(&alice.id, create("cooking")).unwrap();

        let hits = svc
            .search_posts(&ListParams {
                q: Some("rust".to_string()),
                ..Default::default()
            })
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].title, "rust diaries");
    }
}
