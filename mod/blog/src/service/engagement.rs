use minstrel_core::{new_id, now_rfc3339, ListParams};
use minstrel_sql::{Row, Statement, Value};

use crate::model::{Comment, LikeState};
use crate::service::{BlogError, BlogService};

/// Statements removing a like edge. The counter decrement is gated on
/// `changes()` so a delete that matched no row (the edge was already gone
/// by the time this batch ran) leaves the counters alone.
pub(crate) fn unlike_statements(post_id: &str, user_id: &str) -> Vec<Statement> {
    vec![
        Statement::new(
            "DELETE FROM likes WHERE post_id = ?1 AND user_id = ?2",
            vec![
                Value::Text(post_id.to_string()),
                Value::Text(user_id.to_string()),
            ],
        ),
        Statement::new(
            "UPDATE posts SET popularity = popularity - 1,
                              like_count = like_count - 1
             WHERE id = ?1 AND changes() = 1",
            vec![Value::Text(post_id.to_string())],
        ),
    ]
}

/// Statements removing a comment, with the same `changes()` gate as
/// [`unlike_statements`].
pub(crate) fn comment_delete_statements(comment_id: &str, post_id: &str) -> Vec<Statement> {
    vec![
        Statement::new(
            "DELETE FROM comments WHERE id = ?1",
            vec![Value::Text(comment_id.to_string())],
        ),
        Statement::new(
            "UPDATE posts SET comment_count = comment_count - 1
             WHERE id = ?1 AND changes() = 1",
            vec![Value::Text(post_id.to_string())],
        ),
    ]
}

fn comment_from_row(row: &Row) -> Result<Comment, BlogError> {
    let text = |name: &str| -> Result<String, BlogError> {
        row.get_str(name)
            .map(str::to_string)
            .ok_or_else(|| BlogError::Internal(format!("missing column '{}'", name)))
    };
    Ok(Comment {
        id: text("id")?,
        post_id: text("post_id")?,
        author_id: text("author_id")?,
        content: text("content")?,
        viewed: row.get_bool("viewed").unwrap_or(false),
        created_at: text("created_at")?,
    })
}

impl BlogService {
    /// Toggle a like on a post.
    ///
    /// The edge mutation and the counter deltas ride in one transaction:
    /// no observer sees a like edge whose counters don't reflect it, and a
    /// concurrent duplicate toggle fails the whole batch on the unique
    /// (post_id, user_id) constraint instead of double-counting. On the
    /// unlike path the decrement only lands when the delete removed the
    /// edge, so a racing duplicate unlike is a no-op.
    pub fn toggle_like(&self, post_id: &str, user_id: &str) -> Result<LikeState, BlogError> {
        let post = self.load_post(post_id)?;
        if post.author_id == user_id {
            return Err(BlogError::InvalidOperation(
                "cannot like your own post".into(),
            ));
        }

        if self.has_liked(post_id, user_id)? {
            self.sql
                .exec_batch(&unlike_statements(post_id, user_id))
                .map_err(|e| BlogError::Storage(e.to_string()))?;
            return Ok(LikeState { liked: false });
        }

        self.sql
            .exec_batch(&[
                Statement::new(
                    "INSERT INTO likes (id, post_id, user_id, to_author, viewed, created_at)
                     VALUES (?1, ?2, ?3, ?4, 0, ?5)",
                    vec![
                        Value::Text(new_id()),
                        Value::Text(post_id.to_string()),
                        Value::Text(user_id.to_string()),
                        Value::Text(post.author_id.clone()),
                        Value::Text(now_rfc3339()),
                    ],
                ),
                Statement::new(
                    "UPDATE posts SET popularity = popularity + 1,
                                      like_count = like_count + 1
                     WHERE id = ?1",
                    vec![Value::Text(post_id.to_string())],
                ),
            ])
            .map_err(|e| {
                let msg = e.to_string();
                if msg.contains("UNIQUE constraint") {
                    BlogError::Conflict("like already exists".into())
                } else {
                    BlogError::Storage(msg)
                }
            })?;
        Ok(LikeState { liked: true })
    }

    /// Whether the user has liked the post.
    pub fn has_liked(&self, post_id: &str, user_id: &str) -> Result<bool, BlogError> {
        let rows = self.sql
            .query(
                "SELECT 1 AS x FROM likes WHERE post_id = ?1 AND user_id = ?2",
                &[
                    Value::Text(post_id.to_string()),
                    Value::Text(user_id.to_string()),
                ],
            )
            .map_err(|e| BlogError::Storage(e.to_string()))?;
        Ok(!rows.is_empty())
    }

    /// Add a comment to a post. Comment insert and counter increments are
    /// one transaction.
    pub fn add_comment(
        &self,
        post_id: &str,
        author_id: &str,
        content: &str,
    ) -> Result<Comment, BlogError> {
        if content.is_empty() || content.chars().count() > self.config.max_comment_len {
            return Err(BlogError::Validation(format!(
                "comment must be 1..={} characters",
                self.config.max_comment_len
            )));
        }
        self.load_post(post_id)?;

        let comment = Comment {
            id: new_id(),
            post_id: post_id.to_string(),
            author_id: author_id.to_string(),
            content: content.to_string(),
            viewed: false,
            created_at: now_rfc3339(),
        };

        self.sql
            .exec_batch(&[
                Statement::new(
                    "INSERT INTO comments (id, post_id, author_id, content, viewed, created_at)
                     VALUES (?1, ?2, ?3, ?4, 0, ?5)",
                    vec![
                        Value::Text(comment.id.clone()),
                        Value::Text(comment.post_id.clone()),
                        Value::Text(comment.author_id.clone()),
                        Value::Text(comment.content.clone()),
                        Value::Text(comment.created_at.clone()),
                    ],
                ),
                Statement::new(
                    "UPDATE posts SET popularity = popularity + 1,
                                      comment_count = comment_count + 1
                     WHERE id = ?1",
                    vec![Value::Text(post_id.to_string())],
                ),
            ])
            .map_err(|e| BlogError::Storage(e.to_string()))?;

        Ok(comment)
    }

    /// Delete a comment. Allowed for the comment's author and the post's
    /// author.
    ///
    /// Decrements comment_count only. Popularity keeps the credit from the
    /// original comment; this asymmetry with like toggling is inherited
    /// behavior, locked in by tests.
    pub fn delete_comment(&self, comment_id: &str, requester: &str) -> Result<(), BlogError> {
        let comment = self.get_comment(comment_id)?;
        let post = self.load_post(&comment.post_id)?;

        if requester != comment.author_id && requester != post.author_id {
            return Err(BlogError::Forbidden(
                "only the comment author or the post author may delete a comment".into(),
            ));
        }

        self.sql
            .exec_batch(&comment_delete_statements(comment_id, &comment.post_id))
            .map_err(|e| BlogError::Storage(e.to_string()))?;

        Ok(())
    }

    /// Get a comment by id.
    pub fn get_comment(&self, id: &str) -> Result<Comment, BlogError> {
        let rows = self.sql
            .query(
                "SELECT id, post_id, author_id, content, viewed, created_at
                 FROM comments WHERE id = ?1",
                &[Value::Text(id.to_string())],
            )
            .map_err(|e| BlogError::Storage(e.to_string()))?;
        let row = rows
            .first()
            .ok_or_else(|| BlogError::NotFound(format!("comments/{}", id)))?;
        comment_from_row(row)
    }

    /// Comments on a post, newest first.
    pub fn list_comments(
        &self,
        post_id: &str,
        params: &ListParams,
    ) -> Result<Vec<Comment>, BlogError> {
        let rows = self.sql
            .query(
                "SELECT id, post_id, author_id, content, viewed, created_at
                 FROM comments WHERE post_id = ?1
                 ORDER BY created_at DESC, id DESC LIMIT ?2 OFFSET ?3",
                &[
                    Value::Text(post_id.to_string()),
                    Value::Integer(params.limit as i64),
                    Value::Integer(params.offset as i64),
                ],
            )
            .map_err(|e| BlogError::Storage(e.to_string()))?;
        rows.iter().map(comment_from_row).collect()
    }
}
