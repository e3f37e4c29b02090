use argon2::Argon2;
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHasher, SaltString};

use minstrel_core::{merge_patch, new_id, now_rfc3339, ListParams, ListResult};
use minstrel_sql::Value;

use crate::model::{FollowStats, RegisterRequest, User};
use crate::service::{BlogError, BlogService, ACCEPTED_IMAGE_TYPES};

impl BlogService {
    /// Register a new account. The handle must be unique.
    pub fn register(&self, input: RegisterRequest) -> Result<User, BlogError> {
        let handle = input.handle.trim();
        if handle.is_empty() || handle.chars().count() > 32 {
            return Err(BlogError::Validation(
                "handle must be 1..=32 characters".into(),
            ));
        }
        if input.password.chars().count() < 6 {
            return Err(BlogError::Validation(
                "password must be at least 6 characters".into(),
            ));
        }

        let salt = SaltString::generate(&mut OsRng);
        let password_hash = Argon2::default()
            .hash_password(input.password.as_bytes(), &salt)
            .map_err(|e| BlogError::Internal(format!("password hashing failed: {}", e)))?
            .to_string();

        let now = now_rfc3339();
        let user = User {
            id: new_id(),
            handle: handle.to_string(),
            display_name: input.display_name,
            gender: input.gender,
            photo: None,
            created_at: now.clone(),
            updated_at: now.clone(),
        };

        self.insert_record(
            "users",
            &user.id,
            &user,
            &[
                ("handle", Value::Text(user.handle.clone())),
                ("password_hash", Value::Text(password_hash)),
                ("created_at", Value::Text(now.clone())),
                ("updated_at", Value::Text(now)),
            ],
        )
        .map_err(|e| match e {
            BlogError::Conflict(_) => {
                BlogError::Conflict(format!("handle '{}' is taken", handle))
            }
            other => other,
        })?;

        tracing::info!(user_id = %user.id, handle = %user.handle, "registered user");
        Ok(user)
    }

    /// Get a user by id.
    pub fn get_user(&self, id: &str) -> Result<User, BlogError> {
        self.get_record("users", id)
    }

    /// Look up a user by handle. Returns the record alongside its stored
    /// password hash, for login verification.
    pub(crate) fn find_user_by_handle(
        &self,
        handle: &str,
    ) -> Result<Option<(User, String)>, BlogError> {
        let rows = self.sql
            .query(
                "SELECT data, password_hash FROM users WHERE handle = ?1",
                &[Value::Text(handle.to_string())],
            )
            .map_err(|e| BlogError::Storage(e.to_string()))?;

        let Some(row) = rows.first() else {
            return Ok(None);
        };
        let data = row
            .get_str("data")
            .ok_or_else(|| BlogError::Internal("missing data column".into()))?;
        let hash = row
            .get_str("password_hash")
            .ok_or_else(|| BlogError::Internal("missing password_hash column".into()))?;
        let user: User =
            serde_json::from_str(data).map_err(|e| BlogError::Internal(e.to_string()))?;
        Ok(Some((user, hash.to_string())))
    }

    /// Update a user's profile with a JSON merge patch.
    ///
    /// Identity fields (id, handle, created_at) cannot be patched.
    pub fn update_profile(
        &self,
        id: &str,
        patch: serde_json::Value,
    ) -> Result<User, BlogError> {
        let user: User = self.get_record("users", id)?;

        let mut value = serde_json::to_value(&user)
            .map_err(|e| BlogError::Internal(e.to_string()))?;
        merge_patch(&mut value, &patch);

        let mut updated: User = serde_json::from_value(value)
            .map_err(|e| BlogError::Validation(format!("invalid profile patch: {}", e)))?;
        updated.id = user.id;
        updated.handle = user.handle;
        updated.created_at = user.created_at;
        updated.updated_at = now_rfc3339();

        self.update_record(
            "users",
            id,
            &updated,
            &[("updated_at", Value::Text(updated.updated_at.clone()))],
        )?;

        Ok(updated)
    }

    /// Store a profile photo and attach it to the user.
    pub fn upload_photo(
        &self,
        user_id: &str,
        content_type: &str,
        data: &[u8],
    ) -> Result<User, BlogError> {
        if !ACCEPTED_IMAGE_TYPES.contains(&content_type) {
            return Err(BlogError::Validation(format!(
                "unsupported image type '{}'",
                content_type
            )));
        }
        if data.len() > self.config.max_image_size {
            return Err(BlogError::Validation(format!(
                "image exceeds maximum size of {} bytes",
                self.config.max_image_size
            )));
        }

        let mut user: User = self.get_record("users", user_id)?;

        let ext = if content_type == "image/png" { "png" } else { "jpg" };
        let key = format!("photos/{}.{}", user_id, ext);
        self.blob.put(&key, data)?;

        user.photo = Some(key);
        user.updated_at = now_rfc3339();
        self.update_record(
            "users",
            user_id,
            &user,
            &[("updated_at", Value::Text(user.updated_at.clone()))],
        )?;

        Ok(user)
    }

    /// Search users by handle substring. Without a query, lists all users
    /// newest-first.
    pub fn search_users(&self, params: &ListParams) -> Result<ListResult<User>, BlogError> {
        let (where_sql, mut query_params) = match &params.q {
            Some(q) if !q.is_empty() => (
                " WHERE handle LIKE ?1 OR json_extract(data, '$.display_name') LIKE ?1"
                    .to_string(),
                vec![Value::Text(format!("%{}%", q))],
            ),
            _ => (String::new(), Vec::new()),
        };

        let count_sql = format!("SELECT COUNT(*) AS cnt FROM users{}", where_sql);
        let count_rows = self.sql
            .query(&count_sql, &query_params)
            .map_err(|e| BlogError::Storage(e.to_string()))?;
        let total = count_rows
            .first()
            .and_then(|r| r.get_i64("cnt"))
            .unwrap_or(0) as usize;

        let limit_idx = query_params.len() + 1;
        let offset_idx = query_params.len() + 2;
        query_params.push(Value::Integer(params.limit as i64));
        query_params.push(Value::Integer(params.offset as i64));

        let sql = format!(
            "SELECT data FROM users{} ORDER BY created_at DESC LIMIT ?{} OFFSET ?{}",
            where_sql, limit_idx, offset_idx,
        );
        let rows = self.sql
            .query(&sql, &query_params)
            .map_err(|e| BlogError::Storage(e.to_string()))?;

        let mut items = Vec::new();
        for row in &rows {
            let data = row
                .get_str("data")
                .ok_or_else(|| BlogError::Internal("missing data column".into()))?;
            let user: User =
                serde_json::from_str(data).map_err(|e| BlogError::Internal(e.to_string()))?;
            items.push(user);
        }

        Ok(ListResult { items, total })
    }

    /// Following/follower counts for a user.
    pub fn follow_stats(&self, user_id: &str) -> Result<FollowStats, BlogError> {
        let following = self.count_follows("from_user", user_id)?;
        let followers = self.count_follows("to_user", user_id)?;
        Ok(FollowStats {
            following,
            followers,
        })
    }

    fn count_follows(&self, column: &str, user_id: &str) -> Result<usize, BlogError> {
        let sql = format!("SELECT COUNT(*) AS cnt FROM follows WHERE {} = ?1", column);
        let rows = self.sql
            .query(&sql, &[Value::Text(user_id.to_string())])
            .map_err(|e| BlogError::Storage(e.to_string()))?;
        Ok(rows.first().and_then(|r| r.get_i64("cnt")).unwrap_or(0) as usize)
    }
}
