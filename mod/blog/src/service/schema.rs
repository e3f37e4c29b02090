use minstrel_sql::SQLStore;

use crate::service::BlogError;

/// Initialize the SQLite schema for all blog resources.
pub fn init_schema(sql: &dyn SQLStore) -> Result<(), BlogError> {
    let statements = [
        // Users table: account identity. Password hash lives in its own
        // column so it never rides along in the serialized record.
        "CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            handle TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_users_handle ON users(handle)",

        // Follow edges: at most one per ordered pair, enforced by the PK.
        "CREATE TABLE IF NOT EXISTS follows (
            from_user TEXT NOT NULL,
            to_user TEXT NOT NULL,
            reviewed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            PRIMARY KEY (from_user, to_user),
            FOREIGN KEY (from_user) REFERENCES users(id),
            FOREIGN KEY (to_user) REFERENCES users(id)
        )",
        "CREATE INDEX IF NOT EXISTS idx_follows_to ON follows(to_user, reviewed)",

        // Posts: plain columns so counters can be incremented in place,
        // inside the same transaction as the edge mutation that caused
        // the change. forward_of is a weak reference, deliberately not a
        // foreign key: the target may be deleted out from under it.
        "CREATE TABLE IF NOT EXISTS posts (
            id TEXT PRIMARY KEY,
            author_id TEXT NOT NULL,
            title TEXT NOT NULL,
            content TEXT NOT NULL,
            is_private INTEGER NOT NULL DEFAULT 0,
            forward_of TEXT,
            music_id TEXT,
            popularity INTEGER NOT NULL DEFAULT 0,
            like_count INTEGER NOT NULL DEFAULT 0,
            comment_count INTEGER NOT NULL DEFAULT 0,
            forward_count INTEGER NOT NULL DEFAULT 0,
            view_count INTEGER NOT NULL DEFAULT 0,
            fwd_viewed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            FOREIGN KEY (author_id) REFERENCES users(id)
        )",
        "CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id)",
        "CREATE INDEX IF NOT EXISTS idx_posts_forward ON posts(forward_of)",
        "CREATE INDEX IF NOT EXISTS idx_posts_popularity ON posts(popularity)",

        // Like edges: surrogate id so notifications can be acknowledged
        // by id; the (post_id, user_id) pair stays unique regardless.
        "CREATE TABLE IF NOT EXISTS likes (
            id TEXT PRIMARY KEY,
            post_id TEXT NOT NULL,
            user_id TEXT NOT NULL,
            to_author TEXT NOT NULL,
            viewed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL,
            UNIQUE (post_id, user_id)
        )",
        "CREATE INDEX IF NOT EXISTS idx_likes_target ON likes(to_author, viewed)",
        "CREATE INDEX IF NOT EXISTS idx_likes_post ON likes(post_id)",

        // Comments.
        "CREATE TABLE IF NOT EXISTS comments (
            id TEXT PRIMARY KEY,
            post_id TEXT NOT NULL,
            author_id TEXT NOT NULL,
            content TEXT NOT NULL,
            viewed INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL
        )",
        "CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id)",

        // Audio assets (record pattern: JSON data column).
        "CREATE TABLE IF NOT EXISTS music (
            id TEXT PRIMARY KEY,
            data TEXT NOT NULL,
            created_at TEXT NOT NULL
        )",

        // Sessions: JWT issuance records.
        "CREATE TABLE IF NOT EXISTS sessions (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            revoked INTEGER NOT NULL DEFAULT 0,
            data TEXT NOT NULL,
            issued_at TEXT NOT NULL,
            expires_at TEXT NOT NULL,
            FOREIGN KEY (user_id) REFERENCES users(id) ON DELETE CASCADE
        )",
        "CREATE INDEX IF NOT EXISTS idx_sessions_user ON sessions(user_id)",
    ];

    for stmt in &statements {
        sql.exec(stmt, &[])
            .map_err(|e| BlogError::Storage(e.to_string()))?;
    }

    Ok(())
}
