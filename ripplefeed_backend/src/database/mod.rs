pub mod models;
pub mod repositories;

use crate::config::RipplefeedPaths;
use anyhow::{anyhow, Result};
use rusqlite::Connection;
use std::sync::{Arc, Mutex};

pub(crate) const MIGRATIONS: &str = r#"
    PRAGMA journal_mode = WAL;
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS users (
        id TEXT PRIMARY KEY,
        email TEXT NOT NULL UNIQUE,
        first_name TEXT NOT NULL,
        last_name TEXT NOT NULL,
        role TEXT NOT NULL DEFAULT 'user',
        status TEXT NOT NULL DEFAULT 'active',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS posts (
        id TEXT PRIMARY KEY,
        author_id TEXT NOT NULL,
        content TEXT NOT NULL,
        image TEXT,
        visibility TEXT NOT NULL DEFAULT 'public',
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        deleted INTEGER NOT NULL DEFAULT 0,
        deleted_at TEXT,
        FOREIGN KEY (author_id) REFERENCES users(id)
    );

    CREATE TABLE IF NOT EXISTS comments (
        id TEXT PRIMARY KEY,
        post_id TEXT NOT NULL,
        author_id TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        FOREIGN KEY (post_id) REFERENCES posts(id) ON DELETE CASCADE,
        FOREIGN KEY (author_id) REFERENCES users(id)
    );

    CREATE TABLE IF NOT EXISTS replies (
        id TEXT PRIMARY KEY,
        comment_id TEXT NOT NULL,
        author_id TEXT NOT NULL,
        content TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        FOREIGN KEY (comment_id) REFERENCES comments(id) ON DELETE CASCADE,
        FOREIGN KEY (author_id) REFERENCES users(id)
    );

    -- Polymorphic edge table: subject_id points at a post, comment, or reply
    -- depending on subject_kind, so referential integrity is enforced by the
    -- services rather than a foreign key.
    CREATE TABLE IF NOT EXISTS likes (
        subject_kind TEXT NOT NULL,
        subject_id TEXT NOT NULL,
        user_id TEXT NOT NULL,
        created_at TEXT NOT NULL,
        PRIMARY KEY (subject_kind, subject_id, user_id)
    );

    CREATE INDEX IF NOT EXISTS idx_posts_author ON posts(author_id, created_at);
    CREATE INDEX IF NOT EXISTS idx_posts_visibility ON posts(visibility, created_at);
    CREATE INDEX IF NOT EXISTS idx_comments_post ON comments(post_id);
    CREATE INDEX IF NOT EXISTS idx_replies_comment ON replies(comment_id);
    CREATE INDEX IF NOT EXISTS idx_likes_subject ON likes(subject_kind, subject_id);
"#;

#[derive(Clone)]
pub struct Database {
    conn: Arc<Mutex<Connection>>,
    newly_created: bool,
}

impl Database {
    pub fn connect(paths: &RipplefeedPaths) -> Result<Self> {
        let newly_created = !paths.db_path.exists();
        let conn = Connection::open(&paths.db_path)?;
        Ok(Self::from_connection(conn, newly_created))
    }

    pub fn from_connection(conn: Connection, newly_created: bool) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
            newly_created,
        }
    }

    pub fn ensure_migrations(&self) -> Result<bool> {
        self.with_conn(|conn| -> Result<()> {
            conn.execute_batch(MIGRATIONS)?;
            Ok(())
        })?;
        Ok(self.newly_created)
    }

    /// Hands a repository facade to `f` while holding the connection lock, so
    /// everything inside one closure observes a single consistent snapshot.
    pub fn with_repositories<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<anyhow::Error>,
        F: FnOnce(repositories::SqliteRepositories<'_>) -> Result<T, E>,
    {
        self.with_conn(|conn| {
            let repos = repositories::SqliteRepositories::new(conn);
            f(repos)
        })
    }

    fn with_conn<T, E, F>(&self, f: F) -> Result<T, E>
    where
        E: From<anyhow::Error>,
        F: FnOnce(&Connection) -> Result<T, E>,
    {
        let guard = self
            .conn
            .lock()
            .map_err(|_| E::from(anyhow!("database mutex poisoned")))?;
        f(&guard)
    }
}

/// True when an error chain bottoms out in a SQLite constraint violation,
/// e.g. a unique-column collision that slipped past the service pre-check.
pub fn is_constraint_violation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<rusqlite::Error>()
            .and_then(rusqlite::Error::sqlite_error_code)
            .is_some_and(|code| code == rusqlite::ErrorCode::ConstraintViolation)
    })
}

/// True when an error chain bottoms out in SQLite reporting the database busy
/// or locked, the retryable class of write conflicts.
pub fn is_busy_error(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause
            .downcast_ref::<rusqlite::Error>()
            .and_then(rusqlite::Error::sqlite_error_code)
            .is_some_and(|code| {
                matches!(
                    code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                )
            })
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn migrations_apply_to_fresh_database() {
        let conn = Connection::open_in_memory().expect("in-memory db");
        let db = Database::from_connection(conn, true);
        assert!(db.ensure_migrations().expect("migrations"));

        let tables: Vec<String> = db
            .with_repositories(|repos| -> Result<Vec<String>> {
                let mut stmt = repos
                    .conn()
                    .prepare("SELECT name FROM sqlite_master WHERE type = 'table' ORDER BY name")?;
                let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
                let mut names = Vec::new();
                for row in rows {
                    names.push(row?);
                }
                Ok(names)
            })
            .expect("list tables");

        for expected in ["users", "posts", "comments", "replies", "likes"] {
            assert!(tables.iter().any(|t| t == expected), "missing {expected}");
        }
    }

    #[test]
    fn busy_detection_sees_through_context() {
        let sqlite = rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_BUSY),
            Some("database is locked".into()),
        );
        let wrapped = anyhow::Error::new(sqlite).context("while toggling a like");
        assert!(is_busy_error(&wrapped));
        assert!(!is_busy_error(&anyhow!("unrelated failure")));
    }
}
