use crate::database::models::PostRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::PostChanges;

pub(super) struct SqlitePostRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

const COLUMNS: &str =
    "id, author_id, content, image, visibility, created_at, updated_at, deleted, deleted_at";

fn map_row(row: &Row<'_>) -> rusqlite::Result<PostRecord> {
    Ok(PostRecord {
        id: row.get(0)?,
        author_id: row.get(1)?,
        content: row.get(2)?,
        image: row.get(3)?,
        visibility: row.get(4)?,
        created_at: row.get(5)?,
        updated_at: row.get(6)?,
        deleted: row.get::<_, i64>(7)? != 0,
        deleted_at: row.get(8)?,
    })
}

impl<'conn> super::PostRepository for SqlitePostRepository<'conn> {
    fn create(&self, record: &PostRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO posts (id, author_id, content, image, visibility, created_at, updated_at, deleted, deleted_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
            params![
                record.id,
                record.author_id,
                record.content,
                record.image,
                record.visibility,
                record.created_at,
                record.updated_at,
                if record.deleted { 1 } else { 0 },
                record.deleted_at,
            ],
        )?;
        Ok(())
    }

    fn get(&self, id: &str) -> Result<Option<PostRecord>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM posts WHERE id = ?1 AND deleted = 0"),
                params![id],
                map_row,
            )
            .optional()?)
    }

    fn list_visible(&self, requestor_id: Option<&str>) -> Result<Vec<PostRecord>> {
        let mut posts = Vec::new();
        match requestor_id {
            Some(requestor) => {
                let mut stmt = self.conn.prepare(&format!(
                    r#"
                    SELECT {COLUMNS} FROM posts
                    WHERE deleted = 0
                      AND (visibility = 'public' OR (visibility = 'private' AND author_id = ?1))
                    ORDER BY datetime(created_at) DESC, rowid DESC
                    "#
                ))?;
                let rows = stmt.query_map(params![requestor], map_row)?;
                for row in rows {
                    posts.push(row?);
                }
            }
            None => {
                let mut stmt = self.conn.prepare(&format!(
                    r#"
                    SELECT {COLUMNS} FROM posts
                    WHERE deleted = 0 AND visibility = 'public'
                    ORDER BY datetime(created_at) DESC, rowid DESC
                    "#
                ))?;
                let rows = stmt.query_map([], map_row)?;
                for row in rows {
                    posts.push(row?);
                }
            }
        }
        Ok(posts)
    }

    fn update_fields(&self, id: &str, changes: &PostChanges, updated_at: &str) -> Result<bool> {
        // COALESCE keeps unsupplied fields intact inside one atomic statement.
        let changed = self.conn.execute(
            r#"
            UPDATE posts SET
                content = COALESCE(?2, content),
                image = COALESCE(?3, image),
                visibility = COALESCE(?4, visibility),
                updated_at = ?5
            WHERE id = ?1 AND deleted = 0
            "#,
            params![id, changes.content, changes.image, changes.visibility, updated_at],
        )?;
        Ok(changed > 0)
    }

    fn tombstone(&self, id: &str, deleted_at: &str) -> Result<bool> {
        let changed = self.conn.execute(
            "UPDATE posts SET deleted = 1, deleted_at = ?2 WHERE id = ?1 AND deleted = 0",
            params![id, deleted_at],
        )?;
        Ok(changed > 0)
    }
}
