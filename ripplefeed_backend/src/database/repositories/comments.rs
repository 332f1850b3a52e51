use crate::database::models::CommentRecord;
use anyhow::Result;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(super) struct SqliteCommentRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

const COLUMNS: &str = "id, post_id, author_id, content, created_at, updated_at";

fn map_row(row: &Row<'_>) -> rusqlite::Result<CommentRecord> {
    Ok(CommentRecord {
        id: row.get(0)?,
        post_id: row.get(1)?,
        author_id: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

impl<'conn> super::CommentRepository for SqliteCommentRepository<'conn> {
    fn append(&self, record: &CommentRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO comments (id, post_id, author_id, content, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.id,
                record.post_id,
                record.author_id,
                record.content,
                record.created_at,
                record.updated_at,
            ],
        )?;
        Ok(())
    }

    fn get_in_post(&self, post_id: &str, comment_id: &str) -> Result<Option<CommentRecord>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM comments WHERE id = ?1 AND post_id = ?2"),
                params![comment_id, post_id],
                map_row,
            )
            .optional()?)
    }

    fn list_for_post(&self, post_id: &str) -> Result<Vec<CommentRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {COLUMNS} FROM comments
            WHERE post_id = ?1
            ORDER BY datetime(created_at) ASC, rowid ASC
            "#
        ))?;
        let rows = stmt.query_map(params![post_id], map_row)?;
        let mut comments = Vec::new();
        for row in rows {
            comments.push(row?);
        }
        Ok(comments)
    }
}
