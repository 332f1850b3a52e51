use crate::database::models::ReplyRecord;
use anyhow::Result;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

pub(super) struct SqliteReplyRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

const COLUMNS: &str = "id, comment_id, author_id, content, created_at, updated_at";

fn map_row(row: &Row<'_>) -> rusqlite::Result<ReplyRecord> {
    Ok(ReplyRecord {
        id: row.get(0)?,
        comment_id: row.get(1)?,
        author_id: row.get(2)?,
        content: row.get(3)?,
        created_at: row.get(4)?,
        updated_at: row.get(5)?,
    })
}

impl<'conn> super::ReplyRepository for SqliteReplyRepository<'conn> {
    fn append(&self, record: &ReplyRecord) -> Result<()> {
        self.conn.execute(
            r#"
            INSERT INTO replies (id, comment_id, author_id, content, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                record.id,
                record.comment_id,
                record.author_id,
                record.content,
                record.created_at,
                record.updated_at,
            ],
        )?;
        Ok(())
    }

    fn get_in_comment(&self, comment_id: &str, reply_id: &str) -> Result<Option<ReplyRecord>> {
        Ok(self
            .conn
            .query_row(
                &format!("SELECT {COLUMNS} FROM replies WHERE id = ?1 AND comment_id = ?2"),
                params![reply_id, comment_id],
                map_row,
            )
            .optional()?)
    }

    fn list_for_comments(&self, comment_ids: &[String]) -> Result<Vec<ReplyRecord>> {
        if comment_ids.is_empty() {
            return Ok(Vec::new());
        }
        let sql = format!(
            r#"
            SELECT {COLUMNS} FROM replies
            WHERE comment_id IN ({})
            ORDER BY datetime(created_at) ASC, rowid ASC
            "#,
            super::placeholders(comment_ids.len())
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(comment_ids), map_row)?;
        let mut replies = Vec::new();
        for row in rows {
            replies.push(row?);
        }
        Ok(replies)
    }
}
