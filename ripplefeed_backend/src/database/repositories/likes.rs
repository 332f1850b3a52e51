use crate::database::models::{LikeRecord, SubjectKind};
use anyhow::Result;
use rusqlite::{params, params_from_iter, Connection, Row};

pub(super) struct SqliteLikeRepository<'conn> {
    pub(super) conn: &'conn Connection,
}

const COLUMNS: &str = "subject_kind, subject_id, user_id, created_at";

fn map_row(row: &Row<'_>) -> rusqlite::Result<LikeRecord> {
    Ok(LikeRecord {
        subject_kind: row.get(0)?,
        subject_id: row.get(1)?,
        user_id: row.get(2)?,
        created_at: row.get(3)?,
    })
}

impl<'conn> super::LikeRepository for SqliteLikeRepository<'conn> {
    fn toggle(
        &self,
        kind: SubjectKind,
        subject_id: &str,
        user_id: &str,
        created_at: &str,
    ) -> Result<bool> {
        // Remove-else-insert inside one transaction; the membership flip is
        // atomic at the storage layer.
        let tx = self.conn.unchecked_transaction()?;
        let removed = tx.execute(
            "DELETE FROM likes WHERE subject_kind = ?1 AND subject_id = ?2 AND user_id = ?3",
            params![kind.as_str(), subject_id, user_id],
        )?;
        let liked = if removed == 0 {
            // OR IGNORE: at most one entry per (subject, user)
            tx.execute(
                r#"
                INSERT OR IGNORE INTO likes (subject_kind, subject_id, user_id, created_at)
                VALUES (?1, ?2, ?3, ?4)
                "#,
                params![kind.as_str(), subject_id, user_id, created_at],
            )?;
            true
        } else {
            false
        };
        tx.commit()?;
        Ok(liked)
    }

    fn list_for_subject(&self, kind: SubjectKind, subject_id: &str) -> Result<Vec<LikeRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            r#"
            SELECT {COLUMNS} FROM likes
            WHERE subject_kind = ?1 AND subject_id = ?2
            ORDER BY datetime(created_at) ASC, rowid ASC
            "#
        ))?;
        let rows = stmt.query_map(params![kind.as_str(), subject_id], map_row)?;
        let mut likes = Vec::new();
        for row in rows {
            likes.push(row?);
        }
        Ok(likes)
    }

    fn list_for_subjects(
        &self,
        kind: SubjectKind,
        subject_ids: &[String],
    ) -> Result<Vec<LikeRecord>> {
        if subject_ids.is_empty() {
            return Ok(Vec::new());
        }
        let mut bindings: Vec<&str> = vec![kind.as_str()];
        bindings.extend(subject_ids.iter().map(String::as_str));
        let placeholders: Vec<String> = (2..=subject_ids.len() + 1)
            .map(|i| format!("?{i}"))
            .collect();
        let sql = format!(
            r#"
            SELECT {COLUMNS} FROM likes
            WHERE subject_kind = ?1 AND subject_id IN ({})
            ORDER BY datetime(created_at) ASC, rowid ASC
            "#,
            placeholders.join(", ")
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_from_iter(bindings), map_row)?;
        let mut likes = Vec::new();
        for row in rows {
            likes.push(row?);
        }
        Ok(likes)
    }
}
