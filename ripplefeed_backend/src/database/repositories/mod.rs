mod comments;
mod likes;
mod posts;
mod replies;
mod users;

use super::models::{
    CommentRecord, LikeRecord, PostRecord, ReplyRecord, SubjectKind, UserRecord,
};
use anyhow::Result;
use rusqlite::Connection;

pub trait UserRepository {
    fn create(&self, record: &UserRecord) -> Result<()>;
    fn get(&self, id: &str) -> Result<Option<UserRecord>>;
    fn get_by_email(&self, email: &str) -> Result<Option<UserRecord>>;
    /// Batched lookup for view assembly; one query regardless of fan-out.
    fn get_many(&self, ids: &[String]) -> Result<Vec<UserRecord>>;
}

pub trait PostRepository {
    fn create(&self, record: &PostRecord) -> Result<()>;
    /// Loads a non-tombstoned post. Tombstoned rows read as absent.
    fn get(&self, id: &str) -> Result<Option<PostRecord>>;
    /// Non-tombstoned posts that are public, or private and owned by the
    /// requestor; newest-created-first.
    fn list_visible(&self, requestor_id: Option<&str>) -> Result<Vec<PostRecord>>;
    /// Partial update in one statement; absent fields keep their value.
    /// Returns false when the row is gone or already tombstoned.
    fn update_fields(&self, id: &str, changes: &PostChanges, updated_at: &str) -> Result<bool>;
    /// One-way transition; returns false when already tombstoned or absent.
    fn tombstone(&self, id: &str, deleted_at: &str) -> Result<bool>;
}

/// Field mask for a partial post update. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct PostChanges {
    pub content: Option<String>,
    pub image: Option<String>,
    pub visibility: Option<String>,
}

pub trait CommentRepository {
    fn append(&self, record: &CommentRecord) -> Result<()>;
    /// Typed lookup scoped to the owning post, so a comment id can never
    /// resolve against a different aggregate.
    fn get_in_post(&self, post_id: &str, comment_id: &str) -> Result<Option<CommentRecord>>;
    fn list_for_post(&self, post_id: &str) -> Result<Vec<CommentRecord>>;
}

pub trait ReplyRepository {
    fn append(&self, record: &ReplyRecord) -> Result<()>;
    fn get_in_comment(&self, comment_id: &str, reply_id: &str) -> Result<Option<ReplyRecord>>;
    fn list_for_comments(&self, comment_ids: &[String]) -> Result<Vec<ReplyRecord>>;
}

pub trait LikeRepository {
    /// Removes the user's entry if present, inserts it otherwise, atomically.
    /// Returns true when the toggle resulted in membership.
    fn toggle(
        &self,
        kind: SubjectKind,
        subject_id: &str,
        user_id: &str,
        created_at: &str,
    ) -> Result<bool>;
    fn list_for_subject(&self, kind: SubjectKind, subject_id: &str) -> Result<Vec<LikeRecord>>;
    fn list_for_subjects(
        &self,
        kind: SubjectKind,
        subject_ids: &[String],
    ) -> Result<Vec<LikeRecord>>;
}

pub struct SqliteRepositories<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteRepositories<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }

    pub fn users(&self) -> impl UserRepository + '_ {
        users::SqliteUserRepository { conn: self.conn }
    }

    pub fn posts(&self) -> impl PostRepository + '_ {
        posts::SqlitePostRepository { conn: self.conn }
    }

    pub fn comments(&self) -> impl CommentRepository + '_ {
        comments::SqliteCommentRepository { conn: self.conn }
    }

    pub fn replies(&self) -> impl ReplyRepository + '_ {
        replies::SqliteReplyRepository { conn: self.conn }
    }

    pub fn likes(&self) -> impl LikeRepository + '_ {
        likes::SqliteLikeRepository { conn: self.conn }
    }

    pub fn conn(&self) -> &'conn Connection {
        self.conn
    }
}

/// `?1, ?2, ...` fragment for an IN clause of `len` bound parameters.
pub(super) fn placeholders(len: usize) -> String {
    let mut out = String::new();
    for i in 1..=len {
        if i > 1 {
            out.push_str(", ");
        }
        out.push('?');
        out.push_str(&i.to_string());
    }
    out
}
