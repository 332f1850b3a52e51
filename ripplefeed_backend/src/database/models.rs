use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub role: String,   // 'user' or 'admin'
    pub status: String, // 'active' or 'blocked'
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostRecord {
    pub id: String,
    pub author_id: String,
    pub content: String,
    pub image: Option<String>,
    pub visibility: String, // 'public' or 'private'
    pub created_at: String,
    pub updated_at: String,
    pub deleted: bool,
    pub deleted_at: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommentRecord {
    pub id: String,
    pub post_id: String,
    pub author_id: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyRecord {
    pub id: String,
    pub comment_id: String,
    pub author_id: String,
    pub content: String,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LikeRecord {
    pub subject_kind: String, // 'post', 'comment', or 'reply'
    pub subject_id: String,
    pub user_id: String,
    pub created_at: String,
}

/// The nesting level a like-set is attached to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubjectKind {
    Post,
    Comment,
    Reply,
}

impl SubjectKind {
    pub fn as_str(self) -> &'static str {
        match self {
            SubjectKind::Post => "post",
            SubjectKind::Comment => "comment",
            SubjectKind::Reply => "reply",
        }
    }
}
