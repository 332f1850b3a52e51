use crate::access;
use crate::database::models::PostRecord;
use crate::database::repositories::{PostChanges, PostRepository};
use crate::database::Database;
use crate::error::{FeedError, FeedResult};
use crate::identity::Identity;
use crate::users::ensure_registered;
use crate::utils::now_utc_iso;
use crate::views::{self, PostView};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    #[default]
    Public,
    Private,
}

impl Visibility {
    pub fn as_str(self) -> &'static str {
        match self {
            Visibility::Public => "public",
            Visibility::Private => "private",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreatePostInput {
    pub content: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdatePostInput {
    #[serde(default)]
    pub content: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub visibility: Option<Visibility>,
}

#[derive(Clone)]
pub struct PostService {
    database: Database,
}

impl PostService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    pub fn create_post(&self, author: &Identity, input: CreatePostInput) -> FeedResult<PostView> {
        if input.content.trim().is_empty() {
            return Err(FeedError::Validation("content may not be empty".into()));
        }
        let now = now_utc_iso();
        let record = PostRecord {
            id: Uuid::new_v4().to_string(),
            author_id: author.user_id.clone(),
            content: input.content,
            image: input.image,
            visibility: input.visibility.unwrap_or_default().as_str().into(),
            created_at: now.clone(),
            updated_at: now,
            deleted: false,
            deleted_at: None,
        };

        self.database.with_repositories(|repos| {
            ensure_registered(&repos, &author.user_id)?;
            repos.posts().create(&record)?;
            tracing::info!(post_id = %record.id, author_id = %record.author_id, "post created");
            views::assemble_post(&repos, record.clone())
        })
    }

    pub fn get_post(&self, post_id: &str, requestor: Option<&Identity>) -> FeedResult<PostView> {
        self.database.with_repositories(|repos| {
            let post = repos
                .posts()
                .get(post_id)?
                .ok_or_else(|| FeedError::NotFound("post not found".into()))?;
            access::ensure_can_read(&post, requestor)?;
            views::assemble_post(&repos, post)
        })
    }

    /// Public posts plus the requestor's own private ones, newest first.
    pub fn list_posts(&self, requestor: Option<&Identity>) -> FeedResult<Vec<PostView>> {
        self.database.with_repositories(|repos| {
            let posts = repos
                .posts()
                .list_visible(requestor.map(|identity| identity.user_id.as_str()))?;
            views::assemble_page(&repos, posts)
        })
    }

    /// Partial update of the author-owned fields. Unspecified fields keep
    /// their value; `created_at` is never touched.
    pub fn update_post(
        &self,
        post_id: &str,
        author: &Identity,
        input: UpdatePostInput,
    ) -> FeedResult<PostView> {
        if let Some(content) = &input.content {
            if content.trim().is_empty() {
                return Err(FeedError::Validation("content may not be empty".into()));
            }
        }

        self.database.with_repositories(|repos| {
            let post = repos
                .posts()
                .get(post_id)?
                .ok_or_else(|| FeedError::NotFound("post not found".into()))?;
            if !access::can_mutate(&post, author) {
                return Err(FeedError::Forbidden(
                    "you can only update your own posts".into(),
                ));
            }

            let changes = PostChanges {
                content: input.content.clone(),
                image: input.image.clone(),
                visibility: input.visibility.map(|v| v.as_str().to_owned()),
            };
            if !repos.posts().update_fields(&post.id, &changes, &now_utc_iso())? {
                return Err(FeedError::NotFound("post not found".into()));
            }

            let refreshed = repos
                .posts()
                .get(post_id)?
                .ok_or_else(|| FeedError::NotFound("post not found".into()))?;
            views::assemble_post(&repos, refreshed)
        })
    }

    /// Tombstones the aggregate: data is retained but every default read
    /// excludes it from now on, for everyone including the author.
    pub fn delete_post(&self, post_id: &str, author: &Identity) -> FeedResult<()> {
        self.database.with_repositories(|repos| {
            let post = repos
                .posts()
                .get(post_id)?
                .ok_or_else(|| FeedError::NotFound("post not found".into()))?;
            if !access::can_mutate(&post, author) {
                return Err(FeedError::Forbidden(
                    "you can only delete your own posts".into(),
                ));
            }
            if !repos.posts().tombstone(&post.id, &now_utc_iso())? {
                return Err(FeedError::NotFound("post not found".into()));
            }
            tracing::info!(post_id = %post.id, "post tombstoned");
            Ok(())
        })
    }
}
