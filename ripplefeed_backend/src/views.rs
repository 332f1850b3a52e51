//! Denormalized read shapes and their assembly.
//!
//! Every read resolves the raw user references scattered through a post
//! (root author, comment and reply authors, every like entry at all three
//! levels) in one batched lookup, then rebuilds the nested structure with
//! projections substituted for ids. Insertion order of comments, replies,
//! and likes is preserved exactly as stored.

use crate::database::models::{
    CommentRecord, LikeRecord, PostRecord, ReplyRecord, SubjectKind, UserRecord,
};
use crate::database::repositories::{
    CommentRepository, LikeRepository, ReplyRepository, SqliteRepositories, UserRepository,
};
use crate::error::{FeedError, FeedResult};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashMap};

/// Minimal user projection substituted for every raw user reference.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
}

impl UserSummary {
    pub(crate) fn from_record(record: UserRecord) -> Self {
        Self {
            id: record.id,
            first_name: record.first_name,
            last_name: record.last_name,
            email: record.email,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeView {
    pub user: UserSummary,
    pub created_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplyView {
    pub id: String,
    pub author: UserSummary,
    pub content: String,
    pub likes: Vec<LikeView>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentView {
    pub id: String,
    pub author: UserSummary,
    pub content: String,
    pub likes: Vec<LikeView>,
    pub replies: Vec<ReplyView>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PostView {
    pub id: String,
    pub author: UserSummary,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    pub visibility: String,
    pub likes: Vec<LikeView>,
    pub comments: Vec<CommentView>,
    pub created_at: String,
    pub updated_at: String,
}

/// Raw rows of one post gathered before user resolution.
struct PostTree {
    post: PostRecord,
    post_likes: Vec<LikeRecord>,
    comments: Vec<CommentTree>,
}

struct CommentTree {
    comment: CommentRecord,
    likes: Vec<LikeRecord>,
    replies: Vec<ReplyTree>,
}

struct ReplyTree {
    reply: ReplyRecord,
    likes: Vec<LikeRecord>,
}

pub(crate) fn assemble_post(
    repos: &SqliteRepositories<'_>,
    post: PostRecord,
) -> FeedResult<PostView> {
    let tree = load_tree(repos, post)?;
    let mut ids = BTreeSet::new();
    collect_user_ids(&tree, &mut ids);
    let users = resolve_users(repos, &ids)?;
    build_view(tree, &users)
}

/// Assembles a whole page with a single user lookup spanning every post.
pub(crate) fn assemble_page(
    repos: &SqliteRepositories<'_>,
    posts: Vec<PostRecord>,
) -> FeedResult<Vec<PostView>> {
    let mut trees = Vec::with_capacity(posts.len());
    let mut ids = BTreeSet::new();
    for post in posts {
        let tree = load_tree(repos, post)?;
        collect_user_ids(&tree, &mut ids);
        trees.push(tree);
    }
    let users = resolve_users(repos, &ids)?;
    trees
        .into_iter()
        .map(|tree| build_view(tree, &users))
        .collect()
}

pub(crate) fn assemble_like_set(
    repos: &SqliteRepositories<'_>,
    likes: Vec<LikeRecord>,
) -> FeedResult<Vec<LikeView>> {
    let ids: BTreeSet<String> = likes.iter().map(|like| like.user_id.clone()).collect();
    let users = resolve_users(repos, &ids)?;
    likes
        .into_iter()
        .map(|like| like_view(like, &users))
        .collect()
}

fn load_tree(repos: &SqliteRepositories<'_>, post: PostRecord) -> FeedResult<PostTree> {
    let post_likes = repos
        .likes()
        .list_for_subject(SubjectKind::Post, &post.id)?;
    let comments = repos.comments().list_for_post(&post.id)?;

    let comment_ids: Vec<String> = comments.iter().map(|c| c.id.clone()).collect();
    let replies = repos.replies().list_for_comments(&comment_ids)?;
    let reply_ids: Vec<String> = replies.iter().map(|r| r.id.clone()).collect();

    let mut comment_likes = group_by_subject(
        repos
            .likes()
            .list_for_subjects(SubjectKind::Comment, &comment_ids)?,
    );
    let mut reply_likes = group_by_subject(
        repos
            .likes()
            .list_for_subjects(SubjectKind::Reply, &reply_ids)?,
    );
    let mut replies_by_comment: HashMap<String, Vec<ReplyRecord>> = HashMap::new();
    for reply in replies {
        replies_by_comment
            .entry(reply.comment_id.clone())
            .or_default()
            .push(reply);
    }

    let comments = comments
        .into_iter()
        .map(|comment| {
            let replies = replies_by_comment
                .remove(&comment.id)
                .unwrap_or_default()
                .into_iter()
                .map(|reply| {
                    let likes = reply_likes.remove(&reply.id).unwrap_or_default();
                    ReplyTree { reply, likes }
                })
                .collect();
            let likes = comment_likes.remove(&comment.id).unwrap_or_default();
            CommentTree {
                comment,
                likes,
                replies,
            }
        })
        .collect();

    Ok(PostTree {
        post,
        post_likes,
        comments,
    })
}

fn group_by_subject(likes: Vec<LikeRecord>) -> HashMap<String, Vec<LikeRecord>> {
    let mut grouped: HashMap<String, Vec<LikeRecord>> = HashMap::new();
    for like in likes {
        grouped
            .entry(like.subject_id.clone())
            .or_default()
            .push(like);
    }
    grouped
}

fn collect_user_ids(tree: &PostTree, ids: &mut BTreeSet<String>) {
    ids.insert(tree.post.author_id.clone());
    for like in &tree.post_likes {
        ids.insert(like.user_id.clone());
    }
    for comment in &tree.comments {
        ids.insert(comment.comment.author_id.clone());
        for like in &comment.likes {
            ids.insert(like.user_id.clone());
        }
        for reply in &comment.replies {
            ids.insert(reply.reply.author_id.clone());
            for like in &reply.likes {
                ids.insert(like.user_id.clone());
            }
        }
    }
}

fn resolve_users(
    repos: &SqliteRepositories<'_>,
    ids: &BTreeSet<String>,
) -> FeedResult<HashMap<String, UserSummary>> {
    let ids: Vec<String> = ids.iter().cloned().collect();
    let records = repos.users().get_many(&ids)?;
    Ok(records
        .into_iter()
        .map(|record| (record.id.clone(), UserSummary::from_record(record)))
        .collect())
}

fn lookup(users: &HashMap<String, UserSummary>, id: &str) -> FeedResult<UserSummary> {
    users.get(id).cloned().ok_or_else(|| {
        FeedError::Validation(format!("referenced user {id} does not exist"))
    })
}

fn like_view(like: LikeRecord, users: &HashMap<String, UserSummary>) -> FeedResult<LikeView> {
    Ok(LikeView {
        user: lookup(users, &like.user_id)?,
        created_at: like.created_at,
    })
}

fn build_view(tree: PostTree, users: &HashMap<String, UserSummary>) -> FeedResult<PostView> {
    let PostTree {
        post,
        post_likes,
        comments,
    } = tree;

    let likes = post_likes
        .into_iter()
        .map(|like| like_view(like, users))
        .collect::<FeedResult<Vec<_>>>()?;

    let comments = comments
        .into_iter()
        .map(|comment_tree| {
            let CommentTree {
                comment,
                likes,
                replies,
            } = comment_tree;
            let likes = likes
                .into_iter()
                .map(|like| like_view(like, users))
                .collect::<FeedResult<Vec<_>>>()?;
            let replies = replies
                .into_iter()
                .map(|reply_tree| {
                    let ReplyTree { reply, likes } = reply_tree;
                    let likes = likes
                        .into_iter()
                        .map(|like| like_view(like, users))
                        .collect::<FeedResult<Vec<_>>>()?;
                    Ok(ReplyView {
                        id: reply.id,
                        author: lookup(users, &reply.author_id)?,
                        content: reply.content,
                        likes,
                        created_at: reply.created_at,
                        updated_at: reply.updated_at,
                    })
                })
                .collect::<FeedResult<Vec<_>>>()?;
            Ok(CommentView {
                id: comment.id,
                author: lookup(users, &comment.author_id)?,
                content: comment.content,
                likes,
                replies,
                created_at: comment.created_at,
                updated_at: comment.updated_at,
            })
        })
        .collect::<FeedResult<Vec<_>>>()?;

    Ok(PostView {
        id: post.id,
        author: lookup(users, &post.author_id)?,
        content: post.content,
        image: post.image,
        visibility: post.visibility,
        likes,
        comments,
        created_at: post.created_at,
        updated_at: post.updated_at,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Database;
    use crate::utils::now_utc_iso;
    use rusqlite::Connection;

    fn setup_db() -> Database {
        let conn = Connection::open_in_memory().expect("in-memory db");
        let db = Database::from_connection(conn, true);
        db.ensure_migrations().expect("migrations");
        db
    }

    fn seed_user(repos: &SqliteRepositories<'_>, id: &str, first: &str) {
        let now = now_utc_iso();
        repos
            .users()
            .create(&UserRecord {
                id: id.into(),
                email: format!("{id}@example.com"),
                first_name: first.into(),
                last_name: "Example".into(),
                role: "user".into(),
                status: "active".into(),
                created_at: now.clone(),
                updated_at: now,
            })
            .unwrap();
    }

    fn seed_post(repos: &SqliteRepositories<'_>, id: &str, author: &str) {
        use crate::database::repositories::PostRepository;
        let now = now_utc_iso();
        repos
            .posts()
            .create(&PostRecord {
                id: id.into(),
                author_id: author.into(),
                content: "root content".into(),
                image: None,
                visibility: "public".into(),
                created_at: now.clone(),
                updated_at: now,
                deleted: false,
                deleted_at: None,
            })
            .unwrap();
    }

    #[test]
    fn assembles_three_levels_with_projections_in_order() {
        let db = setup_db();
        let view: PostView = db
            .with_repositories(|repos| {
                seed_user(&repos, "alice", "Alice");
                seed_user(&repos, "bob", "Bob");
                seed_user(&repos, "carol", "Carol");
                seed_post(&repos, "p1", "alice");

                let now = now_utc_iso();
                repos
                    .comments()
                    .append(&CommentRecord {
                        id: "c1".into(),
                        post_id: "p1".into(),
                        author_id: "bob".into(),
                        content: "nice".into(),
                        created_at: now.clone(),
                        updated_at: now.clone(),
                    })
                    .unwrap();
                repos
                    .replies()
                    .append(&ReplyRecord {
                        id: "r1".into(),
                        comment_id: "c1".into(),
                        author_id: "carol".into(),
                        content: "thanks".into(),
                        created_at: now.clone(),
                        updated_at: now.clone(),
                    })
                    .unwrap();
                repos
                    .likes()
                    .toggle(SubjectKind::Post, "p1", "bob", &now)
                    .unwrap();
                repos
                    .likes()
                    .toggle(SubjectKind::Post, "p1", "carol", &now)
                    .unwrap();
                repos
                    .likes()
                    .toggle(SubjectKind::Reply, "r1", "alice", &now)
                    .unwrap();

                use crate::database::repositories::PostRepository;
                let post = repos.posts().get("p1").unwrap().unwrap();
                assemble_post(&repos, post)
            })
            .unwrap();

        assert_eq!(view.author.first_name, "Alice");
        assert_eq!(view.likes.len(), 2);
        assert_eq!(view.likes[0].user.id, "bob");
        assert_eq!(view.likes[1].user.id, "carol");
        assert_eq!(view.comments.len(), 1);
        let comment = &view.comments[0];
        assert_eq!(comment.author.first_name, "Bob");
        assert!(comment.likes.is_empty());
        assert_eq!(comment.replies.len(), 1);
        let reply = &comment.replies[0];
        assert_eq!(reply.author.first_name, "Carol");
        assert_eq!(reply.likes.len(), 1);
        assert_eq!(reply.likes[0].user.email, "alice@example.com");
    }

    #[test]
    fn missing_referenced_user_is_a_validation_failure() {
        let db = setup_db();
        let result: FeedResult<PostView> = db.with_repositories(|repos| {
            seed_user(&repos, "alice", "Alice");
            seed_post(&repos, "p1", "alice");
            let now = now_utc_iso();
            // like by a user id that was never registered
            repos
                .likes()
                .toggle(SubjectKind::Post, "p1", "ghost", &now)
                .unwrap();
            use crate::database::repositories::PostRepository;
            let post = repos.posts().get("p1").unwrap().unwrap();
            assemble_post(&repos, post)
        });
        assert!(matches!(result, Err(FeedError::Validation(_))));
    }

    #[test]
    fn page_assembly_spans_posts_with_one_user_set() {
        let db = setup_db();
        let views: Vec<PostView> = db
            .with_repositories(|repos| {
                seed_user(&repos, "alice", "Alice");
                seed_user(&repos, "bob", "Bob");
                seed_post(&repos, "p1", "alice");
                seed_post(&repos, "p2", "bob");
                use crate::database::repositories::PostRepository;
                let posts = repos.posts().list_visible(None).unwrap();
                assemble_page(&repos, posts)
            })
            .unwrap();

        assert_eq!(views.len(), 2);
        let authors: Vec<&str> = views.iter().map(|v| v.author.id.as_str()).collect();
        assert!(authors.contains(&"alice"));
        assert!(authors.contains(&"bob"));
    }
}
