//! Social interactions over a post aggregate: like toggles at all three
//! nesting levels, comment appends, and reply appends. These operations are
//! open to any authenticated identity; only the post's own fields are
//! author-gated (see `access`).

use crate::database::models::{CommentRecord, ReplyRecord, SubjectKind};
use crate::database::repositories::{
    CommentRepository, LikeRepository, PostRepository, ReplyRepository, SqliteRepositories,
};
use crate::database::Database;
use crate::error::{with_write_retry, FeedError, FeedResult};
use crate::identity::Identity;
use crate::users::ensure_registered;
use crate::utils::now_utc_iso;
use crate::views::{self, LikeView, PostView};
use uuid::Uuid;

/// Addresses one like-set: a post, a comment within a post, or a reply
/// within a comment within a post.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubjectPath {
    Post {
        post_id: String,
    },
    Comment {
        post_id: String,
        comment_id: String,
    },
    Reply {
        post_id: String,
        comment_id: String,
        reply_id: String,
    },
}

impl SubjectPath {
    pub fn post(post_id: impl Into<String>) -> Self {
        SubjectPath::Post {
            post_id: post_id.into(),
        }
    }

    pub fn comment(post_id: impl Into<String>, comment_id: impl Into<String>) -> Self {
        SubjectPath::Comment {
            post_id: post_id.into(),
            comment_id: comment_id.into(),
        }
    }

    pub fn reply(
        post_id: impl Into<String>,
        comment_id: impl Into<String>,
        reply_id: impl Into<String>,
    ) -> Self {
        SubjectPath::Reply {
            post_id: post_id.into(),
            comment_id: comment_id.into(),
            reply_id: reply_id.into(),
        }
    }
}

#[derive(Clone)]
pub struct EngagementService {
    database: Database,
}

impl EngagementService {
    pub fn new(database: Database) -> Self {
        Self { database }
    }

    /// Flips the caller's membership in the addressed like-set and returns
    /// the refreshed set for immediate display. Toggling twice restores the
    /// prior state.
    pub fn toggle_like(&self, path: &SubjectPath, user: &Identity) -> FeedResult<Vec<LikeView>> {
        with_write_retry(|| {
            self.database.with_repositories(|repos| {
                ensure_registered(&repos, &user.user_id)?;
                let (kind, subject_id) = resolve_subject(&repos, path)?;
                let liked =
                    repos
                        .likes()
                        .toggle(kind, &subject_id, &user.user_id, &now_utc_iso())?;
                tracing::debug!(
                    subject_kind = kind.as_str(),
                    subject_id = %subject_id,
                    user_id = %user.user_id,
                    liked,
                    "like toggled"
                );
                let set = repos.likes().list_for_subject(kind, &subject_id)?;
                views::assemble_like_set(&repos, set)
            })
        })
    }

    /// The addressed like-set with every entry resolved to a projection.
    pub fn likes(&self, path: &SubjectPath) -> FeedResult<Vec<LikeView>> {
        self.database.with_repositories(|repos| {
            let (kind, subject_id) = resolve_subject(&repos, path)?;
            let set = repos.likes().list_for_subject(kind, &subject_id)?;
            views::assemble_like_set(&repos, set)
        })
    }

    /// Appends a comment with empty likes and replies, returning the updated
    /// aggregate view.
    pub fn add_comment(
        &self,
        post_id: &str,
        author: &Identity,
        content: &str,
    ) -> FeedResult<PostView> {
        if content.trim().is_empty() {
            return Err(FeedError::Validation(
                "comment content may not be empty".into(),
            ));
        }
        with_write_retry(|| {
            self.database.with_repositories(|repos| {
                ensure_registered(&repos, &author.user_id)?;
                let post = repos
                    .posts()
                    .get(post_id)?
                    .ok_or_else(|| FeedError::NotFound("post not found".into()))?;

                let now = now_utc_iso();
                let record = CommentRecord {
                    id: Uuid::new_v4().to_string(),
                    post_id: post.id.clone(),
                    author_id: author.user_id.clone(),
                    content: content.to_owned(),
                    created_at: now.clone(),
                    updated_at: now,
                };
                repos.comments().append(&record)?;
                tracing::debug!(post_id = %post.id, comment_id = %record.id, "comment appended");
                views::assemble_post(&repos, post)
            })
        })
    }

    /// Appends a reply with an empty like-set under the addressed comment,
    /// returning the updated aggregate view.
    pub fn add_reply(
        &self,
        post_id: &str,
        comment_id: &str,
        author: &Identity,
        content: &str,
    ) -> FeedResult<PostView> {
        if content.trim().is_empty() {
            return Err(FeedError::Validation(
                "reply content may not be empty".into(),
            ));
        }
        with_write_retry(|| {
            self.database.with_repositories(|repos| {
                ensure_registered(&repos, &author.user_id)?;
                let post = repos
                    .posts()
                    .get(post_id)?
                    .ok_or_else(|| FeedError::NotFound("post not found".into()))?;
                let comment = repos
                    .comments()
                    .get_in_post(&post.id, comment_id)?
                    .ok_or_else(|| FeedError::NotFound("comment not found".into()))?;

                let now = now_utc_iso();
                let record = ReplyRecord {
                    id: Uuid::new_v4().to_string(),
                    comment_id: comment.id.clone(),
                    author_id: author.user_id.clone(),
                    content: content.to_owned(),
                    created_at: now.clone(),
                    updated_at: now,
                };
                repos.replies().append(&record)?;
                tracing::debug!(
                    post_id = %post.id,
                    comment_id = %comment.id,
                    reply_id = %record.id,
                    "reply appended"
                );
                views::assemble_post(&repos, post)
            })
        })
    }
}

/// Walks the path one segment at a time so a miss names exactly the segment
/// that was absent, and an id can never resolve outside its parent scope.
fn resolve_subject(
    repos: &SqliteRepositories<'_>,
    path: &SubjectPath,
) -> FeedResult<(SubjectKind, String)> {
    match path {
        SubjectPath::Post { post_id } => {
            let post = repos
                .posts()
                .get(post_id)?
                .ok_or_else(|| FeedError::NotFound("post not found".into()))?;
            Ok((SubjectKind::Post, post.id))
        }
        SubjectPath::Comment {
            post_id,
            comment_id,
        } => {
            repos
                .posts()
                .get(post_id)?
                .ok_or_else(|| FeedError::NotFound("post not found".into()))?;
            let comment = repos
                .comments()
                .get_in_post(post_id, comment_id)?
                .ok_or_else(|| FeedError::NotFound("comment not found".into()))?;
            Ok((SubjectKind::Comment, comment.id))
        }
        SubjectPath::Reply {
            post_id,
            comment_id,
            reply_id,
        } => {
            repos
                .posts()
                .get(post_id)?
                .ok_or_else(|| FeedError::NotFound("post not found".into()))?;
            let comment = repos
                .comments()
                .get_in_post(post_id, comment_id)?
                .ok_or_else(|| FeedError::NotFound("comment not found".into()))?;
            let reply = repos
                .replies()
                .get_in_comment(&comment.id, reply_id)?
                .ok_or_else(|| FeedError::NotFound("reply not found".into()))?;
            Ok((SubjectKind::Reply, reply.id))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::posts::{CreatePostInput, PostService};
    use crate::users::{CreateUserInput, UserService};
    use rusqlite::Connection;

    struct Fixture {
        engagement: EngagementService,
        posts: PostService,
        users: UserService,
    }

    fn setup() -> Fixture {
        let conn = Connection::open_in_memory().expect("in-memory db");
        let db = Database::from_connection(conn, true);
        db.ensure_migrations().expect("migrations");
        Fixture {
            engagement: EngagementService::new(db.clone()),
            posts: PostService::new(db.clone()),
            users: UserService::new(db),
        }
    }

    fn register(fixture: &Fixture, email: &str) -> Identity {
        let id = fixture
            .users
            .create_user(CreateUserInput {
                email: email.into(),
                first_name: "Test".into(),
                last_name: "User".into(),
                role: None,
            })
            .expect("register user")
            .id;
        Identity::user(id)
    }

    fn create_post(fixture: &Fixture, author: &Identity) -> String {
        fixture
            .posts
            .create_post(
                author,
                CreatePostInput {
                    content: "hello".into(),
                    image: None,
                    visibility: None,
                },
            )
            .expect("create post")
            .id
    }

    #[test]
    fn toggle_is_an_involution() {
        let fixture = setup();
        let author = register(&fixture, "a@example.com");
        let liker = register(&fixture, "b@example.com");
        let post_id = create_post(&fixture, &author);
        let path = SubjectPath::post(&post_id);

        let set = fixture.engagement.toggle_like(&path, &liker).unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set[0].user.id, liker.user_id);

        let set = fixture.engagement.toggle_like(&path, &liker).unwrap();
        assert!(set.is_empty());
    }

    #[test]
    fn toggle_works_at_every_nesting_level() {
        let fixture = setup();
        let author = register(&fixture, "a@example.com");
        let liker = register(&fixture, "b@example.com");
        let post_id = create_post(&fixture, &author);

        let with_comment = fixture
            .engagement
            .add_comment(&post_id, &liker, "nice")
            .unwrap();
        let comment_id = with_comment.comments[0].id.clone();
        let with_reply = fixture
            .engagement
            .add_reply(&post_id, &comment_id, &author, "thanks")
            .unwrap();
        let reply_id = with_reply.comments[0].replies[0].id.clone();

        let comment_path = SubjectPath::comment(&post_id, &comment_id);
        let reply_path = SubjectPath::reply(&post_id, &comment_id, &reply_id);

        assert_eq!(
            fixture
                .engagement
                .toggle_like(&comment_path, &author)
                .unwrap()
                .len(),
            1
        );
        assert_eq!(
            fixture
                .engagement
                .toggle_like(&reply_path, &liker)
                .unwrap()
                .len(),
            1
        );

        // sets are independent across levels
        assert!(fixture
            .engagement
            .likes(&SubjectPath::post(&post_id))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn missing_segments_are_named() {
        let fixture = setup();
        let author = register(&fixture, "a@example.com");
        let post_id = create_post(&fixture, &author);
        let with_comment = fixture
            .engagement
            .add_comment(&post_id, &author, "first")
            .unwrap();
        let comment_id = with_comment.comments[0].id.clone();

        let missing_post = fixture
            .engagement
            .toggle_like(&SubjectPath::post("nope"), &author);
        assert!(
            matches!(missing_post, Err(FeedError::NotFound(ref msg)) if msg.contains("post"))
        );

        let missing_comment = fixture
            .engagement
            .toggle_like(&SubjectPath::comment(&post_id, "nope"), &author);
        assert!(
            matches!(missing_comment, Err(FeedError::NotFound(ref msg)) if msg.contains("comment"))
        );

        let missing_reply = fixture
            .engagement
            .toggle_like(&SubjectPath::reply(&post_id, &comment_id, "nope"), &author);
        assert!(
            matches!(missing_reply, Err(FeedError::NotFound(ref msg)) if msg.contains("reply"))
        );
    }

    #[test]
    fn comment_ids_do_not_resolve_across_posts() {
        let fixture = setup();
        let author = register(&fixture, "a@example.com");
        let first_post = create_post(&fixture, &author);
        let second_post = create_post(&fixture, &author);

        let with_comment = fixture
            .engagement
            .add_comment(&first_post, &author, "scoped")
            .unwrap();
        let comment_id = with_comment.comments[0].id.clone();

        let result = fixture
            .engagement
            .toggle_like(&SubjectPath::comment(&second_post, &comment_id), &author);
        assert!(matches!(result, Err(FeedError::NotFound(_))));
    }

    #[test]
    fn comments_and_replies_preserve_insertion_order() {
        let fixture = setup();
        let author = register(&fixture, "a@example.com");
        let commenter = register(&fixture, "b@example.com");
        let post_id = create_post(&fixture, &author);

        fixture
            .engagement
            .add_comment(&post_id, &commenter, "first")
            .unwrap();
        fixture
            .engagement
            .add_comment(&post_id, &author, "second")
            .unwrap();
        let view = fixture
            .engagement
            .add_comment(&post_id, &commenter, "third")
            .unwrap();

        let contents: Vec<&str> = view
            .comments
            .iter()
            .map(|c| c.content.as_str())
            .collect();
        assert_eq!(contents, vec!["first", "second", "third"]);
    }

    #[test]
    fn engagement_is_open_to_non_authors_even_on_private_posts() {
        let fixture = setup();
        let author = register(&fixture, "a@example.com");
        let stranger = register(&fixture, "b@example.com");
        let post_id = fixture
            .posts
            .create_post(
                &author,
                CreatePostInput {
                    content: "private musings".into(),
                    image: None,
                    visibility: Some(crate::posts::Visibility::Private),
                },
            )
            .unwrap()
            .id;

        // not readable, but likeable and commentable by design
        assert!(fixture
            .engagement
            .toggle_like(&SubjectPath::post(&post_id), &stranger)
            .is_ok());
        assert!(fixture
            .engagement
            .add_comment(&post_id, &stranger, "drive-by")
            .is_ok());
    }

    #[test]
    fn unregistered_identity_cannot_engage() {
        let fixture = setup();
        let author = register(&fixture, "a@example.com");
        let post_id = create_post(&fixture, &author);
        let result = fixture
            .engagement
            .toggle_like(&SubjectPath::post(&post_id), &Identity::user("ghost"));
        assert!(matches!(result, Err(FeedError::Validation(_))));
    }

    #[test]
    fn concurrent_distinct_togglers_all_land() {
        let fixture = setup();
        let author = register(&fixture, "author@example.com");
        let post_id = create_post(&fixture, &author);

        let togglers: Vec<Identity> = (0..8)
            .map(|i| register(&fixture, &format!("u{i}@example.com")))
            .collect();

        let mut handles = Vec::new();
        for identity in togglers {
            let engagement = fixture.engagement.clone();
            let path = SubjectPath::post(&post_id);
            handles.push(std::thread::spawn(move || {
                engagement.toggle_like(&path, &identity).expect("toggle")
            }));
        }
        for handle in handles {
            handle.join().expect("toggler thread");
        }

        let set = fixture
            .engagement
            .likes(&SubjectPath::post(&post_id))
            .unwrap();
        assert_eq!(set.len(), 8);
    }

    #[test]
    fn concurrent_toggles_settle_on_net_parity() {
        let fixture = setup();
        let author = register(&fixture, "author@example.com");
        let post_id = create_post(&fixture, &author);

        let even = register(&fixture, "even@example.com");
        let odd = register(&fixture, "odd@example.com");

        let mut handles = Vec::new();
        for (identity, toggles) in [(even.clone(), 2), (odd.clone(), 3)] {
            for _ in 0..toggles {
                let engagement = fixture.engagement.clone();
                let path = SubjectPath::post(&post_id);
                let identity = identity.clone();
                handles.push(std::thread::spawn(move || {
                    engagement.toggle_like(&path, &identity).expect("toggle")
                }));
            }
        }
        for handle in handles {
            handle.join().expect("toggler thread");
        }

        let set = fixture
            .engagement
            .likes(&SubjectPath::post(&post_id))
            .unwrap();
        assert_eq!(set.len(), 1);
        assert_eq!(set[0].user.id, odd.user_id);
    }
}
