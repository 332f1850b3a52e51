//! Per-operation authorization over post aggregates.
//!
//! Reads are gated by visibility, structural mutations by ownership. Likes,
//! comment-adds, and reply-adds deliberately skip this module: they only need
//! a present authenticated identity, and that asymmetry is part of the
//! contract, not an oversight.

use crate::database::models::PostRecord;
use crate::error::{FeedError, FeedResult};
use crate::identity::Identity;
use crate::posts::Visibility;

pub fn can_read(post: &PostRecord, requestor: Option<&Identity>) -> bool {
    if post.visibility != Visibility::Private.as_str() {
        return true;
    }
    requestor.is_some_and(|identity| identity.user_id == post.author_id)
}

/// Ownership check for content/visibility/image updates and tombstoning.
/// Role is not consulted: even an admin only mutates their own posts.
pub fn can_mutate(post: &PostRecord, requestor: &Identity) -> bool {
    requestor.user_id == post.author_id
}

pub fn ensure_can_read(post: &PostRecord, requestor: Option<&Identity>) -> FeedResult<()> {
    if can_read(post, requestor) {
        Ok(())
    } else {
        Err(FeedError::Forbidden(
            "you don't have permission to view this post".into(),
        ))
    }
}
