//! Public comment thread assembly
//!
//! The store holds a flat list of comments; the two-level tree is rebuilt
//! per request by grouping replies under their parent's ID.

use std::collections::HashMap;

use crate::config::ThreadOrder;
use crate::data::Comment;

/// An approved top-level comment with its approved replies
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentThread {
    pub comment: Comment,
    /// Oldest first
    pub replies: Vec<Comment>,
}

impl CommentThread {
    /// Number of comments in the thread, the top-level one included
    pub fn comment_count(&self) -> usize {
        1 + self.replies.len()
    }
}

/// Build the public thread view from every comment of a post.
///
/// Pending comments are dropped at both levels. Replies whose parent is not
/// an approved top-level comment (deleted, pending, or itself a reply) are
/// left out silently.
pub fn assemble_public_threads(comments: Vec<Comment>, order: ThreadOrder) -> Vec<CommentThread> {
    let (mut top_level, replies): (Vec<Comment>, Vec<Comment>) = comments
        .into_iter()
        .filter(|c| c.is_approved)
        .partition(|c| !c.is_reply());

    match order {
        ThreadOrder::NewestFirst => top_level.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        }),
        ThreadOrder::OldestFirst => top_level.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.id.cmp(&b.id))
        }),
    }

    let mut by_parent: HashMap<String, Vec<Comment>> = HashMap::new();
    for reply in replies {
        if let Some(parent_id) = reply.parent_id.clone() {
            by_parent.entry(parent_id).or_default().push(reply);
        }
    }

    let threads: Vec<CommentThread> = top_level
        .into_iter()
        .map(|comment| {
            let mut replies = by_parent.remove(&comment.id).unwrap_or_default();
            replies.sort_by(|a, b| {
                a.created_at
                    .cmp(&b.created_at)
                    .then_with(|| a.id.cmp(&b.id))
            });
            CommentThread { comment, replies }
        })
        .collect();

    let orphaned: usize = by_parent.values().map(Vec::len).sum();
    if orphaned > 0 {
        tracing::debug!(orphaned, "Excluded replies without a visible parent");
    }

    threads
}
