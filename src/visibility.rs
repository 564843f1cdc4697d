//! Comment visibility and thread ordering.

use std::collections::{HashMap, HashSet};

use serde::Serialize;

use crate::{
    auth::AuthUser,
    models::{Article, Comment},
    permissions::{self, Action, Resource},
};

/// A comment with its (visible) replies.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CommentThread {
    pub comment: Comment,
    pub replies: Vec<CommentThread>,
}

impl CommentThread {
    fn flatten_into(self, out: &mut Vec<Comment>) {
        out.push(self.comment);
        for reply in self.replies {
            reply.flatten_into(out);
        }
    }
}

/// Whether `viewer` sees unapproved comments on `article`: admins and the
/// journalist whose username matches the author label, i.e. exactly the
/// viewers allowed to moderate that article.
pub fn sees_pending(viewer: Option<&AuthUser>, article: &Article) -> bool {
    permissions::can(viewer, Action::ModerateComments, Resource::Article(article))
}

/// The comments of `article` that `viewer` may see, thread-ordered.
///
/// Soft-deleted comments are never visible. Comments belonging to another
/// article are ignored.
pub fn visible_comments(
    viewer: Option<&AuthUser>,
    article: &Article,
    comments: impl IntoIterator<Item = Comment>,
) -> Vec<Comment> {
    let sees_pending = sees_pending(viewer, article);
    let visible = comments
        .into_iter()
        .filter(|c| c.article_id == article.id)
        .filter(|c| !c.is_deleted)
        .filter(|c| sees_pending || c.is_approved)
        .collect();

    thread_order(visible)
}

/// Flattens `comments` so that roots come in chronological order and every
/// comment is immediately followed by its replies (depth-first, also
/// chronological). A parent therefore always precedes its replies.
pub fn thread_order(comments: Vec<Comment>) -> Vec<Comment> {
    let mut out = Vec::with_capacity(comments.len());
    for root in thread(comments) {
        root.flatten_into(&mut out);
    }
    out
}

/// Builds the reply tree. Replies whose parent is not part of `comments`
/// (hidden, deleted, or from elsewhere) are dropped together with their own
/// replies.
pub fn thread(mut comments: Vec<Comment>) -> Vec<CommentThread> {
    comments.sort_by(|a, b| (a.created_at, a.id).cmp(&(b.created_at, b.id)));

    let present: HashSet<i64> = comments.iter().map(|c| c.id).collect();
    let mut children: HashMap<i64, Vec<Comment>> = HashMap::new();
    let mut roots = Vec::new();

    for comment in comments {
        match comment.parent_id {
            None => roots.push(comment),
            Some(parent) if present.contains(&parent) => {
                children.entry(parent).or_default().push(comment)
            }
            Some(_) => {}
        }
    }

    roots
        .into_iter()
        .map(|root| build(root, &mut children))
        .collect()
}

fn build(comment: Comment, children: &mut HashMap<i64, Vec<Comment>>) -> CommentThread {
    let replies = children
        .remove(&comment.id)
        .unwrap_or_default()
        .into_iter()
        .map(|reply| build(reply, children))
        .collect();

    CommentThread { comment, replies }
}
