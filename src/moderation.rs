//! Comment moderation workflow and public comment submission.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    error::{ApiError, FieldErrors},
    models::{Comment, CreateCommentRequest, ModerationQueueEntry, NewComment, QueueStatus, Role},
    permissions::{self, Action, Resource},
    repository::RepositoryState,
};

/// Suffix appended to the username on replies written by a moderator.
pub const MODERATOR_MARKER: &str = "(Moderator)";

pub const MAX_NAME_LEN: usize = 80;
pub const MAX_COMMENT_LEN: usize = 5000;

/// ModerationAction
///
/// A single transition requested on a comment. `Reject` puts the comment back
/// into the unapproved state; `Delete` hides it for good; `Purge` removes the
/// row and its replies.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, PartialEq, Eq)]
#[serde(tag = "action", rename_all = "snake_case")]
#[ts(export)]
pub enum ModerationAction {
    Approve,
    Reject,
    Delete,
    Purge,
    Reply { body: String },
}

/// What a moderation action produced.
#[derive(Debug, Clone, PartialEq)]
pub enum ModerationOutcome {
    /// The target after the transition.
    Updated(Comment),
    /// The moderator reply that was created; the target is unchanged.
    Replied(Comment),
    Purged,
}

/// ModerationResponse
///
/// Wire form of a [`ModerationOutcome`]. `comment` is absent after a purge.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, PartialEq)]
#[ts(export)]
pub struct ModerationResponse {
    pub outcome: String,
    pub comment: Option<Comment>,
}

impl From<ModerationOutcome> for ModerationResponse {
    fn from(outcome: ModerationOutcome) -> Self {
        let name = outcome_name(&outcome).to_string();
        let comment = match outcome {
            ModerationOutcome::Updated(c) | ModerationOutcome::Replied(c) => Some(c),
            ModerationOutcome::Purged => None,
        };
        Self {
            outcome: name,
            comment,
        }
    }
}

pub fn moderator_display_name(username: &str) -> String {
    format!("{username} {MODERATOR_MARKER}")
}

/// Applies `action` to comment `comment_id` on behalf of `viewer`.
///
/// A soft-deleted comment only accepts `Purge`; for every other action it is
/// reported as missing.
pub async fn moderate(
    repo: &RepositoryState,
    viewer: Option<&AuthUser>,
    comment_id: i64,
    action: ModerationAction,
) -> Result<ModerationOutcome, ApiError> {
    let target = repo
        .get_comment(comment_id)
        .await?
        .ok_or(ApiError::NotFound("comment"))?;
    if target.is_deleted && action != ModerationAction::Purge {
        return Err(ApiError::NotFound("comment"));
    }

    let article = repo
        .get_article(target.article_id)
        .await?
        .ok_or(ApiError::NotFound("article"))?;
    permissions::require(viewer, Action::ModerateComments, Resource::Article(&article))?;
    // require() only passes for an authenticated viewer.
    let Some(moderator) = viewer else {
        return Err(ApiError::Unauthenticated);
    };

    let outcome = match action {
        ModerationAction::Approve => updated(repo.set_comment_approval(comment_id, true).await?)?,
        ModerationAction::Reject => updated(repo.set_comment_approval(comment_id, false).await?)?,
        ModerationAction::Delete => updated(repo.soft_delete_comment(comment_id).await?)?,
        ModerationAction::Purge => {
            if !repo.purge_comment(comment_id).await? {
                return Err(ApiError::NotFound("comment"));
            }
            ModerationOutcome::Purged
        }
        ModerationAction::Reply { body } => {
            let body = body.trim();
            if body.is_empty() {
                return Err(FieldErrors::single("body", "reply cannot be empty"));
            }
            if body.chars().count() > MAX_COMMENT_LEN {
                return Err(FieldErrors::single("body", "reply is too long"));
            }

            let reply = repo
                .create_comment(NewComment {
                    article_id: target.article_id,
                    parent_id: Some(target.id),
                    name: moderator_display_name(&moderator.username),
                    email: moderator.email.clone(),
                    body: body.to_string(),
                    is_approved: true,
                })
                .await?;
            ModerationOutcome::Replied(reply)
        }
    };

    tracing::info!(
        moderator = %moderator.id,
        comment_id,
        article_id = %article.id,
        outcome = outcome_name(&outcome),
        "comment moderated"
    );
    Ok(outcome)
}

fn updated(comment: Option<Comment>) -> Result<ModerationOutcome, ApiError> {
    comment
        .map(ModerationOutcome::Updated)
        .ok_or(ApiError::NotFound("comment"))
}

fn outcome_name(outcome: &ModerationOutcome) -> &'static str {
    match outcome {
        ModerationOutcome::Updated(_) => "updated",
        ModerationOutcome::Replied(_) => "replied",
        ModerationOutcome::Purged => "purged",
    }
}

/// The moderation queue as seen by `viewer`: everything for admins, the
/// comments on their own articles for journalists.
pub async fn moderation_queue(
    repo: &RepositoryState,
    viewer: Option<&AuthUser>,
    status: QueueStatus,
) -> Result<Vec<ModerationQueueEntry>, ApiError> {
    permissions::require(viewer, Action::ModerateComments, Resource::Site)?;
    let Some(viewer) = viewer else {
        return Err(ApiError::Unauthenticated);
    };

    let entries = repo.list_moderation_queue(status).await?;
    if viewer.role == Role::Admin {
        return Ok(entries);
    }

    Ok(entries
        .into_iter()
        .filter(|e| permissions::labels_match(&e.article_author_label, &viewer.username))
        .collect())
}

/// Stores a visitor comment. Anyone may comment; the comment always waits for
/// approval.
pub async fn submit_comment(
    repo: &RepositoryState,
    article_id: Uuid,
    req: CreateCommentRequest,
) -> Result<Comment, ApiError> {
    let article = repo
        .get_article(article_id)
        .await?
        .ok_or(ApiError::NotFound("article"))?;

    let name = req.name.trim();
    let email = req.email.trim();
    let body = req.body.trim();

    let mut errors = FieldErrors::new();
    if name.is_empty() {
        errors.add("name", "name is required");
    } else if name.chars().count() > MAX_NAME_LEN {
        errors.add("name", format!("name must be at most {MAX_NAME_LEN} characters"));
    }
    if !email.contains('@') {
        errors.add("email", "a valid email address is required");
    }
    if body.is_empty() {
        errors.add("body", "comment cannot be empty");
    } else if body.chars().count() > MAX_COMMENT_LEN {
        errors.add("body", format!("comment must be at most {MAX_COMMENT_LEN} characters"));
    }

    if let Some(parent_id) = req.parent_id {
        let parent = repo.get_comment(parent_id).await?;
        match parent {
            Some(p) if p.article_id == article.id && !p.is_deleted => {}
            _ => errors.add("parent_id", "parent comment does not belong to this article"),
        }
    }
    errors.finish()?;

    let comment = repo
        .create_comment(NewComment {
            article_id: article.id,
            parent_id: req.parent_id,
            name: name.to_string(),
            email: email.to_string(),
            body: body.to_string(),
            is_approved: false,
        })
        .await?;

    tracing::info!(comment_id = comment.id, article_id = %article.id, "comment submitted");
    Ok(comment)
}
