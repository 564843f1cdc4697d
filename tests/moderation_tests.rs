mod common;

use press_portal::{
    error::ApiError,
    models::{CreateCommentRequest, QueueStatus, Role},
    moderation::{self, MODERATOR_MARKER, ModerationAction, ModerationOutcome},
    repository::{Repository, RepositoryState},
};
use uuid::Uuid;

#[tokio::test]
async fn test_author_approves_and_rejects_own_article_comments() {
    let sqlite = common::repo().await;
    let repo = sqlite.clone() as RepositoryState;
    let marie = common::user(&sqlite, "marie_durand", Role::Journalist).await;
    let article = common::article(&sqlite, "A", "Marie_Durand", None).await;
    let c = common::comment(&sqlite, &article, None, "hi", false).await;

    let outcome = moderation::moderate(&repo, Some(&marie), c.id, ModerationAction::Approve)
        .await
        .unwrap();
    match outcome {
        ModerationOutcome::Updated(updated) => assert!(updated.is_approved),
        other => panic!("unexpected {other:?}"),
    }

    moderation::moderate(&repo, Some(&marie), c.id, ModerationAction::Reject)
        .await
        .unwrap();
    assert!(!sqlite.get_comment(c.id).await.unwrap().unwrap().is_approved);
}

#[tokio::test]
async fn test_foreign_journalist_and_reader_are_forbidden() {
    let sqlite = common::repo().await;
    let repo = sqlite.clone() as RepositoryState;
    let pierre = common::user(&sqlite, "pierre_martin", Role::Journalist).await;
    let reader = common::user(&sqlite, "marie_durand", Role::Reader).await;
    let article = common::article(&sqlite, "A", "marie_durand", None).await;
    let c = common::comment(&sqlite, &article, None, "hi", false).await;

    for v in [&pierre, &reader] {
        let err = moderation::moderate(&repo, Some(v), c.id, ModerationAction::Approve)
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::Forbidden);
    }
    let err = moderation::moderate(&repo, None, c.id, ModerationAction::Approve)
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::Unauthenticated);

    // Nothing changed.
    assert!(!sqlite.get_comment(c.id).await.unwrap().unwrap().is_approved);
}

#[tokio::test]
async fn test_unknown_comment_is_not_found() {
    let sqlite = common::repo().await;
    let repo = sqlite.clone() as RepositoryState;
    let admin = common::user(&sqlite, "root_admin", Role::Admin).await;

    let err = moderation::moderate(&repo, Some(&admin), 4242, ModerationAction::Approve)
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::NotFound("comment"));
}

#[tokio::test]
async fn test_reply_is_approved_and_leaves_target_untouched() {
    let sqlite = common::repo().await;
    let repo = sqlite.clone() as RepositoryState;
    let admin = common::user(&sqlite, "root_admin", Role::Admin).await;
    let article = common::article(&sqlite, "A", "marie_durand", None).await;
    let target = common::comment(&sqlite, &article, None, "question?", false).await;

    let outcome = moderation::moderate(
        &repo,
        Some(&admin),
        target.id,
        ModerationAction::Reply {
            body: "  answer  ".into(),
        },
    )
    .await
    .unwrap();

    let ModerationOutcome::Replied(reply) = outcome else {
        panic!("expected a reply");
    };
    assert!(reply.is_approved);
    assert_eq!(reply.parent_id, Some(target.id));
    assert_eq!(reply.article_id, article.id);
    assert_eq!(reply.body, "answer");
    assert_eq!(reply.name, format!("root_admin {MODERATOR_MARKER}"));
    assert_eq!(reply.email, admin.email);

    assert_eq!(sqlite.get_comment(target.id).await.unwrap().unwrap(), target);
}

#[tokio::test]
async fn test_empty_reply_is_a_validation_error() {
    let sqlite = common::repo().await;
    let repo = sqlite.clone() as RepositoryState;
    let admin = common::user(&sqlite, "root_admin", Role::Admin).await;
    let article = common::article(&sqlite, "A", "x", None).await;
    let target = common::comment(&sqlite, &article, None, "q", true).await;

    let err = moderation::moderate(
        &repo,
        Some(&admin),
        target.id,
        ModerationAction::Reply { body: "   ".into() },
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Validation(ref f) if f.contains("body")));
}

#[tokio::test]
async fn test_deleted_comment_is_terminal_until_purged() {
    let sqlite = common::repo().await;
    let repo = sqlite.clone() as RepositoryState;
    let admin = common::user(&sqlite, "root_admin", Role::Admin).await;
    let article = common::article(&sqlite, "A", "x", None).await;
    let c = common::comment(&sqlite, &article, None, "spam", true).await;

    moderation::moderate(&repo, Some(&admin), c.id, ModerationAction::Delete)
        .await
        .unwrap();
    assert!(sqlite.get_comment(c.id).await.unwrap().unwrap().is_deleted);

    for action in [
        ModerationAction::Approve,
        ModerationAction::Reject,
        ModerationAction::Delete,
        ModerationAction::Reply { body: "x".into() },
    ] {
        let err = moderation::moderate(&repo, Some(&admin), c.id, action)
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::NotFound("comment"));
    }

    let outcome = moderation::moderate(&repo, Some(&admin), c.id, ModerationAction::Purge)
        .await
        .unwrap();
    assert_eq!(outcome, ModerationOutcome::Purged);
    assert!(sqlite.get_comment(c.id).await.unwrap().is_none());
}

#[tokio::test]
async fn test_queue_is_scoped_for_journalists() {
    let sqlite = common::repo().await;
    let repo = sqlite.clone() as RepositoryState;
    let marie = common::user(&sqlite, "marie_durand", Role::Journalist).await;
    let admin = common::user(&sqlite, "root_admin", Role::Admin).await;
    let reader = common::user(&sqlite, "reader", Role::Reader).await;
    let own = common::article(&sqlite, "Own", "MARIE_DURAND", None).await;
    let foreign = common::article(&sqlite, "Foreign", "pierre_martin", None).await;
    common::comment(&sqlite, &own, None, "on own", false).await;
    common::comment(&sqlite, &foreign, None, "on foreign", false).await;

    let mine = moderation::moderation_queue(&repo, Some(&marie), QueueStatus::Pending)
        .await
        .unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].article_title, "Own");

    let all = moderation::moderation_queue(&repo, Some(&admin), QueueStatus::Pending)
        .await
        .unwrap();
    assert_eq!(all.len(), 2);

    let err = moderation::moderation_queue(&repo, Some(&reader), QueueStatus::All)
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::Forbidden);
}

fn comment_request(body: &str, parent_id: Option<i64>) -> CreateCommentRequest {
    CreateCommentRequest {
        name: "Visitor".into(),
        email: "v@example.com".into(),
        body: body.into(),
        parent_id,
    }
}

#[tokio::test]
async fn test_submitted_comments_always_start_pending() {
    let sqlite = common::repo().await;
    let repo = sqlite.clone() as RepositoryState;
    let article = common::article(&sqlite, "A", "x", None).await;

    let c = moderation::submit_comment(&repo, article.id, comment_request("hello", None))
        .await
        .unwrap();
    assert!(!c.is_approved);
    assert!(!c.is_deleted);
}

#[tokio::test]
async fn test_submission_validation() {
    let sqlite = common::repo().await;
    let repo = sqlite.clone() as RepositoryState;
    let article = common::article(&sqlite, "A", "x", None).await;
    let other = common::article(&sqlite, "B", "x", None).await;
    let foreign_parent = common::comment(&sqlite, &other, None, "elsewhere", true).await;

    let err = moderation::submit_comment(
        &repo,
        article.id,
        CreateCommentRequest {
            name: " ".into(),
            email: "nope".into(),
            body: "".into(),
            parent_id: Some(foreign_parent.id),
        },
    )
    .await
    .unwrap_err();
    let ApiError::Validation(fields) = err else {
        panic!("expected validation error");
    };
    for field in ["name", "email", "body", "parent_id"] {
        assert!(fields.contains(field), "{field}");
    }

    let err = moderation::submit_comment(&repo, Uuid::new_v4(), comment_request("hi", None))
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::NotFound("article"));
}
