#![allow(dead_code)]

use std::sync::Arc;

use press_portal::{
    AppConfig, AppState, MockStorageService, SqliteRepository,
    auth::AuthUser,
    models::{Article, Category, NewArticle, NewComment, Comment, Role},
    repository::{Repository, RepositoryState},
    storage::StorageState,
    suggestion::{StaticSuggester, SuggesterState},
};

pub const TEST_JWT_SECRET: &str = "super-secure-test-secret-value-local";

/// A migrated, private in-memory database with the canonical roles seeded.
pub async fn repo() -> Arc<SqliteRepository> {
    let repo = SqliteRepository::in_memory()
        .await
        .expect("in-memory database");
    repo.ensure_default_roles().await.expect("default roles");
    Arc::new(repo)
}

pub fn state_with(repo: RepositoryState, suggester: StaticSuggester) -> AppState {
    AppState {
        repo,
        storage: Arc::new(MockStorageService::new()) as StorageState,
        suggester: Arc::new(suggester) as SuggesterState,
        config: AppConfig::default(),
    }
}

pub fn state(repo: RepositoryState) -> AppState {
    state_with(repo, StaticSuggester::answering(r#"{"title":"Draft","body":"Text"}"#))
}

/// Registers `username` and gives it `role`. The password hash is a dummy.
pub async fn user(repo: &SqliteRepository, username: &str, role: Role) -> AuthUser {
    let account = repo
        .create_account(username, &format!("{username}@example.com"), "not-a-hash")
        .await
        .expect("account");
    let profile = repo
        .set_role(account.id, &role)
        .await
        .expect("set role")
        .expect("profile");

    AuthUser {
        id: account.id,
        username: account.username,
        email: account.email,
        role: profile.role,
    }
}

pub async fn category(repo: &SqliteRepository, name: &str) -> Category {
    repo.create_category(name, "").await.expect("category")
}

pub async fn article(
    repo: &SqliteRepository,
    title: &str,
    author_label: &str,
    category_id: Option<uuid::Uuid>,
) -> Article {
    repo.create_article(NewArticle {
        title: title.to_string(),
        body: format!("Body of {title}"),
        author_label: author_label.to_string(),
        category_id,
        image_key: None,
    })
    .await
    .expect("article")
}

pub async fn comment(
    repo: &SqliteRepository,
    article: &Article,
    parent_id: Option<i64>,
    body: &str,
    approved: bool,
) -> Comment {
    repo.create_comment(NewComment {
        article_id: article.id,
        parent_id,
        name: "Visitor".to_string(),
        email: "visitor@example.com".to_string(),
        body: body.to_string(),
        is_approved: approved,
    })
    .await
    .expect("comment")
}
