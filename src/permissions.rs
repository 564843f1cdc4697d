//! Authorization engine.
//!
//! Every decision is a pure function of the viewer (identity + role), the
//! action, and the resource it targets. Denial is an ordinary return value;
//! handlers turn it into an error with [`require`].

use crate::{
    auth::AuthUser,
    error::ApiError,
    models::{Article, Capabilities, Category, Role},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    CreateCategory,
    UpdateCategory,
    DeleteCategory,
    /// Open the category management view.
    ListCategories,
    CreateArticle,
    UpdateArticle,
    DeleteArticle,
    /// Open the article management view.
    ManageArticles,
    /// Approve, reject, delete or reply to comments.
    ModerateComments,
    GenerateContent,
    UploadImage,
    ToggleLike,
    /// Create/delete roles and reassign profiles.
    ManageRoles,
    ViewStats,
}

/// What an action is aimed at. `Site` stands for "no particular resource",
/// e.g. opening a management view.
#[derive(Debug, Clone, Copy)]
pub enum Resource<'a> {
    Site,
    Category(&'a Category),
    Article(&'a Article),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Unauthenticated,
    Forbidden,
}

/// Case-insensitive full-string comparison of an author label with a username.
pub fn labels_match(author_label: &str, username: &str) -> bool {
    author_label.to_lowercase() == username.to_lowercase()
}

/// Whether `viewer` is the author of `article` according to its author label.
pub fn is_author(viewer: &AuthUser, article: &Article) -> bool {
    labels_match(&article.author_label, &viewer.username)
}

pub fn authorize(viewer: Option<&AuthUser>, action: Action, resource: Resource<'_>) -> Decision {
    let Some(viewer) = viewer else {
        return Decision::Unauthenticated;
    };

    let allowed = match (&viewer.role, action) {
        (_, Action::ToggleLike) => true,
        (Role::Admin, _) => true,
        (Role::Journalist, action) => journalist_may(viewer, action, resource),
        // Readers and unrecognized roles have no rights beyond liking.
        (Role::Reader | Role::Other(_), _) => false,
    };

    if allowed {
        Decision::Allow
    } else {
        Decision::Forbidden
    }
}

fn journalist_may(viewer: &AuthUser, action: Action, resource: Resource<'_>) -> bool {
    match action {
        Action::CreateCategory
        | Action::UpdateCategory
        | Action::DeleteCategory
        | Action::ManageRoles => false,
        Action::ListCategories
        | Action::CreateArticle
        | Action::ManageArticles
        | Action::GenerateContent
        | Action::UploadImage
        | Action::ViewStats
        | Action::ToggleLike => true,
        Action::UpdateArticle | Action::DeleteArticle => {
            matches!(resource, Resource::Article(article) if is_author(viewer, article))
        }
        Action::ModerateComments => match resource {
            // The queue itself; its contents are scoped per article.
            Resource::Site => true,
            Resource::Article(article) => is_author(viewer, article),
            Resource::Category(_) => false,
        },
    }
}

pub fn can(viewer: Option<&AuthUser>, action: Action, resource: Resource<'_>) -> bool {
    authorize(viewer, action, resource) == Decision::Allow
}

/// Turns a non-`Allow` decision into the matching error, logging the denial.
pub fn require(
    viewer: Option<&AuthUser>,
    action: Action,
    resource: Resource<'_>,
) -> Result<(), ApiError> {
    match authorize(viewer, action, resource) {
        Decision::Allow => Ok(()),
        Decision::Unauthenticated => Err(ApiError::Unauthenticated),
        Decision::Forbidden => {
            tracing::warn!(
                viewer = ?viewer.map(|v| v.id),
                role = ?viewer.map(|v| v.role.name()),
                action = ?action,
                resource = %describe(resource),
                "authorization denied"
            );
            Err(ApiError::Forbidden)
        }
    }
}

fn describe(resource: Resource<'_>) -> String {
    match resource {
        Resource::Site => "site".to_string(),
        Resource::Category(category) => format!("category:{}", category.id),
        Resource::Article(article) => format!("article:{}", article.id),
    }
}

/// Capability flags for one article, for the presentation layer.
pub fn capabilities(viewer: Option<&AuthUser>, article: &Article) -> Capabilities {
    let resource = Resource::Article(article);
    Capabilities {
        can_edit: can(viewer, Action::UpdateArticle, resource),
        can_delete: can(viewer, Action::DeleteArticle, resource),
        can_moderate: can(viewer, Action::ModerateComments, resource),
    }
}
