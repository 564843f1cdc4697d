use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use ts_rs::TS;
use utoipa::ToSchema;
use uuid::Uuid;

// --- Roles ---

/// Role
///
/// The closed set of roles the authorization rules understand. Roles are stored
/// by name; any stored name outside the canonical three is kept as `Other` so it
/// can still be displayed, but no rule ever grants it anything beyond what a
/// reader gets.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    #[default]
    Reader,
    Journalist,
    Admin,
    Other(String),
}

impl Role {
    /// Stored name of the reader role.
    pub const READER: &'static str = "lecteur";
    /// Stored name of the journalist role.
    pub const JOURNALIST: &'static str = "journaliste";
    /// Stored name of the admin role.
    pub const ADMIN: &'static str = "admin";

    /// The three roles that must always exist.
    pub const CANONICAL: [&'static str; 3] = [Self::READER, Self::JOURNALIST, Self::ADMIN];

    /// Parses a stored role name. Only the canonical names are recognized.
    pub fn from_stored(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            Self::READER => Role::Reader,
            Self::JOURNALIST => Role::Journalist,
            Self::ADMIN => Role::Admin,
            _ => Role::Other(name.trim().to_string()),
        }
    }

    /// Parses a role name supplied by an API caller. English aliases are
    /// accepted and mapped onto the canonical role.
    pub fn from_input(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "reader" => Role::Reader,
            "journalist" => Role::Journalist,
            "administrator" => Role::Admin,
            _ => Self::from_stored(name),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Role::Reader => Self::READER,
            Role::Journalist => Self::JOURNALIST,
            Role::Admin => Self::ADMIN,
            Role::Other(name) => name,
        }
    }

    pub fn is_canonical(&self) -> bool {
        !matches!(self, Role::Other(_))
    }
}

impl From<String> for Role {
    fn from(name: String) -> Self {
        Role::from_stored(&name)
    }
}

impl From<&str> for Role {
    fn from(name: &str) -> Self {
        Role::from_stored(name)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.name().to_string()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// RoleRecord
///
/// A persisted row of the `roles` table. The name is unique at the storage level.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct RoleRecord {
    pub id: i64,
    pub name: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

impl RoleRecord {
    pub fn role(&self) -> Role {
        Role::from_stored(&self.name)
    }
}

/// Handles to the three canonical roles, as returned by the role registry.
#[derive(Debug, Clone, PartialEq)]
pub struct DefaultRoles {
    pub reader: RoleRecord,
    pub journalist: RoleRecord,
    pub admin: RoleRecord,
}

// --- Identity ---

/// Account
///
/// A registered identity. The password hash is never part of this struct; it is
/// only read by the login path.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Account {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Profile
///
/// The 1:1 binding between an account and its role.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Profile {
    pub account_id: Uuid,
    pub role_id: i64,
    #[sqlx(try_from = "String")]
    #[ts(type = "string")]
    #[schema(value_type = String)]
    pub role: Role,
}

// --- Content ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Article
///
/// `author_label` is a free-text display string. Journalist rights over an
/// article are derived from it by case-insensitive comparison with the
/// viewer's username (see `permissions::is_author`).
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Article {
    pub id: Uuid,
    pub title: String,
    pub body: String,
    pub author_label: String,
    pub category_id: Option<Uuid>,
    // Loaded via LEFT JOIN on categories.
    #[sqlx(default)]
    pub category_name: Option<String>,
    pub image_key: Option<String>,
    // Loaded via a COUNT subquery on likes.
    #[sqlx(default)]
    pub like_count: i64,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
    #[ts(type = "string")]
    pub updated_at: DateTime<Utc>,
}

/// Comment
///
/// Visitor comments are anonymous: name and email are free text. New public
/// submissions always start unapproved.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default, PartialEq)]
#[ts(export)]
pub struct Comment {
    pub id: i64,
    pub article_id: Uuid,
    pub parent_id: Option<i64>,
    pub name: String,
    pub email: String,
    pub body: String,
    pub is_approved: bool,
    pub is_deleted: bool,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

/// Like
///
/// Presence of the (account, article) row is the whole state.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
pub struct Like {
    pub account_id: Uuid,
    pub article_id: Uuid,
    #[ts(type = "string")]
    pub created_at: DateTime<Utc>,
}

// --- Internal write models ---

/// Fully resolved input for inserting an article. Built by the handler after
/// validation and author-label resolution.
#[derive(Debug, Clone, Default)]
pub struct NewArticle {
    pub title: String,
    pub body: String,
    pub author_label: String,
    pub category_id: Option<Uuid>,
    pub image_key: Option<String>,
}

/// Fully resolved input for inserting a comment.
#[derive(Debug, Clone, Default)]
pub struct NewComment {
    pub article_id: Uuid,
    pub parent_id: Option<i64>,
    pub name: String,
    pub email: String,
    pub body: String,
    pub is_approved: bool,
}

// --- Request Payloads ---

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// CreateArticleRequest
///
/// `author_label` is only honoured for admins; journalists always publish
/// under their own username.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateArticleRequest {
    pub title: String,
    pub body: String,
    #[serde(default)]
    pub author_label: Option<String>,
    #[serde(default)]
    pub category_id: Option<Uuid>,
    #[serde(default)]
    pub image_key: Option<String>,
}

/// UpdateArticleRequest
///
/// Partial update: absent fields are left untouched. Optional references are
/// cleared with the explicit `clear_*` flags.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateArticleRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author_label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_key: Option<String>,
    #[serde(default)]
    pub clear_category: bool,
    #[serde(default)]
    pub clear_image: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateCommentRequest {
    pub name: String,
    pub email: String,
    pub body: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RoleRequest {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct AssignRoleRequest {
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SuggestArticleRequest {
    /// Short description of the article to draft (max 500 characters).
    pub topic: String,
    /// `fr`, `en` or `es`; defaults to `fr`.
    #[serde(default)]
    pub locale: Option<String>,
}

/// PresignedUrlRequest
///
/// Input for requesting a short-lived upload URL for an article image.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlRequest {
    #[schema(example = "cover.png")]
    pub filename: String,
    #[schema(example = "image/png")]
    pub content_type: String,
}

// --- Responses ---

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, TS, Default)]
#[ts(export)]
pub struct PresignedUrlResponse {
    /// The time-limited URL for the PUT request.
    pub upload_url: String,
    /// The object key to store on the article as `image_key`.
    pub resource_key: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Per-resource capability flags so the presentation layer never re-derives
/// authorization rules.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, Default, PartialEq, Eq)]
#[ts(export)]
pub struct Capabilities {
    pub can_edit: bool,
    pub can_delete: bool,
    pub can_moderate: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, TS, ToSchema, Default, PartialEq, Eq)]
#[ts(export)]
pub struct LikeStatus {
    pub liked: bool,
    pub total: i64,
}

/// ArticleDetail
///
/// Everything the detail page renders: the article, the comments this viewer
/// may see (thread-ordered), the viewer's like state and capability flags.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ArticleDetail {
    pub article: Article,
    pub comments: Vec<Comment>,
    pub likes: LikeStatus,
    pub capabilities: Capabilities,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct SearchHit {
    pub article: Article,
    pub relevance: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq, Eq)]
#[ts(export)]
pub struct ArticleSuggestion {
    pub title: String,
    pub body: String,
}

/// UserProfile
///
/// Output of `GET /me`: the account, its role and the site-wide capabilities
/// the front end uses to decide which menus to show.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UserProfile {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    #[ts(type = "string")]
    #[schema(value_type = String)]
    pub role: Role,
    pub can_manage_articles: bool,
    pub can_manage_categories: bool,
    pub can_moderate: bool,
    pub can_generate: bool,
}

/// Which comments the moderation queue lists.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum QueueStatus {
    #[default]
    Pending,
    Approved,
    All,
}

/// One row of the moderation queue.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct ModerationQueueEntry {
    pub comment: Comment,
    pub article_title: String,
    pub article_author_label: String,
}

/// Per-article engagement counters, aggregated into dashboard stats.
#[derive(Debug, Clone, FromRow, Default)]
pub struct ArticleEngagement {
    pub article_id: Uuid,
    pub author_label: String,
    pub created_at: DateTime<Utc>,
    pub comments: i64,
    pub pending_comments: i64,
    pub likes: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq, Eq)]
#[ts(export)]
pub struct AdminDashboardStats {
    pub total_articles: i64,
    pub total_categories: i64,
    pub total_comments: i64,
    /// Comments awaiting approval (soft-deleted ones excluded).
    pub pending_comments: i64,
    pub total_likes: i64,
    pub total_accounts: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default, PartialEq, Eq)]
#[ts(export)]
pub struct JournalistDashboardStats {
    pub articles: i64,
    pub articles_this_month: i64,
    pub comments_received: i64,
    pub pending_comments: i64,
    pub likes_received: i64,
}

/// DashboardStats
///
/// Admins get site-wide totals, journalists get the numbers for the articles
/// carrying their author label.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, PartialEq, Eq)]
#[serde(tag = "scope", rename_all = "snake_case")]
#[ts(export)]
pub enum DashboardStats {
    Global(AdminDashboardStats),
    Own(JournalistDashboardStats),
}
