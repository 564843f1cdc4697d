use crate::{
    AppState,
    auth::{self, AuthUser, MaybeAuthUser},
    error::{ApiError, FieldErrors},
    models::{
        Account, AdminDashboardStats, Article, ArticleDetail, ArticleEngagement,
        ArticleSuggestion, AssignRoleRequest, Category, CategoryRequest, Comment,
        CreateArticleRequest, CreateCommentRequest, DashboardStats, JournalistDashboardStats,
        LikeStatus, LoginRequest, ModerationQueueEntry, NewArticle, PresignedUrlRequest,
        PresignedUrlResponse, Profile, QueueStatus, RegisterRequest, Role, RoleRecord,
        RoleRequest, SearchHit, SuggestArticleRequest, TokenResponse, UpdateArticleRequest,
        UserProfile,
    },
    moderation::{self, ModerationAction, ModerationResponse},
    permissions::{self, Action, Resource},
    search,
    storage,
    suggestion,
    visibility,
};
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use chrono::{DateTime, Datelike, Utc};
use serde::Deserialize;
use uuid::Uuid;

pub const MAX_TITLE_LEN: usize = 200;
pub const MAX_AUTHOR_LABEL_LEN: usize = 100;
pub const MAX_CATEGORY_NAME_LEN: usize = 100;
pub const MAX_ROLE_NAME_LEN: usize = 50;
pub const MAX_TOPIC_LEN: usize = 500;
pub const MIN_PASSWORD_LEN: usize = 8;

// --- Query Structs ---

/// ArticleFilter
///
/// Query parameters of the public article listing (GET /articles).
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct ArticleFilter {
    /// Only list articles of this category.
    pub category: Option<Uuid>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct SearchQuery {
    /// Free-text query, at most 200 characters.
    pub q: Option<String>,
}

#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
pub struct QueueFilter {
    /// `pending` (default), `approved` or `all`.
    pub status: Option<QueueStatus>,
}

// --- Identity ---

fn valid_username(username: &str) -> bool {
    let len = username.chars().count();
    (3..=150).contains(&len)
        && username
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_.@+-".contains(c))
}

/// register
///
/// [Public Route] Creates an account with a local password. Every new account
/// starts as a reader.
#[utoipa::path(
    post,
    path = "/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Registered", body = Account),
        (status = 409, description = "Username taken"),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<Account>), ApiError> {
    let username = payload.username.trim();
    let email = payload.email.trim();

    let mut errors = FieldErrors::new();
    if !valid_username(username) {
        errors.add(
            "username",
            "3 to 150 characters: letters, digits and _ . @ + - only",
        );
    }
    if !email.contains('@') {
        errors.add("email", "a valid email address is required");
    }
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        errors.add(
            "password",
            format!("password must be at least {MIN_PASSWORD_LEN} characters"),
        );
    }
    errors.finish()?;

    let hash = auth::hash_password(&payload.password)?;
    let account = state.repo.create_account(username, email, &hash).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

/// login
///
/// [Public Route] Exchanges a username and password for a bearer token.
#[utoipa::path(
    post,
    path = "/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = TokenResponse),
        (status = 401, description = "Bad credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let Some((account, hash)) = state.repo.get_credentials(payload.username.trim()).await? else {
        return Err(ApiError::Unauthenticated);
    };
    if !auth::verify_password(&payload.password, &hash) {
        tracing::info!(username = %account.username, "failed login");
        return Err(ApiError::Unauthenticated);
    }

    let token = auth::issue_token(&state.config, account.id)?;
    Ok(Json(TokenResponse {
        access_token: token,
        token_type: "Bearer".to_string(),
        expires_in: state.config.jwt_ttl_secs,
    }))
}

/// get_me
///
/// [Authenticated Route] The viewer's account, role and site-wide capabilities.
#[utoipa::path(
    get,
    path = "/me",
    responses((status = 200, description = "Profile", body = UserProfile))
)]
pub async fn get_me(user: AuthUser) -> Json<UserProfile> {
    let viewer = Some(&user);
    Json(UserProfile {
        can_manage_articles: permissions::can(viewer, Action::ManageArticles, Resource::Site),
        can_manage_categories: permissions::can(viewer, Action::ListCategories, Resource::Site),
        can_moderate: permissions::can(viewer, Action::ModerateComments, Resource::Site),
        can_generate: permissions::can(viewer, Action::GenerateContent, Resource::Site),
        id: user.id,
        username: user.username,
        email: user.email,
        role: user.role,
    })
}

// --- Categories ---

fn validate_category(payload: &CategoryRequest) -> Result<(String, String), ApiError> {
    let name = payload.name.trim();
    let mut errors = FieldErrors::new();
    if name.is_empty() {
        errors.add("name", "name is required");
    } else if name.chars().count() > MAX_CATEGORY_NAME_LEN {
        errors.add(
            "name",
            format!("name must be at most {MAX_CATEGORY_NAME_LEN} characters"),
        );
    }
    errors.finish()?;

    let description = payload.description.as_deref().unwrap_or_default().trim();
    Ok((name.to_string(), description.to_string()))
}

/// list_categories
///
/// [Public Route] All categories, by name.
#[utoipa::path(
    get,
    path = "/categories",
    responses((status = 200, description = "Categories", body = [Category]))
)]
pub async fn list_categories(
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, ApiError> {
    Ok(Json(state.repo.list_categories().await?))
}

/// manage_categories
///
/// [Authenticated Route] The category management view; journalists get it
/// read-only.
#[utoipa::path(
    get,
    path = "/manage/categories",
    responses(
        (status = 200, description = "Categories", body = [Category]),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn manage_categories(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Category>>, ApiError> {
    permissions::require(Some(&user), Action::ListCategories, Resource::Site)?;
    Ok(Json(state.repo.list_categories().await?))
}

/// create_category
///
/// [Admin Route]
#[utoipa::path(
    post,
    path = "/admin/categories",
    request_body = CategoryRequest,
    responses(
        (status = 201, description = "Created", body = Category),
        (status = 409, description = "Duplicate name")
    )
)]
pub async fn create_category(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CategoryRequest>,
) -> Result<(StatusCode, Json<Category>), ApiError> {
    permissions::require(Some(&user), Action::CreateCategory, Resource::Site)?;
    let (name, description) = validate_category(&payload)?;

    let category = state.repo.create_category(&name, &description).await?;
    tracing::info!(category_id = %category.id, name = %category.name, "category created");
    Ok((StatusCode::CREATED, Json(category)))
}

/// update_category
///
/// [Admin Route]
#[utoipa::path(
    put,
    path = "/admin/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    request_body = CategoryRequest,
    responses((status = 200, description = "Updated", body = Category))
)]
pub async fn update_category(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<CategoryRequest>,
) -> Result<Json<Category>, ApiError> {
    let category = state
        .repo
        .get_category(id)
        .await?
        .ok_or(ApiError::NotFound("category"))?;
    permissions::require(Some(&user), Action::UpdateCategory, Resource::Category(&category))?;
    let (name, description) = validate_category(&payload)?;

    state
        .repo
        .update_category(id, &name, &description)
        .await?
        .map(Json)
        .ok_or(ApiError::NotFound("category"))
}

/// delete_category
///
/// [Admin Route] Articles of the category are kept, with their category cleared.
#[utoipa::path(
    delete,
    path = "/admin/categories/{id}",
    params(("id" = Uuid, Path, description = "Category ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_category(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let category = state
        .repo
        .get_category(id)
        .await?
        .ok_or(ApiError::NotFound("category"))?;
    permissions::require(Some(&user), Action::DeleteCategory, Resource::Category(&category))?;

    if !state.repo.delete_category(id).await? {
        return Err(ApiError::NotFound("category"));
    }
    tracing::info!(category_id = %id, "category deleted");
    Ok(StatusCode::NO_CONTENT)
}

// --- Articles ---

/// list_articles
///
/// [Public Route] Newest first, optionally filtered by category.
#[utoipa::path(
    get,
    path = "/articles",
    params(ArticleFilter),
    responses((status = 200, description = "Articles", body = [Article]))
)]
pub async fn list_articles(
    State(state): State<AppState>,
    Query(filter): Query<ArticleFilter>,
) -> Result<Json<Vec<Article>>, ApiError> {
    Ok(Json(state.repo.list_articles(filter.category).await?))
}

/// search_articles
///
/// [Public Route] Ranked full-text search over title, body, author and category.
#[utoipa::path(
    get,
    path = "/articles/search",
    params(SearchQuery),
    responses(
        (status = 200, description = "Hits", body = [SearchHit]),
        (status = 422, description = "Query too long")
    )
)]
pub async fn search_articles(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<Vec<SearchHit>>, ApiError> {
    let terms = search::parse_terms(query.q.as_deref().unwrap_or_default())?;
    if terms.is_empty() {
        return Ok(Json(vec![]));
    }

    let candidates = state.repo.search_candidates(&terms).await?;
    Ok(Json(search::rank(candidates, &terms)))
}

/// get_article
///
/// [Public Route] Article detail. Which comments are included depends on the
/// viewer: pending ones only for those allowed to moderate the article.
#[utoipa::path(
    get,
    path = "/articles/{id}",
    params(("id" = Uuid, Path, description = "Article ID")),
    responses(
        (status = 200, description = "Found", body = ArticleDetail),
        (status = 404, description = "Not Found")
    )
)]
pub async fn get_article(
    MaybeAuthUser(viewer): MaybeAuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ArticleDetail>, ApiError> {
    let article = state
        .repo
        .get_article(id)
        .await?
        .ok_or(ApiError::NotFound("article"))?;
    let viewer = viewer.as_ref();

    let comments = state.repo.list_comments(article.id).await?;
    let comments = visibility::visible_comments(viewer, &article, comments);
    let likes = state
        .repo
        .like_status(viewer.map(|v| v.id), article.id)
        .await?;
    let capabilities = permissions::capabilities(viewer, &article);

    Ok(Json(ArticleDetail {
        article,
        comments,
        likes,
        capabilities,
    }))
}

async fn validate_category_ref(
    state: &AppState,
    category_id: Option<Uuid>,
    errors: &mut FieldErrors,
) -> Result<(), ApiError> {
    if let Some(category_id) = category_id {
        if state.repo.get_category(category_id).await?.is_none() {
            errors.add("category_id", "category does not exist");
        }
    }
    Ok(())
}

fn check_title(title: &str, errors: &mut FieldErrors) {
    let len = title.chars().count();
    if len == 0 {
        errors.add("title", "title is required");
    } else if len > MAX_TITLE_LEN {
        errors.add("title", format!("title must be at most {MAX_TITLE_LEN} characters"));
    }
}

fn check_author_label(label: &str, errors: &mut FieldErrors) {
    if label.is_empty() {
        errors.add("author_label", "author label cannot be empty");
    } else if label.chars().count() > MAX_AUTHOR_LABEL_LEN {
        errors.add(
            "author_label",
            format!("author label must be at most {MAX_AUTHOR_LABEL_LEN} characters"),
        );
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// create_article
///
/// [Authenticated Route] Journalists always publish under their own username;
/// admins may set any author label.
#[utoipa::path(
    post,
    path = "/articles",
    request_body = CreateArticleRequest,
    responses(
        (status = 201, description = "Created", body = Article),
        (status = 403, description = "Forbidden"),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn create_article(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<CreateArticleRequest>,
) -> Result<(StatusCode, Json<Article>), ApiError> {
    permissions::require(Some(&user), Action::CreateArticle, Resource::Site)?;

    let title = payload.title.trim().to_string();
    let body = payload.body.trim().to_string();
    let author_label = match user.role {
        Role::Admin => non_blank(payload.author_label).unwrap_or_else(|| user.username.clone()),
        _ => user.username.clone(),
    };

    let mut errors = FieldErrors::new();
    check_title(&title, &mut errors);
    if body.is_empty() {
        errors.add("body", "body is required");
    }
    check_author_label(&author_label, &mut errors);
    validate_category_ref(&state, payload.category_id, &mut errors).await?;
    errors.finish()?;

    let article = state
        .repo
        .create_article(NewArticle {
            title,
            body,
            author_label,
            category_id: payload.category_id,
            image_key: non_blank(payload.image_key),
        })
        .await?;

    tracing::info!(article_id = %article.id, author = %article.author_label, "article created");
    Ok((StatusCode::CREATED, Json(article)))
}

/// update_article
///
/// [Authenticated Route] Partial update. Journalists may only edit articles
/// carrying their author label and cannot change that label.
#[utoipa::path(
    put,
    path = "/articles/{id}",
    params(("id" = Uuid, Path, description = "Article ID")),
    request_body = UpdateArticleRequest,
    responses(
        (status = 200, description = "Updated", body = Article),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn update_article(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(mut payload): Json<UpdateArticleRequest>,
) -> Result<Json<Article>, ApiError> {
    let article = state
        .repo
        .get_article(id)
        .await?
        .ok_or(ApiError::NotFound("article"))?;
    permissions::require(Some(&user), Action::UpdateArticle, Resource::Article(&article))?;

    payload.title = payload.title.map(|t| t.trim().to_string());
    payload.body = payload.body.map(|b| b.trim().to_string());
    payload.author_label = match user.role {
        Role::Admin => payload.author_label.map(|l| l.trim().to_string()),
        _ => None,
    };
    payload.image_key = non_blank(payload.image_key);

    let mut errors = FieldErrors::new();
    if let Some(title) = &payload.title {
        check_title(title, &mut errors);
    }
    if payload.body.as_deref() == Some("") {
        errors.add("body", "body cannot be empty");
    }
    if let Some(label) = &payload.author_label {
        check_author_label(label, &mut errors);
    }
    if !payload.clear_category {
        validate_category_ref(&state, payload.category_id, &mut errors).await?;
    }
    errors.finish()?;

    let updated = state
        .repo
        .update_article(id, payload)
        .await?
        .ok_or(ApiError::NotFound("article"))?;
    tracing::info!(article_id = %id, editor = %user.id, "article updated");
    Ok(Json(updated))
}

/// delete_article
///
/// [Authenticated Route] Comments and likes go with the article.
#[utoipa::path(
    delete,
    path = "/articles/{id}",
    params(("id" = Uuid, Path, description = "Article ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 403, description = "Not the author"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn delete_article(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let article = state
        .repo
        .get_article(id)
        .await?
        .ok_or(ApiError::NotFound("article"))?;
    permissions::require(Some(&user), Action::DeleteArticle, Resource::Article(&article))?;

    if !state.repo.delete_article(id).await? {
        return Err(ApiError::NotFound("article"));
    }
    tracing::info!(article_id = %id, editor = %user.id, "article deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// manage_articles
///
/// [Authenticated Route] The article management view: every article for
/// admins, their own for journalists.
#[utoipa::path(
    get,
    path = "/manage/articles",
    responses(
        (status = 200, description = "Articles", body = [Article]),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn manage_articles(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<Article>>, ApiError> {
    permissions::require(Some(&user), Action::ManageArticles, Resource::Site)?;

    let articles = state.repo.list_articles(None).await?;
    if user.role == Role::Admin {
        return Ok(Json(articles));
    }
    Ok(Json(
        articles
            .into_iter()
            .filter(|a| permissions::is_author(&user, a))
            .collect(),
    ))
}

/// toggle_like
///
/// [Authenticated Route] Likes the article, or removes the like if present.
#[utoipa::path(
    post,
    path = "/articles/{id}/like",
    params(("id" = Uuid, Path, description = "Article ID")),
    responses(
        (status = 200, description = "New like state", body = LikeStatus),
        (status = 404, description = "Not Found")
    )
)]
pub async fn toggle_like(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<LikeStatus>, ApiError> {
    let article = state
        .repo
        .get_article(id)
        .await?
        .ok_or(ApiError::NotFound("article"))?;
    permissions::require(Some(&user), Action::ToggleLike, Resource::Article(&article))?;

    Ok(Json(state.repo.toggle_like(user.id, article.id).await?))
}

// --- Comments & moderation ---

/// add_comment
///
/// [Public Route] Anyone may comment; the comment waits for approval.
#[utoipa::path(
    post,
    path = "/articles/{id}/comments",
    params(("id" = Uuid, Path, description = "Article ID")),
    request_body = CreateCommentRequest,
    responses(
        (status = 201, description = "Submitted, pending approval", body = Comment),
        (status = 404, description = "Article not found"),
        (status = 422, description = "Invalid input")
    )
)]
pub async fn add_comment(
    State(state): State<AppState>,
    Path(article_id): Path<Uuid>,
    Json(payload): Json<CreateCommentRequest>,
) -> Result<(StatusCode, Json<Comment>), ApiError> {
    let comment = moderation::submit_comment(&state.repo, article_id, payload).await?;
    Ok((StatusCode::CREATED, Json(comment)))
}

/// moderation_queue
///
/// [Authenticated Route] Comments awaiting (or past) moderation, scoped to
/// what the viewer may moderate.
#[utoipa::path(
    get,
    path = "/moderation/comments",
    params(QueueFilter),
    responses(
        (status = 200, description = "Queue", body = [ModerationQueueEntry]),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn moderation_queue(
    user: AuthUser,
    State(state): State<AppState>,
    Query(filter): Query<QueueFilter>,
) -> Result<Json<Vec<ModerationQueueEntry>>, ApiError> {
    let status = filter.status.unwrap_or_default();
    Ok(Json(
        moderation::moderation_queue(&state.repo, Some(&user), status).await?,
    ))
}

/// moderate_comment
///
/// [Authenticated Route] Approve, reject, delete, purge or reply to a comment.
#[utoipa::path(
    post,
    path = "/moderation/comments/{id}",
    params(("id" = i64, Path, description = "Comment ID")),
    request_body = ModerationAction,
    responses(
        (status = 200, description = "Applied", body = ModerationResponse),
        (status = 403, description = "Not allowed to moderate this article"),
        (status = 404, description = "Not Found")
    )
)]
pub async fn moderate_comment(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(action): Json<ModerationAction>,
) -> Result<Json<ModerationResponse>, ApiError> {
    let outcome = moderation::moderate(&state.repo, Some(&user), id, action).await?;
    Ok(Json(outcome.into()))
}

// --- Content tools ---

/// suggest_article
///
/// [Authenticated Route] Drafts a title and body from a topic summary.
#[utoipa::path(
    post,
    path = "/articles/suggest",
    request_body = SuggestArticleRequest,
    responses(
        (status = 200, description = "Draft", body = ArticleSuggestion),
        (status = 403, description = "Forbidden"),
        (status = 502, description = "Generation unavailable")
    )
)]
pub async fn suggest_article(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<SuggestArticleRequest>,
) -> Result<Json<ArticleSuggestion>, ApiError> {
    permissions::require(Some(&user), Action::GenerateContent, Resource::Site)?;

    let topic = payload.topic.trim();
    let len = topic.chars().count();
    if len == 0 {
        return Err(FieldErrors::single("topic", "topic is required"));
    }
    if len > MAX_TOPIC_LEN {
        return Err(FieldErrors::single(
            "topic",
            format!("topic must be at most {MAX_TOPIC_LEN} characters"),
        ));
    }
    let locale = suggestion::normalize_locale(payload.locale.as_deref());

    match state.suggester.suggest_article(topic, locale).await {
        Ok(draft) => Ok(Json(draft)),
        Err(e) => {
            tracing::error!(error = %e, user = %user.id, "article suggestion failed");
            Err(ApiError::Upstream)
        }
    }
}

/// get_presigned_url
///
/// [Authenticated Route] A short-lived upload URL for an article image. The
/// returned `resource_key` is what gets stored as the article's `image_key`.
#[utoipa::path(
    post,
    path = "/articles/images/presign",
    request_body = PresignedUrlRequest,
    responses(
        (status = 200, description = "URL", body = PresignedUrlResponse),
        (status = 422, description = "Not an accepted image type")
    )
)]
pub async fn get_presigned_url(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<PresignedUrlRequest>,
) -> Result<Json<PresignedUrlResponse>, ApiError> {
    permissions::require(Some(&user), Action::UploadImage, Resource::Site)?;
    let object_key = storage::image_key_for(&payload.filename, &payload.content_type)?;

    let url = state
        .storage
        .get_presigned_upload_url(&object_key, payload.content_type.trim())
        .await
        .map_err(|e| {
            tracing::error!(error = %e, key = %object_key, "presigning failed");
            ApiError::Internal(e)
        })?;

    Ok(Json(PresignedUrlResponse {
        upload_url: url,
        resource_key: object_key,
    }))
}

// --- Stats ---

/// Aggregates the engagement rows of the articles labelled `username`.
pub fn journalist_stats(
    rows: &[ArticleEngagement],
    username: &str,
    now: DateTime<Utc>,
) -> JournalistDashboardStats {
    rows.iter()
        .filter(|row| permissions::labels_match(&row.author_label, username))
        .fold(JournalistDashboardStats::default(), |mut acc, row| {
            acc.articles += 1;
            if row.created_at.year() == now.year() && row.created_at.month() == now.month() {
                acc.articles_this_month += 1;
            }
            acc.comments_received += row.comments;
            acc.pending_comments += row.pending_comments;
            acc.likes_received += row.likes;
            acc
        })
}

/// get_stats
///
/// [Authenticated Route] Site-wide totals for admins, own numbers for
/// journalists.
#[utoipa::path(
    get,
    path = "/stats",
    responses(
        (status = 200, description = "Stats", body = DashboardStats),
        (status = 403, description = "Forbidden")
    )
)]
pub async fn get_stats(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<DashboardStats>, ApiError> {
    permissions::require(Some(&user), Action::ViewStats, Resource::Site)?;

    if user.role == Role::Admin {
        let totals: AdminDashboardStats = state.repo.global_stats().await?;
        return Ok(Json(DashboardStats::Global(totals)));
    }

    let rows = state.repo.article_engagement().await?;
    Ok(Json(DashboardStats::Own(journalist_stats(
        &rows,
        &user.username,
        Utc::now(),
    ))))
}

// --- Roles ---

/// list_roles
///
/// [Admin Route]
#[utoipa::path(
    get,
    path = "/admin/roles",
    responses((status = 200, description = "Roles", body = [RoleRecord]))
)]
pub async fn list_roles(
    user: AuthUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<RoleRecord>>, ApiError> {
    permissions::require(Some(&user), Action::ManageRoles, Resource::Site)?;
    Ok(Json(state.repo.list_roles().await?))
}

/// create_role
///
/// [Admin Route] English aliases of the canonical roles resolve to the
/// canonical name, so they collide with it.
#[utoipa::path(
    post,
    path = "/admin/roles",
    request_body = RoleRequest,
    responses(
        (status = 201, description = "Created", body = RoleRecord),
        (status = 409, description = "Duplicate name")
    )
)]
pub async fn create_role(
    user: AuthUser,
    State(state): State<AppState>,
    Json(payload): Json<RoleRequest>,
) -> Result<(StatusCode, Json<RoleRecord>), ApiError> {
    permissions::require(Some(&user), Action::ManageRoles, Resource::Site)?;

    let name = payload.name.trim();
    if name.is_empty() || name.chars().count() > MAX_ROLE_NAME_LEN {
        return Err(FieldErrors::single(
            "name",
            format!("name must be 1 to {MAX_ROLE_NAME_LEN} characters"),
        ));
    }

    let role = Role::from_input(name);
    let record = state.repo.create_role(role.name()).await?;
    tracing::info!(role = %record.name, "role created");
    Ok((StatusCode::CREATED, Json(record)))
}

/// delete_role
///
/// [Admin Route] Canonical roles are permanent; any role still assigned to a
/// profile is refused with 409.
#[utoipa::path(
    delete,
    path = "/admin/roles/{id}",
    params(("id" = i64, Path, description = "Role ID")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not Found"),
        (status = 409, description = "Role in use or canonical")
    )
)]
pub async fn delete_role(
    user: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    permissions::require(Some(&user), Action::ManageRoles, Resource::Site)?;

    let role = state
        .repo
        .list_roles()
        .await?
        .into_iter()
        .find(|r| r.id == id)
        .ok_or(ApiError::NotFound("role"))?;
    if role.role().is_canonical() {
        return Err(ApiError::Conflict(format!(
            "role {} is built in and cannot be deleted",
            role.name
        )));
    }

    if !state.repo.delete_role(id).await? {
        return Err(ApiError::NotFound("role"));
    }
    tracing::info!(role = %role.name, "role deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// assign_role
///
/// [Admin Route] Moves an account's profile to another existing role.
#[utoipa::path(
    put,
    path = "/admin/accounts/{id}/role",
    params(("id" = Uuid, Path, description = "Account ID")),
    request_body = AssignRoleRequest,
    responses(
        (status = 200, description = "Updated", body = Profile),
        (status = 404, description = "Account or role not found")
    )
)]
pub async fn assign_role(
    user: AuthUser,
    State(state): State<AppState>,
    Path(account_id): Path<Uuid>,
    Json(payload): Json<AssignRoleRequest>,
) -> Result<Json<Profile>, ApiError> {
    permissions::require(Some(&user), Action::ManageRoles, Resource::Site)?;

    let role = Role::from_input(&payload.role);
    let profile = state
        .repo
        .set_role(account_id, &role)
        .await?
        .ok_or(ApiError::NotFound("account"))?;

    tracing::info!(admin = %user.id, %account_id, role = %profile.role, "role assigned");
    Ok(Json(profile))
}
