use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post, put},
};

/// Authenticated Router Module
///
/// Everything here sits behind the authentication layer, so each handler
/// receives a resolved `AuthUser` and only has to decide whether that user may
/// act on the targeted resource.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // GET /me
        // The viewer's profile and the menus they may open.
        .route("/me", get(handlers::get_me))
        // --- Articles ---
        // POST /articles
        // Journalists and admins.
        .route("/articles", post(handlers::create_article))
        // PUT/DELETE /articles/{id}
        // Admins, or the journalist whose username matches the author label.
        .route(
            "/articles/{id}",
            put(handlers::update_article).delete(handlers::delete_article),
        )
        // POST /articles/{id}/like
        // Toggle; any role.
        .route("/articles/{id}/like", post(handlers::toggle_like))
        // POST /articles/suggest
        // Drafts an article through the content-suggestion service.
        .route("/articles/suggest", post(handlers::suggest_article))
        // POST /articles/images/presign
        // Ten-minute upload URL for an article image.
        .route("/articles/images/presign", post(handlers::get_presigned_url))
        // --- Management views ---
        .route("/manage/articles", get(handlers::manage_articles))
        .route("/manage/categories", get(handlers::manage_categories))
        .route("/stats", get(handlers::get_stats))
        // --- Moderation ---
        // GET /moderation/comments?status=pending|approved|all
        .route("/moderation/comments", get(handlers::moderation_queue))
        // POST /moderation/comments/{id}
        // Body: {"action": "approve" | "reject" | "delete" | "purge" | "reply", "body"?}
        .route("/moderation/comments/{id}", post(handlers::moderate_comment))
}
