use crate::{AppState, handlers};
use axum::{
    Router,
    routing::{get, post},
};

/// Public Router Module
///
/// Endpoints reachable without credentials. Article detail still inspects an
/// optional bearer token so authors and admins see the pending comments of the
/// articles they moderate.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        // Liveness probe.
        .route("/health", get(|| async { "ok" }))
        // POST /register, POST /login
        // Local accounts. New accounts always start as readers.
        .route("/register", post(handlers::register))
        .route("/login", post(handlers::login))
        // GET /categories
        .route("/categories", get(handlers::list_categories))
        // GET /articles?category=...
        // Newest first.
        .route("/articles", get(handlers::list_articles))
        // GET /articles/search?q=...
        .route("/articles/search", get(handlers::search_articles))
        // GET /articles/{id}
        // Detail with the comments visible to the viewer, like count and
        // capability flags.
        .route("/articles/{id}", get(handlers::get_article))
        // POST /articles/{id}/comments
        // Anonymous comments; stored pending approval.
        .route("/articles/{id}/comments", post(handlers::add_comment))
}
