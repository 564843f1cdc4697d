use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

// Authorization and visibility core.
pub mod moderation;
pub mod permissions;
pub mod search;
pub mod visibility;

// Services, persistence and collaborators.
pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod storage;
pub mod suggestion;

// Security-segregated routers (public, authenticated, admin).
pub mod routes;
use auth::AuthUser;
use routes::{admin, authenticated, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use error::ApiError;
pub use repository::{RepositoryState, SqliteRepository};
pub use storage::{MockStorageService, S3StorageClient, StorageState};
pub use suggestion::SuggesterState;

/// ApiDoc
///
/// OpenAPI document assembled from the `#[utoipa::path]` handlers and the
/// `ToSchema` models, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::register, handlers::login, handlers::get_me,
        handlers::list_categories, handlers::manage_categories, handlers::create_category,
        handlers::update_category, handlers::delete_category,
        handlers::list_articles, handlers::search_articles, handlers::get_article,
        handlers::create_article, handlers::update_article, handlers::delete_article,
        handlers::manage_articles, handlers::toggle_like,
        handlers::add_comment, handlers::moderation_queue, handlers::moderate_comment,
        handlers::suggest_article, handlers::get_presigned_url, handlers::get_stats,
        handlers::list_roles, handlers::create_role, handlers::delete_role, handlers::assign_role,
    ),
    components(
        schemas(
            models::Account, models::Profile, models::RoleRecord, models::Category,
            models::Article, models::Comment, models::Like, models::RegisterRequest,
            models::LoginRequest, models::TokenResponse, models::CategoryRequest,
            models::CreateArticleRequest, models::UpdateArticleRequest,
            models::CreateCommentRequest, models::RoleRequest, models::AssignRoleRequest,
            models::SuggestArticleRequest, models::ArticleSuggestion,
            models::PresignedUrlRequest, models::PresignedUrlResponse, models::Capabilities,
            models::LikeStatus, models::ArticleDetail, models::SearchHit, models::UserProfile,
            models::QueueStatus, models::ModerationQueueEntry, models::AdminDashboardStats,
            models::JournalistDashboardStats, models::DashboardStats,
            moderation::ModerationAction, moderation::ModerationResponse,
        )
    ),
    tags(
        (name = "press-portal", description = "Newsroom blog API")
    )
)]
pub struct ApiDoc;

/// AppState
///
/// Shared, cloneable container of every service a request may need. Handlers
/// and extractors pull the parts they use through `FromRef`.
#[derive(Clone)]
pub struct AppState {
    /// Persistence (SQLite in production, in-memory SQLite in tests).
    pub repo: RepositoryState,
    /// Article image storage (S3/MinIO, or the mock).
    pub storage: StorageState,
    /// Article drafting service.
    pub suggester: SuggesterState,
    pub config: AppConfig,
}

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for StorageState {
    fn from_ref(app_state: &AppState) -> StorageState {
        app_state.storage.clone()
    }
}

impl FromRef<AppState> for SuggesterState {
    fn from_ref(app_state: &AppState) -> SuggesterState {
        app_state.suggester.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Rejects the request with 401 unless an `AuthUser` can be resolved.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles the routers, the authentication layer, the observability stack
/// and CORS around `state`.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .nest(
            "/admin",
            admin::admin_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for one HTTP request, correlated by its `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
