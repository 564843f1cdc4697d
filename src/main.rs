use press_portal::{
    AppState,
    config::{AppConfig, Env},
    create_router,
    repository::{Repository, RepositoryState, SqliteRepository},
    storage::{S3StorageClient, StorageService, StorageState},
    suggestion,
};
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// main
///
/// Entry point of the press portal. Brings the service up in a fixed order:
/// configuration, logging, the SQLite database and its role registry, object
/// storage, the content-suggestion client, and finally the HTTP server.
///
/// Every step that cannot recover panics with a `FATAL:` message naming the
/// setting to check.
#[tokio::main]
async fn main() {
    // 1. Configuration
    // .env is optional; AppConfig::load() refuses to start production with missing secrets.
    dotenv::dotenv().ok();
    let config = AppConfig::load();

    // 2. Logging filter
    // RUST_LOG wins over the defaults.
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "press_portal=debug,tower_http=info,axum=trace".into());

    // 3. Subscriber per environment
    match config.env {
        Env::Local => {
            // Human-readable output for development.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().pretty())
                .init();
        }
        Env::Production => {
            // One JSON object per line for log aggregation.
            tracing_subscriber::registry()
                .with(env_filter)
                .with(tracing_subscriber::fmt::layer().json())
                .init();
        }
    }

    tracing::info!("Application starting in {:?} mode", config.env);
    if !config.app_env_set {
        tracing::warn!(
            "APP_ENV is not set; defaulting to local mode. The x-user-id header \
             bypass is active. Set APP_ENV=production for deployments."
        );
    }

    // 4. Database
    // Opens (or creates) the SQLite file, applies migrations and seeds the
    // canonical roles. Seeding never duplicates or removes existing roles.
    let sqlite = SqliteRepository::connect(&config.db_url)
        .await
        .expect("FATAL: Failed to open the database. Check DATABASE_URL.");
    let roles = sqlite
        .ensure_default_roles()
        .await
        .expect("FATAL: Failed to seed the default roles.");
    tracing::info!(
        reader = roles.reader.id,
        journalist = roles.journalist.id,
        admin = roles.admin.id,
        "default roles ready"
    );
    let repo = Arc::new(sqlite) as RepositoryState;

    // 5. Object storage (S3/MinIO)
    let s3_client = S3StorageClient::new(
        &config.s3_endpoint,
        &config.s3_region,
        &config.s3_key,
        &config.s3_secret,
        &config.s3_bucket,
    )
    .await;

    // MinIO bucket provisioning for the docker-compose setup.
    if config.env == Env::Local {
        s3_client.ensure_bucket_exists().await;
    }
    let storage = Arc::new(s3_client) as StorageState;

    // 6. Content suggestions
    // Without GEMINI_API_KEY suggestions answer 502 instead of failing startup.
    let suggester = suggestion::from_config(&config)
        .expect("FATAL: Failed to build the content-suggestion client.");

    // 7. State assembly
    let bind_addr = config.bind_addr.clone();
    let app_state = AppState {
        repo,
        storage,
        suggester,
        config,
    };

    // 8. Router and server
    let app = create_router(app_state);

    let listener = TcpListener::bind(&bind_addr)
        .await
        .expect("FATAL: Failed to bind the HTTP listener. Check BIND_ADDR.");

    tracing::info!("Listening on {bind_addr}");
    tracing::info!("API Documentation (Swagger UI) available at: http://{bind_addr}/swagger-ui");

    axum::serve(listener, app)
        .await
        .expect("FATAL: HTTP server terminated unexpectedly.");
}
