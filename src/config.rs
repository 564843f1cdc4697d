use std::env;

/// AppConfig
///
/// Immutable configuration, loaded once at startup and pulled into handlers and
/// extractors through `FromRef`.
#[derive(Clone, Debug)]
pub struct AppConfig {
    // SQLite connection string.
    pub db_url: String,
    // Address the HTTP listener binds to.
    pub bind_addr: String,
    // HS256 signing secret for access tokens.
    pub jwt_secret: String,
    // Lifetime of issued access tokens, in seconds.
    pub jwt_ttl_secs: u64,
    // S3-compatible storage for article images (MinIO locally).
    pub s3_endpoint: String,
    pub s3_region: String,
    pub s3_key: String,
    pub s3_secret: String,
    pub s3_bucket: String,
    // Article suggestions are disabled when no key is configured.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub suggestion_timeout_secs: u64,
    // Runtime environment marker. Controls the local `x-user-id` bypass and log format.
    pub env: Env,
    // False when APP_ENV was absent and `env` fell back to Local.
    pub app_env_set: bool,
}

/// Env
///
/// Local development versus hardened production settings.
#[derive(Clone, PartialEq, Debug)]
pub enum Env {
    Local,
    Production,
}

pub const DEFAULT_DB_URL: &str = "sqlite://press_portal.db?mode=rwc";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_JWT_TTL_SECS: u64 = 86_400;
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.0-flash";
pub const DEFAULT_SUGGESTION_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_BUCKET: &str = "press-media";
const LOCAL_JWT_SECRET: &str = "press-portal-local-secret";

impl Default for AppConfig {
    /// default
    ///
    /// Non-panicking values for test state setup: in-memory database, MinIO
    /// defaults, suggestions disabled.
    fn default() -> Self {
        Self {
            db_url: "sqlite::memory:".to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            jwt_secret: "super-secure-test-secret-value-local".to_string(),
            jwt_ttl_secs: DEFAULT_JWT_TTL_SECS,
            s3_endpoint: "http://localhost:9000".to_string(),
            s3_region: "us-east-1".to_string(),
            s3_key: "admin".to_string(),
            s3_secret: "password".to_string(),
            s3_bucket: "press-test".to_string(),
            gemini_api_key: None,
            gemini_model: DEFAULT_GEMINI_MODEL.to_string(),
            suggestion_timeout_secs: DEFAULT_SUGGESTION_TIMEOUT_SECS,
            env: Env::Local,
            app_env_set: true,
        }
    }
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_or<T: std::str::FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

impl AppConfig {
    /// load
    ///
    /// Reads the configuration from the environment, once, at startup.
    ///
    /// `APP_ENV=production` selects [`Env::Production`]. Any other value, or no
    /// value at all, selects [`Env::Local`]: every setting then has a
    /// development default (MinIO on localhost, a fixed JWT secret, a SQLite
    /// file in the working directory) and the `x-user-id` header bypass is
    /// accepted. `app_env_set` records whether the choice was explicit so the
    /// binary can warn about an implicit Local.
    ///
    /// Numeric settings that fail to parse keep their default. A blank
    /// `GEMINI_API_KEY` counts as unset.
    ///
    /// # Panics
    /// In production, panics when `DATABASE_URL`, `JWT_SECRET` or the S3
    /// credentials are missing, so the service never starts half-configured.
    pub fn load() -> Self {
        let app_env = env::var("APP_ENV").ok();
        let app_env_set = app_env.is_some();
        let env = match app_env.as_deref().map(str::trim) {
            Some("production") => Env::Production,
            _ => Env::Local,
        };

        let gemini_api_key = env::var("GEMINI_API_KEY")
            .ok()
            .filter(|key| !key.trim().is_empty());
        let gemini_model = var_or("GEMINI_MODEL", DEFAULT_GEMINI_MODEL);
        let suggestion_timeout_secs =
            parse_or("SUGGESTION_TIMEOUT_SECS", DEFAULT_SUGGESTION_TIMEOUT_SECS);
        let jwt_ttl_secs = parse_or("JWT_TTL_SECS", DEFAULT_JWT_TTL_SECS);
        let bind_addr = var_or("BIND_ADDR", DEFAULT_BIND_ADDR);

        match env {
            Env::Local => Self {
                env: Env::Local,
                app_env_set,
                db_url: var_or("DATABASE_URL", DEFAULT_DB_URL),
                bind_addr,
                jwt_secret: var_or("JWT_SECRET", LOCAL_JWT_SECRET),
                jwt_ttl_secs,
                // MinIO from docker-compose.
                s3_endpoint: var_or("S3_ENDPOINT", "http://localhost:9000"),
                s3_region: var_or("S3_REGION", "us-east-1"),
                s3_key: var_or("S3_ACCESS_KEY", "admin"),
                s3_secret: var_or("S3_SECRET_KEY", "password"),
                s3_bucket: var_or("S3_BUCKET_NAME", DEFAULT_BUCKET),
                gemini_api_key,
                gemini_model,
                suggestion_timeout_secs,
            },
            Env::Production => Self {
                env: Env::Production,
                app_env_set,
                db_url: env::var("DATABASE_URL").expect("FATAL: DATABASE_URL required in prod"),
                bind_addr,
                jwt_secret: env::var("JWT_SECRET")
                    .expect("FATAL: JWT_SECRET must be set in production."),
                jwt_ttl_secs,
                s3_endpoint: env::var("S3_ENDPOINT").expect("FATAL: S3_ENDPOINT required in prod"),
                s3_region: var_or("S3_REGION", "us-east-1"),
                s3_key: env::var("S3_ACCESS_KEY").expect("FATAL: S3_ACCESS_KEY required in prod"),
                s3_secret: env::var("S3_SECRET_KEY")
                    .expect("FATAL: S3_SECRET_KEY required in prod"),
                s3_bucket: var_or("S3_BUCKET_NAME", DEFAULT_BUCKET),
                gemini_api_key,
                gemini_model,
                suggestion_timeout_secs,
            },
        }
    }
}
