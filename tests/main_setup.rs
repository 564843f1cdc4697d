use press_portal::{
    AppConfig,
    config::{self, Env},
};
use serial_test::serial;
use std::{env, panic};

const CONFIG_VARS: [&str; 14] = [
    "APP_ENV",
    "DATABASE_URL",
    "BIND_ADDR",
    "JWT_SECRET",
    "JWT_TTL_SECS",
    "S3_ENDPOINT",
    "S3_REGION",
    "S3_ACCESS_KEY",
    "S3_SECRET_KEY",
    "S3_BUCKET_NAME",
    "GEMINI_API_KEY",
    "GEMINI_MODEL",
    "SUGGESTION_TIMEOUT_SECS",
    "RUST_LOG",
];

// --- Setup/Teardown Utilities ---

/// Runs `test` on a clean configuration environment and restores the original
/// variables afterwards, even when the test panics.
fn run_with_env<T, R>(test: T) -> R
where
    T: FnOnce() -> R + panic::UnwindSafe,
{
    let originals: Vec<(&str, Option<String>)> = CONFIG_VARS
        .iter()
        .map(|&var| (var, env::var(var).ok()))
        .collect();
    for var in CONFIG_VARS {
        unsafe { env::remove_var(var) };
    }

    let result = panic::catch_unwind(test);

    for (key, original_value) in originals.into_iter().rev() {
        unsafe {
            if let Some(val) = original_value {
                env::set_var(key, val);
            } else {
                env::remove_var(key);
            }
        }
    }

    match result {
        Ok(value) => value,
        Err(e) => panic::resume_unwind(e),
    }
}

// --- Tests ---

#[test]
#[serial]
fn test_app_config_production_fail_fast() {
    let result = run_with_env(|| {
        panic::catch_unwind(|| {
            unsafe {
                env::set_var("APP_ENV", "production");
                env::set_var("DATABASE_URL", "sqlite:///var/lib/press/press.db");
                env::set_var("JWT_SECRET", "prod-secret");
            }
            // S3 credentials are missing.
            AppConfig::load()
        })
    });

    assert!(result.is_err(), "production config must refuse to start without S3 credentials");
}

#[test]
#[serial]
fn test_app_config_production_requires_jwt_secret() {
    let result = run_with_env(|| {
        panic::catch_unwind(|| {
            unsafe {
                env::set_var("APP_ENV", "production");
                env::set_var("DATABASE_URL", "sqlite:///var/lib/press/press.db");
                env::set_var("S3_ENDPOINT", "https://s3.example.com");
                env::set_var("S3_ACCESS_KEY", "key");
                env::set_var("S3_SECRET_KEY", "secret");
            }
            AppConfig::load()
        })
    });

    assert!(result.is_err());
}

#[test]
#[serial]
fn test_app_config_production_success() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("APP_ENV", "production");
            env::set_var("DATABASE_URL", "sqlite:///var/lib/press/press.db");
            env::set_var("JWT_SECRET", "prod-secret");
            env::set_var("S3_ENDPOINT", "https://s3.example.com");
            env::set_var("S3_ACCESS_KEY", "key");
            env::set_var("S3_SECRET_KEY", "secret");
            env::set_var("GEMINI_API_KEY", "gemini-key");
        }
        AppConfig::load()
    });

    assert_eq!(config.env, Env::Production);
    assert!(config.app_env_set);
    assert_eq!(config.jwt_secret, "prod-secret");
    assert_eq!(config.s3_bucket, config::DEFAULT_BUCKET);
    assert_eq!(config.gemini_api_key.as_deref(), Some("gemini-key"));
}

#[test]
#[serial]
fn test_app_config_local_defaults() {
    let config = run_with_env(AppConfig::load);

    assert_eq!(config.env, Env::Local);
    assert_eq!(config.db_url, config::DEFAULT_DB_URL);
    assert_eq!(config.bind_addr, config::DEFAULT_BIND_ADDR);
    assert_eq!(config.jwt_ttl_secs, config::DEFAULT_JWT_TTL_SECS);
    assert_eq!(config.s3_endpoint, "http://localhost:9000");
    assert_eq!(config.gemini_model, config::DEFAULT_GEMINI_MODEL);
    assert_eq!(
        config.suggestion_timeout_secs,
        config::DEFAULT_SUGGESTION_TIMEOUT_SECS
    );
    assert!(config.gemini_api_key.is_none());
    assert!(!config.jwt_secret.is_empty());
    // Local was chosen implicitly; main warns about it.
    assert!(!config.app_env_set);
}

#[test]
#[serial]
fn test_app_config_records_explicit_app_env() {
    let local = run_with_env(|| {
        unsafe { env::set_var("APP_ENV", "local") };
        AppConfig::load()
    });
    assert_eq!(local.env, Env::Local);
    assert!(local.app_env_set);

    // A typo still lands in Local, but it is not reported as unset.
    let typo = run_with_env(|| {
        unsafe { env::set_var("APP_ENV", "prod") };
        AppConfig::load()
    });
    assert_eq!(typo.env, Env::Local);
    assert!(typo.app_env_set);
}

#[test]
#[serial]
fn test_app_config_local_overrides() {
    let config = run_with_env(|| {
        unsafe {
            env::set_var("BIND_ADDR", "127.0.0.1:8080");
            env::set_var("JWT_TTL_SECS", " 600 ");
            env::set_var("SUGGESTION_TIMEOUT_SECS", "not-a-number");
            env::set_var("GEMINI_API_KEY", "   ");
            env::set_var("S3_BUCKET_NAME", "media");
        }
        AppConfig::load()
    });

    assert_eq!(config.bind_addr, "127.0.0.1:8080");
    assert_eq!(config.jwt_ttl_secs, 600);
    // Unparseable values fall back to the default.
    assert_eq!(
        config.suggestion_timeout_secs,
        config::DEFAULT_SUGGESTION_TIMEOUT_SECS
    );
    // A blank key disables suggestions.
    assert!(config.gemini_api_key.is_none());
    assert_eq!(config.s3_bucket, "media");
}

#[test]
fn test_default_config_is_usable_in_tests() {
    let config = AppConfig::default();
    assert_eq!(config.env, Env::Local);
    assert_eq!(config.db_url, "sqlite::memory:");
    assert!(config.gemini_api_key.is_none());
}
