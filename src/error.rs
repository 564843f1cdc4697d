//! Error taxonomy shared by the repository and the HTTP handlers.

use std::collections::BTreeMap;

use axum::{
    Json,
    http::{HeaderValue, StatusCode, header},
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

/// Failures raised by the persistence layer.
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// A role was still referenced by at least one profile.
    #[error("role {0} is still assigned")]
    RoleInUse(String),

    /// A storage-level uniqueness constraint rejected the write.
    #[error("{0} already exists")]
    Duplicate(&'static str),

    #[error("{0} not found")]
    NotFound(&'static str),

    /// A persisted row could not be interpreted.
    #[error("malformed row: {0}")]
    Malformed(String),
}

/// Field-level validation messages, keyed by input field name.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<&'static str, String>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_insert_with(|| message.into());
    }

    pub fn contains(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Converts the collected messages into a result: `Ok` when nothing was
    /// reported.
    pub fn finish(self) -> Result<(), ApiError> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(ApiError::Validation(self))
        }
    }

    /// Shorthand for a single-field failure.
    pub fn single(field: &'static str, message: impl Into<String>) -> ApiError {
        let mut errors = Self::new();
        errors.add(field, message);
        ApiError::Validation(errors)
    }
}

/// Errors surfaced to HTTP callers.
///
/// `Unauthenticated` asks the caller to log in; `Forbidden` means the identity
/// is known but not allowed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ApiError {
    #[error("authentication required")]
    Unauthenticated,

    #[error("forbidden")]
    Forbidden,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("validation failed")]
    Validation(FieldErrors),

    #[error("role {0} is still assigned and cannot be deleted")]
    RoleInUse(String),

    #[error("{0}")]
    Conflict(String),

    /// The content-suggestion service failed and nothing could be salvaged.
    #[error("content generation is currently unavailable")]
    Upstream,

    #[error("internal error")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthenticated => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::RoleInUse(_) | ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream => StatusCode::BAD_GATEWAY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::RoleInUse(name) => ApiError::RoleInUse(name),
            RepositoryError::Duplicate(what) => ApiError::Conflict(format!("{what} already exists")),
            RepositoryError::NotFound(what) => ApiError::NotFound(what),
            other => {
                tracing::error!(error = %other, "repository failure");
                ApiError::Internal(other.to_string())
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        match self {
            ApiError::Unauthenticated => {
                let mut res =
                    (status, Json(json!({ "error": "authentication required" }))).into_response();
                res.headers_mut().insert(
                    header::WWW_AUTHENTICATE,
                    HeaderValue::from_static("Bearer realm=\"press-portal\""),
                );
                res
            }
            ApiError::Validation(fields) => (
                status,
                Json(json!({ "error": "validation failed", "fields": fields })),
            )
                .into_response(),
            // Internal details are logged where they occur, never returned.
            ApiError::Internal(_) => {
                (status, Json(json!({ "error": "internal error" }))).into_response()
            }
            other => (status, Json(json!({ "error": other.to_string() }))).into_response(),
        }
    }
}
