use argon2::{
    Argon2, PasswordHash, PasswordHasher, PasswordVerifier, password_hash::SaltString,
};
use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand_core::OsRng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::ApiError,
    models::Role,
    repository::RepositoryState,
};

/// Claims
///
/// Payload of the HS256 tokens issued by `POST /login`.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Account id.
    pub sub: Uuid,
    pub exp: usize,
    pub iat: usize,
}

/// AuthUser
///
/// The viewer identity every authorization decision is made against. The role
/// is read from the account's profile while the request is being extracted; a
/// missing profile is provisioned as reader at that point and nowhere else.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub role: Role,
}

/// MaybeAuthUser
///
/// Extractor for public routes whose output depends on who is asking (article
/// detail, comment visibility). Anonymous requests yield `None`; a request that
/// presents credentials which fail to validate is still rejected.
#[derive(Debug, Clone)]
pub struct MaybeAuthUser(pub Option<AuthUser>);

impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        resolve_viewer(parts, &repo, &config)
            .await?
            .ok_or(ApiError::Unauthenticated)
    }
}

impl<S> FromRequestParts<S> for MaybeAuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        Ok(MaybeAuthUser(resolve_viewer(parts, &repo, &config).await?))
    }
}

/// Resolves the viewer from the request headers.
///
/// Returns `Ok(None)` when no credentials were presented at all, and
/// `Err(Unauthenticated)` when credentials were presented but are invalid,
/// expired, or point at an account that no longer exists.
///
/// In `Env::Local` an `x-user-id` header naming an existing account is accepted
/// in place of a token.
pub async fn resolve_viewer(
    parts: &Parts,
    repo: &RepositoryState,
    config: &AppConfig,
) -> Result<Option<AuthUser>, ApiError> {
    if config.env == Env::Local {
        if let Some(user_id) = parts
            .headers
            .get("x-user-id")
            .and_then(|value| value.to_str().ok())
            .and_then(|value| Uuid::parse_str(value).ok())
        {
            if let Some(user) = load_viewer(repo, user_id).await? {
                return Ok(Some(user));
            }
        }
    }

    let Some(auth_header) = parts.headers.get(header::AUTHORIZATION) else {
        return Ok(None);
    };

    let token = auth_header
        .to_str()
        .ok()
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(ApiError::Unauthenticated)?;

    let claims = decode_token(token, &config.jwt_secret)?;

    // The token may outlive the account.
    load_viewer(repo, claims.sub)
        .await?
        .map(Some)
        .ok_or(ApiError::Unauthenticated)
}

async fn load_viewer(repo: &RepositoryState, id: Uuid) -> Result<Option<AuthUser>, ApiError> {
    let Some(account) = repo.get_account(id).await? else {
        return Ok(None);
    };
    let profile = repo.ensure_profile(account.id).await?;

    Ok(Some(AuthUser {
        id: account.id,
        username: account.username,
        email: account.email,
        role: profile.role,
    }))
}

pub fn decode_token(token: &str, secret: &str) -> Result<Claims, ApiError> {
    let mut validation = Validation::default();
    validation.validate_exp = true;

    decode::<Claims>(token, &DecodingKey::from_secret(secret.as_bytes()), &validation)
        .map(|data| data.claims)
        .map_err(|e| {
            tracing::debug!(error = %e, "rejected bearer token");
            ApiError::Unauthenticated
        })
}

/// Issues a signed token for `account_id` valid for `config.jwt_ttl_secs`.
pub fn issue_token(config: &AppConfig, account_id: Uuid) -> Result<String, ApiError> {
    let now = Utc::now().timestamp().max(0) as usize;
    let claims = Claims {
        sub: account_id,
        iat: now,
        exp: now + config.jwt_ttl_secs as usize,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| {
        tracing::error!(error = %e, "failed to sign token");
        ApiError::Internal(e.to_string())
    })
}

/// Hashes a password into an argon2id PHC string.
pub fn hash_password(password: &str) -> Result<String, ApiError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ApiError::Internal(e.to_string()))
}

pub fn verify_password(password: &str, phc: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(phc) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}
