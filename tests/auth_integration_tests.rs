mod common;

use axum::{
    extract::FromRequestParts,
    http::{Request, request::Parts},
};
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header, encode};
use press_portal::{
    AppState,
    auth::{self, AuthUser, Claims, MaybeAuthUser},
    config::Env,
    error::ApiError,
    models::Role,
    repository::{Repository, RepositoryState},
};
use uuid::Uuid;

fn create_token(sub: Uuid, exp_offset_secs: i64, secret: &str) -> String {
    let now = Utc::now().timestamp();
    let claims = Claims {
        sub,
        iat: now as usize,
        exp: (now + exp_offset_secs) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .unwrap()
}

fn get_request_parts(headers: &[(&str, String)]) -> Parts {
    let mut builder = Request::builder().uri("/me");
    for (name, value) in headers {
        builder = builder.header(*name, value.as_str());
    }
    builder.body(()).unwrap().into_parts().0
}

fn bearer(token: &str) -> (&'static str, String) {
    ("authorization", format!("Bearer {token}"))
}

async fn setup() -> (std::sync::Arc<press_portal::SqliteRepository>, AppState) {
    let repo = common::repo().await;
    let state = common::state(repo.clone() as RepositoryState);
    (repo, state)
}

#[tokio::test]
async fn test_valid_token_resolves_viewer_with_role() {
    let (repo, state) = setup().await;
    let marie = common::user(&repo, "marie_durand", Role::Journalist).await;
    let token = create_token(marie.id, 3600, common::TEST_JWT_SECRET);

    let mut parts = get_request_parts(&[bearer(&token)]);
    let user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();

    assert_eq!(user, marie);
}

#[tokio::test]
async fn test_missing_header_is_anonymous() {
    let (_repo, state) = setup().await;

    let mut parts = get_request_parts(&[]);
    let err = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::Unauthenticated);

    let mut parts = get_request_parts(&[]);
    let MaybeAuthUser(viewer) = MaybeAuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap();
    assert!(viewer.is_none());
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let (repo, state) = setup().await;
    let u = common::user(&repo, "reader", Role::Reader).await;
    let token = create_token(u.id, -3600, common::TEST_JWT_SECRET);

    let mut parts = get_request_parts(&[bearer(&token)]);
    let err = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::Unauthenticated);
}

#[tokio::test]
async fn test_invalid_credentials_are_rejected_even_on_public_routes() {
    let (repo, state) = setup().await;
    let u = common::user(&repo, "reader", Role::Reader).await;

    let bad = [
        bearer(&create_token(u.id, 3600, "another-secret")),
        bearer("not.a.jwt"),
        ("authorization", "Basic abc".to_string()),
    ];
    for h in bad {
        let mut parts = get_request_parts(&[h.clone()]);
        let err = MaybeAuthUser::from_request_parts(&mut parts, &state)
            .await
            .unwrap_err();
        assert_eq!(err, ApiError::Unauthenticated, "{}", h.1);
    }
}

#[tokio::test]
async fn test_token_for_unknown_account_is_rejected() {
    let (_repo, state) = setup().await;
    let token = create_token(Uuid::new_v4(), 3600, common::TEST_JWT_SECRET);

    let mut parts = get_request_parts(&[bearer(&token)]);
    let err = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::Unauthenticated);
}

#[tokio::test]
async fn test_missing_profile_is_provisioned_on_login() {
    let (repo, state) = setup().await;
    let account = repo
        .create_account("no_profile", "np@example.com", "h")
        .await
        .unwrap();
    sqlx::query("DELETE FROM profiles WHERE account_id = ?")
        .bind(account.id)
        .execute(repo.pool())
        .await
        .unwrap();

    let token = create_token(account.id, 3600, common::TEST_JWT_SECRET);
    let mut parts = get_request_parts(&[bearer(&token)]);
    let user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();

    assert_eq!(user.role, Role::Reader);
}

#[tokio::test]
async fn test_local_user_id_bypass() {
    let (repo, state) = setup().await;
    let admin = common::user(&repo, "root_admin", Role::Admin).await;

    let mut parts = get_request_parts(&[("x-user-id", admin.id.to_string())]);
    let user = AuthUser::from_request_parts(&mut parts, &state).await.unwrap();
    assert_eq!(user.role, Role::Admin);

    // An unknown id falls through to the (absent) token.
    let mut parts = get_request_parts(&[("x-user-id", Uuid::new_v4().to_string())]);
    let MaybeAuthUser(viewer) = MaybeAuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap();
    assert!(viewer.is_none());
}

#[tokio::test]
async fn test_user_id_bypass_is_ignored_in_production() {
    let (repo, mut state) = setup().await;
    state.config.env = Env::Production;
    let admin = common::user(&repo, "root_admin", Role::Admin).await;

    let mut parts = get_request_parts(&[("x-user-id", admin.id.to_string())]);
    let err = AuthUser::from_request_parts(&mut parts, &state)
        .await
        .unwrap_err();
    assert_eq!(err, ApiError::Unauthenticated);
}

#[tokio::test]
async fn test_issued_tokens_decode_with_the_same_secret() {
    let (_repo, state) = setup().await;
    let id = Uuid::new_v4();

    let token = auth::issue_token(&state.config, id).unwrap();
    let claims = auth::decode_token(&token, &state.config.jwt_secret).unwrap();
    assert_eq!(claims.sub, id);
    assert_eq!(claims.exp - claims.iat, state.config.jwt_ttl_secs as usize);

    assert_eq!(
        auth::decode_token(&token, "wrong").unwrap_err(),
        ApiError::Unauthenticated
    );
}

#[test]
fn test_password_hash_round_trip() {
    let hash = auth::hash_password("correct horse").unwrap();
    assert_ne!(hash, "correct horse");
    assert!(auth::verify_password("correct horse", &hash));
    assert!(!auth::verify_password("wrong horse", &hash));
    assert!(!auth::verify_password("correct horse", "not-a-phc-string"));
}
