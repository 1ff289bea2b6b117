use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, Method, Request, StatusCode, Uri, header, request::Parts},
};
use pm_portal::{
    AppState, InMemoryUserRepository, Role, RouteTable, UserIdentity,
    auth::{AuthUser, Claims},
    config::{AppConfig, Env},
};
use jsonwebtoken::{EncodingKey, Header, encode};
use std::{sync::Arc, time::SystemTime};
use uuid::Uuid;

// --- Helper Functions ---

const TEST_JWT_SECRET: &str = "test-secret-value-1234567890";
const TEST_USER_ID: Uuid = Uuid::from_u128(1);

fn now() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

fn create_token(user_id: Uuid, issued_at: u64, expires_at: u64) -> String {
    let claims = Claims {
        sub: user_id,
        iat: issued_at as usize,
        exp: expires_at as usize,
    };
    let key = EncodingKey::from_secret(TEST_JWT_SECRET.as_bytes());
    encode(&Header::default(), &claims, &key).unwrap()
}

fn valid_token(user_id: Uuid) -> String {
    create_token(user_id, now(), now() + 3600)
}

fn member() -> UserIdentity {
    UserIdentity {
        user_id: TEST_USER_ID,
        email: "member@example.com".to_string(),
        role: Role::Member,
    }
}

fn create_app_state(env: Env, users: Vec<UserIdentity>) -> AppState {
    let config = AppConfig {
        env,
        jwt_secret: TEST_JWT_SECRET.to_string(),
        ..AppConfig::default()
    };

    AppState {
        repo: Arc::new(InMemoryUserRepository::with_users(users)),
        config,
        routes: RouteTable::default(),
    }
}

fn get_request_parts(method: Method, uri: Uri) -> Parts {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .body(axum::body::Body::empty())
        .unwrap();
    let (parts, _) = request.into_parts();
    parts
}

async fn extract(parts: &mut Parts, state: &AppState) -> Result<AuthUser, StatusCode> {
    AuthUser::from_request_parts(parts, state).await
}

// --- Tests ---

#[tokio::test]
async fn test_auth_success_with_bearer_token() {
    let state = create_app_state(Env::Production, vec![member()]);
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", valid_token(TEST_USER_ID))).unwrap(),
    );

    let user = extract(&mut parts, &state).await.unwrap();

    assert_eq!(user.id, TEST_USER_ID);
    assert_eq!(user.role, Role::Member);
    assert_eq!(user.email, "member@example.com");
    assert!(user.expires_at.is_some());
}

#[tokio::test]
async fn test_auth_success_with_access_token_cookie() {
    let state = create_app_state(Env::Production, vec![member()]);
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::COOKIE,
        HeaderValue::from_str(&format!("accessToken={}", valid_token(TEST_USER_ID))).unwrap(),
    );

    let user = extract(&mut parts, &state).await.unwrap();
    assert_eq!(user.identity(), member());
}

#[tokio::test]
async fn test_auth_failure_with_missing_token() {
    let state = create_app_state(Env::Production, vec![member()]);
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());

    assert_eq!(
        extract(&mut parts, &state).await.unwrap_err(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_auth_failure_with_expired_token() {
    let state = create_app_state(Env::Production, vec![member()]);
    // Well past the default validation leeway.
    let token = create_token(TEST_USER_ID, now() - 7200, now() - 3600);
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {token}")).unwrap(),
    );

    assert_eq!(
        extract(&mut parts, &state).await.unwrap_err(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_auth_failure_with_forged_token() {
    let state = create_app_state(Env::Production, vec![member()]);
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::COOKIE,
        HeaderValue::from_static("accessToken=not-a-jwt"),
    );

    assert_eq!(
        extract(&mut parts, &state).await.unwrap_err(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_auth_failure_when_user_no_longer_exists() {
    let state = create_app_state(Env::Production, vec![]);
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", valid_token(TEST_USER_ID))).unwrap(),
    );

    assert_eq!(
        extract(&mut parts, &state).await.unwrap_err(),
        StatusCode::UNAUTHORIZED
    );
}

#[tokio::test]
async fn test_local_bypass_success() {
    let admin = UserIdentity {
        user_id: Uuid::new_v4(),
        email: "local@dev.com".to_string(),
        role: Role::Admin,
    };
    let state = create_app_state(Env::Local, vec![admin.clone()]);
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::HeaderName::from_static("x-user-id"),
        HeaderValue::from_str(&admin.user_id.to_string()).unwrap(),
    );

    let user = extract(&mut parts, &state).await.unwrap();
    assert_eq!(user.id, admin.user_id);
    assert_eq!(user.role, Role::Admin);
    assert!(user.expires_at.is_none());
}

#[tokio::test]
async fn test_local_bypass_disabled_in_prod() {
    let state = create_app_state(Env::Production, vec![member()]);
    let mut parts = get_request_parts(Method::GET, "/".parse().unwrap());
    parts.headers.insert(
        header::HeaderName::from_static("x-user-id"),
        HeaderValue::from_str(&TEST_USER_ID.to_string()).unwrap(),
    );

    assert_eq!(
        extract(&mut parts, &state).await.unwrap_err(),
        StatusCode::UNAUTHORIZED
    );
}
