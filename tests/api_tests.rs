use pm_portal::{
    AppConfig, AppState, InMemoryUserRepository, Role, RouteTable, UserIdentity, create_router,
    models::PageView,
};
use reqwest::{StatusCode, header, redirect::Policy};
use std::sync::Arc;
use tokio::net::TcpListener;
use uuid::Uuid;

#[derive(Debug)]
pub struct TestApp {
    pub address: String,
}

async fn spawn_app(users: Vec<UserIdentity>) -> TestApp {
    let state = AppState {
        repo: Arc::new(InMemoryUserRepository::with_users(users)),
        config: AppConfig::default(),
        routes: RouteTable::default(),
    };
    let router = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    TestApp { address }
}

fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(Policy::none())
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_health_check() {
    let app = spawn_app(vec![]).await;
    let response = client()
        .get(format!("{}/health", app.address))
        .send()
        .await
        .expect("req fail");

    assert!(response.status().is_success());
    assert!(response.headers().contains_key("x-request-id"));
}

#[tokio::test]
async fn test_sign_in_round_trip_preserves_destination() {
    let app = spawn_app(vec![]).await;
    let response = client()
        .get(format!("{}/tasks", app.address))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(
        response.headers()[header::LOCATION].to_str().unwrap(),
        "/sign-in?redirect=/tasks"
    );
}

#[tokio::test]
async fn test_local_bypass_reaches_role_dashboard() {
    let pm = UserIdentity {
        user_id: Uuid::new_v4(),
        email: "pm@example.com".to_string(),
        role: Role::ProjectManager,
    };
    let app = spawn_app(vec![pm.clone()]).await;

    // The edge only needs a token to be present; the role gate resolves the
    // local-development bypass header.
    let response = client()
        .get(format!("{}/dashboard/pm", app.address))
        .header(header::AUTHORIZATION, "Bearer dev")
        .header("x-user-id", pm.user_id.to_string())
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let view: PageView = response.json().await.unwrap();
    assert_eq!(view.viewer, Some(pm));
}

#[tokio::test]
async fn test_openapi_document_is_served() {
    let app = spawn_app(vec![]).await;
    let doc: serde_json::Value = client()
        .get(format!("{}/api-docs/openapi.json", app.address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert!(doc["paths"]["/api/session"].is_object());
}
