use axum::{
    Json,
    http::{StatusCode, Uri},
};
use chrono::DateTime;

use crate::{
    auth::AuthUser,
    models::{PageView, SessionView},
};

fn page_key(uri: &Uri) -> String {
    uri.path().trim_start_matches('/').to_string()
}

// --- Handlers ---

/// health
///
/// [Public Route] Liveness probe for load balancers.
#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Service is up", body = String))
)]
pub async fn health() -> &'static str {
    "ok"
}

/// public_page
///
/// [Public Route] Landing, sign-in and sign-up. Signed-in visitors never get here:
/// the edge middleware sends them to the dashboard first.
pub async fn public_page(uri: Uri) -> Json<PageView> {
    Json(PageView {
        page: page_key(&uri),
        viewer: None,
    })
}

/// protected_page
///
/// [Protected Route] Shared portal pages (dashboard, projects, tasks, ...). The
/// edge middleware already required a session token; the viewer is attached
/// when that token also validates.
pub async fn protected_page(
    auth: Result<AuthUser, StatusCode>,
    uri: Uri,
) -> Json<PageView> {
    Json(PageView {
        page: page_key(&uri),
        viewer: auth.ok().map(|user| user.identity()),
    })
}

/// role_dashboard
///
/// [Role-gated Route] A role-specific dashboard. Only reachable through the role
/// gate, so the `AuthUser` here always holds an admitted role.
pub async fn role_dashboard(user: AuthUser, uri: Uri) -> Json<PageView> {
    Json(PageView {
        page: page_key(&uri),
        viewer: Some(user.identity()),
    })
}

/// get_session
///
/// [Authenticated Route] The caller's identity as the client-side identity
/// provider should hydrate it.
#[utoipa::path(
    get,
    path = "/api/session",
    responses(
        (status = 200, description = "Current session", body = SessionView),
        (status = 401, description = "No valid session")
    )
)]
pub async fn get_session(user: AuthUser) -> Json<SessionView> {
    let expires_at = user
        .expires_at
        .and_then(|exp| i64::try_from(exp).ok())
        .and_then(|exp| DateTime::from_timestamp(exp, 0));

    Json(SessionView {
        dashboard: user.role.dashboard_path().map(str::to_string),
        user: user.identity(),
        expires_at,
    })
}

pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
