use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Authenticated Router Module
///
/// The shared portal pages. Every path here is covered by a protected prefix in
/// the edge route table, so a request without a session token never reaches
/// these handlers.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        .route("/dashboard", get(handlers::protected_page))
        // --- Projects & Tasks ---
        .route("/projects", get(handlers::protected_page))
        .route("/projects/{id}", get(handlers::protected_page))
        .route("/tasks", get(handlers::protected_page))
        .route("/tasks/{id}", get(handlers::protected_page))
        .route("/worklogs", get(handlers::protected_page))
        .route("/performance", get(handlers::protected_page))
        .route("/settings", get(handlers::protected_page))
        // --- Meetings ---
        .route("/meeting", get(handlers::protected_page))
        .route("/meeting/{id}", get(handlers::protected_page))
        // GET /api/session
        // Rejects with 401 unless the token validates; `/api` is not an edge-protected prefix.
        .route("/api/session", get(handlers::get_session))
}
