use crate::{AppState, handlers};
use axum::{Router, routing::get};

/// Public Router Module
///
/// Pages a signed-out visitor may open. The edge middleware classifies the
/// three auth pages, so a visitor with a session is redirected before reaching
/// these handlers.
pub fn public_routes() -> Router<AppState> {
    Router::new()
        // GET /health
        .route("/health", get(handlers::health))
        .route("/landing", get(handlers::public_page))
        .route("/sign-in", get(handlers::public_page))
        .route("/sign-up", get(handlers::public_page))
}
