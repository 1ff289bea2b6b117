use axum::{Router, extract::FromRef, http::HeaderName, middleware};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod config;
pub mod confirm;
pub mod edge;
pub mod guard;
pub mod handlers;
pub mod identity;
pub mod models;
pub mod pagination;
pub mod repository;

// Page routing, segregated by required access (public, authenticated, role-gated).
pub mod routes;
use routes::{authenticated, dashboards, public};

// --- Public Re-exports ---

pub use config::AppConfig;
pub use edge::RouteTable;
pub use guard::{GuardOptions, GuardState, RoleGuard, authorize};
pub use identity::{IdentityProvider, SessionStore};
pub use models::{AllowList, Role, UserIdentity};
pub use repository::{InMemoryUserRepository, PostgresUserRepository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document for the JSON endpoints, served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(handlers::health, handlers::get_session),
    components(schemas(models::Role, models::UserIdentity, models::PageView, models::SessionView)),
    tags(
        (name = "pm-portal", description = "Project management portal page shell")
    )
)]
struct ApiDoc;

/// AppState
///
/// The single, cloneable container of everything the request pipeline needs.
#[derive(Clone)]
pub struct AppState {
    /// Identity lookups for the `AuthUser` extractor.
    pub repo: RepositoryState,
    pub config: AppConfig,
    /// Prefix lists the edge middleware classifies paths against.
    pub routes: RouteTable,
}

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

impl FromRef<AppState> for RouteTable {
    fn from_ref(app_state: &AppState) -> RouteTable {
        app_state.routes.clone()
    }
}

/// create_router
///
/// Assembles the page routes and wraps them, innermost first, in the role gates,
/// the edge middleware, and the observability stack.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(authenticated::authenticated_routes())
        .merge(dashboards::dashboard_routes(state.clone()))
        .fallback(handlers::not_found)
        // Edge middleware: token presence + path classification, before any page handler.
        .layer(middleware::from_fn_with_state(
            state.routes.clone(),
            edge::edge_middleware,
        ))
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span factory for `TraceLayer`, tagging every request with its `x-request-id`.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
