use crate::{
    AppState,
    auth::AuthUser,
    guard::{GuardDecision, authorize},
    handlers,
    models::{AllowList, Role},
};
use axum::{
    Router,
    extract::{FromRequestParts, Request, State},
    middleware::{self, Next},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};

/// RoleGate
///
/// State for one role subtree's gate: the application state (to resolve the
/// caller) and the roles the subtree admits.
#[derive(Clone)]
pub struct RoleGate {
    pub app: AppState,
    pub allowed: AllowList,
}

/// role_gate
///
/// Server-side counterpart of the client `RoleGuard`: the same `authorize`
/// decision, fed by the fully validating `AuthUser` extractor. Any extraction
/// failure counts as signed out.
pub async fn role_gate(State(gate): State<RoleGate>, request: Request, next: Next) -> Response {
    let (mut parts, body) = request.into_parts();
    let identity = AuthUser::from_request_parts(&mut parts, &gate.app)
        .await
        .ok()
        .map(|user| user.identity());

    match authorize(identity.as_ref(), &gate.allowed) {
        GuardDecision::Authorize => next.run(Request::from_parts(parts, body)).await,
        GuardDecision::Redirect(to) => {
            tracing::debug!(path = %parts.uri.path(), to, "role gate redirect");
            Redirect::temporary(to).into_response()
        }
    }
}

/// Dashboards Router Module
///
/// One subtree per role that owns a dashboard (`/dashboard/admin`,
/// `/dashboard/business`, `/dashboard/member`, `/dashboard/pm`), each admitting
/// only its own role. Nested pages such as `/dashboard/admin/users` sit behind
/// the same gate.
pub fn dashboard_routes(state: AppState) -> Router<AppState> {
    Role::ALL
        .into_iter()
        .filter_map(|role| role.dashboard_path().map(|path| (role, path)))
        .fold(Router::new(), |router, (role, path)| {
            let gate = RoleGate {
                app: state.clone(),
                allowed: AllowList::only(role),
            };
            // The gate covers the whole subtree, not just its index page.
            router.merge(
                Router::<AppState>::new()
                    .route(path, get(handlers::role_dashboard))
                    .route(&format!("{path}/"), get(handlers::role_dashboard))
                    .route(&format!("{path}/{{*rest}}"), get(handlers::role_dashboard))
                    .route_layer(middleware::from_fn_with_state(gate, role_gate)),
            )
        })
}
