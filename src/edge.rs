use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use thiserror::Error;

/// Cookie the sign-in flow stores the session token under.
pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";

pub const SIGN_IN_PATH: &str = "/sign-in";
pub const DASHBOARD_PATH: &str = "/dashboard";
pub const LANDING_PATH: &str = "/landing";

const PROTECTED_ROUTES: [&str; 7] = [
    "/dashboard",
    "/projects",
    "/tasks",
    "/worklogs",
    "/performance",
    "/settings",
    "/meeting",
];

const AUTH_ROUTES: [&str; 3] = ["/sign-in", "/sign-up", "/landing"];

/// SessionToken
///
/// Opaque bearer credential. The edge tier only checks that one is present;
/// signature and expiry are validated further in, by the `AuthUser` extractor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken(String);

impl SessionToken {
    /// Wraps a raw token, treating blank values as absent.
    pub fn new(raw: impl Into<String>) -> Option<Self> {
        let raw = raw.into();
        let trimmed = raw.trim();
        (!trimmed.is_empty()).then(|| Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// extract_token
///
/// Reads the session token from the `accessToken` cookie, falling back to an
/// `Authorization: Bearer` header.
pub fn extract_token(headers: &HeaderMap) -> Option<SessionToken> {
    cookie_token(headers).or_else(|| bearer_token(headers))
}

fn cookie_token(headers: &HeaderMap) -> Option<SessionToken> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            if name == ACCESS_TOKEN_COOKIE {
                SessionToken::new(value)
            } else {
                None
            }
        })
}

fn bearer_token(headers: &HeaderMap) -> Option<SessionToken> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| {
            let (scheme, token) = value.trim().split_once(' ')?;
            scheme.eq_ignore_ascii_case("Bearer").then_some(token)
        })
        .and_then(SessionToken::new)
}

// --- Route classification ---

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteClass {
    /// Requires a session token.
    Protected,
    /// Sign-in style pages; a signed-in visitor is sent to the dashboard instead.
    Auth,
    Unclassified,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RouteTableError {
    #[error("route prefix {0:?} must start with '/'")]
    NotAbsolute(String),
    #[error("route prefix {protected:?} overlaps auth prefix {auth:?}")]
    Overlap { protected: String, auth: String },
}

/// RouteTable
///
/// Static prefix lists used by the edge middleware. The protected and auth
/// lists are disjoint, so at most one of them matches any path.
#[derive(Debug, Clone)]
pub struct RouteTable {
    protected: Vec<String>,
    auth: Vec<String>,
}

impl Default for RouteTable {
    fn default() -> Self {
        Self {
            protected: PROTECTED_ROUTES.iter().map(|r| r.to_string()).collect(),
            auth: AUTH_ROUTES.iter().map(|r| r.to_string()).collect(),
        }
    }
}

impl RouteTable {
    pub fn new<P, A>(protected: P, auth: A) -> Result<Self, RouteTableError>
    where
        P: IntoIterator,
        P::Item: Into<String>,
        A: IntoIterator,
        A::Item: Into<String>,
    {
        let protected: Vec<String> = protected.into_iter().map(Into::into).collect();
        let auth: Vec<String> = auth.into_iter().map(Into::into).collect();

        if let Some(bad) = protected.iter().chain(&auth).find(|r| !r.starts_with('/')) {
            return Err(RouteTableError::NotAbsolute(bad.clone()));
        }

        for p in &protected {
            for a in &auth {
                if prefix_matches(p, a) || prefix_matches(a, p) {
                    return Err(RouteTableError::Overlap {
                        protected: p.clone(),
                        auth: a.clone(),
                    });
                }
            }
        }

        Ok(Self { protected, auth })
    }

    pub fn classify(&self, path: &str) -> RouteClass {
        if self.protected.iter().any(|p| prefix_matches(p, path)) {
            RouteClass::Protected
        } else if self.auth.iter().any(|a| prefix_matches(a, path)) {
            RouteClass::Auth
        } else {
            RouteClass::Unclassified
        }
    }
}

/// Segment-aware prefix match: `/tasks` covers `/tasks` and `/tasks/42`, not `/tasksboard`.
fn prefix_matches(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return path == "/";
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

// --- Decision ---

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeDecision {
    Pass,
    Redirect(String),
}

/// evaluate
///
/// The edge routing decision for one request path, given whether it carried a
/// session token.
pub fn evaluate(table: &RouteTable, path: &str, token: Option<&SessionToken>) -> EdgeDecision {
    let authenticated = token.is_some();

    match table.classify(path) {
        RouteClass::Protected if !authenticated => EdgeDecision::Redirect(format!(
            "{SIGN_IN_PATH}?redirect={}",
            encode_redirect_target(path)
        )),
        RouteClass::Auth if authenticated => EdgeDecision::Redirect(DASHBOARD_PATH.to_string()),
        _ if path == "/" => {
            let target = if authenticated { DASHBOARD_PATH } else { LANDING_PATH };
            EdgeDecision::Redirect(target.to_string())
        }
        _ => EdgeDecision::Pass,
    }
}

// Characters that would change the meaning of the query string, plus `%` so an
// already-encoded path survives the round trip. `/` stays literal.
const REDIRECT_TARGET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'&')
    .add(b'+')
    .add(b'=')
    .add(b'?');

fn encode_redirect_target(path: &str) -> String {
    utf8_percent_encode(path, REDIRECT_TARGET).to_string()
}

/// edge_middleware
///
/// Runs before any page handler. Redirects with `307 Temporary Redirect` so the
/// original method survives, otherwise hands the request on untouched.
pub async fn edge_middleware(
    State(table): State<RouteTable>,
    request: Request,
    next: Next,
) -> Response {
    let token = extract_token(request.headers());
    let path = request.uri().path().to_owned();

    match evaluate(&table, &path, token.as_ref()) {
        EdgeDecision::Pass => next.run(request).await,
        EdgeDecision::Redirect(target) => {
            tracing::debug!(path = %path, target = %target, "edge redirect");
            Redirect::temporary(&target).into_response()
        }
    }
}
