use axum::{
    extract::{FromRef, FromRequestParts},
    http::{StatusCode, request::Parts},
};
use jsonwebtoken::{DecodingKey, Validation, decode, errors::ErrorKind};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    edge::extract_token,
    models::{Role, UserIdentity},
    repository::RepositoryState,
};

/// Claims
///
/// Payload of the HS256 session JWT issued by the sign-in flow.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the user's UUID, the key into the `profiles` table.
    pub sub: Uuid,
    /// Expiration Time (exp), seconds since the epoch.
    pub exp: usize,
    /// Issued At (iat), seconds since the epoch.
    pub iat: usize,
}

/// AuthUser
///
/// The resolved identity of an authenticated request. Unlike the edge
/// middleware, which only checks that a token is present, this extractor
/// validates the token and confirms the user still exists.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
    /// Expiry of the token that authenticated this request. `None` for the local bypass.
    pub expires_at: Option<usize>,
}

impl AuthUser {
    pub fn identity(&self) -> UserIdentity {
        UserIdentity {
            user_id: self.id,
            email: self.email.clone(),
            role: self.role,
        }
    }

    fn from_identity(user: UserIdentity, expires_at: Option<usize>) -> Self {
        Self {
            id: user.user_id,
            email: user.email,
            role: user.role,
            expires_at,
        }
    }
}

/// AuthUser Extractor Implementation
///
/// 1. Local bypass: in `Env::Local`, an `x-user-id` header naming a known user is accepted.
/// 2. Token extraction: `accessToken` cookie, then `Authorization: Bearer`.
/// 3. JWT decoding with expiry validation.
/// 4. Repository lookup of the user's current role.
///
/// Rejection: `401 Unauthorized` on any failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = StatusCode;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        if config.env == Env::Local {
            let bypass_id = parts
                .headers
                .get("x-user-id")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| Uuid::parse_str(value).ok());

            if let Some(user_id) = bypass_id {
                if let Some(user) = repo.get_user(user_id).await {
                    return Ok(AuthUser::from_identity(user, None));
                }
            }
        }
        // Production, or a bypass header that did not resolve: fall through to the JWT flow.

        let token = extract_token(&parts.headers).ok_or(StatusCode::UNAUTHORIZED)?;

        let decoding_key = DecodingKey::from_secret(config.jwt_secret.as_bytes());
        let mut validation = Validation::default();
        validation.validate_exp = true;

        let token_data = match decode::<Claims>(token.as_str(), &decoding_key, &validation) {
            Ok(data) => data,
            Err(e) => {
                match e.kind() {
                    ErrorKind::ExpiredSignature => tracing::debug!("rejected expired session token"),
                    other => tracing::debug!(error = ?other, "rejected invalid session token"),
                }
                return Err(StatusCode::UNAUTHORIZED);
            }
        };

        // The token can outlive the account; a deleted user is no longer authenticated.
        let user = repo
            .get_user(token_data.claims.sub)
            .await
            .ok_or(StatusCode::UNAUTHORIZED)?;

        Ok(AuthUser::from_identity(user, Some(token_data.claims.exp)))
    }
}
