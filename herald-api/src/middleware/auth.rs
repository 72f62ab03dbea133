//! JWT authentication middleware.

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::sync::Arc;

use herald_core::principal::Principal;

use crate::auth::{Claims, extract_bearer_token};
use crate::error::ApiError;
use crate::state::AppState;

/// Authenticated caller extracted from a JWT.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser {
    /// Caller identity and roles
    pub principal: Principal,
}

impl AuthenticatedUser {
    /// Creates an authenticated user from claims.
    #[must_use]
    pub fn from_claims(claims: &Claims) -> Self {
        Self {
            principal: claims.principal(),
        }
    }

    /// The caller's user id.
    #[must_use]
    pub fn user_id(&self) -> &str {
        &self.principal.id
    }
}

/// Authentication middleware function.
///
/// Rejects requests without a valid bearer token and stores the
/// [`AuthenticatedUser`] in request extensions.
pub async fn auth_middleware(
    State(state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let auth_header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|h| h.to_str().ok());

    let Some(auth_header) = auth_header else {
        return ApiError::Unauthorized("Missing Authorization header".to_string()).into_response();
    };

    let Some(token) = extract_bearer_token(auth_header) else {
        return ApiError::Unauthorized("Invalid Authorization header format".to_string())
            .into_response();
    };

    match state.jwt_manager.validate_token(token) {
        Ok(claims) => {
            request
                .extensions_mut()
                .insert(AuthenticatedUser::from_claims(&claims));
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}

/// Administrator guard. Must run after [`auth_middleware`].
pub async fn require_admin(request: Request<Body>, next: Next) -> Response {
    match request.extensions().get::<AuthenticatedUser>() {
        Some(user) if user.principal.is_admin() => next.run(request).await,
        Some(_) => ApiError::Forbidden("Administrator role required".to_string()).into_response(),
        None => ApiError::Unauthorized("Not authenticated".to_string()).into_response(),
    }
}

/// Extractor for authenticated user.
#[derive(Debug, Clone)]
pub struct Auth(pub AuthenticatedUser);

impl<S> axum::extract::FromRequestParts<S> for Auth
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut axum::http::request::Parts,
        _state: &S,
    ) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .map(Auth)
            .ok_or_else(|| ApiError::Unauthorized("Not authenticated".to_string()))
    }
}
