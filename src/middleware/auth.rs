use axum::{
    async_trait,
    extract::{FromRequestParts, Request, State},
    http::{request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::CookieJar;
use uuid::Uuid;

use crate::auth::{Claims, TokenKind, ACCESS_COOKIE};
use crate::error::ApiError;
use crate::state::AppState;
use crate::types::Role;

/// Authenticated user context extracted from the access token
#[derive(Clone, Debug)]
pub struct AuthUser {
    pub id: Uuid,
    pub role: Role,
    pub name: String,
}

impl From<Claims> for AuthUser {
    fn from(claims: Claims) -> Self {
        Self {
            id: claims.sub,
            role: claims.role,
            name: claims.name,
        }
    }
}

impl AuthUser {
    pub fn is_staff(&self) -> bool {
        self.role.is_staff()
    }

    /// Staff may act on anyone; everybody else only on themselves
    pub fn ensure_self_or_staff(&self, owner_id: Uuid) -> Result<(), ApiError> {
        if self.is_staff() || self.id == owner_id {
            Ok(())
        } else {
            Err(ApiError::forbidden("You can only access your own records"))
        }
    }
}

/// JWT authentication middleware that validates tokens and extracts user context
pub async fn jwt_auth_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = extract_token(&jar, request.headers()).map_err(ApiError::unauthorized)?;

    let claims = state.tokens.decode(&token, TokenKind::Access).map_err(|e| {
        tracing::debug!("Rejected access token: {}", e);
        ApiError::unauthorized("Authentication invalid")
    })?;

    // Convert claims to AuthUser and inject into request
    request.extensions_mut().insert(AuthUser::from(claims));

    Ok(next.run(request).await)
}

/// Access token from the `token` cookie, falling back to a Bearer header
pub fn extract_token(jar: &CookieJar, headers: &HeaderMap) -> Result<String, String> {
    if let Some(cookie) = jar.get(ACCESS_COOKIE) {
        if !cookie.value().is_empty() {
            return Ok(cookie.value().to_string());
        }
    }

    let auth_header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or_else(|| "Authentication required".to_string())?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| "Invalid Authorization header format".to_string())?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => Ok(token.trim().to_string()),
        Some(_) => Err("Empty JWT token".to_string()),
        None => Err("Authorization header must use Bearer token format".to_string()),
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Authentication required"))
    }
}
