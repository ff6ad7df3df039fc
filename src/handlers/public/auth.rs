// handlers/public/auth.rs - POST /api/v1/auth/{login,refresh,logout}

use axum::extract::State;
use axum_extra::extract::CookieJar;
use serde_json::{json, Value};

use crate::auth::{
    removal_cookie, session_cookie, verify_password, TokenKind, ACCESS_COOKIE, REFRESH_COOKIE,
};
use crate::database::models::user::{LoginRequest, User, UserProfile};
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, JsonBody};
use crate::services::UserService;
use crate::state::AppState;
use crate::types::UserStatus;

const BAD_CREDENTIALS: &str = "Invalid email or password";

fn ensure_active(user: &User) -> Result<(), ApiError> {
    if user.status == UserStatus::Active {
        Ok(())
    } else {
        tracing::warn!(user_id = %user.id, "Inactive account attempted to sign in");
        Err(ApiError::forbidden("Account is inactive"))
    }
}

/// Sets the access cookie, and the refresh cookie when `with_refresh`
fn issue_cookies(state: &AppState, jar: CookieJar, user: &User, with_refresh: bool) -> Result<CookieJar, ApiError> {
    let secure = state.config.security.secure_cookies;
    let access = state.tokens.issue(user.id, user.role, &user.name, TokenKind::Access)?;
    let mut jar = jar.add(session_cookie(ACCESS_COOKIE, access, secure));
    if with_refresh {
        let refresh = state.tokens.issue(user.id, user.role, &user.name, TokenKind::Refresh)?;
        jar = jar.add(session_cookie(REFRESH_COOKIE, refresh, secure));
    }
    Ok(jar)
}

/// POST /auth/login - verify credentials and set both session cookies
///
/// Unknown email and wrong password answer with the same 401 message.
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    JsonBody(input): JsonBody<LoginRequest>,
) -> Result<(CookieJar, ApiResponse<UserProfile>), ApiError> {
    let users = UserService::new(state.pool.clone());
    let user = users
        .find_by_email(&input.email)
        .await?
        .ok_or_else(|| ApiError::unauthorized(BAD_CREDENTIALS))?;

    if !verify_password(input.password, user.password_hash.clone()).await? {
        tracing::info!(user_id = %user.id, "Rejected login with wrong password");
        return Err(ApiError::unauthorized(BAD_CREDENTIALS));
    }
    ensure_active(&user)?;

    let jar = issue_cookies(&state, jar, &user, true)?;
    tracing::info!(user_id = %user.id, role = %user.role, "User logged in");
    Ok((jar, ApiResponse::success(UserProfile::from(user))))
}

/// POST /auth/refresh - trade the refresh cookie for a new access cookie
pub async fn refresh(
    State(state): State<AppState>,
    jar: CookieJar,
) -> Result<(CookieJar, ApiResponse<UserProfile>), ApiError> {
    let token = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::unauthorized("Refresh token missing"))?;

    let claims = state
        .tokens
        .decode(&token, TokenKind::Refresh)
        .map_err(|_| ApiError::unauthorized("Refresh token invalid"))?;

    // Role, name or status may have changed since the refresh token was issued
    let user = match UserService::new(state.pool.clone()).get(claims.sub).await {
        Ok(user) => user,
        Err(DatabaseError::NotFound(_)) => return Err(ApiError::unauthorized("Account no longer exists")),
        Err(e) => return Err(e.into()),
    };
    ensure_active(&user)?;

    let jar = issue_cookies(&state, jar, &user, false)?;
    Ok((jar, ApiResponse::success(UserProfile::from(user))))
}

/// POST /auth/logout - clear both cookies
pub async fn logout(jar: CookieJar) -> (CookieJar, ApiResponse<Value>) {
    let jar = jar
        .remove(removal_cookie(ACCESS_COOKIE))
        .remove(removal_cookie(REFRESH_COOKIE));
    (jar, ApiResponse::success(json!({ "message": "Logged out" })))
}
