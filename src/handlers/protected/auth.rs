// handlers/protected/auth.rs - GET /auth/me, PATCH /auth/password, POST /auth/register

use axum::extract::State;
use serde_json::{json, Value};

use crate::auth::{hash_password, verify_password};
use crate::cache::resource;
use crate::database::models::user::{ChangePassword, RegisterUser, UserProfile};
use crate::error::ApiError;
use crate::middleware::{AnyUser, ApiResponse, ApiResult, JsonBody, StaffUser};
use crate::services::{NewUser, UserService};
use crate::state::AppState;
use crate::types::Role;

/// GET /auth/me - read from the database so profile edits show up before the
/// access token is refreshed
pub async fn me(State(state): State<AppState>, auth: AnyUser) -> ApiResult<UserProfile> {
    let user = UserService::new(state.pool.clone()).get(auth.id).await?;
    Ok(ApiResponse::success(UserProfile::from(user)))
}

/// PATCH /auth/password
pub async fn change_password(
    State(state): State<AppState>,
    auth: AnyUser,
    JsonBody(input): JsonBody<ChangePassword>,
) -> ApiResult<Value> {
    input.validate()?;
    let users = UserService::new(state.pool.clone());
    let user = users.get(auth.id).await?;

    if !verify_password(input.current_password, user.password_hash).await? {
        return Err(ApiError::unauthorized("Current password is incorrect"));
    }

    let hash = hash_password(input.new_password, state.config.security.bcrypt_cost).await?;
    users.set_password(auth.id, hash).await?;

    tracing::info!(user_id = %auth.id, "Password changed");
    Ok(ApiResponse::success(json!({ "message": "Password updated" })))
}

/// POST /auth/register - super admins create any role, admins only teachers
pub async fn register(
    State(state): State<AppState>,
    auth: StaffUser,
    JsonBody(input): JsonBody<RegisterUser>,
) -> ApiResult<UserProfile> {
    input.validate()?;
    if auth.role != Role::SuperAdmin && input.role != Role::Teacher {
        return Err(ApiError::forbidden("Admins can only register teachers"));
    }

    let email = input.normalized_email();
    let password_hash = hash_password(input.password, state.config.security.bcrypt_cost).await?;
    let user = UserService::new(state.pool.clone())
        .create(NewUser {
            name: &input.name,
            email: &email,
            password_hash,
            role: input.role,
            phone: input.phone,
            hourly_rate: input.hourly_rate,
        })
        .await?;

    tracing::info!(user_id = %user.id, role = %user.role, by = %auth.id, "Registered user");
    let listing = if user.role == Role::Teacher { resource::TEACHERS } else { resource::ADMINS };
    state.cache.invalidate(&[listing, resource::DASHBOARD]).await;
    Ok(ApiResponse::created(UserProfile::from(user)))
}
