use std::marker::PhantomData;
use std::ops::Deref;

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use super::auth::AuthUser;
use crate::error::ApiError;
use crate::types::Role;

/// Role allow-list attached to a route through [`Authorized`]
pub trait Policy: Send + Sync + 'static {
    const ALLOWED: &'static [Role];
}

pub struct AnyRole;

impl Policy for AnyRole {
    const ALLOWED: &'static [Role] = &[Role::Teacher, Role::Admin, Role::SuperAdmin];
}

/// Back-office roles
pub struct Staff;

impl Policy for Staff {
    const ALLOWED: &'static [Role] = &[Role::Admin, Role::SuperAdmin];
}

pub struct SuperAdminOnly;

impl Policy for SuperAdminOnly {
    const ALLOWED: &'static [Role] = &[Role::SuperAdmin];
}

/// Checks `user.role` against an allow-list
pub fn authorize(user: &AuthUser, allowed: &[Role]) -> Result<(), ApiError> {
    if allowed.contains(&user.role) {
        Ok(())
    } else {
        tracing::warn!(user_id = %user.id, role = %user.role, "role not allowed for route");
        Err(ApiError::forbidden("Not authorized to access this route"))
    }
}

/// Authenticated user whose role passed policy `P`
pub struct Authorized<P: Policy> {
    pub user: AuthUser,
    _policy: PhantomData<fn() -> P>,
}

impl<P: Policy> Deref for Authorized<P> {
    type Target = AuthUser;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

#[async_trait]
impl<S, P> FromRequestParts<S> for Authorized<P>
where
    S: Send + Sync,
    P: Policy,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        authorize(&user, P::ALLOWED)?;
        Ok(Self {
            user,
            _policy: PhantomData,
        })
    }
}

pub type AnyUser = Authorized<AnyRole>;
pub type StaffUser = Authorized<Staff>;
pub type SuperAdminUser = Authorized<SuperAdminOnly>;

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn user(role: Role) -> AuthUser {
        AuthUser { id: Uuid::new_v4(), role, name: "someone".to_string() }
    }

    #[test]
    fn allow_lists() {
        assert!(authorize(&user(Role::Teacher), AnyRole::ALLOWED).is_ok());
        assert!(authorize(&user(Role::Teacher), Staff::ALLOWED).is_err());
        assert!(authorize(&user(Role::Admin), Staff::ALLOWED).is_ok());
        assert!(authorize(&user(Role::Admin), SuperAdminOnly::ALLOWED).is_err());
        assert!(authorize(&user(Role::SuperAdmin), SuperAdminOnly::ALLOWED).is_ok());
    }

    #[test]
    fn forbidden_is_403() {
        let err = authorize(&user(Role::Teacher), Staff::ALLOWED).unwrap_err();
        assert_eq!(err.status_code(), 403);
    }

    #[tokio::test]
    async fn extractor_requires_authentication() {
        let (mut parts, _) = axum::http::Request::new(()).into_parts();
        let result = StaffUser::from_request_parts(&mut parts, &()).await;
        assert_eq!(result.err().map(|e| e.status_code()), Some(401));
    }

    #[tokio::test]
    async fn extractor_applies_policy() {
        let (mut parts, _) = axum::http::Request::new(()).into_parts();
        parts.extensions.insert(user(Role::Teacher));
        assert_eq!(
            StaffUser::from_request_parts(&mut parts, &()).await.err().map(|e| e.status_code()),
            Some(403)
        );
        assert!(AnyUser::from_request_parts(&mut parts, &()).await.is_ok());
    }
}
