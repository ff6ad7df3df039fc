// handlers/protected/mod.rs - Authenticated handlers
//
// Security Level: valid access token (cookie or Bearer)
// Route Prefix: /api/v1/*
// Role allow-lists come from the `Authorized<P>` extractor on each handler;
// row ownership (a teacher's own students, classes and payouts) is checked
// after the row is loaded.

pub mod admins;
pub mod applications;
pub mod attendance;
pub mod auth;
pub mod book_assign;
pub mod books;
pub mod classes;
pub mod dashboard;
pub mod media;
pub mod messages;
pub mod notifications;
pub mod payouts;
pub mod schedules;
pub mod students;
pub mod teachers;

use uuid::Uuid;

use crate::database::models::user::User;
use crate::database::DatabaseError;
use crate::error::ApiError;
use crate::middleware::AuthUser;
use crate::services::UserService;
use crate::state::AppState;
use crate::types::Role;

/// Teachers are pinned to their own rows; staff keep the requested filter
pub(crate) fn own_scope(user: &AuthUser, requested: Option<Uuid>) -> Option<Uuid> {
    if user.is_staff() {
        requested
    } else {
        Some(user.id)
    }
}

/// Resolves a `teacher_id` taken from a request body
pub(crate) async fn require_teacher(state: &AppState, teacher_id: Uuid) -> Result<User, ApiError> {
    match UserService::new(state.pool.clone())
        .get_with_role(teacher_id, &[Role::Teacher])
        .await
    {
        Ok(user) => Ok(user),
        Err(DatabaseError::NotFound(_)) => Err(ApiError::bad_request(format!(
            "teacher_id {} does not refer to a teacher",
            teacher_id
        ))),
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn teachers_are_pinned_to_themselves() {
        let teacher = AuthUser { id: Uuid::new_v4(), role: Role::Teacher, name: "T".into() };
        assert_eq!(own_scope(&teacher, None), Some(teacher.id));
        assert_eq!(own_scope(&teacher, Some(Uuid::new_v4())), Some(teacher.id));

        let admin = AuthUser { id: Uuid::new_v4(), role: Role::Admin, name: "A".into() };
        let requested = Some(Uuid::new_v4());
        assert_eq!(own_scope(&admin, requested), requested);
        assert_eq!(own_scope(&admin, None), None);
    }
}
