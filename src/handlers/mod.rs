// handlers/mod.rs - Two handler tiers
//
// Public (no auth): login, refresh, logout, application submit, health
// Protected (JWT cookie): everything else under /api/v1, with role checks
// done per handler through the `Authorized<P>` extractors

pub mod protected;
pub mod public;

use uuid::Uuid;

use crate::cache::resource;
use crate::services::NotificationService;
use crate::state::AppState;

/// Stores a notification for `user_id`; a failure is logged and swallowed so
/// the triggering write still succeeds
pub(crate) async fn notify(state: &AppState, user_id: Uuid, title: &str, body: String) {
    match NotificationService::new(state.pool.clone()).create(user_id, title, &body).await {
        Ok(notification) => {
            tracing::debug!(notification_id = %notification.id, user_id = %user_id, "Queued notification");
            state
                .cache
                .invalidate(&[resource::NOTIFICATIONS, resource::DASHBOARD])
                .await;
        }
        Err(e) => tracing::warn!(user_id = %user_id, error = %e, "Failed to store notification"),
    }
}
