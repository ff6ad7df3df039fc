// handlers/protected/dashboard.rs - GET /api/v1/dashboard

use axum::extract::State;
use serde_json::json;

use crate::cache::{list_key, resource};
use crate::middleware::{AnyUser, ApiResponse, ApiResult};
use crate::services::{Dashboard, DashboardService};
use crate::state::AppState;

/// Staff get office-wide totals, teachers their own week
pub async fn show(State(state): State<AppState>, auth: AnyUser) -> ApiResult<Dashboard> {
    let service = DashboardService::new(state.pool.clone());

    let dashboard = if auth.is_staff() {
        let key = list_key(resource::DASHBOARD, &json!({ "view": "staff" }));
        state
            .cache
            .remember(&key, || async move { service.staff().await.map(Dashboard::Staff) })
            .await?
    } else {
        let key = list_key(resource::DASHBOARD, &json!({ "view": "teacher", "id": auth.id }));
        let teacher_id = auth.id;
        state
            .cache
            .remember(&key, || async move { service.teacher(teacher_id).await.map(Dashboard::Teacher) })
            .await?
    };
    Ok(ApiResponse::success(dashboard))
}
