// handlers/public/applications.rs - POST /api/v1/applications

use axum::extract::State;

use crate::cache::resource;
use crate::database::models::application::{SubmitApplication, TeacherApplication};
use crate::middleware::{ApiResponse, ApiResult, JsonBody};
use crate::services::ApplicationService;
use crate::state::AppState;

/// Anyone may apply to teach; staff review the queue
pub async fn submit(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<SubmitApplication>,
) -> ApiResult<TeacherApplication> {
    input.validate()?;
    let application = ApplicationService::new(state.pool.clone()).submit(input).await?;
    state
        .cache
        .invalidate(&[resource::APPLICATIONS, resource::DASHBOARD])
        .await;
    Ok(ApiResponse::created(application))
}
