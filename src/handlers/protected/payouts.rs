// handlers/protected/payouts.rs - /api/v1/payout handlers

use axum::extract::State;
use uuid::Uuid;

use super::{own_scope, require_teacher};
use crate::cache::{item_key, list_key, resource};
use crate::database::models::payout::{CreatePayout, Payout, PayoutFilter, UpdatePayout};
use crate::database::pagination::{Paged, Pagination};
use crate::handlers::notify;
use crate::middleware::{AnyUser, ApiResponse, ApiResult, JsonBody, PathParam, QueryParams, StaffUser};
use crate::services::PayoutService;
use crate::state::AppState;
use crate::types::PayoutStatus;

const DEPENDENTS: &[&str] = &[resource::PAYOUTS, resource::DASHBOARD];

fn describe(payout: &Payout) -> String {
    format!(
        "{} {} for {} to {}",
        payout.amount, payout.currency, payout.period_start, payout.period_end
    )
}

/// GET /payout - teachers only see their own payouts
pub async fn list(
    State(state): State<AppState>,
    auth: AnyUser,
    QueryParams(mut filter): QueryParams<PayoutFilter>,
) -> ApiResult<Paged<Payout>> {
    filter.teacher_id = own_scope(&auth, filter.teacher_id);
    let page = Pagination::new(filter.page, filter.limit);
    let service = PayoutService::new(state.pool.clone());

    let payouts = state
        .cache
        .remember(&list_key(resource::PAYOUTS, &filter), || service.list(&filter, page))
        .await?;
    Ok(ApiResponse::success(payouts))
}

/// GET /payout/:id
pub async fn get(
    State(state): State<AppState>,
    auth: AnyUser,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Payout> {
    let service = PayoutService::new(state.pool.clone());
    let payout = state
        .cache
        .remember(&item_key(resource::PAYOUTS, id), || service.get(id))
        .await?;
    auth.ensure_self_or_staff(payout.teacher_id)?;
    Ok(ApiResponse::success(payout))
}

/// POST /payout
pub async fn create(
    State(state): State<AppState>,
    _staff: StaffUser,
    JsonBody(input): JsonBody<CreatePayout>,
) -> ApiResult<Payout> {
    input.validate()?;
    require_teacher(&state, input.teacher_id).await?;

    let payout = PayoutService::new(state.pool.clone()).create(input).await?;
    state.cache.invalidate(DEPENDENTS).await;

    notify(&state, payout.teacher_id, "New payout", describe(&payout)).await;
    Ok(ApiResponse::created(payout))
}

/// PATCH /payout/:id - moving to `paid` stamps `paid_at` and tells the teacher
pub async fn update(
    State(state): State<AppState>,
    _staff: StaffUser,
    PathParam(id): PathParam<Uuid>,
    JsonBody(patch): JsonBody<UpdatePayout>,
) -> ApiResult<Payout> {
    patch.validate()?;
    let service = PayoutService::new(state.pool.clone());
    let before = service.get(id).await?;

    let payout = service.update(id, patch).await?;
    state.cache.invalidate(DEPENDENTS).await;

    if before.status != PayoutStatus::Paid && payout.status == PayoutStatus::Paid {
        notify(&state, payout.teacher_id, "Payout paid", describe(&payout)).await;
    }
    Ok(ApiResponse::success(payout))
}

/// DELETE /payout/:id
pub async fn delete(
    State(state): State<AppState>,
    _staff: StaffUser,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<()> {
    PayoutService::new(state.pool.clone()).delete(id).await?;
    state.cache.invalidate(DEPENDENTS).await;
    Ok(ApiResponse::<()>::no_content())
}
