// handlers/protected/books.rs - /api/v1/books handlers

use axum::extract::State;
use uuid::Uuid;

use crate::cache::{item_key, list_key, resource};
use crate::database::models::book::{Book, BookFilter, CreateBook, UpdateBook};
use crate::database::pagination::{Paged, Pagination};
use crate::middleware::{AnyUser, ApiResponse, ApiResult, JsonBody, PathParam, QueryParams, StaffUser};
use crate::services::BookService;
use crate::state::AppState;

/// GET /books
pub async fn list(
    State(state): State<AppState>,
    _auth: AnyUser,
    QueryParams(filter): QueryParams<BookFilter>,
) -> ApiResult<Paged<Book>> {
    let page = Pagination::new(filter.page, filter.limit);
    let service = BookService::new(state.pool.clone());

    let books = state
        .cache
        .remember(&list_key(resource::BOOKS, &filter), || service.list(&filter, page))
        .await?;
    Ok(ApiResponse::success(books))
}

/// GET /books/:id
pub async fn get(
    State(state): State<AppState>,
    _auth: AnyUser,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<Book> {
    let service = BookService::new(state.pool.clone());
    let book = state
        .cache
        .remember(&item_key(resource::BOOKS, id), || service.get(id))
        .await?;
    Ok(ApiResponse::success(book))
}

/// POST /books
pub async fn create(
    State(state): State<AppState>,
    _staff: StaffUser,
    JsonBody(input): JsonBody<CreateBook>,
) -> ApiResult<Book> {
    input.validate()?;
    let book = BookService::new(state.pool.clone()).create(input).await?;
    state.cache.invalidate(&[resource::BOOKS]).await;
    Ok(ApiResponse::created(book))
}

/// PATCH /books/:id - a retitled book shows up in assignment listings too
pub async fn update(
    State(state): State<AppState>,
    _staff: StaffUser,
    PathParam(id): PathParam<Uuid>,
    JsonBody(patch): JsonBody<UpdateBook>,
) -> ApiResult<Book> {
    patch.validate()?;
    let book = BookService::new(state.pool.clone()).update(id, patch).await?;
    state
        .cache
        .invalidate(&[resource::BOOKS, resource::BOOK_ASSIGN])
        .await;
    Ok(ApiResponse::success(book))
}

/// DELETE /books/:id - refused with 400 while the book is still assigned
pub async fn delete(
    State(state): State<AppState>,
    _staff: StaffUser,
    PathParam(id): PathParam<Uuid>,
) -> ApiResult<()> {
    BookService::new(state.pool.clone()).delete(id).await?;
    state
        .cache
        .invalidate(&[resource::BOOKS, resource::BOOK_ASSIGN])
        .await;
    Ok(ApiResponse::<()>::no_content())
}
