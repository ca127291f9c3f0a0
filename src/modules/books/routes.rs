use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use libris_authz::Operation;
use libris_http::{ApiResponse, AppError, Caller, JsonBody};

use super::{
    models::{Book, CreateBook, UpdateBook},
    service,
};
use crate::modules::users::service::ensure_active_account;
use crate::state::AppState;

pub(super) async fn add_book(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(input): JsonBody<CreateBook>,
) -> Result<ApiResponse<Book>, AppError> {
    let actor = caller.authorize(Operation::AddBook)?.id.clone();
    let book = state
        .run(move |s| {
            ensure_active_account(&s.store, &actor)?;
            service::add_book(&s.store, input)
        })
        .await?;
    Ok(ApiResponse::ok("Book added", book).with_status(StatusCode::CREATED))
}

pub(super) async fn list_books(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<ApiResponse<Vec<Book>>, AppError> {
    caller.authorize(Operation::ListBooks)?;
    let books = state.run(|s| service::list_books(&s.store)).await?;
    Ok(ApiResponse::ok("All Books", books))
}

pub(super) async fn get_book(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<ApiResponse<Book>, AppError> {
    caller.authorize(Operation::GetBook)?;
    let book = state.run(move |s| service::get_book(&s.store, &id)).await?;
    Ok(ApiResponse::ok("Book fetched successfully", book))
}

pub(super) async fn update_book(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UpdateBook>,
) -> Result<ApiResponse<Book>, AppError> {
    let actor = caller.authorize(Operation::UpdateBook)?.id.clone();
    let book = state
        .run(move |s| {
            ensure_active_account(&s.store, &actor)?;
            service::update_book(&s.store, &id, input)
        })
        .await?;
    Ok(ApiResponse::ok("Book updated", book))
}

pub(super) async fn delete_book(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>, AppError> {
    let actor = caller.authorize(Operation::DeleteBook)?.clone();
    state
        .run(move |s| {
            ensure_active_account(&s.store, &actor.id)?;
            service::delete_book(&s.store, &actor, &id)
        })
        .await?;
    Ok(ApiResponse::message("Book deleted successfully"))
}
