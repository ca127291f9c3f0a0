use axum::extract::{Path, State};
use libris_authz::Operation;
use libris_http::{ApiResponse, AppError, Caller};

use super::service;
use crate::modules::books::models::Book;
use crate::state::AppState;

pub(super) async fn borrow(
    State(state): State<AppState>,
    caller: Caller,
    Path(book_id): Path<String>,
) -> Result<ApiResponse<Book>, AppError> {
    let member = caller.authorize(Operation::Borrow)?.id.clone();
    let book = state
        .run(move |s| service::borrow(&s.store, &member, &book_id))
        .await?;
    Ok(ApiResponse::ok("Book borrowed successfully", book))
}

pub(super) async fn return_book(
    State(state): State<AppState>,
    caller: Caller,
    Path(book_id): Path<String>,
) -> Result<ApiResponse<Book>, AppError> {
    let member = caller.authorize(Operation::Return)?.id.clone();
    let book = state
        .run(move |s| service::return_book(&s.store, &member, &book_id))
        .await?;
    Ok(ApiResponse::ok("Book returned successfully", book))
}

pub(super) async fn borrowed(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<ApiResponse<Vec<Book>>, AppError> {
    let member = caller.authorize(Operation::ListBorrowed)?.id.clone();
    let books = state
        .run(move |s| service::list_borrowed(&s.store, &member))
        .await?;
    Ok(ApiResponse::ok("Borrowed books", books))
}

pub(super) async fn history(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<ApiResponse<Vec<Book>>, AppError> {
    let member = caller.authorize(Operation::History)?.id.clone();
    let books = state
        .run(move |s| service::history(&s.store, &member))
        .await?;
    Ok(ApiResponse::ok("Borrowing history", books))
}
