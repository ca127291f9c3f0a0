use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use libris_authz::Operation;
use libris_http::{ApiResponse, AppError, Caller, JsonBody, QueryParams};

use super::{
    lifecycle,
    models::{CreateUser, DeletedBy, ListUsersQuery, UpdateUser, UserProfile},
    service,
};
use crate::state::AppState;

pub(super) async fn add_user(
    State(state): State<AppState>,
    caller: Caller,
    JsonBody(input): JsonBody<CreateUser>,
) -> Result<ApiResponse<UserProfile>, AppError> {
    let actor = caller.authorize(Operation::AddUser)?.id.clone();
    let user = state
        .run(move |s| {
            service::ensure_active_account(&s.store, &actor)?;
            service::create_user(&s.store, &s.hasher, input)
        })
        .await?;
    Ok(ApiResponse::ok("User added", UserProfile::from(user)).with_status(StatusCode::CREATED))
}

pub(super) async fn list_users(
    State(state): State<AppState>,
    caller: Caller,
    QueryParams(query): QueryParams<ListUsersQuery>,
) -> Result<ApiResponse<Vec<UserProfile>>, AppError> {
    let me = caller.authorize(Operation::ListUsers)?.id.clone();
    let exclude = query.exclude_self.then_some(me);
    let users = state
        .run(move |s| service::list_active_users(&s.store, exclude.as_deref()))
        .await?;
    Ok(ApiResponse::ok(
        "Users fetched successfully",
        users.into_iter().map(UserProfile::from).collect(),
    ))
}

pub(super) async fn get_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<ApiResponse<UserProfile>, AppError> {
    caller.authorize(Operation::GetUser)?;
    let user = state
        .run(move |s| service::get_active_user(&s.store, &id))
        .await?;
    Ok(ApiResponse::ok("User fetched successfully", user.into()))
}

pub(super) async fn update_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
    JsonBody(input): JsonBody<UpdateUser>,
) -> Result<ApiResponse<UserProfile>, AppError> {
    let actor = caller.authorize(Operation::UpdateUser)?.id.clone();
    let user = state
        .run(move |s| {
            service::ensure_active_account(&s.store, &actor)?;
            service::update_user(&s.store, &s.hasher, &id, input)
        })
        .await?;
    Ok(ApiResponse::ok("User updated", user.into()))
}

pub(super) async fn delete_user(
    State(state): State<AppState>,
    caller: Caller,
    Path(id): Path<String>,
) -> Result<ApiResponse<()>, AppError> {
    let actor = caller.authorize(Operation::DeleteUser)?.id.clone();
    state
        .run(move |s| {
            service::ensure_active_account(&s.store, &actor)?;
            lifecycle::delete_user(&s.store, &id, DeletedBy::Librarian(actor))
        })
        .await?;
    Ok(ApiResponse::message("Account deleted"))
}

pub(super) async fn delete_own_account(
    State(state): State<AppState>,
    caller: Caller,
) -> Result<ApiResponse<()>, AppError> {
    let me = caller.authorize(Operation::DeleteOwnAccount)?.id.clone();
    state
        .run(move |s| lifecycle::delete_user(&s.store, &me, DeletedBy::SelfService))
        .await?;
    Ok(ApiResponse::message("Account deleted"))
}
