use axum::extract::State;
use serde::Deserialize;

use libris_http::{ApiResponse, AppError, JsonBody};

use super::service::{self, Session};
use crate::error::{required, secret};
use crate::modules::users::models::CreateUser;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub(super) struct LoginRequest {
    username: Option<String>,
    password: Option<String>,
}

pub(super) async fn signup(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<CreateUser>,
) -> Result<ApiResponse<()>, AppError> {
    state
        .run(move |s| service::signup(&s.store, &s.hasher, input))
        .await?;
    Ok(ApiResponse::created("User created"))
}

pub(super) async fn login(
    State(state): State<AppState>,
    JsonBody(input): JsonBody<LoginRequest>,
) -> Result<ApiResponse<Session>, AppError> {
    let username = required("username", input.username)?;
    let password = secret("password", input.password)?;

    let session = state
        .run(move |s| service::login(&s.store, &s.hasher, &s.tokens, &username, &password))
        .await?;
    Ok(ApiResponse::ok("Logged In Successfully", session))
}
