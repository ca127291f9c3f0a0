mod routes;
pub mod service;

use async_trait::async_trait;
use axum::{routing::post, Router};
use libris_kernel::{InitCtx, Module};
use serde_json::json;

use crate::state::AppState;

/// Public signup and login. The only routes that take no bearer token.
pub struct AuthModule {
    state: AppState,
}

impl AuthModule {
    pub const fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for AuthModule {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            token_ttl_secs = ctx.settings.auth.token_ttl_secs,
            "auth module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/signup", post(routes::signup))
            .route("/login", post(routes::login))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        Some(json!({
            "paths": {
                "/signup": {
                    "post": {
                        "summary": "Create an account",
                        "tags": ["Auth"],
                        "requestBody": { "content": { "application/json": { "schema": { "$ref": "#/components/schemas/CreateUser" } } } },
                        "responses": {
                            "201": { "description": "User created" },
                            "400": { "description": "Missing field, unknown role or username taken" }
                        }
                    }
                },
                "/login": {
                    "post": {
                        "summary": "Exchange credentials for a one-hour bearer token",
                        "tags": ["Auth"],
                        "requestBody": { "content": { "application/json": { "schema": { "$ref": "#/components/schemas/LoginRequest" } } } },
                        "responses": {
                            "200": { "description": "Token and role", "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Envelope" } } } },
                            "401": { "description": "Invalid username or password" },
                            "403": { "description": "Account deleted" }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "LoginRequest": {
                        "type": "object",
                        "properties": {
                            "username": { "type": "string" },
                            "password": { "type": "string" }
                        },
                        "required": ["username", "password"]
                    }
                }
            }
        }))
    }
}

pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(AuthModule::new(state))
}
