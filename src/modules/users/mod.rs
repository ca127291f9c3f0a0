pub mod lifecycle;
pub mod models;
mod routes;
pub mod service;

use async_trait::async_trait;
use axum::{
    routing::{delete, get, post},
    Router,
};
use libris_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use crate::state::AppState;

/// Member accounts: librarian management plus self-service deletion
pub struct UsersModule {
    state: AppState,
}

impl UsersModule {
    pub const fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for UsersModule {
    fn name(&self) -> &'static str {
        "users"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "users module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/users", post(routes::add_user).get(routes::list_users))
            .route(
                "/users/{id}",
                get(routes::get_user)
                    .put(routes::update_user)
                    .delete(routes::delete_user),
            )
            .route("/delete-account", delete(routes::delete_own_account))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let ok = json!({
            "200": { "description": "Success", "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Envelope" } } } },
            "401": { "description": "Missing or invalid bearer token" },
            "403": { "description": "Role not allowed" },
            "404": { "description": "User not found or deleted" }
        });
        let id_param = json!([{ "name": "id", "in": "path", "required": true, "schema": { "type": "string" } }]);
        let secured = json!([{ "bearer": [] }]);

        Some(json!({
            "paths": {
                "/users": {
                    "post": {
                        "summary": "Add a user (LIBRARIAN)",
                        "tags": ["Users"],
                        "security": secured,
                        "requestBody": { "content": { "application/json": { "schema": { "$ref": "#/components/schemas/CreateUser" } } } },
                        "responses": ok
                    },
                    "get": {
                        "summary": "List active users (LIBRARIAN)",
                        "tags": ["Users"],
                        "security": secured,
                        "parameters": [{ "name": "excludeSelf", "in": "query", "schema": { "type": "boolean" } }],
                        "responses": ok
                    }
                },
                "/users/{id}": {
                    "get": {
                        "summary": "Get an active user (LIBRARIAN, MEMBER)",
                        "tags": ["Users"],
                        "security": secured,
                        "parameters": id_param,
                        "responses": ok
                    },
                    "put": {
                        "summary": "Edit a user; password change needs currentPassword (LIBRARIAN)",
                        "tags": ["Users"],
                        "security": secured,
                        "parameters": id_param,
                        "requestBody": { "content": { "application/json": { "schema": { "$ref": "#/components/schemas/UpdateUser" } } } },
                        "responses": ok
                    },
                    "delete": {
                        "summary": "Delete a user, releasing their loans (LIBRARIAN)",
                        "tags": ["Users"],
                        "security": secured,
                        "parameters": id_param,
                        "responses": ok
                    }
                },
                "/delete-account": {
                    "delete": {
                        "summary": "Delete the caller's own account (MEMBER)",
                        "tags": ["Users"],
                        "security": secured,
                        "responses": ok
                    }
                }
            },
            "components": {
                "schemas": {
                    "UserProfile": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "username": { "type": "string" },
                            "role": { "type": "string", "enum": ["LIBRARIAN", "MEMBER"] },
                            "status": { "type": "string", "enum": ["ACTIVE", "DELETED"] },
                            "deletedBy": { "type": "string" },
                            "booksBorrowed": { "type": "array", "items": { "type": "string" } },
                            "booksReturned": { "type": "array", "items": { "type": "string" } },
                            "createdAt": { "type": "string", "format": "date-time" }
                        },
                        "required": ["id", "username", "role", "status", "booksBorrowed", "booksReturned", "createdAt"]
                    },
                    "CreateUser": {
                        "type": "object",
                        "properties": {
                            "username": { "type": "string" },
                            "password": { "type": "string" },
                            "role": { "type": "string", "enum": ["LIBRARIAN", "MEMBER"] }
                        },
                        "required": ["username", "password", "role"]
                    },
                    "UpdateUser": {
                        "type": "object",
                        "properties": {
                            "username": { "type": "string" },
                            "role": { "type": "string", "enum": ["LIBRARIAN", "MEMBER"] },
                            "currentPassword": { "type": "string" },
                            "newPassword": { "type": "string" }
                        }
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![Migration {
            id: "001_users",
            up: r#"
                CREATE TABLE users (
                    id      TEXT PRIMARY KEY,
                    version INTEGER NOT NULL,
                    body    TEXT NOT NULL CHECK (json_valid(body))
                );
                CREATE UNIQUE INDEX users_username_unique ON users (json_extract(body, '$.username'));
                CREATE INDEX users_status ON users (json_extract(body, '$.status'));
                "#,
        }]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "users module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "users module stopped");
        Ok(())
    }
}

/// Create a new instance of the users module
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(UsersModule::new(state))
}
