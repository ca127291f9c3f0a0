pub mod models;
mod routes;
pub mod service;

use async_trait::async_trait;
use axum::{
    routing::{get, post},
    Router,
};
use libris_kernel::{InitCtx, Migration, Module};
use serde_json::json;

use crate::state::AppState;

/// Catalog module: book CRUD and the deleted-book archive
pub struct BooksModule {
    state: AppState,
}

impl BooksModule {
    pub const fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for BooksModule {
    fn name(&self) -> &'static str {
        "books"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            environment = ?ctx.settings.environment,
            "books module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/books", post(routes::add_book).get(routes::list_books))
            .route(
                "/books/{id}",
                get(routes::get_book)
                    .put(routes::update_book)
                    .delete(routes::delete_book),
            )
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let envelope = json!({ "$ref": "#/components/schemas/Envelope" });
        let responds = |ok: &str| {
            json!({
                ok: { "description": "Success", "content": { "application/json": { "schema": envelope } } },
                "400": { "description": "Validation, duplicate title or conflict" },
                "401": { "description": "Missing or invalid bearer token" },
                "403": { "description": "Role not allowed" }
            })
        };
        let id_param = json!([{ "name": "id", "in": "path", "required": true, "schema": { "type": "string" } }]);

        Some(json!({
            "paths": {
                "/books": {
                    "post": {
                        "summary": "Add a book (LIBRARIAN)",
                        "tags": ["Books"],
                        "security": [{ "bearer": [] }],
                        "requestBody": { "content": { "application/json": { "schema": { "$ref": "#/components/schemas/CreateBook" } } } },
                        "responses": responds("201")
                    },
                    "get": {
                        "summary": "List books (LIBRARIAN, MEMBER)",
                        "tags": ["Books"],
                        "security": [{ "bearer": [] }],
                        "responses": responds("200")
                    }
                },
                "/books/{id}": {
                    "get": {
                        "summary": "Get a book (LIBRARIAN, MEMBER)",
                        "tags": ["Books"],
                        "security": [{ "bearer": [] }],
                        "parameters": id_param,
                        "responses": responds("200")
                    },
                    "put": {
                        "summary": "Edit title and/or author (LIBRARIAN)",
                        "tags": ["Books"],
                        "security": [{ "bearer": [] }],
                        "parameters": id_param,
                        "requestBody": { "content": { "application/json": { "schema": { "$ref": "#/components/schemas/CreateBook" } } } },
                        "responses": responds("200")
                    },
                    "delete": {
                        "summary": "Archive and delete an available book (LIBRARIAN)",
                        "tags": ["Books"],
                        "security": [{ "bearer": [] }],
                        "parameters": id_param,
                        "responses": responds("200")
                    }
                }
            },
            "components": {
                "schemas": {
                    "Book": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "title": { "type": "string" },
                            "author": { "type": "string" },
                            "status": { "type": "string", "enum": ["AVAILABLE", "BORROWED"] },
                            "createdAt": { "type": "string", "format": "date-time" }
                        },
                        "required": ["id", "title", "author", "status", "createdAt"]
                    },
                    "CreateBook": {
                        "type": "object",
                        "properties": {
                            "title": { "type": "string" },
                            "author": { "type": "string" }
                        }
                    }
                }
            }
        }))
    }

    fn migrations(&self) -> Vec<Migration> {
        vec![
            Migration {
                id: "001_books",
                up: r#"
                    CREATE TABLE books (
                        id      TEXT PRIMARY KEY,
                        version INTEGER NOT NULL,
                        body    TEXT NOT NULL CHECK (json_valid(body))
                    );
                    CREATE UNIQUE INDEX books_title_unique ON books (json_extract(body, '$.title'));
                    "#,
            },
            Migration {
                id: "002_deleted_books",
                up: r#"
                    CREATE TABLE deleted_books (
                        id      TEXT PRIMARY KEY,
                        version INTEGER NOT NULL,
                        body    TEXT NOT NULL CHECK (json_valid(body))
                    );
                    "#,
            },
        ]
    }

    async fn start(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module started");
        Ok(())
    }

    async fn stop(&self) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "books module stopped");
        Ok(())
    }
}

/// Create a new instance of the books module
pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(BooksModule::new(state))
}
