mod routes;
pub mod service;

use async_trait::async_trait;
use axum::{
    routing::{get, post},
    Router,
};
use libris_kernel::{InitCtx, Module};
use serde_json::json;

use crate::state::AppState;

/// Borrow/return endpoints for members. Owns no tables; it moves state
/// between the books and users collections.
pub struct LendingModule {
    state: AppState,
}

impl LendingModule {
    pub const fn new(state: AppState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for LendingModule {
    fn name(&self) -> &'static str {
        "lending"
    }

    async fn init(&self, _ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(module = self.name(), "lending module initialized");
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/borrow/{id}", post(routes::borrow))
            .route("/return/{id}", post(routes::return_book))
            .route("/borrowed", get(routes::borrowed))
            .route("/history", get(routes::history))
            .with_state(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let books = json!({
            "200": { "description": "Success", "content": { "application/json": { "schema": { "$ref": "#/components/schemas/Envelope" } } } },
            "400": { "description": "Book not available, not borrowed, or not borrowed by the caller" },
            "401": { "description": "Missing or invalid bearer token" },
            "403": { "description": "Not a member, or the account is deleted" },
            "404": { "description": "Book not found" }
        });
        let id_param = json!([{ "name": "id", "in": "path", "required": true, "schema": { "type": "string" } }]);
        let secured = json!([{ "bearer": [] }]);

        Some(json!({
            "paths": {
                "/borrow/{id}": {
                    "post": { "summary": "Borrow an available book (MEMBER)", "tags": ["Lending"], "security": secured, "parameters": id_param, "responses": books }
                },
                "/return/{id}": {
                    "post": { "summary": "Return a borrowed book (MEMBER)", "tags": ["Lending"], "security": secured, "parameters": id_param, "responses": books }
                },
                "/borrowed": {
                    "get": { "summary": "Books currently on loan to the caller (MEMBER)", "tags": ["Lending"], "security": secured, "responses": books }
                },
                "/history": {
                    "get": { "summary": "Books the caller has returned (MEMBER)", "tags": ["Lending"], "security": secured, "responses": books }
                }
            }
        }))
    }
}

pub fn create_module(state: AppState) -> std::sync::Arc<dyn Module> {
    std::sync::Arc::new(LendingModule::new(state))
}
