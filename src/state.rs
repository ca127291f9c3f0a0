use std::sync::Arc;
use std::time::Duration;

use axum::extract::FromRef;
use libris_authz::{PasswordHasher, TokenCodec};
use libris_db::Store;
use libris_kernel::Settings;

use crate::error::LibraryError;

/// Shared handles every module's handlers run against.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub tokens: Arc<TokenCodec>,
    pub hasher: Arc<PasswordHasher>,
}

impl AppState {
    pub fn new(store: Store, tokens: TokenCodec, hasher: PasswordHasher) -> Self {
        Self {
            store,
            tokens: Arc::new(tokens),
            hasher: Arc::new(hasher),
        }
    }

    /// Open the configured store and build token/password services from settings.
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let store = Store::open(&settings.database.url)?;
        let tokens = TokenCodec::new(
            &settings.auth.jwt_secret,
            Duration::from_secs(settings.auth.token_ttl_secs),
        );
        Ok(Self::new(store, tokens, PasswordHasher::new()))
    }

    /// Run a store-bound operation off the async runtime. Store access and
    /// password hashing both block.
    pub async fn run<T, F>(&self, f: F) -> Result<T, LibraryError>
    where
        F: FnOnce(&AppState) -> Result<T, LibraryError> + Send + 'static,
        T: Send + 'static,
    {
        let state = self.clone();
        tokio::task::spawn_blocking(move || f(&state))
            .await
            .map_err(|err| LibraryError::Internal(format!("worker task failed: {err}")))?
    }
}

impl FromRef<AppState> for Arc<TokenCodec> {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}
