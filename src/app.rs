//! Application assembly: state, module registry, migrations and the server
//! lifecycle.

use anyhow::Context;
use libris_db::Store;
use libris_kernel::{InitCtx, ModuleRegistry, Settings};

use crate::{modules, state::AppState};

/// Registry with every libris module bound to `state`.
pub fn build_registry(state: &AppState) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, state)?;
    Ok(registry)
}

/// Apply every pending module migration. Returns how many ran.
pub fn migrate(store: &Store, registry: &ModuleRegistry) -> anyhow::Result<usize> {
    let applied = libris_db::migrate(store, &registry.collect_migrations())
        .context("failed to apply migrations")?;
    tracing::info!(applied, "migrations complete");
    Ok(applied)
}

/// Open the store, migrate, then serve HTTP until shutdown.
pub async fn serve(settings: Settings) -> anyhow::Result<()> {
    let state = AppState::from_settings(&settings)?;
    let registry = build_registry(&state)?;
    tracing::info!(
        env = ?settings.environment,
        database = %settings.database.url,
        modules = registry.module_count(),
        "libris starting"
    );

    let ctx = InitCtx {
        settings: &settings,
    };
    registry.init_modules(&ctx).await?;
    migrate(&state.store, &registry)?;
    registry.start_modules(&ctx).await?;

    let served = libris_http::start_server(&registry, &settings).await;

    registry.stop_modules().await?;
    served
}
