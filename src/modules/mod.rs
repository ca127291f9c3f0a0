pub mod auth;
pub mod books;
pub mod lending;
pub mod users;

use libris_kernel::ModuleRegistry;

use crate::state::AppState;

/// Register every libris module with the registry
pub fn register_all(registry: &mut ModuleRegistry, state: &AppState) -> anyhow::Result<()> {
    registry.register(auth::create_module(state.clone()))?;
    registry.register(books::create_module(state.clone()))?;
    registry.register(users::create_module(state.clone()))?;
    registry.register(lending::create_module(state.clone()))?;
    Ok(())
}
