//! Core building blocks shared by every libris crate: the module contract,
//! the lifecycle registry and layered settings.

pub mod module;
pub mod registry;
pub mod settings;

pub use module::{InitCtx, Migration, Module};
pub use registry::ModuleRegistry;
pub use settings::Settings;
