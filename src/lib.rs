//! libris: library catalog, membership and lending service.
//!
//! Each feature area is a [`libris_kernel::Module`] contributing routes,
//! migrations and an OpenAPI fragment; [`app`] wires them to the store and
//! the HTTP server.

pub mod app;
pub mod error;
pub mod modules;
pub mod state;

pub use error::LibraryError;
pub use state::AppState;
