//! Document store for libris.
//!
//! Every collection is a SQLite table holding JSON documents keyed by id with
//! a monotonically increasing `version`. Unique constraints are expression
//! indexes declared by the owning module's migrations, so uniqueness is
//! enforced by the store rather than by read-then-write checks.

mod error;
mod migrate;
mod store;

pub use error::StoreError;
pub use migrate::migrate;
pub use store::{Document, Store, Tx, Versioned};
