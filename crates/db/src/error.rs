use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    /// A unique index rejected the write.
    #[error("duplicate value for {collection}.{field}")]
    Duplicate {
        collection: &'static str,
        field: &'static str,
    },

    /// Compare-and-set lost against a concurrent writer.
    #[error("{collection}/{id} was modified concurrently")]
    VersionConflict { collection: &'static str, id: String },

    #[error("unsupported database url '{0}'; expected sqlite://<path> or sqlite::memory:")]
    UnsupportedUrl(String),

    #[error("store connection lock poisoned")]
    Poisoned,

    #[error("failed to apply migration {module}/{id}: {source}")]
    Migration {
        module: String,
        id: String,
        #[source]
        source: rusqlite::Error,
    },

    #[error(transparent)]
    Sqlite(#[from] rusqlite::Error),

    #[error("malformed document: {0}")]
    Serde(#[from] serde_json::Error),
}

impl StoreError {
    /// Classify a write failure, surfacing unique-index violations as
    /// [`StoreError::Duplicate`].
    pub(crate) fn from_write(
        err: rusqlite::Error,
        collection: &'static str,
        unique_field: Option<&'static str>,
    ) -> Self {
        if let rusqlite::Error::SqliteFailure(ref failure, _) = err {
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE {
                return StoreError::Duplicate {
                    collection,
                    field: unique_field.unwrap_or("id"),
                };
            }
            if failure.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_PRIMARYKEY {
                return StoreError::Duplicate {
                    collection,
                    field: "id",
                };
            }
        }
        StoreError::Sqlite(err)
    }
}
