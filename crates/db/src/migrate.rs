use libris_kernel::Migration;
use rusqlite::params;
use time::{format_description::well_known::Rfc3339, OffsetDateTime};

use crate::{error::StoreError, store::Store};

const LEDGER_DDL: &str = "CREATE TABLE IF NOT EXISTS _migrations (
    module TEXT NOT NULL,
    id TEXT NOT NULL,
    applied_at TEXT NOT NULL,
    PRIMARY KEY (module, id)
)";

/// Apply every migration not yet recorded in `_migrations`, each in its own
/// transaction. Returns how many were applied.
pub fn migrate(store: &Store, migrations: &[(String, Migration)]) -> Result<usize, StoreError> {
    store.with_connection(|conn| {
        conn.execute(LEDGER_DDL, [])?;

        let mut applied = 0;
        for (module, migration) in migrations {
            let tx = conn.transaction()?;
            let seen: bool = tx.query_row(
                "SELECT EXISTS(SELECT 1 FROM _migrations WHERE module = ?1 AND id = ?2)",
                params![module, migration.id],
                |row| row.get(0),
            )?;
            if seen {
                continue;
            }

            tx.execute_batch(migration.up)
                .map_err(|source| StoreError::Migration {
                    module: module.clone(),
                    id: migration.id.to_string(),
                    source,
                })?;
            let applied_at = OffsetDateTime::now_utc()
                .format(&Rfc3339)
                .unwrap_or_default();
            tx.execute(
                "INSERT INTO _migrations (module, id, applied_at) VALUES (?1, ?2, ?3)",
                params![module, migration.id, applied_at],
            )?;
            tx.commit()?;

            tracing::info!(module = %module, migration = migration.id, "migration applied");
            applied += 1;
        }
        Ok(applied)
    })
}
