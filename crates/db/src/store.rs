use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use rusqlite::{params, Connection, OpenFlags, OptionalExtension, TransactionBehavior};
use serde::{de::DeserializeOwned, Serialize};

use crate::error::StoreError;

const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

/// A JSON document living in one collection.
pub trait Document: Serialize + DeserializeOwned {
    /// Table holding this document type.
    const COLLECTION: &'static str;
    /// Field covered by the collection's unique index, if any.
    const UNIQUE_FIELD: Option<&'static str> = None;

    fn id(&self) -> &str;
}

/// A document together with the version it was read at.
#[derive(Debug, Clone, PartialEq)]
pub struct Versioned<D> {
    pub version: i64,
    pub doc: D,
}

/// Handle to the document store. Cloning shares the underlying connection.
#[derive(Clone)]
pub struct Store {
    conn: Arc<Mutex<Connection>>,
}

impl Store {
    /// Open a store from a connection url: `sqlite://<path>` or `sqlite::memory:`.
    pub fn open(url: &str) -> Result<Self, StoreError> {
        if url == "sqlite::memory:" {
            return Self::open_in_memory();
        }
        let path = url
            .strip_prefix("sqlite://")
            .filter(|path| !path.is_empty())
            .ok_or_else(|| StoreError::UnsupportedUrl(url.to_string()))?;
        Self::open_path(path)
    }

    pub fn open_path<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let conn = Connection::open_with_flags(
            path.as_ref(),
            OpenFlags::SQLITE_OPEN_READ_WRITE
                | OpenFlags::SQLITE_OPEN_CREATE
                | OpenFlags::SQLITE_OPEN_URI
                | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.busy_timeout(BUSY_TIMEOUT)?;
        tracing::info!(path = %path.as_ref().display(), "document store opened");
        Ok(Self::from_connection(conn))
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()?;
        Ok(Self::from_connection(conn))
    }

    fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Arc::new(Mutex::new(conn)),
        }
    }

    /// Run `f` against a consistent snapshot. Writes made inside are rolled back.
    pub fn read<T, E>(&self, f: impl FnOnce(&Tx<'_>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let mut conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Deferred)
            .map_err(StoreError::from)?;
        f(&Tx { conn: &tx })
    }

    /// Run `f` as one atomic unit: every write commits together or none does.
    ///
    /// The transaction takes the write lock up front, so two conflicting
    /// operations on the same records are serialized.
    pub fn transaction<T, E>(&self, f: impl FnOnce(&Tx<'_>) -> Result<T, E>) -> Result<T, E>
    where
        E: From<StoreError>,
    {
        let mut conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        let tx = conn
            .transaction_with_behavior(TransactionBehavior::Immediate)
            .map_err(StoreError::from)?;
        let value = f(&Tx { conn: &tx })?;
        tx.commit().map_err(StoreError::from)?;
        Ok(value)
    }

    pub(crate) fn with_connection<T>(
        &self,
        f: impl FnOnce(&mut Connection) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut conn = self.conn.lock().map_err(|_| StoreError::Poisoned)?;
        f(&mut conn)
    }
}

/// Typed document operations scoped to one open transaction.
pub struct Tx<'a> {
    conn: &'a Connection,
}

impl Tx<'_> {
    pub fn get<D: Document>(&self, id: &str) -> Result<Option<Versioned<D>>, StoreError> {
        let sql = format!("SELECT version, body FROM {} WHERE id = ?1", D::COLLECTION);
        let row = self
            .conn
            .query_row(&sql, params![id], |row| {
                Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
            })
            .optional()?;
        row.map(|(version, body)| decode(version, &body)).transpose()
    }

    /// Fetch documents in the order of `ids`, skipping ids that no longer exist.
    pub fn get_many<D: Document>(&self, ids: &[String]) -> Result<Vec<Versioned<D>>, StoreError> {
        let mut found = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(doc) = self.get::<D>(id)? {
                found.push(doc);
            }
        }
        Ok(found)
    }

    /// All documents whose top-level `field` equals `value`, oldest first.
    pub fn find_by<D: Document>(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Vec<Versioned<D>>, StoreError> {
        let sql = format!(
            "SELECT version, body FROM {} WHERE json_extract(body, ?1) = ?2 ORDER BY rowid",
            D::COLLECTION
        );
        self.query(&sql, params![format!("$.{field}"), value])
    }

    pub fn find_one_by<D: Document>(
        &self,
        field: &str,
        value: &str,
    ) -> Result<Option<Versioned<D>>, StoreError> {
        Ok(self.find_by::<D>(field, value)?.into_iter().next())
    }

    pub fn all<D: Document>(&self) -> Result<Vec<Versioned<D>>, StoreError> {
        let sql = format!("SELECT version, body FROM {} ORDER BY rowid", D::COLLECTION);
        self.query(&sql, [])
    }

    pub fn insert<D: Document>(&self, doc: &D) -> Result<(), StoreError> {
        let body = serde_json::to_string(doc)?;
        let sql = format!(
            "INSERT INTO {} (id, version, body) VALUES (?1, 1, ?2)",
            D::COLLECTION
        );
        self.conn
            .execute(&sql, params![doc.id(), body])
            .map_err(|err| StoreError::from_write(err, D::COLLECTION, D::UNIQUE_FIELD))?;
        Ok(())
    }

    /// Compare-and-set replacement: succeeds only if the stored version is
    /// still `expected_version`. Returns the new version.
    pub fn replace<D: Document>(&self, doc: &D, expected_version: i64) -> Result<i64, StoreError> {
        let body = serde_json::to_string(doc)?;
        let sql = format!(
            "UPDATE {} SET body = ?1, version = version + 1 WHERE id = ?2 AND version = ?3",
            D::COLLECTION
        );
        let changed = self
            .conn
            .execute(&sql, params![body, doc.id(), expected_version])
            .map_err(|err| StoreError::from_write(err, D::COLLECTION, D::UNIQUE_FIELD))?;
        if changed == 0 {
            return Err(StoreError::VersionConflict {
                collection: D::COLLECTION,
                id: doc.id().to_string(),
            });
        }
        Ok(expected_version + 1)
    }

    /// Replace a previously read document, bumping its version in place.
    pub fn save<D: Document>(&self, current: &mut Versioned<D>) -> Result<(), StoreError> {
        current.version = self.replace(&current.doc, current.version)?;
        Ok(())
    }

    pub fn delete<D: Document>(&self, id: &str) -> Result<bool, StoreError> {
        let sql = format!("DELETE FROM {} WHERE id = ?1", D::COLLECTION);
        Ok(self.conn.execute(&sql, params![id])? > 0)
    }

    pub fn count<D: Document>(&self) -> Result<usize, StoreError> {
        let sql = format!("SELECT COUNT(*) FROM {}", D::COLLECTION);
        let count: i64 = self.conn.query_row(&sql, [], |row| row.get(0))?;
        Ok(count.max(0) as usize)
    }

    fn query<D: Document>(
        &self,
        sql: &str,
        params: impl rusqlite::Params,
    ) -> Result<Vec<Versioned<D>>, StoreError> {
        let mut stmt = self.conn.prepare_cached(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?))
        })?;
        let mut docs = Vec::new();
        for row in rows {
            let (version, body) = row?;
            docs.push(decode(version, &body)?);
        }
        Ok(docs)
    }
}

fn decode<D: Document>(version: i64, body: &str) -> Result<Versioned<D>, StoreError> {
    Ok(Versioned {
        version,
        doc: serde_json::from_str(body)?,
    })
}
