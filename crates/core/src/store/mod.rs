//! Named key/value persistence stores.
//!
//! The response cache only needs whole-value get/put/delete/clear against a
//! named store, so that is all [`PersistenceStore`] exposes. The default
//! implementation keeps every store as rows of one SQLite table, keyed by
//! `(store_name, key)`; tests substitute their own implementations.

pub mod connection;
pub mod migrations;

use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

pub use connection::CacheDb;

/// A named key/value store with opaque byte payloads.
#[async_trait::async_trait]
pub trait PersistenceStore: Send + Sync {
    /// Name this store was opened with.
    fn name(&self) -> &str;

    /// Value for `key`, or `None` when absent.
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error>;

    /// Insert or fully replace the value for `key`.
    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), Error>;

    /// Remove `key`. Returns whether a value existed.
    async fn delete(&self, key: &str) -> Result<bool, Error>;

    /// All keys currently in the store, oldest write first.
    async fn keys(&self) -> Result<Vec<String>, Error>;

    /// Remove every value. Returns the number removed.
    async fn clear(&self) -> Result<u64, Error>;
}

/// Opens named stores over a shared [`CacheDb`].
#[derive(Clone, Debug)]
pub struct StoreManager {
    db: CacheDb,
}

impl StoreManager {
    pub fn new(db: CacheDb) -> Self {
        Self { db }
    }

    /// Open (or lazily create) the store called `name`.
    pub fn open_store(&self, name: &str) -> Result<SqliteStore, Error> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::InvalidInput("store name cannot be empty".into()));
        }
        Ok(SqliteStore { db: self.db.clone(), name: name.to_string() })
    }

    /// Drop a whole store. Returns the number of values removed.
    pub async fn delete_store(&self, name: &str) -> Result<u64, Error> {
        self.open_store(name)?.clear().await
    }

    /// Names of all stores holding at least one value.
    pub async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.db
            .conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT DISTINCT store_name FROM store_entries ORDER BY store_name")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, rusqlite::Error>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }
}

/// SQLite-backed [`PersistenceStore`].
#[derive(Clone, Debug)]
pub struct SqliteStore {
    db: CacheDb,
    name: String,
}

#[async_trait::async_trait]
impl PersistenceStore for SqliteStore {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, Error> {
        let name = self.name.clone();
        let key = key.to_string();
        self.db
            .conn
            .call(move |conn| -> Result<Option<Vec<u8>>, Error> {
                let mut stmt = conn.prepare("SELECT value FROM store_entries WHERE store_name = ?1 AND key = ?2")?;

                match stmt.query_row(params![name, key], |row| row.get(0)) {
                    Ok(value) => Ok(Some(value)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    async fn put(&self, key: &str, value: Vec<u8>) -> Result<(), Error> {
        let name = self.name.clone();
        let key = key.to_string();
        let now = chrono::Utc::now().to_rfc3339();
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO store_entries (store_name, key, value, updated_at)
                     VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT(store_name, key) DO UPDATE SET
                        value = excluded.value,
                        updated_at = excluded.updated_at",
                    params![name, key, value, now],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, key: &str) -> Result<bool, Error> {
        let name = self.name.clone();
        let key = key.to_string();
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let count =
                    conn.execute("DELETE FROM store_entries WHERE store_name = ?1 AND key = ?2", params![name, key])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        let name = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<String>, Error> {
                let mut stmt =
                    conn.prepare("SELECT key FROM store_entries WHERE store_name = ?1 ORDER BY updated_at, key")?;
                let keys = stmt
                    .query_map(params![name], |row| row.get(0))?
                    .collect::<Result<Vec<String>, rusqlite::Error>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }

    async fn clear(&self) -> Result<u64, Error> {
        let name = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM store_entries WHERE store_name = ?1", params![name])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
