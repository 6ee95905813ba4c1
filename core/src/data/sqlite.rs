//! SQLite datastore
//!
//! Default persistent backend for the label index: a single
//! `label_index(key TEXT PRIMARY KEY, value BLOB)` table with an ordered
//! prefix scan. The connection is wrapped in a mutex; per-key
//! serialization is provided by SQLite itself.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection};

use super::{Datastore, StoreError};

/// A SQLite-backed byte store.
pub struct SqliteDatastore {
    conn: Mutex<Connection>,
}

impl SqliteDatastore {
    /// Open (or create) the store at the given path.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let conn = Connection::open(path).map_err(|e| StoreError::Backend(e.to_string()))?;
        Self::from_connection(conn)
    }

    /// Open a transient in-memory store.
    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|e| StoreError::Backend(e.to_string()))?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute(
            "CREATE TABLE IF NOT EXISTS label_index (
                key TEXT PRIMARY KEY NOT NULL,
                value BLOB NOT NULL
            )",
            [],
        )
        .map_err(|e| StoreError::Backend(e.to_string()))?;

        Ok(SqliteDatastore {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|e| StoreError::Backend(e.to_string()))
    }
}

/// Escape `%`, `_` and the escape character itself for a LIKE pattern.
fn escape_like(prefix: &str) -> String {
    let mut escaped = String::with_capacity(prefix.len());
    for c in prefix.chars() {
        if c == '%' || c == '_' || c == '\\' {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

impl Datastore for SqliteDatastore {
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO label_index (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )
        .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }

    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare("SELECT value FROM label_index WHERE key = ?1")
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        let mut rows = stmt
            .query(params![key])
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        match rows.next().map_err(|e| StoreError::Backend(e.to_string()))? {
            Some(row) => {
                let value: Vec<u8> = row.get(0).map_err(|e| StoreError::Backend(e.to_string()))?;
                Ok(Some(value))
            }
            None => Ok(None),
        }
    }

    fn delete(&self, key: &str) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute("DELETE FROM label_index WHERE key = ?1", params![key])
            .map_err(|e| StoreError::Backend(e.to_string()))?;
        Ok(())
    }

    fn query_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError> {
        let conn = self.lock()?;
        let pattern = format!("{}%", escape_like(prefix));
        let mut stmt = conn
            .prepare(
                "SELECT key, value FROM label_index
                 WHERE key LIKE ?1 ESCAPE '\\' ORDER BY key",
            )
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let rows = stmt
            .query_map(params![pattern], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, Vec<u8>>(1)?))
            })
            .map_err(|e| StoreError::Backend(e.to_string()))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row.map_err(|e| StoreError::Backend(e.to_string()))?);
        }
        Ok(entries)
    }
}
