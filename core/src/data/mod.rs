//! Persistence layer
//!
//! The routing core keeps all shared state in a keyed byte store with a
//! narrow contract: unconditional upsert, point get, delete, and ordered
//! prefix scan. The default backend is SQLite; an in-memory backend backs
//! the test harness.
//!
//! - `sqlite`: rusqlite-backed store
//! - `memory`: BTreeMap-backed store for tests and embedding
//! - `scanner`: shared walk over all label namespaces

pub mod memory;
pub mod scanner;
pub mod sqlite;

pub use memory::MemoryDatastore;
pub use scanner::{scan_all_namespaces, NamespaceEntry};
pub use sqlite::SqliteDatastore;

/// Error from the keyed byte store.
#[derive(Debug)]
pub enum StoreError {
    /// The backing store failed
    Backend(String),
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::Backend(e) => write!(f, "store backend error: {}", e),
        }
    }
}

impl std::error::Error for StoreError {}

/// A keyed byte store.
///
/// Serialization per key is delegated to the backend; callers may issue
/// operations from any task. Keys are UTF-8 path-like strings.
pub trait Datastore: Send + Sync {
    /// Unconditional upsert.
    fn put(&self, key: &str, value: &[u8]) -> Result<(), StoreError>;

    /// Point lookup; `None` when the key is absent.
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>, StoreError>;

    /// Remove a key. Deleting an absent key is not an error.
    fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// All entries whose key starts with `prefix`, in key order.
    fn query_prefix(&self, prefix: &str) -> Result<Vec<(String, Vec<u8>)>, StoreError>;
}
