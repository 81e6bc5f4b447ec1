//! Store client contract with pluggable backends.
//!
//! The registry only ever needs three primitives from the scheduling store:
//! an atomic create-if-absent, a point read, and a prefix listing.
//!
//! Supports:
//! - `memory`: In-memory storage (non-persistent, for testing). Can emulate
//!   replica staleness with a visibility lag.
//! - `sqlite`: SQLite database file

mod memory;
mod sqlite;
#[cfg(test)]
pub(crate) mod testing;

pub use memory::InMemoryStore;
pub use sqlite::SqliteStore;

use async_trait::async_trait;
use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Result of a create-if-absent call that reached the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The key was absent and now holds the new value.
    Created,
    /// The key already held a value; nothing was written.
    AlreadyExists,
}

/// Failures of the store itself, as opposed to logical outcomes.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("store timed out: {0}")]
    Timeout(String),
}

/// Store client trait - implemented by all storage backends.
///
/// `create_if_absent` must be linearizable per key: of any number of
/// concurrent calls for one key, exactly one observes `Created`.
#[async_trait]
pub trait StoreClient: Send + Sync {
    /// Atomically write `value` under `key` unless the key already exists.
    async fn create_if_absent(&self, key: &str, value: String)
        -> Result<CreateOutcome, StoreError>;

    /// Read a single value.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Read every value whose key starts with `prefix`, in store order.
    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError>;
}

/// Shared handle to a store client.
pub type SharedStore = Arc<dyn StoreClient>;

/// Store backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StoreType {
    Memory,
    #[default]
    Sqlite,
}

impl StoreType {
    /// Parse from environment variable value.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "memory" | "mem" => Some(Self::Memory),
            "sqlite" | "db" => Some(Self::Sqlite),
            _ => None,
        }
    }
}

impl std::fmt::Display for StoreType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreType::Memory => write!(f, "memory"),
            StoreType::Sqlite => write!(f, "sqlite"),
        }
    }
}

/// Bound a store call. Elapsing the limit becomes `StoreError::Timeout`.
///
/// Dropping the inner future on timeout is only safe for reads; writes that
/// must run to completion should be spawned first and the handle awaited.
pub async fn with_timeout<T, F>(limit: Duration, call: F) -> Result<T, StoreError>
where
    F: Future<Output = Result<T, StoreError>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(StoreError::Timeout(format!(
            "no response within {}ms",
            limit.as_millis()
        ))),
    }
}

/// Create a store client based on type and endpoint.
pub async fn create_store(store_type: StoreType, path: PathBuf) -> Result<SharedStore, StoreError> {
    match store_type {
        StoreType::Memory => Ok(Arc::new(InMemoryStore::new())),
        StoreType::Sqlite => {
            let store = SqliteStore::new(path).await?;
            Ok(Arc::new(store))
        }
    }
}
