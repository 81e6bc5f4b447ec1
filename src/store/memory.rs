//! In-memory store (non-persistent).

use super::{CreateOutcome, StoreClient, StoreError};
use async_trait::async_trait;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::time::Instant;

#[derive(Debug, Clone)]
struct StoredValue {
    value: String,
    visible_at: Instant,
}

/// Map-backed store with linearizable create-if-absent.
///
/// With a non-zero visibility lag, reads behave like a lagging replica: a
/// freshly created key is invisible to `get`/`list` until the lag elapses,
/// while `create_if_absent` always checks the authoritative map.
#[derive(Clone)]
pub struct InMemoryStore {
    entries: Arc<RwLock<HashMap<String, StoredValue>>>,
    visibility_lag: Duration,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_visibility_lag(Duration::ZERO)
    }

    pub fn with_visibility_lag(visibility_lag: Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            visibility_lag,
        }
    }

    /// Number of keys written, visible or not.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StoreClient for InMemoryStore {
    async fn create_if_absent(
        &self,
        key: &str,
        value: String,
    ) -> Result<CreateOutcome, StoreError> {
        let mut entries = self.entries.write().await;
        match entries.entry(key.to_string()) {
            Entry::Occupied(_) => Ok(CreateOutcome::AlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert(StoredValue {
                    value,
                    visible_at: Instant::now() + self.visibility_lag,
                });
                Ok(CreateOutcome::Created)
            }
        }
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        Ok(self
            .entries
            .read()
            .await
            .get(key)
            .filter(|stored| stored.visible_at <= now)
            .map(|stored| stored.value.clone()))
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        let now = Instant::now();
        let values = self
            .entries
            .read()
            .await
            .iter()
            .filter(|(key, stored)| key.starts_with(prefix) && stored.visible_at <= now)
            .map(|(_, stored)| stored.value.clone())
            .collect();
        Ok(values)
    }
}
