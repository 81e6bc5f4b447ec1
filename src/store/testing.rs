//! Misbehaving store clients for exercising failure paths.

use super::{CreateOutcome, InMemoryStore, StoreClient, StoreError};
use async_trait::async_trait;
use std::time::Duration;

/// Every call fails as if the store were unreachable.
pub struct UnavailableStore;

#[async_trait]
impl StoreClient for UnavailableStore {
    async fn create_if_absent(
        &self,
        _key: &str,
        _value: String,
    ) -> Result<CreateOutcome, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }

    async fn list(&self, _prefix: &str) -> Result<Vec<String>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

/// Delays every call before delegating to an in-memory store.
#[derive(Clone)]
pub struct SlowStore {
    pub inner: InMemoryStore,
    pub delay: Duration,
}

impl SlowStore {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: InMemoryStore::new(),
            delay,
        }
    }
}

#[async_trait]
impl StoreClient for SlowStore {
    async fn create_if_absent(
        &self,
        key: &str,
        value: String,
    ) -> Result<CreateOutcome, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.create_if_absent(key, value).await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.get(key).await
    }

    async fn list(&self, prefix: &str) -> Result<Vec<String>, StoreError> {
        tokio::time::sleep(self.delay).await;
        self.inner.list(prefix).await
    }
}

/// Panics on reads, to exercise fault isolation above the store.
pub struct PanickingStore;

#[async_trait]
impl StoreClient for PanickingStore {
    async fn create_if_absent(
        &self,
        _key: &str,
        _value: String,
    ) -> Result<CreateOutcome, StoreError> {
        panic!("store client bug: create_if_absent");
    }

    async fn get(&self, _key: &str) -> Result<Option<String>, StoreError> {
        panic!("store client bug: get");
    }

    async fn list(&self, _prefix: &str) -> Result<Vec<String>, StoreError> {
        panic!("store client bug: list");
    }
}
