//! Task registry: exactly-once registration of tasks in the store.
//!
//! The registry holds no task table of its own. Uniqueness comes entirely
//! from the store's create-if-absent on the task key, so concurrent creators
//! of one guid race there and exactly one of them wins.
//!
//! # Timeouts and ambiguity
//! Every store call is bounded. A create that times out is reported as
//! `StoreTimeout`, but the write keeps running and may still commit. A caller
//! that retries can then see `TaskGuidAlreadyExists` for its own task. The
//! registry never retries on its own.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;

use crate::error::ApiError;
use crate::store::{self, CreateOutcome, SharedStore};
use crate::task::{task_key, validate_task_guid, Task, TaskState};

/// Registers tasks and reads single task records.
#[derive(Clone)]
pub struct TaskRegistry {
    store: SharedStore,
    store_timeout: Duration,
}

impl TaskRegistry {
    pub fn new(store: SharedStore, store_timeout: Duration) -> Self {
        Self {
            store,
            store_timeout,
        }
    }

    /// Validate and register a task in the `Pending` state, stamped with
    /// the current time. Any incoming state or timestamp is overwritten.
    ///
    /// Fails with `ValidationError` before touching the store, with
    /// `TaskGuidAlreadyExists` if the guid is taken (the existing record is
    /// left as is), and with `StoreUnavailable`/`StoreTimeout` when the store
    /// cannot answer.
    pub async fn create_task(&self, mut task: Task) -> Result<(), ApiError> {
        task.validate()?;
        task.state = TaskState::Pending;
        task.created_at = now_nanos();

        let task_guid = task.task_guid.clone();
        let key = task.key();
        let value = serde_json::to_string(&task)
            .map_err(|e| ApiError::unknown(format!("failed to encode task: {}", e)))?;

        // The write runs detached so an abandoned request or an elapsed
        // timeout never leaves it half-finished.
        let store = Arc::clone(&self.store);
        let write = tokio::spawn(async move { store.create_if_absent(&key, value).await });

        let outcome = match tokio::time::timeout(self.store_timeout, write).await {
            Ok(Ok(result)) => result?,
            Ok(Err(join_err)) => {
                tracing::error!("Store write for task {} aborted: {}", task_guid, join_err);
                return Err(ApiError::unknown("store write aborted unexpectedly"));
            }
            Err(_) => {
                tracing::warn!(
                    "Store write for task {} exceeded {}ms; outcome unknown",
                    task_guid,
                    self.store_timeout.as_millis()
                );
                return Err(ApiError::store_timeout(format!(
                    "no response within {}ms",
                    self.store_timeout.as_millis()
                )));
            }
        };

        match outcome {
            CreateOutcome::Created => {
                tracing::info!("Registered task {} in domain {}", task_guid, task.domain);
                Ok(())
            }
            CreateOutcome::AlreadyExists => {
                tracing::debug!("Rejected duplicate task guid {}", task_guid);
                Err(ApiError::guid_already_exists(&task_guid))
            }
        }
    }

    /// Fresh read of one task record.
    pub async fn get_task(&self, task_guid: &str) -> Result<Task, ApiError> {
        validate_task_guid(task_guid)?;

        let value = store::with_timeout(self.store_timeout, self.store.get(&task_key(task_guid)))
            .await?
            .ok_or_else(|| ApiError::task_not_found(task_guid))?;

        serde_json::from_str(&value).map_err(|e| {
            tracing::error!("Stored record for task {} is corrupt: {}", task_guid, e);
            ApiError::unknown(format!("stored record for task '{}' is unreadable", task_guid))
        })
    }
}

fn now_nanos() -> i64 {
    Utc::now().timestamp_nanos_opt().unwrap_or(i64::MAX)
}
