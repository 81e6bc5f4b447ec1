//! Lifecycle queries: read-only views of task records in the store.
//!
//! Every call reads the store afresh. Results follow the store's own order;
//! nothing here sorts, so callers must not treat list order as meaningful.
//! A task created moments ago may be missing from a lagging replica and
//! shows up on a later poll.

use std::time::Duration;

use crate::error::ApiError;
use crate::store::{self, SharedStore};
use crate::task::{Task, TaskState, TASK_KEY_PREFIX};

/// Optional filters for a task listing. Empty filter lists everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub domain: Option<String>,
    pub state: Option<TaskState>,
}

impl TaskFilter {
    pub fn domain(domain: impl Into<String>) -> Self {
        Self {
            domain: Some(domain.into()),
            state: None,
        }
    }

    pub fn state(state: TaskState) -> Self {
        Self {
            domain: None,
            state: Some(state),
        }
    }

    fn matches(&self, task: &Task) -> bool {
        self.domain.as_deref().map_or(true, |d| task.domain == d)
            && self.state.map_or(true, |s| task.state == s)
    }
}

#[derive(Clone)]
pub struct LifecycleQuery {
    store: SharedStore,
    store_timeout: Duration,
}

impl LifecycleQuery {
    pub fn new(store: SharedStore, store_timeout: Duration) -> Self {
        Self {
            store,
            store_timeout,
        }
    }

    /// Snapshot of tasks matching `filter`.
    ///
    /// Records that no longer decode are skipped with a warning so one bad
    /// entry cannot hide the rest.
    pub async fn list_tasks(&self, filter: &TaskFilter) -> Result<Vec<Task>, ApiError> {
        if let Some(domain) = &filter.domain {
            if domain.trim().is_empty() {
                return Err(ApiError::validation("domain must not be empty"));
            }
        }

        let values =
            store::with_timeout(self.store_timeout, self.store.list(TASK_KEY_PREFIX)).await?;

        let tasks = values
            .iter()
            .filter_map(|value| match serde_json::from_str::<Task>(value) {
                Ok(task) => Some(task),
                Err(e) => {
                    tracing::warn!("Skipping undecodable task record: {}", e);
                    None
                }
            })
            .filter(|task| filter.matches(task))
            .collect();

        Ok(tasks)
    }

    pub async fn list_all_tasks(&self) -> Result<Vec<Task>, ApiError> {
        self.list_tasks(&TaskFilter::default()).await
    }

    pub async fn list_tasks_by_domain(&self, domain: &str) -> Result<Vec<Task>, ApiError> {
        self.list_tasks(&TaskFilter::domain(domain)).await
    }

    pub async fn list_tasks_by_state(&self, state: TaskState) -> Result<Vec<Task>, ApiError> {
        self.list_tasks(&TaskFilter::state(state)).await
    }

    /// Tasks waiting for an executor.
    pub async fn list_pending_tasks(&self) -> Result<Vec<Task>, ApiError> {
        self.list_tasks_by_state(TaskState::Pending).await
    }
}
