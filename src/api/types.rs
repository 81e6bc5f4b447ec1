//! API request and response types.

use serde::{Deserialize, Serialize};

use crate::task::{ExecutorAction, LogConfig, Task, TaskState};

/// Request to register a new task.
///
/// Every field defaults when absent so that a missing field surfaces as a
/// specific validation message instead of a generic decode failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    /// Caller-chosen unique identifier (`guid` is accepted as an alias)
    #[serde(default, alias = "guid")]
    pub task_guid: String,

    /// Namespace used for filtered listing
    #[serde(default)]
    pub domain: String,

    /// Target stack name, opaque to the gateway
    #[serde(default)]
    pub stack: String,

    /// Ordered steps for the executor
    #[serde(default)]
    pub actions: Vec<ExecutorAction>,

    #[serde(default)]
    pub memory_mb: u64,

    #[serde(default)]
    pub disk_mb: u64,

    #[serde(default)]
    pub cpu_weight: u32,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<LogConfig>,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub annotation: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub result_file: String,
}

impl CreateTaskRequest {
    /// Turn the request into a task record. The registry stamps
    /// `created_at` when it registers the task.
    pub fn into_task(self) -> Task {
        let mut task = Task::new(self.task_guid, self.domain, self.actions, 0);
        task.stack = self.stack;
        task.memory_mb = self.memory_mb;
        task.disk_mb = self.disk_mb;
        task.cpu_weight = self.cpu_weight;
        task.log = self.log;
        task.annotation = self.annotation;
        task.result_file = self.result_file;
        task
    }
}

/// Task summary returned by the read endpoints.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResponse {
    pub task_guid: String,
    pub domain: String,
    pub stack: String,
    pub state: TaskState,
    pub created_at: i64,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub annotation: String,

    #[serde(default)]
    pub failed: bool,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub failure_reason: String,

    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub result: String,
}

impl From<Task> for TaskResponse {
    fn from(task: Task) -> Self {
        Self {
            task_guid: task.task_guid,
            domain: task.domain,
            stack: task.stack,
            state: task.state,
            created_at: task.created_at,
            annotation: task.annotation,
            failed: task.failed,
            failure_reason: task.failure_reason,
            result: task.result,
        }
    }
}

/// Query parameters for `GET /tasks`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListTasksQuery {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub state: Option<TaskState>,
}
