//! Core Task record as stored in the scheduling store.
//!
//! # Invariants
//! - `task_guid` is the sole identity of a task and never changes
//! - `domain`, `stack` and `actions` are fixed at creation
//! - at most one record exists per `task_guid` (enforced by the store's
//!   create-if-absent, not by this type)

use serde::{Deserialize, Serialize};

use super::action::ExecutorAction;

/// Key prefix under which all task records live.
pub const TASK_KEY_PREFIX: &str = "/v1/task/";

/// Store key for a task guid.
pub fn task_key(task_guid: &str) -> String {
    format!("{}{}", TASK_KEY_PREFIX, task_guid)
}

/// Lifecycle state of a task.
///
/// # State Machine
/// ```text
/// Pending -> Running -> Completed -> Resolving
/// ```
/// The gateway only ever writes `Pending`; later transitions belong to the
/// executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskState {
    /// Registered, waiting for an executor to claim it
    Pending,
    /// Claimed and running on an executor
    Running,
    /// Finished, result available
    Completed,
    /// Result is being consumed
    Resolving,
}

impl TaskState {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskState::Pending => "pending",
            TaskState::Running => "running",
            TaskState::Completed => "completed",
            TaskState::Resolving => "resolving",
        }
    }
}

impl std::fmt::Display for TaskState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where the executor should send the task's log lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    pub guid: String,
    #[serde(default)]
    pub source_name: String,
}

/// One unit of scheduled work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    pub task_guid: String,
    pub domain: String,
    #[serde(default)]
    pub stack: String,
    pub actions: Vec<ExecutorAction>,
    pub state: TaskState,
    /// Registration time, Unix nanoseconds
    pub created_at: i64,

    #[serde(default)]
    pub memory_mb: u64,
    #[serde(default)]
    pub disk_mb: u64,
    /// Relative CPU share, 0..=100
    #[serde(default)]
    pub cpu_weight: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log: Option<LogConfig>,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub annotation: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub result_file: String,

    // Written by the executor once the task finishes.
    #[serde(default)]
    pub failed: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub failure_reason: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub result: String,
}

impl Task {
    /// Build a new pending task with no optional settings.
    pub fn new(
        task_guid: impl Into<String>,
        domain: impl Into<String>,
        actions: Vec<ExecutorAction>,
        created_at: i64,
    ) -> Self {
        Self {
            task_guid: task_guid.into(),
            domain: domain.into(),
            stack: String::new(),
            actions,
            state: TaskState::Pending,
            created_at,
            memory_mb: 0,
            disk_mb: 0,
            cpu_weight: 0,
            log: None,
            annotation: String::new(),
            result_file: String::new(),
            failed: false,
            failure_reason: String::new(),
            result: String::new(),
        }
    }

    pub fn key(&self) -> String {
        task_key(&self.task_guid)
    }
}
