//! Task module - the task record, its executor actions, and validation.
//!
//! - All types use algebraic data types with exhaustive matching
//! - Validation is pure and runs before any store interaction

pub mod action;
pub mod task;
mod validation;

pub use action::{
    DownloadAction, EmitProgressAction, EnvironmentVariable, ExecutorAction, FetchResultAction,
    ParallelAction, ResourceLimits, RunAction, SerialAction, TryAction, UploadAction,
};
pub use task::{task_key, LogConfig, Task, TaskState, TASK_KEY_PREFIX};
pub use validation::{validate_task_guid, TaskValidationError, MAX_ANNOTATION_BYTES, MAX_GUID_LEN};
