//! Structural validation of a task before it reaches the store.

use thiserror::Error;

use super::task::Task;

/// Longest accepted task guid.
pub const MAX_GUID_LEN: usize = 255;

/// Largest accepted annotation, in bytes.
pub const MAX_ANNOTATION_BYTES: usize = 10 * 1024;

/// Highest accepted CPU weight.
pub const MAX_CPU_WEIGHT: u32 = 100;

/// Reasons a task definition is rejected.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TaskValidationError {
    #[error("task_guid must not be empty")]
    EmptyGuid,

    #[error("task_guid must be at most {} characters", MAX_GUID_LEN)]
    GuidTooLong,

    #[error("task_guid may only contain alphanumeric characters, hyphens, and underscores")]
    InvalidGuidCharacters,

    #[error("domain must not be empty")]
    EmptyDomain,

    #[error("actions must not be empty")]
    NoActions,

    #[error("actions[{index}] is invalid: {reason}")]
    InvalidAction { index: usize, reason: String },

    #[error("cpu_weight must be between 0 and {}, got {}", MAX_CPU_WEIGHT, .0)]
    CpuWeightOutOfRange(u32),

    #[error("annotation must be at most {} bytes, got {}", MAX_ANNOTATION_BYTES, .0)]
    AnnotationTooLarge(usize),

    #[error("log guid must not be empty when log is set")]
    EmptyLogGuid,
}

/// Check a task guid against the safe identifier character set.
pub fn validate_task_guid(task_guid: &str) -> Result<(), TaskValidationError> {
    if task_guid.is_empty() {
        return Err(TaskValidationError::EmptyGuid);
    }
    if task_guid.chars().count() > MAX_GUID_LEN {
        return Err(TaskValidationError::GuidTooLong);
    }
    if !task_guid
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(TaskValidationError::InvalidGuidCharacters);
    }
    Ok(())
}

impl Task {
    /// Validate every caller-supplied field.
    pub fn validate(&self) -> Result<(), TaskValidationError> {
        validate_task_guid(&self.task_guid)?;

        if self.domain.trim().is_empty() {
            return Err(TaskValidationError::EmptyDomain);
        }

        if self.actions.is_empty() {
            return Err(TaskValidationError::NoActions);
        }
        for (index, action) in self.actions.iter().enumerate() {
            action
                .validate()
                .map_err(|reason| TaskValidationError::InvalidAction { index, reason })?;
        }

        if self.cpu_weight > MAX_CPU_WEIGHT {
            return Err(TaskValidationError::CpuWeightOutOfRange(self.cpu_weight));
        }

        if self.annotation.len() > MAX_ANNOTATION_BYTES {
            return Err(TaskValidationError::AnnotationTooLarge(
                self.annotation.len(),
            ));
        }

        if let Some(log) = &self.log {
            if log.guid.trim().is_empty() {
                return Err(TaskValidationError::EmptyLogGuid);
            }
        }

        Ok(())
    }
}
