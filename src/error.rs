//! API error taxonomy and its wire representation.
//!
//! Every failure that leaves the gateway is an [`ApiError`]: an explicit
//! [`ErrorKind`] plus a human-readable message. Callers branch on the kind,
//! never on the message text.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::store::StoreError;
use crate::task::TaskValidationError;

/// Closed set of error kinds the API can report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// Malformed or missing request field (400)
    ValidationError,
    /// A task with the same guid already exists (409)
    TaskGuidAlreadyExists,
    /// No task with the requested guid (404)
    TaskNotFound,
    /// Backing store unreachable (503) - retryable by the caller
    StoreUnavailable,
    /// Backing store did not answer in time (504) - retryable by the caller
    StoreTimeout,
    /// Credentials missing or invalid (401)
    Unauthorized,
    /// Anything else (500)
    UnknownError,
}

impl ErrorKind {
    /// HTTP status this kind is reported with.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ErrorKind::ValidationError => StatusCode::BAD_REQUEST,
            ErrorKind::TaskGuidAlreadyExists => StatusCode::CONFLICT,
            ErrorKind::TaskNotFound => StatusCode::NOT_FOUND,
            ErrorKind::StoreUnavailable => StatusCode::SERVICE_UNAVAILABLE,
            ErrorKind::StoreTimeout => StatusCode::GATEWAY_TIMEOUT,
            ErrorKind::Unauthorized => StatusCode::UNAUTHORIZED,
            ErrorKind::UnknownError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Whether a caller may reasonably retry the same request later.
    ///
    /// Only store failures qualify. A create that timed out may still have
    /// committed, so a retry can legitimately come back as
    /// `TaskGuidAlreadyExists` for the caller's own task.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::StoreUnavailable | ErrorKind::StoreTimeout)
    }

    /// Stable machine-readable code (same as the serialized form).
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ValidationError => "ValidationError",
            ErrorKind::TaskGuidAlreadyExists => "TaskGuidAlreadyExists",
            ErrorKind::TaskNotFound => "TaskNotFound",
            ErrorKind::StoreUnavailable => "StoreUnavailable",
            ErrorKind::StoreTimeout => "StoreTimeout",
            ErrorKind::Unauthorized => "Unauthorized",
            ErrorKind::UnknownError => "UnknownError",
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error reported by the API, also the JSON error body.
///
/// Serialized as `{"type": "<kind>", "message": "<text>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(rename = "type")]
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::ValidationError, message)
    }

    pub fn guid_already_exists(task_guid: &str) -> Self {
        Self::new(
            ErrorKind::TaskGuidAlreadyExists,
            format!("task guid '{}' already exists", task_guid),
        )
    }

    pub fn task_not_found(task_guid: &str) -> Self {
        Self::new(
            ErrorKind::TaskNotFound,
            format!("task guid '{}' not found", task_guid),
        )
    }

    pub fn store_timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::StoreTimeout, message)
    }

    /// The one message used for every authentication failure.
    pub fn unauthorized() -> Self {
        Self::new(ErrorKind::Unauthorized, "authentication required")
    }

    pub fn unknown(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::UnknownError, message)
    }

    pub fn status_code(&self) -> StatusCode {
        self.kind.status_code()
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

impl std::error::Error for ApiError {}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => {
                Self::new(ErrorKind::StoreUnavailable, format!("store unavailable: {}", msg))
            }
            StoreError::Timeout(msg) => Self::store_timeout(format!("store timed out: {}", msg)),
        }
    }
}

impl From<TaskValidationError> for ApiError {
    fn from(err: TaskValidationError) -> Self {
        Self::validation(err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status_code(), Json(self)).into_response()
    }
}

/// Map a bare HTTP status back onto an error kind.
///
/// Used by the client when a response carries no decodable error body.
pub fn classify_http_status(status: u16) -> ErrorKind {
    match status {
        400 => ErrorKind::ValidationError,
        401 => ErrorKind::Unauthorized,
        404 => ErrorKind::TaskNotFound,
        409 => ErrorKind::TaskGuidAlreadyExists,
        503 => ErrorKind::StoreUnavailable,
        504 => ErrorKind::StoreTimeout,
        _ => ErrorKind::UnknownError,
    }
}
