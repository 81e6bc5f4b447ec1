//! Executor actions carried by a task.
//!
//! The gateway never runs these; it only checks that each one is
//! structurally complete before the task is registered.
//!
//! Wire form is adjacently tagged:
//! `{"action": "run", "args": {"path": "/bin/bash", "args": ["echo", "hi"]}}`

use serde::{Deserialize, Serialize};
use url::Url;

/// One executable step of a task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "args", rename_all = "snake_case")]
pub enum ExecutorAction {
    Download(DownloadAction),
    Upload(UploadAction),
    Run(RunAction),
    FetchResult(FetchResultAction),
    EmitProgress(EmitProgressAction),
    Try(TryAction),
    Parallel(ParallelAction),
    Serial(SerialAction),
}

/// Fetch an artifact into the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DownloadAction {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub extract: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cache_key: Option<String>,
}

/// Ship a file out of the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadAction {
    pub from: String,
    pub to: String,
}

/// Run a process inside the container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunAction {
    pub path: String,
    #[serde(default)]
    pub args: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub env: Vec<EnvironmentVariable>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub resource_limits: ResourceLimits,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnvironmentVariable {
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceLimits {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nofile: Option<u64>,
}

/// Read a file whose contents become the task result.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResultAction {
    pub file: String,
}

/// Wrap an action with progress messages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmitProgressAction {
    pub action: Box<ExecutorAction>,
    #[serde(default)]
    pub start_message: String,
    #[serde(default)]
    pub success_message: String,
    #[serde(default)]
    pub failure_message: String,
}

/// Run an action, ignoring its failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TryAction {
    pub action: Box<ExecutorAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParallelAction {
    pub actions: Vec<ExecutorAction>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerialAction {
    pub actions: Vec<ExecutorAction>,
}

impl ExecutorAction {
    /// Shorthand for a plain run action.
    pub fn run(path: impl Into<String>, args: &[&str]) -> Self {
        ExecutorAction::Run(RunAction {
            path: path.into(),
            args: args.iter().map(|a| a.to_string()).collect(),
            env: Vec::new(),
            timeout_ms: None,
            resource_limits: ResourceLimits::default(),
        })
    }

    /// Wire name of the variant.
    pub fn name(&self) -> &'static str {
        match self {
            ExecutorAction::Download(_) => "download",
            ExecutorAction::Upload(_) => "upload",
            ExecutorAction::Run(_) => "run",
            ExecutorAction::FetchResult(_) => "fetch_result",
            ExecutorAction::EmitProgress(_) => "emit_progress",
            ExecutorAction::Try(_) => "try",
            ExecutorAction::Parallel(_) => "parallel",
            ExecutorAction::Serial(_) => "serial",
        }
    }

    /// Check that the action, and any nested actions, are complete.
    ///
    /// Returns a human-readable reason on failure.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            ExecutorAction::Download(a) => {
                require_url("download", "from", &a.from)?;
                require_non_empty("download", "to", &a.to)
            }
            ExecutorAction::Upload(a) => {
                require_non_empty("upload", "from", &a.from)?;
                require_url("upload", "to", &a.to)
            }
            ExecutorAction::Run(a) => {
                require_non_empty("run", "path", &a.path)?;
                if a.env.iter().any(|var| var.name.trim().is_empty()) {
                    return Err("run: environment variable names must not be empty".to_string());
                }
                if a.timeout_ms == Some(0) {
                    return Err("run: timeout_ms must be greater than zero".to_string());
                }
                Ok(())
            }
            ExecutorAction::FetchResult(a) => require_non_empty("fetch_result", "file", &a.file),
            ExecutorAction::EmitProgress(a) => a
                .action
                .validate()
                .map_err(|reason| format!("emit_progress: {}", reason)),
            ExecutorAction::Try(a) => a
                .action
                .validate()
                .map_err(|reason| format!("try: {}", reason)),
            ExecutorAction::Parallel(a) => validate_group("parallel", &a.actions),
            ExecutorAction::Serial(a) => validate_group("serial", &a.actions),
        }
    }
}

fn require_non_empty(action: &str, field: &str, value: &str) -> Result<(), String> {
    if value.trim().is_empty() {
        return Err(format!("{}: {} must not be empty", action, field));
    }
    Ok(())
}

fn require_url(action: &str, field: &str, value: &str) -> Result<(), String> {
    require_non_empty(action, field, value)?;
    Url::parse(value)
        .map(|_| ())
        .map_err(|e| format!("{}: {} is not a valid URL ({})", action, field, e))
}

fn validate_group(action: &str, actions: &[ExecutorAction]) -> Result<(), String> {
    if actions.is_empty() {
        return Err(format!("{}: actions must not be empty", action));
    }
    for (index, inner) in actions.iter().enumerate() {
        inner
            .validate()
            .map_err(|reason| format!("{}[{}]: {}", action, index, reason))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_run_action_wire_format() {
        let action = ExecutorAction::run("/bin/bash", &["echo", "hi"]);
        let value = serde_json::to_value(&action).unwrap();
        assert_eq!(value["action"], "run");
        assert_eq!(value["args"]["path"], "/bin/bash");
        assert_eq!(value["args"]["args"], json!(["echo", "hi"]));
    }

    #[test]
    fn test_nested_action_decodes() {
        let action: ExecutorAction = serde_json::from_value(json!({
            "action": "emit_progress",
            "args": {
                "start_message": "starting",
                "action": {
                    "action": "parallel",
                    "args": {
                        "actions": [
                            {"action": "download", "args": {"from": "http://example.com/app.tgz", "to": "/app", "extract": true}},
                            {"action": "try", "args": {"action": {"action": "fetch_result", "args": {"file": "/tmp/out"}}}}
                        ]
                    }
                }
            }
        }))
        .unwrap();

        assert_eq!(action.name(), "emit_progress");
        assert!(action.validate().is_ok());
    }

    #[test]
    fn test_unknown_action_is_rejected_by_serde() {
        let result: Result<ExecutorAction, _> =
            serde_json::from_value(json!({"action": "teleport", "args": {}}));
        assert!(result.is_err());
    }

    #[test]
    fn test_run_requires_path() {
        let action = ExecutorAction::run("", &[]);
        assert_eq!(action.validate().unwrap_err(), "run: path must not be empty");
    }

    #[test]
    fn test_run_rejects_zero_timeout() {
        let action = ExecutorAction::Run(RunAction {
            path: "/bin/true".to_string(),
            args: vec![],
            env: vec![],
            timeout_ms: Some(0),
            resource_limits: ResourceLimits::default(),
        });
        assert!(action.validate().is_err());
    }

    #[test]
    fn test_download_requires_url() {
        let action = ExecutorAction::Download(DownloadAction {
            from: "not a url".to_string(),
            to: "/app".to_string(),
            extract: false,
            cache_key: None,
        });
        let reason = action.validate().unwrap_err();
        assert!(reason.starts_with("download: from is not a valid URL"));
    }

    #[test]
    fn test_empty_group_is_invalid() {
        let action = ExecutorAction::Serial(SerialAction { actions: vec![] });
        assert_eq!(action.validate().unwrap_err(), "serial: actions must not be empty");
    }

    #[test]
    fn test_nested_failure_reports_path() {
        let action = ExecutorAction::Parallel(ParallelAction {
            actions: vec![
                ExecutorAction::run("/bin/true", &[]),
                ExecutorAction::Try(TryAction {
                    action: Box::new(ExecutorAction::run("", &[])),
                }),
            ],
        });
        assert_eq!(
            action.validate().unwrap_err(),
            "parallel[1]: try: run: path must not be empty"
        );
    }
}
