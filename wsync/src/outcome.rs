//! Classification of mirror attempts.
//!
//! The sync tool reports failures as free text only, so the classification below
//! matches substrings of that text against [ERROR_PATTERNS]. The table is
//! best-effort: wording differs across platforms and locales, and anything it does
//! not recognize falls back to [SyncOutcome::TransferError].

use std::fmt;

use serde::{Deserialize, Serialize};

/// Captured result of an external command
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Set when the command could not be spawned or exited unsuccessfully
    pub exit_error: Option<String>,
    pub stdout: String,
    pub stderr: String,
}

impl CommandOutput {
    pub fn success(stdout: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_error: None,
            stdout: stdout.into(),
            stderr: stderr.into(),
        }
    }

    pub fn failure(exit_error: impl Into<String>, stderr: impl Into<String>) -> Self {
        Self {
            exit_error: Some(exit_error.into()),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// The complete error message, if the command failed.
    /// Captured diagnostic text is appended to the exit error.
    pub fn error_message(&self) -> Option<String> {
        let exit_error = self.exit_error.as_deref()?.trim();
        let stderr = self.stderr.trim();
        let msg = match (exit_error.is_empty(), stderr.is_empty()) {
            (true, true) => return None,
            (false, true) => exit_error.to_string(),
            (true, false) => stderr.to_string(),
            (false, false) => format!("{exit_error}\n{stderr}"),
        };
        Some(msg)
    }
}

/// Result of one mirror attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SyncOutcome {
    /// The mirror completed. Leftover diagnostic text is advisory only.
    Success { advisory: Option<String> },
    /// No workspace open or incomplete credentials, nothing was contacted
    ConfigurationError(String),
    /// A mirror for the same workspace is already running
    InProgress,
    /// The server refused or failed to prepare the remote folder
    RemoteFolderError(String),
    /// The server did not answer
    NoResponse(String),
    /// The sync tool executable could not be located
    ToolNotFound(String),
    /// Any other failure reported by the sync tool
    TransferError(String),
    /// The workspace changed while the mirror was running
    Discarded,
}

impl SyncOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SyncOutcome::Success { .. })
    }

    /// Remediation text shown after the failure itself
    pub fn guidance(&self) -> Option<String> {
        match self {
            SyncOutcome::ToolNotFound(_) => Some(format!(
                "The sync tool could not be found. Set its location in the settings, either the \
                 executable itself or the folder containing it, e.g. {}. \
                 The tool can be downloaded from https://rclone.org/downloads/",
                example_tool_path()
            )),
            SyncOutcome::TransferError(_) => Some(
                "Mirroring failed. Check that:\n\
                 - the server is reachable from this machine\n\
                 - the user name and password are correct\n\
                 - the SSH port (22) is open on the server\n\
                 - the remote base path exists and is writable"
                    .to_string(),
            ),
            _ => None,
        }
    }
}

impl fmt::Display for SyncOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success { advisory: None } => f.write_str("Sync completed"),
            Self::Success {
                advisory: Some(advisory),
            } => write!(f, "Sync completed with messages:\n{advisory}"),
            Self::ConfigurationError(msg) => write!(f, "Configuration error: {msg}"),
            Self::InProgress => f.write_str("A sync is already in progress"),
            Self::RemoteFolderError(msg) => write!(f, "Remote folder error: {msg}"),
            Self::NoResponse(msg) => write!(f, "No response from server: {msg}"),
            Self::ToolNotFound(msg) => write!(f, "Sync tool not found: {msg}"),
            Self::TransferError(msg) => write!(f, "Sync failed: {msg}"),
            Self::Discarded => f.write_str("Workspace changed, sync result discarded"),
        }
    }
}

#[cfg(target_os = "windows")]
fn example_tool_path() -> &'static str {
    r"C:\rclone\rclone.exe"
}

#[cfg(not(target_os = "windows"))]
fn example_tool_path() -> &'static str {
    "/usr/local/bin/rclone"
}

/// Kind of failure a message pattern points to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    ToolNotFound,
    Transfer,
}

/// Ordered `pattern -> kind` table, first match wins, matched case-insensitively.
///
/// Messages about missing configuration sections mean the tool was found but its
/// profile is broken, so they are listed before the "not found" wordings.
pub const ERROR_PATTERNS: &[(&str, ErrorKind)] = &[
    ("section in config file", ErrorKind::Transfer),
    ("config section", ErrorKind::Transfer),
    ("command not found", ErrorKind::ToolNotFound),
    ("system cannot find the file", ErrorKind::ToolNotFound),
    ("system cannot find the specified file", ErrorKind::ToolNotFound),
    ("is not recognized as an internal or external command", ErrorKind::ToolNotFound),
    ("系统找不到指定的文件", ErrorKind::ToolNotFound),
];

/// Kind of failure described by `message`, defaulting to a transfer error
pub fn classify_message(message: &str) -> ErrorKind {
    let lower = message.to_lowercase();
    ERROR_PATTERNS
        .iter()
        .find(|(pattern, _)| lower.contains(pattern))
        .map(|(_, kind)| *kind)
        .unwrap_or(ErrorKind::Transfer)
}

/// Prefixes of the transient progress lines printed by the sync tool
pub const PROGRESS_PREFIXES: &[&str] = &[
    "Transferred:",
    "Transferring:",
    "Elapsed time:",
    "Checking:",
    "Checks:",
    "Deleted:",
    "Renamed:",
    "Errors:",
];

/// Remove progress lines and blank lines from captured diagnostic output.
/// Returns `None` if nothing is left.
pub fn filter_progress(output: &str) -> Option<String> {
    let kept: Vec<&str> = output
        .split(['\n', '\r'])
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter(|line| !line.starts_with('*'))
        .filter(|line| !PROGRESS_PREFIXES.iter().any(|p| line.starts_with(p)))
        .collect();
    if kept.is_empty() {
        None
    } else {
        Some(kept.join("\n"))
    }
}

/// Reduce the captured result of a mirror invocation to an outcome
pub fn classify(output: &CommandOutput) -> SyncOutcome {
    match output.error_message() {
        Some(msg) => match classify_message(&msg) {
            ErrorKind::ToolNotFound => SyncOutcome::ToolNotFound(msg),
            ErrorKind::Transfer => SyncOutcome::TransferError(msg),
        },
        None if output.exit_error.is_some() => {
            SyncOutcome::TransferError("sync tool exited with an error".to_string())
        }
        None => SyncOutcome::Success {
            advisory: filter_progress(&output.stderr),
        },
    }
}
