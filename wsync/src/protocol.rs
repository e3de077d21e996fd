//! Messages exchanged with the remote run server.
//!
//! Every call is a JSON object `{ "action": ..., ...fields }` POSTed to the server,
//! answered with a JSON object.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum Request {
    /// Make sure the folder mirroring a workspace exists
    CheckFolder { folder_name: String },
    /// Execute a file of a mirrored workspace
    RunCode {
        folder_name: String,
        file_path: String,
        content: String,
    },
}

/// Reply to [Request::CheckFolder]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderResponse {
    pub success: bool,
    #[serde(default)]
    pub folder_path: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Reply to [Request::RunCode]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunResponse {
    pub success: bool,
    #[serde(default)]
    pub output: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub returncode: Option<i32>,
}

/// A request to run one file remotely
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunRequest {
    pub folder_name: String,
    pub relative_file_path: String,
    pub content: String,
}

impl From<RunRequest> for Request {
    fn from(value: RunRequest) -> Self {
        Request::RunCode {
            folder_name: value.folder_name,
            file_path: value.relative_file_path,
            content: value.content,
        }
    }
}

/// Outcome of a remote run, as relayed to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

impl From<RunResponse> for RunResult {
    fn from(value: RunResponse) -> Self {
        Self {
            success: value.success,
            stdout: value.output.unwrap_or_default(),
            stderr: value.error.unwrap_or_default(),
            exit_code: value.returncode,
        }
    }
}
