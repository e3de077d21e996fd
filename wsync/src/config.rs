use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::path::FsPath;

/// Settings compiled into the binaries, used when no bundled default file ships
/// alongside the executable.
pub const BUILTIN_DEFAULT: &str = r#"{
    "ip": "",
    "user": "",
    "pass": "",
    "rclonePath": "rclone",
    "syncInterval": 0
}
"#;

/// Remote endpoint and sync tool settings.
///
/// Persisted as a flat record: `{ ip, user, pass, rclonePath, syncInterval }`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCredentials {
    #[serde(rename = "ip", default)]
    pub host: String,
    #[serde(default)]
    pub user: String,
    #[serde(rename = "pass", default)]
    pub secret: String,
    #[serde(rename = "rclonePath", default = "default_tool_path")]
    pub sync_tool_path: String,
    #[serde(rename = "syncInterval", default)]
    pub interval_seconds: u64,
}

fn default_tool_path() -> String {
    crate::TOOL_BASE_NAME.to_string()
}

impl Default for SyncCredentials {
    fn default() -> Self {
        Self {
            host: String::new(),
            user: String::new(),
            secret: String::new(),
            sync_tool_path: default_tool_path(),
            interval_seconds: 0,
        }
    }
}

// the secret stays out of logs
impl std::fmt::Debug for SyncCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncCredentials")
            .field("host", &self.host)
            .field("user", &self.user)
            .field("secret", &if self.secret.is_empty() { "" } else { "***" })
            .field("sync_tool_path", &self.sync_tool_path)
            .field("interval_seconds", &self.interval_seconds)
            .finish()
    }
}

impl SyncCredentials {
    /// Whether the remote identity is complete enough to attempt a mirror
    pub fn is_complete(&self) -> bool {
        !self.host.trim().is_empty() && !self.user.trim().is_empty()
    }

    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub async fn load_from_file(path: &FsPath) -> anyhow::Result<Self> {
        let json = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read settings from {path}"))?;
        Self::from_json(&json).with_context(|| format!("Failed to parse settings in {path}"))
    }
}
