use std::fmt;

use serde::{Deserialize, Serialize};

pub mod config;
pub mod explorer;
pub mod loc;
pub mod outcome;
pub mod path;
pub mod protocol;
pub mod tabs;
pub mod tree;

mod error;

pub use crate::config::SyncCredentials;
pub use crate::error::*;
pub use crate::outcome::{CommandOutput, SyncOutcome};

/// Port the remote run server listens on
pub const REMOTE_PORT: u16 = 5000;

/// Directory on the remote host under which workspace folders are mirrored
pub const REMOTE_BASE_PATH: &str = "/srv/wsync";

/// Name of the sync tool profile holding the remote connection
pub const PROFILE_NAME: &str = "wsync";

/// Base name of the sync tool executable, without extension
pub const TOOL_BASE_NAME: &str = "rclone";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeKind {
    File,
    Folder,
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::File => f.write_str("file"),
            NodeKind::Folder => f.write_str("folder"),
        }
    }
}
