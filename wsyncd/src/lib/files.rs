//! File access for the editor.

use anyhow::Context;
use wsync::path::FsPath;

use crate::credentials::write_atomic;

pub async fn read_file(path: &FsPath) -> anyhow::Result<String> {
    if !path.is_absolute() {
        anyhow::bail!("Expected an absolute path: {path}");
    }
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {path}"))
}

pub async fn write_file(path: &FsPath, content: &str) -> anyhow::Result<()> {
    if !path.is_absolute() {
        anyhow::bail!("Expected an absolute path: {path}");
    }
    log::debug!("writing {path}");
    write_atomic(path, content.as_bytes()).await
}
