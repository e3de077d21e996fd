//! Running a workspace file on the remote server.

use std::fmt;

use wsync::{
    path::{self, FsPath},
    protocol::{RunRequest, RunResult},
    Error, SyncCredentials, SyncOutcome,
};

use crate::{engine::Engine, remote::Remote, tool::CommandRunner};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunError {
    /// The request could not be formed locally
    Config(String),
    /// The mirror preceding the run did not succeed
    Sync(SyncOutcome),
    /// The server did not answer the run request
    NoResponse(String),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Config(msg) => write!(f, "Can't run: {msg}"),
            Self::Sync(outcome) => write!(f, "Can't run, sync failed: {outcome}"),
            Self::NoResponse(msg) => write!(f, "No response from server: {msg}"),
        }
    }
}

impl std::error::Error for RunError {}

/// Mirror the workspace, then run `file` on the remote server.
///
/// The run request is only sent after a successful mirror, so the server never
/// executes against a stale tree. Both the relative path and the in-editor
/// `content` are sent.
pub async fn run_remote<R, C>(
    engine: &Engine<R, C>,
    root: Option<&FsPath>,
    credentials: &SyncCredentials,
    file: &FsPath,
    content: String,
) -> Result<RunResult, RunError>
where
    R: Remote,
    C: CommandRunner,
{
    run_remote_while(engine, root, credentials, file, content, || true).await
}

/// Same as [run_remote], dropping the run as soon as `is_current` turns false.
///
/// `is_current` is checked once the mirror is done, before anything is reported
/// or sent, and again when the server answers. A dropped run yields
/// `RunError::Sync(SyncOutcome::Discarded)`.
pub async fn run_remote_while<R, C, F>(
    engine: &Engine<R, C>,
    root: Option<&FsPath>,
    credentials: &SyncCredentials,
    file: &FsPath,
    content: String,
    is_current: F,
) -> Result<RunResult, RunError>
where
    R: Remote,
    C: CommandRunner,
    F: Fn() -> bool,
{
    let log = engine.log();
    let request = build_request(root, file, content)?;

    let outcome = engine.mirror(root, credentials).await;
    if !is_current() {
        log::info!("workspace changed, not running {}", request.relative_file_path);
        return Err(RunError::Sync(SyncOutcome::Discarded));
    }
    engine.report(&outcome);
    if !outcome.is_success() {
        log.append(format!("Not running {}: sync did not complete", request.relative_file_path));
        return Err(RunError::Sync(outcome));
    }

    log.append(format!("Running {} on {}", request.relative_file_path, credentials.host));
    let response = engine
        .remote()
        .run_code(&credentials.host, request)
        .await
        .map_err(|err| match err {
            Error::NoResponse(msg) => RunError::NoResponse(msg),
            Error::Config(msg) => RunError::Config(msg),
            // a reply that can't be understood is as good as none
            other => RunError::NoResponse(other.to_string()),
        });
    if !is_current() {
        log::info!("workspace changed during run of {file}, dropping result");
        return Err(RunError::Sync(SyncOutcome::Discarded));
    }
    let result = match response {
        Ok(response) => RunResult::from(response),
        Err(err) => {
            log.append(err.to_string());
            return Err(err);
        }
    };

    match result.exit_code {
        Some(code) if result.success => log.append(format!("Run completed (exit code {code})")),
        Some(code) => log.append(format!("Run failed (exit code {code})")),
        None if result.success => log.append("Run completed"),
        None => log.append("Run failed"),
    }
    Ok(result)
}

fn build_request(
    root: Option<&FsPath>,
    file: &FsPath,
    content: String,
) -> Result<RunRequest, RunError> {
    let root = root.ok_or_else(|| RunError::Config("no workspace is open".to_string()))?;
    let folder_name = path::folder_name(root)
        .ok_or_else(|| RunError::Config(format!("can't name a remote folder after {root}")))?;
    let relative_file_path = path::remote_relative(root, file)
        .ok_or_else(|| RunError::Config(format!("{file} is not in the workspace {root}")))?;
    Ok(RunRequest {
        folder_name: folder_name.to_string(),
        relative_file_path,
        content,
    })
}
