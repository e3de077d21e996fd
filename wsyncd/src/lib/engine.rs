//! The sync engine: mirrors a workspace to its remote folder.

use std::{collections::HashSet, sync::Mutex};

use wsync::{
    outcome,
    path::{self, FsPath, FsPathBuf},
    Error, SyncCredentials, SyncOutcome,
};

use crate::{
    output::OutputLog,
    remote::{self, Remote},
    tool::{CommandRunner, SyncTool},
};

/// Marks a root as being mirrored until dropped
struct InFlight<'a> {
    roots: &'a Mutex<HashSet<FsPathBuf>>,
    root: FsPathBuf,
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        let mut roots = self.roots.lock().unwrap_or_else(|e| e.into_inner());
        roots.remove(&self.root);
    }
}

#[derive(Debug)]
pub struct Engine<R, C> {
    remote: R,
    tool: SyncTool<C>,
    log: OutputLog,
    in_flight: Mutex<HashSet<FsPathBuf>>,
}

impl<R, C> Engine<R, C> {
    pub fn new(remote: R, tool: SyncTool<C>, log: OutputLog) -> Self {
        Self {
            remote,
            tool,
            log,
            in_flight: Mutex::new(HashSet::new()),
        }
    }

    pub fn remote(&self) -> &R {
        &self.remote
    }

    pub fn tool(&self) -> &SyncTool<C> {
        &self.tool
    }

    pub fn log(&self) -> &OutputLog {
        &self.log
    }

    /// Whether a mirror of `root` is running
    pub fn is_syncing(&self, root: &FsPath) -> bool {
        let roots = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        roots.contains(root)
    }

    fn try_begin(&self, root: &FsPath) -> Option<InFlight<'_>> {
        let mut roots = self.in_flight.lock().unwrap_or_else(|e| e.into_inner());
        if roots.insert(root.to_owned()) {
            Some(InFlight {
                roots: &self.in_flight,
                root: root.to_owned(),
            })
        } else {
            None
        }
    }
}

impl<R, C> Engine<R, C>
where
    R: Remote,
    C: CommandRunner,
{
    /// Mirror the workspace at `root` to the remote server and report the outcome
    /// to the output log.
    ///
    /// Never fails: every failure is reduced to a [SyncOutcome]. A call made while
    /// a mirror of the same root is running returns [SyncOutcome::InProgress]
    /// without doing anything.
    pub async fn sync_workspace(
        &self,
        root: Option<&FsPath>,
        credentials: &SyncCredentials,
    ) -> SyncOutcome {
        let outcome = self.mirror(root, credentials).await;
        self.report(&outcome);
        outcome
    }

    /// Same as [Engine::sync_workspace], without reporting the outcome.
    /// The caller decides whether the outcome is still relevant and [reports](Engine::report) it.
    pub async fn mirror(&self, root: Option<&FsPath>, credentials: &SyncCredentials) -> SyncOutcome {
        let Some(root) = root else {
            return SyncOutcome::ConfigurationError("no workspace is open".to_string());
        };
        if !credentials.is_complete() {
            return SyncOutcome::ConfigurationError(
                "server address and user name must be set".to_string(),
            );
        }
        let Some(_in_flight) = self.try_begin(root) else {
            return SyncOutcome::InProgress;
        };

        let Some(folder_name) = path::folder_name(root) else {
            return SyncOutcome::ConfigurationError(format!("can't name a remote folder after {root}"));
        };

        self.log.append(format!(
            "Checking remote folder {folder_name} on {}",
            credentials.host
        ));
        let reply = self.remote.check_folder(&credentials.host, folder_name).await;
        match reply.and_then(remote::folder_path) {
            Ok(folder_path) if folder_path.is_empty() => {
                self.log.append("Remote folder ready");
            }
            Ok(folder_path) => {
                self.log.append(format!("Remote folder ready: {folder_path}"));
            }
            Err(Error::NoResponse(msg)) => return SyncOutcome::NoResponse(msg),
            Err(Error::Config(msg)) => return SyncOutcome::ConfigurationError(msg),
            Err(Error::Remote(msg)) => return SyncOutcome::RemoteFolderError(msg),
            Err(err) => return SyncOutcome::RemoteFolderError(err.to_string()),
        }

        let exe = self.tool.executable(credentials);
        self.log.append(format!(
            "Mirroring {root} to {} with {exe}",
            crate::tool::mirror_target(folder_name)
        ));
        let output = self.tool.mirror(credentials, root.as_str(), folder_name).await;
        log::trace!(target: "sync", "sync tool output: {output:?}");

        outcome::classify(&output)
    }

    /// Append `outcome` and its guidance to the output log
    pub fn report(&self, outcome: &SyncOutcome) {
        match outcome {
            SyncOutcome::InProgress => {
                log::debug!(target: "sync", "sync already in progress");
            }
            SyncOutcome::Discarded => {}
            outcome => {
                self.log.append(outcome.to_string());
                if let Some(guidance) = outcome.guidance() {
                    self.log.append(guidance);
                }
            }
        }
    }
}
