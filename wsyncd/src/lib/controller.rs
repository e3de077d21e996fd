//! The workspace controller: owns the state of one open workspace and funnels
//! every mirror through the engine.

use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};

use anyhow::Context;
use futures::future::BoxFuture;
use tokio::sync::{mpsc, RwLock};
use wsync::{
    path::{FsPath, FsPathBuf},
    protocol::RunResult,
    tree::TreeNode,
    SyncCredentials, SyncOutcome,
};

use crate::{
    credentials::CredentialStore,
    engine::Engine,
    output::{LogLine, OutputLog},
    remote::{HttpRemote, Remote},
    run::{self, RunError},
    scheduler::Scheduler,
    snapshot,
    tool::{CommandRunner, ProcessRunner, SyncTool},
    watcher::{self, WatcherHandle},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkspaceEvent {
    /// The workspace tree changed
    Snapshot(TreeNode),
    /// A mirror of the workspace finished
    Synced {
        root: FsPathBuf,
        outcome: SyncOutcome,
    },
}

/// Everything tied to the open workspace
#[derive(Default)]
pub struct EngineState {
    root: Option<FsPathBuf>,
    /// Bumped each time a workspace is opened, to spot late results.
    /// Shared so that running operations can check it without the lock.
    generation: Arc<AtomicU64>,
    credentials: SyncCredentials,
    watcher: Option<WatcherHandle>,
    scheduler: Scheduler,
}

impl EngineState {
    pub fn new(credentials: SyncCredentials) -> Self {
        Self {
            credentials,
            ..Default::default()
        }
    }

    pub fn root(&self) -> Option<&FsPath> {
        self.root.as_deref()
    }

    pub fn credentials(&self) -> &SyncCredentials {
        &self.credentials
    }

    /// Current generation, with the shared counter to compare it with later
    fn current_generation(&self) -> (u64, Arc<AtomicU64>) {
        (self.generation.load(Ordering::SeqCst), self.generation.clone())
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    pub fn auto_sync_interval(&self) -> Option<u64> {
        self.scheduler.interval()
    }
}

pub struct Controller<R, C> {
    engine: Arc<Engine<R, C>>,
    store: CredentialStore,
    state: Arc<RwLock<EngineState>>,
    events: mpsc::UnboundedSender<WorkspaceEvent>,
}

impl Controller<HttpRemote, ProcessRunner> {
    /// Controller talking to the real server and sync tool, with the settings
    /// loaded from `store`
    pub async fn load(
        store: CredentialStore,
    ) -> anyhow::Result<(Self, mpsc::UnboundedReceiver<WorkspaceEvent>)> {
        let credentials = store.load().await.context("Failed to load settings")?;
        log::debug!("Loaded settings: {credentials:?}");
        let engine = Engine::new(
            HttpRemote::new()?,
            SyncTool::new(ProcessRunner),
            OutputLog::new(),
        );
        Ok(Self::new(engine, store, credentials))
    }
}

impl<R, C> Controller<R, C>
where
    R: Remote,
    C: CommandRunner,
{
    pub fn new(
        engine: Engine<R, C>,
        store: CredentialStore,
        credentials: SyncCredentials,
    ) -> (Self, mpsc::UnboundedReceiver<WorkspaceEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let controller = Self {
            engine: Arc::new(engine),
            store,
            state: Arc::new(RwLock::new(EngineState::new(credentials))),
            events,
        };
        (controller, rx)
    }

    pub fn engine(&self) -> &Engine<R, C> {
        &self.engine
    }

    pub fn log(&self) -> &OutputLog {
        self.engine.log()
    }

    pub fn subscribe_log(&self) -> tokio::sync::broadcast::Receiver<LogLine> {
        self.engine.log().subscribe()
    }

    pub async fn root(&self) -> Option<FsPathBuf> {
        self.state.read().await.root.clone()
    }

    pub async fn credentials(&self) -> SyncCredentials {
        self.state.read().await.credentials.clone()
    }

    /// Read-only access to the state, for inspection
    pub async fn with_state<T>(&self, f: impl FnOnce(&EngineState) -> T) -> T {
        let state = self.state.read().await;
        f(&state)
    }

    /// Open `root` as the workspace, replacing the previous one.
    ///
    /// Watches of the previous workspace are released, the new one is watched,
    /// mirrored once and then on the configured interval.
    pub async fn open_workspace(&self, root: &FsPath) -> anyhow::Result<TreeNode> {
        let root = tokio::fs::canonicalize(root)
            .await
            .with_context(|| format!("Can't open workspace {root}"))?;
        let root = FsPathBuf::try_from(root)?;
        let tree = snapshot::build(&root)
            .await
            .with_context(|| format!("{root} is not a readable directory"))?;

        let mut state = self.state.write().await;
        state.watcher = None;
        state.scheduler.disarm();
        state.root = Some(root.clone());
        state.generation.fetch_add(1, Ordering::SeqCst);

        let events = self.events.clone();
        let sink = move |tree| {
            let _ = events.send(WorkspaceEvent::Snapshot(tree));
        };
        match watcher::spawn(root.clone(), sink).await {
            Ok(handle) => state.watcher = Some(handle),
            Err(err) => log::warn!("Not watching {root}: {err:#}"),
        }

        self.log().append(format!("Opened workspace {root}"));
        let _ = self.events.send(WorkspaceEvent::Snapshot(tree.clone()));

        if state.credentials.interval_seconds > 0 {
            // the first tick is the initial mirror
            self.arm_scheduler(&mut state);
        } else {
            let engine = self.engine.clone();
            let shared = self.state.clone();
            let events = self.events.clone();
            tokio::spawn(async move {
                sync_current(&engine, &shared, &events).await;
            });
        }
        Ok(tree)
    }

    /// Fresh snapshot of the open workspace
    pub async fn snapshot(&self) -> Option<TreeNode> {
        let root = self.root().await?;
        snapshot::build(&root).await
    }

    /// Mirror the open workspace now
    pub async fn sync_now(&self) -> SyncOutcome {
        sync_current(&self.engine, &self.state, &self.events).await
    }

    /// Persist new credentials, re-provision the sync tool and restart the
    /// auto-sync timer with the new interval
    pub async fn apply_credentials(&self, credentials: SyncCredentials) -> anyhow::Result<()> {
        self.store.save(&credentials, self.engine.tool()).await?;
        let mut state = self.state.write().await;
        state.credentials = credentials;
        if state.root.is_some() {
            self.arm_scheduler(&mut state);
        }
        self.log().append("Settings applied");
        Ok(())
    }

    /// Mirror the workspace and run `file` remotely
    pub async fn run_remote(&self, file: &FsPath, content: String) -> Result<RunResult, RunError> {
        let (root, (expected, generation), credentials) = {
            let state = self.state.read().await;
            (
                state.root.clone(),
                state.current_generation(),
                state.credentials.clone(),
            )
        };
        run::run_remote_while(
            &self.engine,
            root.as_deref(),
            &credentials,
            file,
            content,
            || generation.load(Ordering::SeqCst) == expected,
        )
        .await
    }

    fn arm_scheduler(&self, state: &mut EngineState) {
        let engine = self.engine.clone();
        let shared = Arc::downgrade(&self.state);
        let events = self.events.clone();
        state
            .scheduler
            .arm(state.credentials.interval_seconds, move || {
                let engine = engine.clone();
                let shared = shared.clone();
                let events = events.clone();
                async move {
                    if let Some(shared) = shared.upgrade() {
                        sync_current(&engine, &shared, &events).await;
                    }
                }
            });
    }
}

/// Mirror whatever workspace is open. The outcome is reported, unless the
/// workspace was replaced in the meantime, in which case it is discarded.
async fn sync_current<R, C>(
    engine: &Engine<R, C>,
    state: &RwLock<EngineState>,
    events: &mpsc::UnboundedSender<WorkspaceEvent>,
) -> SyncOutcome
where
    R: Remote,
    C: CommandRunner,
{
    let (root, (expected, generation), credentials) = {
        let state = state.read().await;
        (
            state.root.clone(),
            state.current_generation(),
            state.credentials.clone(),
        )
    };
    let outcome = engine.mirror(root.as_deref(), &credentials).await;

    if generation.load(Ordering::SeqCst) != expected {
        log::info!("workspace changed during sync, dropping result");
        return SyncOutcome::Discarded;
    }
    engine.report(&outcome);
    if let (Some(root), false) = (root, outcome == SyncOutcome::InProgress) {
        let _ = events.send(WorkspaceEvent::Synced {
            root,
            outcome: outcome.clone(),
        });
    }
    outcome
}

impl<R, C> crate::Shutdown for Controller<R, C>
where
    R: Remote,
    C: CommandRunner,
{
    fn shutdown(&self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            log::info!("Shutting controller down");
            let mut state = self.state.write().await;
            state.scheduler.disarm();
            state.watcher = None;
            Ok(())
        })
    }
}
