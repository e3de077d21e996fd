//! Watches a workspace for changes and emits fresh snapshots.
//!
//! Every directory of the workspace is watched non-recursively. The watch
//! primitive forwards [Change]s into a channel consumed by a single dispatcher
//! task, which owns the [WatchSet], rebuilds the snapshot and arms directories
//! as they appear. Watch failures only stop the watching of the affected subtree.

use std::collections::BTreeSet;

use futures::{
    future::{AbortHandle, Abortable},
    Future,
};
use notify::event::{EventKind, ModifyKind, RemoveKind, RenameMode};
use tokio::sync::mpsc;
use wsync::{
    path::{self, FsPath, FsPathBuf},
    tree::TreeNode,
};

use crate::snapshot;

/// The directory watch primitive
pub trait Watch: Send + 'static {
    /// Start watching `path`, not its subdirectories
    fn watch(&mut self, path: &FsPath) -> anyhow::Result<()>;
    fn unwatch(&mut self, path: &FsPath) -> anyhow::Result<()>;
}

impl Watch for notify::RecommendedWatcher {
    fn watch(&mut self, path: &FsPath) -> anyhow::Result<()> {
        notify::Watcher::watch(self, path.as_std_path(), notify::RecursiveMode::NonRecursive)?;
        Ok(())
    }

    fn unwatch(&mut self, path: &FsPath) -> anyhow::Result<()> {
        notify::Watcher::unwatch(self, path.as_std_path())?;
        Ok(())
    }
}

/// A filesystem mutation reported for a watched directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Change {
    Created(FsPathBuf),
    Removed(FsPathBuf),
    Modified(FsPathBuf),
    Renamed { from: FsPathBuf, to: FsPathBuf },
    Other(FsPathBuf),
}

impl Change {
    /// Path that may have become a new directory
    fn appeared(&self) -> Option<&FsPath> {
        match self {
            Change::Created(path) => Some(path),
            Change::Renamed { to, .. } => Some(to),
            _ => None,
        }
    }

    /// Path that may have stopped being a directory
    fn vanished(&self) -> Option<&FsPath> {
        match self {
            Change::Removed(path) => Some(path),
            Change::Renamed { from, .. } => Some(from),
            _ => None,
        }
    }
}

pub fn map_event(event: notify::Event) -> Option<Change> {
    let mut paths = event
        .paths
        .into_iter()
        .filter_map(|p| FsPathBuf::try_from(p).ok());
    let primary = paths.next()?;

    let change = match event.kind {
        EventKind::Modify(ModifyKind::Name(RenameMode::Both)) => match paths.next() {
            Some(to) => Change::Renamed { from: primary, to },
            None => Change::Other(primary),
        },
        EventKind::Modify(ModifyKind::Name(RenameMode::From)) => Change::Removed(primary),
        EventKind::Modify(ModifyKind::Name(RenameMode::To)) => Change::Created(primary),
        EventKind::Modify(_) => Change::Modified(primary),
        EventKind::Create(_) => Change::Created(primary),
        EventKind::Remove(RemoveKind::File)
        | EventKind::Remove(RemoveKind::Folder)
        | EventKind::Remove(RemoveKind::Any) => Change::Removed(primary),
        EventKind::Access(_) => return None,
        _ => Change::Other(primary),
    };
    Some(change)
}

/// The set of armed directory watches. At most one watch per directory.
pub struct WatchSet<W: Watch> {
    watch: W,
    armed: BTreeSet<FsPathBuf>,
}

impl<W: Watch> WatchSet<W> {
    pub fn new(watch: W) -> Self {
        Self {
            watch,
            armed: BTreeSet::new(),
        }
    }

    pub fn is_armed(&self, path: &FsPath) -> bool {
        self.armed.contains(path)
    }

    pub fn len(&self) -> usize {
        self.armed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }

    pub fn paths(&self) -> impl Iterator<Item = &FsPath> {
        self.armed.iter().map(|p| p.as_path())
    }

    /// Watch the directory at `path`. No-op if it is already watched.
    /// Returns whether the directory is watched after the call.
    pub fn arm(&mut self, path: &FsPath) -> bool {
        if self.armed.contains(path) {
            return true;
        }
        match self.watch.watch(path) {
            Ok(()) => {
                log::trace!("watching {path}");
                self.armed.insert(path.to_owned());
                true
            }
            Err(err) => {
                log::debug!("can't watch {path}: {err:#}");
                false
            }
        }
    }

    /// Drop the watches of `root` and of every directory below it
    pub fn disarm_within(&mut self, root: &FsPath) {
        let within: Vec<FsPathBuf> = self
            .armed
            .iter()
            .filter(|p| path::is_within(p, root))
            .cloned()
            .collect();
        for p in within {
            self.armed.remove(&p);
            if let Err(err) = self.watch.unwatch(&p) {
                log::trace!("unwatch {p}: {err:#}");
            }
        }
    }

    pub fn disarm_all(&mut self) {
        for p in std::mem::take(&mut self.armed) {
            if let Err(err) = self.watch.unwatch(&p) {
                log::trace!("unwatch {p}: {err:#}");
            }
        }
    }

    /// Re-arm `root` and every directory existing below it.
    /// Returns the snapshot of `root` used to find the directories.
    pub async fn arm_recursive(&mut self, root: &FsPath) -> Option<TreeNode> {
        self.disarm_within(root);
        let tree = snapshot::build(root).await?;
        for dir in tree.folder_paths() {
            self.arm(dir);
        }
        Some(tree)
    }
}

impl<W: Watch> Drop for WatchSet<W> {
    fn drop(&mut self) {
        self.disarm_all();
    }
}

/// Watch set bound to a workspace root
pub struct ChangeWatcher<W: Watch> {
    root: FsPathBuf,
    set: WatchSet<W>,
}

impl<W: Watch> ChangeWatcher<W> {
    pub fn new(root: FsPathBuf, watch: W) -> Self {
        Self {
            root,
            set: WatchSet::new(watch),
        }
    }

    pub fn root(&self) -> &FsPath {
        &self.root
    }

    pub fn watch_set(&self) -> &WatchSet<W> {
        &self.set
    }

    /// Arm the whole workspace, returning its snapshot
    pub async fn start(&mut self) -> Option<TreeNode> {
        let root = self.root.clone();
        self.set.arm_recursive(&root).await
    }

    /// React to one change: update the watches and rebuild the snapshot
    pub async fn handle(&mut self, change: &Change) -> Option<TreeNode> {
        log::trace!("change: {change:?}");
        if let Some(gone) = change.vanished() {
            if self.set.is_armed(gone) {
                self.set.disarm_within(gone);
            }
        }
        if let Some(new) = change.appeared() {
            let is_dir = tokio::fs::metadata(new)
                .await
                .map(|md| md.is_dir())
                .unwrap_or(false);
            if is_dir && path::is_within(new, &self.root) {
                self.set.arm_recursive(new).await;
            }
        }
        snapshot::build(&self.root).await
    }
}

/// Handle to a running watcher. Dropping it stops the watching.
pub struct WatcherHandle {
    abort: AbortHandle,
}

impl WatcherHandle {
    pub fn stop(&self) {
        self.abort.abort();
    }
}

impl Drop for WatcherHandle {
    fn drop(&mut self) {
        self.abort.abort();
    }
}

/// Watch `root` with the platform watcher and pass every new snapshot to `sink`
pub async fn spawn<F>(root: FsPathBuf, sink: F) -> anyhow::Result<WatcherHandle>
where
    F: Fn(TreeNode) + Send + 'static,
{
    spawn_with(root, notify_watch, sink).await
}

fn notify_watch(tx: mpsc::UnboundedSender<Change>) -> anyhow::Result<notify::RecommendedWatcher> {
    let watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| match res {
        Ok(event) => {
            if let Some(change) = map_event(event) {
                let _ = tx.send(change);
            }
        }
        Err(err) => log::debug!("watch error: {err}"),
    })?;
    Ok(watcher)
}

/// Same as [spawn], with the watch primitive built by `make_watch` from the
/// sender side of the change channel.
pub async fn spawn_with<W, M, F>(
    root: FsPathBuf,
    make_watch: M,
    sink: F,
) -> anyhow::Result<WatcherHandle>
where
    W: Watch,
    M: FnOnce(mpsc::UnboundedSender<Change>) -> anyhow::Result<W>,
    F: Fn(TreeNode) + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let watch = make_watch(tx)?;
    let mut watcher = ChangeWatcher::new(root, watch);
    if watcher.start().await.is_none() {
        anyhow::bail!("{} is not a readable directory", watcher.root());
    }
    log::info!(
        "watching {} directories under {}",
        watcher.watch_set().len(),
        watcher.root()
    );

    let (abort, reg) = AbortHandle::new_pair();
    tokio::spawn(Abortable::new(dispatch(watcher, rx, sink), reg));
    Ok(WatcherHandle { abort })
}

fn dispatch<W, F>(
    mut watcher: ChangeWatcher<W>,
    mut rx: mpsc::UnboundedReceiver<Change>,
    sink: F,
) -> impl Future<Output = ()> + Send
where
    W: Watch,
    F: Fn(TreeNode) + Send + 'static,
{
    async move {
        while let Some(change) = rx.recv().await {
            if let Some(tree) = watcher.handle(&change).await {
                sink(tree);
            }
        }
        log::debug!("watcher of {} stopped", watcher.root());
    }
}
