use std::{ffi::OsString, process::ExitCode, sync::Arc};

use clap::Parser;
use futures::future::{AbortHandle, Abortable, BoxFuture};
use tokio::sync::{broadcast, RwLock};
use wsync::path::FsPathBuf;
use wsyncd::{
    credentials::{CredentialStore, DefaultSource},
    Controller, Shutdown, WorkspaceEvent,
};

#[cfg(unix)]
mod posix;

#[cfg(unix)]
fn main() -> ExitCode {
    posix::main()
}

#[cfg(not(unix))]
fn main() -> ExitCode {
    env_logger::init();

    let rt = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(rt) => rt,
        Err(err) => {
            eprintln!("Can't start the runtime: {err}");
            return ExitCode::FAILURE;
        }
    };
    rt.block_on(async move {
        let shutdown_ref = ShutdownRef::new();
        let shutdown = {
            let shutdown_ref = shutdown_ref.clone();
            tokio::spawn(async move {
                tokio::signal::ctrl_c().await?;
                log::warn!("received Ctrl-C");
                shutdown_ref.shutdown().await
            })
        };
        if let Err(err) = run(std::env::args_os().collect(), shutdown_ref).await {
            log::error!("{err:#}");
            return ExitCode::FAILURE;
        }
        match shutdown.await {
            Ok(res) => exit_program(res),
            Err(err) => exit_program(Err(err.into())),
        }
    })
}

#[derive(Clone)]
struct ShutdownRef {
    inner: Arc<RwLock<Option<Arc<dyn Shutdown>>>>,
}

impl ShutdownRef {
    fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(None)),
        }
    }

    async fn set(&self, inner: Arc<dyn Shutdown>) {
        let mut write = self.inner.write().await;
        *write = Some(inner);
    }

    async fn shutdown(&self) -> anyhow::Result<()> {
        let read = self.inner.read().await;
        match &*read {
            Some(inner) => inner.shutdown().await,
            None => Ok(()),
        }
    }
}

#[derive(Parser)]
#[command(name = "wsyncd")]
#[command(author, version, about, long_about=None)]
struct Cli {
    /// The workspace directory to mirror
    root: FsPathBuf,

    /// Settings file to use instead of the per-user one
    #[clap(long, short = 's')]
    settings: Option<FsPathBuf>,
}

/// Stops the controller, then the event loop
struct Daemon<T> {
    controller: Arc<T>,
    abort: AbortHandle,
}

impl<T> Shutdown for Daemon<T>
where
    T: Shutdown,
{
    fn shutdown(&self) -> BoxFuture<'_, anyhow::Result<()>> {
        Box::pin(async move {
            let res = self.controller.shutdown().await;
            self.abort.abort();
            res
        })
    }
}

async fn run(args: Vec<OsString>, shutdown_ref: ShutdownRef) -> anyhow::Result<()> {
    let cli = Cli::parse_from(args);

    let store = match cli.settings {
        Some(path) => CredentialStore::new(path, DefaultSource::Builtin),
        None => CredentialStore::for_user()?,
    };
    log::info!("Using settings file: {}", store.path());

    let (controller, mut events) = Controller::load(store).await?;
    let controller = Arc::new(controller);

    let mut log_rx = controller.subscribe_log();
    tokio::spawn(async move {
        loop {
            match log_rx.recv().await {
                Ok(line) => println!("{line}"),
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    log::warn!("{n} output lines were dropped");
                }
                Err(broadcast::error::RecvError::Closed) => break,
            }
        }
    });

    let (abort, reg) = AbortHandle::new_pair();
    shutdown_ref
        .set(Arc::new(Daemon {
            controller: controller.clone(),
            abort,
        }))
        .await;

    controller.open_workspace(&cli.root).await?;

    let event_loop = async move {
        while let Some(event) = events.recv().await {
            match event {
                WorkspaceEvent::Snapshot(tree) => {
                    let (files, folders) = tree.count();
                    log::info!("{}: {files} files in {folders} folders", tree.path());
                }
                WorkspaceEvent::Synced { root, outcome } => {
                    log::debug!("{root} synced: {outcome}");
                }
            }
        }
    };
    let _ = Abortable::new(event_loop, reg).await;
    log::info!("Exiting");
    Ok(())
}

pub fn exit_program(shutdown_res: anyhow::Result<()>) -> ExitCode {
    match shutdown_res {
        Ok(..) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("Error during wsyncd shutdown: {err:#}");
            ExitCode::FAILURE
        }
    }
}
