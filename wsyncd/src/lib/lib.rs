use futures::future::BoxFuture;

pub mod controller;
pub mod credentials;
pub mod engine;
pub mod files;
pub mod output;
pub mod remote;
pub mod run;
pub mod scheduler;
pub mod snapshot;
pub mod tool;
pub mod watcher;

pub use controller::{Controller, WorkspaceEvent};
pub use engine::Engine;
pub use output::OutputLog;

pub trait Shutdown: Sync + Send + 'static {
    fn shutdown(&self) -> BoxFuture<'_, anyhow::Result<()>>;
}
