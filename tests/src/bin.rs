#![cfg(test)]

use std::sync::{Arc, Once};

use wsync::SyncCredentials;
use wsyncd::{tool::SyncTool, Engine, OutputLog};

mod harness;
mod utils;
mod stubs {
    pub mod remote;
    pub mod runner;
}
mod tests;

use harness::Harness;

static LOG_INIT: Once = Once::new();

/// Credentials complete enough to attempt a mirror
fn credentials() -> SyncCredentials {
    SyncCredentials {
        host: "10.0.0.5".to_string(),
        user: "dev".to_string(),
        secret: "hunter2".to_string(),
        ..Default::default()
    }
}

async fn harness() -> Harness {
    LOG_INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });

    let workspace = utils::TempDir::new("wsync-ws").await;
    workspace.write("main.py", "print('main')\n").await;
    workspace.write("src/util.py", "X = 1\n").await;

    let remote = stubs::remote::Stub::default();
    let runner = stubs::runner::Stub::default();
    let engine = Engine::new(
        remote.clone(),
        SyncTool::new(runner.clone()),
        OutputLog::new(),
    );

    Harness {
        engine: Arc::new(engine),
        remote,
        runner,
        workspace,
    }
}
