use std::time::Duration;

use tokio::time::timeout;
use wsync::{
    path::FsPath,
    protocol::{FolderResponse, RunResponse},
    CommandOutput, Error, SyncCredentials, SyncOutcome,
};
use wsyncd::{
    credentials::{CredentialStore, DefaultSource},
    run::RunError,
    tool::SyncTool,
    WorkspaceEvent,
};

use crate::{credentials, harness, stubs, utils, Harness};

#[tokio::test]
async fn sync_mirrors_to_remote_folder() {
    let h = harness().await;
    let outcome = h.sync(&credentials()).await;
    assert_eq!(outcome, SyncOutcome::Success { advisory: None });

    let name = h.root().file_name().unwrap().to_string();
    assert_eq!(h.remote.checked(), vec![("10.0.0.5".to_string(), name.clone())]);

    let calls = h.runner.sync_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(
        calls[0],
        vec![
            "sync".to_string(),
            h.root().to_string(),
            format!("wsync:/srv/wsync/{name}"),
            "--progress".to_string(),
        ]
    );
    assert!(h.output_contains("Sync completed"));
}

#[tokio::test]
async fn sync_without_host_contacts_nothing() {
    let h = harness().await;
    let creds = SyncCredentials {
        host: String::new(),
        ..credentials()
    };
    let outcome = h.sync(&creds).await;
    assert!(matches!(outcome, SyncOutcome::ConfigurationError(_)));
    assert!(h.remote.checked().is_empty());
    assert!(h.runner.calls().is_empty());
}

#[tokio::test]
async fn sync_without_root_is_config_error() {
    let h = harness().await;
    let outcome = h.engine.sync_workspace(None, &credentials()).await;
    assert!(matches!(outcome, SyncOutcome::ConfigurationError(_)));
    assert!(h.remote.checked().is_empty());
}

#[tokio::test]
async fn concurrent_syncs_never_overlap() {
    let h = harness().await;
    h.remote.set_delay(Duration::from_millis(100));
    h.runner.set_delay(Duration::from_millis(100));
    let creds = credentials();

    let (a, b) = tokio::join!(h.sync(&creds), h.sync(&creds));
    let outcomes = [a, b];
    assert_eq!(
        outcomes
            .iter()
            .filter(|o| **o == SyncOutcome::InProgress)
            .count(),
        1
    );
    assert_eq!(outcomes.iter().filter(|o| o.is_success()).count(), 1);
    assert_eq!(h.remote.max_active(), 1);
    assert_eq!(h.runner.max_active(), 1);
    assert!(!h.engine.is_syncing(h.root()));

    // the guard is released once done
    assert!(h.sync(&creds).await.is_success());
    assert_eq!(h.runner.sync_calls().len(), 2);
}

#[tokio::test]
async fn folder_error_skips_mirror() {
    let h = harness().await;
    h.remote.set_folder_reply(Ok(FolderResponse {
        success: false,
        folder_path: None,
        error: Some("disk full".to_string()),
    }));
    let outcome = h.sync(&credentials()).await;
    assert_eq!(outcome, SyncOutcome::RemoteFolderError("disk full".to_string()));
    assert!(h.runner.sync_calls().is_empty());
}

#[tokio::test]
async fn unreachable_server_is_no_response() {
    let h = harness().await;
    h.remote
        .set_folder_reply(Err(Error::NoResponse("connection refused".to_string())));
    let outcome = h.sync(&credentials()).await;
    assert_eq!(
        outcome,
        SyncOutcome::NoResponse("connection refused".to_string())
    );
    assert!(h.runner.sync_calls().is_empty());
}

#[tokio::test]
async fn missing_tool_reports_guidance() {
    let h = harness().await;
    h.runner
        .set_sync_output(CommandOutput::failure("rclone: command not found", ""));
    let outcome = h.sync(&credentials()).await;
    assert!(matches!(outcome, SyncOutcome::ToolNotFound(_)));
    assert!(h.output_contains("rclone.org/downloads"));
}

#[tokio::test]
async fn broken_profile_is_transfer_error() {
    let h = harness().await;
    h.runner.set_sync_output(CommandOutput::failure(
        "exit status: 1",
        "Failed to create file system: didn't find section in config file",
    ));
    let outcome = h.sync(&credentials()).await;
    assert!(matches!(outcome, SyncOutcome::TransferError(_)));
}

#[tokio::test]
async fn progress_noise_is_not_an_error() {
    let h = harness().await;
    h.runner.set_sync_output(CommandOutput::success(
        "",
        "Transferred:   1 / 1, 100%\r\nChecks:   2 / 2, 100%\n\n",
    ));
    let outcome = h.sync(&credentials()).await;
    assert_eq!(outcome, SyncOutcome::Success { advisory: None });
}

#[tokio::test]
async fn run_sends_relative_path_and_content() {
    let h = harness().await;
    h.remote.set_run_reply(Ok(RunResponse {
        success: true,
        output: Some("X = 1\n".to_string()),
        error: None,
        returncode: Some(0),
    }));

    let result = h
        .run(&credentials(), "src/util.py", "print(X)\n")
        .await
        .unwrap();
    assert!(result.success);
    assert_eq!(result.stdout, "X = 1\n");
    assert_eq!(result.exit_code, Some(0));

    let runs = h.remote.runs();
    assert_eq!(runs.len(), 1);
    assert_eq!(runs[0].relative_file_path, "src/util.py");
    assert_eq!(runs[0].content, "print(X)\n");
    assert_eq!(runs[0].folder_name, h.root().file_name().unwrap());
    // mirrored first
    assert_eq!(h.runner.sync_calls().len(), 1);
}

#[tokio::test]
async fn run_after_failed_sync_sends_nothing() {
    let h = harness().await;
    h.runner.set_sync_output(CommandOutput::failure(
        "exit status: 1",
        "Failed to copy: permission denied",
    ));
    let err = h.run(&credentials(), "main.py", "").await.unwrap_err();
    assert!(matches!(err, RunError::Sync(SyncOutcome::TransferError(_))));
    assert!(h.remote.runs().is_empty());
}

#[tokio::test]
async fn run_failure_keeps_exit_code() {
    let h = harness().await;
    h.remote.set_run_reply(Ok(RunResponse {
        success: false,
        output: Some(String::new()),
        error: Some("NameError: name 'y' is not defined\n".to_string()),
        returncode: Some(1),
    }));
    let result = h.run(&credentials(), "main.py", "y\n").await.unwrap();
    assert!(!result.success);
    assert_eq!(result.exit_code, Some(1));
    assert!(result.stderr.contains("NameError"));
    assert!(h.output_contains("exit code 1"));
}

#[tokio::test]
async fn run_without_answer_is_no_response() {
    let h = harness().await;
    h.remote
        .set_run_reply(Err(Error::NoResponse("timed out".to_string())));
    let err = h.run(&credentials(), "main.py", "").await.unwrap_err();
    assert_eq!(err, RunError::NoResponse("timed out".to_string()));
}

#[tokio::test]
async fn run_outside_workspace_is_refused() {
    let h = harness().await;
    let err = run_outside(&h).await;
    assert!(matches!(err, RunError::Config(_)));
    assert!(h.runner.calls().is_empty());
}

async fn run_outside(h: &Harness) -> RunError {
    wsyncd::run::run_remote(
        &h.engine,
        Some(h.root()),
        &credentials(),
        FsPath::new("/elsewhere/main.py"),
        String::new(),
    )
    .await
    .unwrap_err()
}

#[tokio::test]
async fn store_seeds_from_bundled_file() {
    let dir = utils::TempDir::new("wsync-store").await;
    let bundled = dir
        .write(
            "settings.default.json",
            r#"{"ip": "192.168.1.20", "user": "dev", "pass": "", "rclonePath": "rclone", "syncInterval": 30}"#,
        )
        .await;
    let store = CredentialStore::new(dir.join("cfg/settings.json"), DefaultSource::File(bundled));

    let creds = store.load().await.unwrap();
    assert_eq!(creds.host, "192.168.1.20");
    assert_eq!(creds.interval_seconds, 30);
    assert!(store.path().exists());

    // the persisted copy wins afterwards
    tokio::fs::write(store.path(), r#"{"ip": "10.1.1.1"}"#)
        .await
        .unwrap();
    let creds = store.load().await.unwrap();
    assert_eq!(creds.host, "10.1.1.1");
    assert_eq!(creds.sync_tool_path, "rclone");
}

#[tokio::test]
async fn store_falls_back_to_builtin_default() {
    let dir = utils::TempDir::new("wsync-store").await;
    let store = CredentialStore::new(
        dir.join("settings.json"),
        DefaultSource::File(dir.join("missing.json")),
    );
    let creds = store.load().await.unwrap();
    assert_eq!(creds, SyncCredentials::default());
    assert!(!creds.is_complete());
}

#[tokio::test]
async fn save_provisions_and_tolerates_failure() {
    let dir = utils::TempDir::new("wsync-store").await;
    let store = CredentialStore::new(dir.join("settings.json"), DefaultSource::Builtin);
    let runner = stubs::runner::Stub::default();
    runner.set_config_output(CommandOutput::failure(
        "rclone: command not found",
        "",
    ));
    let tool = SyncTool::new(runner.clone());

    store.save(&credentials(), &tool).await.unwrap();

    let calls = runner.config_calls();
    assert_eq!(calls.len(), 1);
    assert!(calls[0].starts_with(&["config".to_string(), "create".to_string()]));
    assert!(calls[0].contains(&"host=10.0.0.5".to_string()));

    let saved = store.load().await.unwrap();
    assert_eq!(saved, credentials());
}

async fn next_synced(
    events: &mut tokio::sync::mpsc::UnboundedReceiver<WorkspaceEvent>,
) -> (wsync::path::FsPathBuf, SyncOutcome) {
    loop {
        let event = timeout(Duration::from_secs(5), events.recv())
            .await
            .expect("no sync event")
            .expect("event channel closed");
        if let WorkspaceEvent::Synced { root, outcome } = event {
            return (root, outcome);
        }
    }
}

#[tokio::test]
async fn controller_opens_and_mirrors_workspace() {
    let ws = utils::TempDir::new("wsync-ws").await;
    ws.write("main.py", "").await;
    let (controller, mut events, remote, _runner, _settings) =
        Harness::controller(credentials());

    let tree = controller.open_workspace(ws.path()).await.unwrap();
    assert_eq!(tree.path(), ws.path());
    assert!(tree.contains(&ws.join("main.py")));

    let (root, outcome) = next_synced(&mut events).await;
    assert_eq!(root, ws.path());
    assert!(outcome.is_success());
    assert_eq!(remote.checked().len(), 1);
    assert!(controller.with_state(|s| s.is_watching()).await);
}

#[tokio::test]
async fn controller_reports_new_files() {
    let ws = utils::TempDir::new("wsync-ws").await;
    let (controller, mut events, _remote, _runner, _settings) =
        Harness::controller(credentials());
    controller.open_workspace(ws.path()).await.unwrap();

    ws.write("later.txt", "").await;
    let added = ws.join("later.txt");

    let found = timeout(Duration::from_secs(5), async {
        while let Some(event) = events.recv().await {
            if let WorkspaceEvent::Snapshot(tree) = event {
                if tree.contains(&added) {
                    return true;
                }
            }
        }
        false
    })
    .await;
    assert_eq!(found, Ok(true));
}

#[tokio::test]
async fn controller_discards_stale_sync() {
    let first = utils::TempDir::new("wsync-ws").await;
    let second = utils::TempDir::new("wsync-ws").await;
    let (controller, mut events, remote, _runner, _settings) =
        Harness::controller(credentials());
    let controller = std::sync::Arc::new(controller);

    controller.open_workspace(first.path()).await.unwrap();
    next_synced(&mut events).await;

    remote.set_delay(Duration::from_millis(300));
    let pending = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.sync_now().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    controller.open_workspace(second.path()).await.unwrap();

    assert_eq!(pending.await.unwrap(), SyncOutcome::Discarded);
    assert_eq!(controller.root().await.as_deref(), Some(second.path()));
}

#[tokio::test]
async fn apply_credentials_rearms_auto_sync() {
    let ws = utils::TempDir::new("wsync-ws").await;
    let (controller, mut events, _remote, runner, settings) =
        Harness::controller(credentials());
    controller.open_workspace(ws.path()).await.unwrap();
    next_synced(&mut events).await;
    assert_eq!(controller.with_state(|s| s.auto_sync_interval()).await, None);

    let creds = SyncCredentials {
        interval_seconds: 3600,
        ..credentials()
    };
    controller.apply_credentials(creds.clone()).await.unwrap();
    assert_eq!(
        controller.with_state(|s| s.auto_sync_interval()).await,
        Some(3600)
    );
    assert_eq!(controller.credentials().await, creds);
    assert_eq!(runner.config_calls().len(), 1);

    // armed timers tick right away
    let (_, outcome) = next_synced(&mut events).await;
    assert!(outcome.is_success());

    let _ = std::fs::remove_file(settings);
}

#[tokio::test]
async fn stale_sync_failure_is_not_logged() {
    let first = utils::TempDir::new("wsync-ws").await;
    let second = utils::TempDir::new("wsync-ws").await;
    let (controller, mut events, _remote, runner, _settings) =
        Harness::controller(credentials());
    let controller = std::sync::Arc::new(controller);

    controller.open_workspace(first.path()).await.unwrap();
    next_synced(&mut events).await;

    runner.set_sync_output(CommandOutput::failure("exit status: 1", "boom-first"));
    runner.set_delay(Duration::from_millis(300));
    let pending = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.sync_now().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    runner.set_sync_output(CommandOutput::success("", ""));
    controller.open_workspace(second.path()).await.unwrap();

    assert_eq!(pending.await.unwrap(), SyncOutcome::Discarded);
    assert!(!controller
        .log()
        .texts()
        .iter()
        .any(|line| line.contains("boom-first")));
}

#[tokio::test]
async fn run_is_dropped_when_workspace_changes() {
    let first = utils::TempDir::new("wsync-ws").await;
    let second = utils::TempDir::new("wsync-ws").await;
    first.write("main.py", "print('hi')").await;
    let (controller, mut events, remote, _runner, _settings) =
        Harness::controller(credentials());
    let controller = std::sync::Arc::new(controller);

    controller.open_workspace(first.path()).await.unwrap();
    next_synced(&mut events).await;

    remote.set_delay(Duration::from_millis(300));
    let pending = {
        let controller = controller.clone();
        let file = first.join("main.py");
        tokio::spawn(async move {
            controller
                .run_remote(&file, "print('hi')".to_string())
                .await
        })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    controller.open_workspace(second.path()).await.unwrap();

    let res = pending.await.unwrap();
    assert!(
        matches!(res, Err(RunError::Sync(SyncOutcome::Discarded))),
        "{res:?}"
    );
    assert!(remote.runs().is_empty());
}

#[tokio::test]
async fn timer_tick_during_sync_is_a_no_op() {
    let ws = utils::TempDir::new("wsync-ws").await;
    let (controller, mut events, _remote, runner, settings) =
        Harness::controller(credentials());
    let controller = std::sync::Arc::new(controller);
    controller.open_workspace(ws.path()).await.unwrap();
    next_synced(&mut events).await;

    runner.set_delay(Duration::from_millis(300));
    let pending = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.sync_now().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    // arming ticks right away, while the mirror above is still running
    let creds = SyncCredentials {
        interval_seconds: 3600,
        ..credentials()
    };
    controller.apply_credentials(creds).await.unwrap();

    assert!(pending.await.unwrap().is_success());
    let (_, outcome) = next_synced(&mut events).await;
    assert!(outcome.is_success());

    let late = timeout(Duration::from_millis(200), async {
        while let Some(event) = events.recv().await {
            if let WorkspaceEvent::Synced { .. } = event {
                return;
            }
        }
        std::future::pending::<()>().await
    })
    .await;
    assert!(late.is_err(), "unexpected extra sync");
    assert_eq!(runner.sync_calls().len(), 2);
    assert_eq!(runner.max_active(), 1);

    let _ = std::fs::remove_file(settings);
}

#[tokio::test]
async fn run_during_sync_is_refused() {
    let ws = utils::TempDir::new("wsync-ws").await;
    ws.write("main.py", "").await;
    let (controller, mut events, remote, runner, _settings) =
        Harness::controller(credentials());
    let controller = std::sync::Arc::new(controller);
    controller.open_workspace(ws.path()).await.unwrap();
    next_synced(&mut events).await;

    runner.set_delay(Duration::from_millis(300));
    let pending = {
        let controller = controller.clone();
        tokio::spawn(async move { controller.sync_now().await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;

    let res = controller
        .run_remote(&ws.join("main.py"), String::new())
        .await;
    assert!(
        matches!(res, Err(RunError::Sync(SyncOutcome::InProgress))),
        "{res:?}"
    );
    assert!(remote.runs().is_empty());
    assert!(pending.await.unwrap().is_success());
}
