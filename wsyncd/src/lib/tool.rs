//! Driving the external sync tool.

use std::process::Stdio;

use futures::Future;
use wsync::{path, CommandOutput, SyncCredentials};

/// Runs external commands and captures their output
pub trait CommandRunner: Send + Sync + 'static {
    fn run(&self, program: &str, args: &[String]) -> impl Future<Output = CommandOutput> + Send;
}

/// [CommandRunner] spawning real processes
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessRunner;

impl CommandRunner for ProcessRunner {
    async fn run(&self, program: &str, args: &[String]) -> CommandOutput {
        log::debug!(target: "sync", "{program} {}", args.join(" "));
        let output = tokio::process::Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .kill_on_drop(false)
            .output()
            .await;
        match output {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
                let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
                let exit_error = if output.status.success() {
                    None
                } else {
                    Some(format!("Command failed: {program} ({})", output.status))
                };
                CommandOutput {
                    exit_error,
                    stdout,
                    stderr,
                }
            }
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                CommandOutput::failure(format!("{program}: command not found"), "")
            }
            Err(err) => CommandOutput::failure(format!("Failed to start {program}: {err}"), ""),
        }
    }
}

/// Executable naming of a platform
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Platform {
    pub exe_suffix: &'static str,
}

impl Platform {
    pub const WINDOWS: Platform = Platform { exe_suffix: ".exe" };
    pub const UNIX: Platform = Platform { exe_suffix: "" };

    #[cfg(target_os = "windows")]
    pub fn current() -> Self {
        Self::WINDOWS
    }

    #[cfg(not(target_os = "windows"))]
    pub fn current() -> Self {
        Self::UNIX
    }
}

/// Resolve the configured sync tool location to an executable.
///
/// - a value ending with a separator is a folder: the executable name is appended
/// - a path whose last segment is the tool base name gets the platform extension
/// - anything else, a bare command name included, is used verbatim
pub fn resolve_tool_path(configured: &str, platform: Platform) -> String {
    let base = wsync::TOOL_BASE_NAME;
    let configured = configured.trim();
    if configured.is_empty() {
        return format!("{base}{}", platform.exe_suffix);
    }
    if configured.ends_with(path::is_separator) {
        return format!("{configured}{base}{}", platform.exe_suffix);
    }
    if configured.contains(path::is_separator) {
        let is_base = path::last_segment(configured)
            .map(|seg| seg.to_lowercase() == base)
            .unwrap_or(false);
        if is_base {
            return format!("{configured}{}", platform.exe_suffix);
        }
    }
    configured.to_string()
}

/// The sync tool, invoked through a [CommandRunner]
#[derive(Debug, Clone)]
pub struct SyncTool<C> {
    runner: C,
    platform: Platform,
}

impl<C> SyncTool<C> {
    pub fn new(runner: C) -> Self {
        Self::with_platform(runner, Platform::current())
    }

    pub fn with_platform(runner: C, platform: Platform) -> Self {
        Self { runner, platform }
    }

    pub fn runner(&self) -> &C {
        &self.runner
    }

    pub fn executable(&self, credentials: &SyncCredentials) -> String {
        resolve_tool_path(&credentials.sync_tool_path, self.platform)
    }
}

/// Remote target of the mirror of `folder_name`
pub fn mirror_target(folder_name: &str) -> String {
    format!(
        "{}:{}/{}",
        wsync::PROFILE_NAME,
        wsync::REMOTE_BASE_PATH,
        folder_name
    )
}

pub fn mirror_args(local_root: &str, folder_name: &str) -> Vec<String> {
    vec![
        "sync".to_string(),
        local_root.to_string(),
        mirror_target(folder_name),
        "--progress".to_string(),
    ]
}

pub fn provision_args(credentials: &SyncCredentials) -> Vec<String> {
    let mut args = vec![
        "config".to_string(),
        "create".to_string(),
        wsync::PROFILE_NAME.to_string(),
        "sftp".to_string(),
        format!("host={}", credentials.host),
        format!("user={}", credentials.user),
        "port=22".to_string(),
    ];
    if !credentials.secret.is_empty() {
        args.push(format!("pass={}", credentials.secret));
    }
    args.push("--non-interactive".to_string());
    args
}

impl<C> SyncTool<C>
where
    C: CommandRunner,
{
    /// One-way mirror of `local_root` to the remote folder `folder_name`
    pub async fn mirror(
        &self,
        credentials: &SyncCredentials,
        local_root: &str,
        folder_name: &str,
    ) -> CommandOutput {
        let exe = self.executable(credentials);
        let args = mirror_args(local_root, folder_name);
        self.runner.run(&exe, &args).await
    }

    /// (Re)create the sync tool profile holding the remote connection
    pub async fn provision(&self, credentials: &SyncCredentials) -> wsync::Result<()> {
        let exe = self.executable(credentials);
        let args = provision_args(credentials);
        let output = self.runner.run(&exe, &args).await;
        match output.error_message() {
            Some(msg) => Err(wsync::tool_error!(
                "failed to create profile {}: {msg}",
                wsync::PROFILE_NAME
            )),
            None => {
                log::info!("Profile {} created for {}", wsync::PROFILE_NAME, credentials.host);
                Ok(())
            }
        }
    }
}
