use std::{
    sync::{Arc, Mutex},
    time::Duration,
};

use wsync::CommandOutput;
use wsyncd::tool::CommandRunner;

#[derive(Default)]
struct State {
    sync_output: Option<CommandOutput>,
    config_output: Option<CommandOutput>,
    calls: Vec<(String, Vec<String>)>,
    delay: Duration,
    active: usize,
    max_active: usize,
}

/// Stub of the sync tool.
/// Succeeds silently unless told otherwise, and records every invocation.
#[derive(Clone, Default)]
pub struct Stub {
    state: Arc<Mutex<State>>,
}

impl Stub {
    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Output of `sync` invocations started from now on
    pub fn set_sync_output(&self, output: CommandOutput) {
        self.state().sync_output = Some(output);
    }

    /// Output of `config` invocations
    pub fn set_config_output(&self, output: CommandOutput) {
        self.state().config_output = Some(output);
    }

    /// Delay applied to `sync` invocations
    pub fn set_delay(&self, delay: Duration) {
        self.state().delay = delay;
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        self.state().calls.clone()
    }

    pub fn sync_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|(_, args)| args.first().is_some_and(|a| a == "sync"))
            .map(|(_, args)| args)
            .collect()
    }

    pub fn config_calls(&self) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|(_, args)| args.first().is_some_and(|a| a == "config"))
            .map(|(_, args)| args)
            .collect()
    }

    /// Highest number of `sync` invocations seen running at once
    pub fn max_active(&self) -> usize {
        self.state().max_active
    }
}

impl CommandRunner for Stub {
    async fn run(&self, program: &str, args: &[String]) -> CommandOutput {
        log::debug!("stub run: {program} {}", args.join(" "));
        let is_sync = args.first().is_some_and(|a| a == "sync");
        // the output is decided when the tool starts
        let (delay, output) = {
            let mut state = self.state();
            state.calls.push((program.to_string(), args.to_vec()));
            let output = if is_sync {
                state.active += 1;
                state.max_active = state.max_active.max(state.active);
                state.sync_output.clone()
            } else {
                state.config_output.clone()
            };
            (state.delay, output)
        };
        if is_sync {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            self.state().active -= 1;
        }
        output.unwrap_or_else(|| CommandOutput::success("", ""))
    }
}
