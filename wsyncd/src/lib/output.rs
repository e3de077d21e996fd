//! The running output log shown to the user.

use std::{
    fmt,
    sync::{Arc, Mutex},
};

use chrono::{DateTime, Local};
use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
    pub time: DateTime<Local>,
    pub text: String,
}

impl fmt::Display for LogLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}", self.time.format("%H:%M:%S"), self.text)
    }
}

/// Append-only, timestamped log.
/// Lines are kept in memory, forwarded to the `log` facade and broadcast to
/// subscribers. Capping the history is left to consumers.
#[derive(Debug, Clone)]
pub struct OutputLog {
    lines: Arc<Mutex<Vec<LogLine>>>,
    tx: broadcast::Sender<LogLine>,
}

impl Default for OutputLog {
    fn default() -> Self {
        Self::new()
    }
}

impl OutputLog {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            lines: Arc::new(Mutex::new(Vec::new())),
            tx,
        }
    }

    pub fn append(&self, text: impl Into<String>) {
        let line = LogLine {
            time: Local::now(),
            text: text.into(),
        };
        log::info!(target: "output", "{}", line.text);
        {
            let mut lines = self.lines.lock().unwrap_or_else(|e| e.into_inner());
            lines.push(line.clone());
        }
        // no subscriber is fine
        let _ = self.tx.send(line);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogLine> {
        self.tx.subscribe()
    }

    pub fn lines(&self) -> Vec<LogLine> {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn texts(&self) -> Vec<String> {
        self.lines().into_iter().map(|l| l.text).collect()
    }
}
