//! Program log capture

use parking_lot::Mutex;
use regex_lite::Regex;
use std::sync::{Arc, OnceLock};

const LOG_PREFIX: &str = "LOG:";

fn quoted_log() -> &'static Regex {
    static QUOTED: OnceLock<Regex> = OnceLock::new();
    QUOTED.get_or_init(|| Regex::new(r#""(.*)""#).expect("static pattern"))
}

/// Append-only store of every program log line seen by a runner
#[derive(Debug, Clone, Default)]
pub struct LogCollector {
    entries: Arc<Mutex<Vec<String>>>,
}

impl LogCollector {
    /// Create an empty collector
    pub fn new() -> Self {
        Self::default()
    }

    /// Logger that feeds this collector
    pub fn logger(&self) -> ProgramLogger {
        ProgramLogger {
            collector: self.clone(),
        }
    }

    /// Snapshot of the captured lines
    pub fn entries(&self) -> Vec<String> {
        self.entries.lock().clone()
    }

    /// Record a raw log line
    ///
    /// The first `LOG:` marker is removed. Quoted string values keep only
    /// their contents, so `LOG: "done"` is stored as `done`.
    pub fn write(&self, line: &str) {
        let message = line.replacen(LOG_PREFIX, "", 1);
        let message = match quoted_log().captures(&message) {
            Some(captures) => captures
                .get(1)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default(),
            None => message.trim().to_string(),
        };
        self.entries.lock().push(message);
    }
}

/// Sink handed to every interpreter a runner creates
#[derive(Debug, Clone)]
pub struct ProgramLogger {
    collector: LogCollector,
}

impl ProgramLogger {
    /// Log a rendered program value
    pub fn log(&self, message: &str) {
        tracing::info!(target: "tessera::program", "{}", message);
        self.collector.write(&format!("{LOG_PREFIX} {message}"));
    }
}
