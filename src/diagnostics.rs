// Failure log for analysis service responses that could not be decoded
use chrono::Utc;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use tracing::{debug, warn};

#[derive(Serialize)]
struct FailureEntry<'a> {
    task: &'a str,
    subject: &'a str,
    reason: &'a str,
    raw_response: Option<&'a str>,
    timestamp: String,
}

/// Appends one JSON line per failed analysis task
///
/// Cloning shares the underlying writer, so concurrent tasks can each hold a handle.
#[derive(Clone)]
pub struct FailureLog {
    writer: Option<Arc<Mutex<BufWriter<File>>>>,
}

impl FailureLog {
    pub fn new(log_file: Option<PathBuf>) -> Self {
        let writer = log_file.and_then(|path| {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                if let Err(e) = fs::create_dir_all(parent) {
                    warn!("Failed to create failure log directory {:?}: {}", parent, e);
                    return None;
                }
            }
            match OpenOptions::new().create(true).append(true).open(&path) {
                Ok(file) => Some(Arc::new(Mutex::new(BufWriter::new(file)))),
                Err(e) => {
                    warn!("Failed to open failure log file {:?}: {}", path, e);
                    None
                }
            }
        });

        Self { writer }
    }

    pub fn disabled() -> Self {
        Self { writer: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.writer.is_some()
    }

    /// Records a failure; `subject` is the entry key or block label
    pub fn record(&self, task: &str, subject: &str, reason: &str, raw_response: Option<&str>) {
        let Some(writer) = &self.writer else {
            return;
        };

        let entry = FailureEntry {
            task,
            subject,
            reason,
            raw_response,
            timestamp: Utc::now().to_rfc3339(),
        };

        if let Ok(mut writer) = writer.lock() {
            match serde_json::to_string(&entry) {
                Ok(json) => {
                    if let Err(e) = writeln!(writer, "{}", json) {
                        warn!("Failed to write failure log entry: {}", e);
                    }
                    if let Err(e) = writer.flush() {
                        warn!("Failed to flush failure log: {}", e);
                    }
                }
                Err(e) => {
                    warn!("Failed to serialize failure entry for {}: {}", subject, e);
                }
            }
        }

        debug!(task, subject, "Failure recorded");
    }
}

impl std::fmt::Debug for FailureLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FailureLog")
            .field("enabled", &self.is_enabled())
            .finish()
    }
}
