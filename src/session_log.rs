//! Append-only, timestamped session log.
//!
//! Lines look like `[2024-05-01 13:37:00] Session started`. The file is
//! opened once per process and flushed after every line.

use chrono::Local;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Default session log location, relative to the working directory.
pub const DEFAULT_LOG_FILE: &str = "syslog.txt";

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Local time formatted the way the session log and reports print it.
pub fn current_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

pub fn format_line(timestamp: &str, message: &str) -> String {
    format!("[{timestamp}] {message}")
}

pub struct SessionLog {
    path: PathBuf,
    file: Option<File>,
}

impl SessionLog {
    /// Opens `path` in append mode, creating it when missing.
    pub fn open(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        debug!("Session log opened at {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            file: Some(file),
        })
    }

    /// Opens `path`, or falls back to a log that drops every line after
    /// warning the user.
    pub fn open_or_disabled(path: &Path) -> Self {
        match Self::open(path) {
            Ok(log) => log,
            Err(e) => {
                eprintln!("Warning: Could not open {}: {}", path.display(), e);
                warn!("Session log disabled: {}", e);
                Self::disabled()
            }
        }
    }

    pub fn disabled() -> Self {
        Self {
            path: PathBuf::new(),
            file: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.file.is_some()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends one timestamped line. Write failures disable the log.
    pub fn write(&mut self, message: &str) {
        let Some(file) = self.file.as_mut() else {
            return;
        };
        let line = format_line(&current_timestamp(), message);
        let result = writeln!(file, "{line}").and_then(|_| file.flush());
        if let Err(e) = result {
            warn!(
                "Failed to write session log {}: {}; disabling",
                self.path.display(),
                e
            );
            self.file = None;
        }
    }

    /// Flushes and closes the file.
    pub fn close(mut self) {
        if let Some(mut file) = self.file.take() {
            if let Err(e) = file.flush() {
                warn!("Failed to flush session log: {}", e);
            }
        }
    }
}
