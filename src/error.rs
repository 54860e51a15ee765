//! Error taxonomy for counter reads, parsing and user input.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors produced while sampling kernel counters or validating input.
#[derive(Debug, Error)]
pub enum MonitorError {
    /// The counter source is gone, typically because the process exited.
    #[error("{} is no longer available", path.display())]
    ReadUnavailable { path: PathBuf },

    /// Open or read failed for a reason other than absence.
    #[error("failed to read {}: {source}", path.display())]
    ReadIo {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The aggregate CPU line is missing or has fewer than seven counters.
    #[error("malformed counter line: {0}")]
    MalformedCounterLine(String),

    /// A single /proc/<pid>/stat record could not be parsed.
    #[error("malformed stat record for pid {pid}: {reason}")]
    MalformedProcessStat { pid: u32, reason: String },

    /// A user supplied value was rejected.
    #[error("{0}")]
    Validation(String),

    /// Unrecognised combination of command-line switches.
    #[error("Invalid option: Use -h for help.")]
    Usage,
}

impl MonitorError {
    /// Expected churn that callers skip without surfacing.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, MonitorError::ReadUnavailable { .. })
    }
}

pub type Result<T> = std::result::Result<T, MonitorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_messages() {
        let err = MonitorError::ReadUnavailable {
            path: PathBuf::from("/proc/42/stat"),
        };
        assert_eq!(err.to_string(), "/proc/42/stat is no longer available");
        assert!(err.is_unavailable());

        let err = MonitorError::MalformedCounterLine("expected 7 fields, got 6".into());
        assert_eq!(
            err.to_string(),
            "malformed counter line: expected 7 fields, got 6"
        );
        assert!(!err.is_unavailable());

        assert_eq!(MonitorError::Usage.to_string(), "Invalid option: Use -h for help.");
    }
}
