//! Raw access to the kernel counter pseudo-files under /proc.
//!
//! Every read is a single bounded read of the whole record. Nothing here
//! parses; callers get the text exactly as the kernel produced it.

use std::fs::{self, File};
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::error::{MonitorError, Result};

/// Default procfs mount point.
pub const DEFAULT_PROC_ROOT: &str = "/proc";

/// Upper bound for /proc/<pid>/comm reads (kernel limit is 16, be generous).
const NAME_READ_LIMIT: usize = 256;

/// Handle on a procfs tree.
#[derive(Debug, Clone)]
pub struct ProcFs {
    root: PathBuf,
    read_limit: usize,
}

impl ProcFs {
    /// Creates a reader rooted at `root`, capping each counter read at
    /// `read_limit` bytes.
    pub fn new(root: impl Into<PathBuf>, read_limit: usize) -> Self {
        Self {
            root: root.into(),
            read_limit: read_limit.max(1),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Reads /proc/stat (aggregate and per-core CPU counters).
    pub fn read_cpu_stat(&self) -> Result<String> {
        read_bounded(&self.root.join("stat"), self.read_limit)
    }

    /// Reads /proc/meminfo.
    pub fn read_meminfo(&self) -> Result<String> {
        read_bounded(&self.root.join("meminfo"), self.read_limit)
    }

    /// Reads /proc/<pid>/stat.
    pub fn read_process_stat(&self, pid: u32) -> Result<String> {
        read_bounded(&self.pid_dir(pid).join("stat"), self.read_limit)
    }

    /// Reads /proc/<pid>/comm with the trailing newline removed.
    pub fn read_process_name(&self, pid: u32) -> Result<String> {
        let path = self.pid_dir(pid).join("comm");
        let raw = read_bounded(&path, NAME_READ_LIMIT - 1)?;
        let name = raw.strip_suffix('\n').unwrap_or(&raw);
        if name.is_empty() {
            return Err(MonitorError::ReadIo {
                path,
                source: io::Error::new(io::ErrorKind::UnexpectedEof, "empty comm"),
            });
        }
        Ok(name.to_string())
    }

    /// Lists numeric entries of the proc root, stopping once `max` pids
    /// have been collected.
    pub fn list_pids(&self, max: usize) -> Result<Vec<u32>> {
        let entries = fs::read_dir(&self.root).map_err(|e| classify(&self.root, e))?;

        let mut pids = Vec::new();
        for entry in entries.flatten() {
            let file_name = entry.file_name();
            let name = match file_name.to_str() {
                Some(v) => v,
                None => continue,
            };
            if name.is_empty() || !name.bytes().all(|b| b.is_ascii_digit()) {
                continue;
            }
            let pid: u32 = match name.parse() {
                Ok(v) => v,
                Err(_) => continue,
            };
            if pids.len() >= max {
                debug!("Process enumeration truncated at {} entries", max);
                break;
            }
            pids.push(pid);
        }
        Ok(pids)
    }

    fn pid_dir(&self, pid: u32) -> PathBuf {
        self.root.join(pid.to_string())
    }
}

impl Default for ProcFs {
    fn default() -> Self {
        Self::new(DEFAULT_PROC_ROOT, 64 * 1024)
    }
}

/// Opens `path` and reads at most `limit` bytes in one pass.
fn read_bounded(path: &Path, limit: usize) -> Result<String> {
    let file = File::open(path).map_err(|e| classify(path, e))?;
    let mut buf = Vec::with_capacity(limit.min(8 * 1024));
    file.take(limit as u64)
        .read_to_end(&mut buf)
        .map_err(|e| classify(path, e))?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// ENOENT and ESRCH mean the process went away between listing and reading.
fn classify(path: &Path, err: io::Error) -> MonitorError {
    if err.kind() == io::ErrorKind::NotFound || err.raw_os_error() == Some(libc::ESRCH) {
        MonitorError::ReadUnavailable {
            path: path.to_path_buf(),
        }
    } else {
        MonitorError::ReadIo {
            path: path.to_path_buf(),
            source: err,
        }
    }
}
