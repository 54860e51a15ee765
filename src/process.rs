//! Per-process CPU time collection and top-N ranking.
//!
//! One ranking pass enumerates /proc, reads every process it can, sorts by
//! total CPU time and keeps the busiest entries. Nothing is carried over
//! between passes.

use once_cell::sync::Lazy;
use tracing::{debug, instrument, warn};

use crate::error::{MonitorError, Result};
use crate::metrics::relative_cpu_percent;
use crate::reader::ProcFs;

/// Name shown when /proc/<pid>/comm cannot be read.
pub const UNKNOWN_PROCESS_NAME: &str = "[unknown]";

/// Default number of processes reported per pass.
pub const DEFAULT_TOP_N: usize = 5;

/// Default upper bound on processes enumerated per pass.
pub const DEFAULT_MAX_PROCESSES: usize = 1024;

/// Longest process name kept, in bytes.
const MAX_NAME_LEN: usize = 255;

/// Positional fields between the closing `)` and utime: state, ppid, pgrp,
/// session, tty_nr, tpgid, flags, minflt, cminflt, majflt, cmajflt.
const FIELDS_BEFORE_UTIME: usize = 11;

/// Kernel clock ticks per second, used to express CPU time in seconds.
pub static CLOCK_TICKS_PER_SECOND: Lazy<f64> = Lazy::new(|| {
    // SAFETY: sysconf has no preconditions.
    let ticks = unsafe { libc::sysconf(libc::_SC_CLK_TCK) };
    if ticks > 0 {
        ticks as f64
    } else {
        100.0
    }
});

/// CPU counters of one process from /proc/<pid>/stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessTimes {
    pub utime: u64,
    pub stime: u64,
}

/// One process as seen by a ranking pass.
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessRecord {
    pub pid: u32,
    pub name: String,
    pub utime: u64,
    pub stime: u64,
    pub total_time: u64,
    /// Share of the busiest process's CPU time, set by [`rank_processes`].
    pub cpu_percent: f64,
}

impl ProcessRecord {
    pub fn new(pid: u32, name: impl Into<String>, times: ProcessTimes) -> Self {
        Self {
            pid,
            name: truncate_name(name.into()),
            utime: times.utime,
            stime: times.stime,
            total_time: times.utime.saturating_add(times.stime),
            cpu_percent: 0.0,
        }
    }

    /// Total CPU time in seconds.
    pub fn cpu_seconds(&self) -> f64 {
        self.total_time as f64 / *CLOCK_TICKS_PER_SECOND
    }
}

/// Outcome of one ranking pass.
#[derive(Debug, Clone, Default)]
pub struct Ranking {
    /// Busiest processes, descending by total CPU time.
    pub top: Vec<ProcessRecord>,
    /// Number of processes successfully read in this pass.
    pub total_count: usize,
}

impl Ranking {
    pub fn is_empty(&self) -> bool {
        self.total_count == 0
    }
}

/// Parses utime and stime out of /proc/<pid>/stat content.
///
/// Format: "pid (comm) state ppid ... utime stime ..."
/// The comm field may itself contain spaces and parentheses, so positional
/// parsing starts after the last `)`.
pub fn parse_process_stat(pid: u32, content: &str) -> Result<ProcessTimes> {
    let malformed = |reason: &str| MonitorError::MalformedProcessStat {
        pid,
        reason: reason.to_string(),
    };

    let close = content
        .rfind(')')
        .ok_or_else(|| malformed("no closing ')' after process name"))?;

    let mut fields = content[close + 1..]
        .split_whitespace()
        .skip(FIELDS_BEFORE_UTIME);

    let utime = fields
        .next()
        .ok_or_else(|| malformed("missing utime field"))?
        .parse::<u64>()
        .map_err(|e| malformed(&format!("invalid utime: {e}")))?;
    let stime = fields
        .next()
        .ok_or_else(|| malformed("missing stime field"))?
        .parse::<u64>()
        .map_err(|e| malformed(&format!("invalid stime: {e}")))?;

    Ok(ProcessTimes { utime, stime })
}

/// Reads one process. Stat is read first; an unreadable name falls back to
/// [`UNKNOWN_PROCESS_NAME`].
pub fn read_process(procfs: &ProcFs, pid: u32) -> Result<ProcessRecord> {
    let content = procfs.read_process_stat(pid)?;
    let times = parse_process_stat(pid, &content)?;

    let name = match procfs.read_process_name(pid) {
        Ok(name) => name,
        Err(e) => {
            debug!("Could not read name for pid {}: {}", pid, e);
            UNKNOWN_PROCESS_NAME.to_string()
        }
    };

    Ok(ProcessRecord::new(pid, name, times))
}

/// Reads every visible process, skipping those that fail.
///
/// Only a failure to enumerate the proc root itself is returned.
#[instrument(skip(procfs), fields(root = %procfs.root().display()))]
pub fn collect_processes(procfs: &ProcFs, max_processes: usize) -> Result<Vec<ProcessRecord>> {
    let pids = procfs.list_pids(max_processes)?;
    debug!("Enumerated {} process entries", pids.len());

    let mut records = Vec::with_capacity(pids.len());
    let mut skipped = 0usize;

    for pid in pids {
        match read_process(procfs, pid) {
            Ok(record) => records.push(record),
            Err(e) if e.is_unavailable() => {
                debug!("Skipping pid {}: exited during scan", pid);
                skipped += 1;
            }
            Err(e) => {
                debug!("Skipping pid {}: {}", pid, e);
                skipped += 1;
            }
        }
    }

    if skipped > 0 {
        debug!("Skipped {} processes during scan", skipped);
    }
    Ok(records)
}

/// Sorts records by total CPU time (stable, descending), fills in the
/// relative percentage and keeps the first `top_n`.
pub fn rank_processes(mut records: Vec<ProcessRecord>, top_n: usize) -> Ranking {
    let total_count = records.len();

    // Vec::sort_by is stable: equal totals keep enumeration order.
    records.sort_by(|a, b| b.total_time.cmp(&a.total_time));

    let max_time = records.first().map(|r| r.total_time).unwrap_or(0);
    records.truncate(top_n);
    for record in &mut records {
        record.cpu_percent = relative_cpu_percent(record.total_time, max_time);
    }

    Ranking {
        top: records,
        total_count,
    }
}

/// Runs one complete enumerate-read-sort-truncate pass.
pub fn top_processes(procfs: &ProcFs, top_n: usize, max_processes: usize) -> Result<Ranking> {
    let records = collect_processes(procfs, max_processes)?;
    let ranking = rank_processes(records, top_n);
    if ranking.is_empty() {
        warn!("No readable processes under {}", procfs.root().display());
    }
    Ok(ranking)
}

fn truncate_name(mut name: String) -> String {
    if name.len() > MAX_NAME_LEN {
        let mut end = MAX_NAME_LEN;
        while !name.is_char_boundary(end) {
            end -= 1;
        }
        name.truncate(end);
    }
    name
}
