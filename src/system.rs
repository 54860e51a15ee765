//! System-wide counters from the /proc filesystem.
//!
//! This module parses the aggregate CPU line of /proc/stat and the
//! memory totals of /proc/meminfo into typed samples.

use tracing::debug;

use crate::error::{MonitorError, Result};
use crate::reader::ProcFs;

/// Label of the aggregate line in /proc/stat; per-core lines are `cpuN`.
const AGGREGATE_CPU_LABEL: &str = "cpu";

/// Number of counters read from the aggregate CPU line.
pub const CPU_FIELD_COUNT: usize = 7;

/// Aggregate CPU counters, in clock ticks, from one sampling instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CpuSample {
    pub user: u64,
    pub nice: u64,
    pub system: u64,
    pub idle: u64,
    pub iowait: u64,
    pub irq: u64,
    pub softirq: u64,
}

impl CpuSample {
    pub fn from_fields(fields: [u64; CPU_FIELD_COUNT]) -> Self {
        let [user, nice, system, idle, iowait, irq, softirq] = fields;
        Self {
            user,
            nice,
            system,
            idle,
            iowait,
            irq,
            softirq,
        }
    }

    pub fn fields(&self) -> [u64; CPU_FIELD_COUNT] {
        [
            self.user,
            self.nice,
            self.system,
            self.idle,
            self.iowait,
            self.irq,
            self.softirq,
        ]
    }

    /// Calculate total CPU time (all seven fields).
    pub fn total(&self) -> u64 {
        self.fields().iter().fold(0u64, |acc, v| acc.saturating_add(*v))
    }
}

/// Memory totals in kB as reported by /proc/meminfo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MemorySample {
    pub total_kb: u64,
    pub free_kb: u64,
}

/// Parses the aggregate `cpu` line out of /proc/stat content.
///
/// Format: "cpu  4705 356 584 3699 23 23 0 0 0 0"
/// Exactly the first seven counters are used; anything after is ignored.
/// Fewer than seven leading unsigned integers is an error.
pub fn parse_cpu_sample(content: &str) -> Result<CpuSample> {
    let line = content
        .lines()
        .find(|line| line.split_whitespace().next() == Some(AGGREGATE_CPU_LABEL))
        .ok_or_else(|| {
            MonitorError::MalformedCounterLine("no aggregate 'cpu' line in /proc/stat".into())
        })?;

    let mut fields = [0u64; CPU_FIELD_COUNT];
    let mut parsed = 0;
    for token in line.split_whitespace().skip(1).take(CPU_FIELD_COUNT) {
        match token.parse::<u64>() {
            Ok(v) => {
                fields[parsed] = v;
                parsed += 1;
            }
            Err(_) => break,
        }
    }

    if parsed < CPU_FIELD_COUNT {
        return Err(MonitorError::MalformedCounterLine(format!(
            "expected {} counters after '{}', parsed {}",
            CPU_FIELD_COUNT, AGGREGATE_CPU_LABEL, parsed
        )));
    }

    Ok(CpuSample::from_fields(fields))
}

/// Parses MemTotal and MemFree out of /proc/meminfo content.
///
/// Lines may appear in any order. A missing or unparsable label yields 0
/// for that field instead of an error.
pub fn parse_memory_sample(content: &str) -> MemorySample {
    let mut total_kb: Option<u64> = None;
    let mut free_kb: Option<u64> = None;

    for line in content.lines() {
        if let Some(v) = line.strip_prefix("MemTotal:") {
            // Format: "MemTotal:       16384000 kB"
            total_kb.get_or_insert(parse_kb_value(v).unwrap_or(0));
        } else if let Some(v) = line.strip_prefix("MemFree:") {
            free_kb.get_or_insert(parse_kb_value(v).unwrap_or(0));
        }

        if total_kb.is_some() && free_kb.is_some() {
            break;
        }
    }

    if total_kb.is_none() || free_kb.is_none() {
        debug!(
            "meminfo incomplete (MemTotal present: {}, MemFree present: {}), using 0",
            total_kb.is_some(),
            free_kb.is_some()
        );
    }

    MemorySample {
        total_kb: total_kb.unwrap_or(0),
        free_kb: free_kb.unwrap_or(0),
    }
}

/// Parses the leading integer of a meminfo value such as " 8192000 kB".
fn parse_kb_value(v: &str) -> Option<u64> {
    v.split_whitespace().next()?.parse().ok()
}

/// Reads and parses the aggregate CPU counters.
pub fn read_cpu_sample(procfs: &ProcFs) -> Result<CpuSample> {
    let content = procfs.read_cpu_stat()?;
    parse_cpu_sample(&content)
}

/// Reads and parses the memory totals.
pub fn read_memory_sample(procfs: &ProcFs) -> Result<MemorySample> {
    let content = procfs.read_meminfo()?;
    Ok(parse_memory_sample(&content))
}

#[cfg(test)]
mod tests {
    use super::*;

    const PROC_STAT: &str = "cpu  4705 356 584 3699 23 23 0 0 0 0\n\
                             cpu0 1393 280 286 1822 7 17 0 0 0 0\n\
                             cpu1 3312 76 298 1877 16 6 0 0 0 0\n\
                             intr 114930548 113199788 3 0 5\n\
                             ctxt 1990473\n";

    #[test]
    fn test_parse_cpu_sample() {
        let sample = parse_cpu_sample(PROC_STAT).unwrap();
        assert_eq!(sample, CpuSample::from_fields([4705, 356, 584, 3699, 23, 23, 0]));
        assert_eq!(sample.total(), 4705 + 356 + 584 + 3699 + 23 + 23);
    }

    #[test]
    fn test_parse_cpu_sample_ignores_per_core_lines() {
        let content = "cpu0 1 1 1 1 1 1 1\ncpu 2 2 2 2 2 2 2\n";
        let sample = parse_cpu_sample(content).unwrap();
        assert_eq!(sample.fields(), [2; 7]);
    }

    #[test]
    fn test_parse_cpu_sample_six_fields_is_malformed() {
        let result = parse_cpu_sample("cpu  1 2 3 4 5 6\n");
        assert!(matches!(result, Err(MonitorError::MalformedCounterLine(_))));
    }

    #[test]
    fn test_parse_cpu_sample_non_numeric_is_malformed() {
        let result = parse_cpu_sample("cpu  1 2 3 x 5 6 7\n");
        assert!(matches!(result, Err(MonitorError::MalformedCounterLine(_))));
    }

    #[test]
    fn test_parse_cpu_sample_missing_line() {
        let result = parse_cpu_sample("cpu0 1 2 3 4 5 6 7\nintr 5\n");
        assert!(matches!(result, Err(MonitorError::MalformedCounterLine(_))));
    }

    #[test]
    fn test_parse_memory_sample() {
        let meminfo = "MemTotal:       16384000 kB\nMemFree:         8192000 kB\nMemAvailable:   12000000 kB\n";
        let mem = parse_memory_sample(meminfo);
        assert_eq!(mem.total_kb, 16384000);
        assert_eq!(mem.free_kb, 8192000);
    }

    #[test]
    fn test_parse_memory_sample_unordered() {
        let meminfo = "Buffers: 10 kB\nMemFree: 2048 kB\nCached: 5 kB\nMemTotal: 10240 kB\n";
        let mem = parse_memory_sample(meminfo);
        assert_eq!(mem, MemorySample { total_kb: 10240, free_kb: 2048 });
    }

    #[test]
    fn test_parse_memory_sample_missing_free_is_zero() {
        let mem = parse_memory_sample("MemTotal: 10240 kB\nSwapFree: 100 kB\n");
        assert_eq!(mem.total_kb, 10240);
        assert_eq!(mem.free_kb, 0);

        assert_eq!(parse_memory_sample(""), MemorySample::default());
    }
}
